// ── Timer scheduling ──
//
// Every deferred action the engine takes is a named timer slot on one
// client. The key is (mac, kind), so cancellation is a typed lookup
// and a destroyed client can sweep its whole slot table.

use std::collections::BTreeMap;
use std::time::Duration;

use bandsteer_bsal::MacAddress;
use serde::{Deserialize, Serialize};

/// The deferred actions a client can have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Pre-association backoff expiry.
    Backoff,
    /// Client-steering enforcement period expiry.
    CsEnforce,
    /// Client-steering RSSI crossing hysteresis.
    CsHysteresis,
    /// Force-reset of a client stuck in the `Steering` state.
    State,
    /// BTM retransmission.
    BtmRetry,
    /// Delayed sticky kick after a low crossing.
    StickyXing,
    /// Delayed beacon measurement request, one slot per token.
    Rrm(u8),
}

/// One client's timer identity, as seen by the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerKey {
    pub mac: MacAddress,
    pub kind: TimerKind,
}

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Deferred-callback scheduler owned by the host event loop.
///
/// When a timer expires the host calls
/// [`Engine::on_timer`](crate::Engine::on_timer) with the key it was
/// scheduled under. Cancelling an already-fired handle is a no-op.
pub trait Scheduler {
    fn schedule(&mut self, key: TimerKey, delay: Duration) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Per-client map of armed timers, one live handle per [`TimerKind`].
///
/// Arming a kind that is already armed cancels the previous handle
/// first, so a client can never hold two timers of the same kind.
#[derive(Debug, Default, Clone)]
pub struct TimerSlots {
    slots: BTreeMap<TimerKind, TimerHandle>,
}

impl TimerSlots {
    pub fn arm(
        &mut self,
        sched: &mut dyn Scheduler,
        mac: MacAddress,
        kind: TimerKind,
        delay: Duration,
    ) -> TimerHandle {
        if let Some(prev) = self.slots.remove(&kind) {
            sched.cancel(prev);
        }
        let handle = sched.schedule(TimerKey { mac, kind }, delay);
        self.slots.insert(kind, handle);
        handle
    }

    /// Cancel an armed timer. Returns whether one was armed.
    pub fn cancel(&mut self, sched: &mut dyn Scheduler, kind: TimerKind) -> bool {
        match self.slots.remove(&kind) {
            Some(handle) => {
                sched.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Drop the slot for a timer that just fired, without cancelling.
    pub fn clear_fired(&mut self, kind: TimerKind) {
        self.slots.remove(&kind);
    }

    /// Cancel every armed timer. Used on client destruction.
    pub fn cancel_all(&mut self, sched: &mut dyn Scheduler) {
        for (_, handle) in std::mem::take(&mut self.slots) {
            sched.cancel(handle);
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn armed_count(&self) -> usize {
        self.slots.len()
    }

    /// Armed RRM slot tokens, for bulk cancellation on disconnect.
    pub fn rrm_kinds(&self) -> Vec<TimerKind> {
        self.slots
            .keys()
            .copied()
            .filter(|k| matches!(k, TimerKind::Rrm(_)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::FakeScheduler;

    fn mac() -> MacAddress {
        MacAddress::new([0, 1, 2, 3, 4, 5])
    }

    #[test]
    fn rearming_replaces_the_previous_handle() {
        let fake = FakeScheduler::new();
        let mut sched = fake.clone();
        let mut slots = TimerSlots::default();

        let first = slots.arm(&mut sched, mac(), TimerKind::Backoff, Duration::from_secs(5));
        let second = slots.arm(&mut sched, mac(), TimerKind::Backoff, Duration::from_secs(9));

        assert_ne!(first, second);
        assert_eq!(slots.armed_count(), 1);
        assert_eq!(fake.armed_handles(), vec![second]);
    }

    #[test]
    fn cancel_all_leaves_no_scheduler_entries() {
        let fake = FakeScheduler::new();
        let mut sched = fake.clone();
        let mut slots = TimerSlots::default();

        slots.arm(&mut sched, mac(), TimerKind::Backoff, Duration::from_secs(5));
        slots.arm(&mut sched, mac(), TimerKind::CsEnforce, Duration::from_secs(30));
        slots.arm(&mut sched, mac(), TimerKind::Rrm(2), Duration::from_secs(1));

        slots.cancel_all(&mut sched);

        assert_eq!(slots.armed_count(), 0);
        assert!(fake.armed_handles().is_empty());
    }

    #[test]
    fn cancel_of_unarmed_kind_reports_false() {
        let fake = FakeScheduler::new();
        let mut sched = fake.clone();
        let mut slots = TimerSlots::default();

        assert!(!slots.cancel(&mut sched, TimerKind::CsHysteresis));
    }
}
