use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy)]
pub enum DispatchCounter {
    Ticks,
    /// A tick was requested while another one was still running
    SkippedTicks,
    /// The eligible reminders could not be loaded
    FailedTicks,
    SentNotifications,
    FailedSends,
    /// Slots that were already claimed, sent or missed
    DuplicateSlots,
    /// Slots whose window closed without a successful send
    MissedNotifications,
}

/// Process wide counters of the dispatch engine
#[derive(Debug, Default)]
pub struct DispatchStats {
    ticks: AtomicU64,
    skipped_ticks: AtomicU64,
    failed_ticks: AtomicU64,
    sent_notifications: AtomicU64,
    failed_sends: AtomicU64,
    duplicate_slots: AtomicU64,
    missed_notifications: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStatsSnapshot {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub failed_ticks: u64,
    pub sent_notifications: u64,
    pub failed_sends: u64,
    pub duplicate_slots: u64,
    pub missed_notifications: u64,
}

impl DispatchStats {
    fn counter(&self, counter: DispatchCounter) -> &AtomicU64 {
        match counter {
            DispatchCounter::Ticks => &self.ticks,
            DispatchCounter::SkippedTicks => &self.skipped_ticks,
            DispatchCounter::FailedTicks => &self.failed_ticks,
            DispatchCounter::SentNotifications => &self.sent_notifications,
            DispatchCounter::FailedSends => &self.failed_sends,
            DispatchCounter::DuplicateSlots => &self.duplicate_slots,
            DispatchCounter::MissedNotifications => &self.missed_notifications,
        }
    }

    pub fn incr(&self, counter: DispatchCounter) {
        self.counter(counter).fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        let get = |c| self.counter(c).load(Ordering::Relaxed);
        DispatchStatsSnapshot {
            ticks: get(DispatchCounter::Ticks),
            skipped_ticks: get(DispatchCounter::SkippedTicks),
            failed_ticks: get(DispatchCounter::FailedTicks),
            sent_notifications: get(DispatchCounter::SentNotifications),
            failed_sends: get(DispatchCounter::FailedSends),
            duplicate_slots: get(DispatchCounter::DuplicateSlots),
            missed_notifications: get(DispatchCounter::MissedNotifications),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_counts() {
        let stats = DispatchStats::default();
        stats.incr(DispatchCounter::Ticks);
        stats.incr(DispatchCounter::Ticks);
        for _ in 0..3 {
            stats.incr(DispatchCounter::MissedNotifications);
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.missed_notifications, 3);
        assert_eq!(snapshot.sent_notifications, 0);
    }
}
