use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::github::PullRequestNumber;

/// Minimum time between two notifications about the same pull request.
pub const PR_NOTIFICATION_COOLDOWN: Duration = Duration::minutes(10);

/// Remembers when a notification was last sent for each pull request.
///
/// Entries are never expired, they are only overwritten by a newer notification.
#[derive(Debug, Default)]
pub struct CooldownTable {
    last_notified: HashMap<PullRequestNumber, DateTime<Utc>>,
}

impl CooldownTable {
    /// Returns `true` if a notification for `pr` was sent less than the cooldown before `now`.
    pub fn is_fresh(&self, pr: PullRequestNumber, now: DateTime<Utc>) -> bool {
        self.last_notified
            .get(&pr)
            .is_some_and(|last| *last + PR_NOTIFICATION_COOLDOWN > now)
    }

    /// Records a notification for `pr` sent at `now`, unless the pull request is still cooling
    /// down. Returns whether the notification may be sent.
    pub fn try_notify(&mut self, pr: PullRequestNumber, now: DateTime<Utc>) -> bool {
        if self.is_fresh(pr, now) {
            return false;
        }
        self.last_notified.insert(pr, now);
        true
    }

    pub fn last_notified(&self, pr: PullRequestNumber) -> Option<DateTime<Utc>> {
        self.last_notified.get(&pr).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 12, 17, 30, 0).unwrap()
    }

    #[test]
    fn first_notification_allowed() {
        let mut table = CooldownTable::default();
        assert!(table.try_notify(PullRequestNumber(42), start()));
        assert_eq!(table.last_notified(PullRequestNumber(42)), Some(start()));
    }

    #[test]
    fn repeated_notification_suppressed() {
        let mut table = CooldownTable::default();
        let pr = PullRequestNumber(42);
        table.try_notify(pr, start());

        let later = start() + Duration::minutes(5);
        assert!(!table.try_notify(pr, later));
        assert_eq!(table.last_notified(pr), Some(start()));
    }

    #[test]
    fn notification_allowed_after_cooldown() {
        let mut table = CooldownTable::default();
        let pr = PullRequestNumber(42);
        table.try_notify(pr, start());

        let later = start() + Duration::minutes(11);
        assert!(table.try_notify(pr, later));
        assert_eq!(table.last_notified(pr), Some(later));
    }

    #[test]
    fn cooldown_boundary_is_exclusive() {
        let mut table = CooldownTable::default();
        let pr = PullRequestNumber(42);
        table.try_notify(pr, start());
        assert!(table.try_notify(pr, start() + PR_NOTIFICATION_COOLDOWN));
    }

    #[test]
    fn pull_requests_are_independent() {
        let mut table = CooldownTable::default();
        table.try_notify(PullRequestNumber(1), start());
        assert!(table.try_notify(PullRequestNumber(2), start()));
    }
}
