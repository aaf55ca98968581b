//! Pure aggregation over access-log entries.
//!
//! Kept free of locking so the in-memory log can call it with the buffer
//! lock held and tests can call it on plain slices.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use custos_contracts::{
    access::AccessLogEntry,
    report::{AccessStatistics, StatsFilter, TimeRange, UserAccessCounts},
};

/// True when `entry` matches every filter the caller supplied (AND
/// semantics). `now` anchors the `time_range` filter.
pub fn matches_filter(entry: &AccessLogEntry, filter: &StatsFilter, now: DateTime<Utc>) -> bool {
    if let Some(user_id) = &filter.user_id {
        if &entry.user_id != user_id {
            return false;
        }
    }
    if let Some(session_id) = &filter.session_id {
        if &entry.session_id != session_id {
            return false;
        }
    }
    if let Some(action) = filter.action {
        if entry.action != action {
            return false;
        }
    }
    if let Some(time_range) = filter.time_range {
        if entry.timestamp <= now - time_range {
            return false;
        }
    }
    true
}

/// Aggregate the matching subset of `entries` into `AccessStatistics`.
pub fn aggregate<'a, I>(entries: I, filter: &StatsFilter, now: DateTime<Utc>) -> AccessStatistics
where
    I: IntoIterator<Item = &'a AccessLogEntry>,
{
    let mut stats = AccessStatistics::default();
    let mut users: BTreeSet<&str> = BTreeSet::new();
    let mut sessions: BTreeSet<&str> = BTreeSet::new();
    let mut earliest: Option<DateTime<Utc>> = None;
    let mut latest: Option<DateTime<Utc>> = None;

    for entry in entries {
        if !matches_filter(entry, filter, now) {
            continue;
        }

        stats.total_accesses += 1;
        if entry.success {
            stats.successful_accesses += 1;
        } else {
            stats.failed_accesses += 1;
        }

        users.insert(&entry.user_id);
        sessions.insert(&entry.session_id);

        *stats.action_breakdown.entry(entry.action).or_insert(0) += 1;

        let per_user: &mut UserAccessCounts =
            stats.user_breakdown.entry(entry.user_id.clone()).or_default();
        per_user.total += 1;
        if entry.success {
            per_user.successful += 1;
        } else {
            per_user.failed += 1;
        }

        earliest = Some(earliest.map_or(entry.timestamp, |t| t.min(entry.timestamp)));
        latest = Some(latest.map_or(entry.timestamp, |t| t.max(entry.timestamp)));
    }

    stats.unique_users = users.len();
    stats.unique_sessions = sessions.len();
    stats.time_range = TimeRange { earliest, latest };
    stats
}
