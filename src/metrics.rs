//! Derived metrics computed over events a module has already committed.
//!
//! The streak is pure over `(timestamps, now)`: widgets load the lookback window from the
//! store once and hand it over. Window counts run in SQL, see
//! [`crate::services::event_store::count_in_window`].

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;

/// How far back the streak query looks.
pub const STREAK_LOOKBACK_DAYS: i64 = 365;

/// Distinct calendar dates, in `tz`, that have at least one timestamp.
pub fn active_dates<Tz, I>(timestamps: I, tz: &Tz) -> HashSet<NaiveDate>
where
    Tz: TimeZone,
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .map(|ts| ts.with_timezone(tz).date_naive())
        .collect()
}

/// Consecutive active days ending today, or ending yesterday when today has nothing yet.
/// Any older gap resets the streak to zero.
pub fn streak_from_dates(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today.pred_opt();

    let anchor = if dates.contains(&today) {
        today
    } else if let Some(day) = yesterday.filter(|d| dates.contains(d)) {
        day
    } else {
        return 0;
    };

    let mut streak = 0;
    let mut day = Some(anchor);
    while let Some(d) = day.filter(|d| dates.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// Commit streak as seen from `now`'s time zone.
pub fn commit_streak<Tz, I>(timestamps: I, now: &DateTime<Tz>) -> u32
where
    Tz: TimeZone,
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let dates = active_dates(timestamps, &now.timezone());
    streak_from_dates(&dates, now.date_naive())
}
