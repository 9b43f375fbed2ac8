//! Calendar arithmetic for reminder due dates.
//!
//! All arithmetic is done on UTC timestamps. Month and year steps use
//! chrono's `Months`, which clamps to the last valid day of the target
//! month: 2024-01-31 + 1 month is 2024-02-29, and 2024-02-29 + 1 year is
//! 2025-02-28. The time of day is preserved.

use chrono::{DateTime, Days, Duration, Months, Utc};

use crate::models::reminder::Frequency;

/// Snooze always pushes a reminder back by this many hours
pub const SNOOZE_HOURS: i64 = 24;

/// Advances `current` by exactly one step of `frequency`.
///
/// Returns `None` only when the result would fall outside the range chrono
/// can represent.
pub fn next_due_date(current: DateTime<Utc>, frequency: Frequency) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::Minutely => current.checked_add_signed(Duration::minutes(1)),
        Frequency::Hourly => current.checked_add_signed(Duration::hours(1)),
        Frequency::Daily => current.checked_add_days(Days::new(1)),
        Frequency::Weekly => current.checked_add_days(Days::new(7)),
        Frequency::Monthly => current.checked_add_months(Months::new(1)),
        Frequency::Yearly => current.checked_add_months(Months::new(12)),
    }
}

/// Fixed 24 hour postponement, independent of frequency
pub fn snoozed_due_date(current: DateTime<Utc>) -> Option<DateTime<Utc>> {
    current.checked_add_signed(Duration::hours(SNOOZE_HOURS))
}
