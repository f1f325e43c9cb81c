use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the week containing `date`. Every time entry is anchored to
/// this date; non-Monday inputs are normalized rather than rejected.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_since_monday)
}

/// All seven dates of the week anchored at `week_start` (Mon-Sun).
pub fn week_dates(week_start: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|i| week_start + Duration::days(i)).collect()
}
