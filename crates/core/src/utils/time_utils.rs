use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime};

/// Current local timestamp, used for `created_at`/`updated_at`.
///
/// Funding periods and target dates are calendar-month based, so the engine
/// works on local dates rather than UTC instants.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Whole calendar months from `from` to `to`, ignoring the day of month.
///
/// Negative when `to` lies in an earlier month than `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    years * 12 + months
}

/// Adds `months` calendar months, clamping the day to the end of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
