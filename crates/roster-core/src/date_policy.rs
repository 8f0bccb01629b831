//! Age rules for issued documents.
//!
//! A certificate is acceptable while its issuance date plus the allowed age in
//! months has not fallen behind today. Unset dates are not subject to the rule;
//! presence is checked elsewhere.
//!
//! Month arithmetic clamps to the end of the month: Jan 31 + 1 month is the
//! last day of February.

use chrono::{Local, Months, NaiveDate};

/// Maximum age of a health certificate.
pub const HEALTH_CERTIFICATE_MONTHS: u32 = 6;
/// Maximum age of either background certificate.
pub const BACKGROUND_CERTIFICATE_MONTHS: u32 = 12;

/// Today's date on the local calendar.
pub fn today() -> NaiveDate { Local::now().date_naive() }

/// `date` shifted by `months`, clamped to the end of the target month.
///
/// Saturates at the calendar bounds instead of failing.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
  let shifted = if months >= 0 {
    date.checked_add_months(Months::new(months.unsigned_abs()))
  } else {
    date.checked_sub_months(Months::new(months.unsigned_abs()))
  };
  shifted.unwrap_or(if months >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// `true` if `date` is unset, or `date + months` is not before `today`.
pub fn is_not_older_than(date: Option<NaiveDate>, months: u32, today: NaiveDate) -> bool {
  match date {
    None => true,
    Some(d) => add_months(d, months as i32) >= today,
  }
}

/// The earliest acceptable issuance date for a `months` rule.
pub fn cutoff_date(months: u32, today: NaiveDate) -> NaiveDate {
  add_months(today, -(months as i32))
}

/// `dd/mm/yyyy`, the form used in user-facing messages.
pub fn format_date(date: NaiveDate) -> String { date.format("%d/%m/%Y").to_string() }
