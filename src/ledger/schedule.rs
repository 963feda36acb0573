//! Billing-cycle resolution and installment plan generation.

use chrono::{Datelike, NaiveDate};

use super::purchase::{Installment, InstallmentStatus};
use super::year_month::YearMonth;
use crate::currency::Money;

/// Resolves the due date of the first installment from a purchase date and
/// a card's closing-day/due-day pair.
///
/// A purchase on or after the closing day falls into the next cycle, so the
/// closing date rolls one month forward. A due day numerically before the
/// closing day means the payment window crosses into the following month,
/// so the due date rolls forward once more. Days beyond the target month's
/// length clamp to its last day.
pub fn first_due_date(purchase_date: NaiveDate, closing_day: u32, due_day: u32) -> NaiveDate {
    let mut closing_month = YearMonth::from_date(purchase_date);
    if purchase_date.day() >= closing_day {
        closing_month = closing_month.next();
    }

    let mut due_month = closing_month;
    if due_day < closing_day {
        due_month = due_month.next();
    }
    due_month.day_clamped(due_day)
}

/// Advances a date by whole calendar months, holding the day-of-month
/// constant and clamping to shorter months. Never wraps into the month
/// after the target.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    YearMonth::new(year, month)
        .expect("month arithmetic stays in 1..=12")
        .day_clamped(date.day())
}

/// Generates the ordered installment plan for one share.
///
/// The per-installment value is the half-up rounded division of the
/// principal; installment #1 absorbs the entire rounding remainder so the
/// plan sums back to the principal exactly. A non-positive principal or a
/// zero count yields an empty plan.
pub fn build_installments(principal: Money, count: u32, first_due: NaiveDate) -> Vec<Installment> {
    if !principal.is_positive() || count == 0 {
        return Vec::new();
    }

    let (first_value, base_value) = principal.split(count);
    (0..count)
        .map(|i| Installment {
            number: i + 1,
            value: if i == 0 { first_value } else { base_value },
            due_date: add_months(first_due, i),
            status: InstallmentStatus::Pending,
            paid_date: None,
        })
        .collect()
}
