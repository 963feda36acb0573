use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::year_month::YearMonth;
use crate::currency::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Paused,
}

/// A recurring monthly charge. Payment history is keyed by year-month:
/// a present key means that month was paid (the value records when).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub name: String,
    pub value: Money,
    pub person_id: Uuid,
    pub card_id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub payment_history: BTreeMap<YearMonth, NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_paid_in(&self, month: YearMonth) -> bool {
        self.payment_history.contains_key(&month)
    }

    /// A subscription only produces a chargeable line item while it is
    /// active, and only for months at or after its start month.
    pub fn is_chargeable_in_month(&self, month: YearMonth) -> bool {
        self.status == SubscriptionStatus::Active
            && month >= YearMonth::from_date(self.start_date)
    }
}
