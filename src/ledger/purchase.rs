//! Purchase records: normal or split between two people, each share with
//! its own installment plan and paid/balance aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::currency::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

/// One dated slice of a share's principal. Immutable after generation
/// except for the paid/pending transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub value: Money,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareStatus {
    Pending,
    PartiallyPaid,
    FullyPaid,
    /// Sentinel for a zero-value share: the person carries no obligation.
    NotApplicable,
}

/// One person's financial portion of a purchase, with its own installment
/// plan and derived aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub person_id: Uuid,
    pub amount: Money,
    #[serde(deserialize_with = "deserialize_installments")]
    pub installments: Vec<Installment>,
    pub value_paid: Money,
    pub balance_due: Money,
    pub status: ShareStatus,
}

impl Share {
    pub fn new(person_id: Uuid, amount: Money, installments: Vec<Installment>) -> Self {
        let mut share = Self {
            person_id,
            amount,
            installments,
            value_paid: Money::ZERO,
            balance_due: amount,
            status: ShareStatus::Pending,
        };
        share.recompute();
        share
    }

    pub fn installment_mut(&mut self, number: u32) -> Option<&mut Installment> {
        self.installments.iter_mut().find(|i| i.number == number)
    }

    /// Re-derives `value_paid`, `balance_due`, and the share status from the
    /// installment plan. Marking and un-marking both funnel through here,
    /// and every comparison is exact integer-cents arithmetic.
    pub fn recompute(&mut self) {
        self.value_paid = self
            .installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.value)
            .sum();
        self.balance_due = self.amount - self.value_paid;
        self.status = if self.amount.is_zero() && self.installments.is_empty() {
            ShareStatus::NotApplicable
        } else if self.balance_due <= Money::ZERO {
            ShareStatus::FullyPaid
        } else if self.value_paid.is_positive() {
            ShareStatus::PartiallyPaid
        } else {
            ShareStatus::Pending
        };
    }
}

/// Which share of a split purchase an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareKey {
    Person1,
    Person2,
}

/// The shape-specific half of a purchase record. A tagged union instead of
/// one struct with nullable field sets, so "which fields are valid right
/// now" is answered by the type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseKind {
    Normal {
        share: Share,
    },
    Split {
        total_item_value: Money,
        person1: Share,
        person2: Share,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub card_id: Uuid,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub installment_count: u32,
    pub first_due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: PurchaseKind,
}

impl Purchase {
    pub fn is_split(&self) -> bool {
        matches!(self.kind, PurchaseKind::Split { .. })
    }

    /// Resolves the share addressed by `key`: `None` targets a normal
    /// purchase's single share.
    pub fn share_mut(&mut self, key: Option<ShareKey>) -> Option<&mut Share> {
        match (&mut self.kind, key) {
            (PurchaseKind::Normal { share }, None) => Some(share),
            (PurchaseKind::Split { person1, .. }, Some(ShareKey::Person1)) => Some(person1),
            (PurchaseKind::Split { person2, .. }, Some(ShareKey::Person2)) => Some(person2),
            _ => None,
        }
    }

    pub fn share(&self, key: Option<ShareKey>) -> Option<&Share> {
        match (&self.kind, key) {
            (PurchaseKind::Normal { share }, None) => Some(share),
            (PurchaseKind::Split { person1, .. }, Some(ShareKey::Person1)) => Some(person1),
            (PurchaseKind::Split { person2, .. }, Some(ShareKey::Person2)) => Some(person2),
            _ => None,
        }
    }

    /// All shares paired with the key that addresses them.
    pub fn shares(&self) -> Vec<(Option<ShareKey>, &Share)> {
        match &self.kind {
            PurchaseKind::Normal { share } => vec![(None, share)],
            PurchaseKind::Split {
                person1, person2, ..
            } => vec![
                (Some(ShareKey::Person1), person1),
                (Some(ShareKey::Person2), person2),
            ],
        }
    }
}

/// Legacy records persisted the installment plan as a stringified JSON
/// array; newer ones store a native array. Both shapes normalize to a typed
/// sequence here, at the store boundary, so core logic never sees the
/// ambiguity.
fn deserialize_installments<'de, D>(deserializer: D) -> Result<Vec<Installment>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Native(Vec<Installment>),
        Stringified(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Native(installments) => Ok(installments),
        Raw::Stringified(text) => {
            serde_json::from_str(&text).map_err(serde::de::Error::custom)
        }
    }
}
