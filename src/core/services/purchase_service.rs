//! Validated operations over purchase records: creation, installment
//! marking, edits, and removal.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::currency::Money;
use crate::errors::LedgerError;
use crate::ledger::schedule::{build_installments, first_due_date};
use crate::ledger::{Card, InstallmentStatus, Purchase, PurchaseKind, Share, ShareKey};
use crate::session::{AuthProvider, UserId};
use crate::store::{collections, decode_all, RecordStore};

/// Requested changes to an existing purchase. `None` fields keep their
/// current value. Changing any amount, the installment count, or asking for
/// a reschedule regenerates the installment plan from scratch; previously
/// marked payments on that purchase are discarded.
#[derive(Debug, Clone, Default)]
pub struct PurchaseEdit {
    pub description: Option<String>,
    pub card_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    pub installment_count: Option<u32>,
    /// New principal for a normal purchase.
    pub principal: Option<Money>,
    /// New total for a split purchase.
    pub total_item_value: Option<Money>,
    /// New first-person portion for a split purchase.
    pub person1_share: Option<Money>,
    /// Recompute the first due date from the card's cycle and the purchase
    /// date. Off by default so header-only edits keep the existing plan.
    pub reschedule: bool,
}

impl PurchaseEdit {
    fn changes_amounts(&self) -> bool {
        self.principal.is_some()
            || self.total_item_value.is_some()
            || self.person1_share.is_some()
    }

    fn regenerates(&self) -> bool {
        self.changes_amounts() || self.installment_count.is_some() || self.reschedule
    }
}

/// Purchase operations, scoped to the verified user supplied by the auth
/// collaborator. Every mutation validates before touching the store.
pub struct PurchaseLedger {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
}

impl PurchaseLedger {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    fn user(&self) -> Result<UserId, LedgerError> {
        self.auth.verified_user().ok_or(LedgerError::Unauthenticated)
    }

    fn load_card(&self, user: &UserId, card_id: Uuid) -> Result<Card, LedgerError> {
        self.store
            .get(user, collections::CARDS, card_id)?
            .ok_or_else(|| LedgerError::validation(format!("unknown card {card_id}")))?
            .decode()
    }

    fn require_person(&self, user: &UserId, person_id: Uuid) -> Result<(), LedgerError> {
        if self.store.get(user, collections::PEOPLE, person_id)?.is_none() {
            return Err(LedgerError::validation(format!("unknown person {person_id}")));
        }
        Ok(())
    }

    /// Creates a single-person purchase. The first due date is resolved once
    /// here, from the card's closing/due days, and stored with the record.
    pub fn create_normal(
        &self,
        person_id: Uuid,
        card_id: Uuid,
        purchase_date: NaiveDate,
        description: impl Into<String>,
        principal: Money,
        count: u32,
    ) -> Result<Purchase, LedgerError> {
        let user = self.user()?;
        if !principal.is_positive() {
            return Err(LedgerError::validation("purchase value must be positive"));
        }
        if count == 0 {
            return Err(LedgerError::validation("installment count must be at least 1"));
        }
        self.require_person(&user, person_id)?;
        let card = self.load_card(&user, card_id)?;

        let first_due = first_due_date(purchase_date, card.closing_day, card.due_day);
        let share = Share::new(
            person_id,
            principal,
            build_installments(principal, count, first_due),
        );
        let purchase = Purchase {
            id: Uuid::new_v4(),
            card_id,
            purchase_date,
            description: description.into(),
            installment_count: count,
            first_due_date: first_due,
            created_at: Utc::now(),
            kind: PurchaseKind::Normal { share },
        };
        self.store.create(
            &user,
            collections::PURCHASES,
            purchase.id,
            serde_json::to_value(&purchase)?,
        )?;
        tracing::info!(purchase = %purchase.id, installments = count, "created purchase");
        Ok(purchase)
    }

    /// Creates a purchase split between two people. The second person's
    /// portion is the exact remainder; when it is zero that share carries an
    /// empty plan and no obligation. Both plans start on the same due date.
    #[allow(clippy::too_many_arguments)]
    pub fn create_split(
        &self,
        person1_id: Uuid,
        person2_id: Uuid,
        card_id: Uuid,
        purchase_date: NaiveDate,
        description: impl Into<String>,
        total_item_value: Money,
        person1_share: Money,
        count: u32,
    ) -> Result<Purchase, LedgerError> {
        let user = self.user()?;
        if person1_id == person2_id {
            return Err(LedgerError::validation("split requires two distinct people"));
        }
        if !total_item_value.is_positive() {
            return Err(LedgerError::validation("total item value must be positive"));
        }
        if !person1_share.is_positive() || person1_share > total_item_value {
            return Err(LedgerError::validation(
                "first share must be positive and no larger than the total",
            ));
        }
        if count == 0 {
            return Err(LedgerError::validation("installment count must be at least 1"));
        }
        self.require_person(&user, person1_id)?;
        self.require_person(&user, person2_id)?;
        let card = self.load_card(&user, card_id)?;

        let person2_share = total_item_value - person1_share;
        let first_due = first_due_date(purchase_date, card.closing_day, card.due_day);
        let person1 = Share::new(
            person1_id,
            person1_share,
            build_installments(person1_share, count, first_due),
        );
        let person2 = Share::new(
            person2_id,
            person2_share,
            build_installments(person2_share, count, first_due),
        );
        let purchase = Purchase {
            id: Uuid::new_v4(),
            card_id,
            purchase_date,
            description: description.into(),
            installment_count: count,
            first_due_date: first_due,
            created_at: Utc::now(),
            kind: PurchaseKind::Split {
                total_item_value,
                person1,
                person2,
            },
        };
        self.store.create(
            &user,
            collections::PURCHASES,
            purchase.id,
            serde_json::to_value(&purchase)?,
        )?;
        tracing::info!(purchase = %purchase.id, installments = count, "created split purchase");
        Ok(purchase)
    }

    /// Sets one installment to `status` and re-derives the share aggregates.
    /// Un-marking goes through the exact same path. The write is a partial
    /// update touching only the affected share field.
    pub fn mark_installment(
        &self,
        purchase_id: Uuid,
        share_key: Option<ShareKey>,
        number: u32,
        status: InstallmentStatus,
    ) -> Result<Purchase, LedgerError> {
        let user = self.user()?;
        let mut purchase = self.fetch_for(&user, purchase_id)?;
        let today = Utc::now().date_naive();

        let share = purchase
            .share_mut(share_key)
            .ok_or_else(|| LedgerError::validation("purchase has no such share"))?;
        let installment = share
            .installment_mut(number)
            .ok_or_else(|| LedgerError::not_found(format!("installment {number}")))?;
        installment.status = status;
        installment.paid_date = match status {
            InstallmentStatus::Paid => Some(today),
            InstallmentStatus::Pending => None,
        };
        share.recompute();

        let field = match (&purchase.kind, share_key) {
            (PurchaseKind::Normal { .. }, _) => "share",
            (PurchaseKind::Split { .. }, Some(ShareKey::Person1)) => "person1",
            (PurchaseKind::Split { .. }, Some(ShareKey::Person2)) => "person2",
            (PurchaseKind::Split { .. }, None) => {
                return Err(LedgerError::validation("split purchase requires a share key"))
            }
        };
        let share_value = serde_json::to_value(
            purchase
                .share(share_key)
                .ok_or_else(|| LedgerError::validation("purchase has no such share"))?,
        )?;
        let mut fields = Map::new();
        fields.insert(field.to_string(), share_value);
        self.store
            .update(&user, collections::PURCHASES, purchase_id, fields)?;
        tracing::info!(purchase = %purchase_id, number, ?status, "marked installment");
        Ok(purchase)
    }

    /// Applies an edit. Amount, count, or schedule changes rebuild the
    /// installment plan and discard any paid state on this purchase;
    /// header-only edits leave the plan untouched.
    pub fn edit(&self, purchase_id: Uuid, edit: PurchaseEdit) -> Result<Purchase, LedgerError> {
        let user = self.user()?;
        let mut purchase = self.fetch_for(&user, purchase_id)?;

        if let Some(description) = edit.description.clone() {
            purchase.description = description;
        }
        if let Some(card_id) = edit.card_id {
            self.load_card(&user, card_id)?;
            purchase.card_id = card_id;
        }
        if let Some(purchase_date) = edit.purchase_date {
            purchase.purchase_date = purchase_date;
        }
        if let Some(count) = edit.installment_count {
            if count == 0 {
                return Err(LedgerError::validation("installment count must be at least 1"));
            }
            purchase.installment_count = count;
        }
        if edit.reschedule {
            let card = self.load_card(&user, purchase.card_id)?;
            purchase.first_due_date =
                first_due_date(purchase.purchase_date, card.closing_day, card.due_day);
        }

        if edit.regenerates() {
            let count = purchase.installment_count;
            let first_due = purchase.first_due_date;
            match &mut purchase.kind {
                PurchaseKind::Normal { share } => {
                    let principal = edit.principal.unwrap_or(share.amount);
                    if !principal.is_positive() {
                        return Err(LedgerError::validation("purchase value must be positive"));
                    }
                    *share = Share::new(
                        share.person_id,
                        principal,
                        build_installments(principal, count, first_due),
                    );
                }
                PurchaseKind::Split {
                    total_item_value,
                    person1,
                    person2,
                } => {
                    let total = edit.total_item_value.unwrap_or(*total_item_value);
                    let first = edit.person1_share.unwrap_or(person1.amount);
                    if !total.is_positive() {
                        return Err(LedgerError::validation("total item value must be positive"));
                    }
                    if !first.is_positive() || first > total {
                        return Err(LedgerError::validation(
                            "first share must be positive and no larger than the total",
                        ));
                    }
                    let second = total - first;
                    *total_item_value = total;
                    *person1 = Share::new(
                        person1.person_id,
                        first,
                        build_installments(first, count, first_due),
                    );
                    *person2 = Share::new(
                        person2.person_id,
                        second,
                        build_installments(second, count, first_due),
                    );
                }
            }
            tracing::info!(purchase = %purchase_id, "regenerated installment plan");
        }

        let fields = record_fields(&purchase)?;
        self.store
            .update(&user, collections::PURCHASES, purchase_id, fields)?;
        Ok(purchase)
    }

    /// Removes the purchase and every installment under it, for all shares.
    /// People and cards referenced by it are untouched.
    pub fn delete(&self, purchase_id: Uuid) -> Result<(), LedgerError> {
        let user = self.user()?;
        self.store.delete(&user, collections::PURCHASES, purchase_id)?;
        tracing::info!(purchase = %purchase_id, "deleted purchase");
        Ok(())
    }

    pub fn fetch(&self, purchase_id: Uuid) -> Result<Purchase, LedgerError> {
        let user = self.user()?;
        self.fetch_for(&user, purchase_id)
    }

    pub fn list(&self) -> Result<Vec<Purchase>, LedgerError> {
        let user = self.user()?;
        let documents = self.store.query_once(&user, collections::PURCHASES)?;
        Ok(decode_all(collections::PURCHASES, &documents))
    }

    fn fetch_for(&self, user: &UserId, purchase_id: Uuid) -> Result<Purchase, LedgerError> {
        self.store
            .get(user, collections::PURCHASES, purchase_id)?
            .ok_or_else(|| LedgerError::not_found(format!("purchase {purchase_id}")))?
            .decode()
    }
}

fn record_fields(purchase: &Purchase) -> Result<Map<String, Value>, LedgerError> {
    match serde_json::to_value(purchase)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(LedgerError::Store("purchase did not serialize to an object".into())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ledger::Person;
    use crate::session::StaticAuth;
    use crate::store::MemoryStore;

    fn ledger_with_fixtures() -> (PurchaseLedger, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(StaticAuth::signed_in("u1"));
        let user = auth.verified_user().unwrap();

        let person = Person::new("Ana").unwrap();
        store
            .create(
                &user,
                collections::PEOPLE,
                person.id,
                serde_json::to_value(&person).unwrap(),
            )
            .unwrap();
        let card = Card::new("Visa", Money::from_cents(500_000), 25, 10).unwrap();
        store
            .create(
                &user,
                collections::CARDS,
                card.id,
                serde_json::to_value(&card).unwrap(),
            )
            .unwrap();

        let ledger = PurchaseLedger::new(store, auth);
        (ledger, person.id, card.id)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn create_validates_before_writing() {
        let (ledger, person, card) = ledger_with_fixtures();
        let err = ledger
            .create_normal(person, card, date(2024, 3, 26), "TV", Money::ZERO, 3)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(ledger.list().unwrap().is_empty());
    }

    #[test]
    fn create_resolves_due_date_from_card_cycle() {
        let (ledger, person, card) = ledger_with_fixtures();
        let purchase = ledger
            .create_normal(person, card, date(2024, 3, 26), "TV", Money::from_cents(10_000), 3)
            .unwrap();
        assert_eq!(purchase.first_due_date, date(2024, 5, 10));
    }

    #[test]
    fn unauthenticated_user_cannot_mutate() {
        let store = Arc::new(MemoryStore::new());
        let ledger = PurchaseLedger::new(store, Arc::new(StaticAuth::unverified("u1")));
        let err = ledger
            .create_normal(
                Uuid::new_v4(),
                Uuid::new_v4(),
                date(2024, 1, 1),
                "x",
                Money::from_cents(100),
                1,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthenticated));
    }
}
