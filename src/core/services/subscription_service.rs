//! Recurring-charge operations: subscription CRUD plus the per-month
//! paid/unpaid toggle.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::currency::Money;
use crate::errors::LedgerError;
use crate::ledger::year_month::YearMonth;
use crate::ledger::{Subscription, SubscriptionStatus};
use crate::session::{AuthProvider, UserId};
use crate::store::{collections, decode_all, RecordStore};

/// Requested changes to an existing subscription. `None` keeps the current
/// value. Payment history is never edited here; it only changes through
/// [`SubscriptionTracker::set_month_paid`].
#[derive(Debug, Clone, Default)]
pub struct SubscriptionEdit {
    pub name: Option<String>,
    pub value: Option<Money>,
    pub person_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub status: Option<SubscriptionStatus>,
    pub start_date: Option<NaiveDate>,
}

/// Subscription operations scoped to the verified user.
pub struct SubscriptionTracker {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
}

impl SubscriptionTracker {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    fn user(&self) -> Result<UserId, LedgerError> {
        self.auth.verified_user().ok_or(LedgerError::Unauthenticated)
    }

    fn require_record(
        &self,
        user: &UserId,
        collection: &str,
        id: Uuid,
        what: &str,
    ) -> Result<(), LedgerError> {
        if self.store.get(user, collection, id)?.is_none() {
            return Err(LedgerError::validation(format!("unknown {what} {id}")));
        }
        Ok(())
    }

    pub fn create(
        &self,
        name: impl Into<String>,
        value: Money,
        person_id: Uuid,
        card_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<Subscription, LedgerError> {
        let user = self.user()?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::validation("subscription name is required"));
        }
        if !value.is_positive() {
            return Err(LedgerError::validation("subscription value must be positive"));
        }
        self.require_record(&user, collections::PEOPLE, person_id, "person")?;
        self.require_record(&user, collections::CARDS, card_id, "card")?;

        let subscription = Subscription {
            id: Uuid::new_v4(),
            name,
            value,
            person_id,
            card_id,
            status: SubscriptionStatus::Active,
            start_date,
            payment_history: Default::default(),
            created_at: Utc::now(),
        };
        self.store.create(
            &user,
            collections::SUBSCRIPTIONS,
            subscription.id,
            serde_json::to_value(&subscription)?,
        )?;
        tracing::info!(subscription = %subscription.id, "created subscription");
        Ok(subscription)
    }

    pub fn edit(
        &self,
        subscription_id: Uuid,
        edit: SubscriptionEdit,
    ) -> Result<Subscription, LedgerError> {
        let user = self.user()?;
        let mut subscription = self.fetch_for(&user, subscription_id)?;

        if let Some(name) = edit.name {
            if name.trim().is_empty() {
                return Err(LedgerError::validation("subscription name is required"));
            }
            subscription.name = name;
        }
        if let Some(value) = edit.value {
            if !value.is_positive() {
                return Err(LedgerError::validation("subscription value must be positive"));
            }
            subscription.value = value;
        }
        if let Some(person_id) = edit.person_id {
            self.require_record(&user, collections::PEOPLE, person_id, "person")?;
            subscription.person_id = person_id;
        }
        if let Some(card_id) = edit.card_id {
            self.require_record(&user, collections::CARDS, card_id, "card")?;
            subscription.card_id = card_id;
        }
        if let Some(status) = edit.status {
            subscription.status = status;
        }
        if let Some(start_date) = edit.start_date {
            subscription.start_date = start_date;
        }

        let fields = match serde_json::to_value(&subscription)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(LedgerError::Store(
                    "subscription did not serialize to an object".into(),
                ))
            }
        };
        self.store
            .update(&user, collections::SUBSCRIPTIONS, subscription_id, fields)?;
        Ok(subscription)
    }

    pub fn delete(&self, subscription_id: Uuid) -> Result<(), LedgerError> {
        let user = self.user()?;
        self.store
            .delete(&user, collections::SUBSCRIPTIONS, subscription_id)?;
        tracing::info!(subscription = %subscription_id, "deleted subscription");
        Ok(())
    }

    /// Toggles the paid flag for one month: a present history key is
    /// removed, an absent one is inserted with today's date. Calling twice
    /// with the same month restores the previous state.
    pub fn set_month_paid(
        &self,
        subscription_id: Uuid,
        month: YearMonth,
    ) -> Result<Subscription, LedgerError> {
        let user = self.user()?;
        let mut subscription = self.fetch_for(&user, subscription_id)?;

        if subscription.payment_history.remove(&month).is_none() {
            subscription
                .payment_history
                .insert(month, Utc::now().date_naive());
        }

        let mut fields = Map::new();
        fields.insert(
            "payment_history".to_string(),
            serde_json::to_value(&subscription.payment_history)?,
        );
        self.store
            .update(&user, collections::SUBSCRIPTIONS, subscription_id, fields)?;
        tracing::info!(
            subscription = %subscription_id,
            %month,
            paid = subscription.is_paid_in(month),
            "toggled subscription month"
        );
        Ok(subscription)
    }

    pub fn fetch(&self, subscription_id: Uuid) -> Result<Subscription, LedgerError> {
        let user = self.user()?;
        self.fetch_for(&user, subscription_id)
    }

    pub fn list(&self) -> Result<Vec<Subscription>, LedgerError> {
        let user = self.user()?;
        let documents = self.store.query_once(&user, collections::SUBSCRIPTIONS)?;
        Ok(decode_all(collections::SUBSCRIPTIONS, &documents))
    }

    fn fetch_for(
        &self,
        user: &UserId,
        subscription_id: Uuid,
    ) -> Result<Subscription, LedgerError> {
        self.store
            .get(user, collections::SUBSCRIPTIONS, subscription_id)?
            .ok_or_else(|| LedgerError::not_found(format!("subscription {subscription_id}")))?
            .decode()
    }
}
