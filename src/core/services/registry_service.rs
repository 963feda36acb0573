//! People and card registry. Deletions are not cascaded; the usage counts
//! let a caller warn about dangling references before deleting.

use std::sync::Arc;

use uuid::Uuid;

use crate::currency::Money;
use crate::errors::LedgerError;
use crate::ledger::{Card, Person, Purchase, Subscription};
use crate::session::{AuthProvider, UserId};
use crate::store::{collections, decode_all, RecordStore};

/// How many records still reference a person or card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub purchases: usize,
    pub subscriptions: usize,
}

impl Usage {
    pub fn is_referenced(&self) -> bool {
        self.purchases > 0 || self.subscriptions > 0
    }
}

pub struct Registry {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
}

impl Registry {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    fn user(&self) -> Result<UserId, LedgerError> {
        self.auth.verified_user().ok_or(LedgerError::Unauthenticated)
    }

    pub fn add_person(&self, name: impl Into<String>) -> Result<Person, LedgerError> {
        let user = self.user()?;
        let person = Person::new(name)?;
        self.store.create(
            &user,
            collections::PEOPLE,
            person.id,
            serde_json::to_value(&person)?,
        )?;
        Ok(person)
    }

    pub fn add_card(
        &self,
        name: impl Into<String>,
        credit_limit: Money,
        closing_day: u32,
        due_day: u32,
    ) -> Result<Card, LedgerError> {
        let user = self.user()?;
        let card = Card::new(name, credit_limit, closing_day, due_day)?;
        self.store.create(
            &user,
            collections::CARDS,
            card.id,
            serde_json::to_value(&card)?,
        )?;
        Ok(card)
    }

    /// Removes the person record only. Purchases and subscriptions keep
    /// their person id; check [`Registry::usage_of_person`] first to warn.
    pub fn delete_person(&self, person_id: Uuid) -> Result<(), LedgerError> {
        let user = self.user()?;
        self.store.delete(&user, collections::PEOPLE, person_id)?;
        tracing::info!(person = %person_id, "deleted person");
        Ok(())
    }

    /// Removes the card record only, without touching purchases billed to it.
    pub fn delete_card(&self, card_id: Uuid) -> Result<(), LedgerError> {
        let user = self.user()?;
        self.store.delete(&user, collections::CARDS, card_id)?;
        tracing::info!(card = %card_id, "deleted card");
        Ok(())
    }

    pub fn people(&self) -> Result<Vec<Person>, LedgerError> {
        let user = self.user()?;
        let documents = self.store.query_once(&user, collections::PEOPLE)?;
        Ok(decode_all(collections::PEOPLE, &documents))
    }

    pub fn cards(&self) -> Result<Vec<Card>, LedgerError> {
        let user = self.user()?;
        let documents = self.store.query_once(&user, collections::CARDS)?;
        Ok(decode_all(collections::CARDS, &documents))
    }

    pub fn usage_of_person(&self, person_id: Uuid) -> Result<Usage, LedgerError> {
        let (purchases, subscriptions) = self.snapshots()?;
        Ok(Usage {
            purchases: purchases
                .iter()
                .filter(|p| p.shares().iter().any(|(_, s)| s.person_id == person_id))
                .count(),
            subscriptions: subscriptions
                .iter()
                .filter(|s| s.person_id == person_id)
                .count(),
        })
    }

    pub fn usage_of_card(&self, card_id: Uuid) -> Result<Usage, LedgerError> {
        let (purchases, subscriptions) = self.snapshots()?;
        Ok(Usage {
            purchases: purchases.iter().filter(|p| p.card_id == card_id).count(),
            subscriptions: subscriptions
                .iter()
                .filter(|s| s.card_id == card_id)
                .count(),
        })
    }

    fn snapshots(&self) -> Result<(Vec<Purchase>, Vec<Subscription>), LedgerError> {
        let user = self.user()?;
        let purchases = self.store.query_once(&user, collections::PURCHASES)?;
        let subscriptions = self.store.query_once(&user, collections::SUBSCRIPTIONS)?;
        Ok((
            decode_all(collections::PURCHASES, &purchases),
            decode_all(collections::SUBSCRIPTIONS, &subscriptions),
        ))
    }
}
