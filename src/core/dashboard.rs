//! Reactive billing dashboard: live snapshots of the four collections plus
//! on-demand view assembly and the mark-all-paid batch.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::core::services::purchase_service::PurchaseLedger;
use crate::core::services::summary_service::{
    assemble_view, DisplayStatus, ItemKind, MonthlyView, ViewFilter,
};
use crate::errors::LedgerError;
use crate::ledger::{Card, InstallmentStatus, Person, Purchase, Subscription};
use crate::session::AuthProvider;
use crate::store::{collections, decode_all, RecordStore, SubscriptionId};

/// Result of a batch mutation: independent point writes, failures counted
/// rather than retried or rolled back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Snapshots {
    purchases: Vec<Purchase>,
    subscriptions: Vec<Subscription>,
    cards: Vec<Card>,
    people: Vec<Person>,
}

/// Holds the latest decoded snapshot of each collection and recomputes the
/// monthly view on demand. `attach` is a no-op without a verified user, so
/// the dashboard stays inert until sign-in completes.
pub struct Dashboard {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
    ledger: PurchaseLedger,
    snapshots: Arc<Mutex<Snapshots>>,
    subscriptions: Vec<SubscriptionId>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        let ledger = PurchaseLedger::new(Arc::clone(&store), Arc::clone(&auth));
        Self {
            store,
            auth,
            ledger,
            snapshots: Arc::new(Mutex::new(Snapshots::default())),
            subscriptions: Vec::new(),
        }
    }

    /// Subscribes to purchases, subscriptions, cards, and people, seeding
    /// each snapshot with an initial one-shot query. Safe to call before
    /// sign-in; it simply does nothing then.
    pub fn attach(&mut self) -> Result<(), LedgerError> {
        let Some(user) = self.auth.verified_user() else {
            tracing::info!("dashboard not attached: no verified user");
            return Ok(());
        };
        if !self.subscriptions.is_empty() {
            return Ok(());
        }

        {
            let mut snapshots = self.snapshots.lock().expect("snapshot lock poisoned");
            snapshots.purchases = decode_all(
                collections::PURCHASES,
                &self.store.query_once(&user, collections::PURCHASES)?,
            );
            snapshots.subscriptions = decode_all(
                collections::SUBSCRIPTIONS,
                &self.store.query_once(&user, collections::SUBSCRIPTIONS)?,
            );
            snapshots.cards = decode_all(
                collections::CARDS,
                &self.store.query_once(&user, collections::CARDS)?,
            );
            snapshots.people = decode_all(
                collections::PEOPLE,
                &self.store.query_once(&user, collections::PEOPLE)?,
            );
        }

        let purchases = Arc::clone(&self.snapshots);
        self.subscriptions.push(self.store.subscribe(
            &user,
            collections::PURCHASES,
            Box::new(move |documents| {
                let records = decode_all(collections::PURCHASES, documents);
                purchases.lock().expect("snapshot lock poisoned").purchases = records;
            }),
        )?);

        let subs = Arc::clone(&self.snapshots);
        self.subscriptions.push(self.store.subscribe(
            &user,
            collections::SUBSCRIPTIONS,
            Box::new(move |documents| {
                let records = decode_all(collections::SUBSCRIPTIONS, documents);
                subs.lock().expect("snapshot lock poisoned").subscriptions = records;
            }),
        )?);

        let cards = Arc::clone(&self.snapshots);
        self.subscriptions.push(self.store.subscribe(
            &user,
            collections::CARDS,
            Box::new(move |documents| {
                let records = decode_all(collections::CARDS, documents);
                cards.lock().expect("snapshot lock poisoned").cards = records;
            }),
        )?);

        let people = Arc::clone(&self.snapshots);
        self.subscriptions.push(self.store.subscribe(
            &user,
            collections::PEOPLE,
            Box::new(move |documents| {
                let records = decode_all(collections::PEOPLE, documents);
                people.lock().expect("snapshot lock poisoned").people = records;
            }),
        )?);

        tracing::info!(%user, "dashboard attached");
        Ok(())
    }

    /// People snapshot, for resolving person ids on billing items.
    pub fn people(&self) -> Vec<Person> {
        self.snapshots.lock().expect("snapshot lock poisoned").people.clone()
    }

    /// Drops all live subscriptions. Snapshots keep their last contents.
    pub fn detach(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.store.unsubscribe(id);
        }
    }

    /// Assembles the filtered view against the current snapshots, using the
    /// current date for overdue detection.
    pub fn view(&self, filter: &ViewFilter) -> MonthlyView {
        self.view_at(filter, Utc::now().date_naive())
    }

    pub fn view_at(&self, filter: &ViewFilter, today: chrono::NaiveDate) -> MonthlyView {
        let snapshots = self.snapshots.lock().expect("snapshot lock poisoned");
        assemble_view(
            &snapshots.purchases,
            &snapshots.subscriptions,
            &snapshots.cards,
            filter,
            today,
        )
    }

    /// Marks every pending or overdue purchase installment in the filtered
    /// view as paid, one independent write each. Failures are logged and
    /// counted; successful writes are not rolled back.
    pub fn mark_all_paid(&self, filter: &ViewFilter) -> Result<BatchOutcome, LedgerError> {
        if self.auth.verified_user().is_none() {
            return Err(LedgerError::Unauthenticated);
        }
        let view = self.view(filter);
        let mut outcome = BatchOutcome::default();
        for item in &view.items {
            let ItemKind::Installment {
                purchase_id,
                share,
                number,
            } = item.kind
            else {
                continue;
            };
            if item.status == DisplayStatus::Paid {
                continue;
            }
            match self
                .ledger
                .mark_installment(purchase_id, share, number, InstallmentStatus::Paid)
            {
                Ok(_) => outcome.succeeded += 1,
                Err(error) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        purchase = %purchase_id,
                        number,
                        %error,
                        "mark-all-paid item failed"
                    );
                }
            }
        }
        tracing::info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "mark-all-paid finished"
        );
        Ok(outcome)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.detach();
    }
}
