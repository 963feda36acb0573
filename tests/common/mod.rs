#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use installment_core::currency::Money;
use installment_core::ledger::{Card, Person};
use installment_core::session::{AuthProvider, StaticAuth};
use installment_core::store::{collections, MemoryStore, RecordStore};

/// A signed-in user with one person and one card already in the store.
/// The card closes on day 25 and is due on day 10 of the following month.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<StaticAuth>,
    pub person: Person,
    pub card: Card,
}

pub fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(StaticAuth::signed_in("user-1"));
    let person = add_person(&store, &auth, "Ana");
    let card = add_card(&store, &auth, "Visa", 25, 10);
    Fixture {
        store,
        auth,
        person,
        card,
    }
}

pub fn add_person(store: &MemoryStore, auth: &StaticAuth, name: &str) -> Person {
    let user = auth.verified_user().unwrap();
    let person = Person::new(name).unwrap();
    store
        .create(
            &user,
            collections::PEOPLE,
            person.id,
            serde_json::to_value(&person).unwrap(),
        )
        .unwrap();
    person
}

pub fn add_card(
    store: &MemoryStore,
    auth: &StaticAuth,
    name: &str,
    closing_day: u32,
    due_day: u32,
) -> Card {
    let user = auth.verified_user().unwrap();
    let card = Card::new(name, Money::from_cents(500_000), closing_day, due_day).unwrap();
    store
        .create(
            &user,
            collections::CARDS,
            card.id,
            serde_json::to_value(&card).unwrap(),
        )
        .unwrap();
    card
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
