mod common;

use std::sync::Arc;

use common::{add_card, add_person, date, fixture, Fixture};
use installment_core::core::services::{
    DisplayStatus, ItemKind, PurchaseLedger, SubscriptionTracker, ViewFilter,
};
use installment_core::core::Dashboard;
use installment_core::currency::Money;
use installment_core::ledger::YearMonth;
use installment_core::session::AuthProvider;
use installment_core::store::RecordStore;

struct App {
    fx: Fixture,
    ledger: PurchaseLedger,
    subscriptions: SubscriptionTracker,
    dashboard: Dashboard,
}

fn app() -> App {
    let fx = fixture();
    let store = Arc::clone(&fx.store) as Arc<dyn RecordStore>;
    let auth = Arc::clone(&fx.auth) as Arc<dyn AuthProvider>;
    let ledger = PurchaseLedger::new(Arc::clone(&store), Arc::clone(&auth));
    let subscriptions = SubscriptionTracker::new(Arc::clone(&store), Arc::clone(&auth));
    let mut dashboard = Dashboard::new(store, auth);
    dashboard.attach().unwrap();
    App {
        fx,
        ledger,
        subscriptions,
        dashboard,
    }
}

fn month(text: &str) -> YearMonth {
    text.parse().unwrap()
}

#[test]
fn month_filter_keeps_only_matching_installments() {
    let app = app();
    // closing 25, due 10: bought 2024-01-05 -> first due 2024-02-10
    app.ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "TV",
            Money::from_cents(30_000),
            3,
        )
        .unwrap();

    let view = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-03")), date(2024, 1, 1));
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].date, date(2024, 3, 10));
    assert_eq!(view.items[0].value, Money::from_cents(10_000));
    assert_eq!(view.items[0].progress.as_deref(), Some("2/3"));
}

#[test]
fn card_and_person_filters_are_conjunctive() {
    let app = app();
    let bruno = add_person(&app.fx.store, &app.fx.auth, "Bruno");
    let amex = add_card(&app.fx.store, &app.fx.auth, "Amex", 25, 10);

    app.ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "Visa item",
            Money::from_cents(10_000),
            1,
        )
        .unwrap();
    app.ledger
        .create_normal(
            bruno.id,
            amex.id,
            date(2024, 1, 5),
            "Amex item",
            Money::from_cents(20_000),
            1,
        )
        .unwrap();

    let filter = ViewFilter {
        month: Some(month("2024-02")),
        card_id: Some(amex.id),
        person_id: Some(bruno.id),
    };
    let view = app.dashboard.view_at(&filter, date(2024, 1, 1));
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].description, "Amex item");

    let mismatched = ViewFilter {
        month: Some(month("2024-02")),
        card_id: Some(amex.id),
        person_id: Some(app.fx.person.id),
    };
    assert!(app
        .dashboard
        .view_at(&mismatched, date(2024, 1, 1))
        .items
        .is_empty());
}

#[test]
fn subscription_rows_start_at_the_start_month() {
    let app = app();
    app.subscriptions
        .create(
            "Streaming",
            Money::from_cents(3_990),
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 2, 1),
        )
        .unwrap();

    let before = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-01")), date(2024, 1, 1));
    assert!(before.items.is_empty());

    let after = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-02")), date(2024, 1, 1));
    assert_eq!(after.items.len(), 1);
    // dated at the card's closing day
    assert_eq!(after.items[0].date, date(2024, 2, 25));
    assert!(matches!(
        after.items[0].kind,
        ItemKind::Subscription { .. }
    ));
    assert_eq!(after.totals.subscriptions, Money::from_cents(3_990));
}

#[test]
fn pending_items_before_today_display_as_overdue() {
    let app = app();
    app.ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "TV",
            Money::from_cents(10_000),
            1,
        )
        .unwrap();

    // first due 2024-02-10; viewed from 2024-02-20 it is overdue
    let view = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-02")), date(2024, 2, 20));
    assert_eq!(view.items[0].status, DisplayStatus::Overdue);

    // the stored record still says pending
    let stored = app.ledger.list().unwrap();
    assert!(stored[0].share(None).unwrap().installments[0].paid_date.is_none());
}

#[test]
fn totals_split_billed_received_and_balance() {
    let app = app();
    let purchase = app
        .ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "TV",
            Money::from_cents(30_000),
            3,
        )
        .unwrap();
    let sub = app
        .subscriptions
        .create(
            "Streaming",
            Money::from_cents(4_000),
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 1),
        )
        .unwrap();
    app.ledger
        .mark_installment(
            purchase.id,
            None,
            1,
            installment_core::ledger::InstallmentStatus::Paid,
        )
        .unwrap();
    app.subscriptions
        .set_month_paid(sub.id, month("2024-02"))
        .unwrap();

    let view = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-02")), date(2024, 1, 1));
    assert_eq!(view.totals.billed, Money::from_cents(14_000));
    assert_eq!(view.totals.received, Money::from_cents(14_000));
    assert!(view.totals.balance_due.is_zero());
    assert_eq!(view.totals.subscriptions, Money::from_cents(4_000));
}

#[test]
fn mark_all_paid_settles_every_pending_installment_in_view() {
    let app = app();
    let bruno = add_person(&app.fx.store, &app.fx.auth, "Bruno");
    app.ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "TV",
            Money::from_cents(30_000),
            3,
        )
        .unwrap();
    app.ledger
        .create_split(
            app.fx.person.id,
            bruno.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "Air fryer",
            Money::from_cents(20_000),
            Money::from_cents(12_000),
            2,
        )
        .unwrap();
    // subscriptions are untouched by the batch
    app.subscriptions
        .create(
            "Streaming",
            Money::from_cents(3_990),
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 1),
        )
        .unwrap();

    let filter = ViewFilter::for_month(month("2024-02"));
    let outcome = app.dashboard.mark_all_paid(&filter).unwrap();
    // one normal installment plus one per split share
    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 0);

    // live subscriptions refreshed the snapshot, so the view shows it
    let view = app.dashboard.view_at(&filter, date(2024, 1, 1));
    let pending_installments = view
        .items
        .iter()
        .filter(|i| {
            matches!(i.kind, ItemKind::Installment { .. }) && i.status != DisplayStatus::Paid
        })
        .count();
    assert_eq!(pending_installments, 0);

    // running it again finds nothing to do
    let second = app.dashboard.mark_all_paid(&filter).unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.failed, 0);
}

#[test]
fn progress_label_tracks_paid_installments() {
    let app = app();
    let purchase = app
        .ledger
        .create_normal(
            app.fx.person.id,
            app.fx.card.id,
            date(2024, 1, 5),
            "TV",
            Money::from_cents(30_000),
            3,
        )
        .unwrap();
    app.ledger
        .mark_installment(
            purchase.id,
            None,
            1,
            installment_core::ledger::InstallmentStatus::Paid,
        )
        .unwrap();
    app.ledger
        .mark_installment(
            purchase.id,
            None,
            2,
            installment_core::ledger::InstallmentStatus::Paid,
        )
        .unwrap();

    let view = app
        .dashboard
        .view_at(&ViewFilter::for_month(month("2024-04")), date(2024, 1, 1));
    assert_eq!(view.items[0].progress.as_deref(), Some("3/3"));
}
