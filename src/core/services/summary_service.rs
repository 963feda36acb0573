//! Monthly aggregation: pure functions turning purchase/subscription
//! snapshots into a single sorted billing view with roll-up totals.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::currency::Money;
use crate::ledger::year_month::YearMonth;
use crate::ledger::{Card, Installment, Purchase, ShareKey, ShareStatus, Subscription};

/// Narrows the billing view. All criteria are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewFilter {
    pub month: Option<YearMonth>,
    pub card_id: Option<Uuid>,
    pub person_id: Option<Uuid>,
}

impl ViewFilter {
    pub fn for_month(month: YearMonth) -> Self {
        Self {
            month: Some(month),
            ..Self::default()
        }
    }
}

/// Display-layer status. `Overdue` exists only here; the stored installment
/// status never changes because a due date passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Pending,
    Paid,
    Overdue,
}

/// What a billing line item points back to, so view actions can route into
/// the owning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Installment {
        purchase_id: Uuid,
        share: Option<ShareKey>,
        number: u32,
    },
    Subscription {
        subscription_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct BillingItem {
    pub description: String,
    pub person_id: Uuid,
    pub card_id: Uuid,
    pub date: NaiveDate,
    pub value: Money,
    pub status: DisplayStatus,
    /// "X/Y" installment progress; `None` for subscription charges.
    pub progress: Option<String>,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub billed: Money,
    pub received: Money,
    pub balance_due: Money,
    pub subscriptions: Money,
}

#[derive(Debug, Clone, Default)]
pub struct MonthlyView {
    pub items: Vec<BillingItem>,
    pub totals: Totals,
}

/// Builds the "X/Y" progress label for one share relative to a reference
/// month: X is the first pending installment due in-or-after that month,
/// falling back to the last paid installment, then to 1. Never `0/Y`.
pub fn installment_progress(
    installments: &[Installment],
    total: u32,
    month: Option<YearMonth>,
) -> String {
    let current = installments
        .iter()
        .filter(|i| !i.is_paid())
        .filter(|i| month.map_or(true, |m| YearMonth::from_date(i.due_date) >= m))
        .map(|i| i.number)
        .min()
        .or_else(|| {
            installments
                .iter()
                .filter(|i| i.is_paid())
                .map(|i| i.number)
                .max()
        })
        .unwrap_or(1);
    format!("{current}/{total}")
}

/// Assembles the filtered billing view: one line per matching installment,
/// one synthesized charge line per chargeable subscription, sorted by date.
/// Subscription lines only exist under a month filter, dated at the card's
/// closing day (clamped; day 1 when the card is unknown).
pub fn assemble_view(
    purchases: &[Purchase],
    subscriptions: &[Subscription],
    cards: &[Card],
    filter: &ViewFilter,
    today: NaiveDate,
) -> MonthlyView {
    let mut items = Vec::new();

    for purchase in purchases {
        if filter.card_id.is_some_and(|card| card != purchase.card_id) {
            continue;
        }
        for (key, share) in purchase.shares() {
            if share.status == ShareStatus::NotApplicable {
                continue;
            }
            if filter.person_id.is_some_and(|person| person != share.person_id) {
                continue;
            }
            let progress =
                installment_progress(&share.installments, purchase.installment_count, filter.month);
            for installment in &share.installments {
                if filter
                    .month
                    .is_some_and(|m| !m.contains(installment.due_date))
                {
                    continue;
                }
                let status = if installment.is_paid() {
                    DisplayStatus::Paid
                } else if installment.due_date < today {
                    DisplayStatus::Overdue
                } else {
                    DisplayStatus::Pending
                };
                items.push(BillingItem {
                    description: purchase.description.clone(),
                    person_id: share.person_id,
                    card_id: purchase.card_id,
                    date: installment.due_date,
                    value: installment.value,
                    status,
                    progress: Some(progress.clone()),
                    kind: ItemKind::Installment {
                        purchase_id: purchase.id,
                        share: key,
                        number: installment.number,
                    },
                });
            }
        }
    }

    if let Some(month) = filter.month {
        for subscription in subscriptions {
            if !subscription.is_chargeable_in_month(month) {
                continue;
            }
            if filter.card_id.is_some_and(|card| card != subscription.card_id) {
                continue;
            }
            if filter
                .person_id
                .is_some_and(|person| person != subscription.person_id)
            {
                continue;
            }
            let date = cards
                .iter()
                .find(|card| card.id == subscription.card_id)
                .map(|card| month.day_clamped(card.closing_day))
                .unwrap_or_else(|| month.first_day());
            let status = if subscription.is_paid_in(month) {
                DisplayStatus::Paid
            } else {
                DisplayStatus::Pending
            };
            items.push(BillingItem {
                description: subscription.name.clone(),
                person_id: subscription.person_id,
                card_id: subscription.card_id,
                date,
                value: subscription.value,
                status,
                progress: None,
                kind: ItemKind::Subscription {
                    subscription_id: subscription.id,
                },
            });
        }
    }

    items.sort_by_key(|item| item.date);

    let billed: Money = items.iter().map(|i| i.value).sum();
    let received: Money = items
        .iter()
        .filter(|i| i.status == DisplayStatus::Paid)
        .map(|i| i.value)
        .sum();
    let subscriptions_total: Money = items
        .iter()
        .filter(|i| matches!(i.kind, ItemKind::Subscription { .. }))
        .map(|i| i.value)
        .sum();
    let totals = Totals {
        billed,
        received,
        balance_due: billed - received,
        subscriptions: subscriptions_total,
    };

    MonthlyView { items, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::schedule::build_installments;
    use crate::ledger::InstallmentStatus;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn plan(cents: i64, count: u32) -> Vec<Installment> {
        build_installments(Money::from_cents(cents), count, date(2024, 1, 10))
    }

    #[test]
    fn progress_points_at_first_pending_in_or_after_month() {
        let mut installments = plan(9_000, 3);
        installments[0].status = InstallmentStatus::Paid;
        let month: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(installment_progress(&installments, 3, Some(month)), "2/3");
    }

    #[test]
    fn progress_falls_back_to_last_paid_then_one() {
        let mut installments = plan(9_000, 3);
        for i in &mut installments {
            i.status = InstallmentStatus::Paid;
        }
        assert_eq!(installment_progress(&installments, 3, None), "3/3");
        assert_eq!(installment_progress(&[], 3, None), "1/3");
    }

    #[test]
    fn empty_view_has_zero_totals() {
        let view = assemble_view(&[], &[], &[], &ViewFilter::default(), date(2024, 1, 1));
        assert!(view.items.is_empty());
        assert_eq!(view.totals, Totals::default());
    }
}
