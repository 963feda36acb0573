//! Domain models for cards, people, purchases, subscriptions, and the
//! billing-cycle scheduling that ties them together.

pub mod card;
pub mod person;
pub mod purchase;
pub mod schedule;
pub mod subscription;
pub mod year_month;

pub use card::Card;
pub use person::Person;
pub use purchase::{
    Installment, InstallmentStatus, Purchase, PurchaseKind, Share, ShareKey, ShareStatus,
};
pub use schedule::{add_months, build_installments, first_due_date};
pub use subscription::{Subscription, SubscriptionStatus};
pub use year_month::YearMonth;
