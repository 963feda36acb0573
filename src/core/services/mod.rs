pub mod purchase_service;
pub mod registry_service;
pub mod subscription_service;
pub mod summary_service;

pub use purchase_service::{PurchaseEdit, PurchaseLedger};
pub use registry_service::{Registry, Usage};
pub use subscription_service::{SubscriptionEdit, SubscriptionTracker};
pub use summary_service::{
    assemble_view, installment_progress, BillingItem, DisplayStatus, ItemKind, MonthlyView,
    Totals, ViewFilter,
};
