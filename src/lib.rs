#![doc(test(attr(deny(warnings))))]

//! Installment Core provides the purchase-ledger, billing-cycle, and
//! subscription-tracking primitives behind a shared-expense dashboard:
//! penny-exact installment plans, card cycle resolution, and monthly
//! billing views over a pluggable record store.

pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Installment Core tracing initialized.");
    });
}
