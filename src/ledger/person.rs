use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

/// A named party who can hold a purchase share or a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Result<Self, LedgerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::validation("person name is required"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
        })
    }
}
