use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::Money;
use crate::errors::LedgerError;

/// A credit card configuration. Closing and due days are validated as
/// calendar days (1..=31) only; months shorter than the configured day
/// clamp at use time rather than being rejected here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub credit_limit: Money,
    pub closing_day: u32,
    pub due_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Card {
    pub fn new(
        name: impl Into<String>,
        credit_limit: Money,
        closing_day: u32,
        due_day: u32,
    ) -> Result<Self, LedgerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::validation("card name is required"));
        }
        if !(1..=31).contains(&closing_day) {
            return Err(LedgerError::validation("closing day must be in 1..=31"));
        }
        if !(1..=31).contains(&due_day) {
            return Err(LedgerError::validation("due day must be in 1..=31"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            credit_limit,
            closing_day,
            due_day,
            color: None,
        })
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
