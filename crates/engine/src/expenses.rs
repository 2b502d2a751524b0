use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// A single shared expense paid by one participant on behalf of the group.
///
/// Immutable once created; edits go through the surrounding application and
/// reach the engine as a replaced expense list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub payer_id: String,
    pub amount: MoneyCents,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a validated expense. The amount must not be negative.
    pub fn new(
        payer_id: impl Into<String>,
        amount: MoneyCents,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Expense> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "expense amount must be >= 0, got {amount}"
            )));
        }

        Ok(Expense {
            id: Uuid::new_v4(),
            payer_id: payer_id.into(),
            amount,
            description: description.into(),
            occurred_at,
        })
    }
}
