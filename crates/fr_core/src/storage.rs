use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use crate::Result;

/// Persisted running spend for the current calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub total_cost_usd: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub request_count: u64,
    pub month: u32,
    pub year: i32,
    pub last_updated: DateTime<Utc>,
}

impl LedgerState {
    pub fn empty_at(now: DateTime<Utc>) -> Self {
        Self {
            total_cost_usd: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            request_count: 0,
            month: now.month(),
            year: now.year(),
            last_updated: now,
        }
    }

    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.month == now.month() && self.year == now.year()
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns `None` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<LedgerState>>;

    async fn save(&self, state: &LedgerState) -> Result<()>;
}
