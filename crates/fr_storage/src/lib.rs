use fr_core::{LedgerStore, Result, Settings};
use std::sync::Arc;

pub mod backends;
pub mod ledger;

pub use backends::*;
pub use ledger::{estimate_tokens, CostLedger, Pricing};

/// Opens the ledger persisted under the configured output directory.
pub async fn open_ledger(settings: &Settings) -> Result<Arc<CostLedger>> {
    let store: Arc<dyn LedgerStore> = Arc::new(JsonFileStore::new(settings.ledger_path()));
    let ledger = CostLedger::from_settings(store, &settings.cost).await?;
    Ok(Arc::new(ledger))
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::ledger::{CostLedger, Pricing};
}
