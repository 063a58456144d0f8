use chrono::{DateTime, Utc};
use fr_core::config::CostSettings;
use fr_core::{LedgerState, LedgerStore, Result, TokenUsage};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub per_1k_input: f64,
    pub per_1k_output: f64,
}

impl Pricing {
    pub fn cost(&self, usage: TokenUsage) -> f64 {
        usage.input_tokens as f64 / 1000.0 * self.per_1k_input
            + usage.output_tokens as f64 / 1000.0 * self.per_1k_output
    }
}

impl From<&CostSettings> for Pricing {
    fn from(settings: &CostSettings) -> Self {
        Self {
            per_1k_input: settings.price_per_1k_input,
            per_1k_output: settings.price_per_1k_output,
        }
    }
}

/// Rough token count used when the endpoint reports no usage.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64 + 3) / 4
}

/// Running monthly spend with a hard ceiling.
///
/// All mutation goes through the inner mutex, and every mutation is persisted
/// before the lock is released.
pub struct CostLedger {
    store: Arc<dyn LedgerStore>,
    pricing: Pricing,
    monthly_limit_usd: f64,
    state: Mutex<LedgerState>,
}

impl CostLedger {
    /// Reads the persisted state, resetting it if it belongs to an earlier month.
    pub async fn load(store: Arc<dyn LedgerStore>, pricing: Pricing, monthly_limit_usd: f64) -> Result<Self> {
        let state = load_current(store.as_ref(), Utc::now()).await?;
        info!(
            "💰 Cost ledger loaded: ${:.4} of ${:.2} used this month ({} requests)",
            state.total_cost_usd, monthly_limit_usd, state.request_count
        );
        Ok(Self {
            store,
            pricing,
            monthly_limit_usd,
            state: Mutex::new(state),
        })
    }

    pub async fn from_settings(store: Arc<dyn LedgerStore>, settings: &CostSettings) -> Result<Self> {
        Self::load(store, Pricing::from(settings), settings.monthly_limit_usd).await
    }

    pub fn monthly_limit(&self) -> f64 {
        self.monthly_limit_usd
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.lock().await.clone()
    }

    /// Adds one completed call to the totals and persists. Returns the call's cost.
    pub async fn record_usage(&self, usage: TokenUsage) -> Result<f64> {
        let cost = self.pricing.cost(usage);
        let now = Utc::now();

        let mut state = self.state.lock().await;
        if !state.is_current(now) {
            info!("📅 Month rolled over, resetting cost ledger");
            *state = LedgerState::empty_at(now);
        }
        state.total_cost_usd += cost;
        state.input_tokens += usage.input_tokens;
        state.output_tokens += usage.output_tokens;
        state.request_count += 1;
        state.last_updated = now;

        self.store.save(&state).await?;
        debug!(
            "Recorded {} in / {} out tokens (${:.5}), month total ${:.4}",
            usage.input_tokens, usage.output_tokens, cost, state.total_cost_usd
        );
        Ok(cost)
    }

    /// Reloads persisted state and reports whether spending may continue.
    /// Returns `false` once the month's total reaches the configured limit.
    pub async fn check_budget(&self) -> bool {
        let mut state = self.state.lock().await;
        match load_current(self.store.as_ref(), Utc::now()).await {
            Ok(fresh) => *state = fresh,
            Err(e) => warn!("⚠️ Failed to reload cost ledger, using in-memory totals: {}", e),
        }

        let within = state.total_cost_usd < self.monthly_limit_usd;
        if !within {
            warn!(
                "🛑 Monthly cost limit reached: ${:.4} >= ${:.2}",
                state.total_cost_usd, self.monthly_limit_usd
            );
        }
        within
    }
}

async fn load_current(store: &dyn LedgerStore, now: DateTime<Utc>) -> Result<LedgerState> {
    match store.load().await? {
        Some(state) if state.is_current(now) => Ok(state),
        Some(stale) => {
            info!(
                "📅 Ledger is from {}/{}, starting a fresh month",
                stale.month, stale.year
            );
            let fresh = LedgerState::empty_at(now);
            store.save(&fresh).await?;
            Ok(fresh)
        }
        None => {
            let fresh = LedgerState::empty_at(now);
            store.save(&fresh).await?;
            Ok(fresh)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryLedgerStore;
    use chrono::{Datelike, Duration};

    const PRICING: Pricing = Pricing {
        per_1k_input: 0.00015,
        per_1k_output: 0.0006,
    };

    fn previous_month_state() -> LedgerState {
        let now = Utc::now();
        let earlier = now - Duration::days(40);
        LedgerState {
            total_cost_usd: 7.5,
            input_tokens: 1_000_000,
            output_tokens: 200_000,
            request_count: 42,
            month: earlier.month(),
            year: earlier.year(),
            last_updated: earlier,
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_pricing_cost() {
        let usage = TokenUsage { input_tokens: 2000, output_tokens: 1000 };
        let cost = PRICING.cost(usage);
        assert!((cost - (0.0003 + 0.0006)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_fresh_store_initializes_to_zero() {
        let store = Arc::new(MemoryLedgerStore::new());
        let ledger = CostLedger::load(store.clone(), PRICING, 10.0).await.unwrap();

        let state = ledger.snapshot().await;
        assert_eq!(state.total_cost_usd, 0.0);
        assert_eq!(state.request_count, 0);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_month_rollover_resets_counters() {
        let store = Arc::new(MemoryLedgerStore::with_state(previous_month_state()));
        let ledger = CostLedger::load(store.clone(), PRICING, 10.0).await.unwrap();

        let state = ledger.snapshot().await;
        assert_eq!(state.total_cost_usd, 0.0);
        assert_eq!(state.input_tokens, 0);
        assert_eq!(state.output_tokens, 0);
        assert_eq!(state.request_count, 0);
        assert!(state.is_current(Utc::now()));

        // persisted immediately
        let persisted = store.snapshot().await.unwrap();
        assert_eq!(persisted.total_cost_usd, 0.0);
    }

    #[tokio::test]
    async fn test_record_usage_accumulates_and_persists() {
        let store = Arc::new(MemoryLedgerStore::new());
        let ledger = CostLedger::load(store.clone(), PRICING, 10.0).await.unwrap();

        ledger.record_usage(TokenUsage { input_tokens: 1000, output_tokens: 500 }).await.unwrap();
        ledger.record_usage(TokenUsage { input_tokens: 3000, output_tokens: 0 }).await.unwrap();

        let persisted = store.snapshot().await.unwrap();
        assert_eq!(persisted.input_tokens, 4000);
        assert_eq!(persisted.output_tokens, 500);
        assert_eq!(persisted.request_count, 2);
        assert!((persisted.total_cost_usd - (0.0006 + 0.0003)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_budget_is_strict() {
        let store = Arc::new(MemoryLedgerStore::new());
        let ledger = CostLedger::load(store, PRICING, 0.01).await.unwrap();
        assert!(ledger.check_budget().await);

        // 100k input tokens cost $0.015, above the $0.01 ceiling
        ledger.record_usage(TokenUsage { input_tokens: 100_000, output_tokens: 0 }).await.unwrap();
        assert!(!ledger.check_budget().await);
    }

    #[tokio::test]
    async fn test_check_budget_sees_external_writes() {
        let store = Arc::new(MemoryLedgerStore::new());
        let ledger = CostLedger::load(store.clone(), PRICING, 5.0).await.unwrap();

        let mut external = LedgerState::empty_at(Utc::now());
        external.total_cost_usd = 5.0;
        store.save(&external).await.unwrap();

        assert!(!ledger.check_budget().await);
    }
}
