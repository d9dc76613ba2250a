//! Wager placement orchestrator.
//!
//! Runs a batch against one page session: reads the balance once, then for
//! each request in order resolves the stake, switches mode, finds the
//! competitor and drives the slip. A single wager's failure is recorded and
//! the batch moves on; only a missing balance aborts the batch.

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use super::balance::BalanceReader;
use super::confirmer::WagerConfirmer;
use super::mode::ModeSelector;
use super::resolver::find_competitor;
use super::stake::resolve_stake;
use crate::config::TimingConfig;
use crate::surface::Surface;
use crate::types::{
    Batch, BatchResult, SessionState, WagerError, WagerOutcome, WagerRequest,
};

pub struct Orchestrator {
    timing: TimingConfig,
    balance: BalanceReader,
    modes: ModeSelector,
    confirmer: WagerConfirmer,
}

impl Orchestrator {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            balance: BalanceReader::new(timing.clone()),
            modes: ModeSelector::new(timing.clone()),
            confirmer: WagerConfirmer::new(timing.clone()),
            timing,
        }
    }

    /// Read the account balance, then run the batch against it.
    ///
    /// Fails with `BalanceUnavailable` before any wager is attempted if the
    /// balance cannot be read.
    pub async fn run(&self, surface: &dyn Surface, batch: &Batch) -> Result<BatchResult, WagerError> {
        let balance = self.balance.read_balance(surface).await?;
        Ok(self.run_with_balance(surface, balance, batch).await)
    }

    /// Run a batch against a frozen balance snapshot.
    ///
    /// Every percentage stake is computed from `balance` even though the real
    /// balance drops as wagers are placed. Returns exactly one outcome per
    /// request, in request order.
    pub async fn run_with_balance(
        &self,
        surface: &dyn Surface,
        balance: Decimal,
        batch: &Batch,
    ) -> BatchResult {
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = SessionState::default();
        let mut outcomes = Vec::with_capacity(batch.len());

        info!(%batch_id, wagers = batch.len(), balance = %balance, "Running batch");

        for (index, request) in batch.iter().enumerate() {
            let outcome = match request.competitor_number {
                // No competitor means nothing to do on the page, not even pacing.
                None => {
                    warn!(index, name = %request.competitor_name, "Skipping wager without competitor number");
                    WagerOutcome::skipped(request.clone(), &WagerError::MissingCompetitor)
                }
                Some(number) => {
                    let outcome = self
                        .attempt(surface, balance, request, number, &mut state)
                        .await;
                    sleep(self.timing.pacing()).await;
                    outcome
                }
            };

            info!(
                %batch_id,
                index,
                wager = %request,
                status = %outcome.status,
                stake = %outcome.resolved_stake,
                detail = outcome.error_detail.as_deref().unwrap_or(""),
                "Wager processed"
            );
            outcomes.push(outcome);
        }

        debug_assert_eq!(outcomes.len(), batch.len(), "one outcome per request");

        let total_staked: Decimal = outcomes
            .iter()
            .filter(|o| o.is_placed())
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.resolved_stake));

        let result = BatchResult {
            batch_id,
            outcomes,
            account_balance: balance,
            total_staked,
            started_at,
            completed_at: Utc::now(),
        };

        info!(
            %batch_id,
            placed = result.placed(),
            failed = result.failed(),
            skipped = result.skipped(),
            total_staked = %result.total_staked,
            "Batch complete"
        );
        result
    }

    /// One wager: stake, mode, competitor, slip. Never fails the batch.
    async fn attempt(
        &self,
        surface: &dyn Surface,
        balance: Decimal,
        request: &WagerRequest,
        number: u32,
        state: &mut SessionState,
    ) -> WagerOutcome {
        let stake = match resolve_stake(&request.stake, balance) {
            Ok(stake) => stake,
            Err(e) => return WagerOutcome::failed(request.clone(), Decimal::ZERO, &e),
        };

        // A failed switch leaves the last successful mode in place.
        match self
            .modes
            .ensure_mode(surface, request.category, state.current_mode)
            .await
        {
            Ok(mode) => state.current_mode = Some(mode),
            Err(e) => return WagerOutcome::failed(request.clone(), stake, &e),
        }

        let row = match find_competitor(surface, number).await {
            Ok(row) => row,
            Err(e) => return WagerOutcome::failed(request.clone(), stake, &e),
        };

        match self
            .confirmer
            .confirm(surface, row, request.category, request.sub_type(), stake)
            .await
        {
            Ok(()) => WagerOutcome::placed(request.clone(), stake),
            Err(e) => WagerOutcome::failed(request.clone(), stake, &e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
