//! Wager confirmer.
//!
//! Drives the betting slip for one resolved competitor:
//! select icon → enter stake → submit → confirm. Steps run strictly in
//! order and none is retried; a failure leaves the page wherever it
//! stopped; the next wager re-establishes mode and row from scratch.

use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::stake::stake_text;
use crate::config::TimingConfig;
use crate::surface::{ClickOptions, Locator, RowHandle, Surface, SurfaceError};
use crate::types::{Category, SubType, WagerError};

/// Single stake input on the betting slip.
const STAKE_INPUT_SELECTOR: &str = "input.betslip-stake-input";

const SUBMIT_LABEL: &str = "Parier";

const CONFIRM_LABEL: &str = "Confirmer";

/// Where a sub-type's control lives inside a competitor row.
///
/// Simple bets carry a type-keyed attribute; Deuzio and Boulet render an
/// unlabelled button group where the sub-type is positional.
pub fn icon_locator(row: RowHandle, category: Category, sub_type: SubType) -> Locator {
    match category {
        Category::Win | Category::Place => Locator::in_row(
            row,
            format!("[data-bet-type='{}']", sub_type.attribute_value()),
            0,
        ),
        Category::Deuzio => Locator::in_row(row, ".bet-buttons--deuzio button", sub_type.position()),
        Category::Boulet => Locator::in_row(row, ".bet-buttons--boulet button", sub_type.position()),
    }
}

pub struct WagerConfirmer {
    timing: TimingConfig,
}

impl WagerConfirmer {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Place one wager on an already-resolved row. `Ok` means PLACED.
    pub async fn confirm(
        &self,
        surface: &dyn Surface,
        row: RowHandle,
        category: Category,
        sub_type: SubType,
        stake: Decimal,
    ) -> Result<(), WagerError> {
        self.select_icon(surface, row, category, sub_type).await?;
        self.enter_stake(surface, stake).await?;
        self.submit(surface).await?;
        self.final_confirm(surface).await?;

        info!(row = row.index(), category = %category, stake = %stake, "Wager confirmed");
        Ok(())
    }

    async fn select_icon(
        &self,
        surface: &dyn Surface,
        row: RowHandle,
        category: Category,
        sub_type: SubType,
    ) -> Result<(), WagerError> {
        let icon = icon_locator(row, category, sub_type);
        let fail = |e: SurfaceError| {
            warn!(locator = %icon, error = %e, "Bet icon not clickable");
            WagerError::IconNotClickable(e.to_string())
        };

        surface.scroll_into_view(&icon).await.map_err(fail)?;
        surface
            .wait_visible(&icon, self.timing.short_wait())
            .await
            .map_err(fail)?;
        surface
            .click(&icon, ClickOptions::new(self.timing.short_wait()))
            .await
            .map_err(fail)?;

        debug!(locator = %icon, "Bet icon selected");
        Ok(())
    }

    async fn enter_stake(&self, surface: &dyn Surface, stake: Decimal) -> Result<(), WagerError> {
        let input = Locator::css(STAKE_INPUT_SELECTOR);
        let fail = |e: SurfaceError| {
            warn!(error = %e, "Stake entry failed");
            WagerError::StakeEntryFailed(e.to_string())
        };

        surface
            .wait_visible(&input, self.timing.short_wait())
            .await
            .map_err(fail)?;
        let text = stake_text(stake);
        surface.fill(&input, &text).await.map_err(fail)?;

        debug!(stake = %text, "Stake entered");
        Ok(())
    }

    async fn submit(&self, surface: &dyn Surface) -> Result<(), WagerError> {
        surface
            .click(
                &Locator::button(SUBMIT_LABEL),
                ClickOptions::new(self.timing.short_wait()),
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "Slip submission failed");
                WagerError::PlacementFailed(format!("submit: {e}"))
            })?;

        sleep(self.timing.submit_settle()).await;
        Ok(())
    }

    async fn final_confirm(&self, surface: &dyn Surface) -> Result<(), WagerError> {
        let confirm = Locator::button(CONFIRM_LABEL);

        surface
            .wait_visible(&confirm, self.timing.element_wait())
            .await
            .map_err(|e| {
                warn!(error = %e, "Confirmation control never appeared");
                if e.is_timeout() {
                    WagerError::ConfirmationTimeout(e.to_string())
                } else {
                    WagerError::PlacementFailed(format!("confirm: {e}"))
                }
            })?;

        surface
            .click(&confirm, ClickOptions::new(self.timing.short_wait()))
            .await
            .map_err(|e| {
                warn!(error = %e, "Confirmation click failed");
                WagerError::PlacementFailed(format!("confirm: {e}"))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
