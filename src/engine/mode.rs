//! Mode selector.
//!
//! Puts the race page into a wager category before a wager is attempted.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::surface::{ClickOptions, Locator, Surface};
use crate::types::{Category, WagerError};

pub struct ModeSelector {
    timing: TimingConfig,
}

impl ModeSelector {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Switch to `target` unless the page is already there, returning the
    /// new current mode.
    ///
    /// When `current == Some(target)` the page is not touched at all.
    pub async fn ensure_mode(
        &self,
        surface: &dyn Surface,
        target: Category,
        current: Option<Category>,
    ) -> Result<Category, WagerError> {
        if current == Some(target) {
            debug!(mode = %target, "Already in requested mode");
            return Ok(target);
        }

        let control = Locator::exact_text(target.mode_label());
        surface
            .click(&control, ClickOptions::new(self.timing.short_wait()))
            .await
            .map_err(|e| {
                warn!(mode = %target, error = %e, "Mode switch failed");
                WagerError::ModeSwitchFailed {
                    category: target,
                    message: e.to_string(),
                }
            })?;

        sleep(self.timing.mode_settle()).await;

        info!(from = ?current, to = %target, "Mode switched");
        Ok(target)
    }
}
