//! Balance reader.
//!
//! Extracts the account balance from the page header. The primary path
//! reads a dedicated balance element; if that fails, every element whose
//! class hints at a balance is scanned for a euro amount.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::surface::{Locator, Surface};
use crate::types::WagerError;

/// Dedicated real-money balance element.
const BALANCE_SELECTOR: &str = "span.balance-real-value";

/// Elements scanned when the dedicated element is missing.
const BALANCE_FALLBACK_SELECTOR: &str = "[class*='balance']";

const CURRENCY_MARKER: char = '€';

fn fallback_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+(?:,\d+)?)\s*€").unwrap_or_else(|e| panic!("invalid balance pattern: {e}"))
    })
}

pub struct BalanceReader {
    timing: TimingConfig,
}

impl BalanceReader {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Read the current account balance, or fail with `BalanceUnavailable`.
    pub async fn read_balance(&self, surface: &dyn Surface) -> Result<Decimal, WagerError> {
        let primary_error = match self.read_primary(surface).await {
            Ok(balance) => {
                info!(balance = %balance, "Account balance read");
                return Ok(balance);
            }
            Err(e) => e,
        };

        warn!(error = %primary_error, "Primary balance element unavailable, scanning fallbacks");

        match self.read_fallback(surface).await {
            Some(balance) => {
                info!(balance = %balance, "Account balance extracted from fallback element");
                Ok(balance)
            }
            None => Err(WagerError::BalanceUnavailable(primary_error)),
        }
    }

    async fn read_primary(&self, surface: &dyn Surface) -> Result<Decimal, String> {
        let locator = Locator::css(BALANCE_SELECTOR);
        surface
            .wait_visible(&locator, self.timing.element_wait())
            .await
            .map_err(|e| e.to_string())?;
        let text = surface.read_text(&locator).await.map_err(|e| e.to_string())?;
        debug!(raw = %text, "Raw balance text");
        parse_balance_text(&text).ok_or_else(|| format!("unparseable balance text '{text}'"))
    }

    async fn read_fallback(&self, surface: &dyn Surface) -> Option<Decimal> {
        let texts = match surface.read_texts(BALANCE_FALLBACK_SELECTOR).await {
            Ok(texts) => texts,
            Err(e) => {
                warn!(error = %e, "Fallback balance scan failed");
                return None;
            }
        };

        texts
            .iter()
            .filter(|t| t.contains(CURRENCY_MARKER) && t.chars().any(|c| c.is_ascii_digit()))
            .find_map(|t| {
                debug!(candidate = %t, "Potential balance element");
                extract_balance(t)
            })
    }
}

/// Parse a dedicated balance element's text such as `"74,20 €"` or `"1 234,56 €"`.
pub fn parse_balance_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != CURRENCY_MARKER && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value = Decimal::from_str(&cleaned).ok()?;
    (value >= Decimal::ZERO).then_some(value)
}

/// Pull the first `digits[,digits] €` amount out of free text.
pub fn extract_balance(text: &str) -> Option<Decimal> {
    let caps = fallback_pattern().captures(text)?;
    let amount = caps.get(1)?.as_str().replace(',', ".");
    Decimal::from_str(&amount).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
