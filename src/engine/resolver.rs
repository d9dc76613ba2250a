//! Competitor resolver.
//!
//! Finds the row of a competitor by its displayed number. Rows may be
//! re-rendered between wagers, so nothing is cached: every wager rescans.

use tracing::{debug, warn};

use crate::surface::{RowHandle, Surface};
use crate::types::WagerError;

/// Canonical form of a displayed number: its digits without leading zeros.
///
/// `" 5 "`, `"N°5"` and `"05"` all normalize to `"5"`.
pub fn normalize_number(text: &str) -> String {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Return the first row, in document order, displaying `number`.
pub async fn find_competitor(
    surface: &dyn Surface,
    number: u32,
) -> Result<RowHandle, WagerError> {
    let rows = surface.list_competitor_rows().await.map_err(|e| {
        warn!(number, error = %e, "Could not list competitor rows");
        WagerError::CompetitorNotFound(number)
    })?;

    let wanted = number.to_string();
    for row in rows {
        match surface.row_display_number(&row).await {
            Ok(text) if normalize_number(&text) == wanted => {
                debug!(number, row = row.index(), "Competitor row resolved");
                return Ok(row);
            }
            Ok(_) => {}
            // An unreadable row cannot be the one we want; keep scanning.
            Err(e) => debug!(row = row.index(), error = %e, "Row number unreadable"),
        }
    }

    warn!(number, "Competitor not found on page");
    Err(WagerError::CompetitorNotFound(number))
}
