//! Shared types for the PADDOCK wager service.
//!
//! These types form the data model used across all modules: the wager
//! requests handed in by the caller, the per-wager outcomes and the batch
//! result handed back, and the domain error taxonomy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Category / sub-type
// ---------------------------------------------------------------------------

/// Top-level wager grouping. Each category is one UI "mode" on the race page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Win,
    Place,
    Deuzio,
    Boulet,
}

impl Category {
    /// All known categories (useful for iteration).
    pub const ALL: &'static [Category] = &[
        Category::Win,
        Category::Place,
        Category::Deuzio,
        Category::Boulet,
    ];

    /// Exact label of the mode control that switches the page into this category.
    pub fn mode_label(&self) -> &'static str {
        match self {
            Category::Win => "Gagnant",
            Category::Place => "Placé",
            Category::Deuzio => "Deuzio",
            Category::Boulet => "Boulet",
        }
    }

    /// Sub-type of the wager placed in this category.
    pub fn sub_type(&self) -> SubType {
        match self {
            Category::Win | Category::Boulet => SubType::Win,
            Category::Place | Category::Deuzio => SubType::Place,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Win => write!(f, "win"),
            Category::Place => write!(f, "place"),
            Category::Deuzio => write!(f, "deuzio"),
            Category::Boulet => write!(f, "boulet"),
        }
    }
}

/// Parse a caller-supplied bet type (case-insensitive, French aliases accepted).
impl std::str::FromStr for Category {
    type Err = WagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" | "gagnant" | "simple_gagnant" => Ok(Category::Win),
            "place" | "placé" | "simple_place" | "simple_placé" => Ok(Category::Place),
            "deuzio" => Ok(Category::Deuzio),
            "boulet" => Ok(Category::Boulet),
            other => Err(WagerError::UnknownCategory(other.to_string())),
        }
    }
}

/// Specific wager kind within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubType {
    Win,
    Place,
}

impl SubType {
    /// Index of this sub-type's control inside a positional button group.
    pub fn position(&self) -> usize {
        match self {
            SubType::Win => 0,
            SubType::Place => 1,
        }
    }

    /// Value of the type-keyed attribute carried by this sub-type's control.
    pub fn attribute_value(&self) -> &'static str {
        match self {
            SubType::Win => "gagnant",
            SubType::Place => "place",
        }
    }
}

// ---------------------------------------------------------------------------
// Stake
// ---------------------------------------------------------------------------

/// How much to wager: a fixed amount, or a fraction of the account balance.
///
/// Fractions are already fractions (0.05 = 5%), never 0–100 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stake {
    Amount(Decimal),
    Fraction(Decimal),
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stake::Amount(a) => write!(f, "€{a}"),
            Stake::Fraction(p) => match p.checked_mul(Decimal::ONE_HUNDRED) {
                Some(pct) => write!(f, "{pct:.1}% of balance"),
                None => write!(f, "{p} of balance"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One desired wager. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerRequest {
    /// Displayed competitor number; `None` means unresolved and fails fast.
    pub competitor_number: Option<u32>,
    /// Diagnostic only.
    pub competitor_name: String,
    pub category: Category,
    pub stake: Stake,
    /// Caller's race reference, echoed back for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_id: Option<String>,
}

impl WagerRequest {
    pub fn new(
        competitor_number: Option<u32>,
        competitor_name: impl Into<String>,
        category: Category,
        stake: Stake,
    ) -> Self {
        Self {
            competitor_number,
            competitor_name: competitor_name.into(),
            category,
            stake,
            race_id: None,
        }
    }

    pub fn sub_type(&self) -> SubType {
        self.category.sub_type()
    }
}

impl fmt::Display for WagerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.competitor_number {
            Some(n) => write!(f, "#{n} {} {} {}", self.competitor_name, self.category, self.stake),
            None => write!(f, "#? {} {} {}", self.competitor_name, self.category, self.stake),
        }
    }
}

/// Ordered set of wagers processed against one page session.
/// Submission order is preserved end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub wagers: Vec<WagerRequest>,
}

impl Batch {
    pub fn new(wagers: Vec<WagerRequest>) -> Self {
        Self { wagers }
    }

    pub fn len(&self) -> usize {
        self.wagers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wagers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WagerRequest> {
        self.wagers.iter()
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Orchestrator-local state for one batch. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Mode the page was last successfully switched into.
    pub current_mode: Option<Category>,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WagerStatus {
    Placed,
    Failed,
    Skipped,
}

impl fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WagerStatus::Placed => write!(f, "PLACED"),
            WagerStatus::Failed => write!(f, "FAILED"),
            WagerStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Fate of a single wager request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerOutcome {
    pub request: WagerRequest,
    pub status: WagerStatus,
    pub resolved_stake: Decimal,
    pub error_detail: Option<String>,
}

impl WagerOutcome {
    pub fn placed(request: WagerRequest, stake: Decimal) -> Self {
        Self {
            request,
            status: WagerStatus::Placed,
            resolved_stake: stake,
            error_detail: None,
        }
    }

    pub fn failed(request: WagerRequest, stake: Decimal, error: &WagerError) -> Self {
        Self {
            request,
            status: WagerStatus::Failed,
            resolved_stake: stake,
            error_detail: Some(error.to_string()),
        }
    }

    pub fn skipped(request: WagerRequest, error: &WagerError) -> Self {
        Self {
            request,
            status: WagerStatus::Skipped,
            resolved_stake: Decimal::ZERO,
            error_detail: Some(error.to_string()),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.status == WagerStatus::Placed
    }
}

/// Complete, order-preserving account of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub outcomes: Vec<WagerOutcome>,
    /// Balance snapshot every percentage stake was computed from.
    pub account_balance: Decimal,
    /// Sum of resolved stakes over PLACED outcomes.
    pub total_staked: Decimal,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn placed(&self) -> usize {
        self.count(WagerStatus::Placed)
    }

    pub fn failed(&self) -> usize {
        self.count(WagerStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(WagerStatus::Skipped)
    }

    fn count(&self, status: WagerStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch {}: placed={} failed={} skipped={} staked=€{} balance=€{}",
            self.batch_id,
            self.placed(),
            self.failed(),
            self.skipped(),
            self.total_staked,
            self.account_balance,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for PADDOCK.
///
/// Only `BalanceUnavailable`, `AuthenticationFailed` and `Browser` abort a
/// batch; every other variant is recorded against a single wager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WagerError {
    #[error("balance unavailable: {0}")]
    BalanceUnavailable(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("mode switch to {category} failed: {message}")]
    ModeSwitchFailed { category: Category, message: String },

    #[error("competitor not found")]
    CompetitorNotFound(u32),

    #[error("bet icon not clickable: {0}")]
    IconNotClickable(String),

    #[error("stake entry failed: {0}")]
    StakeEntryFailed(String),

    #[error("confirmation timed out: {0}")]
    ConfirmationTimeout(String),

    #[error("placement failed: {0}")]
    PlacementFailed(String),

    #[error("missing competitor number")]
    MissingCompetitor,

    #[error("invalid stake: {0}")]
    InvalidStake(String),

    #[error("unknown bet type: {0}")]
    UnknownCategory(String),
}

impl WagerError {
    /// Whether this failure aborts the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WagerError::BalanceUnavailable(_)
                | WagerError::AuthenticationFailed(_)
                | WagerError::Browser(_)
        )
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WagerError::BalanceUnavailable(_) => "balance_unavailable",
            WagerError::AuthenticationFailed(_) => "authentication_failed",
            WagerError::Browser(_) => "browser",
            WagerError::ModeSwitchFailed { .. } => "mode_switch_failed",
            WagerError::CompetitorNotFound(_) => "competitor_not_found",
            WagerError::IconNotClickable(_) => "icon_not_clickable",
            WagerError::StakeEntryFailed(_) => "stake_entry_failed",
            WagerError::ConfirmationTimeout(_) => "confirmation_timeout",
            WagerError::PlacementFailed(_) => "placement_failed",
            WagerError::MissingCompetitor => "missing_competitor",
            WagerError::InvalidStake(_) => "invalid_stake",
            WagerError::UnknownCategory(_) => "unknown_category",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
