//! Page surface abstraction.
//!
//! Defines the `Surface` trait the wager engine drives, and the locator
//! vocabulary it speaks. `chrome` provides the real implementation over a
//! Chrome DevTools session; tests substitute deterministic doubles.

pub mod chrome;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Handles and locators
// ---------------------------------------------------------------------------

/// Opaque reference to a competitor row, valid only within the page state
/// it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(usize);

impl RowHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the row in document order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How to find a control on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(String),
    /// First clickable element whose trimmed text equals the given text.
    Text(String),
    /// Button whose accessible label matches exactly.
    Button(String),
    /// The `nth` element matching `css` inside a competitor row.
    InRow {
        row: RowHandle,
        css: String,
        nth: usize,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }

    pub fn button(label: impl Into<String>) -> Self {
        Locator::Button(label.into())
    }

    pub fn in_row(row: RowHandle, css: impl Into<String>, nth: usize) -> Self {
        Locator::InRow {
            row,
            css: css.into(),
            nth,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "css={sel}"),
            Locator::Text(text) => write!(f, "text=\"{text}\""),
            Locator::Button(label) => write!(f, "button=\"{label}\""),
            Locator::InRow { row, css, nth } => {
                write!(f, "row[{}] css={css} nth={nth}", row.index())
            }
        }
    }
}

/// Options for a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    pub timeout: Duration,
    /// Dispatch the click directly on the element, skipping actionability.
    pub force: bool,
}

impl ClickOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            force: false,
        }
    }

    pub fn forced(timeout: Duration) -> Self {
        Self {
            timeout,
            force: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("not visible after {timeout_ms}ms: {locator}")]
    NotVisible { locator: String, timeout_ms: u128 },

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl SurfaceError {
    pub fn not_visible(locator: &Locator, timeout: Duration) -> Self {
        SurfaceError::NotVisible {
            locator: locator.to_string(),
            timeout_ms: timeout.as_millis(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SurfaceError::NotVisible { .. })
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A positioned, authenticated race page.
///
/// Every call is a suspension point bounded by its own timeout, and none of
/// them guarantee success. A surface is not safe for concurrent wagers: the
/// page has a single wager-slip context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Surface: Send + Sync {
    /// Competitor rows in document order.
    async fn list_competitor_rows(&self) -> Result<Vec<RowHandle>, SurfaceError>;

    /// The number displayed on a row, as raw text.
    async fn row_display_number(&self, row: &RowHandle) -> Result<String, SurfaceError>;

    async fn click(&self, locator: &Locator, options: ClickOptions) -> Result<(), SurfaceError>;

    /// Replace the content of a text input.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), SurfaceError>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), SurfaceError>;

    /// Wait until the element exists and is visible, or fail with `NotVisible`.
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<(), SurfaceError>;

    async fn read_text(&self, locator: &Locator) -> Result<String, SurfaceError>;

    /// Text of every element matching a CSS selector, in document order.
    async fn read_texts(&self, selector: &str) -> Result<Vec<String>, SurfaceError>;
}
