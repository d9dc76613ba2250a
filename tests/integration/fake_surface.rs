//! Fake race page for integration testing.
//!
//! Provides a deterministic `Surface` implementation that models a race
//! card, the mode tabs, the betting slip and the balance header, all
//! in-memory with no browser.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use paddock::session::{PageSession, SessionLauncher};
use paddock::surface::{ClickOptions, Locator, RowHandle, Surface, SurfaceError};
use paddock::types::{Category, WagerError};

/// A wager the fake page accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedSlip {
    pub mode: Option<String>,
    pub row: usize,
    pub stake: String,
}

#[derive(Debug, Default)]
struct PageState {
    current_mode: Option<String>,
    selected_row: Option<usize>,
    stake: Option<String>,
    placed: Vec<PlacedSlip>,
    calls: Vec<String>,
}

/// A controllable race page.
pub struct FakeSurface {
    /// Displayed number of each row, in document order.
    rows: Vec<String>,
    balance_text: Option<String>,
    fallback_texts: Vec<String>,
    /// Rows whose bet icons never become visible.
    broken_rows: HashSet<usize>,
    confirm_appears: bool,
    state: Mutex<PageState>,
}

impl FakeSurface {
    /// A race card with runners numbered 1..=`runners` and a balance header.
    pub fn race(runners: u32, balance_text: &str) -> Self {
        Self {
            rows: (1..=runners).map(|n| n.to_string()).collect(),
            balance_text: Some(balance_text.to_string()),
            fallback_texts: Vec::new(),
            broken_rows: HashSet::new(),
            confirm_appears: true,
            state: Mutex::new(PageState::default()),
        }
    }

    /// Hide the dedicated balance element, leaving only `fallback_texts`.
    pub fn without_balance_element(mut self, fallback_texts: &[&str]) -> Self {
        self.balance_text = None;
        self.fallback_texts = fallback_texts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_broken_row(mut self, index: usize) -> Self {
        self.broken_rows.insert(index);
        self
    }

    pub fn without_confirmation(mut self) -> Self {
        self.confirm_appears = false;
        self
    }

    pub fn placed(&self) -> Vec<PlacedSlip> {
        self.state.lock().unwrap().placed.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of clicks on mode tabs.
    pub fn mode_switches(&self) -> usize {
        let labels: Vec<String> = Category::ALL
            .iter()
            .map(|c| format!("click {}", Locator::exact_text(c.mode_label())))
            .collect();
        self.calls().iter().filter(|c| labels.contains(c)).count()
    }

    pub fn clicks(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("click ")).count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn is_balance(locator: &Locator) -> bool {
        matches!(locator, Locator::Css(css) if css.contains("balance"))
    }

    fn is_mode_tab(label: &str) -> bool {
        Category::ALL.iter().any(|c| c.mode_label() == label)
    }

    fn visible(&self, locator: &Locator) -> bool {
        match locator {
            l if Self::is_balance(l) => self.balance_text.is_some(),
            Locator::InRow { row, .. } => {
                row.index() < self.rows.len() && !self.broken_rows.contains(&row.index())
            }
            Locator::Button(label) if label == "Confirmer" => {
                self.confirm_appears && self.state.lock().unwrap().stake.is_some()
            }
            Locator::Text(text) if Self::is_mode_tab(text) => true,
            _ => true,
        }
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn list_competitor_rows(&self) -> Result<Vec<RowHandle>, SurfaceError> {
        self.record("rows".into());
        Ok((0..self.rows.len()).map(RowHandle::new).collect())
    }

    async fn row_display_number(&self, row: &RowHandle) -> Result<String, SurfaceError> {
        self.rows
            .get(row.index())
            .cloned()
            .ok_or_else(|| SurfaceError::NotFound(format!("row {}", row.index())))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> Result<(), SurfaceError> {
        self.record(format!("click {locator}"));
        if !self.visible(locator) {
            return Err(SurfaceError::not_visible(locator, options.timeout));
        }

        let mut state = self.state.lock().unwrap();
        match locator {
            Locator::Text(text) if Self::is_mode_tab(text) => {
                state.current_mode = Some(text.clone());
            }
            Locator::InRow { row, .. } => {
                state.selected_row = Some(row.index());
                state.stake = None;
            }
            Locator::Button(label) if label == "Confirmer" => {
                let slip = PlacedSlip {
                    mode: state.current_mode.clone(),
                    row: state.selected_row.unwrap_or(usize::MAX),
                    stake: state.stake.take().unwrap_or_default(),
                };
                state.placed.push(slip);
                state.selected_row = None;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), SurfaceError> {
        self.record(format!("fill {locator} {text}"));
        self.state.lock().unwrap().stake = Some(text.to_string());
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), SurfaceError> {
        self.record(format!("scroll {locator}"));
        Ok(())
    }

    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<(), SurfaceError> {
        self.record(format!("wait {locator}"));
        if self.visible(locator) {
            Ok(())
        } else {
            Err(SurfaceError::not_visible(locator, timeout))
        }
    }

    async fn read_text(&self, locator: &Locator) -> Result<String, SurfaceError> {
        self.record(format!("read {locator}"));
        match (&self.balance_text, Self::is_balance(locator)) {
            (Some(text), true) => Ok(text.clone()),
            _ => Err(SurfaceError::NotFound(locator.to_string())),
        }
    }

    async fn read_texts(&self, selector: &str) -> Result<Vec<String>, SurfaceError> {
        self.record(format!("read_all {selector}"));
        Ok(self.fallback_texts.clone())
    }
}

// ---------------------------------------------------------------------------
// Session plumbing
// ---------------------------------------------------------------------------

pub struct FakeSession {
    surface: Arc<FakeSurface>,
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl PageSession for FakeSession {
    fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    async fn close(&mut self) -> Result<(), WagerError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Hands out sessions over one shared fake page and remembers whether
/// the last one was closed.
pub struct FakeLauncher {
    pub surface: Arc<FakeSurface>,
    pub closed: Arc<Mutex<bool>>,
    pub launched_urls: Mutex<Vec<String>>,
}

impl FakeLauncher {
    pub fn new(surface: FakeSurface) -> Self {
        Self {
            surface: Arc::new(surface),
            closed: Arc::new(Mutex::new(false)),
            launched_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, race_url: &str) -> Result<Box<dyn PageSession>, WagerError> {
        self.launched_urls.lock().unwrap().push(race_url.to_string());
        Ok(Box::new(FakeSession {
            surface: self.surface.clone(),
            closed: self.closed.clone(),
        }))
    }
}
