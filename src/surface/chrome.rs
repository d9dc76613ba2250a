//! Chrome DevTools implementation of `Surface`.
//!
//! Drives a chromiumoxide `Page` by evaluating small JavaScript snippets:
//! locators are resolved in the page, clicks are dispatched as real mouse
//! events at the element centre, and text is typed key by key.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use super::{ClickOptions, Locator, RowHandle, Surface, SurfaceError};

// ---------------------------------------------------------------------------
// Page structure
// ---------------------------------------------------------------------------

/// One competitor row on the race card.
const ROW_SELECTOR: &str = ".runner-row";

/// The displayed competitor number inside a row.
const ROW_NUMBER_SELECTOR: &str = ".runner-number";

/// Elements considered when locating a control by its text.
const TEXT_CANDIDATES: &str = "button, a, label, li, span, div, [role='tab'], [role='button']";

/// Interval between visibility checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolves a locator query to an element (or null) inside the page.
const RESOLVE_JS: &str = r#"
(query) => {
    const norm = (s) => (s || '').trim().replace(/\s+/g, ' ');
    switch (query.kind) {
        case 'css':
            return document.querySelector(query.css);
        case 'text': {
            for (const el of document.querySelectorAll(query.candidates)) {
                const t = norm(el.innerText || el.textContent);
                if (t === query.text) return el;
            }
            return null;
        }
        case 'button': {
            for (const el of document.querySelectorAll("button, [role='button'], input[type='submit']")) {
                const label = norm(el.getAttribute('aria-label') || el.innerText || el.value);
                if (label === query.label) return el;
            }
            return null;
        }
        case 'row': {
            const row = document.querySelectorAll(query.rowSelector)[query.row];
            if (!row) return null;
            return row.querySelectorAll(query.css)[query.nth] || null;
        }
    }
    return null;
}
"#;

/// Visibility test applied to a resolved element.
const VISIBLE_JS: &str = r#"
(el) => {
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.display !== 'none'
        && parseFloat(style.opacity) > 0;
}
"#;

// ---------------------------------------------------------------------------
// ChromeSurface
// ---------------------------------------------------------------------------

/// A race page open in Chrome.
#[derive(Clone)]
pub struct ChromeSurface {
    page: Page,
}

impl ChromeSurface {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Navigate to a URL and wait for the load to settle.
    pub async fn goto(&self, url: &str, limit: Duration) -> Result<(), SurfaceError> {
        timeout(limit, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| SurfaceError::Driver(format!("navigation to {url} failed: {e}")))?;
            let _ = self.page.wait_for_navigation().await;
            Ok::<(), SurfaceError>(())
        })
        .await
        .map_err(|_| SurfaceError::Driver(format!("navigation to {url} timed out")))??;

        debug!(url, "navigated");
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, js: &str) -> Result<T, SurfaceError> {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| SurfaceError::Driver(format!("script failed: {e}")))?
            .into_value()
            .map_err(|e| SurfaceError::Driver(format!("unexpected script result: {e:?}")))
    }

    /// Run `body` with `el` bound to the resolved element.
    fn with_element(locator: &Locator, body: &str) -> String {
        format!(
            "(() => {{ const el = ({RESOLVE_JS})({query}); {body} }})()",
            query = locator_query(locator)
        )
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, SurfaceError> {
        let js = Self::with_element(locator, &format!("return ({VISIBLE_JS})(el);"));
        self.eval(&js).await
    }

    async fn element_center(&self, locator: &Locator) -> Result<(f64, f64), SurfaceError> {
        let js = Self::with_element(
            locator,
            r#"if (!el) return null;
               const r = el.getBoundingClientRect();
               return { x: r.left + r.width / 2, y: r.top + r.height / 2 };"#,
        );
        let result: Value = self.eval(&js).await?;
        let x = result["x"].as_f64();
        let y = result["y"].as_f64();
        match (x, y) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(SurfaceError::NotFound(locator.to_string())),
        }
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<(), SurfaceError> {
        for kind in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let cmd = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(SurfaceError::Driver)?;
            self.page
                .execute(cmd)
                .await
                .map_err(|e| SurfaceError::Driver(e.to_string()))?;
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), SurfaceError> {
        for c in text.chars() {
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                let cmd = DispatchKeyEventParams::builder()
                    .r#type(kind)
                    .text(c.to_string())
                    .build()
                    .map_err(SurfaceError::Driver)?;
                self.page
                    .execute(cmd)
                    .await
                    .map_err(|e| SurfaceError::Driver(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// JSON query consumed by `RESOLVE_JS`.
fn locator_query(locator: &Locator) -> Value {
    match locator {
        Locator::Css(css) => json!({ "kind": "css", "css": css }),
        Locator::Text(text) => json!({
            "kind": "text",
            "text": text,
            "candidates": TEXT_CANDIDATES,
        }),
        Locator::Button(label) => json!({ "kind": "button", "label": label }),
        Locator::InRow { row, css, nth } => json!({
            "kind": "row",
            "rowSelector": ROW_SELECTOR,
            "row": row.index(),
            "css": css,
            "nth": nth,
        }),
    }
}

#[async_trait]
impl Surface for ChromeSurface {
    async fn list_competitor_rows(&self) -> Result<Vec<RowHandle>, SurfaceError> {
        let selector = json!(ROW_SELECTOR);
        let count: usize = self
            .eval(&format!("document.querySelectorAll({selector}).length"))
            .await?;
        debug!(rows = count, "listed competitor rows");
        Ok((0..count).map(RowHandle::new).collect())
    }

    async fn row_display_number(&self, row: &RowHandle) -> Result<String, SurfaceError> {
        let locator = Locator::in_row(*row, ROW_NUMBER_SELECTOR, 0);
        self.read_text(&locator).await
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> Result<(), SurfaceError> {
        if options.force {
            let js = Self::with_element(locator, "if (!el) return false; el.click(); return true;");
            let clicked: bool = self.eval(&js).await?;
            if !clicked {
                return Err(SurfaceError::NotFound(locator.to_string()));
            }
            debug!(%locator, "force-clicked");
            return Ok(());
        }

        self.wait_visible(locator, options.timeout).await?;
        self.scroll_into_view(locator).await?;
        // Let the scroll finish before measuring
        sleep(POLL_INTERVAL).await;
        let (x, y) = self.element_center(locator).await?;
        self.mouse_click(x, y).await?;

        debug!(%locator, x, y, "clicked");
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), SurfaceError> {
        let js = Self::with_element(
            locator,
            r#"if (!el) return false;
               el.focus();
               el.value = '';
               el.dispatchEvent(new Event('input', { bubbles: true }));
               return true;"#,
        );
        let focused: bool = self.eval(&js).await?;
        if !focused {
            return Err(SurfaceError::NotFound(locator.to_string()));
        }
        self.type_text(text).await?;

        debug!(%locator, chars = text.len(), "filled");
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), SurfaceError> {
        let js = Self::with_element(
            locator,
            "if (!el) return false; el.scrollIntoView({ behavior: 'instant', block: 'center' }); return true;",
        );
        let found: bool = self.eval(&js).await?;
        if found {
            Ok(())
        } else {
            Err(SurfaceError::NotFound(locator.to_string()))
        }
    }

    async fn wait_visible(&self, locator: &Locator, limit: Duration) -> Result<(), SurfaceError> {
        let deadline = Instant::now() + limit;
        loop {
            if self.is_visible(locator).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SurfaceError::not_visible(locator, limit));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn read_text(&self, locator: &Locator) -> Result<String, SurfaceError> {
        let js = Self::with_element(
            locator,
            "return el ? (el.innerText || el.textContent || '') : null;",
        );
        let text: Option<String> = self.eval(&js).await?;
        text.ok_or_else(|| SurfaceError::NotFound(locator.to_string()))
    }

    async fn read_texts(&self, selector: &str) -> Result<Vec<String>, SurfaceError> {
        let selector = json!(selector);
        let js = format!(
            "Array.from(document.querySelectorAll({selector})).map(el => el.innerText || el.textContent || '')"
        );
        self.eval(&js).await
    }
}
