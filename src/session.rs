//! Session bootstrap.
//!
//! Opens a browser, positions it on the race page and logs in. The result
//! is a `PageSession`: an authenticated surface whose owner must close it
//! on every exit path.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BrowserConfig, SiteConfig, TimingConfig};
use crate::surface::chrome::ChromeSurface;
use crate::surface::{ClickOptions, Locator, Surface, SurfaceError};
use crate::types::WagerError;

// ---------------------------------------------------------------------------
// Login page controls
// ---------------------------------------------------------------------------

const COOKIE_ACCEPT_LABEL: &str = "Accepter";
const AGE_GATE_INPUT: &str = "input[name='birthdate']";
const AGE_GATE_SUBMIT_LABEL: &str = "Valider";
const OPEN_LOGIN_TEXT: &str = "Se connecter";
const USERNAME_INPUT: &str = "input[placeholder='Email ou pseudo']";
const PASSWORD_INPUT: &str = "input[placeholder='Mot de passe']";
const LOGIN_BIRTHDAY_INPUT: &str = "input[name='birthday_date']";
const LOGIN_SUBMIT_LABEL: &str = "Connexion";
const ACCOUNT_MARKER_TEXT: &str = "Mon compte";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Site login, resolved from the environment at request time.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// dd/mm/yyyy, typed into the age gates.
    pub birthdate: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        birthdate: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
            birthdate: birthdate.into(),
        }
    }

    /// Read the credentials named by the site config.
    pub fn from_env(site: &SiteConfig) -> Result<Self, WagerError> {
        let resolve = |name: &str| {
            AppConfig::resolve_env(name)
                .map_err(|e| WagerError::AuthenticationFailed(e.to_string()))
        };
        Ok(Self::new(
            resolve(&site.username_env)?,
            resolve(&site.password_env)?,
            resolve(&site.birthdate_env)?,
        ))
    }
}

// ---------------------------------------------------------------------------
// Login flow
// ---------------------------------------------------------------------------

/// Log in from a page showing the site header.
///
/// Cookie banner and age gate are optional; everything after opening the
/// login form is required and fails with `AuthenticationFailed`.
pub async fn authenticate(
    surface: &dyn Surface,
    credentials: &Credentials,
    timing: &TimingConfig,
) -> Result<(), WagerError> {
    let short = ClickOptions::new(timing.short_wait());
    let auth_failed = |step: &str, e: &dyn std::fmt::Display| {
        warn!(step, error = %e, "Login step failed");
        WagerError::AuthenticationFailed(format!("{step}: {e}"))
    };

    let cookie = Locator::button(COOKIE_ACCEPT_LABEL);
    match surface.wait_visible(&cookie, timing.short_wait()).await {
        Ok(()) => {
            surface
                .click(&cookie, short)
                .await
                .map_err(|e| auth_failed("cookie banner", &e))?;
            info!("Cookie banner accepted");
        }
        Err(_) => debug!("No cookie banner"),
    }

    let age_gate = Locator::css(AGE_GATE_INPUT);
    match surface.wait_visible(&age_gate, timing.short_wait()).await {
        Ok(()) => {
            surface
                .fill(&age_gate, &credentials.birthdate)
                .await
                .map_err(|e| auth_failed("age gate", &e))?;
            surface
                .click(&Locator::button(AGE_GATE_SUBMIT_LABEL), short)
                .await
                .map_err(|e| auth_failed("age gate", &e))?;
            info!("Age gate passed");
        }
        Err(_) => debug!("No age gate"),
    }

    surface
        .click(&Locator::exact_text(OPEN_LOGIN_TEXT), short)
        .await
        .map_err(|e| auth_failed("open login", &e))?;

    let username = Locator::css(USERNAME_INPUT);
    surface
        .wait_visible(&username, timing.element_wait())
        .await
        .map_err(|e| auth_failed("login form", &e))?;
    surface
        .fill(&username, &credentials.username)
        .await
        .map_err(|e| auth_failed("username", &e))?;
    surface
        .fill(&Locator::css(PASSWORD_INPUT), credentials.password.expose_secret())
        .await
        .map_err(|e| auth_failed("password", &e))?;

    let birthday = Locator::css(LOGIN_BIRTHDAY_INPUT);
    match surface.wait_visible(&birthday, timing.short_wait()).await {
        Ok(()) => {
            surface
                .click(&birthday, short)
                .await
                .map_err(|e| auth_failed("birthday", &e))?;
            surface
                .fill(&birthday, &credentials.birthdate)
                .await
                .map_err(|e| auth_failed("birthday", &e))?;
        }
        Err(_) => debug!("No birthday field in login form"),
    }

    let submit = Locator::button(LOGIN_SUBMIT_LABEL);
    if let Err(e) = surface.click(&submit, short).await {
        warn!(error = %e, "Login button not clickable, forcing");
        surface
            .click(&submit, ClickOptions::forced(timing.short_wait()))
            .await
            .map_err(|e| auth_failed("submit", &e))?;
    }

    sleep(timing.login_settle()).await;

    surface
        .wait_visible(&Locator::exact_text(ACCOUNT_MARKER_TEXT), timing.element_wait())
        .await
        .map_err(|e| auth_failed("account marker", &e))?;

    info!(username = %credentials.username, "Login successful");
    Ok(())
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// An authenticated page positioned on a race.
#[async_trait]
pub trait PageSession: Send + Sync {
    fn surface(&self) -> &dyn Surface;

    /// Release the browser. Safe to call once on every exit path.
    async fn close(&mut self) -> Result<(), WagerError>;
}

/// Opens page sessions for a race URL.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, race_url: &str) -> Result<Box<dyn PageSession>, WagerError>;
}

/// A Chrome process driving one race page.
pub struct ChromeSession {
    browser: Browser,
    surface: ChromeSurface,
    handler: JoinHandle<()>,
}

#[async_trait]
impl PageSession for ChromeSession {
    fn surface(&self) -> &dyn Surface {
        &self.surface
    }

    async fn close(&mut self) -> Result<(), WagerError> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed.map_err(|e| WagerError::Browser(format!("close failed: {e}")))?;
        debug!("Browser closed");
        Ok(())
    }
}

/// Launches Chrome, logs in and positions the page on the race.
pub struct ChromeLauncher {
    browser: BrowserConfig,
    site: SiteConfig,
    timing: TimingConfig,
}

impl ChromeLauncher {
    pub fn new(browser: BrowserConfig, site: SiteConfig, timing: TimingConfig) -> Self {
        Self {
            browser,
            site,
            timing,
        }
    }

    async fn start_browser(&self) -> Result<(Browser, JoinHandle<()>), WagerError> {
        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide is headless unless asked for a head
        if !self.browser.headless {
            builder = builder.with_head();
        }

        builder = builder
            .viewport(Viewport {
                width: self.browser.viewport_width,
                height: self.browser.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(self.timing.navigation_timeout());

        if let Some(ref path) = self.browser.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.browser.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| WagerError::Browser(format!("invalid browser config: {e}")))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| WagerError::Browser(format!("launch failed: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        info!(headless = self.browser.headless, "Browser launched");
        Ok((browser, handler))
    }

    async fn position(
        &self,
        surface: &ChromeSurface,
        race_url: &str,
        credentials: &Credentials,
    ) -> Result<(), WagerError> {
        let navigate = |e: SurfaceError| WagerError::Browser(e.to_string());

        surface
            .goto(race_url, self.timing.navigation_timeout())
            .await
            .map_err(navigate)?;
        authenticate(surface, credentials, &self.timing).await?;
        // Back to a clean race card once logged in
        surface
            .goto(race_url, self.timing.navigation_timeout())
            .await
            .map_err(navigate)?;
        Ok(())
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self, race_url: &str) -> Result<Box<dyn PageSession>, WagerError> {
        let credentials = Credentials::from_env(&self.site)?;
        let (mut browser, handler) = self.start_browser().await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(WagerError::Browser(format!("could not open page: {e}")));
            }
        };

        let mut session = ChromeSession {
            browser,
            surface: ChromeSurface::new(page),
            handler,
        };

        if let Err(e) = self.position(&session.surface, race_url, &credentials).await {
            if let Err(close_err) = session.close().await {
                warn!(error = %close_err, "Failed to close browser after bootstrap error");
            }
            return Err(e);
        }

        info!(race_url, "Session ready");
        Ok(Box::new(session))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
