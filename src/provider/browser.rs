//! UI-automation adapter for providers without a usable private API.
//!
//! Drives a WebDriver session through the share page the way a user would:
//! open the link, type the passcode, then activate the page's save and
//! confirm controls by visible text or structural selector. Each step waits
//! a bounded number of seconds for its control; a missing control fails
//! only the link being transferred, never the batch.
//!
//! The adapter depends on a previously acquired authenticated
//! [`BrowserSession`] (cookies cached to disk). Expiry is checked before
//! every transfer so a stale login surfaces as an auth failure instead of
//! an opaque step timeout.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::{Client, ClientBuilder, Locator};
use tracing::{debug, instrument, warn};

use crate::auth::BrowserSession;
use crate::extractor::Platform;
use crate::queue::unix_now;

use super::{
    FileDescriptor, ProviderAdapter, ProviderError, ShareLink, ShareListing, ShareSession,
    parse_pwd_id,
};

/// Bound for each control wait.
const STEP_WAIT_SECS: u64 = 10;

/// Bound for the optional passcode prompt; shares without a passcode never
/// render it, so this wait is kept short.
const PASSCODE_WAIT_SECS: u64 = 5;

/// Settle time after the final confirm, letting the save request land.
const CONFIRM_SETTLE_SECS: u64 = 2;

/// Page-control selectors for one platform's share flow.
#[derive(Debug, Clone)]
pub struct BrowserSteps {
    /// Page origin, used to install session cookies before navigation.
    pub origin: &'static str,
    /// CSS selector for the passcode input.
    pub passcode_input: &'static str,
    /// XPath for the passcode submit control.
    pub passcode_submit: &'static str,
    /// CSS selector for the select-all control, when the platform needs it.
    pub select_all: Option<&'static str>,
    /// XPath for the save control.
    pub save_button: &'static str,
    /// XPath for the confirm control in the save dialog.
    pub confirm_button: &'static str,
}

impl BrowserSteps {
    /// Step descriptors for Baidu netdisk share pages.
    #[must_use]
    pub fn baidu() -> Self {
        Self {
            origin: "https://pan.baidu.com",
            passcode_input: "input[type='text'], input[type='password']",
            passcode_submit: "//a[contains(., '提取文件')] | //button[contains(., '确定')]",
            select_all: Some(".select-all"),
            save_button: "//a[contains(., '保存到网盘')] | //button[contains(., '保存')]",
            confirm_button: "//button[contains(., '确定')] | //a[contains(., '确定')]",
        }
    }
}

/// WebDriver-driven adapter for share pages.
pub struct BrowserAdapter {
    platform: Platform,
    client: Client,
    session: BrowserSession,
    steps: BrowserSteps,
}

impl BrowserAdapter {
    /// Connects to a WebDriver endpoint and binds the adapter to a cached
    /// authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Session`] when the session is already
    /// expired, or [`ProviderError::Network`] when the WebDriver endpoint
    /// is unreachable.
    #[instrument(skip(session), fields(%platform))]
    pub async fn connect(
        webdriver_url: &str,
        platform: Platform,
        steps: BrowserSteps,
        session: BrowserSession,
    ) -> Result<Self, ProviderError> {
        session.require_fresh(unix_now())?;

        let client = ClientBuilder::native()
            .connect(webdriver_url)
            .await
            .map_err(|e| ProviderError::Network(format!("webdriver connect failed: {e}")))?;

        debug!(webdriver = webdriver_url, "browser adapter connected");
        Ok(Self {
            platform,
            client,
            session,
            steps,
        })
    }

    async fn wait_for(
        &self,
        locator: Locator<'_>,
        step: &str,
        bound_secs: u64,
    ) -> Result<fantoccini::elements::Element, ProviderError> {
        self.client
            .wait()
            .at_most(Duration::from_secs(bound_secs))
            .for_element(locator)
            .await
            .map_err(|_| ProviderError::AutomationStep {
                step: step.to_string(),
                waited_secs: bound_secs,
            })
    }

    /// Installs the cached session cookies for the platform origin.
    ///
    /// WebDriver only accepts cookies for the page currently loaded, so the
    /// adapter visits the origin first.
    async fn install_cookies(&self) -> Result<(), ProviderError> {
        self.client
            .goto(self.steps.origin)
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let host = url::Url::parse(self.steps.origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        for cookie in self.session.cookies() {
            if !cookie.matches_domain(&host) {
                continue;
            }
            let mut wire = Cookie::new(cookie.name.clone(), cookie.value().to_string());
            wire.set_domain(cookie.domain.clone());
            wire.set_path(cookie.path.clone());
            if let Err(e) = self.client.add_cookie(wire).await {
                // Individual rejects are survivable; the page will show a
                // login wall if the session is actually unusable
                warn!(name = %cookie.name, error = %e, "cookie install rejected");
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for BrowserAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserAdapter")
            .field("platform", &self.platform)
            .field("origin", &self.steps.origin)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderAdapter for BrowserAdapter {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    #[instrument(skip(self, share), fields(url = %share.url))]
    async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError> {
        self.session.require_fresh(unix_now())?;
        self.install_cookies().await?;

        self.client
            .goto(&share.url)
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if let Some(password) = &share.password {
            let input = self
                .wait_for(
                    Locator::Css(self.steps.passcode_input),
                    "passcode input",
                    PASSCODE_WAIT_SECS,
                )
                .await?;
            input
                .send_keys(password)
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let submit = self
                .wait_for(
                    Locator::XPath(self.steps.passcode_submit),
                    "passcode submit",
                    PASSCODE_WAIT_SECS,
                )
                .await?;
            submit
                .click()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;
            debug!("passcode submitted");
        }

        Ok(ShareSession {
            url: share.url.clone(),
            pwd_id: parse_pwd_id(&share.url).unwrap_or_default(),
            passcode: share.password.clone().unwrap_or_default(),
            // UI automation has no token exchange
            stoken: String::new(),
        })
    }

    /// Waits for the share page to settle and reads its title.
    ///
    /// The UI flow saves the whole share by activating page controls, so no
    /// file descriptors are collected; the returned page is empty.
    #[instrument(skip(self, _session))]
    async fn list_contents(&self, _session: &ShareSession) -> Result<ShareListing, ProviderError> {
        // The save control appearing is the page-settled signal
        self.wait_for(
            Locator::XPath(self.steps.save_button),
            "share page settle",
            STEP_WAIT_SECS,
        )
        .await?;

        let title = self
            .client
            .execute("return document.title;", vec![])
            .await
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        Ok(ShareListing {
            title,
            files: Vec::new(),
        })
    }

    #[instrument(skip(self, _session, _files))]
    async fn copy_to_account(
        &self,
        _session: &ShareSession,
        _files: &[FileDescriptor],
        _destination: &str,
    ) -> Result<(), ProviderError> {
        if let Some(selector) = self.steps.select_all {
            let select_all = self
                .wait_for(Locator::Css(selector), "select all", STEP_WAIT_SECS)
                .await?;
            select_all
                .click()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;
        }

        let save = self
            .wait_for(
                Locator::XPath(self.steps.save_button),
                "save button",
                STEP_WAIT_SECS,
            )
            .await?;
        save.click()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let confirm = self
            .wait_for(
                Locator::XPath(self.steps.confirm_button),
                "confirm button",
                STEP_WAIT_SECS,
            )
            .await?;
        confirm
            .click()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Let the save request land before the next navigation
        tokio::time::sleep(Duration::from_secs(CONFIRM_SETTLE_SECS)).await;
        debug!("save flow completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baidu_steps_selectors_present() {
        let steps = BrowserSteps::baidu();
        assert!(steps.origin.starts_with("https://pan.baidu.com"));
        assert!(!steps.passcode_input.is_empty());
        assert!(steps.passcode_submit.contains("提取文件"));
        assert!(steps.save_button.contains("保存"));
        assert!(steps.confirm_button.contains("确定"));
        assert!(steps.select_all.is_some());
    }

    #[test]
    fn test_step_waits_are_bounded() {
        assert!(STEP_WAIT_SECS <= 15, "step waits stay low-double-digit");
        assert!(PASSCODE_WAIT_SECS <= STEP_WAIT_SECS);
    }
}
