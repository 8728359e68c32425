use crate::config::UserProfile;
use crate::{COURSE_TABLE_ID, SEMESTER_SELECT_ID, UPDATE_PANEL_ID};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const FIELD_TIMEOUT: Duration = Duration::from_secs(20);
const POST_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
// The dashboard panel renders through a partial postback and can lag well
// behind navigation.
const PANEL_TIMEOUT: Duration = Duration::from_secs(45);
const SETTLE_SHORT: Duration = Duration::from_secs(2);
const SETTLE_LONG: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to configure browser: {0}")]
    Setup(String),
    #[error("browser error: {0}")]
    Browser(#[from] CdpError),
    #[error("timed out after {waited:?} waiting for `{selector}`")]
    Timeout { selector: String, waited: Duration },
    #[error("no selectable semester option in the dropdown")]
    NoSemester,
    #[error("could not read dashboard fragment: {0}")]
    Fragment(#[from] serde_json::Error),
}

impl SessionError {
    /// Short label used in failure-snapshot filenames.
    fn kind(&self) -> &'static str {
        match self {
            SessionError::Setup(_) => "setup",
            SessionError::Browser(_) => "browser",
            SessionError::Timeout { .. } => "timeout",
            SessionError::NoSemester => "no_semester",
            SessionError::Fragment(_) => "fragment",
        }
    }
}

/// The two portal URLs shared by every user session.
#[derive(Debug, Clone)]
pub struct PortalUrls {
    pub login: String,
    pub dashboard: String,
}

/// Drives one headless Chrome session per user through login, dashboard
/// navigation and semester selection, and captures the rendered dashboard
/// panel as an HTML fragment.
///
/// Sessions are strictly sequential and the browser is torn down on every
/// exit path, so a failing user never leaks a Chrome process into the next
/// iteration.
pub struct SessionCollector {
    headless: bool,
    browser_path: Option<String>,
    snapshot_dir: PathBuf,
}

impl SessionCollector {
    pub fn new(headless: bool, browser_path: Option<String>, snapshot_dir: PathBuf) -> Self {
        Self {
            headless,
            browser_path,
            snapshot_dir,
        }
    }

    /// Returns the inner HTML of the dashboard update panel for `user`, or
    /// the failure that stopped the flow. On failure a full-page snapshot
    /// is saved to the snapshot dir, keyed by user id and failure kind.
    pub async fn fetch_dashboard(
        &self,
        user: &UserProfile,
        urls: &PortalUrls,
    ) -> Result<String, SessionError> {
        log::info!(
            "starting browser session for user {} (section {})",
            user.id,
            user.section_label
        );
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = match browser.new_page("about:blank").await {
            Ok(page) => {
                let result = self.drive(&page, user, urls).await;
                if let Err(e) = &result {
                    self.snapshot_failure(&page, user, e.kind()).await;
                }
                result
            }
            Err(e) => Err(SessionError::Browser(e)),
        };

        if let Err(e) = browser.close().await {
            log::warn!("error closing browser for user {}: {e}", user.id);
        }
        let _ = browser.wait().await;
        events.abort();
        log::info!("browser session for user {} closed", user.id);

        outcome
    }

    async fn drive(
        &self,
        page: &Page,
        user: &UserProfile,
        urls: &PortalUrls,
    ) -> Result<String, SessionError> {
        page.goto(urls.login.as_str()).await?;
        let username = self.wait_for(page, "#logMain_UserName", FIELD_TIMEOUT).await?;
        username.click().await?;
        username.type_str(&user.username).await?;
        let password = self.wait_for(page, "#logMain_Password", FIELD_TIMEOUT).await?;
        password.click().await?;
        password.type_str(&user.password).await?;
        self.wait_for(page, "#logMain_Button1", FIELD_TIMEOUT)
            .await?
            .click()
            .await?;
        self.wait_for(page, "#ctl00_lbtnUserName", POST_LOGIN_TIMEOUT)
            .await?;
        log::info!("logged in as {}", user.id);
        tokio::time::sleep(SETTLE_SHORT).await;

        page.goto(urls.dashboard.as_str()).await?;
        tokio::time::sleep(SETTLE_SHORT).await;
        self.wait_for(page, &format!("#{SEMESTER_SELECT_ID}"), PANEL_TIMEOUT)
            .await?;

        let semester = self.first_semester_label(page).await?;
        log::info!(
            "selecting semester '{semester}' for section {}",
            user.section_label
        );
        // The select is skinned with Select2, so the real option list only
        // appears after clicking the widget.
        self.wait_for_xpath(page, &select2_container_xpath(), FIELD_TIMEOUT)
            .await?
            .click()
            .await?;
        self.wait_for_xpath(page, &select2_option_xpath(&semester), FIELD_TIMEOUT)
            .await?
            .click()
            .await?;
        tokio::time::sleep(SETTLE_LONG).await;

        let table_selector = format!("#{UPDATE_PANEL_ID} table#{COURSE_TABLE_ID}");
        self.wait_for(page, &table_selector, PANEL_TIMEOUT).await?;

        let fragment = page
            .evaluate(format!(
                "document.getElementById('{UPDATE_PANEL_ID}').innerHTML"
            ))
            .await?
            .into_value::<String>()?;
        Ok(fragment)
    }

    /// Label of the first real semester option; value "0" is the portal's
    /// "select one" placeholder.
    async fn first_semester_label(&self, page: &Page) -> Result<String, SessionError> {
        let options = page
            .find_elements(format!("#{SEMESTER_SELECT_ID} option"))
            .await?;
        for option in options {
            if option.attribute("value").await?.as_deref() == Some("0") {
                continue;
            }
            if let Some(text) = option.inner_text().await? {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    return Ok(text);
                }
            }
        }
        Err(SessionError::NoSemester)
    }

    async fn wait_for(
        &self,
        page: &Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        let start = Instant::now();
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(_) if start.elapsed() < timeout => tokio::time::sleep(POLL_INTERVAL).await,
                Err(_) => {
                    return Err(SessionError::Timeout {
                        selector: selector.to_string(),
                        waited: timeout,
                    });
                }
            }
        }
    }

    async fn wait_for_xpath(
        &self,
        page: &Page,
        xpath: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        let start = Instant::now();
        loop {
            match page.find_xpath(xpath).await {
                Ok(element) => return Ok(element),
                Err(_) if start.elapsed() < timeout => tokio::time::sleep(POLL_INTERVAL).await,
                Err(_) => {
                    return Err(SessionError::Timeout {
                        selector: xpath.to_string(),
                        waited: timeout,
                    });
                }
            }
        }
    }

    async fn snapshot_failure(&self, page: &Page, user: &UserProfile, kind: &str) {
        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("could not capture page source for user {}: {e}", user.id);
                return;
            }
        };
        let path = self
            .snapshot_dir
            .join(format!("error_page_{kind}_{}.html", user.id));
        match fs::create_dir_all(&self.snapshot_dir).and_then(|()| fs::write(&path, html)) {
            Ok(()) => log::warn!("saved failure snapshot to {}", path.display()),
            Err(e) => log::warn!("could not save failure snapshot for user {}: {e}", user.id),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox");
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.browser_path {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(SessionError::Setup)
    }
}

fn select2_container_xpath() -> String {
    format!(
        "//select[@id='{SEMESTER_SELECT_ID}']\
         /following-sibling::span[contains(@class,'select2-container')]\
         //span[contains(@class,'select2-selection--single')]"
    )
}

fn select2_option_xpath(label: &str) -> String {
    format!(
        "//span[contains(@class,'select2-results')]\
         //ul[contains(@class,'select2-results__options')]\
         //li[text()={}]",
        xpath_literal(label)
    )
}

/// Quotes a string for use inside an XPath expression. XPath 1.0 has no
/// escape syntax, so labels containing an apostrophe need `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let pieces: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", pieces.join(", \"'\", "))
    }
}
