//! Scenario configuration
//!
//! The API credential and the browser-driver path come from the environment and
//! are checked once, before any browser or network action.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::webdriver::Browser;

/// Environment variable holding the MailSlurp API key
pub const API_KEY_ENV: &str = "API_KEY";

/// Environment variable holding the path to the browser-driver executable
pub const WEBDRIVER_PATH_ENV: &str = "PATH_TO_WEBDRIVER";

/// Environment variable overriding the MailSlurp API base URL
pub const MAILSLURP_BASE_URL_ENV: &str = "MAILSLURP_BASE_URL";

pub const DEFAULT_MAILSLURP_BASE_URL: &str = "https://api.mailslurp.com";

/// Email wait and implicit element wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Configuration for one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// MailSlurp API key
    pub api_key: String,

    /// Path to geckodriver / chromedriver
    pub webdriver_path: PathBuf,

    /// MailSlurp API base URL
    pub mailslurp_base_url: String,

    /// Browser driven by the driver executable
    pub browser: Browser,

    /// Run the browser without a window
    pub headless: bool,

    /// Service-side email wait and browser implicit wait
    pub timeout: Duration,

    /// Local slack on top of `timeout` for the email wait round trip
    pub network_grace: Duration,

    /// Only accept messages not yet read
    pub unread_only: bool,

    /// How long the driver executable gets to report ready
    pub driver_startup_timeout: Duration,
}

impl ScenarioConfig {
    /// Build a config from explicit values, validating the preconditions
    pub fn new(api_key: Option<String>, webdriver_path: Option<PathBuf>) -> E2eResult<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| E2eError::Config(format!("{} is not set", API_KEY_ENV)))?;

        let webdriver_path = webdriver_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| E2eError::Config(format!("{} is not set", WEBDRIVER_PATH_ENV)))?;

        let config = Self {
            api_key,
            webdriver_path,
            mailslurp_base_url: DEFAULT_MAILSLURP_BASE_URL.to_string(),
            browser: Browser::default(),
            headless: false,
            timeout: DEFAULT_TIMEOUT,
            network_grace: Duration::from_secs(5),
            unread_only: true,
            driver_startup_timeout: Duration::from_secs(30),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            lookup(API_KEY_ENV),
            lookup(WEBDRIVER_PATH_ENV).map(PathBuf::from),
        )?;
        if let Some(url) = lookup(MAILSLURP_BASE_URL_ENV).filter(|u| !u.is_empty()) {
            config.mailslurp_base_url = url;
        }
        Ok(config)
    }

    /// Check that the driver executable exists on disk
    pub fn validate(&self) -> E2eResult<()> {
        check_driver_path(&self.webdriver_path)?;
        debug!(
            "Configuration ok: driver={}, api={}",
            self.webdriver_path.display(),
            self.mailslurp_base_url
        );
        Ok(())
    }

    /// Upper bound applied locally to the email wait
    pub fn email_wait_bound(&self) -> Duration {
        self.timeout + self.network_grace
    }
}

fn check_driver_path(path: &Path) -> E2eResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(E2eError::DriverNotFound(path.display().to_string()))
    }
}
