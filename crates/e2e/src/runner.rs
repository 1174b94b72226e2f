//! Scenario runner that drives the browser and the mailbox through the sign-up flow

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ScenarioConfig;
use crate::driver::{DriverConfig, DriverProcess};
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::mailslurp::{CreateInboxOptions, MailSlurpClient, MailboxService};
use crate::profile::SiteProfile;
use crate::scenario::{extract_confirmation_code, ContextSnapshot, ScenarioContext, Step};
use crate::wait;
use crate::webdriver::{BrowserDriver, Locator, WebDriverClient};

/// Result of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Where and why a run stopped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: Step,
    pub kind: FailureKind,
    pub message: String,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    /// Steps never started because an earlier one failed
    pub skipped: Vec<Step>,
    pub failure: Option<StepFailure>,
    /// Closing the browser failed; never masks `failure`
    pub teardown_error: Option<String>,
    pub context: ContextSnapshot,
}

impl ScenarioReport {
    /// Steps that ran, in order
    pub fn executed(&self) -> Vec<Step> {
        self.steps.iter().map(|r| r.step).collect()
    }

    /// Write the report as JSON into `output_dir`
    pub fn write_to(&self, output_dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Settings the runner needs from the wider configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub profile: SiteProfile,

    /// Implicit element wait and service-side email wait
    pub timeout: Duration,

    /// Local bound on the email wait
    pub email_wait_bound: Duration,

    pub unread_only: bool,
}

impl RunnerConfig {
    pub fn from_scenario(config: &ScenarioConfig, profile: SiteProfile) -> Self {
        Self {
            profile,
            timeout: config.timeout,
            email_wait_bound: config.email_wait_bound(),
            unread_only: config.unread_only,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            profile: SiteProfile::default(),
            timeout: crate::config::DEFAULT_TIMEOUT,
            email_wait_bound: crate::config::DEFAULT_TIMEOUT + Duration::from_secs(5),
            unread_only: true,
        }
    }
}

/// Runs the seven sign-up steps in order against one browser and one mailbox
pub struct ScenarioRunner<B, M> {
    browser: B,
    mailbox: M,
    config: RunnerConfig,
    context: ScenarioContext,
}

impl<B: BrowserDriver, M: MailboxService> ScenarioRunner<B, M> {
    /// Create a runner with a freshly generated password
    pub fn new(browser: B, mailbox: M, config: RunnerConfig) -> Self {
        Self::with_context(browser, mailbox, config, ScenarioContext::with_generated_password())
    }

    pub fn with_context(browser: B, mailbox: M, config: RunnerConfig, context: ScenarioContext) -> Self {
        Self {
            browser,
            mailbox,
            config,
            context,
        }
    }

    /// Run every step, stopping at the first failure, then close the browser
    pub async fn run(self) -> ScenarioReport {
        let start = Instant::now();
        let mut steps = Vec::new();
        let mut failure = None;
        let mut skipped = Vec::new();

        info!("Running sign-up scenario against {}", self.config.profile.base_url);

        for step in Step::ALL {
            if failure.is_some() {
                skipped.push(step);
                continue;
            }

            let step_start = Instant::now();
            debug!("Executing step {}", step);

            let result = self.execute(step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    info!("✓ {} ({} ms)", step, duration_ms);
                    steps.push(StepResult {
                        step,
                        success: true,
                        duration_ms,
                        error: None,
                    });
                }
                Err(e) => {
                    error!("✗ {} - {}", step, e);
                    steps.push(StepResult {
                        step,
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                    failure = Some(StepFailure {
                        step,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let teardown_error = match self.browser.close().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Browser teardown failed: {}", e);
                Some(e.to_string())
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let success = failure.is_none();

        info!(
            "Scenario {} after {} of {} steps ({} ms)",
            if success { "passed" } else { "failed" },
            steps.len(),
            Step::ALL.len(),
            duration_ms
        );

        ScenarioReport {
            success,
            duration_ms,
            steps,
            skipped,
            failure,
            teardown_error,
            context: self.context.snapshot(),
        }
    }

    async fn execute(&self, step: Step) -> E2eResult<()> {
        let profile = &self.config.profile;

        match step {
            Step::LoadSite => {
                self.browser.set_implicit_wait(self.config.timeout).await?;
                self.browser.navigate(&profile.base_url).await?;

                let title = self.browser.title().await?;
                if title != profile.expected_title {
                    return Err(E2eError::assertion(format!(
                        "page title '{}' != '{}'",
                        title, profile.expected_title
                    )));
                }
                Ok(())
            }
            Step::StartSignUp => self.click(&profile.create_account_link).await,
            Step::CreateInboxAndSignUp => {
                let inbox = self
                    .mailbox
                    .create_inbox(&CreateInboxOptions::default())
                    .await?;

                if inbox.id.is_empty() {
                    return Err(E2eError::assertion("created inbox has no id"));
                }
                if !inbox.email_address.contains(&profile.inbox_domain_suffix) {
                    return Err(E2eError::assertion(format!(
                        "inbox address '{}' does not contain '{}'",
                        inbox.email_address, profile.inbox_domain_suffix
                    )));
                }
                self.context.set_inbox(inbox.id, inbox.email_address)?;

                self.fill(&profile.sign_up.email, self.context.inbox_address()?)
                    .await?;
                self.fill(&profile.sign_up.password, self.context.password())
                    .await?;
                self.click(&profile.sign_up.submit).await
            }
            Step::AwaitConfirmationEmail => {
                let inbox_id = self.context.inbox_id()?;
                let email = wait::bounded(
                    self.config.email_wait_bound,
                    "confirmation email",
                    self.mailbox.wait_for_latest_email(
                        inbox_id,
                        self.config.timeout,
                        self.config.unread_only,
                    ),
                )
                .await?;
                self.context.set_received_message(email)?;

                let subject = &self.context.received_message()?.subject;
                if !subject.contains(&profile.confirmation_subject) {
                    return Err(E2eError::assertion(format!(
                        "email subject '{}' does not contain '{}'",
                        subject, profile.confirmation_subject
                    )));
                }
                Ok(())
            }
            Step::ExtractCode => {
                let body = &self.context.received_message()?.body;
                let code = extract_confirmation_code(body, profile)?;
                debug!("Extracted confirmation code {}", code);
                self.context.set_confirmation_code(code)
            }
            Step::SubmitCode => {
                self.fill(&profile.confirm.code, self.context.confirmation_code()?)
                    .await?;
                self.click(&profile.confirm.submit).await
            }
            Step::VerifyLogin => {
                self.browser.navigate(&profile.base_url).await?;

                self.fill(&profile.sign_in.username, self.context.inbox_address()?)
                    .await?;
                self.fill(&profile.sign_in.password, self.context.password())
                    .await?;
                self.click(&profile.sign_in.submit).await?;

                let heading = self.browser.find_element(&profile.welcome_heading).await?;
                let text = self.browser.text(&heading).await?;
                if !text.contains(&profile.welcome_text) {
                    return Err(E2eError::assertion(format!(
                        "welcome heading '{}' does not contain '{}'",
                        text, profile.welcome_text
                    )));
                }
                Ok(())
            }
        }
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let element = self.browser.find_element(locator).await?;
        self.browser.click(&element).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let element = self.browser.find_element(locator).await?;
        self.browser.send_keys(&element, text).await
    }
}

/// Spawn the driver, open a session, and run the scenario against the live services
pub async fn run_live(config: &ScenarioConfig, profile: SiteProfile) -> E2eResult<ScenarioReport> {
    config.validate()?;
    profile.validate()?;

    let mailbox = MailSlurpClient::from_config(config)?;
    let driver = DriverProcess::spawn(DriverConfig::from_scenario(config)).await?;
    let browser =
        WebDriverClient::new_session(driver.base_url(), config.browser, config.headless).await?;

    let runner = ScenarioRunner::new(browser, mailbox, RunnerConfig::from_scenario(config, profile));
    let report = runner.run().await;

    drop(driver);
    Ok(report)
}
