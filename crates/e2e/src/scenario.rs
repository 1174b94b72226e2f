//! Scenario context and the ordered sign-up steps

use std::fmt;

use once_cell::sync::OnceCell;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::mailslurp::Email;
use crate::profile::SiteProfile;

/// The steps of the sign-up scenario, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    LoadSite,
    StartSignUp,
    CreateInboxAndSignUp,
    AwaitConfirmationEmail,
    ExtractCode,
    SubmitCode,
    VerifyLogin,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::LoadSite,
        Step::StartSignUp,
        Step::CreateInboxAndSignUp,
        Step::AwaitConfirmationEmail,
        Step::ExtractCode,
        Step::SubmitCode,
        Step::VerifyLogin,
    ];

    /// 1-based position
    pub fn number(&self) -> usize {
        Step::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::LoadSite => "load_site",
            Step::StartSignUp => "start_sign_up",
            Step::CreateInboxAndSignUp => "create_inbox_and_sign_up",
            Step::AwaitConfirmationEmail => "await_confirmation_email",
            Step::ExtractCode => "extract_code",
            Step::SubmitCode => "submit_code",
            Step::VerifyLogin => "verify_login",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::LoadSite => "Load the playground",
            Step::StartSignUp => "Open the sign-up form",
            Step::CreateInboxAndSignUp => "Create an inbox and submit sign-up",
            Step::AwaitConfirmationEmail => "Receive the confirmation email",
            Step::ExtractCode => "Extract the confirmation code",
            Step::SubmitCode => "Submit the confirmation code",
            Step::VerifyLogin => "Sign in as the confirmed user",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.name())
    }
}

/// Values handed from one step to a later one
///
/// Each slot is written once and read afterwards. Writing twice, or reading a
/// slot before the step that fills it, is a [`E2eError::Context`] error.
#[derive(Debug)]
pub struct ScenarioContext {
    password: String,
    inbox_id: OnceCell<String>,
    inbox_address: OnceCell<String>,
    received_message: OnceCell<Email>,
    confirmation_code: OnceCell<String>,
}

impl ScenarioContext {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            inbox_id: OnceCell::new(),
            inbox_address: OnceCell::new(),
            received_message: OnceCell::new(),
            confirmation_code: OnceCell::new(),
        }
    }

    /// Context with a freshly generated password
    pub fn with_generated_password() -> Self {
        Self::new(generate_password())
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn inbox_id(&self) -> E2eResult<&str> {
        read(&self.inbox_id, "inbox_id").map(String::as_str)
    }

    pub fn inbox_address(&self) -> E2eResult<&str> {
        read(&self.inbox_address, "inbox_address").map(String::as_str)
    }

    pub fn received_message(&self) -> E2eResult<&Email> {
        read(&self.received_message, "received_message")
    }

    pub fn confirmation_code(&self) -> E2eResult<&str> {
        read(&self.confirmation_code, "confirmation_code").map(String::as_str)
    }

    pub fn set_inbox(&self, id: String, address: String) -> E2eResult<()> {
        write(&self.inbox_id, id, "inbox_id")?;
        write(&self.inbox_address, address, "inbox_address")
    }

    pub fn set_received_message(&self, email: Email) -> E2eResult<()> {
        write(&self.received_message, email, "received_message")
    }

    pub fn set_confirmation_code(&self, code: String) -> E2eResult<()> {
        write(&self.confirmation_code, code, "confirmation_code")
    }

    /// Serializable view with the password left out
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            inbox_id: self.inbox_id.get().cloned(),
            inbox_address: self.inbox_address.get().cloned(),
            email_subject: self.received_message.get().map(|e| e.subject.clone()),
            confirmation_code: self.confirmation_code.get().cloned(),
        }
    }
}

fn read<'a, T>(cell: &'a OnceCell<T>, name: &str) -> E2eResult<&'a T> {
    cell.get()
        .ok_or_else(|| E2eError::Context(format!("{} read before it was set", name)))
}

fn write<T>(cell: &OnceCell<T>, value: T, name: &str) -> E2eResult<()> {
    cell.set(value)
        .map_err(|_| E2eError::Context(format!("{} is already set", name)))
}

/// What a run produced, for reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub inbox_id: Option<String>,
    pub inbox_address: Option<String>,
    pub email_subject: Option<String>,
    pub confirmation_code: Option<String>,
}

/// Random sign-up password, `password-<n>`
pub fn generate_password() -> String {
    format!("password-{}", rand::thread_rng().gen::<u64>())
}

/// Pull the confirmation code out of an email body.
///
/// The first match of the profile's pattern wins; later matches are ignored.
pub fn extract_confirmation_code(body: &str, profile: &SiteProfile) -> E2eResult<String> {
    let pattern = profile.code_regex()?;

    let code = pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            E2eError::assertion(format!(
                "email body does not match '{}'",
                profile.code_pattern
            ))
        })?;

    if code.chars().count() != profile.code_length {
        return Err(E2eError::assertion(format!(
            "confirmation code '{}' has {} characters, expected {}",
            code,
            code.chars().count(),
            profile.code_length
        )));
    }

    Ok(code)
}
