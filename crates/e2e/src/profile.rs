//! Site profile: selectors and expected strings for the site under test
//!
//! The default profile targets the MailSlurp authentication playground. A YAML
//! file can override any field:
//!
//! ```yaml
//! base_url: https://playground.mailslurp.com
//! expected_title: React App
//! sign_up:
//!   submit: { css: "[data-test=sign-up-create-account-button]" }
//! ```

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::webdriver::Locator;

/// Everything site-specific the scenario needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Page loaded in steps 1 and 7
    pub base_url: String,

    /// Title the landing page must have
    pub expected_title: String,

    /// Link that switches from sign-in to sign-up
    pub create_account_link: Locator,

    pub sign_up: SignUpForm,

    pub confirm: ConfirmForm,

    pub sign_in: SignInForm,

    /// Heading shown to signed-in users
    pub welcome_heading: Locator,

    /// Substring the heading must contain
    pub welcome_text: String,

    /// Substring the confirmation email's subject must contain
    pub confirmation_subject: String,

    /// First capture group is the code
    pub code_pattern: String,

    pub code_length: usize,

    /// Substring every provisioned inbox address must contain
    pub inbox_domain_suffix: String,

    #[serde(skip)]
    compiled_pattern: OnceCell<Regex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub email: Locator,
    pub password: Locator,
    pub submit: Locator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub code: Locator,
    pub submit: Locator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub username: Locator,
    pub password: Locator,
    pub submit: Locator,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://playground.mailslurp.com".to_string(),
            expected_title: "React App".to_string(),
            create_account_link: Locator::css("[data-test=sign-in-create-account-link]"),
            sign_up: SignUpForm::default(),
            confirm: ConfirmForm::default(),
            sign_in: SignInForm::default(),
            welcome_heading: Locator::tag("h1"),
            welcome_text: "Welcome".to_string(),
            confirmation_subject: "Please confirm your email address".to_string(),
            code_pattern: r"verification code is (\d+)".to_string(),
            code_length: 6,
            inbox_domain_suffix: "@mailslurp.com".to_string(),
            compiled_pattern: OnceCell::new(),
        }
    }
}

impl Default for SignUpForm {
    fn default() -> Self {
        Self {
            email: Locator::name("email"),
            password: Locator::name("password"),
            submit: Locator::css("[data-test=sign-up-create-account-button]"),
        }
    }
}

impl Default for ConfirmForm {
    fn default() -> Self {
        Self {
            code: Locator::name("code"),
            submit: Locator::css("[data-test=confirm-sign-up-confirm-button]"),
        }
    }
}

impl Default for SignInForm {
    fn default() -> Self {
        Self {
            username: Locator::name("username"),
            password: Locator::name("password"),
            submit: Locator::css("[data-test=sign-in-sign-in-button]"),
        }
    }
}

impl SiteProfile {
    /// Parse a profile from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let profile: Self =
            serde_yaml::from_str(yaml).map_err(|e| E2eError::ProfileParse(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parse a profile from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::ProfileParse(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject profiles whose code pattern cannot be used
    pub fn validate(&self) -> E2eResult<()> {
        let pattern = self.code_regex()?;
        if pattern.captures_len() < 2 {
            return Err(E2eError::ProfileParse(format!(
                "code_pattern '{}' has no capture group",
                self.code_pattern
            )));
        }
        if self.code_length == 0 {
            return Err(E2eError::ProfileParse("code_length must be positive".into()));
        }
        Ok(())
    }

    /// The compiled code pattern
    pub fn code_regex(&self) -> E2eResult<&Regex> {
        self.compiled_pattern
            .get_or_try_init(|| Regex::new(&self.code_pattern))
            .map_err(E2eError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_targets_playground() {
        let profile = SiteProfile::default();
        assert_eq!(profile.base_url, "https://playground.mailslurp.com");
        assert_eq!(profile.expected_title, "React App");
        assert_eq!(profile.sign_in.username, Locator::name("username"));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r##"
base_url: http://localhost:3000
expected_title: Staging
sign_up:
  submit:
    css: "#create"
"##;
        let profile = SiteProfile::from_yaml(yaml).unwrap();
        assert_eq!(profile.base_url, "http://localhost:3000");
        assert_eq!(profile.expected_title, "Staging");
        assert_eq!(profile.sign_up.submit, Locator::css("#create"));
        assert_eq!(profile.sign_up.email, Locator::name("email"));
        assert_eq!(profile.welcome_text, "Welcome");
    }

    #[test]
    fn test_pattern_without_group_is_rejected() {
        let err = SiteProfile::from_yaml("code_pattern: 'code is \\d+'").unwrap_err();
        assert!(matches!(err, E2eError::ProfileParse(_)));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = SiteProfile::from_yaml("code_pattern: '('").unwrap_err();
        assert!(matches!(err, E2eError::Regex(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yaml");
        std::fs::write(&path, "welcome_text: Hello\ncode_length: 4\n").unwrap();

        let profile = SiteProfile::from_file(&path).unwrap();
        assert_eq!(profile.welcome_text, "Hello");
        assert_eq!(profile.code_length, 4);
    }
}
