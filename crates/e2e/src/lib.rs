//! mailprobe end-to-end runner
//!
//! Drives a real browser and a real disposable inbox through a sign-up flow
//! that confirms the account by email:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1. load_site                  browser: navigate, title     │
//! │  2. start_sign_up              browser: click               │
//! │  3. create_inbox_and_sign_up   mailbox: create_inbox        │
//! │  4. await_confirmation_email   mailbox: wait (bounded)      │
//! │  5. extract_code               regex over the email body    │
//! │  6. submit_code                browser: type, click         │
//! │  7. verify_login               browser: navigate, read h1   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserDriver  -> WebDriverClient (W3C over HTTP)          │
//! │  MailboxService -> MailSlurpClient (REST)                   │
//! │  DriverProcess  -> geckodriver / chromedriver subprocess    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The run stops at the first failing step and always closes the browser.

pub mod config;
pub mod driver;
pub mod error;
pub mod mailslurp;
pub mod profile;
pub mod runner;
pub mod scenario;
pub mod wait;
pub mod webdriver;

pub use config::ScenarioConfig;
pub use error::{E2eError, E2eResult, FailureKind};
pub use mailslurp::{Email, Inbox, MailSlurpClient, MailboxService};
pub use profile::SiteProfile;
pub use runner::{run_live, RunnerConfig, ScenarioReport, ScenarioRunner};
pub use scenario::{ScenarioContext, Step};
pub use webdriver::{Browser, BrowserDriver, Locator, WebDriverClient};
