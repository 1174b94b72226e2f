//! In-memory browser and mailbox stand-ins for runner tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use mailprobe_e2e::mailslurp::CreateInboxOptions;
use mailprobe_e2e::webdriver::ElementRef;
use mailprobe_e2e::{BrowserDriver, E2eError, E2eResult, Email, Inbox, Locator, MailboxService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    ImplicitWait(Duration),
    Navigate(String),
    Title,
    Find(String),
    Click(String),
    SendKeys(String, String),
    Text(String),
    Close,
}

/// Scripted browser; element refs are the locator's display string
#[derive(Clone)]
pub struct FakeBrowser {
    pub calls: Arc<Mutex<Vec<BrowserCall>>>,
    pub title: String,
    pub welcome_text: String,
    pub missing: Vec<Locator>,
    pub fail_close: bool,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            title: "React App".to_string(),
            welcome_text: "Welcome user!".to_string(),
            missing: Vec::new(),
            fail_close: false,
        }
    }

    pub fn calls(&self) -> Vec<BrowserCall> {
        self.calls.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == BrowserCall::Close)
            .count()
    }

    /// Text typed into the element found by `locator`
    pub fn typed_into(&self, locator: &Locator) -> Vec<String> {
        let key = locator.to_string();
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BrowserCall::SendKeys(el, text) if el == key => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BrowserCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn set_implicit_wait(&self, timeout: Duration) -> E2eResult<()> {
        self.record(BrowserCall::ImplicitWait(timeout));
        Ok(())
    }

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.record(BrowserCall::Navigate(url.to_string()));
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        self.record(BrowserCall::Title);
        Ok(self.title.clone())
    }

    async fn find_element(&self, locator: &Locator) -> E2eResult<ElementRef> {
        self.record(BrowserCall::Find(locator.to_string()));
        if self.missing.contains(locator) {
            return Err(E2eError::ElementNotFound(locator.to_string()));
        }
        Ok(ElementRef(locator.to_string()))
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        self.record(BrowserCall::Click(element.0.clone()));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        self.record(BrowserCall::SendKeys(element.0.clone(), text.to_string()));
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        self.record(BrowserCall::Text(element.0.clone()));
        Ok(self.welcome_text.clone())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record(BrowserCall::Close);
        if self.fail_close {
            return Err(E2eError::WebDriver {
                code: "invalid session id".to_string(),
                message: "session already gone".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxCall {
    CreateInbox,
    WaitForLatestEmail {
        inbox_id: String,
        timeout: Duration,
        unread_only: bool,
    },
}

/// How the stub answers `wait_for_latest_email`
#[derive(Clone)]
pub enum Delivery {
    After(Duration, Email),
    Never,
    Fail(u16),
}

#[derive(Clone)]
pub struct FakeMailbox {
    pub calls: Arc<Mutex<Vec<MailboxCall>>>,
    pub inbox: Inbox,
    pub delivery: Delivery,
}

impl FakeMailbox {
    pub fn new(inbox: Inbox, delivery: Delivery) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            inbox,
            delivery,
        }
    }

    /// The inbox and confirmation email used throughout the runner tests
    pub fn confirming() -> Self {
        Self::new(
            Inbox::new("abc", "abc@mailslurp.com"),
            Delivery::After(
                Duration::from_millis(20),
                Email::new(
                    "Please confirm your email address",
                    "Your verification code is 482913 today",
                ),
            ),
        )
    }

    pub fn calls(&self) -> Vec<MailboxCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MailboxService for FakeMailbox {
    async fn create_inbox(&self, _options: &CreateInboxOptions) -> E2eResult<Inbox> {
        self.calls.lock().push(MailboxCall::CreateInbox);
        Ok(self.inbox.clone())
    }

    async fn wait_for_latest_email(
        &self,
        inbox_id: &str,
        timeout: Duration,
        unread_only: bool,
    ) -> E2eResult<Email> {
        self.calls.lock().push(MailboxCall::WaitForLatestEmail {
            inbox_id: inbox_id.to_string(),
            timeout,
            unread_only,
        });

        match &self.delivery {
            Delivery::After(delay, email) => {
                tokio::time::sleep(*delay).await;
                Ok(email.clone())
            }
            Delivery::Never => std::future::pending().await,
            Delivery::Fail(status) => Err(E2eError::MailboxApi {
                status: *status,
                message: "stub failure".to_string(),
            }),
        }
    }
}
