//! MailSlurp mailbox client
//!
//! Covers the slice of the MailSlurp REST API used here: disposable inbox
//! creation, blocking wait for the latest email, sending, and paginated listing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::error::{E2eError, E2eResult};

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-api-key";

/// Mailbox operations the scenario depends on
#[async_trait]
pub trait MailboxService: Send + Sync {
    /// Provision a new disposable inbox
    async fn create_inbox(&self, options: &CreateInboxOptions) -> E2eResult<Inbox>;

    /// Block until a message lands in `inbox_id`, or the service gives up after `timeout`
    async fn wait_for_latest_email(
        &self,
        inbox_id: &str,
        timeout: Duration,
        unread_only: bool,
    ) -> E2eResult<Email>;
}

/// A disposable inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email_address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Inbox {
    pub fn new(id: impl Into<String>, email_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email_address: email_address.into(),
            name: None,
            created_at: None,
        }
    }
}

/// A received email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
}

impl Email {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            subject: subject.into(),
            body: body.into(),
            from: None,
            to: Vec::new(),
            created_at: None,
            read: false,
        }
    }
}

/// Optional inbox creation parameters; all unset by default
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInboxOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favourite: Option<bool>,
    /// Lifetime in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_domain_pool: Option<bool>,
}

/// Outgoing email
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailOptions {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(rename = "isHTML")]
    pub is_html: bool,
}

/// Summary row from an inbox listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPreview {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
}

/// One page of email previews
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEmailPreview {
    #[serde(default)]
    pub content: Vec<EmailPreview>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Listing order by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sort {
    Asc,
    #[default]
    Desc,
}

impl Sort {
    fn as_str(&self) -> &'static str {
        match self {
            Sort::Asc => "ASC",
            Sort::Desc => "DESC",
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// HTTP client for the MailSlurp API
#[derive(Clone)]
pub struct MailSlurpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MailSlurpClient {
    /// Create a client; `connect_timeout` bounds connection setup only
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        connect_timeout: Duration,
    ) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ScenarioConfig) -> E2eResult<Self> {
        Self::new(&config.mailslurp_base_url, &config.api_key, config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an email from `inbox_id`
    pub async fn send_email(&self, inbox_id: &str, options: &SendEmailOptions) -> E2eResult<()> {
        debug!("Sending email from inbox {} to {:?}", inbox_id, options.to);

        let resp = self
            .http
            .post(self.url(&format!("/inboxes/{}", inbox_id)))
            .header(API_KEY_HEADER, &self.api_key)
            .json(options)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// List emails in an inbox one page at a time
    pub async fn get_inbox_emails_paginated(
        &self,
        inbox_id: &str,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> E2eResult<PageEmailPreview> {
        let resp = self
            .http
            .get(self.url(&format!("/inboxes/{}/emails/paginated", inbox_id)))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("page", page.to_string()),
                ("size", size.to_string()),
                ("sort", sort.as_str().to_string()),
            ])
            .send()
            .await?;
        let page = check_status(resp).await?.json::<PageEmailPreview>().await?;
        Ok(page)
    }
}

#[async_trait]
impl MailboxService for MailSlurpClient {
    async fn create_inbox(&self, options: &CreateInboxOptions) -> E2eResult<Inbox> {
        let resp = self
            .http
            .post(self.url("/inboxes"))
            .header(API_KEY_HEADER, &self.api_key)
            .query(options)
            .send()
            .await?;
        let inbox = check_status(resp).await?.json::<Inbox>().await?;

        info!("Created inbox {} <{}>", inbox.id, inbox.email_address);
        Ok(inbox)
    }

    async fn wait_for_latest_email(
        &self,
        inbox_id: &str,
        timeout: Duration,
        unread_only: bool,
    ) -> E2eResult<Email> {
        let timeout_ms = timeout.as_millis() as u64;
        debug!(
            "Waiting for latest email in inbox {} (timeout {} ms, unread only: {})",
            inbox_id, timeout_ms, unread_only
        );

        let resp = self
            .http
            .get(self.url("/waitForLatestEmail"))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("inboxId", inbox_id.to_string()),
                ("timeout", timeout_ms.to_string()),
                ("unreadOnly", unread_only.to_string()),
            ])
            .send()
            .await?;

        if resp.status() == StatusCode::REQUEST_TIMEOUT {
            return Err(E2eError::Timeout {
                what: format!("latest email in inbox {}", inbox_id),
                timeout_ms,
            });
        }

        let email = check_status(resp).await?.json::<Email>().await?;
        info!("Received email {:?} in inbox {}", email.subject, inbox_id);
        Ok(email)
    }
}

async fn check_status(resp: Response) -> E2eResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp.text().await.unwrap_or_default();
    Err(E2eError::MailboxApi {
        status: status.as_u16(),
        message,
    })
}
