//! Browser automation over the W3C WebDriver protocol
//!
//! The scenario only needs a handful of commands: navigate, read the title,
//! find an element, click it, type into it, read its text, and end the session.
//! [`WebDriverClient`] speaks those to a geckodriver or chromedriver endpoint.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Browser operations the scenario depends on
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// How long element lookups retry before failing
    async fn set_implicit_wait(&self, timeout: Duration) -> E2eResult<()>;

    async fn navigate(&self, url: &str) -> E2eResult<()>;

    async fn title(&self) -> E2eResult<String>;

    async fn find_element(&self, locator: &Locator) -> E2eResult<ElementRef>;

    async fn click(&self, element: &ElementRef) -> E2eResult<()>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()>;

    async fn text(&self, element: &ElementRef) -> E2eResult<String>;

    /// End the browser session
    async fn close(&self) -> E2eResult<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Firefox,
    Chrome,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Firefox => "firefox",
            Browser::Chrome => "chrome",
        }
    }

    /// Driver command-line arguments to listen on `port`
    pub fn driver_args(&self, port: u16) -> Vec<String> {
        match self {
            Browser::Firefox => vec!["--port".to_string(), port.to_string()],
            Browser::Chrome => vec![format!("--port={}", port)],
        }
    }

    /// New-session capabilities payload
    pub fn capabilities(&self, headless: bool) -> Value {
        let always_match = match self {
            Browser::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
                json!({
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args },
                })
            }
            Browser::Chrome => {
                let args: Vec<&str> = if headless { vec!["--headless=new"] } else { vec![] };
                json!({
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                })
            }
        };
        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firefox" | "gecko" => Ok(Browser::Firefox),
            "chrome" | "chromium" => Ok(Browser::Chrome),
            other => Err(E2eError::Config(format!("Unsupported browser: {}", other))),
        }
    }
}

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    Name(String),
    TagName(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Locator::TagName(tag.into())
    }

    /// W3C `using` / `value` pair
    fn strategy(&self) -> (&'static str, String) {
        match self {
            Locator::Css(sel) => ("css selector", sel.clone()),
            Locator::Name(name) => ("css selector", format!(r#"[name="{}"]"#, name)),
            Locator::TagName(tag) => ("tag name", tag.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "css={}", sel),
            Locator::Name(name) => write!(f, "name={}", name),
            Locator::TagName(tag) => write!(f, "tag={}", tag),
        }
    }
}

/// Opaque reference to an element in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

/// W3C WebDriver client bound to one session
pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Open a new browser session against the driver at `base_url`
    pub async fn new_session(base_url: &str, browser: Browser, headless: bool) -> E2eResult<Self> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let value = send(
            &http,
            Method::POST,
            &format!("{}/session", base_url),
            Some(browser.capabilities(headless)),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| E2eError::WebDriver {
                code: "session not created".to_string(),
                message: "response carried no sessionId".to_string(),
            })?
            .to_string();

        info!("Started {} session {}", browser.as_str(), session_id);

        Ok(Self {
            http,
            base_url,
            session_id,
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> E2eResult<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        send(&self.http, method, &url, body).await
    }
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> E2eResult<Value> {
    debug!("WebDriver {} {}", method, url);

    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let resp = request.send().await?;
    let status = resp.status();
    let payload: WireResponse = resp.json().await?;

    if status.is_success() {
        Ok(payload.value)
    } else {
        Err(wire_error(&payload.value))
    }
}

fn wire_error(value: &Value) -> E2eError {
    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if code == "no such element" {
        E2eError::ElementNotFound(message)
    } else {
        E2eError::WebDriver { code, message }
    }
}

fn as_string(value: Value, what: &str) -> E2eResult<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Err(E2eError::WebDriver {
            code: "invalid response".to_string(),
            message: format!("expected {} as string, got {}", what, other),
        }),
    }
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn set_implicit_wait(&self, timeout: Duration) -> E2eResult<()> {
        let body = json!({ "implicit": timeout.as_millis() as u64 });
        self.command(Method::POST, "/timeouts", Some(body)).await?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        info!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        let value = self.command(Method::GET, "/title", None).await?;
        as_string(value, "title")
    }

    async fn find_element(&self, locator: &Locator) -> E2eResult<ElementRef> {
        let (using, selector) = locator.strategy();
        let body = json!({ "using": using, "value": selector });

        let value = match self.command(Method::POST, "/element", Some(body)).await {
            Err(E2eError::ElementNotFound(_)) => {
                return Err(E2eError::ElementNotFound(locator.to_string()))
            }
            other => other?,
        };

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| E2eError::WebDriver {
                code: "invalid response".to_string(),
                message: format!("no element reference for {}", locator),
            })
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        let path = format!("/element/{}/click", element.0);
        self.command(Method::POST, &path, Some(json!({}))).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let path = format!("/element/{}/text", element.0);
        let value = self.command(Method::GET, &path, None).await?;
        as_string(value, "element text")
    }

    async fn close(&self) -> E2eResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Closing browser session {}", self.session_id);
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        if let Err(e) = send(&self.http, Method::DELETE, &url, None).await {
            warn!("Failed to end session {}: {}", self.session_id, e);
            return Err(e);
        }
        Ok(())
    }
}
