//! Browser-driver process management - spawning and readiness checking

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::{E2eError, E2eResult};
use crate::webdriver::Browser;

/// Handle to a running geckodriver / chromedriver process
pub struct DriverProcess {
    child: Child,
    base_url: String,
    port: u16,
}

impl DriverProcess {
    /// Spawn the driver executable and wait until it reports ready
    pub async fn spawn(config: DriverConfig) -> E2eResult<Self> {
        if !config.binary_path.is_file() {
            return Err(E2eError::DriverNotFound(config.binary_path.display().to_string()));
        }

        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let child = Command::new(&config.binary_path)
            .args(config.browser.driver_args(port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                E2eError::DriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = DriverProcess {
            child,
            base_url: base_url.clone(),
            port,
        };

        handle.wait_for_ready(config.startup_timeout).await?;

        info!("Driver is ready at {}", base_url);
        Ok(handle)
    }

    /// Poll `/status` until the driver accepts new sessions
    async fn wait_for_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: Value = resp.json().await.unwrap_or_default();
                    if is_ready(&body) {
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    warn!("Driver status returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for driver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Driver status error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DriverHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the driver process
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }

        info!("Stopping driver (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning a driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the driver executable
    pub binary_path: PathBuf,

    /// Browser the driver controls
    pub browser: Browser,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl DriverConfig {
    pub fn from_scenario(config: &ScenarioConfig) -> Self {
        Self {
            binary_path: config.webdriver_path.clone(),
            browser: config.browser,
            port: None,
            startup_timeout: config.driver_startup_timeout,
        }
    }
}

/// W3C drivers report `{"value": {"ready": true, ...}}`
fn is_ready(body: &Value) -> bool {
    body.get("value")
        .and_then(|v| v.get("ready"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
