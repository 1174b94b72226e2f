//! Scenario Commands
//!
//! `run` drives the full sign-up flow; `check` only validates configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tracing::debug;

use mailprobe_e2e::{
    run_live, Browser, E2eError, FailureKind, ScenarioConfig, ScenarioReport, SiteProfile,
};

use crate::output::{print_error, print_success, print_warning, OutputFormat};
use crate::GlobalArgs;

/// Exit code for a scenario that ran and failed
pub const EXIT_SCENARIO_FAILED: i32 = 1;

/// Exit code for missing or invalid configuration
pub const EXIT_CONFIG: i32 = 2;

#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to the browser-driver executable (geckodriver / chromedriver)
    #[arg(long, env = "PATH_TO_WEBDRIVER")]
    pub webdriver: Option<PathBuf>,

    /// YAML site profile overriding the playground defaults
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Browser the driver controls (firefox, chrome)
    #[arg(long, default_value = "firefox")]
    pub browser: Browser,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Email wait and implicit element wait, in milliseconds
    #[arg(long, default_value = "30000")]
    pub timeout_ms: u64,

    /// Directory for scenario-results.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Build and validate the scenario configuration, or exit with [`EXIT_CONFIG`]
fn load(global: &GlobalArgs, args: &ScenarioArgs) -> (ScenarioConfig, SiteProfile) {
    let result = ScenarioConfig::new(global.api_key.clone(), args.webdriver.clone())
        .and_then(|mut config| {
            config.mailslurp_base_url = global.mailslurp_url.clone();
            config.browser = args.browser;

            let profile = match &args.profile {
                Some(path) => SiteProfile::from_file(path)?,
                None => SiteProfile::default(),
            };
            Ok((config, profile))
        });

    match result {
        Ok(loaded) => loaded,
        Err(e) => exit_config(e),
    }
}

fn exit_config(e: E2eError) -> ! {
    print_error(&e.to_string());
    std::process::exit(EXIT_CONFIG);
}

pub async fn execute(args: RunArgs, global: &GlobalArgs) -> Result<()> {
    let (mut config, profile) = load(global, &args.scenario);
    config.headless = args.headless;
    config.timeout = Duration::from_millis(args.timeout_ms);

    debug!(
        "Running with {} via {} (timeout {} ms, headless: {})",
        config.browser.as_str(),
        config.webdriver_path.display(),
        args.timeout_ms,
        config.headless
    );

    let report = match run_live(&config, profile).await {
        Ok(report) => report,
        Err(e) if e.kind() == FailureKind::Configuration => exit_config(e),
        Err(e) => {
            print_error(&format!("Scenario could not start: {}", e));
            std::process::exit(EXIT_SCENARIO_FAILED);
        }
    };

    print_report(&report, global.format);

    if let Some(dir) = &args.output {
        let path = report.write_to(dir)?;
        println!("Results written to {}", path.display());
    }

    if !report.success {
        std::process::exit(EXIT_SCENARIO_FAILED);
    }
    Ok(())
}

pub fn check(args: ScenarioArgs, global: &GlobalArgs) -> Result<()> {
    let (config, profile) = load(global, &args);

    print_success(&format!(
        "API key present, driver found at {}",
        config.webdriver_path.display()
    ));
    print_success(&format!("Site profile targets {}", profile.base_url));
    Ok(())
}

fn print_report(report: &ScenarioReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
            return;
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(report).unwrap_or_default());
            return;
        }
        OutputFormat::Table | OutputFormat::Plain => {}
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Step", "Status", "Time", "Error"]);

    for result in &report.steps {
        let status = if result.success { "✓ passed".green() } else { "✗ failed".red() };
        table.add_row(vec![
            result.step.number().to_string(),
            result.step.description().to_string(),
            status.to_string(),
            format!("{} ms", result.duration_ms),
            result.error.clone().unwrap_or_default(),
        ]);
    }
    for step in &report.skipped {
        table.add_row(vec![
            step.number().to_string(),
            step.description().to_string(),
            "- skipped".dimmed().to_string(),
            String::new(),
            String::new(),
        ]);
    }
    println!("{table}");

    if let Some(address) = &report.context.inbox_address {
        println!("{} {}", "Inbox:".bold(), address);
    }
    if let Some(code) = &report.context.confirmation_code {
        println!("{} {}", "Code:".bold(), code);
    }
    if let Some(err) = &report.teardown_error {
        print_warning(&format!("Browser teardown failed: {}", err));
    }

    match &report.failure {
        None => print_success(&format!("Sign-up confirmed in {} ms", report.duration_ms)),
        Some(failure) => print_error(&format!(
            "{} failed ({:?}): {}",
            failure.step, failure.kind, failure.message
        )),
    }
}
