//! Runner behaviour against scripted browser and mailbox stand-ins

mod common;

use std::time::Duration;

use common::{BrowserCall, Delivery, FakeBrowser, FakeMailbox, MailboxCall};
use mailprobe_e2e::{
    Email, FailureKind, Inbox, Locator, RunnerConfig, ScenarioContext, ScenarioRunner, SiteProfile,
    Step,
};
use regex::Regex;

fn quick_config() -> RunnerConfig {
    RunnerConfig {
        profile: SiteProfile::default(),
        timeout: Duration::from_millis(100),
        email_wait_bound: Duration::from_millis(100),
        unread_only: true,
    }
}

#[tokio::test]
async fn successful_run_extracts_code_and_signs_in() {
    let browser = FakeBrowser::new();
    let mailbox = FakeMailbox::confirming();

    let report = ScenarioRunner::new(browser.clone(), mailbox.clone(), quick_config())
        .run()
        .await;

    assert!(report.success, "unexpected failure: {:?}", report.failure);
    assert_eq!(report.executed(), Step::ALL.to_vec());
    assert!(report.skipped.is_empty());

    let code = report.context.confirmation_code.as_deref().unwrap();
    assert_eq!(code, "482913");
    assert!(Regex::new(r"^\d{6}$").unwrap().is_match(code));

    let address = report.context.inbox_address.as_deref().unwrap();
    assert!(address.contains("@mailslurp.com"));

    let profile = SiteProfile::default();
    assert_eq!(browser.typed_into(&profile.confirm.code), vec!["482913"]);
    assert_eq!(browser.typed_into(&profile.sign_up.email), vec!["abc@mailslurp.com"]);
    assert_eq!(browser.typed_into(&profile.sign_in.username), vec!["abc@mailslurp.com"]);
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn password_is_reused_for_login() {
    let browser = FakeBrowser::new();
    let context = ScenarioContext::new("password-42");

    let report = ScenarioRunner::with_context(
        browser.clone(),
        FakeMailbox::confirming(),
        quick_config(),
        context,
    )
    .run()
    .await;
    assert!(report.success);

    // Sign-up and sign-in both use `name=password`
    let typed = browser.typed_into(&Locator::name("password"));
    assert_eq!(typed, vec!["password-42", "password-42"]);
}

#[tokio::test]
async fn email_wait_uses_configured_timeout_and_unread_only() {
    let mailbox = FakeMailbox::confirming();

    ScenarioRunner::new(FakeBrowser::new(), mailbox.clone(), quick_config())
        .run()
        .await;

    assert_eq!(
        mailbox.calls(),
        vec![
            MailboxCall::CreateInbox,
            MailboxCall::WaitForLatestEmail {
                inbox_id: "abc".to_string(),
                timeout: Duration::from_millis(100),
                unread_only: true,
            },
        ]
    );
}

#[tokio::test]
async fn email_that_never_arrives_times_out_at_step_four() {
    let browser = FakeBrowser::new();
    let mailbox = FakeMailbox::new(Inbox::new("abc", "abc@mailslurp.com"), Delivery::Never);

    let mut config = quick_config();
    config.email_wait_bound = Duration::from_millis(50);

    let report = ScenarioRunner::new(browser.clone(), mailbox, config)
        .run()
        .await;

    assert!(!report.success);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, Step::AwaitConfirmationEmail);
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(
        report.skipped,
        vec![Step::ExtractCode, Step::SubmitCode, Step::VerifyLogin]
    );

    let profile = SiteProfile::default();
    assert!(browser.typed_into(&profile.confirm.code).is_empty());
    assert!(report.context.confirmation_code.is_none());
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn body_without_code_fails_extraction() {
    let browser = FakeBrowser::new();
    let mailbox = FakeMailbox::new(
        Inbox::new("abc", "abc@mailslurp.com"),
        Delivery::After(
            Duration::ZERO,
            Email::new(
                "Please confirm your email address",
                "Your verification code is on its way",
            ),
        ),
    );

    let report = ScenarioRunner::new(browser.clone(), mailbox, quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::ExtractCode);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(report.skipped, vec![Step::SubmitCode, Step::VerifyLogin]);
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn wrong_subject_fails_step_four() {
    let mailbox = FakeMailbox::new(
        Inbox::new("abc", "abc@mailslurp.com"),
        Delivery::After(
            Duration::ZERO,
            Email::new("Welcome aboard", "Your verification code is 482913"),
        ),
    );

    let report = ScenarioRunner::new(FakeBrowser::new(), mailbox, quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::AwaitConfirmationEmail);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(report.context.email_subject.as_deref(), Some("Welcome aboard"));
}

#[tokio::test]
async fn title_mismatch_stops_before_any_mailbox_call() {
    let mut browser = FakeBrowser::new();
    browser.title = "Maintenance".to_string();
    let mailbox = FakeMailbox::confirming();

    let report = ScenarioRunner::new(browser.clone(), mailbox.clone(), quick_config())
        .run()
        .await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, Step::LoadSite);
    assert!(failure.message.contains("Maintenance"));
    assert_eq!(report.executed(), vec![Step::LoadSite]);
    assert_eq!(report.skipped.len(), 6);
    assert!(mailbox.calls().is_empty());
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn missing_create_account_link_fails_step_two() {
    let mut browser = FakeBrowser::new();
    browser.missing = vec![SiteProfile::default().create_account_link];

    let report = ScenarioRunner::new(browser.clone(), FakeMailbox::confirming(), quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::StartSignUp);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn inbox_outside_service_domain_is_rejected() {
    let browser = FakeBrowser::new();
    let mailbox = FakeMailbox::new(
        Inbox::new("abc", "abc@example.org"),
        Delivery::After(Duration::ZERO, Email::new("x", "y")),
    );

    let report = ScenarioRunner::new(browser.clone(), mailbox, quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::CreateInboxAndSignUp);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(browser.typed_into(&Locator::name("email")).is_empty());
    assert!(report.context.inbox_id.is_none());
}

#[tokio::test]
async fn empty_inbox_id_is_rejected() {
    let mailbox = FakeMailbox::new(
        Inbox::new("", "abc@mailslurp.com"),
        Delivery::After(Duration::ZERO, Email::new("x", "y")),
    );

    let report = ScenarioRunner::new(FakeBrowser::new(), mailbox, quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::CreateInboxAndSignUp);
    assert!(failure.message.contains("no id"));
}

#[tokio::test]
async fn missing_welcome_text_fails_login_step() {
    let mut browser = FakeBrowser::new();
    browser.welcome_text = "Sign in to your account".to_string();

    let report = ScenarioRunner::new(browser.clone(), FakeMailbox::confirming(), quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::VerifyLogin);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(report.skipped.is_empty());
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn mailbox_api_error_propagates_as_service_failure() {
    let mailbox = FakeMailbox::new(Inbox::new("abc", "abc@mailslurp.com"), Delivery::Fail(500));

    let report = ScenarioRunner::new(FakeBrowser::new(), mailbox, quick_config())
        .run()
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.step, Step::AwaitConfirmationEmail);
    assert_eq!(failure.kind, FailureKind::Service);
}

#[tokio::test]
async fn teardown_failure_is_reported_without_failing_the_run() {
    let mut browser = FakeBrowser::new();
    browser.fail_close = true;

    let report = ScenarioRunner::new(browser.clone(), FakeMailbox::confirming(), quick_config())
        .run()
        .await;

    assert!(report.success);
    assert!(report.failure.is_none());
    assert!(report.teardown_error.is_some());
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn load_site_sets_implicit_wait_before_navigating() {
    let browser = FakeBrowser::new();

    ScenarioRunner::new(browser.clone(), FakeMailbox::confirming(), quick_config())
        .run()
        .await;

    let calls = browser.calls();
    assert_eq!(calls[0], BrowserCall::ImplicitWait(Duration::from_millis(100)));
    assert_eq!(
        calls[1],
        BrowserCall::Navigate("https://playground.mailslurp.com".to_string())
    );
    let navigations = calls
        .iter()
        .filter(|c| matches!(c, BrowserCall::Navigate(_)))
        .count();
    assert_eq!(navigations, 2);
    assert_eq!(calls.last(), Some(&BrowserCall::Close));
}

#[tokio::test]
async fn report_is_written_as_json() {
    let report = ScenarioRunner::new(FakeBrowser::new(), FakeMailbox::confirming(), quick_config())
        .run()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = report.write_to(dir.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["steps"].as_array().unwrap().len(), 7);
    assert_eq!(json["steps"][4]["step"], "extract_code");
    assert_eq!(json["context"]["confirmation_code"], "482913");
}
