//! Inbox Commands

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use mailprobe_e2e::mailslurp::{CreateInboxOptions, EmailPreview, SendEmailOptions, Sort};
use mailprobe_e2e::{wait, Email, Inbox, MailSlurpClient, MailboxService};

use crate::output::{print_item, print_list, print_success, truncate, OutputFormat, TableDisplay};
use crate::GlobalArgs;

/// Extra time allowed on top of the service-side wait
const WAIT_GRACE: Duration = Duration::from_secs(5);

#[derive(Subcommand)]
pub enum InboxCommands {
    /// Create a disposable inbox
    Create {
        /// Inbox name
        #[arg(short, long)]
        name: Option<String>,

        /// Inbox description
        #[arg(long)]
        description: Option<String>,
    },

    /// Send an email from an inbox
    Send {
        /// Sending inbox ID
        #[arg(long)]
        from: String,

        /// Recipient address (repeatable)
        #[arg(long, required = true)]
        to: Vec<String>,

        /// Subject line
        #[arg(short, long)]
        subject: String,

        /// Message body
        #[arg(short, long)]
        body: String,

        /// Send the body as HTML
        #[arg(long)]
        html: bool,
    },

    /// List emails in an inbox
    Emails {
        /// Inbox ID
        inbox_id: String,

        /// Page index
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "10")]
        size: u32,

        /// Order by creation time
        #[arg(long, value_enum, default_value = "desc")]
        sort: SortArg,
    },
}

#[derive(Args)]
pub struct WaitArgs {
    /// Inbox ID
    pub inbox_id: String,

    /// How long the service waits, in milliseconds
    #[arg(long, default_value = "30000")]
    pub timeout_ms: u64,

    /// Also accept emails that were already read
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for Sort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Asc => Sort::Asc,
            SortArg::Desc => Sort::Desc,
        }
    }
}

#[derive(Serialize)]
pub struct InboxDisplay {
    pub id: String,
    pub email_address: String,
    pub name: String,
    pub created_at: String,
}

impl From<Inbox> for InboxDisplay {
    fn from(inbox: Inbox) -> Self {
        Self {
            id: inbox.id,
            email_address: inbox.email_address,
            name: inbox.name.unwrap_or_default(),
            created_at: inbox
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

impl TableDisplay for InboxDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Address", "Name", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.email_address.clone(),
            self.name.clone(),
            self.created_at.clone(),
        ]
    }
}

#[derive(Serialize)]
pub struct EmailRow {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub read: bool,
    pub created_at: String,
}

impl From<EmailPreview> for EmailRow {
    fn from(preview: EmailPreview) -> Self {
        Self {
            id: preview.id,
            from: preview.from.unwrap_or_default(),
            subject: preview.subject.unwrap_or_default(),
            read: preview.read,
            created_at: preview
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

impl TableDisplay for EmailRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "From", "Subject", "Read", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.from.clone(),
            truncate(&self.subject, 60),
            if self.read { "yes" } else { "no" }.to_string(),
            self.created_at.clone(),
        ]
    }
}

impl TableDisplay for Email {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "From", "Subject", "Body"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.from.clone().unwrap_or_default(),
            self.subject.clone(),
            truncate(&self.body, 200),
        ]
    }
}

fn client(global: &GlobalArgs) -> Result<MailSlurpClient> {
    let api_key = global
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .context("API_KEY is not set")?;
    Ok(MailSlurpClient::new(&global.mailslurp_url, api_key, Duration::from_secs(30))?)
}

pub async fn execute(cmd: InboxCommands, global: &GlobalArgs) -> Result<()> {
    let client = client(global)?;

    match cmd {
        InboxCommands::Create { name, description } => {
            let options = CreateInboxOptions {
                name,
                description,
                ..Default::default()
            };
            let inbox = client.create_inbox(&options).await?;
            print_item(&InboxDisplay::from(inbox), global.format);
        }
        InboxCommands::Send {
            from,
            to,
            subject,
            body,
            html,
        } => {
            let options = SendEmailOptions {
                to,
                subject,
                body,
                is_html: html,
            };
            client.send_email(&from, &options).await?;
            print_success(&format!("Sent to {}", options.to.join(", ")));
        }
        InboxCommands::Emails {
            inbox_id,
            page,
            size,
            sort,
        } => {
            let page = client
                .get_inbox_emails_paginated(&inbox_id, page, size, sort.into())
                .await?;
            let rows: Vec<EmailRow> = page.content.into_iter().map(EmailRow::from).collect();
            print_list(&rows, global.format);
            if matches!(global.format, OutputFormat::Table) {
                println!(
                    "Page {} of {} ({} emails)",
                    page.number + 1,
                    page.total_pages.max(1),
                    page.total_elements
                );
            }
        }
    }

    Ok(())
}

pub async fn wait_for_email(args: WaitArgs, global: &GlobalArgs) -> Result<()> {
    let client = client(global)?;
    let timeout = Duration::from_millis(args.timeout_ms);

    let email = wait::bounded(
        timeout + WAIT_GRACE,
        "latest email",
        client.wait_for_latest_email(&args.inbox_id, timeout, !args.all),
    )
    .await?;

    print_item(&email, global.format);
    Ok(())
}
