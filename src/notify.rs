use anyhow::Context as _;
use async_trait::async_trait;

use crate::cli::LineArgs;
use crate::message::{render_digest, render_message};
use crate::pipeline::RunReport;

/// Delivers one rendered text to the fixed recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// Prints messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        println!("{text}");
        Ok(())
    }
}

/// LINE Messaging API push to a single user.
#[derive(Debug, Clone)]
pub struct LinePushNotifier {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    user_id: String,
}

impl LinePushNotifier {
    pub fn new(api_base: &str, access_token: String, user_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: push_endpoint(api_base),
            access_token,
            user_id,
        }
    }
}

pub fn push_endpoint(api_base: &str) -> String {
    let api_base = api_base.trim_end_matches('/');
    format!("{api_base}/v2/bot/message/push")
}

#[async_trait]
impl Notifier for LinePushNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "to": self.user_id,
            "messages": [{ "type": "text", "text": text }],
        });
        post_messages(&self.client, &self.endpoint, &self.access_token, &body).await
    }
}

/// Answers one webhook event through its reply token.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, reply_token: &str, text: &str) -> anyhow::Result<()>;
}

/// LINE Messaging API reply to a webhook event.
#[derive(Debug, Clone)]
pub struct LineReplyClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl LineReplyClient {
    pub fn new(api_base: &str, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: reply_endpoint(api_base),
            access_token,
        }
    }
}

pub fn reply_endpoint(api_base: &str) -> String {
    let api_base = api_base.trim_end_matches('/');
    format!("{api_base}/v2/bot/message/reply")
}

#[async_trait]
impl Replier for LineReplyClient {
    async fn reply(&self, reply_token: &str, text: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });
        post_messages(&self.client, &self.endpoint, &self.access_token, &body).await
    }
}

async fn post_messages(
    client: &reqwest::Client,
    endpoint: &str,
    access_token: &str,
    body: &serde_json::Value,
) -> anyhow::Result<()> {
    let response = client
        .post(endpoint)
        .bearer_auth(access_token)
        .json(body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        anyhow::bail!("LINE message request failed ({status}): {raw}");
    }
    Ok(())
}

/// Notifier configured by `line`; `dry_run` prints instead of pushing.
pub fn notifier_from_args(line: &LineArgs, dry_run: bool) -> anyhow::Result<Box<dyn Notifier>> {
    if dry_run {
        tracing::info!("dry run: messages are printed, not pushed");
        return Ok(Box::new(StdoutNotifier));
    }
    Ok(Box::new(line_notifier(line)?))
}

pub fn line_notifier(line: &LineArgs) -> anyhow::Result<LinePushNotifier> {
    let token = line
        .line_token
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("LINE_CHANNEL_ACCESS_TOKEN (--line-token) is not set"))?;
    let user = line
        .line_user
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("LINE_USER_ID (--line-user) is not set"))?;
    Ok(LinePushNotifier::new(&line.line_api_base, token, user))
}

/// Prints a digest of each new filing and sends its message once.
///
/// Failed sends are logged and not retried. Returns how many were delivered.
pub async fn deliver(notifier: &dyn Notifier, report: &RunReport) -> usize {
    let mut delivered = 0_usize;
    for new in &report.new {
        println!("{}", render_digest(&new.filing));
        println!("---");

        let message = render_message(&new.filing);
        match notifier.send(&message).await {
            Ok(()) => {
                tracing::info!(identity = %new.identity, "notification sent");
                delivered += 1;
            }
            Err(err) => {
                tracing::error!(identity = %new.identity, ?err, "notification failed");
            }
        }
    }
    if report.new.is_empty() {
        tracing::info!("no new filings to notify");
    }
    delivered
}

pub async fn run(args: crate::cli::NotifyArgs) -> anyhow::Result<()> {
    let notifier = notifier_from_args(&args.line, args.dry_run)?;
    notifier
        .send(&args.message)
        .await
        .context("send message")?;
    tracing::info!("message sent");
    Ok(())
}
