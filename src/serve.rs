use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;
use crate::formats::WebhookPayload;
use crate::notify::{LineReplyClient, Notifier, Replier};
use crate::webhook::{SIGNATURE_HEADER, reply_for, verify_signature};

#[derive(Clone)]
pub struct AppState {
    /// `None` when no recipient is configured.
    notifier: Option<Arc<dyn Notifier>>,
    webhook: Option<WebhookConfig>,
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub channel_secret: String,
    pub replier: Arc<dyn Replier>,
}

impl AppState {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            notifier,
            webhook: None,
        }
    }

    pub fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = Some(webhook);
        self
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageQuery {
    #[serde(default)]
    message: Option<String>,
}

const DEFAULT_MESSAGE: &str = "テストメッセージです";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/", get(index))
        .route("/send_message", get(send_message))
        .route("/callback", post(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let recipient = if state.notifier.is_some() {
        "configured"
    } else {
        "not configured"
    };
    let webhook = if state.webhook.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    Html(format!(
        r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>stakewatch</title></head>
  <body>
    <h1>stakewatch</h1>
    <p>recipient: {recipient}</p>
    <p><a href="/send_message">send a test message</a></p>
    <p>webhook: POST /callback ({webhook})</p>
  </body>
</html>
"#
    ))
}

async fn send_message(
    State(state): State<AppState>,
    Query(q): Query<SendMessageQuery>,
) -> Result<&'static str, (StatusCode, String)> {
    let Some(notifier) = state.notifier.as_ref() else {
        return Err((
            StatusCode::BAD_REQUEST,
            "recipient is not configured".to_owned(),
        ));
    };

    let message = q
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
    notifier.send(&message).await.map_err(|err| {
        tracing::error!(?err, "manual push failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("send failed: {err:#}"),
        )
    })?;
    Ok("sent\n")
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, (StatusCode, String)> {
    let Some(webhook) = state.webhook.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "webhook is not configured".to_owned(),
        ));
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "missing signature".to_owned()))?;
    if !verify_signature(&webhook.channel_secret, &body, signature) {
        tracing::warn!("webhook signature mismatch");
        return Err((StatusCode::BAD_REQUEST, "invalid signature".to_owned()));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid payload: {err}")))?;
    let recipient_configured = state.notifier.is_some();
    for event in &payload.events {
        let Some(reply) = reply_for(event, recipient_configured) else {
            tracing::debug!(kind = %event.kind, "ignoring webhook event");
            continue;
        };
        let user_id = event
            .source
            .as_ref()
            .and_then(|source| source.user_id.as_deref());
        tracing::info!(?user_id, "text message received");
        if let Err(err) = webhook
            .replier
            .reply(&reply.reply_token, &reply.text)
            .await
        {
            tracing::error!(?err, "reply failed");
        }
    }
    Ok("OK")
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let notifier = match crate::notify::line_notifier(&args.line) {
        Ok(notifier) => Some(Arc::new(notifier) as Arc<dyn Notifier>),
        Err(err) => {
            tracing::warn!(%err, "push channel not configured; /send_message will be rejected");
            None
        }
    };
    let mut state = AppState::new(notifier);
    match (args.line_secret, args.line.line_token.clone()) {
        (Some(channel_secret), Some(access_token)) => {
            let replier = LineReplyClient::new(&args.line.line_api_base, access_token);
            state = state.with_webhook(WebhookConfig {
                channel_secret,
                replier: Arc::new(replier),
            });
        }
        _ => tracing::warn!(
            "LINE_CHANNEL_SECRET or LINE_CHANNEL_ACCESS_TOKEN unset; /callback will be rejected"
        ),
    }
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
