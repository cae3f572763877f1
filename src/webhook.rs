//! Inbound messaging-channel webhook: signature check and reply selection.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::formats::WebhookEvent;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

/// Base64 HMAC-SHA256 of `body` keyed by the channel secret.
pub fn sign(secret: &str, body: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| anyhow::anyhow!("channel secret rejected: {err}"))?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub reply_token: String,
    pub text: String,
}

/// Text message events get an echo; when no push recipient is configured the
/// sender is told their own user id instead.
pub fn reply_for(event: &WebhookEvent, recipient_configured: bool) -> Option<Reply> {
    if event.kind != "message" {
        return None;
    }
    let message = event.message.as_ref()?;
    if message.kind != "text" {
        return None;
    }
    let reply_token = event.reply_token.clone()?;
    let text = message.text.as_deref().unwrap_or_default();

    let text = if recipient_configured {
        format!("あなたが送った内容：{text}")
    } else {
        let user_id = event
            .source
            .as_ref()
            .and_then(|source| source.user_id.as_deref())
            .unwrap_or("不明");
        format!("あなたのユーザーID: {user_id}\n.envファイルのLINE_USER_IDに設定してください。")
    };
    Some(Reply { reply_token, text })
}
