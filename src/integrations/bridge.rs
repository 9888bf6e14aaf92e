//! HTTP 桥接传输
//!
//! WhatsApp 连接由独立的桥接进程维护，本进程只通过它的 REST 接口发消息、改输入状态、下载媒体：
//! - `GET  /me`       -> `{"id": "<jid>"}`
//! - `POST /send`     `{chatId, text, quoted}`
//! - `POST /presence` `{chatId, presence}`
//! - `POST /media`    `<InboundEvent>` -> 原始字节
//!
//! 桥接返回的错误正文在这里归类：会话 / 密钥类错误变成 `TransportError::SessionProtocol`。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{is_transient_protocol_text, TransportError};
use crate::integrations::envelope::InboundEvent;
use crate::integrations::transport::{ChatTransport, Presence};

/// WhatsApp 单条消息长度上限（按字符）
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    quoted: &'a InboundEvent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresenceRequest<'a> {
    chat_id: &'a str,
    presence: Presence,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    id: String,
}

pub struct HttpBridge {
    client: reqwest::Client,
    base_url: String,
    self_jid: String,
}

impl HttpBridge {
    /// 连接桥接进程；未配置 self_jid 时向 `/me` 询问
    pub async fn connect(
        base_url: &str,
        self_jid: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let self_jid = match self_jid.filter(|j| !j.is_empty()) {
            Some(jid) => jid,
            None => {
                let resp = client
                    .get(format!("{base_url}/me"))
                    .send()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                let resp = check_status(resp).await?;
                let me: MeResponse = resp
                    .json()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                me.id
            }
        };

        tracing::info!(bridge = %base_url, self_jid = %self_jid, "Connected to WhatsApp bridge");
        Ok(Self {
            client,
            base_url,
            self_jid,
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, TransportError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        check_status(resp).await
    }
}

/// 非 2xx 时读取正文并归类
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_bridge_error(status.as_u16(), body))
}

fn classify_bridge_error(status: u16, body: String) -> TransportError {
    if is_transient_protocol_text(&body) {
        TransportError::SessionProtocol(body)
    } else {
        TransportError::Status { status, body }
    }
}

/// 按字符切分超长消息
fn split_chunks(body: &str, max_len: usize) -> Vec<String> {
    if body.chars().count() <= max_len {
        return vec![body.to_string()];
    }
    body.chars()
        .collect::<Vec<_>>()
        .chunks(max_len)
        .map(|c| c.iter().collect())
        .collect()
}

/// 依次发送各段；某段失败时停止并记录段号（之前的段已送达）
async fn send_chunked<F, Fut>(chat_id: &str, text: &str, mut send: F) -> Result<(), TransportError>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<(), TransportError>>,
{
    let chunks = split_chunks(text, MAX_MESSAGE_CHARS);
    let total = chunks.len();
    for (index, chunk) in chunks.into_iter().enumerate() {
        if let Err(e) = send(chunk).await {
            if index > 0 {
                tracing::warn!(chat_id, chunk = index, total, error = %e, "Reply partially delivered");
            }
            return Err(e);
        }
    }
    Ok(())
}

#[async_trait]
impl ChatTransport for HttpBridge {
    fn self_jid(&self) -> &str {
        &self.self_jid
    }

    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        quoted: &InboundEvent,
    ) -> Result<(), TransportError> {
        send_chunked(chat_id, text, |chunk| async move {
            let req = SendRequest {
                chat_id,
                text: &chunk,
                quoted,
            };
            self.post_json("/send", &req).await.map(|_| ())
        })
        .await
    }

    async fn set_presence(
        &self,
        chat_id: &str,
        presence: Presence,
    ) -> Result<(), TransportError> {
        self.post_json("/presence", &PresenceRequest { chat_id, presence })
            .await
            .map(|_| ())
    }

    async fn download_media(&self, event: &InboundEvent) -> Result<Vec<u8>, TransportError> {
        let resp = self.post_json("/media", event).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bridge_error_session() {
        let err = classify_bridge_error(500, "Bad MAC Error".to_string());
        assert!(matches!(err, TransportError::SessionProtocol(_)));
    }

    #[test]
    fn test_classify_bridge_error_other() {
        let err = classify_bridge_error(503, "socket closed".to_string());
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
    }

    #[test]
    fn test_split_chunks_by_chars() {
        assert_eq!(split_chunks("halo", 10), vec!["halo".to_string()]);
        let long = "𝐀".repeat(5);
        let chunks = split_chunks(&long, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "𝐀");
    }

    #[tokio::test]
    async fn test_send_chunked_stops_at_failed_chunk() {
        let text = "a".repeat(MAX_MESSAGE_CHARS * 2 + 10);
        let mut delivered = Vec::new();
        let mut attempts = 0;
        let result = send_chunked("1@g.us", &text, |chunk| {
            attempts += 1;
            let outcome = if attempts == 2 {
                Err(TransportError::Request("socket closed".to_string()))
            } else {
                delivered.push(chunk.chars().count());
                Ok(())
            };
            async move { outcome }
        })
        .await;

        assert!(matches!(result, Err(TransportError::Request(_))));
        assert_eq!(attempts, 2);
        assert_eq!(delivered, vec![MAX_MESSAGE_CHARS]);
    }

    #[tokio::test]
    async fn test_send_chunked_short_text_single_call() {
        let mut calls = Vec::new();
        send_chunked("1@g.us", "halo", |chunk| {
            calls.push(chunk);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(calls, vec!["halo".to_string()]);
    }

    #[test]
    fn test_presence_serializes_lowercase() {
        let req = PresenceRequest {
            chat_id: "1@g.us",
            presence: Presence::Composing,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["presence"], "composing");
        assert_eq!(json["chatId"], "1@g.us");
    }
}
