//! WhatsApp 桥接 Webhook
//!
//! 桥接进程把 `messages.upsert` 事件 POST 到 `/events`，这里只取第一条消息，
//! 立即返回 200 并在后台任务里跑对话管线（管线内部按聊天加锁保证顺序）。

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::agent::ChatAgent;
use crate::integrations::envelope::InboundEvent;

/// `messages.upsert` 事件体
#[derive(Debug, Deserialize)]
pub struct UpsertPayload {
    #[serde(default)]
    pub messages: Vec<InboundEvent>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// 创建 WhatsApp 路由
pub fn create_router(agent: Arc<ChatAgent>) -> Router {
    Router::new()
        .route("/events", post(receive_events))
        .route("/health", get(|| async { "OK" }))
        .with_state(agent)
}

/// POST /events - 接收桥接推送的消息
async fn receive_events(
    State(agent): State<Arc<ChatAgent>>,
    Json(payload): Json<UpsertPayload>,
) -> StatusCode {
    let Some(event) = payload.messages.into_iter().next() else {
        return StatusCode::OK;
    };
    if event.message.is_none() || event.key.from_me {
        return StatusCode::OK;
    }

    tracing::debug!(
        chat_id = %event.key.remote_jid,
        kind = ?payload.kind,
        "Inbound event accepted, spawning background task"
    );

    tokio::spawn(async move {
        let outcome = agent.handle(&event).await;
        tracing::debug!(chat_id = %event.key.remote_jid, ?outcome, "Event handled");
    });

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::agent::{AgentSettings, PromptCompiler};
    use crate::integrations::mock::MockTransport;
    use crate::llm::MockLlmClient;
    use crate::ocr::StaticRecognizer;

    fn router(transport: Arc<MockTransport>) -> Router {
        let agent = ChatAgent::new(
            transport,
            Arc::new(MockLlmClient::new().with_reply("Halo juga!")),
            Arc::new(StaticRecognizer::failing()),
            PromptCompiler::default(),
            AgentSettings::default(),
        );
        create_router(Arc::new(agent))
    }

    fn post_events(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/events")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(MockTransport::new("628999@s.whatsapp.net")));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_and_own_messages_dropped() {
        let transport = Arc::new(MockTransport::new("628999@s.whatsapp.net"));
        let app = router(Arc::clone(&transport));
        let resp = app.clone().oneshot(post_events(r#"{"messages": []}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let own = r#"{"messages": [{"key": {"remoteJid": "628111@s.whatsapp.net", "fromMe": true},
                      "message": {"conversation": "halo"}}]}"#;
        let resp = app.oneshot(post_events(own)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_gets_reply() {
        let transport = Arc::new(MockTransport::new("628999@s.whatsapp.net"));
        let app = router(Arc::clone(&transport));
        let body = r#"{"type": "notify", "messages": [{"key": {"remoteJid": "628111@s.whatsapp.net", "fromMe": false, "id": "ABC"},
                       "message": {"conversation": "halo"}}]}"#;
        let resp = app.oneshot(post_events(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        for _ in 0..50 {
            if !transport.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "Halo juga!");
        assert_eq!(sent[0].quoted_id.as_deref(), Some("ABC"));
    }
}
