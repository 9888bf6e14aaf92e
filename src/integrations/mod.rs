//! WhatsApp 集成：消息信封、JID 工具、传输抽象与 HTTP 桥接实现、Webhook（需 `whatsapp` feature）

pub mod bridge;
pub mod envelope;
pub mod jid;
pub mod mock;
pub mod transport;

#[cfg(feature = "whatsapp")]
pub mod whatsapp;

pub use bridge::HttpBridge;
pub use envelope::{unwrap_message, InboundEvent, MessageContent};
pub use mock::{MockTransport, SentMessage};
pub use transport::{ChatTransport, Presence};
