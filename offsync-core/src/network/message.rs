// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Real-time Channel Payloads
//!
//! Messages on the socket are JSON objects discriminated by a `type` field.
//! An object decodes into a dedicated variant only when the variant
//! re-encodes to the same object. Anything else, including a known kind
//! carrying extra fields, is kept verbatim in [`MessagePayload::Unknown`]
//! so it can be displayed or forwarded without loss.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A chat message authored by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A payload travelling over the real-time channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    /// `{"type": "message", "content": ..., "timestamp": ...}`
    Chat(ChatMessage),
    /// Keep-alive sent by the heartbeat.
    Ping { timestamp: u64 },
    /// Keep-alive reply.
    Pong { timestamp: Option<u64> },
    /// Any other JSON value, preserved as received.
    Unknown(serde_json::Value),
}

/// Wire shape of the known kinds.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Tagged {
    Message(ChatMessage),
    Ping {
        timestamp: u64,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },
}

impl MessagePayload {
    /// Creates a chat message stamped with the current time.
    pub fn chat(content: impl Into<String>) -> Self {
        MessagePayload::Chat(ChatMessage {
            content: content.into(),
            timestamp: crate::now_millis(),
        })
    }

    /// Creates a heartbeat ping stamped with the current time.
    pub fn ping() -> Self {
        MessagePayload::Ping {
            timestamp: crate::now_millis(),
        }
    }

    /// Parses an inbound text frame.
    ///
    /// Fails only when the text is not JSON; well-formed JSON of an
    /// unrecognised shape becomes [`MessagePayload::Unknown`].
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encodes the payload as a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the `type` discriminator, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            MessagePayload::Chat(_) => Some("message"),
            MessagePayload::Ping { .. } => Some("ping"),
            MessagePayload::Pong { .. } => Some("pong"),
            MessagePayload::Unknown(value) => value.get("type").and_then(|t| t.as_str()),
        }
    }

    /// Text to display for this payload, if it carries any.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            MessagePayload::Chat(chat) => Some(&chat.content),
            MessagePayload::Unknown(value) => value
                .pointer("/data/content")
                .or_else(|| value.get("content"))
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str()),
            _ => None,
        }
    }

    fn to_tagged(&self) -> Option<Tagged> {
        match self {
            MessagePayload::Chat(chat) => Some(Tagged::Message(chat.clone())),
            MessagePayload::Ping { timestamp } => Some(Tagged::Ping {
                timestamp: *timestamp,
            }),
            MessagePayload::Pong { timestamp } => Some(Tagged::Pong {
                timestamp: *timestamp,
            }),
            MessagePayload::Unknown(_) => None,
        }
    }
}

impl From<Tagged> for MessagePayload {
    fn from(tagged: Tagged) -> Self {
        match tagged {
            Tagged::Message(chat) => MessagePayload::Chat(chat),
            Tagged::Ping { timestamp } => MessagePayload::Ping { timestamp },
            Tagged::Pong { timestamp } => MessagePayload::Pong { timestamp },
        }
    }
}

impl Serialize for MessagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MessagePayload::Unknown(value) => value.serialize(serializer),
            known => match known.to_tagged() {
                Some(tagged) => tagged.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for MessagePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tagged = match serde_json::from_value::<Tagged>(value.clone()) {
            Ok(tagged) => tagged,
            Err(_) => return Ok(MessagePayload::Unknown(value)),
        };
        // A lossy decode (extra or defaulted fields) keeps the original.
        match serde_json::to_value(&tagged) {
            Ok(encoded) if encoded == value => Ok(tagged.into()),
            _ => Ok(MessagePayload::Unknown(value)),
        }
    }
}
