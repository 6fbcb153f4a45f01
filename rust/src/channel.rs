//! Inbound channel messages and the transport seam.
//!
//! The transport itself (reconnect, framing, multiplexing) lives outside the
//! core. The core only needs to subscribe a handler to a topic, ask whether
//! the link is closed, and close it when the authority ends the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::contacts::AddressEntry;
use crate::error::ChannelError;
use crate::files::{FileRecord, ProcessInfo};
use crate::notifications::{NotificationRecord, SigningRequestRecord};
use crate::providers::StorageProviderRecord;
use crate::transactions::TransactionRecord;
use crate::wallet::AccountInfo;

/// Wire shape pushed by the authority: `{type, data, grpID?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "grpID", default, skip_serializing_if = "Option::is_none")]
    pub grp_id: Option<String>,
}

impl ChannelMessage {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            grp_id: None,
        }
    }

    pub fn with_group(mut self, grp_id: impl Into<String>) -> Self {
        self.grp_id = Some(grp_id.into());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ChannelError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Payload of `remove_signing_request`. The authority sends the same shape
/// as `add_signing_request`; `id` is present when it refers to a stored
/// notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SigningRequestRemoval {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "fileHash", default)]
    pub file_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectionStatusPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    status: String,
}

/// Every message kind the router knows, plus a fallback for the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    FileInfo {
        group_key: Option<String>,
        file: FileRecord,
    },
    Account(AccountInfo),
    ConnectionStatus(String),
    /// `fileUpload` / `fileDownload` progress; reconciled like a transaction.
    FileTransfer(TransactionRecord),
    Transaction(TransactionRecord),
    StorageProvider(StorageProviderRecord),
    AddressBook(AddressEntry),
    AddSigningRequest(SigningRequestRecord),
    RemoveSigningRequest(SigningRequestRemoval),
    /// `notification` and `workflow_request`.
    Notification(NotificationRecord),
    ShareProcess(ProcessInfo),
    SessionTimeout,
    Unrecognized {
        kind: String,
    },
}

impl InboundEvent {
    pub fn decode(msg: ChannelMessage) -> Result<Self, ChannelError> {
        let ChannelMessage { kind, data, grp_id } = msg;
        let event = match kind.as_str() {
            "fileInfo" => {
                let mut file: FileRecord = payload(&kind, data)?;
                // Only channel pushes carry the authority's full detail.
                file.loaded = true;
                InboundEvent::FileInfo {
                    group_key: grp_id,
                    file,
                }
            }
            "account" => InboundEvent::Account(payload(&kind, data)?),
            "connectionStatus" => {
                let p: ConnectionStatusPayload = payload(&kind, data)?;
                InboundEvent::ConnectionStatus(p.status)
            }
            "fileUpload" | "fileDownload" => InboundEvent::FileTransfer(payload(&kind, data)?),
            "tx" => InboundEvent::Transaction(payload(&kind, data)?),
            "storageProvider" => InboundEvent::StorageProvider(payload(&kind, data)?),
            "addressBook" => InboundEvent::AddressBook(payload(&kind, data)?),
            "add_signing_request" => InboundEvent::AddSigningRequest(payload(&kind, data)?),
            "remove_signing_request" => {
                InboundEvent::RemoveSigningRequest(payload(&kind, data)?)
            }
            "notification" | "workflow_request" => {
                InboundEvent::Notification(payload(&kind, data)?)
            }
            "share_process" => InboundEvent::ShareProcess(payload(&kind, data)?),
            "session-timeout" => InboundEvent::SessionTimeout,
            _ => InboundEvent::Unrecognized { kind },
        };
        Ok(event)
    }

    /// Log-safe tag.
    pub fn tag(&self) -> &'static str {
        match self {
            InboundEvent::FileInfo { .. } => "fileInfo",
            InboundEvent::Account(_) => "account",
            InboundEvent::ConnectionStatus(_) => "connectionStatus",
            InboundEvent::FileTransfer(_) => "fileTransfer",
            InboundEvent::Transaction(_) => "tx",
            InboundEvent::StorageProvider(_) => "storageProvider",
            InboundEvent::AddressBook(_) => "addressBook",
            InboundEvent::AddSigningRequest(_) => "add_signing_request",
            InboundEvent::RemoveSigningRequest(_) => "remove_signing_request",
            InboundEvent::Notification(_) => "notification",
            InboundEvent::ShareProcess(_) => "share_process",
            InboundEvent::SessionTimeout => "session-timeout",
            InboundEvent::Unrecognized { .. } => "unrecognized",
        }
    }
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, ChannelError> {
    serde_json::from_value(data).map_err(|source| ChannelError::Payload {
        kind: kind.to_string(),
        source,
    })
}

/// The authority serializes empty slices and zero values as `null`; treat
/// that the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub type MessageHandler = Box<dyn FnMut(ChannelMessage) + Send + 'static>;

/// Persistent full-duplex link to the authority, as seen by the core.
pub trait ChannelTransport: Send {
    fn subscribe(&mut self, topic: &str, handler: MessageHandler);
    fn is_closed(&self) -> bool;
    fn close(&mut self);
}

#[derive(Default)]
struct MemoryChannelInner {
    handlers: HashMap<String, Vec<MessageHandler>>,
    closed: bool,
}

/// In-process transport: whoever holds a clone can publish into it.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<Mutex<MemoryChannelInner>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, topic: &str, msg: ChannelMessage) -> Result<(), ChannelError> {
        let mut inner = match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        if inner.closed {
            return Err(ChannelError::Closed);
        }
        if let Some(handlers) = inner.handlers.get_mut(topic) {
            for handler in handlers.iter_mut() {
                handler(msg.clone());
            }
        }
        Ok(())
    }
}

impl ChannelTransport for MemoryChannel {
    fn subscribe(&mut self, topic: &str, handler: MessageHandler) {
        let mut inner = match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        inner
            .handlers
            .entry(topic.to_string())
            .or_default()
            .push(handler);
    }

    fn is_closed(&self) -> bool {
        match self.inner.lock() {
            Ok(g) => g.closed,
            Err(poison) => poison.into_inner().closed,
        }
    }

    fn close(&mut self) {
        let mut inner = match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        inner.closed = true;
        inner.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_file_info_with_group_and_marks_loaded() {
        let raw = r#"{"type":"fileInfo","grpID":"false-false-false-false-","data":{"id":"0xab","filename":"x.pdf","scOrder":3,"definedSigners":null}}"#;
        let msg = ChannelMessage::from_json(raw).unwrap();
        match InboundEvent::decode(msg).unwrap() {
            InboundEvent::FileInfo { group_key, file } => {
                assert_eq!(group_key.as_deref(), Some("false-false-false-false-"));
                assert_eq!(file.id, "0xab");
                assert_eq!(file.sc_order, 3);
                assert!(file.loaded);
                assert!(file.defined_signers.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_types_fall_back_to_unrecognized() {
        let ev = InboundEvent::decode(ChannelMessage::new("mystery", json!({}))).unwrap();
        assert_eq!(
            ev,
            InboundEvent::Unrecognized {
                kind: "mystery".into()
            }
        );
    }

    #[test]
    fn workflow_request_is_a_notification() {
        let ev = InboundEvent::decode(ChannelMessage::new(
            "workflow_request",
            json!({"id": "n1", "type": "workflow_request", "timestamp": 10, "data": null}),
        ))
        .unwrap();
        assert!(matches!(ev, InboundEvent::Notification(ref n) if n.id == "n1"));
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        let err = InboundEvent::decode(ChannelMessage::new("tx", json!("not an object")))
            .unwrap_err();
        assert!(matches!(err, ChannelError::Payload { ref kind, .. } if kind == "tx"));
    }

    #[test]
    fn session_timeout_needs_no_payload() {
        let msg = ChannelMessage::from_json(r#"{"type":"session-timeout"}"#).unwrap();
        assert_eq!(
            InboundEvent::decode(msg).unwrap(),
            InboundEvent::SessionTimeout
        );
    }

    #[test]
    fn memory_channel_delivers_until_closed() {
        let mut ch = MemoryChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ch.subscribe(
            "global",
            Box::new(move |m| sink.lock().unwrap().push(m.kind)),
        );

        ch.publish("global", ChannelMessage::new("a", Value::Null))
            .unwrap();
        ch.publish("other", ChannelMessage::new("b", Value::Null))
            .unwrap();
        ch.close();
        assert!(ch.is_closed());
        assert!(matches!(
            ch.publish("global", ChannelMessage::new("c", Value::Null)),
            Err(ChannelError::Closed)
        ));
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);
    }
}
