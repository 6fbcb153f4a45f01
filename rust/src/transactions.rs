use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::channel::null_as_default;
use crate::i18n::keys;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TxStatus {
    #[default]
    Pending,
    Success,
    Fail,
    Error,
    Other(String),
}

impl TxStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "success" => Self::Success,
            "fail" => Self::Fail,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl Serialize for TxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TxStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing status is never terminal.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::parse(&s)).unwrap_or_else(|| Self::Other(String::new())))
    }
}

/// Queued chain operation or file transfer as reported by the authority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tx_hash: String,
    /// File hash the operation targets.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default = "missing_status")]
    pub status: TxStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default)]
    pub xes_amount: Value,
    #[serde(default)]
    pub who: Value,
    #[serde(default)]
    pub gas_price: Value,
    #[serde(default)]
    pub gas_limit: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub syncing: bool,
}

fn missing_status() -> TxStatus {
    TxStatus::Other(String::new())
}

impl TransactionRecord {
    /// Key the queue is reconciled by.
    pub fn correlation(&self) -> &str {
        if self.tx_hash.is_empty() {
            &self.hash
        } else {
            &self.tx_hash
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxApply {
    Inserted,
    Replaced,
    Removed,
    /// Success for a record that is not queued.
    Ignored,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionQueue {
    records: Vec<TransactionRecord>,
}

impl TransactionQueue {
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn apply(&mut self, tx: TransactionRecord) -> TxApply {
        let idx = self
            .records
            .iter()
            .position(|t| t.correlation() == tx.correlation());
        match (idx, tx.status == TxStatus::Success) {
            (Some(i), true) => {
                self.records.remove(i);
                TxApply::Removed
            }
            (None, true) => TxApply::Ignored,
            (Some(i), false) => {
                self.records[i] = tx;
                TxApply::Replaced
            }
            (None, false) => {
                self.records.push(tx);
                TxApply::Inserted
            }
        }
    }

    pub fn remove(&mut self, correlation: &str) -> Option<TransactionRecord> {
        let idx = self
            .records
            .iter()
            .position(|t| t.correlation() == correlation)?;
        Some(self.records.remove(idx))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn is_file_pending(&self, file_hash: &str) -> bool {
        !file_hash.is_empty()
            && self
                .records
                .iter()
                .any(|t| t.hash == file_hash && t.is_pending())
    }

    pub fn is_file_removing(&self, file_hash: &str) -> bool {
        !file_hash.is_empty()
            && self
                .records
                .iter()
                .any(|t| t.hash == file_hash && t.is_pending() && t.name == "remove")
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.records.iter().any(|t| t.name == name)
    }
}

/// User-facing failure raised by a `tx` push, independent of the queue
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFailure {
    Upload,
    Remove { filename: String },
    Sign { filename: String },
    SignRequest { filename: String },
}

impl TxFailure {
    pub fn from_tx(tx: &TransactionRecord) -> Option<Self> {
        let filename = || tx.file_name.clone();
        match (tx.name.as_str(), &tx.status) {
            ("register", TxStatus::Error) => Some(Self::Upload),
            ("remove", TxStatus::Error) => Some(Self::Remove {
                filename: filename(),
            }),
            ("sign", TxStatus::Fail) => Some(Self::Sign {
                filename: filename(),
            }),
            ("requestSign", TxStatus::Fail) => Some(Self::SignRequest {
                filename: filename(),
            }),
            _ => None,
        }
    }

    pub fn body_key(&self) -> &'static str {
        match self {
            Self::Upload => keys::UPLOAD_FAILED,
            Self::Remove { .. } => keys::REMOVE_FAILED,
            Self::Sign { .. } => keys::SIGN_FAILED,
            Self::SignRequest { .. } => keys::SIGN_REQUEST_FAILED,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Upload => None,
            Self::Remove { filename } | Self::Sign { filename } | Self::SignRequest { filename } => {
                Some(filename)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(tx_hash: &str, name: &str, status: TxStatus) -> TransactionRecord {
        TransactionRecord {
            tx_hash: tx_hash.into(),
            hash: format!("file-{tx_hash}"),
            name: name.into(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn success_for_untracked_hash_is_a_noop() {
        let mut q = TransactionQueue::default();
        q.apply(tx("t1", "share", TxStatus::Pending));
        assert_eq!(q.apply(tx("t9", "share", TxStatus::Success)), TxApply::Ignored);
        assert_eq!(q.records().len(), 1);
    }

    #[test]
    fn success_removes_exactly_the_tracked_record() {
        let mut q = TransactionQueue::default();
        q.apply(tx("t1", "share", TxStatus::Pending));
        q.apply(tx("t2", "sign", TxStatus::Pending));
        q.apply(tx("t3", "remove", TxStatus::Pending));
        assert_eq!(q.apply(tx("t2", "sign", TxStatus::Success)), TxApply::Removed);
        let left: Vec<_> = q.records().iter().map(|t| t.tx_hash.as_str()).collect();
        assert_eq!(left, vec!["t1", "t3"]);
        // Reapplying after removal changes nothing.
        assert_eq!(q.apply(tx("t2", "sign", TxStatus::Success)), TxApply::Ignored);
        assert_eq!(q.records().len(), 2);
    }

    #[test]
    fn non_terminal_status_replaces() {
        let mut q = TransactionQueue::default();
        q.apply(tx("t1", "sign", TxStatus::Pending));
        assert_eq!(q.apply(tx("t1", "sign", TxStatus::Fail)), TxApply::Replaced);
        assert_eq!(q.records()[0].status, TxStatus::Fail);
        assert_eq!(q.apply(tx("t1", "sign", TxStatus::Fail)), TxApply::Replaced);
        assert_eq!(q.records().len(), 1);
    }

    #[test]
    fn file_hash_is_the_fallback_key() {
        let mut q = TransactionQueue::default();
        let mut upload = tx("", "upload", TxStatus::Pending);
        upload.hash = "0xfile".into();
        q.apply(upload.clone());
        upload.status = TxStatus::Success;
        assert_eq!(q.apply(upload), TxApply::Removed);
    }

    #[test]
    fn pending_and_removing_lookups() {
        let mut q = TransactionQueue::default();
        q.apply(tx("t1", "remove", TxStatus::Pending));
        assert!(q.is_file_pending("file-t1"));
        assert!(q.is_file_removing("file-t1"));
        q.apply(tx("t1", "remove", TxStatus::Error));
        assert!(!q.is_file_removing("file-t1"));
        assert!(!q.is_file_pending(""));
    }

    #[test]
    fn wire_status_parsing() {
        let t: TransactionRecord =
            serde_json::from_value(json!({"txHash": "0x1", "name": "x", "status": "mined"}))
                .unwrap();
        assert_eq!(t.status, TxStatus::Other("mined".into()));
        let t: TransactionRecord = serde_json::from_value(json!({"txHash": "0x1"})).unwrap();
        assert_ne!(t.status, TxStatus::Success);
        assert!(!t.error && !t.syncing);
    }

    #[test]
    fn failures_map_to_toasts() {
        let mut t = tx("t", "remove", TxStatus::Error);
        t.file_name = "a.pdf".into();
        let f = TxFailure::from_tx(&t).unwrap();
        assert_eq!(f.body_key(), keys::REMOVE_FAILED);
        assert_eq!(f.filename(), Some("a.pdf"));

        assert_eq!(
            TxFailure::from_tx(&tx("t", "register", TxStatus::Error)),
            Some(TxFailure::Upload)
        );
        assert!(TxFailure::from_tx(&tx("t", "sign", TxStatus::Error)).is_none());
        assert!(TxFailure::from_tx(&tx("t", "revoke", TxStatus::Fail)).is_none());
    }
}
