//! Notification and signing-request store.
//!
//! Both collections carry a local-only [`ActionLock`]. While a lock is held
//! the record belongs to an in-flight local action and pushes describing the
//! old state are dropped. Search and day bucketing are pure views over the
//! stored notifications.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::channel::null_as_default;
use crate::i18n::{translate, Translator};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionLock {
    #[default]
    Free,
    Held(String),
}

impl ActionLock {
    pub fn is_free(&self) -> bool {
        matches!(self, ActionLock::Free)
    }

    pub fn is_held(&self) -> bool {
        !self.is_free()
    }
}

impl Serialize for ActionLock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ActionLock::Free => serializer.serialize_none(),
            ActionLock::Held(action) => serializer.serialize_some(action),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dismissed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(
        rename = "actionInProgress",
        skip_deserializing,
        skip_serializing_if = "ActionLock::is_free"
    )]
    pub lock: ActionLock,
}

impl NotificationRecord {
    /// File the notification refers to, if any.
    pub fn file_hash(&self) -> Option<&str> {
        self.data
            .get("hash")
            .or_else(|| self.data.get("fileHash"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequestRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tx_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_thumbnail: bool,
    #[serde(
        rename = "inProgress",
        skip_deserializing,
        skip_serializing_if = "ActionLock::is_free"
    )]
    pub lock: ActionLock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Inserted,
    Replaced,
    /// Dropped because the stored record is locked.
    Suppressed,
    /// Dropped because it arrived dismissed and is not stored.
    Dismissed,
}

/// `(type, name key, description key)` for every notification kind.
pub const NOTIFICATION_TYPES: &[(&str, &str, &str)] = &[
    (
        "signing_request",
        "filebrowser.notifications.notification_signing_request",
        "filebrowser.notifications.notification_signing_request_desc",
    ),
    (
        "signing_request_removed",
        "filebrowser.notifications.notification_signing_request_removed",
        "filebrowser.notifications.notification_signing_request_removed_desc",
    ),
    (
        "share_request",
        "filebrowser.notifications.notification_share_request",
        "filebrowser.notifications.notification_share_request_desc",
    ),
    (
        "workflow_request",
        "filebrowser.notifications.notification_workflow_request",
        "filebrowser.notifications.notification_workflow_request_desc",
    ),
    (
        "tx_xes_approval",
        "filebrowser.notifications.notification_tx_xes_approve",
        "filebrowser.notifications.notification_tx_xes_approve_desc",
    ),
    (
        "tx_register",
        "filebrowser.notifications.notification_tx_register",
        "filebrowser.notifications.notification_tx_register_desc",
    ),
    (
        "tx_remove",
        "filebrowser.notifications.notification_tx_remove",
        "filebrowser.notifications.notification_tx_remove_desc",
    ),
    (
        "tx_share",
        "filebrowser.notifications.notification_tx_share",
        "filebrowser.notifications.notification_tx_share_desc",
    ),
    (
        "tx_sign",
        "filebrowser.notifications.notification_tx_sign",
        "filebrowser.notifications.notification_tx_sign_desc",
    ),
    (
        "ev_notifysign",
        "filebrowser.notifications.notification_ev_notifysign",
        "filebrowser.notifications.notification_ev_notifysign_desc",
    ),
    (
        "tx_signRequest",
        "filebrowser.notifications.notification_tx_signRequest",
        "filebrowser.notifications.notification_tx_signRequest_desc",
    ),
    (
        "tx_revoke",
        "filebrowser.notifications.notification_tx_revoke",
        "filebrowser.notifications.notification_tx_revoke_desc",
    ),
    (
        "tx_success",
        "filebrowser.notifications.notification_tx_success",
        "filebrowser.notifications.notification_tx_success",
    ),
    (
        "file_about_to_expire",
        "filebrowser.notifications.notification_file_about_to_expire",
        "filebrowser.notifications.notification_file_about_to_expire_desc",
    ),
    (
        "file_grace_period",
        "filebrowser.notifications.notification_file_grace_period",
        "filebrowser.notifications.notification_file_grace_period_desc",
    ),
    (
        "file_expired",
        "filebrowser.notifications.notification_file_expired",
        "filebrowser.notifications.notification_file_expired_desc",
    ),
    (
        "tx_xes_send",
        "filebrowser.notifications.notification_tx_xes_send",
        "filebrowser.notifications.notification_tx_xes_send_desc",
    ),
    (
        "tx_xes_receive",
        "filebrowser.notifications.notification_tx_xes_receive",
        "filebrowser.notifications.notification_tx_xes_receive_desc",
    ),
    (
        "tx_eth_increase",
        "filebrowser.notifications.notification_tx_eth_increase",
        "filebrowser.notifications.notification_tx_eth_increase_desc",
    ),
    (
        "tx_eth_decrease",
        "filebrowser.notifications.notification_tx_eth_decrease",
        "filebrowser.notifications.notification_tx_eth_decrease_desc",
    ),
];

/// Collaborators the search needs but the store does not own.
pub struct SearchEnv<'a> {
    pub name_of: &'a dyn Fn(&str) -> String,
    pub translator: &'a dyn Translator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBucket {
    Today,
    Yesterday,
    Older,
}

impl DayBucket {
    pub const ALL: [DayBucket; 3] = [DayBucket::Today, DayBucket::Yesterday, DayBucket::Older];
}

/// Local-day bucket of `timestamp` relative to `now`, in `now`'s zone.
/// Timestamps after today fall in no bucket.
pub fn day_bucket<Tz: TimeZone>(timestamp: i64, now: &DateTime<Tz>) -> Option<DayBucket> {
    let day = now
        .timezone()
        .timestamp_opt(timestamp, 0)
        .single()?
        .date_naive();
    let today = now.date_naive();
    let yesterday = today.pred_opt()?;
    if day == today {
        Some(DayBucket::Today)
    } else if day == yesterday {
        Some(DayBucket::Yesterday)
    } else if day < yesterday {
        Some(DayBucket::Older)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationStore {
    notifications: Vec<NotificationRecord>,
    signing_requests: Vec<SigningRequestRecord>,
    pub search_term: String,
    pub show_pending: bool,
}

impl NotificationStore {
    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    pub fn signing_requests(&self) -> &[SigningRequestRecord] {
        &self.signing_requests
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn apply_notification(&mut self, mut incoming: NotificationRecord) -> Reconcile {
        incoming.lock = ActionLock::Free;
        match self.notifications.iter_mut().find(|n| n.id == incoming.id) {
            None if incoming.dismissed => Reconcile::Dismissed,
            None => {
                self.notifications.push(incoming);
                Reconcile::Inserted
            }
            Some(existing) if existing.lock.is_held() => Reconcile::Suppressed,
            Some(existing) => {
                *existing = incoming;
                Reconcile::Replaced
            }
        }
    }

    pub fn apply_signing_request(&mut self, mut incoming: SigningRequestRecord) -> Reconcile {
        incoming.lock = ActionLock::Free;
        match self
            .signing_requests
            .iter_mut()
            .find(|s| s.file_hash == incoming.file_hash)
        {
            None => {
                self.signing_requests.push(incoming);
                Reconcile::Inserted
            }
            Some(existing) if existing.lock.is_held() => Reconcile::Suppressed,
            Some(existing) => {
                *existing = incoming;
                Reconcile::Replaced
            }
        }
    }

    pub fn remove_notification(&mut self, id: &str) -> Option<NotificationRecord> {
        let idx = self.notifications.iter().position(|n| n.id == id)?;
        Some(self.notifications.remove(idx))
    }

    pub fn remove_signing_request(&mut self, file_hash: &str) -> Option<SigningRequestRecord> {
        let idx = self
            .signing_requests
            .iter()
            .position(|s| s.file_hash == file_hash)?;
        Some(self.signing_requests.remove(idx))
    }

    /// Drop every notification of `kind` about `file_hash`.
    pub fn remove_for_file(&mut self, file_hash: &str, kind: &str) -> usize {
        let before = self.notifications.len();
        self.notifications
            .retain(|n| !(n.kind == kind && n.file_hash() == Some(file_hash)));
        before - self.notifications.len()
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.unread = false;
        }
    }

    pub fn hold_action(&mut self, id: &str, action: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.lock = ActionLock::Held(action.to_string());
                true
            }
            None => false,
        }
    }

    pub fn release_for_file(&mut self, file_hash: &str, kind: &str) -> bool {
        let mut released = false;
        for n in &mut self.notifications {
            if n.kind == kind && n.file_hash() == Some(file_hash) && n.lock.is_held() {
                n.lock = ActionLock::Free;
                released = true;
            }
        }
        released
    }

    pub fn hold_signing_request(&mut self, file_hash: &str) -> bool {
        match self
            .signing_requests
            .iter_mut()
            .find(|s| s.file_hash == file_hash)
        {
            Some(s) => {
                s.lock = ActionLock::Held("sign".to_string());
                true
            }
            None => false,
        }
    }

    pub fn release_signing_request(&mut self, file_hash: &str) -> bool {
        match self
            .signing_requests
            .iter_mut()
            .find(|s| s.file_hash == file_hash && s.lock.is_held())
        {
            Some(s) => {
                s.lock = ActionLock::Free;
                true
            }
            None => false,
        }
    }

    /// Newest first; equal timestamps keep arrival order.
    pub fn sorted(&self) -> Vec<&NotificationRecord> {
        let mut out: Vec<&NotificationRecord> = self.notifications.iter().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    /// Notifications passing the pending filter and the search term.
    pub fn filter_by_opts(&self, env: &SearchEnv<'_>) -> Vec<&NotificationRecord> {
        let mut candidates = self.sorted();
        if self.show_pending {
            candidates.retain(|n| n.pending);
        }
        let term = self.search_term.as_str();
        if term.is_empty() {
            return candidates;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for n in &candidates {
            if term_matches(n, term, env) && seen.insert(n.id.as_str()) {
                out.push(*n);
            }
        }
        let types = types_matching_label(term, env.translator);
        if !types.is_empty() {
            for n in &candidates {
                if types.iter().any(|t| *t == n.kind) && seen.insert(n.id.as_str()) {
                    out.push(*n);
                }
            }
        }
        out
    }

    pub fn in_bucket<Tz: TimeZone>(
        &self,
        bucket: DayBucket,
        now: &DateTime<Tz>,
        limit: usize,
        env: &SearchEnv<'_>,
    ) -> Vec<&NotificationRecord> {
        self.filter_by_opts(env)
            .into_iter()
            .filter(|n| day_bucket(n.timestamp, now) == Some(bucket))
            .take(limit)
            .collect()
    }

    pub fn bucket_count<Tz: TimeZone>(&self, bucket: DayBucket, now: &DateTime<Tz>) -> usize {
        self.notifications
            .iter()
            .filter(|n| day_bucket(n.timestamp, now) == Some(bucket))
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.notifications.iter().filter(|n| n.pending).count()
    }

    pub fn total(&self) -> usize {
        self.notifications.len()
    }
}

fn is_quoted(term: &str) -> bool {
    term.len() >= 2
        && ((term.starts_with('"') && term.ends_with('"'))
            || (term.starts_with('\'') && term.ends_with('\'')))
}

fn term_matches(n: &NotificationRecord, term: &str, env: &SearchEnv<'_>) -> bool {
    if is_quoted(term) {
        return word_matches(n, &term[1..term.len() - 1], env);
    }
    let words: Vec<&str> = term.split(' ').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return true;
    }
    words.iter().any(|w| word_matches(n, w, env))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn word_matches(n: &NotificationRecord, word: &str, env: &SearchEnv<'_>) -> bool {
    let word = word.to_lowercase();
    if contains_ci(&n.id, &word) || contains_ci(&n.kind, &word) {
        return true;
    }
    let resolved = |addr: &str| contains_ci(&(env.name_of)(addr), &word);
    n.data.iter().any(|(field, value)| match field.as_str() {
        "who" => match value {
            Value::Array(items) => items.iter().filter_map(Value::as_str).any(resolved),
            Value::String(addr) => resolved(addr),
            _ => false,
        },
        "owner" => match value {
            Value::String(addr) => resolved(addr),
            Value::Object(entry) => entry
                .get("address")
                .and_then(Value::as_str)
                .is_some_and(resolved),
            _ => false,
        },
        _ => coerce(value).is_some_and(|s| contains_ci(&s, &word)),
    })
}

/// String form of a payload value for substring matching. Null never
/// matches.
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| coerce(v).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Notification types whose localized name or description matches `term`
/// as a case-insensitive regular expression.
fn types_matching_label(term: &str, translator: &dyn Translator) -> Vec<&'static str> {
    let re = match RegexBuilder::new(term).case_insensitive(true).build() {
        Ok(re) => re,
        Err(err) => {
            tracing::debug!(%err, "search term is not a valid pattern");
            return Vec::new();
        }
    };
    let blanks = [("fileName", ""), ("from", ""), ("xesAmount", ""), ("who", "")];
    NOTIFICATION_TYPES
        .iter()
        .filter(|(_, name, desc)| {
            re.is_match(&translate(translator, name, name, &blanks))
                || re.is_match(&translate(translator, desc, desc, &blanks))
        })
        .map(|(kind, _, _)| *kind)
        .collect()
}
