//! File registry and the query-context tracker guarding it.
//!
//! File detail arrives only as `fileInfo` pushes tagged with the grouping key
//! of the query that produced them. Anything tagged with another key is
//! leftover from a superseded query and never reaches the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::null_as_default;
use crate::contacts::AddressEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    #[default]
    AllFiles,
    MyFiles,
    SharedWithMe,
    SignedByMe,
    ExpiredFiles,
}

impl FileCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" | "all-files" => Some(Self::AllFiles),
            "mine" | "my-files" => Some(Self::MyFiles),
            "shared" | "shared-with-me" => Some(Self::SharedWithMe),
            "signed" | "signed-by-me" => Some(Self::SignedByMe),
            "expired" | "expired-files" => Some(Self::ExpiredFiles),
            _ => None,
        }
    }
}

/// Category filter plus free-text term of the active file query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub category: FileCategory,
    pub search_term: String,
}

impl QueryContext {
    pub fn new(category: FileCategory, search_term: impl Into<String>) -> Self {
        Self {
            category,
            search_term: search_term.into(),
        }
    }

    /// `{mine}-{shared}-{signed}-{expired}-{term}`; the authority echoes it
    /// back verbatim as `grpID`.
    pub fn group_key(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.category == FileCategory::MyFiles,
            self.category == FileCategory::SharedWithMe,
            self.category == FileCategory::SignedByMe,
            self.category == FileCategory::ExpiredFiles,
            self.search_term
        )
    }

    /// Query parameters of the file-list command.
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("filter", self.search_term.clone())];
        let flag = match self.category {
            FileCategory::AllFiles => None,
            FileCategory::MyFiles => Some("myFiles"),
            FileCategory::SharedWithMe => Some("sharedWithMe"),
            FileCategory::SignedByMe => Some("signedByMe"),
            FileCategory::ExpiredFiles => Some("expiredFiles"),
        };
        if let Some(flag) = flag {
            params.push((flag, "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default)]
    pub file_kind: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_thumbnail: bool,
    #[serde(default)]
    pub owner: Option<AddressEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub removed: bool,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub grace_seconds: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expired: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub in_grace_period: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub about_to_expire: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_type: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub defined_signers: Vec<AddressEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signers: Vec<AddressEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sc_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub undefined_signers: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub undefined_signers_left: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signature_status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub read_access: Vec<AddressEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sent_sign_requests_file_undefined_signers: Vec<AddressEntry>,
    /// Full detail has arrived from the authority.
    #[serde(default)]
    pub loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignStatus {
    NoSignersRequired,
    Unsigned,
    Signed,
}

impl SignStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::NoSignersRequired),
            2 => Some(Self::Unsigned),
            3 => Some(Self::Signed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerEntry {
    pub signer: AddressEntry,
    pub signed: bool,
}

/// Icon family derived from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileIcon {
    Pdf,
    Document,
    Word,
    Image,
    Movie,
    Chart,
    Generic,
}

impl FileRecord {
    pub fn sign_status(&self) -> Option<SignStatus> {
        SignStatus::from_code(self.signature_status)
    }

    fn has_signed(&self, address: &str) -> bool {
        self.signers.iter().any(|s| s.address == address)
    }

    pub fn signers_list(&self) -> Vec<SignerEntry> {
        self.defined_signers
            .iter()
            .map(|ds| SignerEntry {
                signer: ds.clone(),
                signed: self.has_signed(&ds.address),
            })
            .collect()
    }

    /// Display names of defined signers that have not signed yet.
    pub fn missing_signers_info(&self, self_address: Option<&str>, self_name: &str) -> String {
        self.defined_signers
            .iter()
            .filter(|ds| !self.has_signed(&ds.address))
            .map(|ds| {
                if self_address == Some(ds.address.as_str()) {
                    self_name.to_string()
                } else if ds.name.is_empty() {
                    ds.address.clone()
                } else {
                    ds.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn read_access_list(&self) -> &[AddressEntry] {
        &self.read_access
    }

    pub fn is_defined_signer(&self, address: &str) -> bool {
        self.defined_signers.iter().any(|s| s.address == address)
    }

    pub fn is_undefined_signer(&self, address: &str) -> bool {
        self.sent_sign_requests_file_undefined_signers
            .iter()
            .any(|s| s.address == address)
    }

    /// Readers who were never asked for a signature.
    pub fn read_access_without_signature_request(&self) -> Vec<&AddressEntry> {
        self.read_access
            .iter()
            .filter(|ra| !self.is_undefined_signer(&ra.address))
            .filter(|ra| !self.is_defined_signer(&ra.address))
            .collect()
    }

    pub fn is_shared_with_me(&self, my_address: Option<&str>) -> bool {
        match &self.owner {
            Some(owner) => Some(owner.address.as_str()) != my_address,
            None => false,
        }
    }

    pub fn thumbnail_path(&self) -> String {
        format!("/api/file/thumb/{}", self.id)
    }

    pub fn icon(&self) -> FileIcon {
        let ext = self
            .filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "pdf" => FileIcon::Pdf,
            "rtf" | "odt" | "txt" => FileIcon::Document,
            "doc" | "docx" => FileIcon::Word,
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "tiff" => FileIcon::Image,
            "avi" | "mpg" | "mov" | "wmv" | "mp4" => FileIcon::Movie,
            "xls" => FileIcon::Chart,
            _ => FileIcon::Generic,
        }
    }
}

/// Last `share_process` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileApply {
    Inserted,
    Replaced,
    /// Tagged with a grouping key other than the current one.
    Stale,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FileRegistry {
    context: QueryContext,
    files: Vec<FileRecord>,
    pub loading: bool,
    pub loading_error: bool,
    pub process_info: Option<ProcessInfo>,
    pub do_not_show_remove_warning: bool,
}

impl FileRegistry {
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn set_category(&mut self, category: FileCategory) {
        self.context.category = category;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.context.search_term = term.into();
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.files
    }

    /// Apply a pushed file if it belongs to the current query.
    pub fn accept(&mut self, group_key: Option<&str>, file: FileRecord) -> FileApply {
        if group_key != Some(self.context.group_key().as_str()) {
            return FileApply::Stale;
        }
        self.upsert(file)
    }

    pub fn upsert(&mut self, mut file: FileRecord) -> FileApply {
        if file.filename.is_empty() || file.filename == "." {
            file.filename = file.id.clone();
        }
        match self.files.iter_mut().find(|f| f.id == file.id) {
            Some(existing) => {
                *existing = file;
                FileApply::Replaced
            }
            None => {
                self.files.push(file);
                FileApply::Inserted
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FileRecord> {
        let idx = self.files.iter().position(|f| f.id == id)?;
        Some(self.files.remove(idx))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Visible files, highest `scOrder` first.
    pub fn filtered(&self) -> Vec<&FileRecord> {
        let mut out: Vec<&FileRecord> = self
            .files
            .iter()
            .filter(|f| !f.removed && f.loaded)
            .collect();
        // sort_by is stable; ties keep arrival order.
        out.sort_by(|a, b| b.sc_order.cmp(&a.sc_order));
        out
    }

    pub fn loaded(&self) -> Vec<&FileRecord> {
        self.files.iter().filter(|f| f.loaded).collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading || (!self.files.is_empty() && !self.files.iter().any(|f| f.loaded))
    }

    pub fn by_search_term(&self, term: &str) -> Vec<&FileRecord> {
        if term.is_empty() {
            return self.filtered();
        }
        let term = term.to_lowercase();
        self.filtered()
            .into_iter()
            .filter(|f| {
                f.filename.to_lowercase().contains(&term) || f.id.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn shared_with_me(&self, my_address: Option<&str>, term: &str) -> Vec<&FileRecord> {
        let term = term.to_lowercase();
        self.filtered()
            .into_iter()
            .filter(|f| f.is_shared_with_me(my_address))
            .filter(|f| term.is_empty() || f.filename.to_lowercase().contains(&term))
            .collect()
    }

    pub fn by_hash(&self, hash: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(id: &str, filename: &str, sc_order: i64) -> FileRecord {
        FileRecord {
            id: id.into(),
            filename: filename.into(),
            sc_order,
            loaded: true,
            ..Default::default()
        }
    }

    #[test]
    fn group_key_matches_wire_format() {
        assert_eq!(
            QueryContext::new(FileCategory::AllFiles, "").group_key(),
            "false-false-false-false-"
        );
        assert_eq!(
            QueryContext::new(FileCategory::SignedByMe, "tax").group_key(),
            "false-false-true-false-tax"
        );
    }

    #[test]
    fn list_params_carry_category_flag() {
        let params = QueryContext::new(FileCategory::ExpiredFiles, "x").list_params();
        assert_eq!(
            params,
            vec![("filter", "x".to_string()), ("expiredFiles", "true".to_string())]
        );
        assert_eq!(QueryContext::default().list_params().len(), 1);
    }

    #[test]
    fn late_results_of_a_superseded_query_are_dropped() {
        let mut reg = FileRegistry::default();
        let old_key = reg.context().group_key();
        reg.set_category(FileCategory::MyFiles);
        let new_key = reg.context().group_key();

        assert_eq!(reg.accept(Some(&old_key), file("a", "a", 1)), FileApply::Stale);
        assert_eq!(reg.accept(None, file("b", "b", 1)), FileApply::Stale);
        assert_eq!(reg.accept(Some(&new_key), file("c", "c", 1)), FileApply::Inserted);
        let ids: Vec<_> = reg.records().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn second_push_replaces_and_defaults_filename() {
        let mut reg = FileRegistry::default();
        let key = reg.context().group_key();
        reg.accept(Some(&key), file("h1", "", 1));
        assert_eq!(reg.records()[0].filename, "h1");
        assert_eq!(reg.accept(Some(&key), file("h1", "a.pdf", 2)), FileApply::Replaced);

        assert_eq!(reg.records().len(), 1);
        let f = &reg.records()[0];
        assert_eq!((f.id.as_str(), f.filename.as_str(), f.sc_order), ("h1", "a.pdf", 2));
    }

    #[test]
    fn dot_filename_defaults_to_id() {
        let mut reg = FileRegistry::default();
        reg.upsert(file("h2", ".", 0));
        assert_eq!(reg.records()[0].filename, "h2");
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut reg = FileRegistry::default();
        reg.upsert(file("a", "a.txt", 4));
        let before = reg.records().to_vec();
        reg.upsert(file("a", "a.txt", 4));
        assert_eq!(reg.records(), before.as_slice());
    }

    #[test]
    fn filtered_hides_removed_and_unloaded_and_sorts_stably() {
        let mut reg = FileRegistry::default();
        reg.upsert(file("a", "a", 1));
        reg.upsert(file("b", "b", 3));
        reg.upsert(file("c", "c", 1));
        reg.upsert(FileRecord {
            removed: true,
            ..file("d", "d", 9)
        });
        reg.upsert(FileRecord {
            loaded: false,
            ..file("e", "e", 9)
        });
        let ids: Vec<_> = reg.filtered().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn loading_when_only_placeholders_exist() {
        let mut reg = FileRegistry::default();
        assert!(!reg.is_loading());
        reg.upsert(FileRecord {
            loaded: false,
            ..file("a", "a", 0)
        });
        assert!(reg.is_loading());
        reg.upsert(file("b", "b", 0));
        assert!(!reg.is_loading());
    }

    #[test]
    fn search_matches_filename_or_id() {
        let mut reg = FileRegistry::default();
        reg.upsert(file("0xabc", "Invoice.pdf", 0));
        reg.upsert(file("0xdef", "notes.txt", 0));
        assert_eq!(reg.by_search_term("invoice").len(), 1);
        assert_eq!(reg.by_search_term("DEF")[0].id, "0xdef");
        assert_eq!(reg.by_search_term("").len(), 2);
    }

    #[test]
    fn shared_with_me_excludes_own_and_ownerless() {
        let mut reg = FileRegistry::default();
        reg.upsert(FileRecord {
            owner: Some(AddressEntry::new("me", "0xme")),
            ..file("a", "mine.pdf", 0)
        });
        reg.upsert(FileRecord {
            owner: Some(AddressEntry::new("bob", "0xbob")),
            ..file("b", "bobs.pdf", 0)
        });
        reg.upsert(file("c", "nobody.pdf", 0));
        let shared = reg.shared_with_me(Some("0xme"), "");
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, "b");
        assert!(reg.shared_with_me(Some("0xme"), "zzz").is_empty());
    }

    #[test]
    fn signers_and_missing_signers() {
        let f = FileRecord {
            defined_signers: vec![
                AddressEntry::new("Alice", "0xa"),
                AddressEntry::new("", "0xb"),
                AddressEntry::new("whoever", "0xme"),
                AddressEntry::new("Dan", "0xd"),
            ],
            signers: vec![AddressEntry::new("Dan", "0xd")],
            ..file("f", "f", 0)
        };
        let list = f.signers_list();
        assert_eq!(list.iter().filter(|s| s.signed).count(), 1);
        assert_eq!(
            f.missing_signers_info(Some("0xme"), "My Account"),
            "Alice, 0xb, My Account"
        );
    }

    #[test]
    fn readers_without_signature_request() {
        let f = FileRecord {
            read_access: vec![
                AddressEntry::new("a", "0xa"),
                AddressEntry::new("b", "0xb"),
                AddressEntry::new("c", "0xc"),
            ],
            defined_signers: vec![AddressEntry::new("a", "0xa")],
            sent_sign_requests_file_undefined_signers: vec![AddressEntry::new("b", "0xb")],
            ..file("f", "f", 0)
        };
        let rest: Vec<_> = f
            .read_access_without_signature_request()
            .iter()
            .map(|e| e.address.as_str())
            .collect();
        assert_eq!(rest, vec!["0xc"]);
    }

    #[test]
    fn sign_status_is_tri_state() {
        let mut f = file("f", "f", 0);
        for (code, want) in [
            (1, Some(SignStatus::NoSignersRequired)),
            (2, Some(SignStatus::Unsigned)),
            (3, Some(SignStatus::Signed)),
            (0, None),
            (4, None),
        ] {
            f.signature_status = code;
            assert_eq!(f.sign_status(), want);
        }
    }

    #[test]
    fn wire_payload_with_nulls_decodes() {
        let f: FileRecord = serde_json::from_value(json!({
            "id": "0x1",
            "filename": null,
            "owner": {"name": "Bob", "address": "0xb", "pgpPublicKey": null},
            "expiry": 1700000000,
            "signers": null,
            "readAccess": null,
            "signatureStatus": 2,
        }))
        .unwrap();
        assert_eq!(f.filename, "");
        assert_eq!(f.expiry.map(|e| e.timestamp()), Some(1_700_000_000));
        assert_eq!(f.owner.as_ref().unwrap().pgp_public_key, "");
        assert_eq!(f.sign_status(), Some(SignStatus::Unsigned));
        assert!(!f.loaded);
    }

    #[test]
    fn icon_follows_extension() {
        assert_eq!(file("a", "Scan.PDF", 0).icon(), FileIcon::Pdf);
        assert_eq!(file("a", "photo.jpeg", 0).icon(), FileIcon::Image);
        assert_eq!(file("a", "README", 0).icon(), FileIcon::Generic);
    }
}
