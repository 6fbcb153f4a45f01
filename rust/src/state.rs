use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::contacts::{
    is_same_address, known_address_key, search_contacts, AddressBook, AddressEntry, ContactView,
};
use crate::files::{FileRecord, FileRegistry};
use crate::i18n::{keys, translate, EnglishCatalog, Translator};
use crate::notifications::{DayBucket, NotificationRecord, NotificationStore, SearchEnv};
use crate::providers::{ProviderName, ProviderRegistry, StorageProviderRecord};
use crate::transactions::{TransactionQueue, TransactionRecord};
use crate::wallet::WalletState;

pub const DEFAULT_NOTIFICATION_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub level: ToastLevel,
}

/// Durable UI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub file_list_view_type: String,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            file_list_view_type: "list".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SharedTranslator(pub Arc<dyn Translator>);

impl Default for SharedTranslator {
    fn default() -> Self {
        Self(Arc::new(EnglishCatalog))
    }
}

impl fmt::Debug for SharedTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedTranslator")
    }
}

/// Everything the presentation layer renders from. Derived views are
/// recomputed on every call.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub rev: u64,
    pub wallet: WalletState,
    pub files: FileRegistry,
    pub transactions: TransactionQueue,
    pub notifications: NotificationStore,
    pub contacts: AddressBook,
    pub providers: ProviderRegistry,
    pub preferences: Preferences,
    pub toast: Option<Toast>,
    pub notification_page_size: usize,
    #[serde(skip)]
    translator: SharedTranslator,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            wallet: WalletState::default(),
            files: FileRegistry::default(),
            transactions: TransactionQueue::default(),
            notifications: NotificationStore::default(),
            contacts: AddressBook::default(),
            providers: ProviderRegistry::default(),
            preferences: Preferences::default(),
            toast: None,
            notification_page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
            translator: SharedTranslator::default(),
        }
    }

    pub fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translator = SharedTranslator(translator);
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.0.as_ref()
    }

    pub fn tr(&self, key: &str, params: &[(&str, &str)]) -> String {
        translate(self.translator(), key, "", params)
    }

    /// Back to the anonymous session. Preferences and the per-identity
    /// default providers survive.
    pub fn reset_session(&mut self) {
        let keep_warning = self.files.do_not_show_remove_warning;
        self.wallet = WalletState::default();
        self.files = FileRegistry::default();
        self.files.do_not_show_remove_warning = keep_warning;
        self.transactions.clear();
        self.notifications = NotificationStore::default();
        self.contacts.clear();
        self.providers.reset();
        self.toast = None;
    }

    // ── Identity ────────────────────────────────────────────────────────

    pub fn self_address(&self) -> Option<&str> {
        self.wallet.current_address.as_deref()
    }

    pub fn self_name(&self) -> String {
        self.tr(keys::MY_ACCOUNT, &[])
    }

    fn is_self(&self, address: &str) -> bool {
        self.self_address()
            .is_some_and(|me| is_same_address(me, address))
    }

    // ── Contacts ────────────────────────────────────────────────────────

    /// Address book with self pinned first.
    pub fn contacts_merged(&self) -> Vec<ContactView> {
        self.contacts
            .merged(self.self_address(), &self.self_name())
    }

    pub fn contacts_by_search_term(&self, term: &str) -> Vec<ContactView> {
        let merged = self.contacts_merged();
        search_contacts(&merged, term).into_iter().cloned().collect()
    }

    pub fn contacts_without_self(&self) -> Vec<&AddressEntry> {
        self.contacts
            .entries()
            .iter()
            .filter(|e| !self.is_self(&e.address))
            .collect()
    }

    pub fn public_key_by_address(&self, address: &str) -> Option<String> {
        self.contacts_merged()
            .into_iter()
            .find(|c| is_same_address(&c.address, address))
            .map(|c| c.pgp_public_key)
            .filter(|k| !k.is_empty())
    }

    pub fn contacts_with_pgp_key(&self) -> Vec<ContactView> {
        self.contacts_merged()
            .into_iter()
            .filter(ContactView::has_pgp_key)
            .collect()
    }

    /// Contacts the file can still be shared with.
    pub fn contacts_to_share_file(&self, file: &FileRecord) -> Vec<ContactView> {
        self.contacts_with_pgp_key()
            .into_iter()
            .filter(|c| !c.myself)
            .filter(|c| !file.read_access.iter().any(|r| r.address == c.address))
            .collect()
    }

    /// Contacts not yet asked to sign the file.
    pub fn contacts_to_request_signature(&self, file: &FileRecord) -> Vec<ContactView> {
        self.contacts_with_pgp_key()
            .into_iter()
            .filter(|c| !file.is_undefined_signer(&c.address))
            .collect()
    }

    /// Display name for any address: address book, self, well-known
    /// addresses, storage providers, then the raw address.
    pub fn name_by_address(&self, address: &str) -> String {
        if address.is_empty() {
            return String::new();
        }
        if let Some(c) = self
            .contacts_merged()
            .into_iter()
            .find(|c| is_same_address(&c.address, address))
        {
            return c.name;
        }
        if self.is_self(address) {
            return self.self_name();
        }
        if let Some(key) = known_address_key(address) {
            return self.tr(key, &[]);
        }
        match self.providers.name_by_address(address) {
            Some(ProviderName::Named(name)) => name.to_string(),
            Some(ProviderName::Unnamed) => self.tr(keys::STORAGE_PROVIDER, &[]),
            None => address.to_string(),
        }
    }

    pub fn names_by_addresses(&self, addresses: &[String]) -> Vec<String> {
        addresses.iter().map(|a| self.name_by_address(a)).collect()
    }

    // ── Files ───────────────────────────────────────────────────────────

    pub fn filtered_files(&self) -> Vec<&FileRecord> {
        self.files.filtered()
    }

    pub fn loaded_files(&self) -> Vec<&FileRecord> {
        self.files.loaded()
    }

    pub fn files_loading(&self) -> bool {
        self.files.is_loading()
    }

    pub fn files_by_search_term(&self, term: &str) -> Vec<&FileRecord> {
        self.files.by_search_term(term)
    }

    pub fn shared_with_me(&self, term: &str) -> Vec<&FileRecord> {
        self.files.shared_with_me(self.self_address(), term)
    }

    pub fn file_by_hash(&self, hash: &str) -> Option<&FileRecord> {
        self.files.by_hash(hash)
    }

    pub fn is_file_shared_with_me(&self, file: &FileRecord) -> bool {
        file.is_shared_with_me(self.self_address())
    }

    pub fn missing_signers_info(&self, file: &FileRecord) -> String {
        file.missing_signers_info(self.self_address(), &self.self_name())
    }

    pub fn is_file_removing(&self, file: &FileRecord) -> bool {
        self.transactions.is_file_removing(&file.id)
    }

    pub fn is_file_pending_in_tx_queue(&self, file: &FileRecord) -> bool {
        self.transactions.is_file_pending(&file.id)
    }

    // ── Transactions / wallet ───────────────────────────────────────────

    pub fn transaction_queue(&self) -> &[TransactionRecord] {
        self.transactions.records()
    }

    pub fn is_approving(&self) -> bool {
        self.wallet.approving || self.transactions.has_operation("xes-approve")
    }

    // ── Notifications ───────────────────────────────────────────────────

    fn with_search_env<R>(&self, f: impl FnOnce(&SearchEnv<'_>) -> R) -> R {
        let name_of = |addr: &str| self.name_by_address(addr);
        let env = SearchEnv {
            name_of: &name_of,
            translator: self.translator(),
        };
        f(&env)
    }

    pub fn filtered_notifications(&self) -> Vec<&NotificationRecord> {
        self.with_search_env(|env| self.notifications.filter_by_opts(env))
    }

    pub fn notifications_in<Tz: TimeZone>(
        &self,
        bucket: DayBucket,
        now: &DateTime<Tz>,
        limit: Option<usize>,
    ) -> Vec<&NotificationRecord> {
        let limit = limit.unwrap_or(self.notification_page_size);
        self.with_search_env(|env| self.notifications.in_bucket(bucket, now, limit, env))
    }

    pub fn notifications_today(&self, limit: Option<usize>) -> Vec<&NotificationRecord> {
        self.notifications_in(DayBucket::Today, &Local::now(), limit)
    }

    pub fn notifications_yesterday(&self, limit: Option<usize>) -> Vec<&NotificationRecord> {
        self.notifications_in(DayBucket::Yesterday, &Local::now(), limit)
    }

    pub fn older_notifications(&self, limit: Option<usize>) -> Vec<&NotificationRecord> {
        self.notifications_in(DayBucket::Older, &Local::now(), limit)
    }

    pub fn notifications_count_in<Tz: TimeZone>(&self, bucket: DayBucket, now: &DateTime<Tz>) -> usize {
        self.notifications.bucket_count(bucket, now)
    }

    pub fn pending_notifications_count(&self) -> usize {
        self.notifications.pending_count()
    }

    pub fn total_notifications(&self) -> usize {
        self.notifications.total()
    }

    // ── Storage providers ───────────────────────────────────────────────

    pub fn default_storage_provider(&self) -> Option<&StorageProviderRecord> {
        self.providers.default_or_first(self.self_address())
    }
}
