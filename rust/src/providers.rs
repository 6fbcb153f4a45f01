use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProviderRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jurisdiction_country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_center: String,
    #[serde(default)]
    pub terms_and_conditions_url: Option<String>,
    #[serde(default)]
    pub privacy_policy_url: Option<String>,
    #[serde(default)]
    pub max_storage_days: Value,
    #[serde(default)]
    pub max_file_size_byte: Value,
    #[serde(default)]
    pub grace_seconds: Value,
    #[serde(default)]
    pub price_byte: Value,
    #[serde(default)]
    pub price_day: Value,
}

impl StorageProviderRecord {
    /// Treat blank policy links as absent.
    fn normalized(mut self) -> Self {
        if self.terms_and_conditions_url.as_deref() == Some("") {
            self.terms_and_conditions_url = None;
        }
        if self.privacy_policy_url.as_deref() == Some("") {
            self.privacy_policy_url = None;
        }
        self
    }
}

/// Display name of a provider; an unnamed provider gets a localized
/// placeholder chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderName<'a> {
    Named(&'a str),
    Unnamed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderRegistry {
    providers: Vec<StorageProviderRecord>,
    /// Identity address → chosen provider address.
    default_by_identity: BTreeMap<String, String>,
}

impl ProviderRegistry {
    pub fn providers(&self) -> &[StorageProviderRecord] {
        &self.providers
    }

    pub fn upsert(&mut self, provider: StorageProviderRecord) {
        let provider = provider.normalized();
        match self
            .providers
            .iter_mut()
            .find(|p| p.address == provider.address)
        {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    /// Full reload.
    pub fn set_all(&mut self, providers: Vec<StorageProviderRecord>) {
        self.providers.clear();
        for p in providers {
            self.upsert(p);
        }
    }

    /// Session reset: providers go, recorded defaults stay.
    pub fn reset(&mut self) {
        self.providers.clear();
    }

    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.default_by_identity
    }

    pub fn restore_defaults(&mut self, defaults: BTreeMap<String, String>) {
        self.default_by_identity = defaults;
    }

    pub fn set_default(&mut self, identity: &str, provider: &str) {
        self.default_by_identity
            .insert(identity.to_string(), provider.to_string());
    }

    /// The provider recorded as default for `identity`, if still active.
    pub fn default_for(&self, identity: &str) -> Option<&StorageProviderRecord> {
        let chosen = self.default_by_identity.get(identity)?;
        self.providers.iter().find(|p| &p.address == chosen)
    }

    /// First provider when there is only one or nothing was chosen;
    /// otherwise the recorded choice, which may no longer exist.
    pub fn default_or_first(&self, identity: Option<&str>) -> Option<&StorageProviderRecord> {
        let recorded = identity.and_then(|id| self.default_by_identity.get(id));
        if self.providers.len() == 1 || recorded.is_none() {
            return self.providers.first();
        }
        identity.and_then(|id| self.default_for(id))
    }

    pub fn name_by_address(&self, address: &str) -> Option<ProviderName<'_>> {
        let p = self.providers.iter().find(|p| p.address == address)?;
        if p.name.is_empty() {
            Some(ProviderName::Unnamed)
        } else {
            Some(ProviderName::Named(&p.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(address: &str, name: &str) -> StorageProviderRecord {
        StorageProviderRecord {
            address: address.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_replaces_whole_record() {
        let mut reg = ProviderRegistry::default();
        reg.upsert(StorageProviderRecord {
            description: "old".into(),
            ..sp("0x1", "One")
        });
        reg.upsert(sp("0x1", "Uno"));
        assert_eq!(reg.providers().len(), 1);
        assert_eq!(reg.providers()[0].name, "Uno");
        assert_eq!(reg.providers()[0].description, "");
    }

    #[test]
    fn default_selection() {
        let mut reg = ProviderRegistry::default();
        assert!(reg.default_or_first(Some("me")).is_none());

        reg.set_all(vec![sp("0x1", "One"), sp("0x2", "Two")]);
        assert_eq!(reg.default_or_first(Some("me")).unwrap().address, "0x1");

        reg.set_default("me", "0x2");
        assert_eq!(reg.default_or_first(Some("me")).unwrap().address, "0x2");
        // Another identity has no choice recorded.
        assert_eq!(reg.default_or_first(Some("you")).unwrap().address, "0x1");
    }

    #[test]
    fn vanished_default_is_not_healed() {
        let mut reg = ProviderRegistry::default();
        reg.set_all(vec![sp("0x1", "One"), sp("0x2", "Two")]);
        reg.set_default("me", "0x9");
        assert!(reg.default_or_first(Some("me")).is_none());

        // With a single provider the recorded choice is irrelevant.
        reg.set_all(vec![sp("0x1", "One")]);
        assert_eq!(reg.default_or_first(Some("me")).unwrap().address, "0x1");
    }

    #[test]
    fn reset_keeps_defaults() {
        let mut reg = ProviderRegistry::default();
        reg.set_all(vec![sp("0x1", "One")]);
        reg.set_default("me", "0x1");
        reg.reset();
        assert!(reg.providers().is_empty());
        assert_eq!(reg.defaults().get("me").map(String::as_str), Some("0x1"));
    }

    #[test]
    fn unnamed_provider() {
        let mut reg = ProviderRegistry::default();
        reg.set_all(vec![sp("0x1", ""), sp("0x2", "Two")]);
        assert_eq!(reg.name_by_address("0x1"), Some(ProviderName::Unnamed));
        assert_eq!(reg.name_by_address("0x2"), Some(ProviderName::Named("Two")));
        assert_eq!(reg.name_by_address("0x3"), None);
    }

    #[test]
    fn blank_policy_links_become_none() {
        let mut reg = ProviderRegistry::default();
        reg.upsert(StorageProviderRecord {
            privacy_policy_url: Some(String::new()),
            terms_and_conditions_url: Some("https://sp.example/tos".into()),
            ..sp("0x1", "One")
        });
        assert!(reg.providers()[0].privacy_policy_url.is_none());
        assert!(reg.providers()[0].terms_and_conditions_url.is_some());
    }
}
