use serde::{Deserialize, Serialize};

use crate::channel::null_as_default;

/// Address book entry. Also the shape of file owners, signers and
/// read-access lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pgp_public_key: String,
}

impl AddressEntry {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            pgp_public_key: String::new(),
        }
    }

    pub fn has_pgp_key(&self) -> bool {
        !self.pgp_public_key.is_empty()
    }
}

/// Row of the merged view: either a stored entry or the synthesized self.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    pub name: String,
    pub address: String,
    pub pgp_public_key: String,
    pub myself: bool,
}

impl ContactView {
    pub fn has_pgp_key(&self) -> bool {
        !self.pgp_public_key.is_empty()
    }
}

/// Static table of well-known addresses, as translation keys.
const KNOWN_ADDRESSES: &[(&str, &str)] = &[(
    "0x38ba9213c70bf6fe34f70cfc5c9b26707c6c1e85",
    crate::i18n::keys::XES_FAUCET,
)];

pub fn known_address_key(address: &str) -> Option<&'static str> {
    KNOWN_ADDRESSES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(address))
        .map(|(_, key)| *key)
}

pub(crate) fn is_same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AddressBook {
    entries: Vec<AddressEntry>,
}

impl AddressBook {
    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    /// Channel push: replace in place when the address is known, otherwise
    /// prepend. Returns true for a new entry.
    pub fn upsert(&mut self, entry: AddressEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.address == entry.address) {
            Some(existing) => {
                *existing = entry;
                false
            }
            None => {
                self.entries.insert(0, entry);
                true
            }
        }
    }

    /// Full reload from the authority.
    pub fn set_all(&mut self, entries: Vec<AddressEntry>) {
        self.entries = entries;
    }

    pub fn remove(&mut self, address: &str) -> Option<AddressEntry> {
        let idx = self.entries.iter().position(|e| e.address == address)?;
        Some(self.entries.remove(idx))
    }

    pub fn rename(&mut self, address: &str, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.address == address) {
            Some(e) => {
                e.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Self first, then every other entry in stored order. A stored entry for
    /// the active identity is folded into the self row.
    pub fn merged(&self, self_address: Option<&str>, self_name: &str) -> Vec<ContactView> {
        let mut out = Vec::with_capacity(self.entries.len() + 1);
        if let Some(me) = self_address {
            let stored = self
                .entries
                .iter()
                .find(|e| is_same_address(&e.address, me));
            out.push(ContactView {
                name: self_name.to_string(),
                address: stored
                    .map(|e| e.address.clone())
                    .unwrap_or_else(|| me.to_string()),
                pgp_public_key: stored
                    .map(|e| e.pgp_public_key.clone())
                    .unwrap_or_default(),
                myself: true,
            });
        }
        for e in &self.entries {
            if self_address.is_some_and(|me| is_same_address(&e.address, me)) {
                continue;
            }
            let name = if e.name.is_empty() {
                e.address.clone()
            } else {
                e.name.clone()
            };
            out.push(ContactView {
                name,
                address: e.address.clone(),
                pgp_public_key: e.pgp_public_key.clone(),
                myself: false,
            });
        }
        out
    }
}

/// Case-insensitive substring search over name and address.
pub fn search_contacts<'a>(contacts: &'a [ContactView], term: &str) -> Vec<&'a ContactView> {
    let term = term.to_lowercase();
    contacts
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&term) || c.address.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: &str = "0xAAA";

    #[test]
    fn self_is_pinned_first_regardless_of_insertion_order() {
        let mut book = AddressBook::default();
        book.upsert(AddressEntry::new("Bob", "0xbbb"));
        book.upsert(AddressEntry::new("", ME));
        book.upsert(AddressEntry::new("Carol", "0xccc"));

        let merged = book.merged(Some(ME), "My Account");
        assert_eq!(merged[0].address, ME);
        assert_eq!(merged[0].name, "My Account");
        assert!(merged[0].myself);
        // Carol was pushed last so she sits at the front of the stored list.
        let rest: Vec<_> = merged[1..].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(rest, vec!["Carol", "Bob"]);
    }

    #[test]
    fn self_is_synthesized_when_not_stored() {
        let mut book = AddressBook::default();
        book.upsert(AddressEntry::new("Bob", "0xbbb"));
        let merged = book.merged(Some(ME), "Me");
        assert_eq!(merged.len(), 2);
        assert!(merged[0].myself);
        assert_eq!(merged[0].address, ME);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut book = AddressBook::default();
        assert!(book.upsert(AddressEntry::new("Bob", "0xbbb")));
        assert!(book.upsert(AddressEntry::new("Carol", "0xccc")));
        assert!(!book.upsert(AddressEntry::new("Robert", "0xbbb")));
        let names: Vec<_> = book.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Carol", "Robert"]);
    }

    #[test]
    fn empty_name_shows_address() {
        let mut book = AddressBook::default();
        book.upsert(AddressEntry::new("", "0xddd"));
        let merged = book.merged(None, "Me");
        assert_eq!(merged[0].name, "0xddd");
    }

    #[test]
    fn keys_are_case_sensitive_for_mutations() {
        let mut book = AddressBook::default();
        book.upsert(AddressEntry::new("Bob", "0xBBB"));
        assert!(book.remove("0xbbb").is_none());
        assert!(!book.rename("0xbbb", "x"));
        assert!(book.remove("0xBBB").is_some());
    }

    #[test]
    fn known_addresses_ignore_case() {
        assert!(known_address_key("0x38BA9213C70BF6FE34F70CFC5C9B26707C6C1E85").is_some());
        assert!(known_address_key("0x01").is_none());
    }
}
