//! Labelled addresses being monitored.

use crate::address::Address;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A user-chosen label bound to an exchange address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub label: String,
    pub address: Address,
}

impl AddressEntry {
    pub fn new(label: impl Into<String>, address: Address) -> Self {
        Self {
            label: label.into(),
            address,
        }
    }
}

/// Ordered list of watched addresses, unique by label.
///
/// Labels compare case-sensitively. Two labels may point at the same
/// address; the first entry wins when a fill is matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    entries: Vec<AddressEntry>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry.
    ///
    /// Fails if the label is taken or the address is malformed. The label
    /// check runs first so a duplicate is reported even with a bad address.
    pub fn add(&mut self, label: &str, address: &str) -> Result<&AddressEntry> {
        if self.contains_label(label) {
            return Err(CoreError::DuplicateLabel(label.to_string()));
        }
        let address = Address::parse(address)?;
        self.entries.push(AddressEntry::new(label, address));
        // Non-empty after push.
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Remove the entry with the given label.
    pub fn remove(&mut self, label: &str) -> Result<AddressEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.label == label)
            .ok_or_else(|| CoreError::LabelNotFound(label.to_string()))?;
        Ok(self.entries.remove(idx))
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }

    /// Find the entry watching `address` (case-insensitive).
    pub fn find_by_address(&self, address: &str) -> Option<&AddressEntry> {
        find_by_address(&self.entries, address)
    }

    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    /// Owned copy handed to the feed client.
    pub fn snapshot(&self) -> Vec<AddressEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-insensitive address lookup over a snapshot slice.
pub fn find_by_address<'a>(entries: &'a [AddressEntry], address: &str) -> Option<&'a AddressEntry> {
    entries.iter().find(|e| e.address.eq_ignore_case(address))
}

/// Distinct lowercase addresses in a snapshot.
pub fn distinct_addresses(entries: &[AddressEntry]) -> HashSet<String> {
    entries.iter().map(|e| e.address.to_lowercase()).collect()
}
