////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{collections::HashMap, iter::FromIterator};

use thiserror::Error;

use crate::extension_names::{self, SymbolKind};

/// Returned by [`ProcAddressTable::address_for`] when no slot matches the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "address query failed for \"{normalized}\"/\"{requested}\"; it's either statically linked or not a known function"
)]
pub struct AddressNotFound {
    /// The name as passed by the caller.
    pub requested: String,
    /// The name with its ARB-like and vendor suffixes stripped.
    pub normalized: String,
}

/// Native function addresses keyed by the names exposed by the bindings.
///
/// The table is filled once when the bindings are loaded and is read-only afterwards, so it can be
/// shared between threads freely.
#[derive(Debug, Default, Clone)]
pub struct ProcAddressTable {
    slots: HashMap<String, usize>,
}

impl ProcAddressTable {
    /// Builds the table by asking `loader` for the address of every name in `names`.
    ///
    /// Addresses the loader cannot provide are stored as `0`; the slot still exists.
    pub fn populate<I, S, F>(names: I, mut loader: F) -> ProcAddressTable
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&str) -> usize, {
        names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let address = loader(&name);
                (name, address)
            })
            .collect()
    }

    /// Returns the address stored for `name` or for any suffix spelling of it.
    ///
    /// `glBufferDataARB`, `glBufferDataEXT` and `glBufferData` all resolve to the slot of whichever
    /// of them the bindings expose.
    pub fn address_for(&self, name: &str) -> Result<usize, AddressNotFound> {
        let normalized = extension_names::normalize_vendor(
            &extension_names::normalize_arb(name, SymbolKind::Function),
            SymbolKind::Function,
        );

        let found = extension_names::function_name_permutations(&normalized)
            .into_iter()
            .find_map(|candidate| self.slots.get(&candidate).copied());

        match found {
            Some(address) => Ok(address),
            None => {
                trace!("no address slot for {} (normalized: {})", name, normalized);
                Err(AddressNotFound { requested: name.to_owned(), normalized })
            },
        }
    }

    /// True if `name` has a slot of its own, without any normalization.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for ProcAddressTable {
    fn from_iter<T: IntoIterator<Item = (S, usize)>>(iter: T) -> ProcAddressTable {
        ProcAddressTable { slots: iter.into_iter().map(|(name, address)| (name.into(), address)).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ProcAddressTable {
        vec![("glBufferData", 0x10), ("glFooEXT", 0x20), ("glMissing", 0)].into_iter().collect()
    }

    #[test]
    fn every_permutation_resolves_to_the_same_slot() {
        let table = table();
        for name in &["glBufferData", "glBufferDataARB", "glBufferDataEXT", "glBufferDataOES", "glBufferDataNV"] {
            assert_eq!(table.address_for(name), Ok(0x10), "{}", name);
        }
    }

    #[test]
    fn suffixed_slot_is_found_through_its_core_name() {
        let table = table();
        assert_eq!(table.address_for("glFoo"), Ok(0x20));
        assert_eq!(table.address_for("glFooEXT"), Ok(0x20));
        assert_eq!(table.address_for("glFooARB"), Ok(0x20));
    }

    #[test]
    fn unloaded_slot_is_still_a_slot() {
        assert_eq!(table().address_for("glMissing"), Ok(0));
    }

    #[test]
    fn unknown_name_carries_both_spellings() {
        let err = table().address_for("glUnknownARB").unwrap_err();
        assert_eq!(err.requested, "glUnknownARB");
        assert_eq!(err.normalized, "glUnknown");
        assert!(err.to_string().contains("statically linked"));
    }

    #[test]
    fn populate_asks_loader_once_per_name() {
        let mut asked = Vec::new();
        let table = ProcAddressTable::populate(vec!["glA", "glB"], |name| {
            asked.push(name.to_owned());
            if name == "glA" { 1 } else { 0 }
        });
        assert_eq!(asked, vec!["glA", "glB"]);
        assert_eq!(table.len(), 2);
        assert!(table.contains("glB"));
        assert_eq!(table.address_for("glA"), Ok(1));
    }
}
