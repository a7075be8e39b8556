//! Endpoint registry
//!
//! The registry is a plain value: whoever owns it passes it by reference
//! to the components that read from or merge into it.

use std::collections::BTreeSet;

use df_protocol::Endpoint;

use crate::types::ScanRecord;

/// Deduplicated set of known bridge endpoints
///
/// Iteration is in canonical order, but callers should treat the registry
/// as an unordered set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    endpoints: BTreeSet<Endpoint>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one endpoint, returning whether it was new
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        self.endpoints.insert(endpoint)
    }

    /// Set union with `additional`, returning how many endpoints were new
    pub fn merge<I>(&mut self, additional: I) -> usize
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let before = self.endpoints.len();
        self.endpoints.extend(additional);
        self.endpoints.len() - before
    }

    /// Merge the endpoints derived from scan records
    ///
    /// Records excluded by [`ScanRecord::endpoint`] are skipped.
    pub fn merge_records<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a ScanRecord>,
    {
        self.merge(records.into_iter().filter_map(ScanRecord::endpoint))
    }

    /// Check membership
    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.endpoints.contains(endpoint)
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Iterate over the endpoints
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    /// Copy the endpoints into a vector
    pub fn to_vec(&self) -> Vec<Endpoint> {
        self.endpoints.iter().cloned().collect()
    }

    /// Remove every endpoint
    pub fn clear(&mut self) {
        self.endpoints.clear();
    }
}

impl FromIterator<Endpoint> for Registry {
    fn from_iter<T: IntoIterator<Item = Endpoint>>(iter: T) -> Self {
        Self {
            endpoints: iter.into_iter().collect(),
        }
    }
}

impl Extend<Endpoint> for Registry {
    fn extend<T: IntoIterator<Item = Endpoint>>(&mut self, iter: T) {
        self.endpoints.extend(iter);
    }
}

impl IntoIterator for Registry {
    type Item = Endpoint;
    type IntoIter = std::collections::btree_set::IntoIter<Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.into_iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Endpoint;
    type IntoIter = std::collections::btree_set::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}
