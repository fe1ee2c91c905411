use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric counterparty alias lookup. An injected, read-only table consulted by the
/// counterparty-alias rule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AliasTable {
    aliases: BTreeMap<String, BTreeSet<String>>,
}

impl AliasTable {
    /// Registers `a` and `b` as aliases of each other. Symmetric: either name then resolves the
    /// other.
    pub fn insert(&mut self, a: &str, b: &str) {
        let a = a.to_uppercase();
        let b = b.to_uppercase();
        self.aliases.entry(a.clone()).or_default().insert(b.clone());
        self.aliases.entry(b).or_default().insert(a);
    }

    pub fn are_aliases(&self, a: &str, b: &str) -> bool {
        let a = a.to_uppercase();
        let b = b.to_uppercase();
        if a == b {
            return true;
        }
        self.aliases.get(&a).is_some_and(|known| known.contains(&b))
    }
}
