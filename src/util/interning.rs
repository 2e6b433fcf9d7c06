//! Interned identifiers for convention units and capabilities.
//!
//! Ids are created once when units are registered and then copied into every
//! plan, graph node and deferred step of a pass.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::{Mutex, OnceLock};

fn intern(s: &str) -> &'static str {
    static POOL: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();

    let mut pool = POOL
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    match pool.get(s) {
        Some(&existing) => existing,
        None => {
            let leaked: &'static str = Box::leak(Box::<str>::from(s));
            pool.insert(leaked);
            leaked
        }
    }
}

/// A unit id or capability name. Copies share one allocation per distinct id.
///
/// Equality, ordering and hashing follow the string contents, so a
/// `HashMap<InternedString, _>` can be queried with a plain `&str`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternedString(&'static str);

impl InternedString {
    pub fn new(s: impl AsRef<str>) -> Self {
        InternedString(intern(s.as_ref()))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Deref for InternedString {
    type Target = str;

    fn deref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for InternedString {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_same_id_shares_storage() {
        let unit = InternedString::new("java-library-conventions");
        let requested = InternedString::new(String::from("java-library-conventions"));

        assert_eq!(unit, requested);
        assert!(std::ptr::eq(unit.as_str(), requested.as_str()));
        assert_ne!(unit, InternedString::new("publishing-conventions"));
    }

    #[test]
    fn test_registry_lookup_by_str() {
        let mut units = HashMap::new();
        units.insert(InternedString::new("base-conventions"), 1);

        assert_eq!(units.get("base-conventions"), Some(&1));
        assert_eq!(units.get("jmh-conventions"), None);
    }

    #[test]
    fn test_capabilities_sort_by_name() {
        let mut present = vec![
            InternedString::new("signing"),
            InternedString::new("java"),
            InternedString::new("maven-publish"),
        ];
        present.sort();

        assert_eq!(
            present.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            vec!["java", "maven-publish", "signing"]
        );
    }
}
