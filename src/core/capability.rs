//! Capability presence tracking with deliver-once callbacks.
//!
//! A capability is an opaque fact about a module ("the java plugin is
//! applied"). Capabilities only ever go from absent to present during a pass.
//! Callbacks registered for a capability are handed back exactly once, at the
//! transition, so that the caller can run them with whatever mutable state it
//! owns.

use std::collections::BTreeSet;
use std::fmt;

use crate::util::InternedString;

/// Opaque capability identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(InternedString);

impl Capability {
    pub fn new(name: impl AsRef<str>) -> Self {
        Capability(InternedString::new(name))
    }

    pub fn as_str(&self) -> &'static str {
        self.0.as_str()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Capability::new(s)
    }
}

impl From<String> for Capability {
    fn from(s: String) -> Self {
        Capability::new(s)
    }
}

/// Capabilities used by the built-in conventions.
pub mod well_known {
    pub const JAVA: &str = "java";
    pub const JAVA_LIBRARY: &str = "java-library";
    pub const KOTLIN_JVM: &str = "kotlin-jvm";
    pub const MAVEN_PUBLISH: &str = "maven-publish";
    pub const SIGNING: &str = "signing";
    pub const BUILD_PARAMETERS: &str = "build-parameters";
}

/// Presence set and pending callbacks for one module.
///
/// `T` is the callback type. The probe never invokes callbacks itself; it
/// returns the ones that are due.
#[derive(Debug)]
pub struct CapabilityProbe<T> {
    present: BTreeSet<Capability>,
    pending: Vec<(Capability, T)>,
}

impl<T> Default for CapabilityProbe<T> {
    fn default() -> Self {
        CapabilityProbe {
            present: BTreeSet::new(),
            pending: Vec::new(),
        }
    }
}

impl<T> CapabilityProbe<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a capability is present right now.
    pub fn is_present(&self, capability: Capability) -> bool {
        self.present.contains(&capability)
    }

    /// Register a callback for a capability.
    ///
    /// Returns the callback back if the capability is already present; the
    /// caller must run it immediately. Otherwise it is kept until
    /// [`provide`](Self::provide) marks the capability present.
    #[must_use = "a returned callback must be run now"]
    pub fn on_becomes_present(&mut self, capability: Capability, callback: T) -> Option<T> {
        if self.is_present(capability) {
            Some(callback)
        } else {
            self.pending.push((capability, callback));
            None
        }
    }

    /// Mark a capability present.
    ///
    /// Returns the callbacks waiting on it, in registration order. Asserting
    /// an already present capability returns nothing.
    #[must_use = "returned callbacks must be run now"]
    pub fn provide(&mut self, capability: Capability) -> Vec<T> {
        if !self.present.insert(capability) {
            return Vec::new();
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(cap, _)| *cap == capability);
        self.pending = waiting;

        due.into_iter().map(|(_, callback)| callback).collect()
    }

    /// Present capabilities, sorted.
    pub fn present(&self) -> impl Iterator<Item = Capability> + '_ {
        self.present.iter().copied()
    }

    /// Number of callbacks still waiting on an absent capability.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Capabilities that have callbacks waiting on them.
    pub fn awaited(&self) -> BTreeSet<Capability> {
        self.pending.iter().map(|(cap, _)| *cap).collect()
    }
}
