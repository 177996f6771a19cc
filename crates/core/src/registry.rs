//! # Operad Registry
//!
//! A named lookup table of operads. Independent modules register their
//! algebras here and look up each other's by name.
//!
//! The registry is an ordinary value: applications build one at startup
//! and pass it to whoever needs it, and tests simply create a fresh one.
//!
//! ```rust
//! use polyagent_core::operad::Operad;
//! use polyagent_core::registry::OperadRegistry;
//! use polyagent_core::universal::UNIVERSAL;
//!
//! let mut registry = OperadRegistry::with_universal();
//! let base = registry.get(UNIVERSAL).unwrap().clone();
//! registry.register(Operad::extend(&base, "game"));
//!
//! assert_eq!(registry.names(), vec!["game", "universal"]);
//! ```

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::operad::Operad;
use crate::universal::universal_operad;

/// Name → operad table with overwrite-on-register semantics.
#[derive(Debug, Clone, Default)]
pub struct OperadRegistry {
    operads: HashMap<String, Operad>,
}

impl OperadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the universal operad.
    pub fn with_universal() -> Self {
        let mut registry = Self::new();
        registry.register(universal_operad());
        registry
    }

    /// Store `operad` under its own name.
    ///
    /// Returns the operad it replaced, if any.
    pub fn register(&mut self, operad: Operad) -> Option<Operad> {
        let name = operad.name().to_string();
        let operations = operad.operations().len();
        let laws = operad.laws().len();
        let previous = self.operads.insert(name.clone(), operad);
        if previous.is_some() {
            warn!(operad = %name, operations, laws, "operad re-registered, previous entry replaced");
        } else {
            debug!(operad = %name, operations, laws, "operad registered");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Operad> {
        self.operads.get(name)
    }

    pub fn all_operads(&self) -> &HashMap<String, Operad> {
        &self.operads
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operads.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operads.is_empty()
    }

    /// Drop every registration.
    pub fn reset(&mut self) {
        debug!(cleared = self.operads.len(), "registry reset");
        self.operads.clear();
    }
}
