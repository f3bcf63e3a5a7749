//! Probe kinds and their registry.
//!
//! A probe is one leaf query against the live host. The registry maps a
//! fingerprint tag name to a constructor; adding a probe kind means
//! registering a constructor, the tree walker never changes.

pub mod directory;
pub mod regkey;

use std::collections::HashMap;

use crate::document::ElementParams;
use crate::error::{PspError, Result};
use crate::transport::{HostTransport, TransportResult};

/// One host condition, fully validated at construction.
pub trait HostProbe: std::fmt::Debug {
    /// Registry tag this probe was built from.
    fn kind(&self) -> &'static str;

    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Query the host. Errors are downgraded to "unsatisfied" by the
    /// detection manager, never propagated as fatal.
    fn evaluate(&self, transport: &dyn HostTransport) -> TransportResult<bool>;
}

pub type ProbeCtor = fn(&ElementParams) -> Result<Box<dyn HostProbe>>;

/// Tag-to-constructor dispatch for fingerprint documents.
pub struct ProbeRegistry {
    ctors: HashMap<&'static str, ProbeCtor>,
}

impl ProbeRegistry {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// Registry with the built-in probe kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("regkey", regkey::RegKeyProbe::from_params);
        registry.register("directory", directory::DirectoryProbe::from_params);
        registry
    }

    pub fn register(&mut self, tag: &'static str, ctor: ProbeCtor) {
        self.ctors.insert(tag, ctor);
    }

    /// Construct the probe for an element, rejecting unknown tags.
    pub fn construct(&self, params: &ElementParams) -> Result<Box<dyn HostProbe>> {
        match self.ctors.get(params.tag()) {
            Some(ctor) => ctor(params),
            None => Err(PspError::UnknownTag {
                doc: params.doc().to_string(),
                tag: params.tag().to_string(),
            }),
        }
    }

    /// Registered tag names, sorted for deterministic output.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.ctors.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
