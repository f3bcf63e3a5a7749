//! Action kinds and their registry.
//!
//! Mirrors the probe side: an action document tag names an action kind, the
//! registry maps tags to constructors. Constructors are lenient about
//! missing parameters, which surface as validation failures: a document
//! with an incomplete action still builds and is rejected by the
//! validate-then-execute protocol instead of a build error.

pub mod donot;
pub mod safety;
pub mod script;

use std::collections::HashMap;

use crate::diag::DiagSink;
use crate::document::ElementParams;
use crate::error::{PspError, Result};
use crate::transport::HostTransport;

/// What the tree walk does after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFlow {
    Continue,
    /// Cancel everything after this node in the current vendor's tree.
    Abort,
}

/// One remediation step.
pub trait HostAction: std::fmt::Debug {
    /// Registry tag this action was built from.
    fn kind(&self) -> &'static str;

    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Parameter-completeness check. No side effects. Empty = complete.
    fn validate(&self) -> Vec<String>;

    /// Perform the action. Failures are reported through the sink; only a
    /// safety abort changes control flow.
    fn execute(&self, transport: &dyn HostTransport, sink: &dyn DiagSink) -> ActionFlow;
}

pub type ActionCtor = fn(&ElementParams) -> Result<Box<dyn HostAction>>;

/// Tag-to-constructor dispatch for action documents.
pub struct ActionRegistry {
    ctors: HashMap<&'static str, ActionCtor>,
}

impl ActionRegistry {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// Registry with the built-in action kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("donot", donot::DoNotAction::from_params);
        registry.register("script", script::ScriptAction::from_params);
        registry.register("safetycheck", safety::SafetyCheckAction::from_params);
        registry
    }

    pub fn register(&mut self, tag: &'static str, ctor: ActionCtor) {
        self.ctors.insert(tag, ctor);
    }

    pub fn construct(&self, params: &ElementParams) -> Result<Box<dyn HostAction>> {
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

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
