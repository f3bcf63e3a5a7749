//! Detection evaluator.
//!
//! [`PspManager`] owns the attribute trees for one vendor run, evaluates
//! them against the host and aggregates satisfied terminals into
//! [`Product`] records.

pub mod product;

use std::collections::BTreeMap;

pub use product::Product;

use crate::diag::DiagSink;
use crate::fingerprint::AttributeNode;
use crate::transport::HostTransport;

/// Everything remediation needs from detection: the products in visit
/// order, plus named node results for `if-probe` condition references.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub products: Vec<Product>,
    pub attributes: BTreeMap<String, bool>,
}

/// Evaluates registered probe trees and collects detected products.
///
/// Built fresh per vendor per run; evaluate-once. Individual probe failures
/// are warnings; only structural corruption aborts the whole evaluation, in
/// which case no partial product set is reported.
pub struct PspManager {
    roots: Vec<AttributeNode>,
    products: Vec<Product>,
    attributes: BTreeMap<String, bool>,
    executed: bool,
}

impl PspManager {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            products: Vec::new(),
            attributes: BTreeMap::new(),
            executed: false,
        }
    }

    /// Register a root tree. May be called repeatedly to compose probes
    /// from multiple sources.
    pub fn add_root(&mut self, root: AttributeNode) {
        self.roots.push(root);
    }

    /// True only if at least one root was registered.
    pub fn is_valid(&self) -> bool {
        !self.roots.is_empty()
    }

    /// Depth-first, left-to-right evaluation of every registered root.
    pub fn execute(&mut self, transport: &dyn HostTransport, sink: &dyn DiagSink) {
        if !self.is_valid() {
            sink.critical("detection requested with no registered probe trees");
            return;
        }
        if self.executed {
            sink.warning("detection already executed for this run, ignoring");
            return;
        }
        self.executed = true;

        for root in &mut self.roots {
            if let Err(e) = root.evaluate(transport, sink) {
                // no partial product set on structural corruption
                sink.critical(&format!("detection aborted: {e}"));
                self.products.clear();
                self.attributes.clear();
                return;
            }
        }

        for root in &self.roots {
            collect(root, &mut self.products, &mut self.attributes);
        }
        sink.debug(&format!("detection produced {} product(s)", self.products.len()));
    }

    /// Products from the most recent `execute`, in visit order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_outcome(self) -> DetectionOutcome {
        DetectionOutcome {
            products: self.products,
            attributes: self.attributes,
        }
    }
}

impl Default for PspManager {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(node: &AttributeNode, products: &mut Vec<Product>, attributes: &mut BTreeMap<String, bool>) {
    let satisfied = node.result().unwrap_or(false);
    if let Some(id) = node.id() {
        attributes.insert(id.to_string(), satisfied);
    }
    if satisfied {
        if let Some(identity) = node.identity() {
            products.push(Product::from_identity(identity));
        }
    }
    for child in node.children() {
        collect(child, products, attributes);
    }
}
