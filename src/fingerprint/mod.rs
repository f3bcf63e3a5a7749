//! Fingerprint documents → attribute probe trees.
//!
//! A fingerprint (`{vendor}-fp.xml`) is a root element holding nested probe
//! elements. Each element's tag names a probe kind, its attributes carry the
//! probe parameters, and nesting expresses sub-conditions. Three attribute
//! names are reserved for the tree itself:
//!
//! - `match`: combinator over the children (`all` | `any`), required on
//!   every element that has children;
//! - `id`: names this node's boolean result so action conditions can
//!   reference it; unique per document;
//! - `name` / `version` / `installpath` / `vendor`: product identity; an
//!   element with `name` is a detection terminal and yields one product
//!   record when satisfied.

use std::collections::HashSet;

use crate::diag::DiagSink;
use crate::document::{parse_document, ElementParams};
use crate::error::{PspError, Result};
use crate::probe::{HostProbe, ProbeRegistry};
use crate::transport::HostTransport;

/// How a node combines its children's results with its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    All,
    Any,
}

impl Combinator {
    fn parse(params: &ElementParams, raw: &str) -> Result<Self> {
        match raw {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(params.structure_error(format!(
                "invalid combinator '{other}' (expected 'all' or 'any')"
            ))),
        }
    }
}

/// Product identity declared on a detection terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    pub name: String,
    pub version: Option<String>,
    pub install_path: Option<String>,
    pub vendor: Option<String>,
}

/// One node of a detection tree.
#[derive(Debug)]
pub struct AttributeNode {
    probe: Box<dyn HostProbe>,
    combinator: Option<Combinator>,
    identity: Option<ProductIdentity>,
    id: Option<String>,
    children: Vec<AttributeNode>,
    result: Option<bool>,
}

impl AttributeNode {
    pub fn identity(&self) -> Option<&ProductIdentity> {
        self.identity.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn children(&self) -> &[AttributeNode] {
        &self.children
    }

    /// Cached result of the last evaluation; `None` before evaluation.
    pub fn result(&self) -> Option<bool> {
        self.result
    }

    /// Evaluate this node and its whole subtree, caching results.
    ///
    /// Every node is evaluated, even under an unsatisfied parent: nested
    /// terminals and named results are independent of their ancestors. A
    /// probe failure downgrades to `false` with a warning. The only `Err`
    /// is structural corruption (children without a combinator), which the
    /// manager turns into a whole-vendor no-op.
    pub(crate) fn evaluate(
        &mut self,
        transport: &dyn HostTransport,
        sink: &dyn DiagSink,
    ) -> Result<bool> {
        let own = match self.probe.evaluate(transport) {
            Ok(satisfied) => satisfied,
            Err(e) => {
                sink.warning(&format!(
                    "probe {} failed ({e}), treating as unsatisfied",
                    self.probe.describe()
                ));
                false
            }
        };
        let combined = if self.children.is_empty() {
            own
        } else {
            let Some(combinator) = self.combinator else {
                return Err(PspError::Structure {
                    doc: "fingerprint".to_string(),
                    node: self.probe.kind().to_string(),
                    message: "node has children but no combinator".to_string(),
                });
            };
            let mut child_results = Vec::with_capacity(self.children.len());
            for child in &mut self.children {
                child_results.push(child.evaluate(transport, sink)?);
            }
            let children_hold = match combinator {
                Combinator::All => child_results.iter().all(|&r| r),
                Combinator::Any => child_results.iter().any(|&r| r),
            };
            own && children_hold
        };
        sink.debug(&format!(
            "probe {} => {combined}",
            self.probe.describe()
        ));
        self.result = Some(combined);
        Ok(combined)
    }
}

/// Build the root probe trees from a fingerprint document. Pure; rejects
/// unknown tags, missing combinators, malformed probe parameters and
/// duplicate ids.
pub fn build_fingerprint(
    doc: &str,
    text: &str,
    registry: &ProbeRegistry,
) -> Result<Vec<AttributeNode>> {
    let parsed = parse_document(doc, text)?;
    let mut seen_ids = HashSet::new();
    parsed
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| build_node(doc, &n, registry, &mut seen_ids))
        .collect()
}

fn build_node(
    doc: &str,
    node: &roxmltree::Node,
    registry: &ProbeRegistry,
    seen_ids: &mut HashSet<String>,
) -> Result<AttributeNode> {
    let params = ElementParams::from_node(doc, node);
    let probe = registry.construct(&params)?;

    let children: Vec<AttributeNode> = node
        .children()
        .filter(|n| n.is_element())
        .map(|n| build_node(doc, &n, registry, seen_ids))
        .collect::<Result<_>>()?;

    let combinator = match params.optional("match") {
        Some(raw) => Some(Combinator::parse(&params, raw)?),
        None if !children.is_empty() => {
            return Err(params.structure_error(
                "element has children but no 'match' combinator (expected 'all' or 'any')",
            ));
        }
        None => None,
    };

    let id = params.optional("id").map(str::to_string);
    if let Some(id) = &id {
        if !seen_ids.insert(id.clone()) {
            return Err(params.structure_error(format!("duplicate id '{id}'")));
        }
    }

    let identity = params.optional("name").map(|name| ProductIdentity {
        name: name.to_string(),
        version: params.optional("version").map(str::to_string),
        install_path: params.optional("installpath").map(str::to_string),
        vendor: params.optional("vendor").map(str::to_string),
    });

    Ok(AttributeNode {
        probe,
        combinator,
        identity,
        id,
        children,
        result: None,
    })
}
