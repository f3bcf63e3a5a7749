//! Action documents → conditional action trees.
//!
//! An action document (`{vendor}-actions.xml`) is a root element holding
//! nested action elements. Each element's tag names an action kind and two
//! reserved attributes gate it:
//!
//! - `if`: one or more product references, comma separated. A reference is
//!   a product name, or `vendor:name` to pin the vendor. References are
//!   resolved against the detection outcome at build time; a reference that
//!   does not resolve is carried as an explicit unresolved marker and
//!   rejected by validation, never discovered mid-execution.
//! - `if-probe`: the id of a named fingerprint node; satisfied when that
//!   node's result was true.
//!
//! Children run only if the parent's condition held and the parent did not
//! abort.

pub mod manager;

use serde::Serialize;

use crate::action::{ActionRegistry, HostAction};
use crate::detect::{DetectionOutcome, Product};
use crate::document::{parse_document, ElementParams};
use crate::error::Result;

/// One bound condition reference.
#[derive(Debug, Clone, PartialEq)]
enum ConditionRef {
    Product { reference: String, resolved: bool },
    Attribute { id: String, result: Option<bool> },
}

/// A node's guard, pre-bound to the detection outcome.
#[derive(Debug, Clone, Default)]
pub struct Condition {
    refs: Vec<ConditionRef>,
}

impl Condition {
    fn bind(params: &ElementParams, outcome: &DetectionOutcome) -> Self {
        let mut refs = Vec::new();
        if let Some(raw) = params.optional("if") {
            for reference in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let resolved = outcome.products.iter().any(|p| matches(p, reference));
                refs.push(ConditionRef::Product {
                    reference: reference.to_string(),
                    resolved,
                });
            }
        }
        if let Some(id) = params.optional("if-probe") {
            refs.push(ConditionRef::Attribute {
                id: id.to_string(),
                result: outcome.attributes.get(id).copied(),
            });
        }
        Self { refs }
    }

    /// References that did not resolve to a known product or attribute
    /// result, for validation reporting.
    pub fn unresolved(&self) -> Vec<String> {
        self.refs
            .iter()
            .filter_map(|r| match r {
                ConditionRef::Product {
                    reference,
                    resolved: false,
                } => Some(format!("product '{reference}' was not detected")),
                ConditionRef::Attribute { id, result: None } => {
                    Some(format!("no fingerprint node named '{id}'"))
                }
                _ => None,
            })
            .collect()
    }

    /// True when every reference holds. Unconditional nodes are satisfied.
    pub fn satisfied(&self) -> bool {
        self.refs.iter().all(|r| match r {
            ConditionRef::Product { resolved, .. } => *resolved,
            ConditionRef::Attribute { result, .. } => result.unwrap_or(false),
        })
    }
}

fn matches(product: &Product, reference: &str) -> bool {
    match reference.split_once(':') {
        Some((vendor, name)) => {
            product.vendor.as_deref() == Some(vendor) && product.name == name
        }
        None => product.name == reference,
    }
}

/// One node of a remediation tree.
pub struct ConditionalNode {
    label: String,
    action: Box<dyn HostAction>,
    condition: Condition,
    children: Vec<ConditionalNode>,
}

impl ConditionalNode {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn action(&self) -> &dyn HostAction {
        self.action.as_ref()
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn children(&self) -> &[ConditionalNode] {
        &self.children
    }
}

/// Build the root action trees from an action document, binding every
/// condition to the detection outcome. Structural problems (bad XML,
/// unknown tags) fail the build; unresolved references and incomplete
/// action parameters build fine and fail validation instead.
pub fn build_actions(
    doc: &str,
    text: &str,
    registry: &ActionRegistry,
    outcome: &DetectionOutcome,
) -> Result<Vec<ConditionalNode>> {
    let parsed = parse_document(doc, text)?;
    parsed
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .enumerate()
        .map(|(i, n)| build_node(doc, &n, i, "", registry, outcome))
        .collect()
}

fn build_node(
    doc: &str,
    node: &roxmltree::Node,
    index: usize,
    parent_label: &str,
    registry: &ActionRegistry,
    outcome: &DetectionOutcome,
) -> Result<ConditionalNode> {
    let params = ElementParams::from_node(doc, node);
    let label = if parent_label.is_empty() {
        format!("{}[{index}]", params.tag())
    } else {
        format!("{parent_label}/{}[{index}]", params.tag())
    };
    let action = registry.construct(&params)?;
    let condition = Condition::bind(&params, outcome);
    let children = node
        .children()
        .filter(|n| n.is_element())
        .enumerate()
        .map(|(i, n)| build_node(doc, &n, i, &label, registry, outcome))
        .collect::<Result<_>>()?;
    Ok(ConditionalNode {
        label,
        action,
        condition,
        children,
    })
}

/// Why validation rejected a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnresolvedReference,
    IncompleteParams,
}

/// One validation failure, naming the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub node: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Product;

    fn acme_outcome() -> DetectionOutcome {
        DetectionOutcome {
            products: vec![Product {
                vendor: Some("acme".to_string()),
                name: "AcmeAV".to_string(),
                version: None,
                install_path: None,
            }],
            attributes: [("acme-key".to_string(), true), ("acme-svc".to_string(), false)]
                .into_iter()
                .collect(),
        }
    }

    fn build(text: &str) -> Result<Vec<ConditionalNode>> {
        build_actions(
            "test-actions.xml",
            text,
            &ActionRegistry::builtin(),
            &acme_outcome(),
        )
    }

    #[test]
    fn resolves_product_reference_at_build_time() {
        let roots = build(r#"<actions><script if="AcmeAV" path="x.py"/></actions>"#).unwrap();
        assert!(roots[0].condition().unresolved().is_empty());
        assert!(roots[0].condition().satisfied());
    }

    #[test]
    fn vendor_qualified_reference() {
        let roots =
            build(r#"<actions><script if="acme:AcmeAV" path="x.py"/></actions>"#).unwrap();
        assert!(roots[0].condition().satisfied());
        let roots =
            build(r#"<actions><script if="other:AcmeAV" path="x.py"/></actions>"#).unwrap();
        assert_eq!(roots[0].condition().unresolved().len(), 1);
    }

    #[test]
    fn unresolved_reference_survives_build_for_validation() {
        let roots =
            build(r#"<actions><script if="NeverDetected" path="x.py"/></actions>"#).unwrap();
        let unresolved = roots[0].condition().unresolved();
        assert_eq!(unresolved.len(), 1);
        assert!(unresolved[0].contains("NeverDetected"));
        assert!(!roots[0].condition().satisfied());
    }

    #[test]
    fn multi_product_reference_needs_every_product() {
        let roots =
            build(r#"<actions><script if="AcmeAV, NeverDetected" path="x.py"/></actions>"#)
                .unwrap();
        assert_eq!(roots[0].condition().unresolved().len(), 1);
    }

    #[test]
    fn probe_reference_tracks_the_node_result() {
        let roots = build(r#"<actions><script if-probe="acme-key" path="x.py"/></actions>"#)
            .unwrap();
        assert!(roots[0].condition().satisfied());
        let roots = build(r#"<actions><script if-probe="acme-svc" path="x.py"/></actions>"#)
            .unwrap();
        assert!(roots[0].condition().unresolved().is_empty());
        assert!(!roots[0].condition().satisfied());
    }

    #[test]
    fn unknown_probe_reference_is_unresolved() {
        let roots = build(r#"<actions><script if-probe="no-such-id" path="x.py"/></actions>"#)
            .unwrap();
        assert_eq!(roots[0].condition().unresolved().len(), 1);
    }

    #[test]
    fn unconditional_node_is_satisfied() {
        let roots = build(r#"<actions><donot/></actions>"#).unwrap();
        assert!(roots[0].condition().satisfied());
    }

    #[test]
    fn labels_name_the_node_path() {
        let roots = build(
            r#"<actions>
                 <safetycheck check="quiet">
                   <script path="x.py"/>
                 </safetycheck>
               </actions>"#,
        )
        .unwrap();
        assert_eq!(roots[0].label(), "safetycheck[0]");
        assert_eq!(roots[0].children()[0].label(), "safetycheck[0]/script[0]");
    }
}
