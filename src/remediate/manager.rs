//! Validate-then-execute protocol over remediation trees.

use serde::Serialize;

use super::{ConditionalNode, FailureKind, ValidationFailure};
use crate::action::ActionFlow;
use crate::diag::DiagSink;
use crate::transport::HostTransport;

/// How an execution pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationRun {
    Completed,
    /// A safety check reported unsafe; the rest of the tree was abandoned.
    Aborted,
}

/// Owns one vendor's remediation trees for the validate/execute passes.
pub struct ActionManager {
    roots: Vec<ConditionalNode>,
}

impl ActionManager {
    pub fn new(roots: Vec<ConditionalNode>) -> Self {
        Self { roots }
    }

    /// Walk every node without executing anything: condition references
    /// must resolve and action parameters must be complete. Empty result
    /// means the tree may be executed.
    pub fn validate(&self) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        for root in &self.roots {
            validate_node(root, &mut failures);
        }
        failures
    }

    /// Depth-first, left-to-right execution.
    ///
    /// Callable only after [`validate`](Self::validate) returned no
    /// failures; the tree is trusted for the duration of the call and never
    /// re-validated. An unsatisfied condition skips the node and its whole
    /// subtree. A safety abort cancels all remaining nodes of this vendor,
    /// at every level.
    pub fn execute(&self, transport: &dyn HostTransport, sink: &dyn DiagSink) -> RemediationRun {
        match walk(&self.roots, transport, sink) {
            ActionFlow::Continue => RemediationRun::Completed,
            ActionFlow::Abort => RemediationRun::Aborted,
        }
    }
}

fn validate_node(node: &ConditionalNode, failures: &mut Vec<ValidationFailure>) {
    for reason in node.condition.unresolved() {
        failures.push(ValidationFailure {
            node: node.label.clone(),
            kind: FailureKind::UnresolvedReference,
            reason,
        });
    }
    for reason in node.action.validate() {
        failures.push(ValidationFailure {
            node: node.label.clone(),
            kind: FailureKind::IncompleteParams,
            reason,
        });
    }
    for child in &node.children {
        validate_node(child, failures);
    }
}

fn walk(
    nodes: &[ConditionalNode],
    transport: &dyn HostTransport,
    sink: &dyn DiagSink,
) -> ActionFlow {
    for node in nodes {
        if !node.condition.satisfied() {
            sink.debug(&format!("{}: condition unsatisfied, skipping subtree", node.label));
            continue;
        }
        sink.debug(&format!("{}: running {}", node.label, node.action.describe()));
        match node.action.execute(transport, sink) {
            ActionFlow::Abort => return ActionFlow::Abort,
            ActionFlow::Continue => {
                if walk(&node.children, transport, sink) == ActionFlow::Abort {
                    return ActionFlow::Abort;
                }
            }
        }
    }
    ActionFlow::Continue
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::action::ActionRegistry;
    use crate::detect::{DetectionOutcome, Product};
    use crate::diag::RecordingSink;
    use crate::remediate::build_actions;
    use crate::transport::MockTransport;

    fn outcome() -> DetectionOutcome {
        DetectionOutcome {
            products: vec![Product {
                vendor: Some("acme".to_string()),
                name: "AcmeAV".to_string(),
                version: None,
                install_path: None,
            }],
            attributes: [("svc-running".to_string(), false)].into_iter().collect(),
        }
    }

    fn manager_for(text: &str) -> ActionManager {
        ActionManager::new(
            build_actions("test-actions.xml", text, &ActionRegistry::builtin(), &outcome())
                .unwrap(),
        )
    }

    #[test]
    fn valid_tree_has_no_failures() {
        let manager = manager_for(
            r#"<actions>
                 <safetycheck check="quiet">
                   <script if="AcmeAV" path="disable.py"/>
                 </safetycheck>
               </actions>"#,
        );
        assert!(manager.validate().is_empty());
    }

    #[test]
    fn validation_reports_each_failure_with_node_and_kind() {
        let manager = manager_for(
            r#"<actions>
                 <script if="NeverDetected" path="x.py"/>
                 <script if="AcmeAV"/>
               </actions>"#,
        );
        let failures = manager.validate();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].node, "script[0]");
        assert_eq!(failures[0].kind, FailureKind::UnresolvedReference);
        assert!(failures[0].reason.contains("NeverDetected"));
        assert_eq!(failures[1].node, "script[1]");
        assert_eq!(failures[1].kind, FailureKind::IncompleteParams);
    }

    #[test]
    fn validate_performs_no_side_effects() {
        let manager = manager_for(
            r#"<actions>
                 <safetycheck check="quiet">
                   <script if="AcmeAV" path="disable.py"/>
                 </safetycheck>
               </actions>"#,
        );
        let transport = MockTransport::new();
        for _ in 0..3 {
            manager.validate();
        }
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn unsatisfied_condition_skips_the_whole_subtree() {
        let manager = manager_for(
            r#"<actions>
                 <script if-probe="svc-running" path="stop_svc.py">
                   <script if="AcmeAV" path="cleanup.py"/>
                 </script>
                 <script if="AcmeAV" path="report.py"/>
               </actions>"#,
        );
        assert!(manager.validate().is_empty());
        let transport = MockTransport::new();
        let sink = RecordingSink::new();
        assert_eq!(manager.execute(&transport, &sink), RemediationRun::Completed);
        assert_eq!(
            transport.script_invocations(),
            vec!["script:report.py ".to_string()]
        );
    }

    #[test]
    fn abort_cancels_remaining_siblings_at_every_level() {
        let manager = manager_for(
            r#"<actions>
                 <script if="AcmeAV" path="first.py">
                   <safetycheck check="unsafe-here"/>
                   <script path="never_inner.py"/>
                 </script>
                 <script path="never_outer.py"/>
               </actions>"#,
        );
        assert!(manager.validate().is_empty());
        let transport = MockTransport::new().with_unsafe("unsafe-here");
        let sink = RecordingSink::new();
        assert_eq!(manager.execute(&transport, &sink), RemediationRun::Aborted);
        assert_eq!(
            transport.script_invocations(),
            vec!["script:first.py ".to_string()]
        );
    }

    #[test]
    fn script_failure_does_not_cancel_siblings() {
        let manager = manager_for(
            r#"<actions>
                 <script path="broken.py"/>
                 <script path="next.py"/>
               </actions>"#,
        );
        let transport = MockTransport::new().with_failing_script("broken.py");
        let sink = RecordingSink::new();
        assert_eq!(manager.execute(&transport, &sink), RemediationRun::Completed);
        assert_eq!(transport.script_invocations().len(), 2);
    }
}
