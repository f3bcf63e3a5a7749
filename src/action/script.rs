use super::{ActionFlow, HostAction};
use crate::diag::DiagSink;
use crate::document::ElementParams;
use crate::error::Result;
use crate::transport::HostTransport;

/// Run a remediation script on the host.
///
/// Script failure is logged but does not cancel sibling actions.
#[derive(Debug)]
pub struct ScriptAction {
    path: Option<String>,
    args: Vec<String>,
}

impl ScriptAction {
    pub fn from_params(params: &ElementParams) -> Result<Box<dyn HostAction>> {
        Ok(Box::new(Self {
            path: params.optional("path").map(str::to_string),
            args: params
                .optional("args")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }))
    }
}

impl HostAction for ScriptAction {
    fn kind(&self) -> &'static str {
        "script"
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("script {path}"),
            None => "script <missing path>".to_string(),
        }
    }

    fn validate(&self) -> Vec<String> {
        match self.path {
            Some(_) => Vec::new(),
            None => vec!["missing required parameter 'path'".to_string()],
        }
    }

    fn execute(&self, transport: &dyn HostTransport, sink: &dyn DiagSink) -> ActionFlow {
        let Some(path) = &self.path else {
            // unreachable behind a clean validate(); never run blind
            sink.critical("script action has no path, refusing to execute");
            return ActionFlow::Continue;
        };
        match transport.run_script(path, &self.args) {
            Ok(outcome) if outcome.success() => {
                sink.info(&format!("script {path} completed"));
            }
            Ok(outcome) => {
                sink.warning(&format!("script {path} exited {}", outcome.exit_code));
            }
            Err(e) => {
                sink.warning(&format!("script {path} failed to run: {e}"));
            }
        }
        ActionFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::RecordingSink;
    use crate::document::parse_document;
    use crate::transport::MockTransport;

    fn build(xml: &str) -> Box<dyn HostAction> {
        let parsed = parse_document("test-actions.xml", xml).unwrap();
        let params = ElementParams::from_node("test-actions.xml", &parsed.root_element());
        ScriptAction::from_params(&params).unwrap()
    }

    #[test]
    fn invokes_transport_with_split_args() {
        let action = build(r#"<script path="disable_av.py" args="--force --quiet"/>"#);
        let transport = MockTransport::new();
        let sink = RecordingSink::new();
        assert_eq!(action.execute(&transport, &sink), ActionFlow::Continue);
        assert_eq!(
            transport.script_invocations(),
            vec!["script:disable_av.py --force --quiet".to_string()]
        );
    }

    #[test]
    fn missing_path_fails_validation_not_build() {
        let action = build(r#"<script args="--force"/>"#);
        let failures = action.validate();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("'path'"));
    }
}
