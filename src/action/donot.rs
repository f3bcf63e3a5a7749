use super::{ActionFlow, HostAction};
use crate::diag::DiagSink;
use crate::document::ElementParams;
use crate::error::Result;
use crate::transport::HostTransport;

/// Intentional no-op. Records that the branch was deliberately skipped.
#[derive(Debug)]
pub struct DoNotAction {
    reason: Option<String>,
}

impl DoNotAction {
    pub fn from_params(params: &ElementParams) -> Result<Box<dyn HostAction>> {
        Ok(Box::new(Self {
            reason: params.optional("reason").map(str::to_string),
        }))
    }
}

impl HostAction for DoNotAction {
    fn kind(&self) -> &'static str {
        "donot"
    }

    fn describe(&self) -> String {
        "donot".to_string()
    }

    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    fn execute(&self, _transport: &dyn HostTransport, sink: &dyn DiagSink) -> ActionFlow {
        match &self.reason {
            Some(reason) => sink.info(&format!("branch intentionally skipped: {reason}")),
            None => sink.info("branch intentionally skipped"),
        }
        ActionFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{DiagLevel, RecordingSink};
    use crate::document::parse_document;
    use crate::transport::MockTransport;

    #[test]
    fn always_succeeds_and_continues() {
        let parsed =
            parse_document("test-actions.xml", r#"<donot reason="vendor is benign"/>"#).unwrap();
        let params = ElementParams::from_node("test-actions.xml", &parsed.root_element());
        let action = DoNotAction::from_params(&params).unwrap();
        assert!(action.validate().is_empty());

        let transport = MockTransport::new();
        let sink = RecordingSink::new();
        assert_eq!(action.execute(&transport, &sink), ActionFlow::Continue);
        assert!(transport.calls().is_empty());
        let infos = sink.at_level(DiagLevel::Info);
        assert_eq!(infos.len(), 1);
        assert!(infos[0].contains("vendor is benign"));
    }
}
