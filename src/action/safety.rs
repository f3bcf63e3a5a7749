use super::{ActionFlow, HostAction};
use crate::diag::DiagSink;
use crate::document::ElementParams;
use crate::error::Result;
use crate::transport::{HostTransport, SafetyVerdict};

/// Evaluate a host-side safety predicate.
///
/// An unsafe verdict aborts the rest of the vendor's remediation tree. A
/// predicate that cannot be evaluated is treated as unsafe: the check
/// exists to stop dangerous actions, and no answer is not permission.
#[derive(Debug)]
pub struct SafetyCheckAction {
    predicate: Option<String>,
}

impl SafetyCheckAction {
    pub fn from_params(params: &ElementParams) -> Result<Box<dyn HostAction>> {
        Ok(Box::new(Self {
            predicate: params.optional("check").map(str::to_string),
        }))
    }
}

impl HostAction for SafetyCheckAction {
    fn kind(&self) -> &'static str {
        "safetycheck"
    }

    fn describe(&self) -> String {
        match &self.predicate {
            Some(predicate) => format!("safetycheck '{predicate}'"),
            None => "safetycheck <missing check>".to_string(),
        }
    }

    fn validate(&self) -> Vec<String> {
        match self.predicate {
            Some(_) => Vec::new(),
            None => vec!["missing required parameter 'check'".to_string()],
        }
    }

    fn execute(&self, transport: &dyn HostTransport, sink: &dyn DiagSink) -> ActionFlow {
        let Some(predicate) = &self.predicate else {
            sink.critical("safety check has no predicate, treating as unsafe");
            return ActionFlow::Abort;
        };
        match transport.check_safety(predicate) {
            Ok(SafetyVerdict::Safe) => {
                sink.debug(&format!("safety check '{predicate}' passed"));
                ActionFlow::Continue
            }
            Ok(SafetyVerdict::Unsafe { reason }) => {
                sink.critical(&format!(
                    "safety check '{predicate}' reported unsafe ({reason}), abandoning remaining actions"
                ));
                ActionFlow::Abort
            }
            Err(e) => {
                sink.critical(&format!(
                    "safety check '{predicate}' could not be evaluated ({e}), abandoning remaining actions"
                ));
                ActionFlow::Abort
            }
        }
    }
}
