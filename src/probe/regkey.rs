use regex::Regex;

use super::HostProbe;
use crate::document::ElementParams;
use crate::error::Result;
use crate::transport::{HostTransport, TransportResult};

const KNOWN_HIVES: &[&str] = &["HKLM", "HKCU", "HKCR", "HKU", "HKCC"];

/// Registry-key probe.
///
/// Satisfied when the key exists; when `value` is given, the named value
/// must also exist and its data must match `pattern` if one is supplied.
#[derive(Debug)]
pub struct RegKeyProbe {
    hive: String,
    key: String,
    value: Option<String>,
    pattern: Option<Regex>,
}

impl RegKeyProbe {
    pub fn from_params(params: &ElementParams) -> Result<Box<dyn HostProbe>> {
        let hive = params.required("hive")?.to_uppercase();
        if !KNOWN_HIVES.contains(&hive.as_str()) {
            return Err(params.structure_error(format!(
                "unknown hive '{hive}' (expected one of {})",
                KNOWN_HIVES.join(", ")
            )));
        }
        let key = params.required("key")?.to_string();
        let value = params.optional("value").map(str::to_string);
        let pattern = match params.optional("pattern") {
            Some(raw) => {
                if value.is_none() {
                    return Err(
                        params.structure_error("'pattern' requires a 'value' to match against")
                    );
                }
                Some(Regex::new(raw).map_err(|e| {
                    params.structure_error(format!("invalid value pattern '{raw}': {e}"))
                })?)
            }
            None => None,
        };
        Ok(Box::new(Self {
            hive,
            key,
            value,
            pattern,
        }))
    }
}

impl HostProbe for RegKeyProbe {
    fn kind(&self) -> &'static str {
        "regkey"
    }

    fn describe(&self) -> String {
        match &self.value {
            Some(value) => format!("regkey {}\\{} value '{value}'", self.hive, self.key),
            None => format!("regkey {}\\{}", self.hive, self.key),
        }
    }

    fn evaluate(&self, transport: &dyn HostTransport) -> TransportResult<bool> {
        match &self.value {
            None => transport.registry_key_exists(&self.hive, &self.key),
            Some(value) => {
                let Some(data) = transport.registry_value(&self.hive, &self.key, value)? else {
                    return Ok(false);
                };
                Ok(match &self.pattern {
                    Some(pattern) => pattern.is_match(&data),
                    None => true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::transport::MockTransport;

    fn build(xml: &str) -> Result<Box<dyn HostProbe>> {
        let parsed = parse_document("test-fp.xml", xml).unwrap();
        let params = ElementParams::from_node("test-fp.xml", &parsed.root_element());
        RegKeyProbe::from_params(&params)
    }

    #[test]
    fn key_presence_probe() {
        let probe = build(r#"<regkey hive="HKLM" key="SOFTWARE\AcmeAV"/>"#).unwrap();
        let present = MockTransport::new().with_key("HKLM", "SOFTWARE\\AcmeAV");
        let absent = MockTransport::new();
        assert!(probe.evaluate(&present).unwrap());
        assert!(!probe.evaluate(&absent).unwrap());
    }

    #[test]
    fn value_pattern_must_match() {
        let probe = build(
            r#"<regkey hive="HKLM" key="SOFTWARE\AcmeAV" value="Version" pattern="^9\."/>"#,
        )
        .unwrap();
        let v9 = MockTransport::new().with_value("HKLM", "SOFTWARE\\AcmeAV", "Version", "9.1.0");
        let v8 = MockTransport::new().with_value("HKLM", "SOFTWARE\\AcmeAV", "Version", "8.0.2");
        assert!(probe.evaluate(&v9).unwrap());
        assert!(!probe.evaluate(&v8).unwrap());
    }

    #[test]
    fn missing_value_is_unsatisfied_not_error() {
        let probe =
            build(r#"<regkey hive="HKLM" key="SOFTWARE\AcmeAV" value="Version"/>"#).unwrap();
        let key_only = MockTransport::new().with_key("HKLM", "SOFTWARE\\AcmeAV");
        assert!(!probe.evaluate(&key_only).unwrap());
    }

    #[test]
    fn rejects_unknown_hive() {
        let err = build(r#"<regkey hive="HKEY_BOGUS" key="SOFTWARE\X"/>"#).unwrap_err();
        assert!(err.to_string().contains("unknown hive"));
    }

    #[test]
    fn rejects_pattern_without_value() {
        let err = build(r#"<regkey hive="HKLM" key="SOFTWARE\X" pattern="^9"/>"#).unwrap_err();
        assert!(err.to_string().contains("requires a 'value'"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err =
            build(r#"<regkey hive="HKLM" key="SOFTWARE\X" value="V" pattern="["/>"#).unwrap_err();
        assert!(err.to_string().contains("invalid value pattern"));
    }
}
