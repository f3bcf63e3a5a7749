//! Shared plumbing for the two XML description grammars.
//!
//! Fingerprint and action documents have the same element shape: a tag
//! naming a probe/action kind, parameters as attributes, nested children.
//! Kind constructors receive an [`ElementParams`] so they can validate their
//! own parameters at build time.

use std::collections::BTreeMap;

use crate::error::{PspError, Result};

/// One description element: tag name plus its attributes, with the document
/// label carried along for error messages.
#[derive(Debug, Clone)]
pub struct ElementParams {
    doc: String,
    tag: String,
    attrs: BTreeMap<String, String>,
}

impl ElementParams {
    pub fn from_node(doc: &str, node: &roxmltree::Node) -> Self {
        let attrs = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        Self {
            doc: doc.to_string(),
            tag: node.tag_name().name().to_string(),
            attrs,
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn optional(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn required(&self, name: &str) -> Result<&str> {
        self.optional(name).ok_or_else(|| PspError::Structure {
            doc: self.doc.clone(),
            node: self.tag.clone(),
            message: format!("missing required parameter '{name}'"),
        })
    }

    /// A structural error anchored at this element.
    pub fn structure_error(&self, message: impl Into<String>) -> PspError {
        PspError::Structure {
            doc: self.doc.clone(),
            node: self.tag.clone(),
            message: message.into(),
        }
    }
}

/// Parse a description document, mapping parser errors into the engine's
/// error taxonomy.
pub fn parse_document<'a>(doc: &str, text: &'a str) -> Result<roxmltree::Document<'a>> {
    roxmltree::Document::parse(text).map_err(|source| PspError::Xml {
        doc: doc.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_the_missing_parameter() {
        let text = r#"<fingerprint><regkey hive="HKLM"/></fingerprint>"#;
        let parsed = parse_document("test-fp.xml", text).unwrap();
        let node = parsed
            .root_element()
            .children()
            .find(|n| n.is_element())
            .unwrap();
        let params = ElementParams::from_node("test-fp.xml", &node);
        assert_eq!(params.required("hive").unwrap(), "HKLM");
        let err = params.required("key").unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'key'"));
        assert!(err.to_string().contains("test-fp.xml"));
    }

    #[test]
    fn bad_xml_is_a_parse_error() {
        let err = parse_document("broken-fp.xml", "<fingerprint><regkey</fingerprint>").unwrap_err();
        assert!(matches!(err, PspError::Xml { .. }));
    }
}
