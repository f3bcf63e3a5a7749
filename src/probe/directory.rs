use glob::{MatchOptions, Pattern};

use super::HostProbe;
use crate::document::ElementParams;
use crate::error::Result;
use crate::transport::{HostTransport, TransportResult};

// Windows filenames compare case-insensitively.
const ENTRY_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Directory-listing probe.
///
/// Satisfied when the directory exists; when `entry` is given, some entry
/// of the listing must match it (glob syntax).
#[derive(Debug)]
pub struct DirectoryProbe {
    path: String,
    entry: Option<Pattern>,
}

impl DirectoryProbe {
    pub fn from_params(params: &ElementParams) -> Result<Box<dyn HostProbe>> {
        let path = params.required("path")?.to_string();
        let entry = match params.optional("entry") {
            Some(raw) => Some(Pattern::new(raw).map_err(|e| {
                params.structure_error(format!("invalid entry pattern '{raw}': {e}"))
            })?),
            None => None,
        };
        Ok(Box::new(Self { path, entry }))
    }
}

impl HostProbe for DirectoryProbe {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn describe(&self) -> String {
        match &self.entry {
            Some(entry) => format!("directory {} entry '{}'", self.path, entry.as_str()),
            None => format!("directory {}", self.path),
        }
    }

    fn evaluate(&self, transport: &dyn HostTransport) -> TransportResult<bool> {
        let Some(entries) = transport.list_directory(&self.path)? else {
            return Ok(false);
        };
        Ok(match &self.entry {
            Some(pattern) => entries
                .iter()
                .any(|name| pattern.matches_with(name, ENTRY_MATCH)),
            None => true,
        })
    }
}
