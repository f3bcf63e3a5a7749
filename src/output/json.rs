use crate::error::Result;
use crate::VendorReport;

/// Render a vendor report as a JSON document.
pub fn render(report: &VendorReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}
