use crate::{DetectionStatus, RemediationStatus, VendorReport};

/// Render a vendor report as plain console output.
pub fn render(report: &VendorReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n  Vendor: {}\n", report.vendor));

    if report.detection == DetectionStatus::NoFingerprint {
        output.push_str("  No fingerprint configured for this vendor.\n\n");
        return output;
    }

    if report.products.is_empty() {
        output.push_str("  No products detected.\n");
    } else {
        output.push_str(&format!("  {} product(s) detected:\n", report.products.len()));
        for product in &report.products {
            output.push_str(&format!("    {product}"));
            if let Some(path) = &product.install_path {
                output.push_str(&format!(" at {path}"));
            }
            output.push('\n');
        }
    }

    match &report.remediation {
        RemediationStatus::NotConfigured => {
            output.push_str("  Remediation: not configured\n");
        }
        RemediationStatus::Completed => {
            output.push_str("  Remediation: completed\n");
        }
        RemediationStatus::Aborted => {
            output.push_str("  Remediation: ABORTED by safety check\n");
        }
        RemediationStatus::ValidationFailed { failures } => {
            output.push_str(&format!(
                "  Remediation: NOT RUN, {} validation failure(s):\n",
                failures.len()
            ));
            for failure in failures {
                output.push_str(&format!("    {failure}\n"));
            }
        }
    }

    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Product;

    fn report(products: Vec<Product>, remediation: RemediationStatus) -> VendorReport {
        VendorReport {
            run_id: uuid::Uuid::nil(),
            vendor: "acme".to_string(),
            started_at: chrono::Utc::now(),
            products,
            detection: DetectionStatus::Completed,
            remediation,
        }
    }

    #[test]
    fn lists_products_and_remediation() {
        let rendered = render(&report(
            vec![Product {
                vendor: Some("acme".to_string()),
                name: "AcmeAV".to_string(),
                version: Some("9.1".to_string()),
                install_path: Some("C:\\Program Files\\AcmeAV".to_string()),
            }],
            RemediationStatus::Completed,
        ));
        assert!(rendered.contains("1 product(s) detected"));
        assert!(rendered.contains("AcmeAV 9.1 (acme) at C:\\Program Files\\AcmeAV"));
        assert!(rendered.contains("Remediation: completed"));
    }

    #[test]
    fn empty_detection_reads_cleanly() {
        let rendered = render(&report(vec![], RemediationStatus::NotConfigured));
        assert!(rendered.contains("No products detected"));
    }
}
