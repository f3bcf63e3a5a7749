//! pspscan — host security-product detection and remediation engine.
//!
//! Identifies installed security/monitoring products (PSPs) by matching
//! per-vendor XML fingerprints against the host, then conditionally runs
//! remediation actions gated on what was found. Detection and remediation
//! are strictly separate phases; remediation trees are validated before
//! anything executes.
//!
//! # Quick Start
//!
//! ```no_run
//! use pspscan::config::FsStore;
//! use pspscan::transport::local::LocalHost;
//! use pspscan::{run_vendor, TracingSink};
//!
//! let store = FsStore::new("pspFPs");
//! let report = run_vendor("acme", &store, &LocalHost::new(), &TracingSink).unwrap();
//! println!("{} product(s) detected", report.products.len());
//! ```

pub mod action;
pub mod config;
pub mod detect;
pub mod diag;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod probe;
pub mod remediate;
pub mod transport;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use action::ActionRegistry;
use config::DescriptionStore;
use detect::PspManager;
use diag::DiagSink;
use error::{PspError, Result};
use fingerprint::build_fingerprint;
use probe::ProbeRegistry;
use remediate::manager::{ActionManager, RemediationRun};
use remediate::{build_actions, ValidationFailure};
use transport::HostTransport;

pub use detect::{DetectionOutcome, Product};
pub use diag::{DiagLevel, TracingSink};

/// How the detection phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// No fingerprint document for this vendor; nothing was probed.
    NoFingerprint,
    Completed,
}

/// How the remediation phase ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    /// No action document for this vendor.
    NotConfigured,
    /// The tree was rejected before anything executed. Detection results
    /// are still reported.
    ValidationFailed { failures: Vec<ValidationFailure> },
    Completed,
    /// A safety check reported unsafe; the rest of the tree was abandoned.
    Aborted,
}

/// Per-vendor outcome of one engine run.
#[derive(Debug, Serialize)]
pub struct VendorReport {
    pub run_id: Uuid,
    pub vendor: String,
    pub started_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub detection: DetectionStatus,
    pub remediation: RemediationStatus,
}

/// Run the two-phase engine for one vendor.
///
/// Absent fingerprint documents are a clean "no products" outcome. A
/// document that fails to build is an error after a critical diagnostic;
/// a remediation tree that fails validation keeps the detection results in
/// the report and executes nothing.
pub fn run_vendor(
    vendor: &str,
    store: &dyn DescriptionStore,
    transport: &dyn HostTransport,
    sink: &dyn DiagSink,
) -> Result<VendorReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let Some(fp_text) = store.fingerprint(vendor)? else {
        sink.debug(&format!("no fingerprint for vendor '{vendor}'"));
        return Ok(VendorReport {
            run_id,
            vendor: vendor.to_string(),
            started_at,
            products: Vec::new(),
            detection: DetectionStatus::NoFingerprint,
            remediation: RemediationStatus::NotConfigured,
        });
    };

    let fp_doc = format!("{vendor}-fp.xml");
    let roots = build_fingerprint(&fp_doc, &fp_text, &ProbeRegistry::builtin()).map_err(|e| {
        sink.critical(&format!("fingerprint for vendor '{vendor}' is not valid: {e}"));
        e
    })?;

    let mut psp_manager = PspManager::new();
    for root in roots {
        psp_manager.add_root(root);
    }
    if !psp_manager.is_valid() {
        sink.critical(&format!("fingerprint for vendor '{vendor}' declares no probes"));
        return Err(PspError::Structure {
            doc: fp_doc,
            node: "fingerprint".to_string(),
            message: "no probe nodes".to_string(),
        });
    }
    psp_manager.execute(transport, sink);
    let mut outcome = psp_manager.into_outcome();

    // Fingerprints may leave the vendor off their products; default it
    // here, as a visible post-processing step, not inside the manager.
    for product in &mut outcome.products {
        if product.vendor.is_none() {
            product.vendor = Some(vendor.to_string());
        }
    }
    sink.debug(&format!(
        "found {} product(s) for vendor '{vendor}'",
        outcome.products.len()
    ));

    let remediation = match store.actions(vendor)? {
        None => RemediationStatus::NotConfigured,
        Some(actions_text) => {
            let actions_doc = format!("{vendor}-actions.xml");
            let roots =
                build_actions(&actions_doc, &actions_text, &ActionRegistry::builtin(), &outcome)
                    .map_err(|e| {
                        sink.critical(&format!(
                            "action document for vendor '{vendor}' is not valid: {e}"
                        ));
                        e
                    })?;
            let action_manager = ActionManager::new(roots);
            let failures = action_manager.validate();
            if failures.is_empty() {
                sink.info(&format!("executing actions for vendor '{vendor}'"));
                match action_manager.execute(transport, sink) {
                    RemediationRun::Completed => RemediationStatus::Completed,
                    RemediationRun::Aborted => RemediationStatus::Aborted,
                }
            } else {
                let listing: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
                sink.critical(&format!(
                    "action document for vendor '{vendor}' failed validation: {}",
                    listing.join("; ")
                ));
                RemediationStatus::ValidationFailed { failures }
            }
        }
    };

    if outcome.products.is_empty() {
        sink.info(&format!("found 0 products for vendor '{vendor}'"));
    }

    Ok(VendorReport {
        run_id,
        vendor: vendor.to_string(),
        started_at,
        products: outcome.products,
        detection: DetectionStatus::Completed,
        remediation,
    })
}
