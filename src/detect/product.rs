use serde::{Deserialize, Serialize};

use crate::fingerprint::ProductIdentity;

/// A detected security/monitoring product.
///
/// Produced once per satisfied detection terminal, immutable afterwards.
/// `vendor` is `None` when the fingerprint did not declare one; the
/// orchestrator defaults it to the vendor being scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub vendor: Option<String>,
    pub name: String,
    pub version: Option<String>,
    pub install_path: Option<String>,
}

impl Product {
    pub(crate) fn from_identity(identity: &ProductIdentity) -> Self {
        Self {
            vendor: identity.vendor.clone(),
            name: identity.name.clone(),
            version: identity.version.clone(),
            install_path: identity.install_path.clone(),
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, " {version}")?;
        }
        if let Some(vendor) = &self.vendor {
            write!(f, " ({vendor})")?;
        }
        Ok(())
    }
}
