use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PspError, Result};

/// Top-level configuration from `pspscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `{vendor}-fp.xml` / `{vendor}-actions.xml`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("pspFPs")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# pspscan configuration

# Directory holding per-vendor description files:
#   {vendor}-fp.xml       fingerprint (detection probes)
#   {vendor}-actions.xml  conditional remediation actions
data_dir = "pspFPs"
"#
    }
}

/// Locates and loads per-vendor description documents. `Ok(None)` means the
/// document does not exist, which is not an error.
pub trait DescriptionStore {
    fn fingerprint(&self, vendor: &str) -> Result<Option<String>>;
    fn actions(&self, vendor: &str) -> Result<Option<String>>;
}

/// Filesystem-backed store following the `{vendor}-fp.xml` /
/// `{vendor}-actions.xml` convention.
pub struct FsStore {
    data_dir: PathBuf,
}

impl FsStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn fingerprint_path(&self, vendor: &str) -> PathBuf {
        self.data_dir.join(format!("{vendor}-fp.xml"))
    }

    pub fn actions_path(&self, vendor: &str) -> PathBuf {
        self.data_dir.join(format!("{vendor}-actions.xml"))
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// Vendor names become file names; anything else smells like traversal.
fn check_vendor(vendor: &str) -> Result<()> {
    let ok = !vendor.is_empty()
        && vendor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PspError::Config(format!("invalid vendor name '{vendor}'")))
    }
}

impl DescriptionStore for FsStore {
    fn fingerprint(&self, vendor: &str) -> Result<Option<String>> {
        check_vendor(vendor)?;
        self.read(&self.fingerprint_path(vendor))
    }

    fn actions(&self, vendor: &str) -> Result<Option<String>> {
        check_vendor(vendor)?;
        self.read(&self.actions_path(vendor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_default_when_absent() {
        let config = Config::load(Path::new("/definitely/not/here/pspscan.toml")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("pspFPs"));
    }

    #[test]
    fn load_reads_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pspscan.toml");
        std::fs::write(&path, "data_dir = \"/srv/fps\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/fps"));
    }

    #[test]
    fn starter_toml_round_trips() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("pspFPs"));
    }

    #[test]
    fn store_reads_by_convention() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("acme-fp.xml"), "<fingerprint/>").unwrap();
        let store = FsStore::new(dir.path());
        assert_eq!(
            store.fingerprint("acme").unwrap(),
            Some("<fingerprint/>".to_string())
        );
        assert_eq!(store.actions("acme").unwrap(), None);
    }

    #[test]
    fn store_rejects_path_like_vendor_names() {
        let store = FsStore::new("pspFPs");
        assert!(store.fingerprint("../etc/passwd").is_err());
        assert!(store.fingerprint("").is_err());
    }
}
