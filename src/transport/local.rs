//! Transport implementation for the machine the binary runs on.
//!
//! Registry queries shell out to the platform `reg` utility; directory
//! listings use `std::fs`; scripts and safety predicates run as child
//! processes. Hosts without a registry report the probe as unsupported,
//! which detection downgrades to "condition unsatisfied".

use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{HostTransport, SafetyVerdict, ScriptOutcome, TransportError, TransportResult};

/// `reg query` value line: name, type, data.
static REG_VALUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S+)\s+(REG_[A-Z_]+)\s+(.*?)\s*$").unwrap());

pub struct LocalHost;

impl LocalHost {
    pub fn new() -> Self {
        Self
    }

    fn reg_query(&self, args: &[&str]) -> TransportResult<Option<String>> {
        let output = Command::new("reg").arg("query").args(args).output();
        match output {
            Ok(out) if out.status.success() => {
                Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()))
            }
            // reg.exe exits nonzero when the key or value is absent
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TransportError::Unsupported(
                "reg utility not available on this host".to_string(),
            )),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTransport for LocalHost {
    fn registry_key_exists(&self, hive: &str, key: &str) -> TransportResult<bool> {
        let path = format!("{hive}\\{key}");
        Ok(self.reg_query(&[path.as_str()])?.is_some())
    }

    fn registry_value(
        &self,
        hive: &str,
        key: &str,
        value: &str,
    ) -> TransportResult<Option<String>> {
        let path = format!("{hive}\\{key}");
        let Some(stdout) = self.reg_query(&[path.as_str(), "/v", value])? else {
            return Ok(None);
        };
        for line in stdout.lines() {
            if let Some(caps) = REG_VALUE_LINE.captures(line) {
                if caps[1].eq_ignore_ascii_case(value) {
                    return Ok(Some(caps[3].to_string()));
                }
            }
        }
        Ok(None)
    }

    fn list_directory(&self, path: &str) -> TransportResult<Option<Vec<String>>> {
        match std::fs::read_dir(path) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                Ok(Some(names))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(TransportError::PermissionDenied(path.to_string()))
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn run_script(&self, path: &str, args: &[String]) -> TransportResult<ScriptOutcome> {
        let status = Command::new(path).args(args).status()?;
        Ok(ScriptOutcome {
            exit_code: status.code().unwrap_or(-1),
        })
    }

    /// The predicate is a command line; exit 0 means safe.
    fn check_safety(&self, predicate: &str) -> TransportResult<SafetyVerdict> {
        let mut parts = predicate.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(TransportError::Failed("empty safety predicate".to_string()));
        };
        let status = Command::new(program).args(parts).status()?;
        if status.success() {
            Ok(SafetyVerdict::Safe)
        } else {
            Ok(SafetyVerdict::Unsafe {
                reason: format!("predicate '{predicate}' exited {}", status.code().unwrap_or(-1)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reg_value_line() {
        let caps = REG_VALUE_LINE
            .captures("    DisplayVersion    REG_SZ    9.1.0")
            .unwrap();
        assert_eq!(&caps[1], "DisplayVersion");
        assert_eq!(&caps[2], "REG_SZ");
        assert_eq!(&caps[3], "9.1.0");
    }

    #[test]
    fn missing_directory_is_none() {
        let t = LocalHost::new();
        let listed = t.list_directory("/definitely/not/a/real/path").unwrap();
        assert!(listed.is_none());
    }

    #[test]
    fn lists_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("acmeav.exe"), b"x").unwrap();
        let t = LocalHost::new();
        let listed = t
            .list_directory(dir.path().to_str().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(listed, vec!["acmeav.exe".to_string()]);
    }
}
