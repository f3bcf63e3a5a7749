//! Host transport seam.
//!
//! Probes and actions never touch the host directly; they go through a
//! [`HostTransport`] supplied by the caller. [`local::LocalHost`] probes the
//! machine the binary runs on; tests use a scripted mock.

pub mod local;

use thiserror::Error;

/// A leaf-operation failure on the transport side. Detection treats these
/// as "condition unsatisfied", never as fatal errors.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not supported on this host: {0}")]
    Unsupported(String),

    #[error("transport failure: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Outcome of a script execution on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub exit_code: i32,
}

impl ScriptOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Verdict of a host-side safety predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Unsafe { reason: String },
}

/// Blocking leaf operations against the live host.
pub trait HostTransport {
    /// True if the registry key exists.
    fn registry_key_exists(&self, hive: &str, key: &str) -> TransportResult<bool>;

    /// Data of a named registry value, or `None` if the key or value is absent.
    fn registry_value(&self, hive: &str, key: &str, value: &str)
        -> TransportResult<Option<String>>;

    /// Entry names of a directory, or `None` if the directory does not exist.
    fn list_directory(&self, path: &str) -> TransportResult<Option<Vec<String>>>;

    /// Run a remediation script to completion.
    fn run_script(&self, path: &str, args: &[String]) -> TransportResult<ScriptOutcome>;

    /// Evaluate a host-side safety predicate.
    fn check_safety(&self, predicate: &str) -> TransportResult<SafetyVerdict>;
}

/// Scripted transport for tests. Every invocation is recorded so tests can
/// assert on exactly which leaf operations ran.
#[cfg(test)]
pub struct MockTransport {
    keys: std::collections::HashSet<String>,
    values: std::collections::HashMap<String, String>,
    dirs: std::collections::HashMap<String, Vec<String>>,
    unsafe_predicates: std::collections::HashSet<String>,
    failing_predicates: std::collections::HashSet<String>,
    failing_keys: std::collections::HashSet<String>,
    failing_scripts: std::collections::HashSet<String>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            keys: Default::default(),
            values: Default::default(),
            dirs: Default::default(),
            unsafe_predicates: Default::default(),
            failing_predicates: Default::default(),
            failing_keys: Default::default(),
            failing_scripts: Default::default(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_key(mut self, hive: &str, key: &str) -> Self {
        self.keys.insert(format!("{hive}\\{key}"));
        self
    }

    pub fn with_value(mut self, hive: &str, key: &str, value: &str, data: &str) -> Self {
        self.keys.insert(format!("{hive}\\{key}"));
        self.values
            .insert(format!("{hive}\\{key}\\{value}"), data.to_string());
        self
    }

    pub fn with_dir(mut self, path: &str, entries: &[&str]) -> Self {
        self.dirs
            .insert(path.to_string(), entries.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn with_unsafe(mut self, predicate: &str) -> Self {
        self.unsafe_predicates.insert(predicate.to_string());
        self
    }

    pub fn with_failing_predicate(mut self, predicate: &str) -> Self {
        self.failing_predicates.insert(predicate.to_string());
        self
    }

    pub fn with_failing_key(mut self, hive: &str, key: &str) -> Self {
        self.failing_keys.insert(format!("{hive}\\{key}"));
        self
    }

    pub fn with_failing_script(mut self, path: &str) -> Self {
        self.failing_scripts.insert(path.to_string());
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn script_invocations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("script:"))
            .collect()
    }
}

#[cfg(test)]
impl HostTransport for MockTransport {
    fn registry_key_exists(&self, hive: &str, key: &str) -> TransportResult<bool> {
        let path = format!("{hive}\\{key}");
        self.record(format!("regkey:{path}"));
        if self.failing_keys.contains(&path) {
            return Err(TransportError::PermissionDenied(path));
        }
        Ok(self.keys.contains(&path))
    }

    fn registry_value(
        &self,
        hive: &str,
        key: &str,
        value: &str,
    ) -> TransportResult<Option<String>> {
        let path = format!("{hive}\\{key}");
        self.record(format!("regvalue:{path}\\{value}"));
        if self.failing_keys.contains(&path) {
            return Err(TransportError::PermissionDenied(path));
        }
        Ok(self.values.get(&format!("{path}\\{value}")).cloned())
    }

    fn list_directory(&self, path: &str) -> TransportResult<Option<Vec<String>>> {
        self.record(format!("dir:{path}"));
        Ok(self.dirs.get(path).cloned())
    }

    fn run_script(&self, path: &str, args: &[String]) -> TransportResult<ScriptOutcome> {
        self.record(format!("script:{path} {}", args.join(" ")));
        let exit_code = if self.failing_scripts.contains(path) { 1 } else { 0 };
        Ok(ScriptOutcome { exit_code })
    }

    fn check_safety(&self, predicate: &str) -> TransportResult<SafetyVerdict> {
        self.record(format!("safety:{predicate}"));
        if self.failing_predicates.contains(predicate) {
            return Err(TransportError::Failed(predicate.to_string()));
        }
        if self.unsafe_predicates.contains(predicate) {
            return Ok(SafetyVerdict::Unsafe {
                reason: format!("predicate '{predicate}' reported unsafe"),
            });
        }
        Ok(SafetyVerdict::Safe)
    }
}
