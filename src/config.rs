use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Project marker searched for when resolving a project root.
pub const DEFAULT_MARKER: &str = "go.mod";

/// Exit status golangci-lint uses to report that issues were found.
pub const DEFAULT_ISSUES_EXIT_CODE: i32 = 1;

/// Default golangci-lint invocation producing a JSON report on stdout.
pub fn default_command() -> Vec<String> {
    [
        "golangci-lint",
        "run",
        "--output.json.path",
        "stdout",
        "--issues-exit-code=1",
        "--show-stats=false",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Settings for lint orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSettings {
    pub command: Vec<String>,
    pub issues_exit_code: i32,
    pub marker: String,
    /// When set, the check name is only carried in `source`.
    pub no_linter_name: bool,
    pub workspace_root: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            issues_exit_code: DEFAULT_ISSUES_EXIT_CODE,
            marker: DEFAULT_MARKER.to_string(),
            no_linter_name: false,
            workspace_root: None,
            timeout: None,
        }
    }
}

/// `initializationOptions` sent by the client. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationOptions {
    pub command: Option<Vec<String>>,
    pub no_linter_name: Option<bool>,
    pub workspace_root: Option<PathBuf>,
    pub issues_exit_code: Option<i32>,
    pub timeout_secs: Option<u64>,
}

impl LintSettings {
    /// Overlays client-provided options; they win over CLI flags.
    pub fn merge(mut self, options: InitializationOptions) -> Self {
        if let Some(command) = options.command.filter(|c| !c.is_empty()) {
            self.command = command;
        }
        if let Some(no_linter_name) = options.no_linter_name {
            self.no_linter_name = no_linter_name;
        }
        if let Some(root) = options.workspace_root {
            self.workspace_root = Some(root);
        }
        if let Some(code) = options.issues_exit_code {
            self.issues_exit_code = code;
        }
        if let Some(secs) = options.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        self
    }
}

/// Returns the path to the data directory for golangci-lint-lsp.
/// Uses $XDG_DATA_HOME/golangci-lint-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/golangci-lint-lsp,
/// or ./golangci-lint-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

pub const LOG_FILE_NAME: &str = "golangci-lint-lsp.log";

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("golangci-lint-lsp")
}
