use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use golangci_lint_lsp::config::{DEFAULT_ISSUES_EXIT_CODE, DEFAULT_MARKER, LintSettings, default_command};
use golangci_lint_lsp::lsp::server::run_server;

/// Language server publishing golangci-lint issues as diagnostics.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long)]
    debug: bool,

    /// Carry the linter name only in the diagnostic source, not the message
    #[arg(long = "nolintername")]
    no_linter_name: bool,

    /// Workspace boundary; defaults to the client's root URI
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Exit status the lint command uses for "issues found"
    #[arg(long, default_value_t = DEFAULT_ISSUES_EXIT_CODE)]
    issues_exit_code: i32,

    /// File marking a project root
    #[arg(long, default_value = DEFAULT_MARKER)]
    marker: String,

    /// Kill a lint run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Lint command and arguments, e.g. `-- golangci-lint run --output.json.path stdout`
    #[arg(last = true)]
    command: Vec<String>,
}

impl From<Cli> for LintSettings {
    fn from(cli: Cli) -> Self {
        Self {
            command: if cli.command.is_empty() {
                default_command()
            } else {
                cli.command
            },
            issues_exit_code: cli.issues_exit_code,
            marker: cli.marker,
            no_linter_name: cli.no_linter_name,
            workspace_root: cli.workspace_root,
            timeout: cli.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let debug = cli.debug;
    run_server(cli.into(), debug).await
}
