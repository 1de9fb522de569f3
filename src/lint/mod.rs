//! Lint orchestration layer
//! - root.rs: project root resolution (nearest go.mod inside the workspace)
//! - invoker.rs: external lint process lifecycle
//! - report.rs: golangci-lint JSON report parsing
//! - translate.rs: issue to diagnostic mapping and per-file demultiplexing
//! - coordinator.rs: per-root serialization and supersession
//! - error.rs: error types

pub mod coordinator;
pub mod error;
pub mod invoker;
pub mod report;
pub mod root;
pub mod translate;

pub use coordinator::{DiagnosticPublisher, LintTicket, RequestCoordinator, RunOutcome};
pub use error::{InvocationError, LintError, ResolutionError, TranslationError};
pub use invoker::{CommandLinter, LintOutput, LintRun, Linter};
pub use root::{ProjectRoot, find_project_root};
pub use translate::Translator;
