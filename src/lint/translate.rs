//! Report to protocol diagnostic translation

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::lint::error::TranslationError;
use crate::lint::report::{Issue, IssueSeverity, ReportPosition, parse_report};
use crate::lint::root::{ProjectRoot, normalize_path};

#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    /// Carry the check name only in `source` instead of prefixing the message.
    no_linter_name: bool,
}

impl Translator {
    pub fn new(no_linter_name: bool) -> Self {
        Self { no_linter_name }
    }

    pub fn to_diagnostic(&self, issue: &Issue) -> Diagnostic {
        let start = to_position(issue.start);
        let end = issue.end.map(to_position).unwrap_or(start);

        let message = if self.no_linter_name {
            issue.message.clone()
        } else {
            format!("{}: {}", issue.check, issue.message)
        };

        Diagnostic::new(
            Range::new(start, end),
            Some(to_severity(issue.severity)),
            None,
            Some(issue.check.clone()),
            message,
            None,
            None,
        )
    }

    /// Splits one report into diagnostic sets for each requested file.
    ///
    /// Every requested file gets an entry, empty when it has no issues.
    /// Issues for files outside `files` are dropped. Report order is kept.
    pub fn demultiplex(
        &self,
        root: &ProjectRoot,
        issues: &[Issue],
        files: &[PathBuf],
    ) -> IndexMap<PathBuf, Vec<Diagnostic>> {
        let mut sets: IndexMap<PathBuf, Vec<Diagnostic>> = files
            .iter()
            .map(|file| (normalize_path(file), Vec::new()))
            .collect();

        for issue in issues {
            let path = resolve_issue_path(root, &issue.path);
            if let Some(diagnostics) = sets.get_mut(&path) {
                diagnostics.push(self.to_diagnostic(issue));
            }
        }

        sets
    }

    /// Parses raw tool output and demultiplexes it. Fails as a whole on a
    /// malformed report.
    pub fn translate(
        &self,
        root: &ProjectRoot,
        stdout: &[u8],
        files: &[PathBuf],
    ) -> Result<IndexMap<PathBuf, Vec<Diagnostic>>, TranslationError> {
        let issues = parse_report(stdout)?;
        Ok(self.demultiplex(root, &issues, files))
    }
}

fn resolve_issue_path(root: &ProjectRoot, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        root.join(path)
    }
}

fn to_position(pos: ReportPosition) -> Position {
    Position::new(pos.line.saturating_sub(1), pos.column.saturating_sub(1))
}

fn to_severity(severity: IssueSeverity) -> DiagnosticSeverity {
    match severity {
        IssueSeverity::Error => DiagnosticSeverity::ERROR,
        IssueSeverity::Warning => DiagnosticSeverity::WARNING,
        IssueSeverity::Information => DiagnosticSeverity::INFORMATION,
        IssueSeverity::Hint => DiagnosticSeverity::HINT,
    }
}
