//! golangci-lint JSON report parsing

use std::path::PathBuf;

use serde::Deserialize;

use crate::lint::error::TranslationError;

/// 1-based line/column as reported by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl IssueSeverity {
    /// Unknown or empty classifications fall back to `Warning`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" | "err" => Self::Error,
            "info" | "information" => Self::Information,
            "hint" => Self::Hint,
            _ => Self::Warning,
        }
    }
}

/// One finding from the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// As reported: relative to the project root, or absolute.
    pub path: PathBuf,
    pub start: ReportPosition,
    pub end: Option<ReportPosition>,
    pub severity: IssueSeverity,
    pub check: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawReport {
    #[serde(default)]
    issues: Option<Vec<RawIssue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawIssue {
    from_linter: String,
    text: String,
    #[serde(default)]
    severity: String,
    pos: RawPosition,
    #[serde(default)]
    line_range: Option<RawLineRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPosition {
    filename: String,
    line: u32,
    #[serde(default)]
    column: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLineRange {
    from: u32,
    to: u32,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        let start = ReportPosition {
            line: raw.pos.line,
            column: raw.pos.column,
        };
        // A multi-line range ends at the start of the line after `To`.
        let end = raw
            .line_range
            .filter(|range| range.to > range.from && range.to >= start.line)
            .map(|range| ReportPosition {
                line: range.to + 1,
                column: 1,
            });

        Self {
            path: PathBuf::from(raw.pos.filename),
            start,
            end,
            severity: IssueSeverity::parse(&raw.severity),
            check: raw.from_linter,
            message: raw.text,
        }
    }
}

/// Parses a whole report; any malformed entry fails the entire report.
pub fn parse_report(stdout: &[u8]) -> Result<Vec<Issue>, TranslationError> {
    let report: RawReport = serde_json::from_slice(stdout)?;
    Ok(report
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(Issue::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_issue_fields() {
        let report = br#"{
            "Issues": [
                {
                    "FromLinter": "unused",
                    "Text": "var foo is unused",
                    "Severity": "",
                    "SourceLines": ["var foo = 1"],
                    "Pos": {"Filename": "main.go", "Offset": 30, "Line": 4, "Column": 5},
                    "ExpectNoLint": false
                }
            ],
            "Report": {"Linters": []}
        }"#;

        let issues = parse_report(report).unwrap();

        assert_eq!(
            issues,
            vec![Issue {
                path: PathBuf::from("main.go"),
                start: ReportPosition { line: 4, column: 5 },
                end: None,
                severity: IssueSeverity::Warning,
                check: "unused".to_string(),
                message: "var foo is unused".to_string(),
            }]
        );
    }

    #[test]
    fn multi_line_range_sets_end_position() {
        let report = br#"{"Issues": [{
            "FromLinter": "funlen",
            "Text": "too long",
            "Pos": {"Filename": "a.go", "Line": 3, "Column": 1},
            "LineRange": {"From": 3, "To": 7}
        }]}"#;

        let issues = parse_report(report).unwrap();

        assert_eq!(issues[0].end, Some(ReportPosition { line: 8, column: 1 }));
    }

    #[test]
    fn single_line_range_is_a_point() {
        let report = br#"{"Issues": [{
            "FromLinter": "wsl",
            "Text": "msg",
            "Pos": {"Filename": "a.go", "Line": 9, "Column": 1},
            "LineRange": {"From": 9, "To": 9}
        }]}"#;

        let issues = parse_report(report).unwrap();

        assert_eq!(issues[0].end, None);
    }

    #[rstest]
    #[case(br#"{"Issues": null}"#.as_slice())]
    #[case(br#"{"Issues": []}"#.as_slice())]
    #[case(br#"{"Report": {}}"#.as_slice())]
    fn empty_reports_have_no_issues(#[case] report: &[u8]) {
        assert!(parse_report(report).unwrap().is_empty());
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"level=error msg=\"typechecking error\"".as_slice())]
    #[case(br#"{"Issues": [{"FromLinter": "unused", "Text": "x"}]}"#.as_slice())]
    #[case(br#"{"Issues": {"FromLinter": "unused"}}"#.as_slice())]
    fn malformed_reports_fail(#[case] report: &[u8]) {
        assert!(matches!(
            parse_report(report),
            Err(TranslationError::MalformedReport(_))
        ));
    }

    #[rstest]
    #[case("", IssueSeverity::Warning)]
    #[case("warning", IssueSeverity::Warning)]
    #[case("WARN", IssueSeverity::Warning)]
    #[case("error", IssueSeverity::Error)]
    #[case("Err", IssueSeverity::Error)]
    #[case("info", IssueSeverity::Information)]
    #[case("information", IssueSeverity::Information)]
    #[case("hint", IssueSeverity::Hint)]
    #[case("major", IssueSeverity::Warning)]
    fn severity_parsing(#[case] value: &str, #[case] expected: IssueSeverity) {
        assert_eq!(IssueSeverity::parse(value), expected);
    }
}
