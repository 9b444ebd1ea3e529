//! Failure formatters: render an [`AssertionFailure`] for the final report.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::assertion::{AssertionFailure, Location};

/// Renders an assertion failure as human-readable text.
///
/// Implementations must be pure and must not panic on odd input.
pub trait FailureFormatter {
    fn format(&self, failure: &AssertionFailure) -> String;
}

/// Renders `file:line: Expected: ... Actual: ...`, the layout most editors
/// and terminals pick up as a clickable location.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixFormatter;

impl FailureFormatter for PosixFormatter {
    fn format(&self, failure: &AssertionFailure) -> String {
        let prefix = match &failure.location {
            Some(Location { file, line }) => format!("{file}:{line}: "),
            None => String::new(),
        };
        prefix + &describe(failure)
    }
}

/// Renders `file(line): Expected: ... Actual: ...` for the Visual Studio error list.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisualStudioFormatter;

impl FailureFormatter for VisualStudioFormatter {
    fn format(&self, failure: &AssertionFailure) -> String {
        let prefix = match &failure.location {
            Some(Location { file, line }) => format!("{file}({line}): "),
            None => String::new(),
        };
        prefix + &describe(failure)
    }
}

fn describe(failure: &AssertionFailure) -> String {
    if failure.expected.is_empty() && failure.actual.is_empty() {
        if failure.message.is_empty() {
            return "Assertion failed".to_string();
        }
        return failure.message.clone();
    }
    format!("Expected: {} Actual: {}", failure.expected, failure.actual)
}

/// Formatter selectable from the command line with `--formatter=<name>`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    #[default]
    Posix,
    VisualStudio,
}

impl FormatterKind {
    pub fn build(self) -> Box<dyn FailureFormatter> {
        match self {
            FormatterKind::Posix => Box::new(PosixFormatter),
            FormatterKind::VisualStudio => Box::new(VisualStudioFormatter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown formatter `{0}`, expected `posix` or `vs`")]
pub struct UnknownFormatter(pub String);

impl FromStr for FormatterKind {
    type Err = UnknownFormatter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posix" => Ok(FormatterKind::Posix),
            "vs" | "visual_studio" => Ok(FormatterKind::VisualStudio),
            other => Err(UnknownFormatter(other.to_string())),
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterKind::Posix => f.write_str("posix"),
            FormatterKind::VisualStudio => f.write_str("vs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn posix_renders_expected_and_actual() {
        let failure = AssertionFailure::new("equal to 2", "3");
        assert_eq!(PosixFormatter.format(&failure), "Expected: equal to 2 Actual: 3");
    }

    #[test]
    fn posix_prefixes_location() {
        let failure = AssertionFailure::new("equal to 2", "3").at("specs/math.rs", 12);
        assert_eq!(
            PosixFormatter.format(&failure),
            "specs/math.rs:12: Expected: equal to 2 Actual: 3"
        );
    }

    #[test]
    fn visual_studio_prefixes_location() {
        let failure = AssertionFailure::new("equal to 2", "3").at("specs/math.rs", 12);
        assert_eq!(
            VisualStudioFormatter.format(&failure),
            "specs/math.rs(12): Expected: equal to 2 Actual: 3"
        );
    }

    #[test]
    fn formatting_is_repeatable() {
        let failure = AssertionFailure::new("equal to 2", "3").with_message("totals");
        assert_eq!(PosixFormatter.format(&failure), PosixFormatter.format(&failure));
    }

    #[rstest]
    #[case::posix(FormatterKind::Posix)]
    #[case::visual_studio(FormatterKind::VisualStudio)]
    fn kind_name_parses_back(#[case] kind: FormatterKind) {
        assert_eq!(kind.to_string().parse::<FormatterKind>(), Ok(kind));
    }

    #[rstest]
    #[case::message_only(AssertionFailure::new("", "").with_message("boom"), "boom")]
    #[case::nothing_at_all(AssertionFailure::new("", ""), "Assertion failed")]
    #[case::actual_only(AssertionFailure::new("", "3"), "Expected:  Actual: 3")]
    fn degrades_to_what_is_available(#[case] failure: AssertionFailure, #[case] rendered: &str) {
        assert_eq!(PosixFormatter.format(&failure), rendered);
    }

    #[rstest]
    #[case("posix", FormatterKind::Posix)]
    #[case("vs", FormatterKind::VisualStudio)]
    #[case("visual_studio", FormatterKind::VisualStudio)]
    fn parses_formatter_names(#[case] name: &str, #[case] kind: FormatterKind) {
        assert_eq!(name.parse::<FormatterKind>(), Ok(kind));
    }

    #[test]
    fn rejects_unknown_formatter_name() {
        let err = "xml".parse::<FormatterKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown formatter `xml`, expected `posix` or `vs`");
    }
}
