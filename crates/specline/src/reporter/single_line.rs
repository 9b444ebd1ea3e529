//! Single-line reporter: a live, overwritten status line and a summary.
//!
//! While tests run the reporter keeps one line up to date:
//!
//! ```text
//! Executed 12 tests. 10 succeeded. 2 failed.
//! ```
//!
//! When the run completes it prints any run errors, every failure with the
//! scope path it happened in, and a closing summary.

use std::io::{self, Write};

use super::{Reporter, RunError};
use crate::assertion::AssertionFailure;
use crate::formatter::FailureFormatter;
use crate::scope::ScopeStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Reported,
}

pub struct SingleLineReporter<W: Write> {
    out: W,
    formatter: Box<dyn FailureFormatter>,
    phase: Phase,
    scopes: ScopeStack,
    failures: Vec<String>,
    run_errors: Vec<String>,
    tests_run: usize,
    tests_succeeded: usize,
    tests_failed: usize,
    status_rendered: bool,
}

impl SingleLineReporter<io::Stdout> {
    /// Report to the process's standard output.
    pub fn stdout(formatter: Box<dyn FailureFormatter>) -> Self {
        SingleLineReporter::new(io::stdout(), formatter)
    }
}

impl<W: Write> SingleLineReporter<W> {
    pub fn new(out: W, formatter: Box<dyn FailureFormatter>) -> Self {
        SingleLineReporter {
            out,
            formatter,
            phase: Phase::Idle,
            scopes: ScopeStack::new(),
            failures: Vec::new(),
            run_errors: Vec::new(),
            tests_run: 0,
            tests_succeeded: 0,
            tests_failed: 0,
            status_rendered: false,
        }
    }

    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    pub fn tests_succeeded(&self) -> usize {
        self.tests_succeeded
    }

    pub fn tests_failed(&self) -> usize {
        self.tests_failed
    }

    /// Rendered failure messages, in the order the tests failed.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Rendered run-error messages, in the order they were recorded.
    pub fn run_errors(&self) -> &[String] {
        &self.run_errors
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn heading(&self, description: &str) -> String {
        if self.scopes.is_empty() {
            description.to_string()
        } else {
            format!("{} {}", self.scopes.current_path(), description)
        }
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(error) = result {
            tracing::warn!(%error, "failed to write report output");
        }
    }

    fn print_status_line(&mut self) {
        let mut line = format!("\rExecuted {} tests.", self.tests_run);
        if self.tests_failed > 0 {
            line.push_str(&format!(
                " {} succeeded. {} failed.",
                self.tests_succeeded, self.tests_failed
            ));
        }
        self.status_rendered = true;
        self.emit(&line);
    }

    fn render_report(&self) -> String {
        let mut report = String::new();
        if self.status_rendered {
            report.push('\n');
        }

        if self.tests_run == 0 && self.run_errors.is_empty() {
            report.push_str("Could not find any tests.\n");
            return report;
        }

        for error in &self.run_errors {
            report.push_str(error);
            report.push('\n');
        }

        if self.tests_failed > 0 {
            report.push_str("There were failures!\n");
            for failure in &self.failures {
                report.push_str(failure);
                report.push('\n');
            }
            report.push('\n');
        }

        report.push_str(&format!(
            "Test run complete. {} tests run. {} succeeded.",
            self.tests_run, self.tests_succeeded
        ));
        if self.tests_failed > 0 {
            report.push_str(&format!(" {} failed.", self.tests_failed));
        }
        if !self.run_errors.is_empty() {
            report.push_str(&format!(" {} test run errors.", self.run_errors.len()));
        }
        report.push('\n');
        report
    }
}

impl<W: Write> Reporter for SingleLineReporter<W> {
    fn test_run_starting(&mut self) {
        self.phase = Phase::Running;
        self.scopes.clear();
        self.failures.clear();
        self.run_errors.clear();
        self.tests_run = 0;
        self.tests_succeeded = 0;
        self.tests_failed = 0;
        self.status_rendered = false;
    }

    fn test_run_complete(&mut self) {
        if self.phase != Phase::Running {
            tracing::warn!(phase = ?self.phase, "test_run_complete called outside of a run; ignoring");
            return;
        }
        let report = self.render_report();
        self.emit(&report);
        self.phase = Phase::Reported;
    }

    fn context_starting(&mut self, name: &str) {
        self.scopes.push(name);
    }

    fn context_ended(&mut self, _name: &str) {
        self.scopes.pop();
    }

    fn test_run_error(&mut self, _context_name: &str, error: &RunError) {
        let message = format!(
            "\nFailed to run \"{}\": error \"{}\"\n",
            self.scopes.current_path(),
            error.message()
        );
        self.run_errors.push(message);
    }

    fn it_starting(&mut self, _description: &str) {
        self.print_status_line();
    }

    fn it_succeeded(&mut self, _description: &str) {
        self.tests_run += 1;
        self.tests_succeeded += 1;
        self.print_status_line();
    }

    fn it_failed(&mut self, description: &str, failure: &AssertionFailure) {
        self.tests_run += 1;
        self.tests_failed += 1;

        let mut message = format!(
            "\n{}:\n{}\n",
            self.heading(description),
            self.formatter.format(failure)
        );
        // Without expected/actual the formatter already shows the message.
        let has_comparison = !(failure.expected.is_empty() && failure.actual.is_empty());
        if has_comparison && !failure.message.is_empty() {
            message.push_str(&failure.message);
            message.push('\n');
        }
        self.failures.push(message);

        self.print_status_line();
    }

    fn it_unknown_error(&mut self, description: &str) {
        self.tests_run += 1;
        self.tests_failed += 1;

        let message = format!("\n{}:\nUnknown exception\n", self.heading(description));
        self.failures.push(message);

        self.print_status_line();
    }

    fn did_we_pass(&self) -> bool {
        self.tests_failed == 0 && self.run_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::PosixFormatter;

    fn reporter() -> SingleLineReporter<Vec<u8>> {
        SingleLineReporter::new(Vec::new(), Box::new(PosixFormatter))
    }

    fn output(reporter: &SingleLineReporter<Vec<u8>>) -> String {
        String::from_utf8_lossy(reporter.get_ref()).into_owned()
    }

    #[test]
    fn status_line_counts_executed_tests() {
        let mut r = reporter();
        r.test_run_starting();
        r.it_starting("a");
        r.it_succeeded("a");

        assert_eq!(output(&r), "\rExecuted 0 tests.\rExecuted 1 tests.");
    }

    #[test]
    fn status_line_shows_split_once_something_failed() {
        let mut r = reporter();
        r.test_run_starting();
        r.it_starting("a");
        r.it_succeeded("a");
        r.it_starting("b");
        r.it_unknown_error("b");

        assert!(output(&r).ends_with("\rExecuted 2 tests. 1 succeeded. 1 failed."));
    }

    #[test]
    fn no_tests_reports_nothing_found() {
        let mut r = reporter();
        r.test_run_starting();
        r.test_run_complete();

        assert_eq!(output(&r), "Could not find any tests.\n");
        assert!(r.did_we_pass());
    }

    #[test]
    fn failure_message_includes_scope_path() {
        let mut r = reporter();
        r.test_run_starting();
        r.context_starting("it:");
        r.it_starting("my it");
        r.it_failed("my it", &AssertionFailure::new("equal to 2", "3"));
        r.context_ended("it:");

        assert_eq!(r.failures(), ["\nit: my it:\nExpected: equal to 2 Actual: 3\n"]);
        assert!(!r.did_we_pass());
    }

    #[test]
    fn failure_message_appends_raw_text() {
        let mut r = reporter();
        r.test_run_starting();
        r.it_failed(
            "totals",
            &AssertionFailure::new("true", "false").with_message("cart is empty"),
        );

        assert_eq!(
            r.failures(),
            ["\ntotals:\nExpected: true Actual: false\ncart is empty\n"]
        );
    }

    #[test]
    fn message_only_failure_is_printed_once() {
        let mut r = reporter();
        r.test_run_starting();
        r.it_failed("t", &AssertionFailure::new("", "").with_message("boom"));

        assert_eq!(r.failures(), ["\nt:\nboom\n"]);
    }

    #[test]
    fn unknown_error_uses_fixed_marker() {
        let mut r = reporter();
        r.test_run_starting();
        r.context_starting("parser");
        r.it_unknown_error("reads input");

        assert_eq!(r.failures(), ["\nparser reads input:\nUnknown exception\n"]);
        assert_eq!(r.tests_run(), 1);
        assert_eq!(r.tests_failed(), 1);
    }

    #[test]
    fn run_error_does_not_touch_counters() {
        let mut r = reporter();
        r.test_run_starting();
        r.context_starting("X");
        r.test_run_error("X", &RunError::new("E"));

        assert_eq!(r.tests_run(), 0);
        assert_eq!(r.tests_failed(), 0);
        assert_eq!(r.run_errors(), ["\nFailed to run \"X\": error \"E\"\n"]);
        assert!(!r.did_we_pass());
    }

    #[test]
    fn run_starting_resets_state() {
        let mut r = reporter();
        r.test_run_starting();
        r.context_starting("outer");
        r.it_unknown_error("a");
        r.test_run_error("outer", &RunError::new("setup"));
        r.test_run_complete();

        r.test_run_starting();
        assert_eq!(r.tests_run(), 0);
        assert!(r.failures().is_empty());
        assert!(r.run_errors().is_empty());
        assert!(r.did_we_pass());
    }

    #[test]
    fn second_complete_is_ignored() {
        let mut r = reporter();
        r.test_run_starting();
        r.it_starting("a");
        r.it_succeeded("a");
        r.test_run_complete();
        let first = output(&r);

        r.test_run_complete();
        assert_eq!(output(&r), first);
    }
}
