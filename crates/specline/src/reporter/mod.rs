//! The reporter protocol: lifecycle notifications sent during a test run.

pub mod call_log;
pub mod single_line;

pub use call_log::CallLogReporter;
pub use single_line::SingleLineReporter;

use std::any::Any;

use thiserror::Error;

use crate::assertion::AssertionFailure;

/// An error raised outside of any test body, e.g. while setting up a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RunError {
    message: String,
}

impl RunError {
    pub fn new(message: impl Into<String>) -> Self {
        RunError {
            message: message.into(),
        }
    }

    /// Build from a panic payload caught during scope setup.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        RunError::new(crate::outcome::panic_message(payload))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for RunError {
    fn from(error: anyhow::Error) -> Self {
        RunError::new(format!("{error:#}"))
    }
}

/// Observer of a test run.
///
/// Calls arrive synchronously, in declaration order, from a single thread.
/// For every test, `it_starting` is followed by exactly one of
/// `it_succeeded`, `it_failed` or `it_unknown_error`.
pub trait Reporter {
    /// Reset all per-run state.
    fn test_run_starting(&mut self);

    /// Flush everything accumulated during the run.
    fn test_run_complete(&mut self);

    fn context_starting(&mut self, name: &str);

    /// `name` mirrors the matching `context_starting`; nesting is the
    /// caller's responsibility.
    fn context_ended(&mut self, name: &str);

    fn test_run_error(&mut self, context_name: &str, error: &RunError);

    fn it_starting(&mut self, description: &str);

    fn it_succeeded(&mut self, description: &str);

    fn it_failed(&mut self, description: &str, failure: &AssertionFailure);

    fn it_unknown_error(&mut self, description: &str);

    /// `true` when no test failed and no run error was recorded.
    fn did_we_pass(&self) -> bool;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn test_run_starting(&mut self) {
        (**self).test_run_starting();
    }

    fn test_run_complete(&mut self) {
        (**self).test_run_complete();
    }

    fn context_starting(&mut self, name: &str) {
        (**self).context_starting(name);
    }

    fn context_ended(&mut self, name: &str) {
        (**self).context_ended(name);
    }

    fn test_run_error(&mut self, context_name: &str, error: &RunError) {
        (**self).test_run_error(context_name, error);
    }

    fn it_starting(&mut self, description: &str) {
        (**self).it_starting(description);
    }

    fn it_succeeded(&mut self, description: &str) {
        (**self).it_succeeded(description);
    }

    fn it_failed(&mut self, description: &str, failure: &AssertionFailure) {
        (**self).it_failed(description, failure);
    }

    fn it_unknown_error(&mut self, description: &str) {
        (**self).it_unknown_error(description);
    }

    fn did_we_pass(&self) -> bool {
        (**self).did_we_pass()
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn test_run_starting(&mut self) {
        (**self).test_run_starting();
    }

    fn test_run_complete(&mut self) {
        (**self).test_run_complete();
    }

    fn context_starting(&mut self, name: &str) {
        (**self).context_starting(name);
    }

    fn context_ended(&mut self, name: &str) {
        (**self).context_ended(name);
    }

    fn test_run_error(&mut self, context_name: &str, error: &RunError) {
        (**self).test_run_error(context_name, error);
    }

    fn it_starting(&mut self, description: &str) {
        (**self).it_starting(description);
    }

    fn it_succeeded(&mut self, description: &str) {
        (**self).it_succeeded(description);
    }

    fn it_failed(&mut self, description: &str, failure: &AssertionFailure) {
        (**self).it_failed(description, failure);
    }

    fn it_unknown_error(&mut self, description: &str) {
        (**self).it_unknown_error(description);
    }

    fn did_we_pass(&self) -> bool {
        (**self).did_we_pass()
    }
}
