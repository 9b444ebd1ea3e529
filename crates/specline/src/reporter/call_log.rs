//! A reporter that records every notification as a line of text.
//!
//! Useful for asserting on notification order in specs of the runner itself.

use super::{Reporter, RunError};
use crate::assertion::AssertionFailure;

#[derive(Debug, Default)]
pub struct CallLogReporter {
    calls: Vec<String>,
    failed: bool,
}

impl CallLogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_log(&self) -> &[String] {
        &self.calls
    }

    pub fn into_call_log(self) -> Vec<String> {
        self.calls
    }

    fn log(&mut self, call: String) {
        self.calls.push(call);
    }
}

impl Reporter for CallLogReporter {
    fn test_run_starting(&mut self) {
        self.failed = false;
        self.log("test_run_starting".to_string());
    }

    fn test_run_complete(&mut self) {
        self.log("test_run_complete".to_string());
    }

    fn context_starting(&mut self, name: &str) {
        self.log(format!("context_starting: {name}"));
    }

    fn context_ended(&mut self, name: &str) {
        self.log(format!("context_ended: {name}"));
    }

    fn test_run_error(&mut self, context_name: &str, error: &RunError) {
        self.failed = true;
        self.log(format!("test_run_error: {context_name} ({error})"));
    }

    fn it_starting(&mut self, description: &str) {
        self.log(format!("it_starting: {description}"));
    }

    fn it_succeeded(&mut self, description: &str) {
        self.log(format!("it_succeeded: {description}"));
    }

    fn it_failed(&mut self, description: &str, failure: &AssertionFailure) {
        self.failed = true;
        self.log(format!("it_failed: {description} ({failure})"));
    }

    fn it_unknown_error(&mut self, description: &str) {
        self.failed = true;
        self.log(format!("it_unknown_error: {description}"));
    }

    fn did_we_pass(&self) -> bool {
        !self.failed
    }
}
