//! # specline, a bandit-style BDD spec runner for Rust
//!
//! Declare nested `describe`/`context` scopes and `it` blocks, run them in
//! declaration order, and watch a single live status line while they execute:
//!
//! ```text
//! Executed 41 tests. 40 succeeded. 1 failed.
//! There were failures!
//!
//! Calculator with negative numbers subtracts:
//! specs/calculator.rs:18: Expected: equal to -2 Actual: 2
//!
//! Test run complete. 41 tests run. 40 succeeded. 1 failed.
//! ```
//!
//! ## Quick example
//!
//! ```rust,no_run
//! fn main() {
//!     specline::run(|ctx| {
//!         ctx.describe("Calculator", |ctx| {
//!             ctx.it("adds two numbers", || specline::expect_eq!(2 + 3, 5));
//!
//!             ctx.context("with negative numbers", |ctx| {
//!                 ctx.it("handles negatives", || {
//!                     specline::expect_eq!(-1 + 1, 0)?;
//!                     Ok::<(), specline::AssertionFailure>(())
//!                 });
//!             });
//!         });
//!     });
//! }
//! ```
//!
//! A test fails with an [`AssertionFailure`] (returned as an error or raised
//! with [`std::panic::panic_any`]) or with any other error or panic, which is
//! reported as an unknown error. Everything the runner observes goes through
//! the [`Reporter`] trait; [`SingleLineReporter`] is the default sink.
//!
//! ## Features
//!
//! - `macros` (default): the `bdd!` and `bdd_suite!` DSL macros

pub mod assertion;
mod context;
pub mod formatter;
pub mod logging;
pub mod outcome;
pub mod reporter;
pub mod runner;
pub mod scope;

pub use assertion::{expect_equal, AssertionAdapter, AssertionFailure, Location, NativeAdapter};
pub use context::{build, run, Context};
pub use formatter::{FailureFormatter, FormatterKind, PosixFormatter, VisualStudioFormatter};
pub use outcome::{IntoTestResult, Outcome, TestResult};
pub use reporter::{CallLogReporter, Reporter, RunError, SingleLineReporter};
pub use runner::{Hooks, RunConfig, Runner, TestNode};
pub use scope::{ScopeGuard, ScopeStack};

#[cfg(feature = "macros")]
pub use specline_macros::{bdd, bdd_suite};

/// A drop guard that runs cleanup code even if the test panics.
///
/// The DSL macros use it to run `after_each` blocks.
pub struct Guard<F: FnOnce()> {
    f: Option<F>,
}

impl<F: FnOnce()> Guard<F> {
    pub fn new(f: F) -> Self {
        Guard { f: Some(f) }
    }
}

impl<F: FnOnce()> Drop for Guard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_guard_runs_on_success() {
        use std::sync::atomic::{AtomicBool, Ordering};
        static RAN: AtomicBool = AtomicBool::new(false);

        {
            let _g = Guard::new(|| RAN.store(true, Ordering::SeqCst));
        }
        assert!(RAN.load(Ordering::SeqCst));
    }

    #[test]
    fn test_guard_runs_on_panic() {
        use std::sync::atomic::{AtomicBool, Ordering};
        static RAN: AtomicBool = AtomicBool::new(false);

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _g = Guard::new(|| RAN.store(true, Ordering::SeqCst));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(RAN.load(Ordering::SeqCst));
    }
}
