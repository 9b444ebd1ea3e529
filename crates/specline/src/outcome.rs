//! Outcome classification: running one `it` body and telling the reporter.

use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Once;

use crate::assertion::{AssertionAdapter, AssertionFailure};
use crate::reporter::Reporter;
use crate::scope::ScopeStack;

/// What a test body returns.
pub type TestResult = anyhow::Result<()>;

/// The single terminal result of running one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AssertionFailure(AssertionFailure),
    UnknownError { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Conversion from whatever a test body evaluates to into a [`TestResult`].
///
/// Lets bodies end in `()` or in any `Result` whose error converts into
/// [`anyhow::Error`].
pub trait IntoTestResult {
    fn into_test_result(self) -> TestResult;
}

impl IntoTestResult for () {
    fn into_test_result(self) -> TestResult {
        Ok(())
    }
}

impl<E> IntoTestResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_test_result(self) -> TestResult {
        self.map_err(Into::into)
    }
}

/// Map a finished (or panicked) body to an [`Outcome`].
pub fn classify(
    result: std::thread::Result<TestResult>,
    adapter: &dyn AssertionAdapter,
) -> Outcome {
    match result {
        Ok(Ok(())) => Outcome::Success,
        Ok(Err(error)) => match adapter.adapt_error(&error) {
            Some(failure) => Outcome::AssertionFailure(failure),
            None => Outcome::UnknownError {
                message: format!("{error:#}"),
            },
        },
        Err(payload) => match adapter.adapt_panic(payload.as_ref()) {
            Some(failure) => Outcome::AssertionFailure(failure),
            None => Outcome::UnknownError {
                message: panic_message(payload.as_ref()),
            },
        },
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static INSTALL_QUIET_HOOK: Once = Once::new();

/// Silences the panic hook on this thread while alive, so a panicking body
/// does not break the status line. Other threads keep the previous hook.
struct QuietPanics {
    was_quiet: bool,
}

impl QuietPanics {
    fn enter() -> Self {
        INSTALL_QUIET_HOOK.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                if QUIET_PANICS.with(Cell::get) {
                    tracing::debug!(location = ?info.location(), "test body panicked");
                } else {
                    previous(info);
                }
            }));
        });
        QuietPanics {
            was_quiet: QUIET_PANICS.with(|quiet| quiet.replace(true)),
        }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        QUIET_PANICS.with(|quiet| quiet.set(self.was_quiet));
    }
}

/// Run one test body and send exactly one start and one terminal notification.
///
/// `scopes` is only read, for log context. Failures are never retried.
pub fn run_it(
    description: &str,
    body: &dyn Fn() -> TestResult,
    reporter: &mut dyn Reporter,
    scopes: &ScopeStack,
    adapter: &dyn AssertionAdapter,
) -> Outcome {
    reporter.it_starting(description);

    let result = {
        let _quiet = QuietPanics::enter();
        catch_unwind(AssertUnwindSafe(body))
    };
    let outcome = classify(result, adapter);

    match &outcome {
        Outcome::Success => {
            tracing::debug!(scope = %scopes.current_path(), test = description, "succeeded");
            reporter.it_succeeded(description);
        }
        Outcome::AssertionFailure(failure) => {
            tracing::debug!(
                scope = %scopes.current_path(),
                test = description,
                expected = %failure.expected,
                actual = %failure.actual,
                "assertion failed"
            );
            reporter.it_failed(description, failure);
        }
        Outcome::UnknownError { message } => {
            tracing::debug!(
                scope = %scopes.current_path(),
                test = description,
                error = %message,
                "unknown error"
            );
            reporter.it_unknown_error(description);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{expect_equal, NativeAdapter};
    use crate::reporter::CallLogReporter;

    fn call_it(body: &dyn Fn() -> TestResult) -> (Outcome, Vec<String>) {
        let mut reporter = CallLogReporter::new();
        let outcome = run_it("my it", body, &mut reporter, &ScopeStack::new(), &NativeAdapter);
        (outcome, reporter.into_call_log())
    }

    #[test]
    fn succeeding_body_reports_start_then_success() {
        let (outcome, log) = call_it(&|| Ok(()));

        assert!(outcome.is_success());
        assert_eq!(log, vec!["it_starting: my it", "it_succeeded: my it"]);
    }

    #[test]
    fn returned_assertion_failure_is_reported_as_failed() {
        let (outcome, log) = call_it(&|| Ok(expect_equal(3, 2)?));

        assert_eq!(
            outcome,
            Outcome::AssertionFailure(AssertionFailure::new("equal to 2", "3"))
        );
        assert_eq!(
            log,
            vec![
                "it_starting: my it",
                "it_failed: my it (Expected: equal to 2 Actual: 3)"
            ]
        );
    }

    #[test]
    fn panicked_assertion_failure_is_reported_as_failed() {
        let (outcome, log) = call_it(&|| {
            std::panic::panic_any(AssertionFailure::new("equal to 2", "3"));
        });

        assert!(matches!(outcome, Outcome::AssertionFailure(_)));
        assert_eq!(log.len(), 2);
        assert!(log[1].starts_with("it_failed: my it"));
    }

    #[test]
    fn other_error_is_unknown() {
        let (outcome, log) = call_it(&|| Err(anyhow::anyhow!("connection refused")));

        assert_eq!(
            outcome,
            Outcome::UnknownError {
                message: "connection refused".to_string()
            }
        );
        assert_eq!(log, vec!["it_starting: my it", "it_unknown_error: my it"]);
    }

    #[test]
    fn panic_hook_is_quiet_only_inside_the_body() {
        let (outcome, _) = call_it(&|| {
            assert!(QUIET_PANICS.with(Cell::get));
            Ok(())
        });

        assert_eq!(outcome, Outcome::Success);
        assert!(!QUIET_PANICS.with(Cell::get));
    }

    #[test]
    fn quiet_flag_is_restored_after_a_panicking_body() {
        let (outcome, _) = call_it(&|| -> TestResult { std::panic::panic_any(7_u8) });

        assert!(matches!(outcome, Outcome::UnknownError { .. }));
        assert!(!QUIET_PANICS.with(Cell::get));
    }

    #[test]
    fn plain_panic_is_unknown() {
        let (outcome, log) = call_it(&|| panic!("index out of bounds"));

        assert_eq!(
            outcome,
            Outcome::UnknownError {
                message: "index out of bounds".to_string()
            }
        );
        assert_eq!(log, vec!["it_starting: my it", "it_unknown_error: my it"]);
    }

    #[test]
    fn unit_and_result_bodies_convert() {
        assert!(().into_test_result().is_ok());
        assert!(Ok::<(), AssertionFailure>(()).into_test_result().is_ok());
        assert!(Err::<(), _>(AssertionFailure::new("a", "b"))
            .into_test_result()
            .is_err());
    }
}
