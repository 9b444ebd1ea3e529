//! The assertion-failure signal and the adapter that recognizes it.
//!
//! Matching itself is left to whatever assertion library a spec uses. All the
//! runner needs is an [`AssertionFailure`] carrying an expected and an actual
//! description, either returned as an error from a test body or raised with
//! [`std::panic::panic_any`].

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Source position an assertion was raised from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

/// An expected-versus-actual mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", display_failure(self))]
pub struct AssertionFailure {
    pub expected: String,
    pub actual: String,
    /// Free-form text supplied by the assertion. May be empty.
    pub message: String,
    pub location: Option<Location>,
}

fn display_failure(failure: &AssertionFailure) -> String {
    let mut out = format!("Expected: {} Actual: {}", failure.expected, failure.actual);
    if !failure.message.is_empty() {
        out.push_str(" (");
        out.push_str(&failure.message);
        out.push(')');
    }
    out
}

impl AssertionFailure {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AssertionFailure {
            expected: expected.into(),
            actual: actual.into(),
            message: String::new(),
            location: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the source position of the failing assertion.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line,
        });
        self
    }
}

/// Compare `actual` with `expected`.
///
/// The expected description reads `equal to <expected>`.
pub fn expect_equal<T>(actual: T, expected: T) -> Result<(), AssertionFailure>
where
    T: PartialEq + fmt::Display,
{
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            format!("equal to {expected}"),
            actual.to_string(),
        ))
    }
}

/// Check that `actual` equals `expected`, recording the call site.
///
/// Evaluates to `Result<(), AssertionFailure>`, so use it with `?` or as the
/// final expression of a test body.
///
/// ```
/// # fn body() -> Result<(), specline::AssertionFailure> {
/// specline::expect_eq!(2 + 3, 5)?;
/// # Ok(()) }
/// # body().unwrap();
/// ```
#[macro_export]
macro_rules! expect_eq {
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::assertion::expect_equal($actual, $expected)
            .map_err(|failure| failure.at(file!(), line!()))
    };
}

/// Check a boolean condition, recording the call site.
///
/// ```
/// # fn body() -> Result<(), specline::AssertionFailure> {
/// let items = vec![1, 2];
/// specline::expect_that!(!items.is_empty(), "items were collected")?;
/// # Ok(()) }
/// # body().unwrap();
/// ```
#[macro_export]
macro_rules! expect_that {
    ($condition:expr, $message:expr $(,)?) => {
        if $condition {
            Ok(())
        } else {
            Err($crate::assertion::AssertionFailure::new("true", "false")
                .with_message($message)
                .at(file!(), line!()))
        }
    };
}

/// Recognizes assertion failures raised by a test body.
///
/// The outcome classifier asks the adapter about every error and panic payload;
/// anything it does not recognize becomes an unknown error.
pub trait AssertionAdapter {
    fn adapt_error(&self, error: &anyhow::Error) -> Option<AssertionFailure>;

    fn adapt_panic(&self, payload: &(dyn Any + Send)) -> Option<AssertionFailure>;
}

/// Adapter for this crate's own [`AssertionFailure`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeAdapter;

impl AssertionAdapter for NativeAdapter {
    fn adapt_error(&self, error: &anyhow::Error) -> Option<AssertionFailure> {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<AssertionFailure>())
            .cloned()
    }

    fn adapt_panic(&self, payload: &(dyn Any + Send)) -> Option<AssertionFailure> {
        payload.downcast_ref::<AssertionFailure>().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn expect_equal_describes_expected_value() {
        let failure = expect_equal(3, 2).unwrap_err();
        assert_eq!(failure.expected, "equal to 2");
        assert_eq!(failure.actual, "3");
        assert!(failure.location.is_none());
    }

    #[test]
    fn expect_equal_passes_on_match() {
        assert!(expect_equal("abc", "abc").is_ok());
    }

    #[test]
    fn expect_eq_macro_records_location() {
        let failure = expect_eq!(1 + 1, 3).unwrap_err();
        let location = failure.location.expect("location recorded");
        assert!(location.file.ends_with("assertion.rs"));
        assert!(location.line > 0);
    }

    #[test]
    fn expect_that_carries_message() {
        let failure = expect_that!(1 > 2, "one is bigger").unwrap_err();
        assert_eq!(failure.expected, "true");
        assert_eq!(failure.actual, "false");
        assert_eq!(failure.message, "one is bigger");
    }

    #[test]
    fn native_adapter_finds_failure_behind_context() {
        let error = Err::<(), _>(AssertionFailure::new("equal to 2", "3"))
            .context("while checking totals")
            .unwrap_err();

        let failure = NativeAdapter.adapt_error(&error).expect("recognized");
        assert_eq!(failure.actual, "3");
    }

    #[test]
    fn native_adapter_ignores_other_errors() {
        let error = anyhow::anyhow!("disk full");
        assert!(NativeAdapter.adapt_error(&error).is_none());

        let payload: Box<dyn Any + Send> = Box::new("plain panic");
        assert!(NativeAdapter.adapt_panic(payload.as_ref()).is_none());
    }

    #[test]
    fn native_adapter_recognizes_panic_payload() {
        let payload: Box<dyn Any + Send> = Box::new(AssertionFailure::new("equal to 1", "0"));
        let failure = NativeAdapter.adapt_panic(payload.as_ref()).expect("recognized");
        assert_eq!(failure.expected, "equal to 1");
    }
}
