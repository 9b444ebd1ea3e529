//! Spec tree and the sequential runner that walks it.
//!
//! The runner drives a [`Reporter`] through one test run:
//!
//! ```text
//! test_run_starting
//!   context_starting "Calculator"
//!     it_starting "adds two numbers"
//!     it_succeeded "adds two numbers"
//!   context_ended "Calculator"
//! test_run_complete
//! ```

use std::ops::{Deref, DerefMut};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

use crate::assertion::{AssertionAdapter, NativeAdapter};
use crate::formatter::FormatterKind;
use crate::outcome::{run_it, IntoTestResult, TestResult};
use crate::reporter::{Reporter, RunError, SingleLineReporter};
use crate::scope::ScopeStack;

// ============================================================================
// Test tree types
// ============================================================================

/// A test body or hook.
pub type TestFn = Box<dyn Fn() -> TestResult>;

/// Hooks attached to a describe/context scope.
#[derive(Default)]
pub struct Hooks {
    before_all: Vec<TestFn>,
    before_each: Vec<TestFn>,
    after_each: Vec<TestFn>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs once when the scope is entered. A failure is a test run error
    /// and skips everything in the scope.
    pub fn before_all<R: IntoTestResult>(mut self, hook: impl Fn() -> R + 'static) -> Self {
        self.before_all.push(boxed(hook));
        self
    }

    /// Runs before every test in the scope and its nested scopes.
    pub fn before_each<R: IntoTestResult>(mut self, hook: impl Fn() -> R + 'static) -> Self {
        self.before_each.push(boxed(hook));
        self
    }

    /// Runs after every test in the scope, even when the test failed.
    pub fn after_each<R: IntoTestResult>(mut self, hook: impl Fn() -> R + 'static) -> Self {
        self.after_each.push(boxed(hook));
        self
    }

    pub(crate) fn push_before_all(&mut self, hook: TestFn) {
        self.before_all.push(hook);
    }

    pub(crate) fn push_before_each(&mut self, hook: TestFn) {
        self.before_each.push(hook);
    }

    pub(crate) fn push_after_each(&mut self, hook: TestFn) {
        self.after_each.push(hook);
    }
}

pub(crate) fn boxed<R: IntoTestResult>(f: impl Fn() -> R + 'static) -> TestFn {
    Box::new(move || f().into_test_result())
}

/// A node in the spec tree.
pub enum TestNode {
    /// A describe/context/when scope.
    Describe {
        name: String,
        hooks: Hooks,
        children: Vec<TestNode>,
        /// Set when declaring the scope's contents failed.
        declaration_error: Option<RunError>,
    },
    /// An individual test case.
    It { name: String, body: TestFn },
}

impl TestNode {
    pub fn describe(name: impl Into<String>, children: Vec<TestNode>) -> Self {
        TestNode::describe_with(name, Hooks::new(), children)
    }

    pub fn describe_with(name: impl Into<String>, hooks: Hooks, children: Vec<TestNode>) -> Self {
        TestNode::Describe {
            name: name.into(),
            hooks,
            children,
            declaration_error: None,
        }
    }

    pub fn it<R: IntoTestResult>(name: impl Into<String>, f: impl Fn() -> R + 'static) -> Self {
        TestNode::It {
            name: name.into(),
            body: boxed(f),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration parsed from command-line args.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Only list tests, don't run them.
    pub list: bool,
    /// Layout of assertion failures in the final report.
    pub formatter: FormatterKind,
}

impl RunConfig {
    /// Parse from the process args (compatible with `cargo test -- <args>`).
    pub fn from_args() -> Self {
        RunConfig::parse(std::env::args().skip(1))
    }

    /// Parse flags, ignoring anything unrecognized (cargo passes libtest flags).
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = RunConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let formatter = match arg {
                "--list" => {
                    config.list = true;
                    None
                }
                "--formatter" => args.next().map(|v| v.as_ref().to_string()),
                _ => arg.strip_prefix("--formatter=").map(str::to_string),
            };

            if let Some(name) = formatter {
                match name.parse() {
                    Ok(kind) => config.formatter = kind,
                    Err(error) => {
                        tracing::warn!(%error, "falling back to the posix formatter");
                    }
                }
            }
        }

        config
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Walks a spec tree in declaration order, reporting to `R`.
pub struct Runner<R: Reporter> {
    reporter: R,
    adapter: Box<dyn AssertionAdapter>,
    scopes: ScopeStack,
}

impl<R: Reporter> Runner<R> {
    pub fn new(reporter: R) -> Self {
        Runner {
            reporter,
            adapter: Box::new(NativeAdapter),
            scopes: ScopeStack::new(),
        }
    }

    /// Recognize assertion failures from another assertion library.
    pub fn with_adapter(mut self, adapter: impl AssertionAdapter + 'static) -> Self {
        self.adapter = Box::new(adapter);
        self
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run the whole tree as one test run. Returns whether the run passed.
    pub fn run(&mut self, nodes: &[TestNode]) -> bool {
        tracing::debug!(nodes = nodes.len(), "test run starting");
        self.reporter.test_run_starting();
        self.run_nodes(nodes, &[]);
        self.reporter.test_run_complete();

        let passed = self.reporter.did_we_pass();
        tracing::debug!(passed, "test run complete");
        passed
    }

    fn run_nodes(&mut self, nodes: &[TestNode], inherited: &[&Hooks]) {
        for node in nodes {
            match node {
                TestNode::Describe {
                    name,
                    hooks,
                    children,
                    declaration_error,
                } => {
                    let mut context = self.enter_context(name);

                    if let Some(error) = declaration_error {
                        context.reporter.test_run_error(name, error);
                        continue;
                    }
                    if let Err(error) = run_before_all(hooks) {
                        tracing::debug!(
                            scope = %context.scopes.current_path(),
                            %error,
                            "before_all failed"
                        );
                        context.reporter.test_run_error(name, &error);
                        continue;
                    }

                    let mut chain = inherited.to_vec();
                    chain.push(hooks);
                    context.run_nodes(children, &chain);
                }
                TestNode::It { name, body } => {
                    let composite = || run_with_hooks(body, inherited);
                    run_it(
                        name,
                        &composite,
                        &mut self.reporter,
                        &self.scopes,
                        self.adapter.as_ref(),
                    );
                }
            }
        }
    }

    fn enter_context(&mut self, name: &str) -> ContextGuard<'_, R> {
        tracing::trace!(scope = name, "context starting");
        self.scopes.push(name);
        self.reporter.context_starting(name);
        ContextGuard { runner: self }
    }
}

/// Ends the context it was created for on drop, on every exit path.
struct ContextGuard<'a, R: Reporter> {
    runner: &'a mut Runner<R>,
}

impl<R: Reporter> Deref for ContextGuard<'_, R> {
    type Target = Runner<R>;

    fn deref(&self) -> &Runner<R> {
        self.runner
    }
}

impl<R: Reporter> DerefMut for ContextGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut Runner<R> {
        self.runner
    }
}

impl<R: Reporter> Drop for ContextGuard<'_, R> {
    fn drop(&mut self) {
        let name = self.runner.scopes.pop();
        tracing::trace!(scope = %name, "context ended");
        self.runner.reporter.context_ended(&name);
    }
}

fn run_before_all(hooks: &Hooks) -> Result<(), RunError> {
    for hook in &hooks.before_all {
        match catch_unwind(AssertUnwindSafe(|| hook())) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(RunError::from(error)),
            Err(payload) => return Err(RunError::from_panic(payload.as_ref())),
        }
    }
    Ok(())
}

/// Outer `before_each` first, then the body, then `after_each` innermost first.
/// `after_each` hooks run even if the body failed or panicked. If a
/// `before_each` fails, the body is skipped and only the scopes whose
/// `before_each` hooks all succeeded are torn down.
fn run_with_hooks(body: &TestFn, inherited: &[&Hooks]) -> TestResult {
    let mut prepared = 0;
    let mut result: std::thread::Result<TestResult> = Ok(Ok(()));
    'setup: for hooks in inherited {
        for hook in &hooks.before_each {
            result = catch_unwind(AssertUnwindSafe(|| hook()));
            if !matches!(result, Ok(Ok(()))) {
                break 'setup;
            }
        }
        prepared += 1;
    }

    if prepared == inherited.len() {
        result = catch_unwind(AssertUnwindSafe(|| body()));
    } else {
        tracing::debug!(prepared, scopes = inherited.len(), "before_each failed, skipping body");
    }

    let mut after: TestResult = Ok(());
    for hooks in inherited[..prepared].iter().rev() {
        for hook in hooks.after_each.iter().rev() {
            let hook_result = hook();
            if after.is_ok() {
                after = hook_result;
            }
        }
    }

    match result {
        Ok(result) => result.and(after),
        Err(payload) => resume_unwind(payload),
    }
}

/// Full paths of every test in the tree, scope names and test name joined by
/// spaces.
pub fn list(nodes: &[TestNode]) -> Vec<String> {
    let mut paths = Vec::new();
    list_into(nodes, &mut ScopeStack::new(), &mut paths);
    paths
}

fn list_into(nodes: &[TestNode], scopes: &mut ScopeStack, paths: &mut Vec<String>) {
    for node in nodes {
        match node {
            TestNode::Describe { name, children, .. } => {
                let mut scope = scopes.enter(name.as_str());
                list_into(children, &mut scope, paths);
            }
            TestNode::It { name, .. } => {
                if scopes.is_empty() {
                    paths.push(name.clone());
                } else {
                    paths.push(format!("{} {}", scopes.current_path(), name));
                }
            }
        }
    }
}

/// Entry point for `harness = false` targets: run `nodes` with a
/// [`SingleLineReporter`] on stdout and exit non-zero if the run failed.
pub fn run_main(nodes: Vec<TestNode>) {
    crate::logging::init();
    let config = RunConfig::from_args();

    if config.list {
        for path in list(&nodes) {
            println!("{path}");
        }
        return;
    }

    tracing::debug!(formatter = %config.formatter, "running suite");
    let reporter = SingleLineReporter::stdout(config.formatter.build());
    let mut runner = Runner::new(reporter);
    if !runner.run(&nodes) {
        std::process::exit(1);
    }
}
