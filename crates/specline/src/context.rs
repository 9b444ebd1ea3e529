//! Closure-based declaration API: `Context`, the suite builder and `run()`.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::outcome::IntoTestResult;
use crate::reporter::RunError;
use crate::runner::{self, boxed, Hooks, TestNode};

// ============================================================================
// Thread-local suite builder
// ============================================================================

thread_local! {
    static BUILDER: RefCell<Option<SuiteBuilder>> = const { RefCell::new(None) };
}

struct SuiteBuilder {
    stack: Vec<GroupFrame>,
}

struct GroupFrame {
    name: String,
    hooks: Hooks,
    children: Vec<TestNode>,
    declaration_error: Option<RunError>,
}

impl GroupFrame {
    fn new(name: String) -> Self {
        GroupFrame {
            name,
            hooks: Hooks::new(),
            children: Vec::new(),
            declaration_error: None,
        }
    }
}

impl SuiteBuilder {
    fn new() -> Self {
        SuiteBuilder {
            stack: vec![GroupFrame::new(String::new())],
        }
    }

    fn push_group(&mut self, name: String) {
        self.stack.push(GroupFrame::new(name));
    }

    fn pop_group(&mut self) {
        let frame = self.stack.pop().expect("specline: unbalanced group push/pop");
        let node = TestNode::Describe {
            name: frame.name,
            hooks: frame.hooks,
            children: frame.children,
            declaration_error: frame.declaration_error,
        };
        self.current_frame_mut().children.push(node);
    }

    fn add_node(&mut self, node: TestNode) {
        self.current_frame_mut().children.push(node);
    }

    fn fail_group(&mut self, error: RunError) {
        self.current_frame_mut().declaration_error = Some(error);
    }

    fn current_frame_mut(&mut self) -> &mut GroupFrame {
        self.stack.last_mut().expect("specline: empty builder stack")
    }

    fn into_nodes(mut self) -> Vec<TestNode> {
        assert_eq!(
            self.stack.len(),
            1,
            "specline: unbalanced group push/pop at finalization"
        );
        self.current_frame_mut().children.drain(..).collect()
    }
}

fn with_builder<R>(f: impl FnOnce(&mut SuiteBuilder) -> R) -> R {
    BUILDER.with(|cell| {
        let mut opt = cell.borrow_mut();
        let builder = opt
            .as_mut()
            .expect("specline: Context used outside of specline::run()");
        f(builder)
    })
}

// ============================================================================
// Context: the user-facing handle
// ============================================================================

/// A lightweight handle for declaring specs.
///
/// All methods delegate to a thread-local builder. `Context` is `Copy` so it
/// can be passed into nested closures without ceremony.
///
/// # Example
/// ```rust,no_run
/// fn main() {
///     specline::run(|ctx| {
///         ctx.describe("Calculator", |ctx| {
///             ctx.it("adds", || specline::expect_eq!(2 + 3, 5));
///         });
///     });
/// }
/// ```
#[derive(Copy, Clone)]
pub struct Context;

impl Context {
    // ---- Describe / Context / When -------------------------------------------

    /// Open a named scope. A panic while running `body` is reported as a
    /// test run error for this scope when the suite runs.
    pub fn describe(&self, name: &str, body: impl FnOnce(Context)) {
        with_builder(|b| b.push_group(name.to_string()));
        let declared = catch_unwind(AssertUnwindSafe(|| body(Context)));
        with_builder(|b| {
            if let Err(payload) = declared {
                b.fail_group(RunError::from_panic(payload.as_ref()));
            }
            b.pop_group();
        });
    }

    pub fn context(&self, name: &str, body: impl FnOnce(Context)) {
        self.describe(name, body);
    }

    pub fn when(&self, name: &str, body: impl FnOnce(Context)) {
        self.describe(name, body);
    }

    // ---- It / Specify --------------------------------------------------------

    /// Declare a test. The body may return `()` or any `Result<(), E>`.
    pub fn it<R: IntoTestResult>(&self, name: &str, body: impl Fn() -> R + 'static) {
        let node = TestNode::It {
            name: name.to_string(),
            body: boxed(body),
        };
        with_builder(|b| b.add_node(node));
    }

    pub fn specify<R: IntoTestResult>(&self, name: &str, body: impl Fn() -> R + 'static) {
        self.it(name, body);
    }

    // ---- Hooks ---------------------------------------------------------------

    pub fn before_all<R: IntoTestResult>(&self, hook: impl Fn() -> R + 'static) {
        with_builder(|b| b.current_frame_mut().hooks.push_before_all(boxed(hook)));
    }

    pub fn before_each<R: IntoTestResult>(&self, hook: impl Fn() -> R + 'static) {
        with_builder(|b| b.current_frame_mut().hooks.push_before_each(boxed(hook)));
    }

    pub fn after_each<R: IntoTestResult>(&self, hook: impl Fn() -> R + 'static) {
        with_builder(|b| b.current_frame_mut().hooks.push_after_each(boxed(hook)));
    }
}

// ============================================================================
// build() / run(): entry points
// ============================================================================

/// Declare a suite and return its tree without running it.
///
/// Hooks declared at the top level (outside any `describe`) are ignored.
pub fn build(body: impl FnOnce(Context)) -> Vec<TestNode> {
    BUILDER.with(|cell| {
        *cell.borrow_mut() = Some(SuiteBuilder::new());
    });

    body(Context);

    BUILDER.with(|cell| {
        cell.borrow_mut()
            .take()
            .expect("specline: builder missing after build")
            .into_nodes()
    })
}

/// Declare and run a suite.
///
/// This is the main entry point for specline. Call it from `fn main()` in a
/// test target with `harness = false`. Exits with status 1 if any test failed
/// or any test run error was recorded.
///
/// # Example
///
/// ```rust,no_run
/// fn main() {
///     specline::run(|ctx| {
///         ctx.describe("Calculator", |ctx| {
///             ctx.it("adds", || specline::expect_eq!(2 + 3, 5));
///         });
///     });
/// }
/// ```
pub fn run(body: impl FnOnce(Context)) {
    let nodes = build(body);
    runner::run_main(nodes);
}
