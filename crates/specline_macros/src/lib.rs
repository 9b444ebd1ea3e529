//! Proc macros for the `specline` BDD spec runner.

mod codegen;
mod dsl;

/// BDD runner macro: generates a `main()` that runs the suite with the
/// single-line reporter.
///
/// Use it in a test target with `harness = false`.
///
/// # Setup
///
/// In `Cargo.toml`:
/// ```toml
/// [[test]]
/// name = "my_specs"
/// harness = false
/// ```
///
/// In your test file:
/// ```text
/// specline::bdd! {
///     describe "Calculator" {
///         before_each {
///             let a = 2;
///         }
///
///         it "adds" { specline::expect_eq!(a + 3, 5) }
///
///         context "with negative numbers" {
///             it "subtracts" { assert_eq!(a - 3, -1); }
///         }
///     }
/// }
/// ```
///
/// # Supported DSL keywords
///
/// - `describe "name" { ... }` / `context "name" { ... }` / `when "name" { ... }`
/// - `it "name" { ... }` / `specify "name" { ... }`: the body may end in `()`
///   or in a `Result`, and may use `?`
/// - `before_each { ... }`: inlined before every spec in this scope and nested
///   scopes, so its bindings are visible to the spec body
/// - `after_each { ... }`: runs after every spec in this scope (even on panic),
///   innermost first
#[proc_macro]
pub fn bdd(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let suite = syn::parse_macro_input!(input as dsl::Suite);
    codegen::generate_bdd(suite).into()
}

/// Generate a spec tree without `fn main()`: evaluates to
/// `Vec<specline::runner::TestNode>`.
///
/// Use this to drive the tree with your own reporter:
///
/// ```text
/// let nodes = specline::bdd_suite! {
///     describe "Auth" { it "works" { assert!(true); } }
/// };
/// let mut runner = specline::Runner::new(specline::CallLogReporter::new());
/// runner.run(&nodes);
/// ```
#[proc_macro]
pub fn bdd_suite(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let suite = syn::parse_macro_input!(input as dsl::Suite);
    codegen::generate_bdd_suite(suite).into()
}
