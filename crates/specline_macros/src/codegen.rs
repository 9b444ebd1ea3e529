//! Code generation: transforms the DSL AST into a `specline` spec tree.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::dsl::*;

// ============================================================================
// Public entry points
// ============================================================================

/// Generate a `fn main()` that builds the spec tree and runs it.
pub fn generate_bdd(suite: Suite) -> TokenStream {
    let tree_nodes = generate_items(&suite.items, &Inherited::default());

    quote! {
        fn main() {
            let nodes: Vec<specline::runner::TestNode> = vec![#(#tree_nodes),*];
            specline::runner::run_main(nodes);
        }
    }
}

/// Generate just the spec tree (no `fn main()`), for custom runners.
pub fn generate_bdd_suite(suite: Suite) -> TokenStream {
    let tree_nodes = generate_items(&suite.items, &Inherited::default());

    quote! {
        {
            let nodes: Vec<specline::runner::TestNode> = vec![#(#tree_nodes),*];
            nodes
        }
    }
}

// ============================================================================
// Generation context: tracks inherited hooks
// ============================================================================

#[derive(Default, Clone)]
struct Inherited {
    /// Accumulated before_each blocks (outermost first).
    before_each: Vec<TokenStream>,
    /// Accumulated after_each blocks (outermost first).
    after_each: Vec<TokenStream>,
}

impl Inherited {
    /// Hooks of `items` apply to every spec in the block, wherever they appear.
    fn child(&self, items: &[DslItem]) -> Self {
        let mut child = self.clone();
        for item in items {
            match item {
                DslItem::BeforeEach(hook) => child.before_each.push(hook.body.clone()),
                DslItem::AfterEach(hook) => child.after_each.push(hook.body.clone()),
                _ => {}
            }
        }
        child
    }
}

// ============================================================================
// Item generation
// ============================================================================

/// Generate `TestNode` constructors for a list of DSL items.
fn generate_items(items: &[DslItem], parent: &Inherited) -> Vec<TokenStream> {
    let inherited = parent.child(items);
    let mut nodes = Vec::new();

    for item in items {
        match item {
            DslItem::BeforeEach(_) | DslItem::AfterEach(_) => {}
            DslItem::Describe(block) => {
                let name = &block.name;
                let child_nodes = generate_items(&block.items, &inherited);
                nodes.push(quote! {
                    specline::runner::TestNode::describe(#name, vec![#(#child_nodes),*])
                });
            }
            DslItem::It(block) => nodes.push(generate_it(block, &inherited)),
        }
    }

    nodes
}

fn generate_it(block: &ItBlock, inherited: &Inherited) -> TokenStream {
    let name = &block.name;
    let body = &block.body;
    let be = &inherited.before_each;

    // Guards drop in reverse declaration order, so the innermost
    // after_each runs first.
    let after_guards: Vec<TokenStream> = inherited
        .after_each
        .iter()
        .enumerate()
        .map(|(i, ab)| {
            let guard_name = Ident::new(&format!("_after_each_guard_{i}"), Span::call_site());
            quote! {
                let #guard_name = specline::Guard::new(|| { #ab });
            }
        })
        .collect();

    quote! {
        specline::runner::TestNode::it(#name, || -> specline::TestResult {
            #(#be)*
            #(#after_guards)*
            specline::IntoTestResult::into_test_result({ #body })
        })
    }
}
