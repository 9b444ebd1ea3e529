//! Scope stack: the names of the `describe`/`context` blocks currently open.

use std::ops::{Deref, DerefMut};

/// An ordered stack of open scope names, innermost last.
///
/// Pushes and pops must be matched. Prefer [`ScopeStack::enter`], which
/// returns a guard that pops on every exit path, including unwinding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScopeStack {
    names: Vec<String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Remove and return the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty. An unmatched pop is a traversal defect.
    pub fn pop(&mut self) -> String {
        self.names
            .pop()
            .expect("specline: scope stack popped more times than it was pushed")
    }

    /// Scope names joined by a single space, outermost first.
    pub fn current_path(&self) -> String {
        self.names.join(" ")
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Push `name` and return a guard that pops it when dropped.
    pub fn enter(&mut self, name: impl Into<String>) -> ScopeGuard<'_> {
        self.push(name);
        ScopeGuard { stack: self }
    }
}

/// Pops the scope it was created for on drop.
///
/// Dereferences to the underlying [`ScopeStack`], so nested scopes are
/// entered through the guard.
pub struct ScopeGuard<'a> {
    stack: &'a mut ScopeStack,
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &ScopeStack {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn empty_stack_has_empty_path() {
        let stack = ScopeStack::new();
        assert_eq!(stack.current_path(), "");
        assert!(stack.is_empty());
    }

    #[test]
    fn path_joins_open_scopes_in_order() {
        let mut stack = ScopeStack::new();
        stack.push("Calculator");
        stack.push("with negative numbers");
        assert_eq!(stack.current_path(), "Calculator with negative numbers");

        assert_eq!(stack.pop(), "with negative numbers");
        stack.push("dividing");
        assert_eq!(stack.current_path(), "Calculator dividing");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.iter().collect::<Vec<_>>(), ["Calculator", "dividing"]);
    }

    #[test]
    fn pop_on_empty_stack_panics() {
        let result = catch_unwind(|| {
            let mut stack = ScopeStack::new();
            stack.pop();
        });
        assert!(result.is_err());
    }

    #[test]
    fn guard_pops_on_scope_exit() {
        let mut stack = ScopeStack::new();
        {
            let mut outer = stack.enter("outer");
            {
                let inner = outer.enter("inner");
                assert_eq!(inner.current_path(), "outer inner");
            }
            assert_eq!(outer.current_path(), "outer");
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn guard_pops_when_unwinding() {
        let mut stack = ScopeStack::new();
        stack.push("root");

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = stack.enter("boom");
            panic!("scope setup failed");
        }));

        assert!(result.is_err());
        assert_eq!(stack.current_path(), "root");
    }
}
