//! Native functions installed into every script's global scope, one
//! submodule per builtin.

pub mod clock;
pub mod list;
pub mod print;

use crate::function::NativeFn;

/// A native function's name, fixed arity, and implementation, bundled so
/// [`crate::runtime::Runtime::new`] can install it in one call.
pub struct NativeSpec {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}
