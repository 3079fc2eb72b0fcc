//! The three shapes a callable `Value::Function` can take: a user-defined
//! closure, a native (host-implemented) function, and a bound method.

use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::heap::{Heap, HeapData, HeapId};
use crate::io::PrintWriter;
use crate::value::Value;

/// A native function's implementation. Takes the heap (native `List`
/// methods need it), the program's output sink (only `print` uses it), and
/// the already-evaluated argument list, and returns either a value or an
/// error message (wrapped into a [`crate::error::RuntimeError`] by the
/// caller, which has the call-site token).
pub type NativeFn = fn(&mut Heap, &mut dyn PrintWriter, &[Value]) -> Result<Value, String>;

#[derive(Debug)]
pub enum FunctionObj {
    /// A `fun` declaration or method, closed over the environment it was
    /// declared in.
    User {
        decl: Rc<FunctionDecl>,
        closure: HeapId,
        /// `init` methods return the bound instance regardless of their
        /// `return` statements, and bare `return;` is legal inside them
        /// (spec §4.F).
        is_initializer: bool,
    },
    Native {
        name: &'static str,
        arity: usize,
        func: NativeFn,
    },
    /// A method value produced by `instance.method` property access: the
    /// method closed over an environment whose enclosing scope binds `this`
    /// to `receiver` (spec §3).
    BoundMethod {
        receiver: HeapId,
        method: HeapId,
    },
}

impl FunctionObj {
    pub fn name(&self, heap: &Heap) -> String {
        match self {
            FunctionObj::User { decl, .. } => decl.name.lexeme.clone(),
            FunctionObj::Native { name, .. } => (*name).to_string(),
            FunctionObj::BoundMethod { method, .. } => {
                let HeapData::Function(inner) = heap.get(*method) else {
                    panic!("BoundMethod::name: method handle is not a function")
                };
                inner.name(heap)
            }
        }
    }

    pub fn arity(&self, heap: &Heap) -> usize {
        match self {
            FunctionObj::User { decl, .. } => decl.params.len(),
            FunctionObj::Native { arity, .. } => *arity,
            FunctionObj::BoundMethod { method, .. } => {
                let HeapData::Function(inner) = heap.get(*method) else {
                    panic!("BoundMethod::arity: method handle is not a function")
                };
                inner.arity(heap)
            }
        }
    }

    pub(crate) fn enumerate_children(&self, out: &mut Vec<HeapId>) {
        match self {
            FunctionObj::User { closure, .. } => out.push(*closure),
            FunctionObj::Native { .. } => {}
            FunctionObj::BoundMethod { receiver, method } => {
                out.push(*receiver);
                out.push(*method);
            }
        }
    }

    /// No owned collections to clear; the object is dropped immediately
    /// after this call, so there is nothing to sever.
    pub(crate) fn reclaim(&mut self) {}
}
