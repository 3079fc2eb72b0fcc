//! Owns the heap and the global scope, and wires up the native functions
//! and built-in classes every script starts with.

use crate::class::ClassObj;
use crate::environment::EnvironmentObj;
use crate::function::FunctionObj;
use crate::heap::{Heap, HeapData, HeapId};
use crate::value::Value;
use crate::{builtins, environment};

/// The scalar/reference kinds that get a nominal built-in class, besides
/// `Object` (the root) and `List` (which has its own native constructor in
/// [`builtins::list`]). These exist so every value's "kind" is nameable from
/// Lox source, matching spec §6's built-in-globals list; none declare
/// methods of their own.
const BUILTIN_CLASS_NAMES: &[&str] = &["Nil", "Bool", "Number", "String", "Function"];

/// Everything a freshly started script needs: a heap with the global
/// environment already allocated and the native functions and built-in
/// classes already bound into it.
pub struct Runtime {
    pub heap: Heap,
    pub globals: HeapId,
}

impl Runtime {
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let globals = heap.allocate(HeapData::Environment(EnvironmentObj::new(None)));
        let mut runtime = Self { heap, globals };
        runtime.install_native(builtins::clock::SPEC);
        runtime.install_native(builtins::print::SPEC);
        runtime.install_native(builtins::list::SPEC);
        runtime.install_builtin_classes();
        runtime
    }

    fn install_native(&mut self, spec: builtins::NativeSpec) {
        let id = self.heap.allocate(HeapData::Function(FunctionObj::Native {
            name: spec.name,
            arity: spec.arity,
            func: spec.func,
        }));
        let HeapData::Environment(globals) = self.heap.get_mut(self.globals) else {
            unreachable!("Runtime::new: globals handle is not an environment")
        };
        globals.define(spec.name, Value::Function(id));
    }

    /// Installs the nominal `Object` root class and its direct children
    /// (`Nil`, `Bool`, `Number`, `String`, `Function`) as globals. Lox source
    /// never calls these (there's nothing for `Object()` to construct that
    /// the evaluator treats specially), but they give every value's kind a
    /// name reachable from global scope, per spec §6.
    fn install_builtin_classes(&mut self) {
        let object_id = self.heap.allocate(HeapData::Class(ClassObj::new("Object", None)));
        self.define_global("Object", Value::Class(object_id));
        for name in BUILTIN_CLASS_NAMES {
            let id = self.heap.allocate(HeapData::Class(ClassObj::new(*name, Some(object_id))));
            self.define_global(name, Value::Class(id));
        }
    }

    fn define_global(&mut self, name: &str, value: Value) {
        let HeapData::Environment(globals) = self.heap.get_mut(self.globals) else {
            unreachable!("Runtime::new: globals handle is not an environment")
        };
        globals.define(name, value);
    }

    /// Roots for a garbage collection pass taken between top-level
    /// statements: the global environment, plus whatever the caller's
    /// currently-live call stack still needs (passed in by the evaluator).
    pub fn collect(&mut self, extra_roots: &[HeapId]) -> usize {
        let mut roots = extra_roots.to_vec();
        roots.push(self.globals);
        self.heap.collect(&roots)
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        let token = crate::token::Token::synthetic(name);
        environment::get(&self.heap, self.globals, &token).ok()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
