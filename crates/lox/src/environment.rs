//! The sole addressable store for variables: a chain of name-to-value
//! scopes. Heap-resident because closures pin the environment they were
//! declared in.

use ahash::AHashMap;

use crate::heap::{Heap, HeapData, HeapId};
use crate::token::Token;
use crate::value::Value;

/// A single scope: an optional enclosing scope plus this scope's bindings.
#[derive(Debug, Default)]
pub struct EnvironmentObj {
    enclosing: Option<HeapId>,
    values: AHashMap<String, Value>,
}

impl EnvironmentObj {
    pub fn new(enclosing: Option<HeapId>) -> Self {
        Self { enclosing, values: AHashMap::default() }
    }

    /// Always succeeds; shadows any existing binding of the same name in
    /// this scope. Whether redefinition is an *error* at local scopes is a
    /// resolver-level policy (spec §4.G), not this method's concern.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    fn get_local(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn assign_local(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else {
            false
        }
    }

    pub(crate) fn enumerate_children(&self, out: &mut Vec<HeapId>) {
        if let Some(id) = self.enclosing {
            out.push(id);
        }
        for value in self.values.values() {
            if let Some(id) = value.heap_id() {
                out.push(id);
            }
        }
    }

    pub(crate) fn reclaim(&mut self) {
        self.enclosing = None;
        self.values.clear();
    }
}

/// Reads a name directly out of `env_id`'s own bindings (no walk up the
/// enclosing chain): this is the path used for every depth `-1` (global)
/// access, so that top-level declarations can be referenced before they
/// textually appear.
pub fn get(heap: &Heap, env_id: HeapId, name: &Token) -> Result<Value, String> {
    let HeapData::Environment(env) = heap.get(env_id) else {
        panic!("get: not an environment")
    };
    env.get_local(&name.lexeme)
        .cloned()
        .ok_or_else(|| format!("Undefined variable '{}'.", name.lexeme))
}

/// Writes `value` into `env_id`'s own bindings. Fails if `name` was never
/// `define`d in this exact scope (assigning to an undeclared global is an
/// error, matching spec §4.D).
pub fn assign(heap: &mut Heap, env_id: HeapId, name: &Token, value: Value) -> Result<(), String> {
    let HeapData::Environment(env) = heap.get_mut(env_id) else {
        panic!("assign: not an environment")
    };
    if env.assign_local(&name.lexeme, value) {
        Ok(())
    } else {
        Err(format!("Undefined variable '{}'.", name.lexeme))
    }
}

/// Ascends `distance` enclosing links from `env_id`, then reads `name` from
/// that exact scope. The resolver guarantees the binding exists there; a
/// miss is an invariant violation, not a user-facing error.
pub fn get_at(heap: &Heap, env_id: HeapId, distance: usize, name: &str) -> Value {
    let target = ancestor(heap, env_id, distance);
    let HeapData::Environment(env) = heap.get(target) else {
        panic!("get_at: not an environment")
    };
    env.get_local(name)
        .cloned()
        .unwrap_or_else(|| panic!("get_at: resolver invariant violated, missing '{name}' at depth {distance}"))
}

/// Ascends `distance` enclosing links from `env_id`, then writes `name` in
/// that exact scope.
pub fn assign_at(heap: &mut Heap, env_id: HeapId, distance: usize, name: &str, value: Value) {
    let target = ancestor(heap, env_id, distance);
    let HeapData::Environment(env) = heap.get_mut(target) else {
        panic!("assign_at: not an environment")
    };
    if !env.assign_local(name, value) {
        panic!("assign_at: resolver invariant violated, missing '{name}' at depth {distance}");
    }
}

fn ancestor(heap: &Heap, env_id: HeapId, distance: usize) -> HeapId {
    let mut current = env_id;
    for _ in 0..distance {
        let HeapData::Environment(env) = heap.get(current) else {
            panic!("ancestor: not an environment")
        };
        current = env.enclosing.expect("ancestor: resolver invariant violated, ran out of enclosing scopes");
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn name(n: &str) -> Token {
        Token::synthetic(n)
    }

    #[test]
    fn get_reads_back_a_defined_value() {
        let mut heap = Heap::new();
        let env = heap.allocate(HeapData::Environment(EnvironmentObj::new(None)));
        let HeapData::Environment(scope) = heap.get_mut(env) else { unreachable!() };
        scope.define("x", Value::Number(1.0));
        assert!(get(&heap, env, &name("x")).unwrap().equals(&Value::Number(1.0)));
    }

    #[test]
    fn get_on_an_undeclared_name_is_an_error() {
        let mut heap = Heap::new();
        let env = heap.allocate(HeapData::Environment(EnvironmentObj::new(None)));
        let err = get(&heap, env, &name("missing")).unwrap_err();
        assert_eq!(err, "Undefined variable 'missing'.");
    }

    #[test]
    fn assign_only_writes_an_existing_binding_in_this_exact_scope() {
        let mut heap = Heap::new();
        let env = heap.allocate(HeapData::Environment(EnvironmentObj::new(None)));
        let err = assign(&mut heap, env, &name("x"), Value::Number(1.0)).unwrap_err();
        assert_eq!(err, "Undefined variable 'x'.");

        let HeapData::Environment(scope) = heap.get_mut(env) else { unreachable!() };
        scope.define("x", Value::Nil);
        assign(&mut heap, env, &name("x"), Value::Number(2.0)).unwrap();
        assert!(get(&heap, env, &name("x")).unwrap().equals(&Value::Number(2.0)));
    }

    #[test]
    fn get_at_and_assign_at_skip_exactly_distance_ancestors() {
        let mut heap = Heap::new();
        let global = heap.allocate(HeapData::Environment(EnvironmentObj::new(None)));
        let HeapData::Environment(scope) = heap.get_mut(global) else { unreachable!() };
        scope.define("x", Value::Number(1.0));

        let child = heap.allocate(HeapData::Environment(EnvironmentObj::new(Some(global))));
        let grandchild = heap.allocate(HeapData::Environment(EnvironmentObj::new(Some(child))));

        assert!(get_at(&heap, grandchild, 2, "x").equals(&Value::Number(1.0)));
        assign_at(&mut heap, grandchild, 2, "x", Value::Number(9.0));
        assert!(get_at(&heap, grandchild, 2, "x").equals(&Value::Number(9.0)));
    }
}
