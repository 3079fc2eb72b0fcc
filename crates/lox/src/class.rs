//! Classes and instances: single inheritance with late-bound method lookup.

use ahash::AHashMap;

use crate::heap::{Heap, HeapData, HeapId};
use crate::value::Value;

#[derive(Debug)]
pub struct ClassObj {
    pub name: String,
    pub superclass: Option<HeapId>,
    pub methods: AHashMap<String, HeapId>,
}

impl ClassObj {
    pub fn new(name: impl Into<String>, superclass: Option<HeapId>) -> Self {
        Self { name: name.into(), superclass, methods: AHashMap::default() }
    }

    /// Looks up `name` in this class's own method table, then its
    /// superclass chain. Late-bound: called fresh on every property access
    /// rather than cached, so redefining a class at runtime (not exposed to
    /// Lox source, but relied on by the built-in class table) is visible
    /// immediately.
    pub fn find_method(heap: &Heap, class_id: HeapId, name: &str) -> Option<HeapId> {
        let mut current = Some(class_id);
        while let Some(id) = current {
            let HeapData::Class(class) = heap.get(id) else {
                panic!("find_method: not a class")
            };
            if let Some(method_id) = class.methods.get(name) {
                return Some(*method_id);
            }
            current = class.superclass;
        }
        None
    }

    pub(crate) fn enumerate_children(&self, out: &mut Vec<HeapId>) {
        if let Some(id) = self.superclass {
            out.push(id);
        }
        out.extend(self.methods.values());
    }

    pub(crate) fn reclaim(&mut self) {
        self.superclass = None;
        self.methods.clear();
    }
}

#[derive(Debug)]
pub struct InstanceObj {
    pub class: HeapId,
    pub fields: AHashMap<String, Value>,
}

impl InstanceObj {
    pub fn new(class: HeapId) -> Self {
        Self { class, fields: AHashMap::default() }
    }

    pub(crate) fn enumerate_children(&self, out: &mut Vec<HeapId>) {
        out.push(self.class);
        for value in self.fields.values() {
            if let Some(id) = value.heap_id() {
                out.push(id);
            }
        }
    }

    pub(crate) fn reclaim(&mut self) {
        self.fields.clear();
    }
}

/// Reads a field first, then falls back to a bound method, per spec §4.F.
/// Returns the new `BoundMethod` heap id it allocates on the method path.
pub fn get_property(heap: &mut Heap, instance_id: HeapId, name: &str) -> Result<Value, String> {
    let HeapData::Instance(instance) = heap.get(instance_id) else {
        panic!("get_property: not an instance")
    };
    if let Some(value) = instance.fields.get(name) {
        return Ok(value.clone());
    }
    let class_id = instance.class;

    match ClassObj::find_method(heap, class_id, name) {
        Some(method_id) => {
            let bound = crate::function::FunctionObj::BoundMethod { receiver: instance_id, method: method_id };
            let bound_id = heap.allocate(HeapData::Function(bound));
            Ok(Value::Function(bound_id))
        }
        None => Err(format!("Undefined property '{name}'.")),
    }
}

pub fn set_property(heap: &mut Heap, instance_id: HeapId, name: &str, value: Value) {
    let HeapData::Instance(instance) = heap.get_mut(instance_id) else {
        panic!("set_property: not an instance")
    };
    instance.fields.insert(name.to_string(), value);
}
