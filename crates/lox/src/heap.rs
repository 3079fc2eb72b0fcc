//! The mark-and-sweep garbage collector: a non-moving arena of
//! heterogeneous traceable objects, addressed by small integer handles.
//!
//! Environments, classes, functions, instances, and lists all live here
//! because they reference each other through ownership cycles (closures
//! over environments, classes over methods over closures, instances over
//! class-bound methods) that plain reference counting can't reclaim.
//! Handles (`HeapId`) stay valid across collections — the heap never moves
//! an object while it's alive — because the AST holds no back-pointers into
//! it that a moving collector would need to update.

use crate::class::{ClassObj, InstanceObj};
use crate::environment::EnvironmentObj;
use crate::function::FunctionObj;
use crate::value::Value;

/// A handle into the heap arena. Stable across collections.
pub type HeapId = usize;

/// The payload stored at a single heap slot.
#[derive(Debug)]
pub enum HeapData {
    Environment(EnvironmentObj),
    Class(ClassObj),
    Function(FunctionObj),
    Instance(InstanceObj),
    List(Vec<Value>),
}

impl HeapData {
    /// Pushes every `HeapId` this object directly references onto `out`.
    ///
    /// This is the GC's only way to walk the object graph: it is what makes
    /// step 3 ("mark") of [`Heap::collect`] able to follow cycles without
    /// the object itself knowing it's being traced.
    fn enumerate_children(&self, out: &mut Vec<HeapId>) {
        match self {
            HeapData::Environment(env) => env.enumerate_children(out),
            HeapData::Class(class) => class.enumerate_children(out),
            HeapData::Function(func) => func.enumerate_children(out),
            HeapData::Instance(instance) => instance.enumerate_children(out),
            HeapData::List(items) => {
                for item in items {
                    if let Some(id) = item.heap_id() {
                        out.push(id);
                    }
                }
            }
        }
    }

    /// Severs this object's outgoing edges so that, once every unreachable
    /// object in a sweep has been reclaimed, the remaining reference graph
    /// is acyclic. Cheap and idempotent; called exactly once per object,
    /// right before it is dropped.
    fn reclaim(&mut self) {
        match self {
            HeapData::Environment(env) => env.reclaim(),
            HeapData::Class(class) => class.reclaim(),
            HeapData::Function(func) => func.reclaim(),
            HeapData::Instance(instance) => instance.reclaim(),
            HeapData::List(items) => items.clear(),
        }
    }
}

struct Slot {
    reachable: bool,
    data: HeapData,
}

/// Owns every traceable object created during an interpreter run.
#[derive(Default)]
pub struct Heap {
    slots: Vec<Option<Slot>>,
    /// Indices of freed slots, reused by the next `allocate` call so that
    /// long-running scripts don't grow the arena unboundedly between
    /// collections.
    free: Vec<HeapId>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new heap object, returning its handle.
    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let slot = Some(Slot { reachable: false, data });
        if let Some(id) = self.free.pop() {
            self.slots[id] = slot;
            id
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id].as_ref().expect("Heap::get: slot already freed").data
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id].as_mut().expect("Heap::get_mut: slot already freed").data
    }

    /// The number of live objects in the arena, exposed for GC tests that
    /// check the heap converges back to a baseline after collection.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Runs one full mark-and-sweep, rooted at `roots`, and returns the
    /// number of objects reclaimed.
    ///
    /// 1. Snapshot every still-occupied slot.
    /// 2. Unmark it.
    /// 3. Mark everything reachable from `roots`, following
    ///    `enumerate_children` and never revisiting an already-marked
    ///    object (this is what lets cycles terminate).
    /// 4. Reclaim and drop everything left unmarked.
    pub fn collect(&mut self, roots: &[HeapId]) -> usize {
        for slot in self.slots.iter_mut().flatten() {
            slot.reachable = false;
        }

        let mut stack: Vec<HeapId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots[id].as_mut() else { continue };
            if slot.reachable {
                continue;
            }
            slot.reachable = true;
            slot.data.enumerate_children(&mut stack);
        }

        let mut reclaimed = 0;
        for (id, slot) in self.slots.iter_mut().enumerate() {
            let is_garbage = matches!(slot, Some(s) if !s.reachable);
            if is_garbage {
                let mut freed = slot.take().unwrap();
                freed.data.reclaim();
                self.free.push(id);
                reclaimed += 1;
            }
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_reuses_freed_slots() {
        let mut heap = Heap::new();
        let a = heap.allocate(HeapData::List(Vec::new()));
        heap.collect(&[]);
        let b = heap.allocate(HeapData::List(Vec::new()));
        assert_eq!(a, b);
    }

    #[test]
    fn collect_with_no_roots_reclaims_everything() {
        let mut heap = Heap::new();
        heap.allocate(HeapData::List(Vec::new()));
        heap.allocate(HeapData::List(Vec::new()));
        assert_eq!(heap.collect(&[]), 2);
        assert_eq!(heap.live_count(), 0);
    }

    #[test]
    fn collect_keeps_transitively_reachable_objects() {
        let mut heap = Heap::new();
        let inner = heap.allocate(HeapData::List(vec![Value::Number(1.0)]));
        let outer = heap.allocate(HeapData::List(vec![Value::List(inner)]));
        assert_eq!(heap.collect(&[outer]), 0);
        assert_eq!(heap.live_count(), 2);
    }
}
