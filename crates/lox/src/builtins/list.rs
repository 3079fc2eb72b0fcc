//! `List()` constructs an empty list; `append`/`get`/`set`/`length`/`toString`
//! are its native methods, dispatched directly by the interpreter on property
//! calls against a `Value::List` (lists aren't `ClassObj` instances, so they
//! bypass the user-method lookup path entirely).

use crate::heap::{Heap, HeapData, HeapId};
use crate::io::PrintWriter;
use crate::value::{self, Value};

use super::NativeSpec;

pub const SPEC: NativeSpec = NativeSpec { name: "List", arity: 0, func: call };

fn call(heap: &mut Heap, _print: &mut dyn PrintWriter, _args: &[Value]) -> Result<Value, String> {
    let id = heap.allocate(HeapData::List(Vec::new()));
    Ok(Value::List(id))
}

/// Dispatches a native method call against the list at `list_id`.
/// `Err(None)` means `method` isn't a recognized list method at all (the
/// caller reports "undefined property"); `Err(Some(msg))` is a normal
/// runtime error (wrong arity). Bad indices are not errors: `get`/`set`
/// report them through their own Nil/Bool return values (spec §6).
pub fn call_method(heap: &mut Heap, list_id: HeapId, method: &str, args: &[Value]) -> Result<Value, Option<String>> {
    match method {
        "append" => {
            require_arity(method, args, 1)?;
            let HeapData::List(items) = heap.get_mut(list_id) else {
                panic!("call_method: list handle is not a list")
            };
            items.push(args[0].clone());
            Ok(args[0].clone())
        }
        "length" => {
            require_arity(method, args, 0)?;
            let HeapData::List(items) = heap.get(list_id) else {
                panic!("call_method: list handle is not a list")
            };
            Ok(Value::Number(items.len() as f64))
        }
        "get" => {
            require_arity(method, args, 1)?;
            let HeapData::List(items) = heap.get(list_id) else {
                panic!("call_method: list handle is not a list")
            };
            Ok(index_arg(&args[0]).and_then(|i| items.get(i)).cloned().unwrap_or(Value::Nil))
        }
        "set" => {
            require_arity(method, args, 2)?;
            let HeapData::List(items) = heap.get_mut(list_id) else {
                panic!("call_method: list handle is not a list")
            };
            match index_arg(&args[0]).and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    *slot = args[1].clone();
                    Ok(Value::Bool(true))
                }
                None => Ok(Value::Bool(false)),
            }
        }
        "toString" => {
            require_arity(method, args, 0)?;
            Ok(Value::string(value::stringify(heap, &Value::List(list_id))))
        }
        _ => Err(None),
    }
}

fn require_arity(method: &str, args: &[Value], expected: usize) -> Result<(), Option<String>> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Some(format!("'{method}' expects {expected} argument(s) but got {}.", args.len())))
    }
}

/// A list index is a non-negative integral `Number`; anything else (a
/// negative number, a fraction, or a non-number) simply doesn't address any
/// element, which `get`/`set` treat the same as an out-of-range index.
fn index_arg(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        _ => None,
    }
}
