//! `clock()` — seconds since the Unix epoch, for benchmarking scripts.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::heap::Heap;
use crate::io::PrintWriter;
use crate::value::Value;

use super::NativeSpec;

pub const SPEC: NativeSpec = NativeSpec { name: "clock", arity: 0, func: call };

fn call(_heap: &mut Heap, _print: &mut dyn PrintWriter, _args: &[Value]) -> Result<Value, String> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| "System clock is set before the Unix epoch.".to_string())?
        .as_secs_f64();
    Ok(Value::Number(secs))
}
