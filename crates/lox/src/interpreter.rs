//! Tree-walking evaluator. Executes a resolved AST directly against the
//! heap, with no separate compilation step.

use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::builtins;
use crate::class::{self, ClassObj, InstanceObj};
use crate::diagnostics::DiagnosticSink;
use crate::environment::{self, EnvironmentObj};
use crate::error::{RunResult, RuntimeError, Signal};
use crate::function::FunctionObj;
use crate::heap::{Heap, HeapData, HeapId};
use crate::io::PrintWriter;
use crate::runtime::Runtime;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Runs a parsed, resolved program to completion against `runtime`'s
/// existing global scope. A runtime error aborts the remaining top-level
/// statements, matching a script crashing partway through; diagnostics for
/// it are reported through `sink` rather than propagated, since the CLI and
/// test harness both just need the outcome.
pub fn run(runtime: &mut Runtime, statements: &[Stmt], sink: &mut dyn DiagnosticSink, print: &mut dyn PrintWriter) {
    let mut interpreter = Interpreter { heap: &mut runtime.heap, print };
    let globals = runtime.globals;
    for stmt in statements {
        match interpreter.execute(stmt, globals) {
            Ok(_) => {}
            Err(err) => {
                sink.runtime(&err.token, &err.message);
                return;
            }
        }
        interpreter.heap.collect(&[globals]);
    }
}

struct Interpreter<'h> {
    heap: &'h mut Heap,
    print: &'h mut dyn PrintWriter,
}

impl<'h> Interpreter<'h> {
    fn execute_block(&mut self, statements: &[Stmt], env: HeapId) -> RunResult<Signal> {
        for stmt in statements {
            match self.execute(stmt, env)? {
                Signal::None => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::None)
    }

    fn execute(&mut self, stmt: &Stmt, env: HeapId) -> RunResult<Signal> {
        match stmt {
            Stmt::Block(body) => {
                let child = self.new_scope(env);
                self.execute_block(body, child)
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
                Ok(Signal::None)
            }
            Stmt::If { cond, then_branch, else_branch } => {
                if self.evaluate(cond, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Signal::None)
                }
            }
            Stmt::For { init, cond, incr, body } => self.execute_for(init, cond, incr, body, env),
            Stmt::Return { value, .. } => {
                let result = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(result))
            }
            Stmt::Var { name, init } => {
                let value = match init {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                self.define(env, &name.lexeme, value);
                Ok(Signal::None)
            }
            Stmt::Fun(decl) => {
                let function = FunctionObj::User { decl: Rc::clone(decl), closure: env, is_initializer: false };
                let id = self.heap.allocate(HeapData::Function(function));
                self.define(env, &decl.name.lexeme, Value::Function(id));
                Ok(Signal::None)
            }
            Stmt::Class { name, superclass, methods } => {
                self.execute_class(name, superclass.as_ref(), methods, env)?;
                Ok(Signal::None)
            }
            Stmt::Break(_) => Ok(Signal::Break),
            Stmt::Continue(_) => Ok(Signal::Continue),
        }
    }

    fn execute_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        cond: &Option<Expr>,
        incr: &Option<Expr>,
        body: &Stmt,
        env: HeapId,
    ) -> RunResult<Signal> {
        let loop_env = self.new_scope(env);
        if let Some(init) = init {
            self.execute(init, loop_env)?;
        }
        loop {
            if let Some(cond) = cond {
                if !self.evaluate(cond, loop_env)?.is_truthy() {
                    break;
                }
            }
            match self.execute(body, loop_env)? {
                Signal::Break => break,
                Signal::Return(value) => return Ok(Signal::Return(value)),
                Signal::Continue | Signal::None => {}
            }
            if let Some(incr) = incr {
                self.evaluate(incr, loop_env)?;
            }
        }
        Ok(Signal::None)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        env: HeapId,
    ) -> RunResult<()> {
        let superclass_id = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr, env)?;
                match value {
                    Value::Class(id) => Some(id),
                    _ => return Err(RuntimeError::new(expr.anchor_token().clone(), "Superclass must be a class.")),
                }
            }
            None => None,
        };

        let method_closure = match superclass_id {
            Some(super_id) => {
                let super_env = self.new_scope(env);
                self.define(super_env, "super", Value::Class(super_id));
                super_env
            }
            None => env,
        };

        let mut method_table = ahash::AHashMap::default();
        for method in methods {
            let function = FunctionObj::User {
                decl: Rc::clone(method),
                closure: method_closure,
                is_initializer: method.name.lexeme == "init",
            };
            let id = self.heap.allocate(HeapData::Function(function));
            method_table.insert(method.name.lexeme.clone(), id);
        }

        let mut class = ClassObj::new(name.lexeme.clone(), superclass_id);
        class.methods = method_table;
        let class_id = self.heap.allocate(HeapData::Class(class));
        self.define(env, &name.lexeme, Value::Class(class_id));
        Ok(())
    }

    fn new_scope(&mut self, enclosing: HeapId) -> HeapId {
        self.heap.allocate(HeapData::Environment(EnvironmentObj::new(Some(enclosing))))
    }

    fn define(&mut self, env: HeapId, name: &str, value: Value) {
        let HeapData::Environment(scope) = self.heap.get_mut(env) else {
            panic!("define: not an environment")
        };
        scope.define(name, value);
    }

    fn evaluate(&mut self, expr: &Expr, env: HeapId) -> RunResult<Value> {
        match expr {
            Expr::Literal(token) => Ok(literal_value(token)),
            Expr::Grouping(inner) => self.evaluate(inner, env),
            Expr::Variable { name, depth } => self.lookup_variable(name, depth.get(), env),
            Expr::Assign { name, value, depth } => {
                let value = self.evaluate(value, env)?;
                if depth.get() == crate::ast::UNRESOLVED {
                    panic!("evaluate: Assign node was never resolved");
                }
                if depth.get() < 0 {
                    environment::assign(self.heap, env, name, value.clone())
                        .map_err(|msg| RuntimeError::new(name.clone(), msg))?;
                } else {
                    environment::assign_at(self.heap, env, depth.get() as usize, &name.lexeme, value.clone());
                }
                Ok(value)
            }
            Expr::Unary { op, right } => self.evaluate_unary(op, right, env),
            Expr::Binary { op, left, right } => self.evaluate_binary(op, left, right, env),
            Expr::Logical { op, left, right } => self.evaluate_logical(op, left, right, env),
            Expr::Call { callee, paren, args } => self.evaluate_call(callee, paren, args, env),
            Expr::Get { object, name } => {
                let receiver = self.evaluate(object, env)?;
                self.get_property(receiver, name)
            }
            Expr::Set { object, name, value } => {
                let receiver = self.evaluate(object, env)?;
                let Value::Instance(id) = receiver else {
                    return Err(RuntimeError::new(name.clone(), "Only instances have fields."));
                };
                let value = self.evaluate(value, env)?;
                class::set_property(self.heap, id, &name.lexeme, value.clone());
                Ok(value)
            }
            Expr::This { keyword, depth } => self.lookup_variable(keyword, depth.get(), env),
            Expr::Super { keyword, method, depth } => self.evaluate_super(keyword, method, depth.get(), env),
        }
    }

    fn lookup_variable(&self, name: &Token, depth: i32, env: HeapId) -> RunResult<Value> {
        if depth == crate::ast::UNRESOLVED {
            panic!("evaluate: variable node was never resolved");
        }
        if depth < 0 {
            environment::get(self.heap, env, name).map_err(|msg| RuntimeError::new(name.clone(), msg))
        } else {
            Ok(environment::get_at(self.heap, env, depth as usize, &name.lexeme))
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr, env: HeapId) -> RunResult<Value> {
        let right = self.evaluate(right, env)?;
        match op.kind {
            TokenKind::Minus => Ok(Value::Number(-number_operand(op, &right)?)),
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only produces '-' and '!' as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, op: &Token, left: &Expr, right: &Expr, env: HeapId) -> RunResult<Value> {
        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;
        match op.kind {
            TokenKind::Minus => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Number(a - b))
            }
            TokenKind::Slash => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Number(a / b))
            }
            TokenKind::Star => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Number(a * b))
            }
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(RuntimeError::new(op.clone(), "Operands must be two numbers or two strings.")),
            },
            TokenKind::Greater => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(a > b))
            }
            TokenKind::GreaterEqual => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }
            TokenKind::Less => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(a < b))
            }
            TokenKind::LessEqual => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }
            TokenKind::EqualEqual => {
                let eq = self.values_equal(&left, &right, op)?;
                Ok(Value::Bool(eq))
            }
            TokenKind::BangEqual => {
                let eq = self.values_equal(&left, &right, op)?;
                Ok(Value::Bool(!eq))
            }
            _ => unreachable!("parser only produces arithmetic/comparison/equality tokens as binary operators"),
        }
    }

    /// Numbers and strings compare by content, every other heap reference by
    /// identity — unless `left` is an instance whose class (or an ancestor)
    /// defines `equals`, in which case that method is called with `right`
    /// and its truthiness is the answer (spec §4.E).
    fn values_equal(&mut self, left: &Value, right: &Value, op: &Token) -> RunResult<bool> {
        if let Value::Instance(id) = left {
            let HeapData::Instance(instance) = self.heap.get(*id) else {
                panic!("values_equal: instance handle is not an instance")
            };
            let class_id = instance.class;
            if let Some(method_id) = ClassObj::find_method(self.heap, class_id, "equals") {
                let bound = self.heap.allocate(HeapData::Function(FunctionObj::BoundMethod { receiver: *id, method: method_id }));
                let result = self.call_function(bound, vec![right.clone()], op)?;
                return Ok(result.is_truthy());
            }
        }
        Ok(left.equals(right))
    }

    fn evaluate_logical(&mut self, op: &Token, left: &Expr, right: &Expr, env: HeapId) -> RunResult<Value> {
        let left = self.evaluate(left, env)?;
        match op.kind {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right, env),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr], env: HeapId) -> RunResult<Value> {
        // List methods are dispatched directly rather than through a bound
        // function value: lists aren't `ClassObj` instances.
        if let Expr::Get { object, name } = callee {
            let receiver = self.evaluate(object, env)?;
            if let Value::List(list_id) = receiver {
                let args = self.evaluate_args(args, env)?;
                return builtins::list::call_method(self.heap, list_id, &name.lexeme, &args).map_err(|err| match err
                {
                    Some(msg) => RuntimeError::new(paren.clone(), msg),
                    None => RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)),
                });
            }
            let callee_value = self.get_property(receiver, name)?;
            let args = self.evaluate_args(args, env)?;
            return self.call_value(callee_value, args, paren);
        }

        let callee_value = self.evaluate(callee, env)?;
        let args = self.evaluate_args(args, env)?;
        self.call_value(callee_value, args, paren)
    }

    fn evaluate_args(&mut self, args: &[Expr], env: HeapId) -> RunResult<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg, env)).collect()
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> RunResult<Value> {
        match callee {
            Value::Function(id) => self.call_function(id, args, paren),
            Value::Class(id) => self.construct(id, args, paren),
            _ => Err(RuntimeError::new(paren.clone(), "Can only call functions and classes.")),
        }
    }

    fn construct(&mut self, class_id: HeapId, args: Vec<Value>, paren: &Token) -> RunResult<Value> {
        let instance_id = self.heap.allocate(HeapData::Instance(InstanceObj::new(class_id)));
        if let Some(init_id) = ClassObj::find_method(self.heap, class_id, "init") {
            let bound = self.heap.allocate(HeapData::Function(FunctionObj::BoundMethod { receiver: instance_id, method: init_id }));
            self.call_function(bound, args, paren)?;
        } else if !args.is_empty() {
            return Err(RuntimeError::new(paren.clone(), format!("Expected 0 arguments but got {}.", args.len())));
        }
        Ok(Value::Instance(instance_id))
    }

    fn call_function(&mut self, func_id: HeapId, args: Vec<Value>, paren: &Token) -> RunResult<Value> {
        let HeapData::Function(func) = self.heap.get(func_id) else {
            panic!("call_function: handle is not a function")
        };

        match func {
            FunctionObj::Native { func, arity, .. } => {
                let (native, arity) = (*func, *arity);
                if args.len() != arity {
                    return Err(RuntimeError::new(
                        paren.clone(),
                        format!("Expected {arity} arguments but got {}.", args.len()),
                    ));
                }
                native(self.heap, self.print, &args).map_err(|msg| RuntimeError::new(paren.clone(), msg))
            }
            FunctionObj::User { decl, closure, is_initializer } => {
                let decl = Rc::clone(decl);
                let closure = *closure;
                let is_initializer = *is_initializer;
                self.invoke_user_function(&decl, closure, args, paren, is_initializer, None)
            }
            FunctionObj::BoundMethod { receiver, method } => {
                let receiver = *receiver;
                let HeapData::Function(inner) = self.heap.get(*method) else {
                    panic!("call_function: bound method target is not a function")
                };
                let FunctionObj::User { decl, closure, is_initializer } = inner else {
                    panic!("call_function: bound method target is not a user function")
                };
                let decl = Rc::clone(decl);
                let closure = *closure;
                let is_initializer = *is_initializer;
                let call_closure = self.new_scope(closure);
                self.define(call_closure, "this", Value::Instance(receiver));
                self.invoke_user_function(&decl, call_closure, args, paren, is_initializer, Some(receiver))
            }
        }
    }

    fn invoke_user_function(
        &mut self,
        decl: &FunctionDecl,
        closure: HeapId,
        args: Vec<Value>,
        paren: &Token,
        is_initializer: bool,
        receiver: Option<HeapId>,
    ) -> RunResult<Value> {
        if args.len() != decl.params.len() {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {} arguments but got {}.", decl.params.len(), args.len()),
            ));
        }

        let frame = self.new_scope(closure);
        for (param, arg) in decl.params.iter().zip(args) {
            self.define(frame, &param.lexeme, arg);
        }

        let signal = self.execute_block(&decl.body, frame)?;

        if is_initializer {
            return Ok(Value::Instance(receiver.expect("invoke_user_function: initializer without a receiver")));
        }
        match signal {
            Signal::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }

    fn get_property(&mut self, receiver: Value, name: &Token) -> RunResult<Value> {
        match receiver {
            Value::Instance(id) => {
                class::get_property(self.heap, id, &name.lexeme).map_err(|msg| RuntimeError::new(name.clone(), msg))
            }
            _ => Err(RuntimeError::new(name.clone(), "Only instances have properties.")),
        }
    }

    fn evaluate_super(&mut self, keyword: &Token, method: &Token, depth: i32, env: HeapId) -> RunResult<Value> {
        if depth == crate::ast::UNRESOLVED {
            panic!("evaluate: super node was never resolved");
        }
        let super_distance = depth as usize;
        let superclass = environment::get_at(self.heap, env, super_distance, "super");
        let Value::Class(super_id) = superclass else {
            panic!("evaluate_super: 'super' binding is not a class")
        };
        let this_distance = super_distance - 1;
        let this_value = environment::get_at(self.heap, env, this_distance, "this");
        let Value::Instance(receiver) = this_value else {
            panic!("evaluate_super: 'this' binding is not an instance")
        };

        match ClassObj::find_method(self.heap, super_id, &method.lexeme) {
            Some(method_id) => {
                let bound = self.heap.allocate(HeapData::Function(FunctionObj::BoundMethod { receiver, method: method_id }));
                Ok(Value::Function(bound))
            }
            None => Err(RuntimeError::new(method.clone(), format!("Undefined property '{}'.", method.lexeme))),
        }
    }
}

fn number_operand(op: &Token, value: &Value) -> RunResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new(op.clone(), "Operand must be a number.")),
    }
}

/// Checks both operands of a binary arithmetic/comparison operator at once,
/// reporting the plural message spec §7 reserves for two-operand checks
/// (distinct from unary's singular "Operand must be a number.").
fn number_operands(op: &Token, left: &Value, right: &Value) -> RunResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(op.clone(), "Operands must be numbers.")),
    }
}

/// Converts a scanned literal token into its runtime value. Numbers and
/// strings are parsed lazily here rather than at scan time, keeping the
/// scanner ignorant of the value model.
fn literal_value(token: &Token) -> Value {
    match token.kind {
        TokenKind::True => Value::Bool(true),
        TokenKind::False => Value::Bool(false),
        TokenKind::Nil => Value::Nil,
        TokenKind::Number => Value::Number(token.lexeme.parse().expect("scanner only emits well-formed numbers")),
        TokenKind::String => Value::string(token.lexeme[1..token.lexeme.len() - 1].to_string()),
        other => unreachable!("parser only produces literal tokens of kind true/false/nil/number/string, got {other:?}"),
    }
}
