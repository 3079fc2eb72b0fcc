//! Static scope resolution: a pass over the parsed tree that, for every
//! variable reference, counts how many enclosing scopes to ascend before
//! the binding is found and stamps that count onto the AST node's `depth`
//! cell. Catches a handful of errors that are easiest to see statically
//! (bad `return`/`this`/`super`/`break`/`continue` placement, self-referential
//! initializers) before the evaluator ever runs.

use ahash::AHashMap;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::diagnostics::DiagnosticSink;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// `true` once a declared name has also been `define`d; `false` means it's
/// declared but its initializer is still being resolved, which is what lets
/// `resolve_local` catch `var a = a;` (spec §4.G).
type Scope = AHashMap<String, bool>;

pub struct Resolver<'a> {
    scopes: Vec<Scope>,
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> Resolver<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            sink,
        }
    }

    pub fn resolve(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.contains_key(&name.lexeme) {
            self.sink.resolve(name, "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        scope.insert(name.lexeme.clone(), true);
    }

    /// Walks outward from the innermost scope looking for `name`, and stamps
    /// the ascent count (or `-1` if it's never locally declared, meaning
    /// "look it up dynamically in globals") onto `depth`.
    fn resolve_local(&mut self, depth: &std::cell::Cell<i32>, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                depth.set(i as i32);
                return;
            }
        }
        depth.set(-1);
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => {
                self.begin_scope();
                self.resolve(body);
                self.end_scope();
            }
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::If { cond, then_branch, else_branch } => {
                self.resolve_expr(cond);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::For { init, cond, incr, body } => {
                self.begin_scope();
                if let Some(init) = init {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = cond {
                    self.resolve_expr(cond);
                }
                if let Some(incr) = incr {
                    self.resolve_expr(incr);
                }
                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
                self.end_scope();
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.sink.resolve(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.sink.resolve(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Var { name, init } => {
                self.declare(name);
                if let Some(init) = init {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Fun(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }
            Stmt::Class { name, superclass, methods } => self.resolve_class(name, superclass, methods),
            Stmt::Break(token) => {
                if self.loop_depth == 0 {
                    self.sink.resolve(token, "Can't use 'break' outside of a loop.");
                }
            }
            Stmt::Continue(token) => {
                if self.loop_depth == 0 {
                    self.sink.resolve(token, "Can't use 'continue' outside of a loop.");
                }
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[std::rc::Rc<FunctionDecl>]) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable { name: super_name, .. }) = superclass {
            if super_name.lexeme == name.lexeme {
                self.sink.resolve(super_name, "A class can't inherit from itself.");
            }
            self.current_class = ClassType::Subclass;
        }
        if let Some(superclass_expr) = superclass {
            self.resolve_expr(superclass_expr);
            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        for method in methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;
        let enclosing_loop_depth = self.loop_depth;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loop_depth;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Assign { name, value, depth } => {
                self.resolve_expr(value);
                self.resolve_local(depth, name);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Literal(_) => {}
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::Super { keyword, depth, .. } => {
                if self.current_class == ClassType::None {
                    self.sink.resolve(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::Subclass {
                    self.sink.resolve(keyword, "Can't use 'super' in a class with no superclass.");
                }
                self.resolve_local(depth, keyword);
            }
            Expr::This { keyword, depth } => {
                if self.current_class == ClassType::None {
                    self.sink.resolve(keyword, "Can't use 'this' outside of a class.");
                }
                self.resolve_local(depth, keyword);
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Variable { name, depth } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.sink.resolve(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(depth, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::diagnostics::CollectingSink;

    /// A bare name-use, as if written at the point this resolver call sits
    /// in the scope stack, with its depth cell unresolved.
    fn variable(name: &str) -> Expr {
        Expr::Variable { name: Token::synthetic(name), depth: Cell::new(crate::ast::UNRESOLVED) }
    }

    fn depth_of(expr: &Expr) -> i32 {
        let Expr::Variable { depth, .. } = expr else { unreachable!() };
        depth.get()
    }

    #[test]
    fn an_undeclared_name_resolves_to_global_depth() {
        let mut sink = CollectingSink::default();
        let mut resolver = Resolver::new(&mut sink);
        let expr = variable("x");
        resolver.resolve_expr(&expr);
        assert_eq!(depth_of(&expr), -1);
    }

    #[test]
    fn a_name_in_the_innermost_scope_resolves_to_depth_zero() {
        let mut sink = CollectingSink::default();
        let mut resolver = Resolver::new(&mut sink);
        resolver.begin_scope();
        resolver.define(&Token::synthetic("x"));
        let expr = variable("x");
        resolver.resolve_expr(&expr);
        assert_eq!(depth_of(&expr), 0);
    }

    #[test]
    fn a_name_two_scopes_out_resolves_to_depth_two() {
        let mut sink = CollectingSink::default();
        let mut resolver = Resolver::new(&mut sink);
        resolver.begin_scope();
        resolver.define(&Token::synthetic("x"));
        resolver.begin_scope();
        resolver.begin_scope();
        let expr = variable("x");
        resolver.resolve_expr(&expr);
        assert_eq!(depth_of(&expr), 2);
    }
}
