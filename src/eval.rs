use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::ast::{BinOp, Expr, Program, Stmt, UnOp};
use crate::codegen::{ACCUMULATOR, CONTEXT};
use crate::error::RenderError;

/// The name-to-value mapping a render runs against.
///
/// Read-only from the engine's perspective; directives can shadow names with
/// `let` and loop bindings but never write back into the context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Build a context from anything serializable to a JSON object.
    pub fn from_serialize<T: serde::Serialize>(value: T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(value)? {
            Value::Object(data) => Ok(Self { data }),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "context must serialize to an object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

/// Executes a compiled program against one context, collecting output into
/// the accumulator. Built fresh per render; holds no state across calls.
pub(crate) struct Evaluator<'a> {
    context: &'a Context,
    scopes: Vec<HashMap<String, Value>>,
    output: String,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            // Root scope holds top-level `let` bindings.
            scopes: vec![HashMap::new()],
            output: String::new(),
        }
    }

    pub fn run(mut self, program: &Program) -> Result<String, RenderError> {
        self.exec_block(program)?;
        Ok(self.output)
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), RenderError> {
        for stmt in stmts {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), RenderError> {
        match stmt {
            Stmt::Append { target, value } => {
                // The accumulator is the only writable binding. Anything else
                // fails the way an unbound reference would.
                if target != ACCUMULATOR {
                    return Err(RenderError::UndefinedName(target.clone()));
                }
                let val = self.eval_expr(value)?;
                self.output.push_str(&display(&val)?);
                Ok(())
            }
            Stmt::Let { name, value } => {
                let val = self.eval_expr(value)?;
                self.set_local(name.clone(), val);
                Ok(())
            }
            Stmt::If { cases, else_body } => {
                for (condition, body) in cases {
                    if is_truthy(&self.eval_expr(condition)?) {
                        return self.exec_scoped(body);
                    }
                }
                match else_body {
                    Some(body) => self.exec_scoped(body),
                    None => Ok(()),
                }
            }
            Stmt::For {
                target,
                iterable,
                body,
            } => {
                let items = match self.eval_expr(iterable)? {
                    Value::Array(items) => items,
                    // Objects iterate their keys.
                    Value::Object(map) => map.keys().cloned().map(Value::String).collect(),
                    // A null iterable loops zero times.
                    Value::Null => Vec::new(),
                    other => {
                        return Err(RenderError::Type(format!(
                            "cannot iterate over a {} value",
                            kind_of(&other)
                        )))
                    }
                };

                let len = items.len();
                for (i, item) in items.into_iter().enumerate() {
                    self.push_scope();
                    self.set_local(target.clone(), item);

                    let mut loop_map = Map::new();
                    loop_map.insert("index0".to_string(), Value::from(i));
                    loop_map.insert("index".to_string(), Value::from(i + 1));
                    loop_map.insert("first".to_string(), Value::Bool(i == 0));
                    loop_map.insert("last".to_string(), Value::Bool(i + 1 == len));
                    self.set_local("loop".to_string(), Value::Object(loop_map));

                    let result = self.exec_block(body);
                    self.pop_scope();
                    result?;
                }
                Ok(())
            }
        }
    }

    fn exec_scoped(&mut self, stmts: &[Stmt]) -> Result<(), RenderError> {
        self.push_scope();
        let result = self.exec_block(stmts);
        self.pop_scope();
        result
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn set_local(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Innermost scope first, then the context parameter name (the whole
    /// context object), then the context's own top-level keys.
    fn lookup(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(val) = scope.get(name) {
                return Some(val.clone());
            }
        }
        if name == CONTEXT {
            return Some(Value::Object(self.context.data.clone()));
        }
        self.context.data.get(name).cloned()
    }

    fn eval_expr(&self, expr: &Expr) -> Result<Value, RenderError> {
        match expr {
            Expr::StringLit(s) => Ok(Value::String(s.clone())),
            Expr::IntLit(n) => Ok(Value::from(*n)),
            Expr::FloatLit(n) => Ok(Value::from(*n)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::NullLit => Ok(Value::Null),
            Expr::Var(name) => self
                .lookup(name)
                .ok_or_else(|| RenderError::UndefinedName(name.clone())),
            Expr::Attribute(obj, attr) => match self.eval_expr(obj)? {
                Value::Object(map) => map
                    .get(attr)
                    .cloned()
                    .ok_or_else(|| RenderError::Attribute(attr.clone())),
                other => Err(RenderError::Type(format!(
                    "cannot read attribute `{}` of a {} value",
                    attr,
                    kind_of(&other)
                ))),
            },
            Expr::Index(obj, idx) => {
                let val = self.eval_expr(obj)?;
                let idx_val = self.eval_expr(idx)?;
                match (val, idx_val) {
                    (Value::Object(map), Value::String(key)) => map
                        .get(&key)
                        .cloned()
                        .ok_or(RenderError::Attribute(key)),
                    (Value::Array(items), Value::Number(n)) => {
                        let index = n.as_i64().ok_or_else(|| {
                            RenderError::Type("array index must be an integer".to_string())
                        })?;
                        let len = items.len();
                        usize::try_from(index)
                            .ok()
                            .and_then(|i| items.get(i).cloned())
                            .ok_or(RenderError::Index { index, len })
                    }
                    (val, idx_val) => Err(RenderError::Type(format!(
                        "cannot index a {} value with a {} key",
                        kind_of(&val),
                        kind_of(&idx_val)
                    ))),
                }
            }
            Expr::Unary(op, inner) => {
                let val = self.eval_expr(inner)?;
                match op {
                    UnOp::Not => Ok(Value::Bool(!is_truthy(&val))),
                    UnOp::Neg => neg(&val),
                }
            }
            Expr::BinOp(lhs, op, rhs) => {
                // `and`/`or` short-circuit before the right side is touched.
                match op {
                    BinOp::And => {
                        let l = self.eval_expr(lhs)?;
                        if !is_truthy(&l) {
                            return Ok(Value::Bool(false));
                        }
                        let r = self.eval_expr(rhs)?;
                        return Ok(Value::Bool(is_truthy(&r)));
                    }
                    BinOp::Or => {
                        let l = self.eval_expr(lhs)?;
                        if is_truthy(&l) {
                            return Ok(Value::Bool(true));
                        }
                        let r = self.eval_expr(rhs)?;
                        return Ok(Value::Bool(is_truthy(&r)));
                    }
                    _ => {}
                }

                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                match op {
                    BinOp::Eq => Ok(Value::Bool(values_eq(&l, &r))),
                    BinOp::Ne => Ok(Value::Bool(!values_eq(&l, &r))),
                    BinOp::Lt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Less)),
                    BinOp::Le => Ok(Value::Bool(compare(&l, &r)? != Ordering::Greater)),
                    BinOp::Gt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Greater)),
                    BinOp::Ge => Ok(Value::Bool(compare(&l, &r)? != Ordering::Less)),
                    BinOp::Add => add(l, r),
                    BinOp::Sub => sub(&l, &r),
                    BinOp::And | BinOp::Or => unreachable!("handled above"),
                }
            }
        }
    }
}

pub(crate) fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Display coercion for appended values. Null appends nothing; aggregates
/// have no sensible flat text form and are errors.
fn display(v: &Value) -> Result<String, RenderError> {
    match v {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) => Err(RenderError::Unprintable("array")),
        Value::Object(_) => Err(RenderError::Unprintable("object")),
    }
}

/// Numbers compare numerically across integer/float; everything else is
/// structural.
fn values_eq(l: &Value, r: &Value) -> bool {
    if let (Value::Number(a), Value::Number(b)) = (l, r) {
        if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
            return a == b;
        }
    }
    l == r
}

fn compare(l: &Value, r: &Value) -> Result<Ordering, RenderError> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .ok_or_else(|| RenderError::Type("numbers are not comparable".to_string())),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(RenderError::Type(format!(
            "cannot compare {} with {}",
            kind_of(l),
            kind_of(r)
        ))),
    }
}

/// `+` adds numbers (integer when both sides are integers and the sum fits)
/// and concatenates when either side is a string.
fn add(l: Value, r: Value) -> Result<Value, RenderError> {
    if let (Value::Number(a), Value::Number(b)) = (&l, &r) {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            if let Some(sum) = a.checked_add(b) {
                return Ok(Value::from(sum));
            }
        }
        if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
            return Ok(Value::from(a + b));
        }
    }
    if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
        return Ok(Value::String(format!("{}{}", display(&l)?, display(&r)?)));
    }
    Err(RenderError::Type(format!(
        "cannot add {} and {}",
        kind_of(&l),
        kind_of(&r)
    )))
}

fn sub(l: &Value, r: &Value) -> Result<Value, RenderError> {
    if let (Value::Number(a), Value::Number(b)) = (l, r) {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            if let Some(diff) = a.checked_sub(b) {
                return Ok(Value::from(diff));
            }
        }
        if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
            return Ok(Value::from(a - b));
        }
    }
    Err(RenderError::Type(format!(
        "cannot subtract {} from {}",
        kind_of(r),
        kind_of(l)
    )))
}

fn neg(v: &Value) -> Result<Value, RenderError> {
    if let Value::Number(n) = v {
        if let Some(i) = n.as_i64() {
            if let Some(negated) = i.checked_neg() {
                return Ok(Value::from(negated));
            }
        }
        if let Some(f) = n.as_f64() {
            return Ok(Value::from(-f));
        }
    }
    Err(RenderError::Type(format!(
        "cannot negate a {} value",
        kind_of(v)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &Expr, ctx: &Context) -> Result<Value, RenderError> {
        Evaluator::new(ctx).eval_expr(expr)
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([0])));
    }

    #[test]
    fn display_coercions() {
        assert_eq!(display(&json!("s")).unwrap(), "s");
        assert_eq!(display(&json!(3)).unwrap(), "3");
        assert_eq!(display(&json!(1.5)).unwrap(), "1.5");
        assert_eq!(display(&json!(true)).unwrap(), "true");
        assert_eq!(display(&json!(null)).unwrap(), "");
        assert_eq!(
            display(&json!([1])).unwrap_err(),
            RenderError::Unprintable("array")
        );
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert!(values_eq(&json!(1), &json!(1.0)));
        assert!(!values_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn add_concatenates_when_either_side_is_a_string() {
        assert_eq!(
            add(json!("n="), json!(4)).unwrap(),
            Value::String("n=4".to_string())
        );
        assert_eq!(add(json!(2), json!(3)).unwrap(), json!(5));
        assert!(add(json!(true), json!(1)).is_err());
    }

    #[test]
    fn local_bindings_shadow_the_context() {
        let mut ctx = Context::new();
        ctx.insert("name", "outer");
        let mut ev = Evaluator::new(&ctx);
        ev.push_scope();
        ev.set_local("name".to_string(), json!("inner"));
        assert_eq!(ev.lookup("name"), Some(json!("inner")));
        ev.pop_scope();
        assert_eq!(ev.lookup("name"), Some(json!("outer")));
    }

    #[test]
    fn context_parameter_resolves_to_the_whole_context() {
        let mut ctx = Context::new();
        ctx.insert("k", 1);
        let ev = Evaluator::new(&ctx);
        assert_eq!(ev.lookup(CONTEXT), Some(json!({ "k": 1 })));
    }

    #[test]
    fn undefined_name_is_an_error() {
        let ctx = Context::new();
        let err = eval(&Expr::Var("missing".to_string()), &ctx).unwrap_err();
        assert_eq!(err, RenderError::UndefinedName("missing".to_string()));
    }

    #[test]
    fn from_serialize_rejects_non_objects() {
        assert!(Context::from_serialize(vec![1, 2]).is_err());
        let ctx = Context::from_serialize(json!({ "a": 1 })).unwrap();
        assert_eq!(ctx.get("a"), Some(&json!(1)));
    }
}
