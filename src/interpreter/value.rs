use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::{
    ast::{
        expressions::{Decorator, FunctionBody, Parameter, PipelineStage},
        types::{TypeAnnotation, TypeSignature},
    },
    errors::errors::RuntimeError,
};

use super::{environment::Environment, format::format_value, interpreter::Interpreter};

pub type BuiltinFn = fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>;

/// Every runtime value. Data variants compare structurally, callables by identity.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Function(Rc<UserFunction>),
    Builtin(Rc<Builtin>),
    Pipeline(Rc<PipelineValue>),
    Bidirectional(Rc<BidirectionalValue>),
    Reversible(Rc<ReversibleValue>),
    Overload(Rc<OverloadSet>),
    Reactive(Rc<RefCell<ReactiveValue>>),
    Promise(Rc<Promise>),
    /// The inner layers of a decorated callable, handed to user decorators.
    Layer(Rc<DecoratorLayer>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => "Int",
            Value::Number(_) => "Float",
            Value::String(_) => "String",
            Value::Bool(_) => "Bool",
            Value::Null => "Null",
            Value::List(_) => "List",
            Value::Tuple(_) => "Tuple",
            Value::Record(_) => "Record",
            Value::Function(_)
            | Value::Builtin(_)
            | Value::Reversible(_)
            | Value::Overload(_)
            | Value::Layer(_) => "Function",
            Value::Pipeline(_) | Value::Bidirectional(_) => "Pipeline",
            Value::Reactive(_) => "Reactive",
            Value::Promise(_) => "Promise",
        }
    }

    /// `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Builtin(_)
                | Value::Pipeline(_)
                | Value::Bidirectional(_)
                | Value::Reversible(_)
                | Value::Overload(_)
                | Value::Layer(_)
        )
    }

    pub fn string(value: &str) -> Value {
        Value::String(value.to_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Pipeline(a), Value::Pipeline(b)) => Rc::ptr_eq(a, b),
            (Value::Bidirectional(a), Value::Bidirectional(b)) => Rc::ptr_eq(a, b),
            (Value::Reversible(a), Value::Reversible(b)) => Rc::ptr_eq(a, b),
            (Value::Overload(a), Value::Overload(b)) => Rc::ptr_eq(a, b),
            (Value::Reactive(a), Value::Reactive(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            (Value::Layer(a), Value::Layer(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_value(self))
    }
}

// Closures point back into their environments, so a derived Debug could recurse forever.
impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name(), super::format::repr_value(self))
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub function: BuiltinFn,
}

/// Results of `#memo`, keyed by the canonical form of the arguments.
pub type MemoCache = RefCell<HashMap<String, Value>>;

pub struct UserFunction {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: FunctionBody,
    pub decorators: Vec<Decorator>,
    pub signature: Option<TypeSignature>,
    pub is_reverse: bool,
    pub closure: Rc<Environment>,
    pub memo: MemoCache,
}

impl UserFunction {
    /// Parameter types from the signature, or from per-parameter annotations
    /// when every parameter has one.
    pub fn parameter_types(&self) -> Option<Vec<TypeAnnotation>> {
        if let Some(signature) = &self.signature {
            return Some(signature.parameters.clone());
        }
        self.parameters
            .iter()
            .map(|parameter| parameter.annotation.clone())
            .collect()
    }

    pub fn return_type(&self) -> Option<&TypeAnnotation> {
        self.signature
            .as_ref()
            .and_then(|signature| signature.returns.as_ref())
    }

    pub fn has_types(&self) -> bool {
        self.signature.is_some()
            || self
                .parameters
                .iter()
                .any(|parameter| parameter.annotation.is_some())
    }

    pub fn required_arity(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.default.is_none())
            .count()
    }

    /// A copy carrying extra decorators, with a fresh memo cache.
    pub fn with_decorators(&self, extra: &[Decorator]) -> UserFunction {
        let mut decorators = self.decorators.clone();
        decorators.extend(extra.iter().cloned());
        UserFunction {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            body: self.body.clone(),
            decorators,
            signature: self.signature.clone(),
            is_reverse: self.is_reverse,
            closure: Rc::clone(&self.closure),
            memo: RefCell::new(HashMap::new()),
        }
    }
}

/// A pipeline stage: source written in a literal (evaluated in the scope the
/// literal was written in), or a callable added later.
#[derive(Clone)]
pub enum Stage {
    Source(PipelineStage, Rc<Environment>),
    Callable(Value),
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Source(stage, _) => write!(f, "{}", stage),
            Stage::Callable(value) => write!(f, "/> {}", format_value(value)),
        }
    }
}

pub struct PipelineValue {
    pub name: String,
    pub stages: Vec<Stage>,
    pub signature: Option<TypeSignature>,
    pub decorators: Vec<Decorator>,
    pub closure: Rc<Environment>,
    pub memo: MemoCache,
}

impl PipelineValue {
    /// Same closure, new stage list, no decorators.
    pub fn derive(&self, stages: Vec<Stage>) -> PipelineValue {
        PipelineValue {
            name: self.name.clone(),
            stages,
            signature: None,
            decorators: vec![],
            closure: Rc::clone(&self.closure),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// A copy carrying extra decorators, with a fresh memo cache.
    pub fn with_decorators(&self, extra: &[Decorator]) -> PipelineValue {
        let mut decorators = self.decorators.clone();
        decorators.extend(extra.iter().cloned());
        PipelineValue {
            name: self.name.clone(),
            stages: self.stages.clone(),
            signature: self.signature.clone(),
            decorators,
            closure: Rc::clone(&self.closure),
            memo: RefCell::new(HashMap::new()),
        }
    }
}

pub struct BidirectionalValue {
    pub name: String,
    pub stages: Vec<Value>,
    pub decorators: Vec<Decorator>,
    pub memo: MemoCache,
}

/// Forward and reverse halves sharing one name.
pub struct ReversibleValue {
    pub name: String,
    pub forward: Value,
    pub reverse: Value,
}

pub struct OverloadSet {
    pub name: String,
    pub candidates: Vec<Rc<UserFunction>>,
}

pub struct ReactiveValue {
    pub source: String,
    pub stages: Vec<PipelineStage>,
    pub closure: Rc<Environment>,
    pub cached: Option<Value>,
    pub dirty: bool,
    /// How many times the stages have run.
    pub computations: usize,
}

/// An async result on the virtual clock: `outcome` becomes observable at `settles_at`.
pub struct Promise {
    pub outcome: Result<Value, RuntimeError>,
    pub settles_at: u64,
}

impl Promise {
    pub fn resolved(value: Value, settles_at: u64) -> Value {
        Value::Promise(Rc::new(Promise {
            outcome: Ok(value),
            settles_at,
        }))
    }

    pub fn rejected(error: RuntimeError, settles_at: u64) -> Value {
        Value::Promise(Rc::new(Promise {
            outcome: Err(error),
            settles_at,
        }))
    }
}

pub struct DecoratorLayer {
    pub target: Value,
    /// Number of decorators of `target` still applied when this layer is called.
    pub depth: usize,
}
