//! Formula engine: configuration plus the parse-and-evaluate entry point

use crate::ast::{CellRef, Expr, RangeRef, Reference};
use crate::dependency;
use crate::error::{AccessError, Diagnostic, EngineError};
use crate::evaluator::{Evaluator, Position};
use crate::functions::{FunctionDef, FunctionRegistry};
use crate::parser::parse_formula;
use crate::value::Value;
use ahash::AHashMap;
use std::fmt;

/// Reads a single cell
pub type CellAccessor = Box<dyn Fn(&CellRef) -> Result<Value, AccessError>>;

/// Reads a rectangular range as rows of values
pub type RangeAccessor = Box<dyn Fn(&RangeRef) -> Result<Vec<Vec<Value>>, AccessError>>;

/// Engine construction options
///
/// ```rust
/// use cellcalc_formula::{Engine, EngineConfig, Value};
///
/// let config = EngineConfig::default()
///     .with_variable("rate", Value::Number(0.5))
///     .with_cell_accessor(|_| Ok(Value::Number(10.0)));
/// let mut engine = Engine::new(config);
/// assert_eq!(engine.parse("=A1*rate", None).unwrap().result, Value::Number(5.0));
/// ```
pub struct EngineConfig {
    /// Added to the built-ins, replacing any with the same name
    pub functions: Vec<FunctionDef>,
    pub variables: Vec<(String, Value)>,
    pub on_cell: CellAccessor,
    pub on_range: RangeAccessor,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            functions: Vec::new(),
            variables: Vec::new(),
            on_cell: Box::new(|_| Ok(Value::Number(0.0))),
            on_range: Box::new(|_| Ok(vec![vec![Value::Number(0.0)]])),
        }
    }
}

impl EngineConfig {
    pub fn with_function(mut self, def: FunctionDef) -> Self {
        self.functions.push(def);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    pub fn with_cell_accessor<F>(mut self, f: F) -> Self
    where
        F: Fn(&CellRef) -> Result<Value, AccessError> + 'static,
    {
        self.on_cell = Box::new(f);
        self
    }

    pub fn with_range_accessor<F>(mut self, f: F) -> Self
    where
        F: Fn(&RangeRef) -> Result<Vec<Vec<Value>>, AccessError> + 'static,
    {
        self.on_range = Box::new(f);
        self
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("functions", &self.functions)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

/// Result of [`Engine::parse`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOutput {
    pub result: Value,
    /// Explanation for errors that carry one (unimplemented functions), else empty
    pub detail: String,
}

/// Parses and evaluates formulas against caller-supplied cell data
pub struct Engine {
    registry: FunctionRegistry,
    variables: AHashMap<String, Value>,
    on_cell: CellAccessor,
    on_range: RangeAccessor,
    logs: Vec<String>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = FunctionRegistry::new();
        for def in config.functions {
            registry.register(def);
        }
        let variables = config
            .variables
            .into_iter()
            .map(|(name, value)| (name.to_uppercase(), value))
            .collect();

        Self {
            registry,
            variables,
            on_cell: config.on_cell,
            on_range: config.on_range,
            logs: Vec::new(),
        }
    }

    /// Parse and evaluate formula text
    ///
    /// Syntax errors are returned as [`EngineError::Syntax`]; spreadsheet
    /// errors like `#DIV/0!` are an `Ok` result.
    pub fn parse(&mut self, text: &str, position: Option<Position>) -> Result<ParseOutput, EngineError> {
        let expr = self.compile(text)?;
        let result = self.evaluate(&expr, position)?;
        let detail = result.error().map(|e| e.detail()).unwrap_or_default();
        Ok(ParseOutput { result, detail })
    }

    /// Parse formula text without evaluating it
    pub fn compile(&self, text: &str) -> Result<Expr, EngineError> {
        parse_formula(text).map_err(|e| {
            log::debug!("syntax error in {text:?} at {}:{}: {}", e.line, e.column, e.message);
            EngineError::Syntax(Diagnostic::new(text, &e))
        })
    }

    /// Evaluate a compiled formula
    pub fn evaluate(&mut self, expr: &Expr, position: Option<Position>) -> Result<Value, EngineError> {
        let mut evaluator = Evaluator::new(
            &self.registry,
            &self.variables,
            &*self.on_cell,
            &*self.on_range,
            position,
        );
        let result = evaluator.evaluate_formula(expr);
        let unknown = evaluator.take_unknown();
        for name in unknown {
            if !self.logs.contains(&name) {
                log::warn!("function {name} is not registered; evaluating it as 0");
                self.logs.push(name);
            }
        }
        result
    }

    /// References a formula reads, without evaluating it
    pub fn references(&self, text: &str) -> Result<Vec<Reference>, EngineError> {
        let expr = self.compile(text)?;
        Ok(dependency::references(&expr))
    }

    /// Names of unknown functions called so far, each once
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Registered function names, sorted
    pub fn supported_functions(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_uppercase(), value);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("variables", &self.variables)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}
