//! # cellcalc-formula
//!
//! Spreadsheet formula engine.
//!
//! This crate provides:
//! - Formula lexing and parsing (text → AST)
//! - Evaluation against caller-supplied cell and range accessors
//! - Built-in math, trig, logical, text, statistical, engineering,
//!   reference and information functions
//! - Criteria matching for COUNTIF-style functions
//! - Shared formula expansion and reference tracking
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_formula::{Engine, EngineConfig, Value};
//!
//! let config = EngineConfig::default().with_range_accessor(|_| {
//!     Ok(vec![vec![Value::Number(1.0), Value::Number(2.0)]])
//! });
//! let mut engine = Engine::new(config);
//!
//! let out = engine.parse("=SUM(A1:B1)*2", None).unwrap();
//! assert_eq!(out.result, Value::Number(6.0));
//!
//! let out = engine.parse("=1/0", None).unwrap();
//! assert_eq!(out.result.to_string(), "#DIV/0!");
//! ```

pub mod ast;
pub mod criteria;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod shared;
pub mod value;

#[cfg(test)]
mod test_util;

pub use ast::{BinaryOperator, CellRef, Expr, RangeRef, Reference, UnaryOperator};
pub use criteria::Criteria;
pub use dependency::{CellKey, ReferenceTable};
pub use engine::{CellAccessor, Engine, EngineConfig, ParseOutput, RangeAccessor};
pub use error::{Diagnostic, EngineError, FormulaError, FormulaResult};
pub use evaluator::{Evaluator, Position};
pub use functions::{Arg, Category, FunctionDef, FunctionRegistry};
pub use parser::parse_formula;
pub use shared::expand_shared_formula;
pub use value::Value;
