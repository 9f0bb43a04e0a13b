//! Built-in spreadsheet functions
//!
//! Every function is described by a [`FunctionDef`] in a [`FunctionRegistry`].
//! The evaluator resolves arguments before dispatch according to the function's
//! [`Category`]: references are dereferenced, blank cells are replaced by the
//! category's null value, and scalar error arguments short-circuit the call
//! unless the function inspects errors itself.

pub mod engineering;
pub mod info;
pub mod logical;
pub mod math;
pub mod reference;
pub mod statistical;
pub mod text;
pub mod trig;

use crate::ast::{Expr, Reference};
use crate::error::{EngineError, FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::{parse_number, Value};
use ahash::AHashMap;

/// Function over resolved arguments
pub type ValueFn = fn(&[Arg], &Evaluator<'_>) -> FormulaResult<Value>;

/// Function over raw argument expressions; evaluates what it needs itself
pub type ContextFn = fn(&[Expr], &mut Evaluator<'_>) -> Result<Value, EngineError>;

/// Caller-supplied function
pub type CustomFn = Box<dyn Fn(&[Arg], &Evaluator<'_>) -> FormulaResult<Value>>;

pub enum Implementation {
    Values(ValueFn),
    Context(ContextFn),
    Custom(CustomFn),
}

/// Function category
///
/// Decides what a blank-cell argument turns into and whether the raw
/// reference is kept alongside the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Math,
    Trig,
    Logical,
    Engineering,
    Reference,
    Text,
    Statistical,
    Information,
    Custom,
}

impl Category {
    /// Value substituted for a blank cell or omitted argument
    pub fn null_value(self) -> Value {
        match self {
            Category::Math
            | Category::Trig
            | Category::Logical
            | Category::Engineering
            | Category::Reference => Value::Number(0.0),
            Category::Text | Category::Statistical | Category::Information | Category::Custom => {
                Value::Text(String::new())
            }
        }
    }

    /// Functions in this category see blank cells as-is and keep their references
    pub fn preserves_reference(self) -> bool {
        matches!(self, Category::Information)
    }
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: String,
    pub category: Category,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: Implementation,
    /// Receives error arguments instead of short-circuiting on them
    pub accepts_errors: bool,
}

impl FunctionDef {
    pub fn new(
        name: &str,
        category: Category,
        min_args: usize,
        max_args: Option<usize>,
        implementation: ValueFn,
    ) -> Self {
        Self {
            name: name.to_uppercase(),
            category,
            min_args,
            max_args,
            implementation: Implementation::Values(implementation),
            accepts_errors: category == Category::Information,
        }
    }

    /// A function that evaluates its own argument expressions
    pub fn with_context(
        name: &str,
        category: Category,
        min_args: usize,
        max_args: Option<usize>,
        implementation: ContextFn,
    ) -> Self {
        Self {
            name: name.to_uppercase(),
            category,
            min_args,
            max_args,
            implementation: Implementation::Context(implementation),
            accepts_errors: true,
        }
    }

    /// A caller-supplied function; blank cells arrive as empty text
    pub fn custom<F>(name: &str, min_args: usize, max_args: Option<usize>, f: F) -> Self
    where
        F: Fn(&[Arg], &Evaluator<'_>) -> FormulaResult<Value> + 'static,
    {
        Self {
            name: name.to_uppercase(),
            category: Category::Custom,
            min_args,
            max_args,
            implementation: Implementation::Custom(Box::new(f)),
            accepts_errors: false,
        }
    }

    pub fn accepting_errors(mut self) -> Self {
        self.accepts_errors = true;
        self
    }

    pub fn needs_context(&self) -> bool {
        matches!(self.implementation, Implementation::Context(_))
    }

    pub fn null_value(&self) -> Value {
        self.category.null_value()
    }

    pub fn preserves_reference(&self) -> bool {
        self.category.preserves_reference()
    }

    pub fn accepts_arg_count(&self, n: usize) -> bool {
        n >= self.min_args && self.max_args.map_or(true, |max| n <= max)
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("needs_context", &self.needs_context())
            .field("accepts_errors", &self.accepts_errors)
            .finish()
    }
}

/// A resolved function argument
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub value: Value,
    /// Kept only for reference-preserving functions
    pub reference: Option<Reference>,
    /// The argument slot was left empty, as in `F(1,,3)`
    pub omitted: bool,
    /// Written directly in the call rather than read through a reference
    pub literal: bool,
}

impl Arg {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            reference: None,
            omitted: false,
            literal: true,
        }
    }

    pub fn omitted(value: Value) -> Self {
        Self {
            value,
            reference: None,
            omitted: true,
            literal: true,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, Value::Array(_))
    }

    pub fn number(&self) -> FormulaResult<f64> {
        self.value.to_number()
    }

    /// Number, refusing booleans
    pub fn number_strict(&self) -> FormulaResult<f64> {
        self.value.to_number_strict()
    }

    pub fn text(&self) -> FormulaResult<String> {
        self.value.to_text()
    }

    pub fn boolean(&self) -> FormulaResult<bool> {
        self.value.to_bool()
    }

    /// Argument as rows; a scalar becomes 1x1
    pub fn array(&self) -> Vec<Vec<Value>> {
        self.value.to_rows()
    }
}

/// Argument at `index`, `None` when absent or left empty
pub(crate) fn optional(args: &[Arg], index: usize) -> Option<&Arg> {
    args.get(index).filter(|a| !a.omitted)
}

/// Argument at `index`; a missing required argument is `#VALUE!`
pub(crate) fn required(args: &[Arg], index: usize) -> FormulaResult<&Arg> {
    args.get(index).ok_or(FormulaError::Value)
}

pub(crate) fn number_or(args: &[Arg], index: usize, default: f64) -> FormulaResult<f64> {
    optional(args, index).map_or(Ok(default), Arg::number)
}

/// Every value in the arguments with arrays expanded row by row, paired with
/// whether it was written directly in the call
pub(crate) fn flatten(args: &[Arg]) -> Vec<(&Value, bool)> {
    let mut out = Vec::new();
    for arg in args {
        match &arg.value {
            Value::Array(rows) => out.extend(rows.iter().flatten().map(|v| (v, false))),
            v => out.push((v, arg.literal)),
        }
    }
    out
}

/// Numbers for aggregate functions: literal text and booleans are coerced,
/// the same values read through references are skipped
pub(crate) fn collect_numbers(args: &[Arg]) -> FormulaResult<Vec<f64>> {
    let mut numbers = Vec::new();
    for (value, literal) in flatten(args) {
        match value {
            Value::Number(n) => numbers.push(*n),
            Value::Error(e) => return Err(e.clone()),
            Value::Boolean(b) if literal => numbers.push(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) if literal => numbers.push(parse_number(s).ok_or(FormulaError::Value)?),
            _ => {}
        }
    }
    Ok(numbers)
}

/// Precomputed factorials; built once per registry
#[derive(Debug, Clone)]
pub struct FactorialTable {
    single: Vec<f64>,
    double: Vec<f64>,
}

impl FactorialTable {
    pub const MAX_FACT: usize = 170;
    pub const MAX_FACTDOUBLE: usize = 300;

    pub fn new() -> Self {
        let mut single = Vec::with_capacity(Self::MAX_FACT + 1);
        single.push(1.0);
        for n in 1..=Self::MAX_FACT {
            single.push(single[n - 1] * n as f64);
        }

        let mut double = Vec::with_capacity(Self::MAX_FACTDOUBLE + 1);
        double.extend([1.0, 1.0]);
        for n in 2..=Self::MAX_FACTDOUBLE {
            double.push(double[n - 2] * n as f64);
        }

        Self { single, double }
    }

    /// n! for n in 0..=170
    pub fn factorial(&self, n: usize) -> Option<f64> {
        self.single.get(n).copied()
    }

    /// n!! for n in 0..=300
    pub fn double_factorial(&self, n: usize) -> Option<f64> {
        self.double.get(n).copied()
    }
}

impl Default for FactorialTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Interned function handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

/// Function registry
pub struct FunctionRegistry {
    defs: Vec<FunctionDef>,
    ids: AHashMap<String, FunctionId>,
    factorials: FactorialTable,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_trig_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_engineering_functions();
        registry.register_statistical_functions();
        registry.register_reference_functions();
        registry.register_info_functions();

        registry
    }

    /// A registry without built-ins
    pub fn empty() -> Self {
        Self {
            defs: Vec::new(),
            ids: AHashMap::new(),
            factorials: FactorialTable::new(),
        }
    }

    pub fn id(&self, name: &str) -> Option<FunctionId> {
        self.ids.get(&name.to_uppercase()).copied()
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.id(name).map(|id| self.def(id))
    }

    pub fn def(&self, id: FunctionId) -> &FunctionDef {
        &self.defs[id.0 as usize]
    }

    /// Register a function, replacing any definition with the same name
    pub fn register(&mut self, def: FunctionDef) -> FunctionId {
        if let Some(&id) = self.ids.get(&def.name) {
            self.defs[id.0 as usize] = def;
            return id;
        }
        let id = FunctionId(self.defs.len() as u32);
        self.ids.insert(def.name.clone(), id);
        self.defs.push(def);
        id
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defs.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn factorials(&self) -> &FactorialTable {
        &self.factorials
    }

    fn register_math_functions(&mut self) {
        use Category::Math;

        self.register(FunctionDef::new("ABS", Math, 1, Some(1), math::fn_abs));
        self.register(FunctionDef::new("ARABIC", Math, 1, Some(1), math::fn_arabic));
        self.register(FunctionDef::new("BASE", Math, 2, Some(3), math::fn_base));
        self.register(FunctionDef::new("CEILING", Math, 2, Some(2), math::fn_ceiling));
        self.register(FunctionDef::new("CEILING.MATH", Math, 1, Some(3), math::fn_ceiling_math));
        self.register(FunctionDef::new("CEILING.PRECISE", Math, 1, Some(2), math::fn_ceiling_precise));
        self.register(FunctionDef::new("ISO.CEILING", Math, 1, Some(2), math::fn_ceiling_precise));
        self.register(FunctionDef::new("COMBIN", Math, 2, Some(2), math::fn_combin));
        self.register(FunctionDef::new("COMBINA", Math, 2, Some(2), math::fn_combina));
        self.register(FunctionDef::new("DECIMAL", Math, 2, Some(2), math::fn_decimal));
        self.register(FunctionDef::new("DEGREES", Math, 1, Some(1), math::fn_degrees));
        self.register(FunctionDef::new("EVEN", Math, 1, Some(1), math::fn_even));
        self.register(FunctionDef::new("EXP", Math, 1, Some(1), math::fn_exp));
        self.register(FunctionDef::new("FACT", Math, 1, Some(1), math::fn_fact));
        self.register(FunctionDef::new("FACTDOUBLE", Math, 1, Some(1), math::fn_factdouble));
        self.register(FunctionDef::new("FLOOR", Math, 2, Some(2), math::fn_floor));
        self.register(FunctionDef::new("FLOOR.MATH", Math, 1, Some(3), math::fn_floor_math));
        self.register(FunctionDef::new("FLOOR.PRECISE", Math, 1, Some(2), math::fn_floor_precise));
        self.register(FunctionDef::new("GCD", Math, 1, None, math::fn_gcd));
        self.register(FunctionDef::new("INT", Math, 1, Some(1), math::fn_int));
        self.register(FunctionDef::new("LCM", Math, 1, None, math::fn_lcm));
        self.register(FunctionDef::new("LN", Math, 1, Some(1), math::fn_ln));
        self.register(FunctionDef::new("LOG", Math, 1, Some(2), math::fn_log));
        self.register(FunctionDef::new("LOG10", Math, 1, Some(1), math::fn_log10));
        self.register(FunctionDef::new("MDETERM", Math, 1, Some(1), math::fn_mdeterm));
        self.register(FunctionDef::new("MMULT", Math, 2, Some(2), math::fn_mmult));
        self.register(FunctionDef::new("MOD", Math, 2, Some(2), math::fn_mod));
        self.register(FunctionDef::new("PI", Math, 0, Some(0), math::fn_pi));
        self.register(FunctionDef::new("POWER", Math, 2, Some(2), math::fn_power));
        self.register(FunctionDef::new("PRODUCT", Math, 1, None, math::fn_product));
        self.register(FunctionDef::new("RADIANS", Math, 1, Some(1), math::fn_radians));
        self.register(FunctionDef::new("ROUND", Math, 2, Some(2), math::fn_round));
        self.register(FunctionDef::new("ROUNDDOWN", Math, 2, Some(2), math::fn_rounddown));
        self.register(FunctionDef::new("ROUNDUP", Math, 2, Some(2), math::fn_roundup));
        self.register(FunctionDef::new("SIGN", Math, 1, Some(1), math::fn_sign));
        self.register(FunctionDef::new("SQRT", Math, 1, Some(1), math::fn_sqrt));
        self.register(FunctionDef::new("SUM", Math, 1, None, math::fn_sum));
        self.register(FunctionDef::new("SUMPRODUCT", Math, 1, None, math::fn_sumproduct));

        // SUMIF needs the raw range references to align the sum range
        self.register(FunctionDef::with_context("SUMIF", Math, 2, Some(3), math::fn_sumif));

        // AGGREGATE
        self.register(FunctionDef::new("AGGREGATE", Math, 3, None, math::fn_aggregate));
    }

    fn register_trig_functions(&mut self) {
        use Category::Trig;

        self.register(FunctionDef::new("SIN", Trig, 1, Some(1), trig::fn_sin));
        self.register(FunctionDef::new("COS", Trig, 1, Some(1), trig::fn_cos));
        self.register(FunctionDef::new("TAN", Trig, 1, Some(1), trig::fn_tan));
        self.register(FunctionDef::new("ASIN", Trig, 1, Some(1), trig::fn_asin));
        self.register(FunctionDef::new("ACOS", Trig, 1, Some(1), trig::fn_acos));
        self.register(FunctionDef::new("ATAN", Trig, 1, Some(1), trig::fn_atan));
        self.register(FunctionDef::new("ATAN2", Trig, 2, Some(2), trig::fn_atan2));
        self.register(FunctionDef::new("SINH", Trig, 1, Some(1), trig::fn_sinh));
        self.register(FunctionDef::new("COSH", Trig, 1, Some(1), trig::fn_cosh));
        self.register(FunctionDef::new("TANH", Trig, 1, Some(1), trig::fn_tanh));
    }

    fn register_logical_functions(&mut self) {
        use Category::Logical;

        self.register(FunctionDef::new("AND", Logical, 1, None, logical::fn_and));
        self.register(FunctionDef::new("OR", Logical, 1, None, logical::fn_or));
        self.register(FunctionDef::new("XOR", Logical, 1, None, logical::fn_xor));
        self.register(FunctionDef::new("NOT", Logical, 1, Some(1), logical::fn_not));
        self.register(FunctionDef::new("TRUE", Logical, 0, Some(0), logical::fn_true));
        self.register(FunctionDef::new("FALSE", Logical, 0, Some(0), logical::fn_false));

        // IF only propagates an error from the branch it picks
        self.register(FunctionDef::new("IF", Logical, 2, Some(3), logical::fn_if).accepting_errors());
        self.register(FunctionDef::new("IFERROR", Logical, 2, Some(2), logical::fn_iferror).accepting_errors());
        self.register(FunctionDef::new("IFNA", Logical, 2, Some(2), logical::fn_ifna).accepting_errors());
    }

    fn register_text_functions(&mut self) {
        use Category::Text;

        self.register(FunctionDef::new("ASC", Text, 1, Some(1), text::fn_asc));
        self.register(FunctionDef::new("BAHTTEXT", Text, 1, Some(1), text::fn_bahttext));
        self.register(FunctionDef::new("CHAR", Text, 1, Some(1), text::fn_char));
        self.register(FunctionDef::new("CLEAN", Text, 1, Some(1), text::fn_clean));
        self.register(FunctionDef::new("CODE", Text, 1, Some(1), text::fn_code));
        self.register(FunctionDef::new("CONCAT", Text, 1, None, text::fn_concat));
        self.register(FunctionDef::new("CONCATENATE", Text, 1, None, text::fn_concatenate));
        self.register(FunctionDef::new("EXACT", Text, 2, Some(2), text::fn_exact));
        self.register(FunctionDef::new("FIND", Text, 2, Some(3), text::fn_find));
        self.register(FunctionDef::new("LEFT", Text, 1, Some(2), text::fn_left));
        self.register(FunctionDef::new("LEN", Text, 1, Some(1), text::fn_len));
        self.register(FunctionDef::new("LOWER", Text, 1, Some(1), text::fn_lower));
        self.register(FunctionDef::new("MID", Text, 3, Some(3), text::fn_mid));
        self.register(FunctionDef::new("PROPER", Text, 1, Some(1), text::fn_proper));
        self.register(FunctionDef::new("REPLACE", Text, 4, Some(4), text::fn_replace));
        self.register(FunctionDef::new("REPT", Text, 2, Some(2), text::fn_rept));
        self.register(FunctionDef::new("RIGHT", Text, 1, Some(2), text::fn_right));
        self.register(FunctionDef::new("SEARCH", Text, 2, Some(3), text::fn_search));
        self.register(FunctionDef::new("T", Text, 1, Some(1), text::fn_t));
        self.register(FunctionDef::new("TRIM", Text, 1, Some(1), text::fn_trim));
        self.register(FunctionDef::new("UNICHAR", Text, 1, Some(1), text::fn_unichar));
        self.register(FunctionDef::new("UNICODE", Text, 1, Some(1), text::fn_unicode));
        self.register(FunctionDef::new("UPPER", Text, 1, Some(1), text::fn_upper));
    }

    fn register_engineering_functions(&mut self) {
        use Category::Engineering;
        use engineering as eng;

        // Base conversion
        self.register(FunctionDef::new("BIN2DEC", Engineering, 1, Some(1), eng::fn_bin2dec));
        self.register(FunctionDef::new("BIN2HEX", Engineering, 1, Some(2), eng::fn_bin2hex));
        self.register(FunctionDef::new("BIN2OCT", Engineering, 1, Some(2), eng::fn_bin2oct));
        self.register(FunctionDef::new("DEC2BIN", Engineering, 1, Some(2), eng::fn_dec2bin));
        self.register(FunctionDef::new("DEC2HEX", Engineering, 1, Some(2), eng::fn_dec2hex));
        self.register(FunctionDef::new("DEC2OCT", Engineering, 1, Some(2), eng::fn_dec2oct));
        self.register(FunctionDef::new("HEX2BIN", Engineering, 1, Some(2), eng::fn_hex2bin));
        self.register(FunctionDef::new("HEX2DEC", Engineering, 1, Some(1), eng::fn_hex2dec));
        self.register(FunctionDef::new("HEX2OCT", Engineering, 1, Some(2), eng::fn_hex2oct));
        self.register(FunctionDef::new("OCT2BIN", Engineering, 1, Some(2), eng::fn_oct2bin));
        self.register(FunctionDef::new("OCT2DEC", Engineering, 1, Some(1), eng::fn_oct2dec));
        self.register(FunctionDef::new("OCT2HEX", Engineering, 1, Some(2), eng::fn_oct2hex));

        // Bitwise
        self.register(FunctionDef::new("BITAND", Engineering, 2, Some(2), eng::fn_bitand));
        self.register(FunctionDef::new("BITOR", Engineering, 2, Some(2), eng::fn_bitor));
        self.register(FunctionDef::new("BITXOR", Engineering, 2, Some(2), eng::fn_bitxor));
        self.register(FunctionDef::new("BITLSHIFT", Engineering, 2, Some(2), eng::fn_bitlshift));
        self.register(FunctionDef::new("BITRSHIFT", Engineering, 2, Some(2), eng::fn_bitrshift));

        // Comparison and error function
        self.register(FunctionDef::new("DELTA", Engineering, 1, Some(2), eng::fn_delta));
        self.register(FunctionDef::new("GESTEP", Engineering, 1, Some(2), eng::fn_gestep));
        self.register(FunctionDef::new("ERF", Engineering, 1, Some(2), eng::fn_erf));
        self.register(FunctionDef::new("ERFC", Engineering, 1, Some(1), eng::fn_erfc));

        // Complex numbers
        self.register(FunctionDef::new("COMPLEX", Engineering, 2, Some(3), eng::fn_complex));
        self.register(FunctionDef::new("IMABS", Engineering, 1, Some(1), eng::fn_imabs));
        self.register(FunctionDef::new("IMAGINARY", Engineering, 1, Some(1), eng::fn_imaginary));
        self.register(FunctionDef::new("IMARGUMENT", Engineering, 1, Some(1), eng::fn_imargument));
        self.register(FunctionDef::new("IMCONJUGATE", Engineering, 1, Some(1), eng::fn_imconjugate));
        self.register(FunctionDef::new("IMCOS", Engineering, 1, Some(1), eng::fn_imcos));
        self.register(FunctionDef::new("IMCOSH", Engineering, 1, Some(1), eng::fn_imcosh));
        self.register(FunctionDef::new("IMCOT", Engineering, 1, Some(1), eng::fn_imcot));
        self.register(FunctionDef::new("IMCSC", Engineering, 1, Some(1), eng::fn_imcsc));
        self.register(FunctionDef::new("IMCSCH", Engineering, 1, Some(1), eng::fn_imcsch));
        self.register(FunctionDef::new("IMDIV", Engineering, 2, Some(2), eng::fn_imdiv));
        self.register(FunctionDef::new("IMEXP", Engineering, 1, Some(1), eng::fn_imexp));
        self.register(FunctionDef::new("IMLN", Engineering, 1, Some(1), eng::fn_imln));
        self.register(FunctionDef::new("IMLOG10", Engineering, 1, Some(1), eng::fn_imlog10));
        self.register(FunctionDef::new("IMLOG2", Engineering, 1, Some(1), eng::fn_imlog2));
        self.register(FunctionDef::new("IMPOWER", Engineering, 2, Some(2), eng::fn_impower));
        self.register(FunctionDef::new("IMPRODUCT", Engineering, 1, None, eng::fn_improduct));
        self.register(FunctionDef::new("IMREAL", Engineering, 1, Some(1), eng::fn_imreal));
        self.register(FunctionDef::new("IMSEC", Engineering, 1, Some(1), eng::fn_imsec));
        self.register(FunctionDef::new("IMSECH", Engineering, 1, Some(1), eng::fn_imsech));
        self.register(FunctionDef::new("IMSIN", Engineering, 1, Some(1), eng::fn_imsin));
        self.register(FunctionDef::new("IMSINH", Engineering, 1, Some(1), eng::fn_imsinh));
        self.register(FunctionDef::new("IMSQRT", Engineering, 1, Some(1), eng::fn_imsqrt));
        self.register(FunctionDef::new("IMSUB", Engineering, 2, Some(2), eng::fn_imsub));
        self.register(FunctionDef::new("IMSUM", Engineering, 1, None, eng::fn_imsum));
        self.register(FunctionDef::new("IMTAN", Engineering, 1, Some(1), eng::fn_imtan));
    }

    fn register_statistical_functions(&mut self) {
        use Category::Statistical;

        self.register(FunctionDef::new("AVERAGE", Statistical, 1, None, statistical::fn_average));
        self.register(FunctionDef::new("AVERAGEA", Statistical, 1, None, statistical::fn_averagea));
        self.register(FunctionDef::new("COUNT", Statistical, 1, None, statistical::fn_count));
        self.register(FunctionDef::new("COUNTA", Statistical, 1, None, statistical::fn_counta));
        self.register(FunctionDef::new("COUNTBLANK", Statistical, 1, Some(1), statistical::fn_countblank));
        // COUNTIF reads its range unconverted so blank cells never turn into text
        self.register(FunctionDef::with_context("COUNTIF", Statistical, 2, Some(2), statistical::fn_countif));
        self.register(FunctionDef::new("MAX", Statistical, 1, None, statistical::fn_max));
        self.register(FunctionDef::new("MIN", Statistical, 1, None, statistical::fn_min));
    }

    fn register_reference_functions(&mut self) {
        use Category::Reference;

        self.register(FunctionDef::with_context("ROW", Reference, 0, Some(1), reference::fn_row));
        self.register(FunctionDef::with_context("ROWS", Reference, 1, Some(1), reference::fn_rows));
        self.register(FunctionDef::with_context("COLUMN", Reference, 0, Some(1), reference::fn_column));
        self.register(FunctionDef::with_context("COLUMNS", Reference, 1, Some(1), reference::fn_columns));
        self.register(FunctionDef::new("INDEX", Reference, 2, Some(3), reference::fn_index));
        self.register(FunctionDef::new("MATCH", Reference, 2, Some(3), reference::fn_match));
        self.register(FunctionDef::new("TRANSPOSE", Reference, 1, Some(1), reference::fn_transpose));
    }

    fn register_info_functions(&mut self) {
        use Category::Information;

        self.register(FunctionDef::new("ISBLANK", Information, 1, Some(1), info::fn_isblank));
        self.register(FunctionDef::new("ISERR", Information, 1, Some(1), info::fn_iserr));
        self.register(FunctionDef::new("ISERROR", Information, 1, Some(1), info::fn_iserror));
        self.register(FunctionDef::new("ISLOGICAL", Information, 1, Some(1), info::fn_islogical));
        self.register(FunctionDef::new("ISNA", Information, 1, Some(1), info::fn_isna));
        self.register(FunctionDef::new("ISNONTEXT", Information, 1, Some(1), info::fn_isnontext));
        self.register(FunctionDef::new("ISNUMBER", Information, 1, Some(1), info::fn_isnumber));
        self.register(FunctionDef::new("ISREF", Information, 1, Some(1), info::fn_isref));
        self.register(FunctionDef::new("ISTEXT", Information, 1, Some(1), info::fn_istext));
        self.register(FunctionDef::new("NA", Information, 0, Some(0), info::fn_na));
        self.register(FunctionDef::new("TYPE", Information, 1, Some(1), info::fn_type));
        self.register(FunctionDef::new("ERROR.TYPE", Information, 1, Some(1), info::fn_error_type));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.defs.len())
            .finish()
    }
}
