//! base function table
//!
//! Every function is also available under the `core::` namespace. Impure functions (`uuid`)
//! become [Function::Unpredictable] in scopes that only allow pure functions: an expression
//! calling one evaluates to an unknown value.
use crate::addrs::FUNCTION_NAMESPACE_CORE;
use hcl::eval::{FuncArgs, FuncDef, ParamType};
use hcl::expr::FuncName;
use hcl::{Identifier, Number, Value};
use indexmap::IndexMap;
use std::fmt;

const IMPURE_FUNCTIONS: [&str; 1] = ["uuid"];

#[derive(Clone)]
pub enum Function {
    Def(FuncDef),
    /// Result is not known until apply
    Unpredictable(FuncDef),
}

impl Function {
    pub fn def(&self) -> &FuncDef {
        match self {
            Function::Def(def) | Function::Unpredictable(def) => def,
        }
    }

    pub fn is_unpredictable(&self) -> bool {
        matches!(self, Function::Unpredictable(_))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Def(_) => f.write_str("Function::Def"),
            Function::Unpredictable(_) => f.write_str("Function::Unpredictable"),
        }
    }
}

/// Functions by (possibly namespaced) name
pub type Functions = IndexMap<String, Function>;

pub(super) fn make_base_function_table(pure_only: bool, console_mode: bool) -> Functions {
    let mut table: Functions = IndexMap::new();
    let mut add = |name: &str, def: FuncDef| {
        let function = if pure_only && IMPURE_FUNCTIONS.contains(&name) {
            Function::Unpredictable(def)
        } else {
            Function::Def(def)
        };
        table.insert(name.to_owned(), function);
    };

    add("upper", FuncDef::builder().param(ParamType::String).build(upper));
    add("lower", FuncDef::builder().param(ParamType::String).build(lower));
    add("length", FuncDef::builder().param(ParamType::Any).build(length));
    add(
        "join",
        FuncDef::builder()
            .param(ParamType::String)
            .variadic_param(ParamType::Array(Box::new(ParamType::String)))
            .build(join),
    );
    add("max", FuncDef::builder().variadic_param(ParamType::Number).build(max));
    add("min", FuncDef::builder().variadic_param(ParamType::Number).build(min));
    add("abs", FuncDef::builder().param(ParamType::Number).build(abs));
    add("coalesce", FuncDef::builder().variadic_param(ParamType::Any).build(coalesce));
    add("tostring", FuncDef::builder().param(ParamType::Any).build(tostring));
    add("uuid", FuncDef::builder().build(uuid));
    if console_mode {
        add("type", FuncDef::builder().param(ParamType::Any).build(type_of));
    }

    let core: Vec<(String, Function)> = table
        .iter()
        .map(|(name, function)| {
            (
                format!("{FUNCTION_NAMESPACE_CORE}::{name}"),
                function.clone(),
            )
        })
        .collect();
    table.extend(core);

    tracing::trace!(functions = table.len(), pure_only, console_mode, "built function table");
    table
}

/// Name under which a table entry is declared to the evaluator, `core::upper` becomes `upper`
/// in the `core` namespace
pub(super) fn func_name(name: &str) -> FuncName {
    match name.rsplit_once("::") {
        None => FuncName::new(Identifier::unchecked(name)),
        Some((namespace, function)) => FuncName::new(Identifier::unchecked(function))
            .with_namespace(namespace.split("::").map(Identifier::unchecked)),
    }
}

fn string_arg(args: &FuncArgs, index: usize) -> Result<&str, String> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("argument {} must be a string", index + 1))
}

fn upper(args: FuncArgs) -> Result<Value, String> {
    Ok(Value::String(string_arg(&args, 0)?.to_uppercase()))
}

fn lower(args: FuncArgs) -> Result<Value, String> {
    Ok(Value::String(string_arg(&args, 0)?.to_lowercase()))
}

fn length(args: FuncArgs) -> Result<Value, String> {
    let len = match args.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(items)) => items.len(),
        _ => {
            return Err(
                "argument must be a string, a collection type, or a structural type".to_string(),
            )
        }
    };
    Ok(Value::Number(Number::from(len as u64)))
}

fn join(args: FuncArgs) -> Result<Value, String> {
    let separator = string_arg(&args, 0)?;
    let lists = &args[1..];
    if lists.is_empty() {
        return Err("at least one list is required".to_string());
    }

    let mut parts = vec![];
    for list in lists {
        let Value::Array(items) = list else {
            return Err("lists must be lists of strings".to_string());
        };
        for item in items {
            match item {
                Value::String(s) => parts.push(s.as_str()),
                Value::Null => return Err("cannot join a null value".to_string()),
                _ => return Err("lists must be lists of strings".to_string()),
            }
        }
    }
    Ok(Value::String(parts.join(separator)))
}

fn numbers(args: &FuncArgs) -> Result<Vec<&Number>, String> {
    let numbers: Vec<&Number> = args
        .iter()
        .map(|arg| match arg {
            Value::Number(n) => Ok(n),
            _ => Err("all arguments must be numbers".to_string()),
        })
        .collect::<Result<_, _>>()?;
    if numbers.is_empty() {
        return Err("must pass at least one number".to_string());
    }
    Ok(numbers)
}

fn extreme(args: &FuncArgs, pick_later: fn(f64, f64) -> bool) -> Result<Value, String> {
    let mut best: Option<&Number> = None;
    for n in numbers(args)? {
        let value = n.as_f64().unwrap_or(f64::NAN);
        match best {
            Some(current) if !pick_later(value, current.as_f64().unwrap_or(f64::NAN)) => {}
            _ => best = Some(n),
        }
    }
    best.cloned()
        .map(Value::Number)
        .ok_or_else(|| "must pass at least one number".to_string())
}

fn max(args: FuncArgs) -> Result<Value, String> {
    extreme(&args, |candidate, current| candidate > current)
}

fn min(args: FuncArgs) -> Result<Value, String> {
    extreme(&args, |candidate, current| candidate < current)
}

fn abs(args: FuncArgs) -> Result<Value, String> {
    let Some(Value::Number(n)) = args.first() else {
        return Err("argument must be a number".to_string());
    };
    if let Some(abs) = n.as_i64().and_then(i64::checked_abs) {
        return Ok(Value::Number(Number::from(abs)));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(f.abs()))
        .map(Value::Number)
        .ok_or_else(|| "argument must be a finite number".to_string())
}

fn coalesce(args: FuncArgs) -> Result<Value, String> {
    args.iter()
        .find(|arg| match arg {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .cloned()
        .ok_or_else(|| "no non-null, non-empty-string arguments".to_string())
}

fn tostring(args: FuncArgs) -> Result<Value, String> {
    match args.first() {
        Some(value @ (Value::String(_) | Value::Null)) => Ok(value.clone()),
        Some(Value::Number(n)) => Ok(Value::String(n.to_string())),
        Some(Value::Bool(b)) => Ok(Value::String(b.to_string())),
        Some(Value::Array(_)) => Err("cannot convert tuple to string".to_string()),
        Some(Value::Object(_)) => Err("cannot convert object to string".to_string()),
        None => Err("missing argument".to_string()),
    }
}

fn uuid(_: FuncArgs) -> Result<Value, String> {
    let mut bytes: [u8; 16] = rand::random();
    // version 4, variant 1
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Ok(Value::String(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )))
}

fn type_of(args: FuncArgs) -> Result<Value, String> {
    let name = match args.first() {
        Some(Value::Null) | None => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "tuple",
        Some(Value::Object(_)) => "object",
    };
    Ok(Value::String(name.to_string()))
}
