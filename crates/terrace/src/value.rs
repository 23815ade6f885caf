//! value representation
//!
//! Values flowing through reference evaluation. In addition to the usual HCL data types a value can
//! be [Value::Unknown]: a placeholder for something that is only known later (for example after
//! apply) or could not be computed because of an earlier error. Unknown values still carry a [Type].
//!
//! Known values convert to and from [hcl::Value] so that expressions can be evaluated by [hcl::eval].
use indexmap::IndexMap;
use serde::{
    ser::{Serialize, SerializeMap, SerializeSeq},
    Serializer,
};
use std::fmt;

/// All possible value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(hcl::Number),
    String(String),
    Tuple(Vec<Value>),
    Object(IndexMap<String, Value>),
    Unknown(Type),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Type {
    /// any type, decided later
    #[default]
    Dynamic,
    Bool,
    Number,
    String,
    List(Box<Type>),
    Map(Box<Type>),
    Tuple(Vec<Type>),
    Object(IndexMap<String, Type>),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Type::Map(Box::new(element))
    }

    /// Element type of a collection, [Type::Dynamic] for everything else
    pub fn element_type(&self) -> Type {
        match self {
            Type::List(element) | Type::Map(element) => element.as_ref().clone(),
            _ => Type::Dynamic,
        }
    }

    pub fn friendly_name(&self) -> String {
        match self {
            Type::Dynamic => "any type".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Number => "number".to_string(),
            Type::String => "string".to_string(),
            Type::List(element) => format!("list of {}", element.friendly_name()),
            Type::Map(element) => format!("map of {}", element.friendly_name()),
            Type::Tuple(_) => "tuple".to_string(),
            Type::Object(_) => "object".to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.friendly_name())
    }
}

impl Value {
    /// Unknown value of any type
    pub fn dynamic() -> Self {
        Value::Unknown(Type::Dynamic)
    }

    pub fn object<K: Into<String>>(items: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Dynamic,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::ty).collect()),
            Value::Object(items) => {
                Type::Object(items.iter().map(|(k, v)| (k.clone(), v.ty())).collect())
            }
            Value::Unknown(ty) => ty.clone(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Value::Unknown(_))
    }

    /// `true` when neither this value nor anything nested in it is unknown
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Value::Unknown(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_wholly_known),
            Value::Object(items) => items.values().all(Value::is_wholly_known),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Attribute access (`value.name`)
    pub fn get_attr(&self, name: &str) -> Result<Value, String> {
        match self {
            Value::Object(items) => items
                .get(name)
                .cloned()
                .ok_or_else(|| format!("This object does not have an attribute named {name:?}.")),
            Value::Unknown(Type::Object(attrs)) => attrs
                .get(name)
                .map(|ty| Value::Unknown(ty.clone()))
                .ok_or_else(|| format!("This object does not have an attribute named {name:?}.")),
            Value::Unknown(ty) => Ok(Value::Unknown(ty.element_type())),
            Value::Null => Err("Cannot access attributes of a null value.".to_string()),
            _ => Err("This value does not have any attributes.".to_string()),
        }
    }

    /// Index access (`value[key]`)
    pub fn index(&self, key: &Value) -> Result<Value, String> {
        if let Value::Unknown(_) = key {
            return Ok(Value::Unknown(self.ty().element_type()));
        }

        match (self, key) {
            (Value::Unknown(ty), _) => Ok(Value::Unknown(ty.element_type())),
            (Value::Tuple(items), Value::Number(n)) => n
                .as_u64()
                .and_then(|i| items.get(i as usize))
                .cloned()
                .ok_or_else(|| MISSING_ELEMENT.to_string()),
            (Value::Object(items), Value::String(s)) => {
                items.get(s).cloned().ok_or_else(|| MISSING_ELEMENT.to_string())
            }
            (Value::Null, _) => Err("Cannot index a null value.".to_string()),
            (Value::Tuple(_) | Value::Object(_), _) => {
                Err("The given key is not valid for this collection.".to_string())
            }
            _ => Err("This value does not have any indices.".to_string()),
        }
    }

    /// Convert into a value of type `want`, as far as that can be done without losing information
    pub fn convert(self, want: &Type) -> Result<Value, String> {
        match (self, want) {
            (value, Type::Dynamic) => Ok(value),
            (Value::Unknown(_), want) => Ok(Value::Unknown(want.clone())),
            (Value::Null, _) => Ok(Value::Null),
            (value @ Value::Bool(_), Type::Bool) => Ok(value),
            (value @ Value::Number(_), Type::Number) => Ok(value),
            (value @ Value::String(_), Type::String) => Ok(value),
            (Value::Bool(b), Type::String) => Ok(Value::String(b.to_string())),
            (Value::Number(n), Type::String) => Ok(Value::String(n.to_string())),
            (Value::String(s), Type::Bool) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("a bool is required".to_string()),
            },
            (Value::String(s), Type::Number) => s
                .parse::<f64>()
                .ok()
                .and_then(number_from_f64)
                .map(Value::Number)
                .ok_or_else(|| "a number is required".to_string()),
            (Value::Tuple(items), Type::List(element)) => items
                .into_iter()
                .map(|item| item.convert(element))
                .collect::<Result<_, _>>()
                .map(Value::Tuple),
            (Value::Object(items), Type::Map(element)) => items
                .into_iter()
                .map(|(k, v)| Ok((k, v.convert(element)?)))
                .collect::<Result<_, String>>()
                .map(Value::Object),
            (value @ Value::Tuple(_), Type::Tuple(_)) => Ok(value),
            (value @ Value::Object(_), Type::Object(_)) => Ok(value),
            (_, want) => Err(format!("{} required", want.friendly_name())),
        }
    }

    /// Known form of this value, `None` if anything in it is unknown
    pub fn to_hcl(&self) -> Option<hcl::Value> {
        Some(match self {
            Value::Null => hcl::Value::Null,
            Value::Bool(b) => hcl::Value::Bool(*b),
            Value::Number(n) => hcl::Value::Number(n.clone()),
            Value::String(s) => hcl::Value::String(s.clone()),
            Value::Tuple(items) => hcl::Value::Array(
                items
                    .iter()
                    .map(Value::to_hcl)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(items) => hcl::Value::Object(
                items
                    .iter()
                    .map(|(k, v)| Some((k.clone(), v.to_hcl()?)))
                    .collect::<Option<hcl::value::Map<String, hcl::Value>>>()?,
            ),
            Value::Unknown(_) => return None,
        })
    }
}

const MISSING_ELEMENT: &str = "The given key does not identify an element in this collection value.";

pub(crate) fn number_from_f64(f: f64) -> Option<hcl::Number> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        return Some(hcl::Number::from(f as i64));
    }
    hcl::Number::from_f64(f)
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(hcl::Number::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::from(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(hcl::Number::from(value as u64))
    }
}

impl From<hcl::Number> for Value {
    fn from(value: hcl::Number) -> Self {
        Value::Number(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Tuple(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> From<hcl::value::Map<K, V>> for Value {
    fn from(value: hcl::value::Map<K, V>) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl From<hcl::Value> for Value {
    fn from(value: hcl::Value) -> Value {
        match value {
            hcl::Value::Null => Value::Null,
            hcl::Value::Bool(b) => b.into(),
            hcl::Value::Number(n) => n.into(),
            hcl::Value::String(s) => s.into(),
            hcl::Value::Array(a) => a.into(),
            hcl::Value::Object(o) => o.into(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(&crate::addrs::to_hcl_quoted_string(s)),
            Value::Tuple(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(items) => {
                f.write_str("{")?;
                for (i, (k, v)) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                f.write_str("}")
            }
            Value::Unknown(_) => f.write_str("(known after apply)"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Number(value) => value.serialize(serializer),
            Value::String(value) => serializer.serialize_str(value),
            Value::Tuple(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
            Value::Unknown(_) => serializer.serialize_str("(known after apply)"),
        }
    }
}
