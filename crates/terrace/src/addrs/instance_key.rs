use crate::value::{Type, Value};
use std::cmp::Ordering;
use std::fmt;

/// Key distinguishing instances of a multi-instance object
///
/// Objects without `count` or `for_each` have exactly one instance, keyed by [InstanceKey::NoKey].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum InstanceKey {
    #[default]
    NoKey,
    Int(i64),
    String(String),
    /// Matches every key of the given type, rendered as `[*]`
    Wildcard(InstanceKeyType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKeyType {
    NoKey,
    Int,
    String,
    Unknown,
}

impl InstanceKeyType {
    // Cross-type ordering tag. Sorting by it places NoKey first, then unknown, int and string keys.
    fn tag(self) -> u8 {
        match self {
            InstanceKeyType::NoKey => 0,
            InstanceKeyType::Unknown => b'?',
            InstanceKeyType::Int => b'I',
            InstanceKeyType::String => b'S',
        }
    }
}

impl InstanceKey {
    pub fn key_type(&self) -> InstanceKeyType {
        match self {
            InstanceKey::NoKey => InstanceKeyType::NoKey,
            InstanceKey::Int(_) => InstanceKeyType::Int,
            InstanceKey::String(_) => InstanceKeyType::String,
            InstanceKey::Wildcard(ty) => *ty,
        }
    }

    pub fn is_no_key(&self) -> bool {
        matches!(self, InstanceKey::NoKey)
    }

    /// The key as a value, [Value::Null] for [InstanceKey::NoKey]
    pub fn value(&self) -> Value {
        match self {
            InstanceKey::NoKey => Value::Null,
            InstanceKey::Int(i) => Value::from(*i),
            InstanceKey::String(s) => Value::from(s.as_str()),
            InstanceKey::Wildcard(InstanceKeyType::Int) => Value::Unknown(Type::Number),
            InstanceKey::Wildcard(InstanceKeyType::String) => Value::Unknown(Type::String),
            InstanceKey::Wildcard(_) => Value::dynamic(),
        }
    }
}

impl From<i64> for InstanceKey {
    fn from(value: i64) -> Self {
        InstanceKey::Int(value)
    }
}

impl From<&str> for InstanceKey {
    fn from(value: &str) -> Self {
        InstanceKey::String(value.to_string())
    }
}

impl From<String> for InstanceKey {
    fn from(value: String) -> Self {
        InstanceKey::String(value)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::NoKey => Ok(()),
            InstanceKey::Int(i) => write!(f, "[{i}]"),
            InstanceKey::String(s) => write!(f, "[{}]", to_hcl_quoted_string(s)),
            InstanceKey::Wildcard(_) => f.write_str("[*]"),
        }
    }
}

impl Ord for InstanceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        match (self, other) {
            (InstanceKey::NoKey, _) => return Ordering::Less,
            (_, InstanceKey::NoKey) => return Ordering::Greater,
            _ => {}
        }

        let by_type = self.key_type().tag().cmp(&other.key_type().tag());
        if by_type != Ordering::Equal {
            return by_type;
        }

        match (self, other) {
            (InstanceKey::Int(a), InstanceKey::Int(b)) => a.cmp(b),
            (InstanceKey::String(a), InstanceKey::String(b)) => a.cmp(b),
            // concrete keys before the wildcard of their type
            (InstanceKey::Wildcard(_), _) => Ordering::Greater,
            (_, InstanceKey::Wildcard(_)) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for InstanceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Strict ordering of instance keys, see [InstanceKey]'s [Ord] implementation
pub fn instance_key_less(a: &InstanceKey, b: &InstanceKey) -> bool {
    a < b
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InstanceKeyError {
    #[error("either a string or an integer is required")]
    WrongType,
    #[error("value must be a whole number, between {} and {}", i64::MIN, i64::MAX)]
    NotWholeNumber,
}

/// Instance key from the value of an index step
pub fn parse_instance_key(key: &Value) -> Result<InstanceKey, InstanceKeyError> {
    match key {
        Value::String(s) => Ok(InstanceKey::String(s.clone())),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                return Ok(InstanceKey::Int(int));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(InstanceKey::Int(f as i64))
                }
                _ => Err(InstanceKeyError::NotWholeNumber),
            }
        }
        _ => Err(InstanceKeyError::WrongType),
    }
}

/// Quote a string the way it would be written in HCL source
pub fn to_hcl_quoted_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                // template sequences are escaped by doubling the introducer
                quoted.push(c);
                quoted.push(c);
                quoted.push('{');
                chars.next();
            }
            c if c.is_control() => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    quoted.push_str(&format!("\\u{unit:04x}"));
                }
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordering() {
        let mut keys = vec![
            InstanceKey::from("b"),
            InstanceKey::Int(10),
            InstanceKey::Wildcard(InstanceKeyType::Int),
            InstanceKey::from("a"),
            InstanceKey::NoKey,
            InstanceKey::Int(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                InstanceKey::NoKey,
                InstanceKey::Int(2),
                InstanceKey::Int(10),
                InstanceKey::Wildcard(InstanceKeyType::Int),
                InstanceKey::from("a"),
                InstanceKey::from("b"),
            ]
        );

        assert!(!instance_key_less(&InstanceKey::Int(1), &InstanceKey::Int(1)));
        assert!(instance_key_less(&InstanceKey::NoKey, &InstanceKey::Int(0)));
        assert!(!instance_key_less(&InstanceKey::from("0"), &InstanceKey::Int(1)));
    }

    #[test]
    fn display() {
        assert_eq!(InstanceKey::NoKey.to_string(), "");
        assert_eq!(InstanceKey::Int(-3).to_string(), "[-3]");
        assert_eq!(InstanceKey::Wildcard(InstanceKeyType::String).to_string(), "[*]");
        assert_eq!(
            InstanceKey::from("a\"b\n${c}%{d}").to_string(),
            r#"["a\"b\n$${c}%%{d}"]"#
        );
        assert_eq!(InstanceKey::from("\u{1}").to_string(), r#"["\u0001"]"#);
    }

    #[test]
    fn parse() {
        assert_eq!(parse_instance_key(&Value::from("x")), Ok(InstanceKey::from("x")));
        assert_eq!(parse_instance_key(&Value::from(4)), Ok(InstanceKey::Int(4)));
        assert_eq!(
            parse_instance_key(&Value::Bool(true)),
            Err(InstanceKeyError::WrongType)
        );
        assert_eq!(
            parse_instance_key(&Value::Number(hcl::Number::from_f64(1.5).unwrap())),
            Err(InstanceKeyError::NotWholeNumber)
        );
        assert_eq!(
            InstanceKeyError::WrongType.to_string(),
            "either a string or an integer is required"
        );
    }
}
