use crate::addrs::InstanceKey;
use crate::value::Value;
use indexmap::IndexMap;

/// Repetition mode of a module call or resource, from its `count`, `for_each` or `enabled`
/// argument
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Expansion {
    /// neither argument is set: exactly one instance, [InstanceKey::NoKey]
    #[default]
    Single,
    Count(usize),
    /// A set-typed `for_each` must already be converted to an identity map
    ForEach(IndexMap<String, Value>),
    /// zero or one instance, the single one keyed by [InstanceKey::NoKey]
    Enabled(bool),
}

impl Expansion {
    /// Keys of all instances, sorted
    pub fn instance_keys(&self) -> Vec<InstanceKey> {
        match self {
            Expansion::Single | Expansion::Enabled(true) => vec![InstanceKey::NoKey],
            Expansion::Enabled(false) => vec![],
            Expansion::Count(count) => (0..*count as i64).map(InstanceKey::Int).collect(),
            Expansion::ForEach(mapping) => {
                let mut keys: Vec<_> = mapping.keys().map(|k| InstanceKey::from(k.as_str())).collect();
                keys.sort();
                keys
            }
        }
    }

    /// Values of `count.index`, `each.key` and `each.value` for the instance with the given key
    ///
    /// # Panic
    /// Panics if the key can not belong to an instance of this expansion.
    pub fn repetition_data(&self, key: &InstanceKey) -> RepetitionData {
        match (self, key) {
            (Expansion::Single | Expansion::Enabled(_), InstanceKey::NoKey) => {
                RepetitionData::default()
            }
            (Expansion::Count(_), InstanceKey::Int(index)) => RepetitionData {
                count_index: Some(Value::from(*index)),
                ..Default::default()
            },
            (Expansion::ForEach(mapping), InstanceKey::String(each_key)) => {
                let Some(each_value) = mapping.get(each_key) else {
                    panic!("instance key {key} is not in the for_each map");
                };
                RepetitionData {
                    each_key: Some(Value::from(each_key.as_str())),
                    each_value: Some(each_value.clone()),
                    ..Default::default()
                }
            }
            (expansion, key) => {
                panic!("instance key {key:?} does not match expansion {expansion:?}")
            }
        }
    }
}

/// What `count.index`, `each.key` and `each.value` evaluate to inside one instance
///
/// `None` means the attribute is not available for that kind of repetition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepetitionData {
    pub count_index: Option<Value>,
    pub each_key: Option<Value>,
    pub each_value: Option<Value>,
}
