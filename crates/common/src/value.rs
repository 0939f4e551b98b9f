//! Generic model instances
//!
//! One [`Model`] type stands in for every generated data-holder class: it
//! records the shape it belongs to and the fields that are present. Absent
//! fields are simply not stored.

use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A present field value
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i32),
    Long(i64),
    Boolean(bool),
    Double(f64),
    Timestamp(DateTime<Utc>),
    Structure(Model),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Boolean(_) => "boolean",
            Value::Double(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::Structure(_) => "structure",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to longs
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            Value::Integer(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Model> {
        match self {
            Value::Structure(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

// Doubles compare by bit pattern so that Eq and Hash agree.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Structure(a), Value::Structure(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Boolean(v) => v.hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::Structure(v) => v.hash(state),
            Value::List(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Structure(v) => write!(f, "{}", v),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

/// Timestamps are truncated to millisecond precision
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.trunc_subsecs(3))
    }
}

impl From<Model> for Value {
    fn from(v: Model) -> Self {
        Value::Structure(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// Instance of a structure shape
///
/// Equality and hashing are structural over the shape name and every present field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model {
    shape: String,
    fields: BTreeMap<String, Value>,
}

impl Model {
    /// Empty instance of `shape`
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Shape this instance belongs to
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Set `name` and return the instance, for chaining
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name`, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let mut value = value.into();
        truncate_timestamps(&mut value);
        self.fields.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_i32)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_timestamp(&self, name: &str) -> Option<&DateTime<Utc>> {
        self.get(name).and_then(Value::as_timestamp)
    }

    pub fn get_structure(&self, name: &str) -> Option<&Model> {
        self.get(name).and_then(Value::as_structure)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn get_map(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.get(name).and_then(Value::as_map)
    }

    /// Present fields, ordered by member name
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn truncate_timestamps(value: &mut Value) {
    match value {
        Value::Timestamp(v) => *v = v.trunc_subsecs(3),
        Value::List(items) => items.iter_mut().for_each(truncate_timestamps),
        Value::Map(entries) => entries.values_mut().for_each(truncate_timestamps),
        _ => {},
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn certificate() -> Model {
        Model::new("CACertificate")
            .with("certificateArn", "arn:aws:iot:us-east-1:123456789012:cacert/abc")
            .with("certificateId", "abc")
            .with("status", "ACTIVE")
            .with(
                "creationDate",
                Utc.with_ymd_and_hms(2016, 3, 1, 12, 0, 0).unwrap(),
            )
    }

    #[test]
    fn test_equal_fields_give_equal_models_and_hashes() {
        let a = certificate();
        let b = certificate();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_mutating_a_clone_breaks_equality() {
        let original = certificate();

        let mut changed = original.clone();
        assert_eq!(original, changed);
        changed.set("status", "INACTIVE");
        assert_ne!(original, changed);

        let mut removed = original.clone();
        removed.remove("certificateId");
        assert_ne!(original, removed);
    }

    #[test]
    fn test_shape_name_participates_in_equality() {
        let a = Model::new("A").with("x", 1);
        let b = Model::new("B").with("x", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_field_is_required() {
        let empty = Model::new("QueryObjectsInput");
        assert!(empty.is_empty());
        assert_eq!(empty.get("pipelineId"), None);
        assert_eq!(empty, Model::new("QueryObjectsInput"));
    }

    #[test]
    fn test_timestamps_are_stored_at_millisecond_precision() {
        let precise = Utc.timestamp_nanos(1_456_833_600_250_123_456);
        let millis = Utc.timestamp_millis_opt(1_456_833_600_250).unwrap();

        assert_eq!(Value::from(precise), Value::Timestamp(millis));

        let model = Model::new("Sink")
            .with("Created", Value::Timestamp(precise))
            .with("History", Value::List(vec![Value::Timestamp(precise)]));
        assert_eq!(model.get_timestamp("Created"), Some(&millis));
        assert_eq!(
            model.get("History"),
            Some(&Value::List(vec![Value::Timestamp(millis)]))
        );
    }

    #[test]
    fn test_doubles_hash_consistently() {
        let a = Value::Double(f64::NAN);
        let b = Value::Double(f64::NAN);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn test_integer_and_long_are_distinct() {
        assert_ne!(Value::Integer(10), Value::Long(10));
        assert_eq!(Value::Integer(10).as_i64(), Some(10));
        assert_eq!(Value::Long(10).as_i32(), None);
    }

    #[test]
    fn test_typed_getters() {
        let m = certificate().with("limit", 10).with("tags", vec!["a", "b"]);
        assert_eq!(m.get_str("certificateId"), Some("abc"));
        assert_eq!(m.get_i32("limit"), Some(10));
        assert_eq!(m.get_str("limit"), None);
        assert_eq!(m.get_list("tags").map(|l| l.len()), Some(2));
        assert!(m.get_timestamp("creationDate").is_some());
    }

    #[test]
    fn test_display_format() {
        let m = Model::new("TrafficPolicy")
            .with("Id", "tp-1")
            .with("Version", 3)
            .with("Names", vec!["a", "b"]);
        assert_eq!(m.to_string(), "{Id: tp-1,Names: [a, b],Version: 3}");
        assert_eq!(Model::new("Empty").to_string(), "{}");
    }
}
