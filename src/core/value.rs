use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use crate::core::{DbError, Result};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Entity(EntityRef),
}

impl Value {
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            // ========================================
            // NULL handling: NULL is "greater" than all values (NULL LAST)
            // ========================================
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Greater),
            (_, Value::Null) => Ok(Ordering::Less),

            // ========================================
            // Same type comparisons
            // ========================================
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(compare_floats(*a, *b)),
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),

            // Entities order by (entity name, id)
            (Value::Entity(a), Value::Entity(b)) => {
                match a.entity_name().cmp(b.entity_name()) {
                    Ordering::Equal => a.id().compare(b.id()),
                    other => Ok(other),
                }
            }

            // ========================================
            // Mixed numeric types (implicit coercion)
            // ========================================
            (Value::Integer(a), Value::Float(b)) => Ok(compare_floats(*a as f64, *b)),
            (Value::Float(a), Value::Integer(b)) => Ok(compare_floats(*a, *b as f64)),

            _ => Err(DbError::TypeMismatch(format!(
                "Cannot compare incompatible types: {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Total ordering used by key comparators.
    ///
    /// Values of incompatible types order by type rank instead of failing.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|_| self.type_rank().cmp(&other.type_rank()))
    }

    fn type_rank(&self) -> u8 {
        match self {
            Self::Boolean(_) => 0,
            Self::Integer(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
            Self::Entity(_) => 3,
            Self::Null => 4,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Entity(_) => "ENTITY",
        }
    }

    /// Reference identity check.
    ///
    /// Entity references are the same instance only when they point at the
    /// same allocation; two entities with equal state are still different
    /// instances. Scalars carry no identity, so they fall back to equality.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Entity(a), Self::Entity(b)) => a.ptr_eq(b),
            (Self::Entity(_), _) | (_, Self::Entity(_)) => false,
            _ => self == other,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) => {
                if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render as a SQL literal for generated load statements.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Entity(e) => e.id().to_sql_literal(),
            other => other.to_string(),
        }
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    // NaN is equal to NaN and greater than all other values
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Integral floats hash like the integer they equal.
fn float_as_integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                float_as_integral(*f) == Some(*i)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Integer(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            Self::Float(f) => match float_as_integral(*f) {
                Some(i) => {
                    1u8.hash(state);
                    i.hash(state);
                }
                None if f.is_nan() => 2u8.hash(state),
                None => {
                    2u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            Self::Text(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Self::Boolean(b) => {
                4u8.hash(state);
                b.hash(state);
            }
            Self::Entity(e) => {
                5u8.hash(state);
                e.entity_name().hash(state);
                e.id().hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => {
                if fl.is_nan() {
                    write!(f, "NaN")
                } else if fl.is_infinite() {
                    if *fl > 0.0 {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else {
                    write!(f, "{}", fl)
                }
            }
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Entity(e) => write!(f, "{}#{}", e.entity_name(), e.id()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<EntityRef> for Value {
    fn from(e: EntityRef) -> Self {
        Self::Entity(e)
    }
}

/// Loaded entity state referenced from collection elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInstance {
    pub entity_name: String,
    pub id: Value,
    pub attributes: BTreeMap<String, Value>,
}

impl EntityInstance {
    pub fn new(entity_name: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Shared handle to an [`EntityInstance`].
///
/// `PartialEq` compares entity state. Use [`EntityRef::ptr_eq`] (or
/// [`Value::same_instance`]) when the question is "is this the same object".
#[derive(Debug, Clone)]
pub struct EntityRef(Arc<EntityInstance>);

impl EntityRef {
    pub fn new(instance: EntityInstance) -> Self {
        Self(Arc::new(instance))
    }

    pub fn entity_name(&self) -> &str {
        &self.0.entity_name
    }

    pub fn id(&self) -> &Value {
        &self.0.id
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.0.attributes.get(name)
    }

    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl Eq for EntityRef {}

impl From<EntityInstance> for EntityRef {
    fn from(instance: EntityInstance) -> Self {
        Self::new(instance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true, // Integer widens to Float
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            _ => false,
        }
    }

    /// Coerce a raw column value into this type.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (Self::Integer, Value::Float(f)) if float_as_integral(f).is_some() => {
                Ok(Value::Integer(f as i64))
            }
            (Self::Boolean, Value::Integer(i)) => Ok(Value::Boolean(i != 0)),
            (data_type, value) if data_type.is_compatible(&value) => Ok(value),
            (data_type, value) => Err(DbError::TypeMismatch(format!(
                "Expected {}, got {}",
                data_type,
                value.type_name()
            ))),
        }
    }

    /// Parse a textual literal, e.g. an id given on the command line.
    pub fn parse(&self, text: &str) -> Result<Value> {
        let mismatch = || DbError::TypeMismatch(format!("'{}' is not a valid {}", text, self));
        match self {
            Self::Integer => text.trim().parse().map(Value::Integer).map_err(|_| mismatch()),
            Self::Float => text.trim().parse().map(Value::Float).map_err(|_| mismatch()),
            Self::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Boolean(true)),
                "false" | "f" | "0" => Ok(Value::Boolean(false)),
                _ => Err(mismatch()),
            },
            Self::Text => Ok(Value::Text(text.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Float(3.5), Value::Float(3.5));
        assert_ne!(Value::Integer(1), Value::Integer(2));
    }

    #[test]
    fn test_mixed_numeric_equality_hashes_consistently() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_eq!(hash_of(&Value::Integer(2)), hash_of(&Value::Float(2.0)));
        assert_ne!(Value::Integer(2), Value::Float(2.5));
    }

    #[test]
    fn test_entity_equality_vs_identity() {
        let a = Value::Entity(EntityRef::new(EntityInstance::new("Item", 1)));
        let b = Value::Entity(EntityRef::new(EntityInstance::new("Item", 1)));
        let a_again = a.clone();

        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert!(a.same_instance(&a_again));
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_scalar_identity_is_equality() {
        assert!(Value::Text("a".into()).same_instance(&Value::Text("a".into())));
        assert!(!Value::Integer(1).same_instance(&Value::Text("1".into())));
    }

    #[test]
    fn test_sort_cmp_ranks_incompatible_types() {
        assert_eq!(Value::Integer(1).sort_cmp(&Value::Integer(2)), Ordering::Less);
        assert_eq!(Value::Integer(9).sort_cmp(&Value::Text("a".into())), Ordering::Less);
        assert_eq!(Value::Null.sort_cmp(&Value::Text("a".into())), Ordering::Greater);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(DataType::Float.coerce(Value::Integer(3)).unwrap(), Value::Float(3.0));
        assert_eq!(DataType::Boolean.coerce(Value::Integer(0)).unwrap(), Value::Boolean(false));
        assert!(DataType::Integer.coerce(Value::Text("x".into())).is_err());
        assert!(DataType::Text.coerce(Value::Null).unwrap().is_null());
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(Value::Text("O'Hara".into()).to_sql_literal(), "'O''Hara'");
        assert_eq!(Value::Integer(7).to_sql_literal(), "7");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(DataType::Integer.parse(" 42 ").unwrap(), Value::Integer(42));
        assert_eq!(DataType::Boolean.parse("T").unwrap(), Value::Boolean(true));
        assert_eq!(DataType::Text.parse("x").unwrap(), Value::from("x"));
        assert!(DataType::Integer.parse("4.5").is_err());
    }
}
