use super::{DbError, Result, DataType, Value};

pub type Row = Vec<Value>;

/// A physical column read when materializing entity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Validate and coerce a raw value read for this column.
    pub fn read(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(Value::Null);
        }

        self.data_type.coerce(value).map_err(|_| {
            DbError::TypeMismatch(format!(
                "Column '{}' expects type {}",
                self.name, self.data_type
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_null_column_rejects_null() {
        let column = Column::new("id", DataType::Integer).not_null();
        assert!(matches!(column.read(Value::Null), Err(DbError::ConstraintViolation(_))));
    }

    #[test]
    fn test_read_coerces() {
        let column = Column::new("price", DataType::Float);
        assert_eq!(column.read(Value::Integer(4)).unwrap(), Value::Float(4.0));
        assert!(column.read(Value::Text("x".into())).is_err());
    }
}
