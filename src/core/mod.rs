pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{Column, Row};
pub use value::{DataType, EntityInstance, EntityRef, Value};
