mod result;

pub use result::{QueryResult, RowView};
