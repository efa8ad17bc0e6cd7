//! Cell values, column types and column roles.

mod roles;
mod types;

pub use roles::ColumnRoles;
pub use types::{ColumnRole, ColumnType, DATE_FORMAT, Value};
