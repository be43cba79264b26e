//! Procedure backend abstraction over the cluster registry database.
//!
//! The relational store and its stored procedures are external to this
//! library; everything here reaches them through [`ProcedureBackend`], a
//! single `call_procedure(name, args) -> rows` capability. Rows are
//! positional column vectors with typed accessors, matching the cursor
//! shape a stored-procedure call produces.

mod memory;

pub use memory::MemoryBackend;

use crate::{GridError, Result};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Well-known stored procedure names.
pub mod procs {
    pub const HOST_LIST: &str = "grid_host_list";
    pub const HOST_ADD: &str = "grid_host_add";
    pub const HOST_DELETE: &str = "grid_host_delete";
    pub const ENDPOINT_GET: &str = "grid_endpoint_get";
    pub const APPLICATION_ADD: &str = "grid_application_add";
    pub const APPLICATION_UUID_GET: &str = "grid_application_uuid_get";
    pub const NETWORK_RESOURCES_LIST: &str = "grid_network_resources_list";
    pub const NETWORK_ROUTE_LIST: &str = "grid_network_route_list";
    pub const NETWORK_ROUTE_ADD: &str = "grid_network_route_add";
    pub const NETWORK_ROUTE_DELETE: &str = "grid_network_route_delete";
    pub const NETWORK_ROUTE_GETLOCK: &str = "grid_network_route_getlock";
    pub const FILE_LIST: &str = "grid_file_list";
    pub const FILE_ADD: &str = "grid_file_add";
    pub const FILE_DELETE: &str = "grid_file_delete";
}

/// One result row: positional columns as JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(columns: Vec<Value>) -> Self {
        Self(columns)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn column(&self, index: usize) -> Result<&Value> {
        self.0.get(index).ok_or_else(|| GridError::Database {
            message: format!("row has no column {index} (width {})", self.0.len()),
        })
    }

    /// Borrow column `index` as a string.
    pub fn str_at(&self, index: usize) -> Result<&str> {
        self.column(index)?.as_str().ok_or_else(|| GridError::Database {
            message: format!("column {index} is not a string"),
        })
    }

    /// Column `index` as an owned string.
    pub fn string_at(&self, index: usize) -> Result<String> {
        Ok(self.str_at(index)?.to_string())
    }

    /// Column `index` parsed as a UUID.
    pub fn uuid_at(&self, index: usize) -> Result<Uuid> {
        let raw = self.str_at(index)?;
        Uuid::parse_str(raw).map_err(|_| GridError::Database {
            message: format!("column {index} is not a uuid: {raw}"),
        })
    }

    /// Column `index` as a signed integer.
    pub fn i64_at(&self, index: usize) -> Result<i64> {
        self.column(index)?.as_i64().ok_or_else(|| GridError::Database {
            message: format!("column {index} is not an integer"),
        })
    }

    /// Column `index` as a port number.
    pub fn u16_at(&self, index: usize) -> Result<u16> {
        let value = self.i64_at(index)?;
        u16::try_from(value).map_err(|_| GridError::Database {
            message: format!("column {index} is out of range for u16: {value}"),
        })
    }
}

impl From<Vec<Value>> for Row {
    fn from(columns: Vec<Value>) -> Self {
        Self(columns)
    }
}

/// The injected CRUD capability standing in for the relational store.
///
/// Implementations are expected to surface store-level failures as
/// [`GridError::Database`]; an empty result set is not a failure.
#[async_trait]
pub trait ProcedureBackend: Send + Sync {
    /// Call a named stored procedure and return its result rows.
    async fn call_procedure(&self, name: &str, args: &[Value]) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_typed_accessors() {
        let id = Uuid::new_v4();
        let row = Row::new(vec![json!("eth0"), json!(id.to_string()), json!(4101)]);

        assert_eq!(row.str_at(0).unwrap(), "eth0");
        assert_eq!(row.uuid_at(1).unwrap(), id);
        assert_eq!(row.u16_at(2).unwrap(), 4101);
        assert_eq!(row.i64_at(2).unwrap(), 4101);
    }

    #[test]
    fn test_row_shape_mismatch_is_database_error() {
        let row = Row::new(vec![json!(42)]);

        assert!(matches!(row.str_at(0), Err(GridError::Database { .. })));
        assert!(matches!(row.uuid_at(0), Err(GridError::Database { .. })));
        assert!(matches!(row.str_at(5), Err(GridError::Database { .. })));
    }

    #[test]
    fn test_row_u16_range_check() {
        let row = Row::new(vec![json!(70_000)]);
        assert!(row.u16_at(0).is_err());
    }
}
