//! In-memory procedure backend.
//!
//! Maps procedure names to handler closures. Used by the test suites and by
//! embedders that want to run the control plane against something other than
//! a relational store.

use super::{ProcedureBackend, Row};
use crate::{GridError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

type Handler = Box<dyn Fn(&[Value]) -> Result<Vec<Row>> + Send + Sync>;

/// Procedure backend backed by registered closures.
///
/// Every call is recorded; tests use [`MemoryBackend::calls`] to assert on
/// the procedures a component invoked and in what order.
#[derive(Default)]
pub struct MemoryBackend {
    handlers: RwLock<HashMap<String, Handler>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a procedure name, replacing any previous one.
    pub fn register<F>(&self, name: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Vec<Row>> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .expect("handler lock poisoned")
            .insert(name.to_string(), Box::new(handler));
    }

    /// Register a fixed result set for a procedure name.
    pub fn register_rows(&self, name: &str, rows: Vec<Row>) {
        self.register(name, move |_| Ok(rows.clone()));
    }

    /// Register an empty result set for a procedure name.
    pub fn register_empty(&self, name: &str) {
        self.register_rows(name, Vec::new());
    }

    /// The recorded `(procedure, args)` call log, oldest first.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Names of the recorded calls, oldest first.
    pub fn called_procedures(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}

#[async_trait]
impl ProcedureBackend for MemoryBackend {
    async fn call_procedure(&self, name: &str, args: &[Value]) -> Result<Vec<Row>> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push((name.to_string(), args.to_vec()));

        let handlers = self.handlers.read().expect("handler lock poisoned");
        match handlers.get(name) {
            Some(handler) => handler(args),
            None => Err(GridError::UnknownProcedure {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_registered_handler_sees_args() {
        let backend = MemoryBackend::new();
        backend.register("echo_first", |args| {
            Ok(vec![Row::new(vec![args[0].clone()])])
        });

        let rows = backend
            .call_procedure("echo_first", &[json!("hello")])
            .await
            .unwrap();
        assert_eq!(rows[0].str_at(0).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_unknown_procedure_is_an_error() {
        let backend = MemoryBackend::new();
        let result = backend.call_procedure("missing", &[]).await;
        assert!(matches!(result, Err(GridError::UnknownProcedure { .. })));
    }

    #[tokio::test]
    async fn test_call_log_records_order() {
        let backend = MemoryBackend::new();
        backend.register_empty("first");
        backend.register_empty("second");

        backend.call_procedure("first", &[json!(1)]).await.unwrap();
        backend.call_procedure("second", &[]).await.unwrap();

        assert_eq!(backend.called_procedures(), vec!["first", "second"]);
        assert_eq!(backend.calls()[0].1, vec![json!(1)]);
    }
}
