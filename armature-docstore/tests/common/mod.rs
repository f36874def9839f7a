//! Shared fixtures for integration tests.

#![allow(dead_code)]

use armature_docstore::{Document, Result, SearchRequestSpec, Transport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub price: f64,
}

impl Document for Product {
    fn id(&self) -> &str {
        &self.id
    }
}

pub fn product(id: &str, title: &str, brand: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        brand: brand.to_string(),
        price,
    }
}

/// A request seen by [`CannedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub target: String,
    pub body: Value,
    pub typed_keys: bool,
}

/// Transport that answers from canned bodies and records every request.
///
/// Methods without a canned body answer `{}`; existence checks answer `false`.
#[derive(Default)]
pub struct CannedTransport {
    responses: Mutex<HashMap<&'static str, Value>>,
    calls: Mutex<Vec<Recorded>>,
}

impl CannedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &'static str, body: Value) {
        self.responses.lock().unwrap().insert(method, body);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    fn answer(&self, method: &'static str, target: &str, body: Value, typed_keys: bool) -> Value {
        self.calls.lock().unwrap().push(Recorded {
            method,
            target: target.to_string(),
            body,
            typed_keys,
        });
        self.responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| json!({}))
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.answer("index_exists", index, Value::Null, false).as_bool().unwrap_or(false))
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<Value> {
        Ok(self.answer("create_index", index, body, false))
    }

    async fn delete_index(&self, index: &str) -> Result<Value> {
        Ok(self.answer("delete_index", index, Value::Null, false))
    }

    async fn refresh_index(&self, index: &str) -> Result<()> {
        self.answer("refresh_index", index, Value::Null, false);
        Ok(())
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        let target = format!("{}/{}", index, id);
        Ok(self.answer("document_exists", &target, Value::Null, false).as_bool().unwrap_or(false))
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Value> {
        Ok(self.answer("get_document", &format!("{}/{}", index, id), Value::Null, false))
    }

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<Value> {
        Ok(self.answer("index_document", &format!("{}/{}", index, id), body, false))
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<Value> {
        Ok(self.answer("delete_document", &format!("{}/{}", index, id), Value::Null, false))
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<Value> {
        Ok(self.answer("bulk", "", Value::Array(lines), false))
    }

    async fn search(&self, request: &SearchRequestSpec) -> Result<Value> {
        Ok(self.answer("search", &request.index, request.body(), request.typed_keys))
    }

    async fn put_script(&self, id: &str, body: Value) -> Result<Value> {
        Ok(self.answer("put_script", id, body, false))
    }

    async fn get_script(&self, id: &str) -> Result<Value> {
        Ok(self.answer("get_script", id, Value::Null, false))
    }

    async fn delete_script(&self, id: &str) -> Result<Value> {
        Ok(self.answer("delete_script", id, Value::Null, false))
    }

    async fn search_template(&self, index: &str, body: Value) -> Result<Value> {
        Ok(self.answer("search_template", index, body, false))
    }

    async fn update_by_query(&self, index: &str, body: Value) -> Result<Value> {
        Ok(self.answer("update_by_query", index, body, false))
    }
}
