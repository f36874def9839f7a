//! In-process transport for tests and local development.

use super::Transport;
use crate::error::{DocStoreError, Result};
use crate::request::SearchRequestSpec;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Transport that keeps indices, documents and scripts in memory.
///
/// It answers with the same response shapes as a real cluster for the
/// operations the client uses. Supported queries are `match_all`, `match`,
/// `term`, `ids` and `bool` (`must`, `filter`, `should`, `must_not`).
/// Searches honor `from`, `size`, `fields` and `_source: false`. Search
/// templates are rendered by plain `{{param}}` substitution.
///
/// Script sources are never evaluated: update-by-query resolves the stored
/// script and reports every matching document as updated, leaving sources
/// unchanged. Aggregations and suggesters are rejected.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    indices: BTreeMap<String, MemoryIndex>,
    scripts: BTreeMap<String, StoredScript>,
}

#[derive(Default)]
struct MemoryIndex {
    docs: Vec<StoredDoc>,
}

struct StoredDoc {
    id: String,
    source: Value,
    version: u64,
}

struct StoredScript {
    lang: String,
    source: String,
}

fn store_error(status: u16, error_type: &str, reason: String) -> DocStoreError {
    DocStoreError::Store {
        status,
        error_type: error_type.to_string(),
        reason,
    }
}

fn no_such_index(index: &str) -> DocStoreError {
    store_error(404, "index_not_found_exception", format!("no such index [{}]", index))
}

fn unsupported(what: &str) -> DocStoreError {
    store_error(
        400,
        "parsing_exception",
        format!("{} is not supported by the in-memory transport", what),
    )
}

impl MemoryTransport {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index, `None` if the index is absent.
    pub async fn count(&self, index: &str) -> Option<usize> {
        let state = self.state.read().await;
        state.indices.get(index).map(|i| i.docs.len())
    }

    /// Names of all indices.
    pub async fn index_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.indices.keys().cloned().collect()
    }
}

impl MemoryIndex {
    fn find(&self, id: &str) -> Option<&StoredDoc> {
        self.docs.iter().find(|d| d.id == id)
    }

    /// Create or overwrite, returning the result code and new version.
    fn write(&mut self, id: &str, source: Value) -> (&'static str, u64) {
        if let Some(doc) = self.docs.iter_mut().find(|d| d.id == id) {
            doc.source = source;
            doc.version += 1;
            return ("updated", doc.version);
        }
        self.docs.push(StoredDoc {
            id: id.to_string(),
            source,
            version: 1,
        });
        ("created", 1)
    }

    /// Remove, returning the removed version.
    fn remove(&mut self, id: &str) -> Option<u64> {
        let pos = self.docs.iter().position(|d| d.id == id)?;
        Some(self.docs.remove(pos).version + 1)
    }
}

impl MemoryState {
    fn index(&self, name: &str) -> Result<&MemoryIndex> {
        self.indices.get(name).ok_or_else(|| no_such_index(name))
    }

    fn index_mut(&mut self, name: &str) -> Result<&mut MemoryIndex> {
        self.indices.get_mut(name).ok_or_else(|| no_such_index(name))
    }

    fn search(&self, index: &str, body: &Value, ignore_unavailable: bool) -> Result<Value> {
        let Some(idx) = self.indices.get(index) else {
            if ignore_unavailable {
                return Ok(search_response(index, &[], 0, body));
            }
            return Err(no_such_index(index));
        };

        for key in ["aggs", "aggregations", "suggest"] {
            if body.get(key).is_some() {
                return Err(unsupported(key));
            }
        }

        let query = body.get("query").cloned().unwrap_or_else(|| json!({ "match_all": {} }));
        let mut matched = Vec::new();
        for doc in &idx.docs {
            if matches(&query, &doc.id, &doc.source)? {
                matched.push(doc);
            }
        }

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let page: Vec<&StoredDoc> = matched.iter().skip(from).take(size).copied().collect();

        Ok(search_response(index, &page, matched.len() as u64, body))
    }
}

fn search_response(index: &str, docs: &[&StoredDoc], total: u64, body: &Value) -> Value {
    let with_source = body.get("_source") != Some(&Value::Bool(false));
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let hits: Vec<Value> = docs
        .iter()
        .map(|doc| {
            let mut hit = json!({ "_index": index, "_id": doc.id, "_score": 1.0 });
            if with_source {
                hit["_source"] = doc.source.clone();
            }
            if !fields.is_empty() {
                let projected: Map<String, Value> = fields
                    .iter()
                    .filter_map(|f| {
                        lookup(&doc.source, f).map(|v| {
                            let values = match v {
                                Value::Array(items) => items.clone(),
                                other => vec![other.clone()],
                            };
                            (f.to_string(), Value::Array(values))
                        })
                    })
                    .collect();
                hit["fields"] = Value::Object(projected);
            }
            hit
        })
        .collect();

    json!({
        "took": 0,
        "timed_out": false,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "max_score": if hits.is_empty() { Value::Null } else { json!(1.0) },
            "hits": hits
        }
    })
}

/// Value at a dotted path.
fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(source, |v, part| v.get(part))
}

/// The single `field: clause` pair of a leaf query.
fn single_field<'a>(kind: &str, clause: &'a Value) -> Result<(&'a str, &'a Value)> {
    clause
        .as_object()
        .filter(|m| m.len() == 1)
        .and_then(|m| m.iter().next())
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| unsupported(&format!("{} without exactly one field", kind)))
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Any query token equals any token of the field value.
fn text_matches(field: Option<&Value>, query: &str) -> bool {
    let wanted = tokens(query);
    let values: Vec<&Value> = match field {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v) => vec![v],
        None => return false,
    };

    values
        .into_iter()
        .filter_map(scalar_text)
        .any(|text| tokens(&text).iter().any(|t| wanted.contains(t)))
}

fn term_matches(field: Option<&Value>, wanted: &Value) -> bool {
    match field {
        Some(Value::Array(items)) => items.contains(wanted),
        Some(v) => v == wanted,
        None => false,
    }
}

fn clauses(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn matches(query: &Value, id: &str, source: &Value) -> Result<bool> {
    let (kind, clause) = query
        .as_object()
        .and_then(|q| q.iter().next())
        .ok_or_else(|| unsupported("an empty query"))?;

    match kind.as_str() {
        "match_all" => Ok(true),
        "match" => {
            let (field, text) = single_field(kind, clause)?;
            let text = text.get("query").unwrap_or(text);
            let text = scalar_text(text).ok_or_else(|| unsupported("a non-scalar match"))?;
            Ok(text_matches(lookup(source, field), &text))
        }
        "term" => {
            let (field, wanted) = single_field(kind, clause)?;
            let wanted = wanted.get("value").unwrap_or(wanted);
            Ok(term_matches(lookup(source, field), wanted))
        }
        "ids" => Ok(clause["values"]
            .as_array()
            .is_some_and(|ids| ids.iter().any(|v| v.as_str() == Some(id)))),
        "bool" => {
            let all = |key: &str| -> Result<bool> {
                for q in clauses(&clause[key]) {
                    if !matches(q, id, source)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            };
            let any = |key: &str| -> Result<bool> {
                for q in clauses(&clause[key]) {
                    if matches(q, id, source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            };

            if !all("must")? || !all("filter")? || any("must_not")? {
                return Ok(false);
            }
            let scoring = clauses(&clause["must"]).len() + clauses(&clause["filter"]).len();
            if scoring == 0 && !clauses(&clause["should"]).is_empty() {
                return any("should");
            }
            Ok(true)
        }
        other => Err(unsupported(&format!("query type [{}]", other))),
    }
}

/// One validated bulk operation. `source` is set for `index` and `create`.
struct BulkAction {
    op: String,
    index: String,
    id: String,
    source: Option<Value>,
}

/// Validate every action/source pair before anything is applied.
fn parse_bulk(lines: Vec<Value>) -> Result<Vec<BulkAction>> {
    let mut actions = Vec::new();
    let mut lines = lines.into_iter();

    while let Some(action) = lines.next() {
        let (op, meta) = action
            .as_object()
            .filter(|m| m.len() == 1)
            .and_then(|m| m.iter().next())
            .map(|(k, v)| (k.clone(), v.clone()))
            .ok_or_else(|| {
                store_error(
                    400,
                    "illegal_argument_exception",
                    "Malformed action/metadata line".to_string(),
                )
            })?;

        let index = meta["_index"].as_str().unwrap_or_default().to_string();
        let id = meta["_id"].as_str().unwrap_or_default().to_string();
        if index.is_empty() || id.is_empty() {
            return Err(store_error(
                400,
                "action_request_validation_exception",
                "index and id are required".to_string(),
            ));
        }

        let source = match op.as_str() {
            "index" | "create" => {
                let source = lines.next().filter(Value::is_object).ok_or_else(|| {
                    store_error(
                        400,
                        "illegal_argument_exception",
                        format!("{} requires a source line", op),
                    )
                })?;
                Some(source)
            }
            "delete" => None,
            other => return Err(unsupported(&format!("bulk action [{}]", other))),
        };

        actions.push(BulkAction { op, index, id, source });
    }

    Ok(actions)
}

/// Replace `{{name}}` with parameter values. Unknown names render empty.
fn render_template(source: &str, params: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = after[..end].trim();
        match params.get(name) {
            Some(Value::String(s)) => {
                // escape for a JSON string context, without the quotes
                let quoted = Value::String(s.clone()).to_string();
                out.push_str(&quoted[1..quoted.len() - 1]);
            }
            Some(Value::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<Value> {
        if !body.is_object() {
            return Err(store_error(400, "parse_exception", "request body is required".to_string()));
        }

        let mut state = self.state.write().await;
        if state.indices.contains_key(index) {
            return Err(store_error(
                400,
                "resource_already_exists_exception",
                format!("index [{}] already exists", index),
            ));
        }
        state.indices.insert(index.to_string(), MemoryIndex::default());

        Ok(json!({ "acknowledged": true, "shards_acknowledged": true, "index": index }))
    }

    async fn delete_index(&self, index: &str) -> Result<Value> {
        let mut state = self.state.write().await;
        state.indices.remove(index).ok_or_else(|| no_such_index(index))?;
        Ok(json!({ "acknowledged": true }))
    }

    async fn refresh_index(&self, index: &str) -> Result<()> {
        let state = self.state.read().await;
        state.index(index).map(|_| ())
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .indices
            .get(index)
            .is_some_and(|i| i.find(id).is_some()))
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Value> {
        let state = self.state.read().await;
        let response = match state.index(index)?.find(id) {
            Some(doc) => json!({
                "_index": index,
                "_id": id,
                "_version": doc.version,
                "found": true,
                "_source": doc.source
            }),
            None => json!({ "_index": index, "_id": id, "found": false }),
        };
        Ok(response)
    }

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<Value> {
        if !body.is_object() {
            return Err(store_error(
                400,
                "mapper_parsing_exception",
                "failed to parse, document is empty".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let (result, version) = state
            .indices
            .entry(index.to_string())
            .or_default()
            .write(id, body);

        Ok(json!({ "_index": index, "_id": id, "_version": version, "result": result }))
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<Value> {
        let mut state = self.state.write().await;
        let response = match state.index_mut(index)?.remove(id) {
            Some(version) => {
                json!({ "_index": index, "_id": id, "_version": version, "result": "deleted" })
            }
            None => json!({ "_index": index, "_id": id, "result": "not_found" }),
        };
        Ok(response)
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<Value> {
        let actions = parse_bulk(lines)?;

        let mut state = self.state.write().await;
        let mut items = Vec::with_capacity(actions.len());
        let mut errors = false;

        for action in actions {
            let BulkAction { op, index, id, source } = action;
            let item = match source {
                Some(source) => {
                    let target = state.indices.entry(index.clone()).or_default();
                    if op == "create" && target.find(&id).is_some() {
                        errors = true;
                        json!({ "_index": index, "_id": id, "status": 409, "error": {
                            "type": "version_conflict_engine_exception",
                            "reason": format!("[{}]: version conflict, document already exists", id)
                        } })
                    } else {
                        let (result, version) = target.write(&id, source);
                        let status = if result == "created" { 201 } else { 200 };
                        json!({
                            "_index": index,
                            "_id": id,
                            "_version": version,
                            "result": result,
                            "status": status
                        })
                    }
                }
                None => match state.indices.get_mut(&index).and_then(|i| i.remove(&id)) {
                    Some(version) => json!({
                        "_index": index,
                        "_id": id,
                        "_version": version,
                        "result": "deleted",
                        "status": 200
                    }),
                    None => {
                        json!({ "_index": index, "_id": id, "result": "not_found", "status": 404 })
                    }
                },
            };

            items.push(json!({ op: item }));
        }

        Ok(json!({ "took": 0, "errors": errors, "items": items }))
    }

    async fn search(&self, request: &SearchRequestSpec) -> Result<Value> {
        let state = self.state.read().await;
        state.search(&request.index, &request.body(), request.ignore_unavailable)
    }

    async fn put_script(&self, id: &str, body: Value) -> Result<Value> {
        let script = &body["script"];
        let lang = script["lang"].as_str().unwrap_or_default();
        let source = match &script["source"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        if lang.is_empty() || source.is_empty() {
            return Err(store_error(
                400,
                "action_request_validation_exception",
                "must specify lang and source for stored script".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        state.scripts.insert(
            id.to_string(),
            StoredScript {
                lang: lang.to_string(),
                source,
            },
        );
        Ok(json!({ "acknowledged": true }))
    }

    async fn get_script(&self, id: &str) -> Result<Value> {
        let state = self.state.read().await;
        let response = match state.scripts.get(id) {
            Some(script) => json!({
                "_id": id,
                "found": true,
                "script": { "lang": script.lang, "source": script.source }
            }),
            None => json!({ "_id": id, "found": false }),
        };
        Ok(response)
    }

    async fn delete_script(&self, id: &str) -> Result<Value> {
        let mut state = self.state.write().await;
        state.scripts.remove(id).ok_or_else(|| {
            let reason = format!("stored script [{}] does not exist", id);
            store_error(404, "resource_not_found_exception", reason)
        })?;
        Ok(json!({ "acknowledged": true }))
    }

    async fn search_template(&self, index: &str, body: Value) -> Result<Value> {
        let state = self.state.read().await;
        let params = body["params"].as_object().cloned().unwrap_or_default();

        let source = match (&body["id"], &body["source"]) {
            (Value::String(id), _) => {
                let script = state.scripts.get(id).ok_or_else(|| {
                    let reason = format!("unable to find script [{}]", id);
                    store_error(404, "resource_not_found_exception", reason)
                })?;
                if script.lang != "mustache" {
                    return Err(store_error(
                        400,
                        "illegal_argument_exception",
                        format!("script [{}] is not a mustache template", id),
                    ));
                }
                script.source.clone()
            }
            (_, Value::String(inline)) => inline.clone(),
            (_, Value::Object(_)) => body["source"].to_string(),
            _ => {
                return Err(store_error(
                    400,
                    "illegal_argument_exception",
                    "template id or source is required".to_string(),
                ));
            }
        };

        let rendered: Value = serde_json::from_str(&render_template(&source, &params))?;
        state.search(index, &rendered, false)
    }

    async fn update_by_query(&self, index: &str, body: Value) -> Result<Value> {
        let mut state = self.state.write().await;

        if let Some(id) = body["script"]["id"].as_str() {
            if !state.scripts.contains_key(id) {
                return Err(store_error(
                    404,
                    "resource_not_found_exception",
                    format!("unable to find script [{}] in cluster state", id),
                ));
            }
        }

        let query = body.get("query").cloned().unwrap_or_else(|| json!({ "match_all": {} }));
        let idx = state.index_mut(index)?;
        let mut updated = 0u64;
        for doc in idx.docs.iter_mut() {
            if matches(&query, &doc.id, &doc.source)? {
                doc.version += 1;
                updated += 1;
            }
        }

        Ok(json!({
            "took": 0,
            "timed_out": false,
            "total": updated,
            "updated": updated,
            "deleted": 0,
            "noops": 0,
            "failures": []
        }))
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport").finish_non_exhaustive()
    }
}
