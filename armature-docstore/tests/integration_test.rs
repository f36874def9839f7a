//! Integration tests for armature-docstore over the in-memory transport.

mod common;

use armature_docstore::*;
use common::{product, Product};
use serde_json::json;

fn client() -> DocStoreClient<Product> {
    DocStoreClient::new(MemoryTransport::new())
}

async fn seeded(count: usize) -> DocStoreClient<Product> {
    let client = client();
    let docs: Vec<Product> = (1..=count)
        .map(|i| product(&i.to_string(), &format!("snack number {}", i), "Haoshi", i as f64))
        .collect();
    client.upsert_bulk("product", &docs).await.unwrap();
    client
}

#[tokio::test]
async fn test_index_lifecycle() {
    let indices = client().indices();

    assert!(!indices.exists("t01").await.unwrap());
    let mapping = r#"{"mappings":{"properties":{"title":{"type":"text"}}}}"#;
    assert!(indices.create("t01", mapping).await.unwrap());
    assert!(indices.exists("t01").await.unwrap());
    assert!(indices.delete("t01").await.unwrap());
    assert!(!indices.exists("t01").await.unwrap());
}

#[tokio::test]
async fn test_upsert_json_scenario() {
    let client = client();
    let json = r#"{"id":"1","title":"X","brand":"B","price":1.0}"#;

    assert_eq!(client.upsert_json("t01", json, "1", false).await.unwrap(), UpsertOutcome::Created);
    assert!(client.document_exists("t01", "1").await.unwrap());
    assert_eq!(client.upsert_json("t01", json, "1", false).await.unwrap(), UpsertOutcome::Exists);
    assert_eq!(client.upsert_json("t01", json, "1", true).await.unwrap(), UpsertOutcome::Updated);
    assert_eq!(UpsertOutcome::Updated.to_string(), "updated");
}

#[tokio::test]
async fn test_forced_upsert_replaces_stored_body() {
    let client = client();
    let original = product("1", "Red bean bread", "Haoshi", 15.0);
    let revised = product("1", "Red bean bread XL", "Haoshi", 18.5);

    client.upsert("t01", &original, false).await.unwrap();
    assert_eq!(client.upsert("t01", &revised, false).await.unwrap(), UpsertOutcome::Exists);
    let stored = client.get("t01", "1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Red bean bread");

    assert_eq!(client.upsert("t01", &revised, true).await.unwrap(), UpsertOutcome::Updated);
    let stored = client.get("t01", "1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Red bean bread XL");
    assert_eq!(stored.price, 18.5);
}

#[tokio::test]
async fn test_upsert_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latte.json");
    std::fs::write(&path, r#"{"id":"11","title":"Latte","brand":"Nescafe","price":22.8}"#).unwrap();

    let client = client();
    let outcome = client.upsert_file("t01", &path, "11", false).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    assert_eq!(client.get("t01", "11").await.unwrap().unwrap().title, "Latte");

    let err = client.upsert_file("t01", "", "12", false).await.unwrap_err();
    assert!(err.is_io());
}

#[tokio::test]
async fn test_typed_upsert_round_trips() {
    let client = client();
    let doc = product("3", "MacBook Pro", "Apple", 1999.0);

    assert_eq!(client.upsert("product", &doc, false).await.unwrap(), UpsertOutcome::Created);
    assert_eq!(client.get("product", "3").await.unwrap(), Some(doc));
    assert_eq!(client.get("product", "404").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_missing_is_not_an_error() {
    let client = seeded(2).await;

    assert_eq!(client.delete("product", "1").await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(client.delete("product", "1").await.unwrap(), DeleteOutcome::NotFound);
    assert_eq!(client.delete("product", "999").await.unwrap(), DeleteOutcome::NotFound);
    assert!(!client.document_exists("product", "1").await.unwrap());
}

#[tokio::test]
async fn test_delete_bulk_answers_every_id() {
    let client = seeded(3).await;

    let outcome = client.delete_bulk("product", ["1", "nope", "3"]).await.unwrap();
    assert_eq!(outcome.len(), 3);
    let ids: Vec<&str> = outcome.items.iter().map(|i| i.status().id.as_str()).collect();
    assert_eq!(ids, ["1", "nope", "3"]);
    assert_eq!(outcome.items[1].status().result.as_deref(), Some("not_found"));
    assert!(!outcome.errors);
    assert!(client.document_exists("product", "2").await.unwrap());
}

#[tokio::test]
async fn test_bulk_from_dir_uses_embedded_ids_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let oreo = r#"{"id":"20","title":"Oreo","brand":"Oreo","price":9.9}"#;
    std::fs::write(dir.path().join("b.json"), oreo).unwrap();
    let latte = r#"{"id":"10","title":"Latte","brand":"Nescafe","price":22.8}"#;
    std::fs::write(dir.path().join("a.json"), latte).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not json").unwrap();
    std::fs::create_dir(dir.path().join("nested.json")).unwrap();

    let client = client();
    let outcome = client.upsert_bulk_from_dir("product", dir.path()).await.unwrap();

    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.items[0].status().id, "10");
    assert_eq!(outcome.items[1].status().id, "20");
    assert_eq!(client.get("product", "20").await.unwrap().unwrap().brand, "Oreo");
}

#[tokio::test]
async fn test_bulk_from_dir_requires_ids() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.json"), r#"{"title":"anonymous"}"#).unwrap();

    let err = client().upsert_bulk_from_dir("product", dir.path()).await.unwrap_err();
    assert!(matches!(err, DocStoreError::MissingDocumentId(_)));

    let err = client()
        .upsert_bulk_from_dir("product", dir.path().join("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, DocStoreError::Io(_)));
}

#[tokio::test]
async fn test_bulk_json_and_typed() {
    let client = client();
    let outcome = client
        .upsert_bulk_json(
            "product",
            &[
                r#"{"id":"1","title":"Red bean bread","brand":"Haoshi","price":15.0}"#,
                r#"{"id":"2","title":"Red wine","brand":"Lafite","price":99.0}"#,
            ],
        )
        .await
        .unwrap();
    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.succeeded(), 2);

    let outcome = client
        .upsert_bulk("product", &[product("2", "Red wine", "Lafite", 89.0)])
        .await
        .unwrap();
    assert_eq!(outcome.items[0].status().result.as_deref(), Some("updated"));
    assert!(outcome.into_result().is_ok());
    assert_eq!(client.get("product", "2").await.unwrap().unwrap().price, 89.0);
}

#[tokio::test]
async fn test_search_pages() {
    let client = seeded(25).await;
    let query = r#"{"query":{"match_all":{}}}"#;

    let page = client.search_with_page("product", query, &PageRequest::of(2, 10)).await.unwrap();
    assert_eq!(page.total_hits(), 25);
    assert_eq!(page.number_of_elements(), 10);
    assert_eq!(page.content()[0].id, "11");
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());
    assert!(page.has_previous());

    let last = client
        .search_with_page("product", query, &page.page_request().next())
        .await
        .unwrap();
    assert_eq!(last.number_of_elements(), 5);
    assert!(!last.has_next());

    let normalized =
        client.search_with_page("product", query, &PageRequest::of(0, 0)).await.unwrap();
    assert_eq!(normalized.content()[0].id, "1");
    assert_eq!(normalized.number_of_elements(), 10);
}

#[tokio::test]
async fn test_search_without_page_uses_body_size() {
    let client = seeded(25).await;

    let docs = client
        .search("product", r#"{"size":30,"query":{"match_all":{}}}"#, None)
        .await
        .unwrap();
    assert_eq!(docs.len(), 25);

    let result = client
        .search_response("product", r#"{"query":{"term":{"id":"7"}}}"#, None)
        .await
        .unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.hits[0].id, "7");
    assert_eq!(result.hits[0].index, "product");
}

#[tokio::test]
async fn test_search_fields() {
    let client = seeded(3).await;
    let query = r#"{"_source":false,"fields":["title","price"],"query":{"ids":{"values":["2"]}}}"#;

    let fields = client.search_fields("product", query).await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["title"], json!(["snack number 2"]));
    assert_eq!(fields[0]["price"], json!([2.0]));

    // decoding `_source` from such a response is an error
    assert!(client.search("product", query, None).await.is_err());

    let page = client
        .search_fields_with_page(
            "product",
            r#"{"_source":false,"fields":["title"],"query":{"match_all":{}}}"#,
            &PageRequest::of(2, 2),
        )
        .await
        .unwrap();
    assert_eq!(page.total_hits(), 3);
    assert_eq!(page.number_of_elements(), 1);
}

#[tokio::test]
async fn test_search_simple_match() {
    let client = client();
    client
        .upsert_bulk(
            "product",
            &[
                product("1", "Red bean bread", "Haoshi", 15.0),
                product("2", "Red wine", "Lafite", 99.0),
                product("3", "MacBook Pro", "Apple", 1999.0),
            ],
        )
        .await
        .unwrap();

    let docs = client.search_simple_match("product", "title", "red").await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
}

#[tokio::test]
async fn test_search_missing_index_is_empty() {
    let client = client();
    let docs = client.search("nowhere", r#"{"query":{"match_all":{}}}"#, None).await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_template_searches() {
    let client = seeded(3).await;

    let docs = client
        .search_by_simple_template("product", "title", "number 3")
        .await
        .unwrap();
    assert!(client.scripts().exists(SIMPLE_TEMPLATE_ID).await.unwrap());
    assert_eq!(docs.len(), 3);

    let brand = ScriptTemplate::mustache(
        "by_brand",
        r#"{"query":{"term":{"brand":"{{brand}}"}},"size":{{size}}}"#,
    );
    assert!(client.scripts().create(&brand, false).await.unwrap());

    let request = TemplateRequest::new("product", "by_brand")
        .param("brand", "Haoshi")
        .param("size", 2);
    assert_eq!(client.search_by_template(&request).await.unwrap().len(), 2);

    let missing = TemplateRequest::new("product", "nope");
    assert!(matches!(
        client.search_by_template(&missing).await,
        Err(DocStoreError::Store { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_update_by_query_with_stored_script() {
    let client = seeded(4).await;
    let script = ScriptTemplate::new("price_add", "ctx._source.price += params.n");
    assert!(client.scripts().create(&script, false).await.unwrap());

    let updated = client
        .update_by_query(
            "product",
            concat!(
                r#"{"query":{"ids":{"values":["1","2"]}},"#,
                r#""script":{"id":"price_add","params":{"n":10}}}"#
            ),
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    // a mistyped script id is reported by the store
    let err = client
        .update_by_query("product", r#"{"query":{"match_all":{}},"script":{"id":"add_price"}}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DocStoreError::Store { status: 404, .. }));
}

#[tokio::test]
async fn test_script_lifecycle() {
    let scripts = client().scripts();
    let script = ScriptTemplate::new("price_add", "ctx._source.price += 1");

    assert!(scripts.create(&script, false).await.unwrap());
    assert!(scripts.exists("price_add").await.unwrap());
    assert!(scripts.delete("price_add").await.unwrap());
    assert!(!scripts.exists("price_add").await.unwrap());
    assert!(!scripts.delete("price_add").await.unwrap());
}

#[tokio::test]
async fn test_aggregations_are_unsupported_in_memory() {
    let client = seeded(2).await;
    let err = client
        .terms_buckets(
            "product",
            r#"{"size":0,"aggs":{"by_brand":{"terms":{"field":"brand"}}}}"#,
            "by_brand",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocStoreError::Store { status: 400, .. }));
}

#[tokio::test]
async fn test_clones_share_the_store() {
    let client = client();
    let other = client.clone();
    client.upsert("product", &product("1", "Latte", "Nescafe", 22.8), false).await.unwrap();
    assert!(other.document_exists("product", "1").await.unwrap());
}
