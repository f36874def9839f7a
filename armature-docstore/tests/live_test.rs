//! Tests against a running cluster.
//!
//! Disabled by default. Run with `DOCSTORE_URIS=http://localhost:9200 cargo test -- --ignored`.

mod common;

use armature_docstore::*;
use common::{product, Product};

fn live_client() -> DocStoreClient<Product> {
    let config = DocStoreConfig::from_env().unwrap();
    DocStoreClient::connect(config).unwrap()
}

const MAPPING: &str = r#"{
    "settings": { "number_of_shards": 1, "number_of_replicas": 0 },
    "mappings": { "properties": {
        "id": { "type": "keyword" },
        "title": { "type": "text" },
        "brand": { "type": "keyword" },
        "price": { "type": "double" },
        "suggest": { "type": "completion" }
    } }
}"#;

async fn fresh_index(client: &DocStoreClient<Product>, name: &str) {
    let indices = client.indices();
    indices.delete(name).await.unwrap();
    assert!(indices.create(name, MAPPING).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_live_index_lifecycle() {
    let client = live_client();
    fresh_index(&client, "docstore-t01").await;

    assert!(client.indices().exists("docstore-t01").await.unwrap());
    assert!(client.indices().delete("docstore-t01").await.unwrap());
    assert!(!client.indices().exists("docstore-t01").await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_live_upsert_and_search() {
    let client = live_client();
    let index = "docstore-products";
    fresh_index(&client, index).await;

    let bread = product("1", "Red bean bread", "Haoshi", 15.0);
    assert_eq!(client.upsert(index, &bread, false).await.unwrap(), UpsertOutcome::Created);
    assert_eq!(client.upsert(index, &bread, false).await.unwrap(), UpsertOutcome::Exists);
    assert_eq!(client.upsert(index, &bread, true).await.unwrap(), UpsertOutcome::Updated);

    client
        .upsert_bulk(
            index,
            &[
                product("2", "Red wine", "Lafite", 99.0),
                product("3", "MacBook Pro", "Apple", 1999.0),
            ],
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();
    client.indices().refresh(index).await.unwrap();

    let docs = client.search_simple_match(index, "title", "red").await.unwrap();
    assert_eq!(docs.len(), 2);

    let aggs = r#"{"size":0,"aggs":{"by_brand":{"terms":{"field":"brand"}}}}"#;
    let buckets = client.terms_buckets(index, aggs, "by_brand").await.unwrap();
    assert_eq!(buckets.len(), 3);

    assert_eq!(client.delete(index, "3").await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(client.delete(index, "3").await.unwrap(), DeleteOutcome::NotFound);

    client.indices().delete(index).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_live_scripts_and_update_by_query() {
    let client = live_client();
    let index = "docstore-scripts";
    fresh_index(&client, index).await;
    client.upsert(index, &product("1", "Latte", "Nescafe", 22.8), false).await.unwrap();
    client.indices().refresh(index).await.unwrap();

    let scripts = client.scripts();
    let script = ScriptTemplate::new("docstore_price_add", "ctx._source.price += params.n");
    scripts.create(&script, true).await.unwrap();

    let updated = client
        .update_by_query(
            index,
            r#"{"query":{"match_all":{}},"script":{"id":"docstore_price_add","params":{"n":1}}}"#,
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let docs = client.search_by_simple_template(index, "title", "latte").await.unwrap();
    assert_eq!(docs.len(), 1);

    assert!(scripts.delete("docstore_price_add").await.unwrap());
    client.indices().delete(index).await.unwrap();
}
