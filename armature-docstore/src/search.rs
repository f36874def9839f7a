//! Search, pagination and aggregation operations.

use crate::{
    aggregation::{
        completion_suggestions, histogram_buckets, terms_buckets, HistogramBucket, TermsBucket,
    },
    client::DocStoreClient,
    document::Document,
    error::Result,
    page::{Page, PageRequest},
    request::SearchRequestSpec,
    response::{field_maps, total_hits, SearchResult},
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

impl<T: Document> DocStoreClient<T> {
    /// Run a prepared request and return the raw response.
    pub async fn execute(&self, request: &SearchRequestSpec) -> Result<Value> {
        debug!(
            index = %request.index,
            size = ?request.size,
            from = ?request.from,
            typed_keys = request.typed_keys,
            "Executing search"
        );
        self.transport.search(request).await
    }

    /// Search with a raw JSON body and decode each hit's `_source`.
    pub async fn search(
        &self,
        index: &str,
        json: &str,
        page: Option<&PageRequest>,
    ) -> Result<Vec<T>> {
        Ok(self.search_response(index, json, page).await?.into_documents())
    }

    /// Search and keep hit metadata, total and timing.
    pub async fn search_response(
        &self,
        index: &str,
        json: &str,
        page: Option<&PageRequest>,
    ) -> Result<SearchResult<T>> {
        let request = SearchRequestSpec::build(index, json, page)?;
        let body = self.execute(&request).await?;
        SearchResult::from_response(&body)
    }

    /// Search one page. The page carries the store's total hit count.
    pub async fn search_with_page(
        &self,
        index: &str,
        json: &str,
        page: &PageRequest,
    ) -> Result<Page<T>> {
        let result = self.search_response(index, json, Some(page)).await?;
        let total = result.total;
        Ok(Page::new(result.into_documents(), *page, total))
    }

    /// Search and read each hit's `fields` projection instead of `_source`.
    ///
    /// The query must request the fields it wants.
    pub async fn search_fields(&self, index: &str, json: &str) -> Result<Vec<Map<String, Value>>> {
        let request = SearchRequestSpec::build(index, json, None)?;
        let body = self.execute(&request).await?;
        Ok(field_maps(&body))
    }

    /// Paginated variant of [`search_fields`](Self::search_fields).
    pub async fn search_fields_with_page(
        &self,
        index: &str,
        json: &str,
        page: &PageRequest,
    ) -> Result<Page<Map<String, Value>>> {
        let request = SearchRequestSpec::build(index, json, Some(page))?;
        let body = self.execute(&request).await?;
        Ok(Page::new(field_maps(&body), *page, total_hits(&body)))
    }

    /// Match `keyword` against one field.
    pub async fn search_simple_match(
        &self,
        index: &str,
        field: &str,
        keyword: &str,
    ) -> Result<Vec<T>> {
        let request = SearchRequestSpec::simple_match(index, field, keyword)?;
        let body = self.execute(&request).await?;
        Ok(SearchResult::<T>::from_response(&body)?.into_documents())
    }

    // =========================================================================
    // Aggregations
    // =========================================================================

    async fn typed_search(&self, index: &str, json: &str) -> Result<Value> {
        let request = SearchRequestSpec::build(index, json, None)?.with_typed_keys();
        self.execute(&request).await
    }

    /// Buckets of the string terms aggregation `name`.
    pub async fn terms_buckets(
        &self,
        index: &str,
        agg_json: &str,
        name: &str,
    ) -> Result<Vec<TermsBucket>> {
        let body = self.typed_search(index, agg_json).await?;
        terms_buckets(&body, name)
    }

    /// Buckets of the histogram aggregation `name`.
    pub async fn histogram_buckets(
        &self,
        index: &str,
        agg_json: &str,
        name: &str,
    ) -> Result<Vec<HistogramBucket>> {
        let body = self.typed_search(index, agg_json).await?;
        histogram_buckets(&body, name)
    }

    /// Distinct completion texts of the suggestion `name`.
    pub async fn suggestions(
        &self,
        index: &str,
        suggest_json: &str,
        name: &str,
    ) -> Result<HashSet<String>> {
        let body = self.typed_search(index, suggest_json).await?;
        completion_suggestions(&body, name)
    }
}
