//! Paged collection endpoints

use openapi_client::models::ListEnvelope;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::http::response::normalize_list;
use crate::models::entity::Entity;
use crate::models::page::Page;
use crate::sync::query::ListQuery;

impl HttpClient {
    /// Fetch one page of a collection
    pub async fn list<T: Entity>(
        &self,
        token: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, ConsoleError> {
        let envelope: ListEnvelope<T> = self
            .get(T::KIND.collection_path(), token, &query.to_request_params())
            .await?;
        normalize_list(envelope, query.page_size)
    }
}
