//! Typed access to the admin REST resources.

use serde::Serialize;
use serde::de::DeserializeOwned;
use vigor_domain::{ApiRequest, Page, Resource};

use crate::client::AdminClient;
use crate::error::ApplicationResult;

/// CRUD over [`Resource`] collections, through the authenticated pipeline.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: AdminClient,
}

impl ResourceClient {
    /// Creates a resource client.
    #[must_use]
    pub const fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// Lists one page of a collection. Filtering and sorting are left to the
    /// server.
    ///
    /// # Errors
    ///
    /// Any error of the call, or `Decode` when the data does not fit `T`.
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource, page: Page) -> ApplicationResult<T> {
        let request = ApiRequest::get(resource.collection_path())
            .with_query("page", page.page)
            .with_query("limit", page.limit);
        self.client.data(&request).await
    }

    /// Fetches one item.
    ///
    /// # Errors
    ///
    /// `Domain` for an unusable id; otherwise as [`list`](Self::list).
    pub async fn get<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> ApplicationResult<T> {
        let request = ApiRequest::get(resource.item_path(id)?);
        self.client.data(&request).await
    }

    /// Creates an item and returns what the server stored.
    ///
    /// # Errors
    ///
    /// `Domain` when the body cannot be encoded; otherwise as [`list`](Self::list).
    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> ApplicationResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(resource.collection_path()).with_json(body)?;
        self.client.data(&request).await
    }

    /// Replaces an item and returns the updated version.
    ///
    /// # Errors
    ///
    /// `Domain` for an unusable id or body; otherwise as [`list`](Self::list).
    pub async fn update<B, T>(&self, resource: Resource, id: &str, body: &B) -> ApplicationResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::put(resource.item_path(id)?).with_json(body)?;
        self.client.data(&request).await
    }

    /// Deletes an item and returns the server's message.
    ///
    /// # Errors
    ///
    /// `Domain` for an unusable id; otherwise any error of the call.
    pub async fn delete(&self, resource: Resource, id: &str) -> ApplicationResult<String> {
        let request = ApiRequest::delete(resource.item_path(id)?);
        let envelope = self.client.send_json::<serde_json::Value>(&request).await?;
        Ok(envelope.message)
    }
}
