use std::{convert::identity, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::{
    document_store::{CollectionPath, Document, DocumentStore, SnapshotStream, merge_object},
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchDocument, END_SUFFIX, collection_prefix, doc_id},
};

/// Document store backed by a single CouchDB database.
///
/// Every collection lives in the same database under its own `_id` prefix. CouchDB has no
/// push channel that fits the snapshot contract, so subscriptions poll `_all_docs` and only
/// yield when the collection actually changed.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
    poll_interval: Duration,
}

impl CouchDocumentStore {
    /// Connect and create the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;
        let database_url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.database
        );
        let store = Self {
            client,
            database_url: database_url.into(),
            credentials: config.credentials.map(Arc::new),
            poll_interval: config.poll_interval,
        };
        store.ensure_database().await?;
        Ok(store)
    }

    /// Send a request relative to the database URL. An empty path targets the database itself.
    async fn send(
        &self,
        method: Method,
        path: &str,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> CouchResult<Response> {
        let url = if path.is_empty() {
            self.database_url.to_string()
        } else {
            format!("{}/{}", self.database_url, path)
        };
        let mut request = self.client.request(method.clone(), url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.0, Some(&credentials.1));
        }
        configure(request)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                method,
                path: path.to_string(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let response = self.send(Method::GET, "", identity).await?;
        if response.status() != StatusCode::NOT_FOUND {
            return expect_success(Method::GET, response).map(drop);
        }

        let created = self.send(Method::PUT, "", identity).await?;
        // 412: a concurrent instance created it first.
        if created.status() != StatusCode::PRECONDITION_FAILED {
            expect_success(Method::PUT, created)?;
            info!(database = %self.database_url, "created CouchDB database");
        }
        Ok(())
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<CouchDocument>> {
        let response = self.send(Method::GET, doc_id, identity).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(expect_success(Method::GET, response)?).await.map(Some)
    }

    async fn put_document(&self, doc_id: &str, body: &impl Serialize) -> CouchResult<()> {
        let response = self
            .send(Method::PUT, doc_id, |request| request.json(body))
            .await?;
        expect_success(Method::PUT, response).map(drop)
    }

    async fn list_documents(&self, collection: &CollectionPath) -> CouchResult<Vec<Document>> {
        let prefix = collection_prefix(collection);
        let range = [
            ("include_docs", "true".to_string()),
            ("startkey", Value::from(prefix.as_str()).to_string()),
            ("endkey", Value::from(format!("{prefix}{END_SUFFIX}")).to_string()),
        ];
        let response = self
            .send(Method::GET, "_all_docs", |request| request.query(&range))
            .await?;
        let page: AllDocsResponse = decode(expect_success(Method::GET, response)?).await?;

        Ok(page
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| doc.into_document(&prefix))
            .collect())
    }
}

fn expect_success(method: Method, response: Response) -> CouchResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CouchDaoError::Status {
            method,
            path: response.url().path().to_string(),
            status,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> CouchResult<T> {
    let path = response.url().path().to_string();
    response
        .json()
        .await
        .map_err(|source| CouchDaoError::Decode { path, source })
}

impl DocumentStore for CouchDocumentStore {
    fn get_all(&self, collection: &CollectionPath) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        let collection = collection.clone();
        Box::pin(async move { Ok(store.list_documents(&collection).await?) })
    }

    fn subscribe(&self, collection: &CollectionPath) -> SnapshotStream {
        let store = self.clone();
        let collection = collection.clone();
        Box::pin(async_stream::stream! {
            let mut previous: Option<Vec<Document>> = None;
            loop {
                match store.list_documents(&collection).await {
                    Ok(docs) if previous.as_ref() == Some(&docs) => {}
                    Ok(docs) => {
                        previous = Some(docs.clone());
                        yield Ok(docs);
                    }
                    Err(err) => {
                        warn!(collection = %collection, error = %err, "CouchDB poll failed");
                        previous = None;
                        yield Err(err.into());
                    }
                }
                sleep(store.poll_interval).await;
            }
        })
    }

    fn add(&self, collection: &CollectionPath, body: Value) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        let doc_id_prefix = collection.clone();
        Box::pin(async move {
            let id = Uuid::new_v4().simple().to_string();
            store.put_document(&doc_id(&doc_id_prefix, &id), &body).await?;
            Ok(id)
        })
    }

    fn merge_set(
        &self,
        collection: &CollectionPath,
        id: &str,
        patch: Value,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let collection = collection.clone();
        let key = doc_id(&collection, id);
        Box::pin(async move {
            let Value::Object(fields) = patch else {
                return Err(StorageError::Malformed {
                    id: key,
                    reason: "merge patch must be a JSON object".into(),
                });
            };
            let Some(mut existing) = store.get_document(&key).await? else {
                return Err(CouchDaoError::MissingDocument {
                    collection: collection.to_string(),
                    doc_id: key,
                }
                .into());
            };
            // The fetched `_rev` rides along so CouchDB accepts the update.
            merge_object(&mut existing.body, fields);
            Ok(store.put_document(&key, &existing).await?)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store.send(Method::GET, "", identity).await?;
            expect_success(Method::GET, response)?;
            Ok(())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ensure_database().await?) })
    }
}
