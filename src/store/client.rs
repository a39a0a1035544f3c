use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde_json::json;
use url::Url;

use crate::app_config::StoreConfig;
use crate::errors::StoreError;
use crate::store::models::{AllDocsResponse, DecisionDoc};

/// Outcome of an insert against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// The document was created
    Created,
    /// A document with this key already existed; the intent is satisfied
    AlreadyExists,
}

/// Thin interface to the remote keyed document service.
///
/// The store owns all decisions; this process only holds a read-through copy
/// for the duration of one run. Conflicting inserts on an existing key are an
/// explicit insert-or-ignore-if-exists contract, surfaced as
/// [`Inserted::AlreadyExists`] rather than an error.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// List every decision document
    async fn list_decisions(&self) -> Result<Vec<DecisionDoc>, StoreError>;

    /// Fetch a single decision by fingerprint
    async fn get_decision(&self, fingerprint: &str) -> Result<Option<DecisionDoc>, StoreError>;

    /// Persist a decision, tolerating an existing document under the same key
    async fn insert_decision(&self, doc: &DecisionDoc) -> Result<Inserted, StoreError>;

    /// List every stopword pattern (document ids are the patterns)
    async fn list_stopwords(&self) -> Result<Vec<String>, StoreError>;

    /// Persist a stopword pattern, tolerating an existing entry
    async fn insert_stopword(&self, pattern: &str) -> Result<Inserted, StoreError>;
}

// Allows a shared store handle wherever an owned one is expected
#[async_trait]
impl<T: DecisionStore + ?Sized> DecisionStore for std::sync::Arc<T> {
    async fn list_decisions(&self) -> Result<Vec<DecisionDoc>, StoreError> {
        (**self).list_decisions().await
    }

    async fn get_decision(&self, fingerprint: &str) -> Result<Option<DecisionDoc>, StoreError> {
        (**self).get_decision(fingerprint).await
    }

    async fn insert_decision(&self, doc: &DecisionDoc) -> Result<Inserted, StoreError> {
        (**self).insert_decision(doc).await
    }

    async fn list_stopwords(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_stopwords().await
    }

    async fn insert_stopword(&self, pattern: &str) -> Result<Inserted, StoreError> {
        (**self).insert_stopword(pattern).await
    }
}

/// CouchDB-compatible implementation of [`DecisionStore`] over HTTP
pub struct CouchStore {
    /// HTTP client for store requests
    client: Client,
    /// Base endpoint URL, credentials included
    base: Url,
    /// Database holding decisions
    decisions_db: String,
    /// Database holding stopwords
    stopwords_db: String,
}

impl CouchStore {
    /// Create a new store client from connection settings
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| StoreError::InvalidEndpoint(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            base,
            decisions_db: config.decisions_db.clone(),
            stopwords_db: config.stopwords_db.clone(),
        })
    }

    /// Build a URL for a database or a document within it; path segments are
    /// percent-encoded, which matters for stopword ids like `@gmail\.com`
    fn url_for(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidEndpoint("endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Create both databases if they do not exist yet.
    ///
    /// An already-existing database (HTTP 412) is fine; any other failure is
    /// surfaced so the caller can decide whether to continue without the
    /// store.
    pub async fn ensure_databases(&self) -> Result<(), StoreError> {
        for db in [&self.decisions_db, &self.stopwords_db] {
            let url = self.url_for(&[db])?;
            let response = self
                .client
                .put(url)
                .send()
                .await
                .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

            match response.status() {
                s if s.is_success() => debug!("Created store database '{}'", db),
                StatusCode::PRECONDITION_FAILED => {}
                status => {
                    let message = response.text().await.unwrap_or_default();
                    return Err(StoreError::StatusError {
                        status_code: status.as_u16(),
                        message,
                    });
                }
            }
        }
        Ok(())
    }

    /// List all document rows of a database
    async fn list_rows(
        &self,
        db: &str,
        include_docs: bool,
    ) -> Result<AllDocsResponse<DecisionDoc>, StoreError> {
        let mut url = self.url_for(&[db, "_all_docs"])?;
        if include_docs {
            url.query_pairs_mut().append_pair("include_docs", "true");
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Store list on '{}' failed ({}): {}", db, status, message);
            return Err(StoreError::StatusError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<AllDocsResponse<DecisionDoc>>()
            .await
            .map_err(|e| StoreError::DecodeError(e.to_string()))
    }
}

#[async_trait]
impl DecisionStore for CouchStore {
    async fn list_decisions(&self) -> Result<Vec<DecisionDoc>, StoreError> {
        let response = self.list_rows(&self.decisions_db, true).await?;

        let docs = response
            .rows
            .into_iter()
            .filter(|row| !row.id.starts_with("_design/"))
            .filter_map(|row| row.doc)
            .collect();

        Ok(docs)
    }

    async fn get_decision(&self, fingerprint: &str) -> Result<Option<DecisionDoc>, StoreError> {
        let url = self.url_for(&[&self.decisions_db, fingerprint])?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let doc = response
                    .json::<DecisionDoc>()
                    .await
                    .map_err(|e| StoreError::DecodeError(e.to_string()))?;
                Ok(Some(doc))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(StoreError::StatusError {
                    status_code: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn insert_decision(&self, doc: &DecisionDoc) -> Result<Inserted, StoreError> {
        let url = self.url_for(&[&self.decisions_db, &doc.id])?;

        let response = self
            .client
            .put(url)
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => {
                debug!("Decision for {} already stored", doc.id);
                Ok(Inserted::AlreadyExists)
            }
            s if s.is_success() => Ok(Inserted::Created),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(StoreError::StatusError {
                    status_code: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn list_stopwords(&self) -> Result<Vec<String>, StoreError> {
        let response = self.list_rows(&self.stopwords_db, false).await?;

        let patterns = response
            .rows
            .into_iter()
            .map(|row| row.id)
            .filter(|id| !id.starts_with("_design/"))
            .collect();

        Ok(patterns)
    }

    async fn insert_stopword(&self, pattern: &str) -> Result<Inserted, StoreError> {
        let url = self.url_for(&[&self.stopwords_db, pattern])?;

        let response = self
            .client
            .put(url)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => Ok(Inserted::AlreadyExists),
            s if s.is_success() => Ok(Inserted::Created),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(StoreError::StatusError {
                    status_code: status.as_u16(),
                    message,
                })
            }
        }
    }
}
