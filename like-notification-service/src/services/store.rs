use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    Client as MongoClient, Database,
};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Read-only access to documents keyed by id. Records come back as untyped
/// BSON field maps; callers pick out the fields they need.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoDocumentStore {
    client: MongoClient,
    db: Database,
}

impl MongoDocumentStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "MongoDB client ready");
        Ok(Self { client, db })
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let document = self
            .db
            .collection::<Document>(collection)
            .find_one(doc! { "_id": id }, None)
            .await
            .inspect_err(|e| {
                tracing::error!(collection = %collection, id = %id, "Failed to fetch document: {}", e);
            })?;
        Ok(document)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .inspect_err(|e| tracing::error!("MongoDB health check failed: {}", e))?;
        Ok(())
    }
}

/// In-process store for tests and local runs without a database.
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<(String, String), Document>>,
    available: AtomicBool,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn insert(&self, collection: &str, id: &str, document: Document) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert((collection.to_string(), id.to_string()), document);
        }
    }

    /// Make every subsequent call fail as if the database were unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "document store is unreachable"
            )))
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        self.ensure_available()?;
        let documents = self
            .documents
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory store mutex poisoned: {}", e))?;
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.ensure_available()
    }
}
