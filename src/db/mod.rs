pub mod document;
pub mod memory;
pub mod mirror;
pub mod sqlite;
pub mod store;
pub mod utils;

pub use document::DocumentStore;
pub use memory::MemoryStore;
pub use mirror::MirroredStore;
pub use sqlite::SqliteStore;
pub use store::{AccountStore, StorageError, TransactionStore};

use std::sync::Arc;

use crate::config::{Config, StoreKind};

/// The two collaborators the services are built from.
pub type Stores = (Arc<dyn AccountStore>, Arc<dyn TransactionStore>);

/// Share one backend as both the account and the transaction store.
pub fn shared<T>(store: T) -> Stores
where
    T: AccountStore + TransactionStore + 'static,
{
    let store = Arc::new(store);
    let accounts: Arc<dyn AccountStore> = store.clone();
    (accounts, store)
}

/// Open the configured backends and wire the dual write between them.
pub async fn connect_stores(config: &Config) -> Result<Stores, StorageError> {
    let relational = SqliteStore::connect(&config.database_url, config.max_connection_pooling).await?;
    tracing::info!("Connected to database");

    match relational.migrate().await {
        Ok(_) => {
            tracing::info!("Migrations run successfully");
        }
        Err(err) => {
            // if it fails we assume the database is already migrated
            tracing::warn!("Failed to run migrations: {err}");
        }
    }

    let documents = DocumentStore::open(&config.document_dir).await?;
    tracing::info!("Document store opened at {}", documents.root().display());

    let stores = match (config.primary_store, config.mirror_writes) {
        (StoreKind::Sqlite, true) => shared(MirroredStore::new(relational, documents)),
        (StoreKind::Document, true) => shared(MirroredStore::new(documents, relational)),
        (StoreKind::Sqlite, false) => shared(relational),
        (StoreKind::Document, false) => shared(documents),
    };
    tracing::info!(
        primary = ?config.primary_store,
        mirror_writes = config.mirror_writes,
        "Stores ready"
    );
    Ok(stores)
}
