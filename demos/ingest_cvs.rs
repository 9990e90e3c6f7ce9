//! Batch-ingest the default CV set into a SQLite store.
//!
//! Reads `Jorge_cv.pdf`, `Ricardo_cv.pdf`, and `Francisco_cv.pdf` from the
//! CV directory, warning and skipping any that do not exist. Owner names are
//! derived from the file names. Runs fully offline with the deterministic
//! hash embedder; swap in a `RigEmbedder` over a real provider model for
//! production vectors.
//!
//! ```sh
//! DOSSIER_CV_DIR=./cvs DOSSIER_DB=./dossier.sqlite \
//!     cargo run --example ingest_cvs
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dossier::{HashEmbedder, Ingestor, RagConfig, RagResult, SqliteVectorStore, VectorStore};

const DEFAULT_CVS: [&str; 3] = ["Jorge_cv.pdf", "Ricardo_cv.pdf", "Francisco_cv.pdf"];

#[tokio::main]
async fn main() -> RagResult<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RagConfig::from_env();
    let cv_dir = PathBuf::from(env::var("DOSSIER_CV_DIR").unwrap_or_else(|_| "./cvs".to_string()));
    let db_path = PathBuf::from(env::var("DOSSIER_DB").unwrap_or_else(|_| "./dossier.sqlite".to_string()));

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let store = Arc::new(SqliteVectorStore::open(&db_path, config.dimension).await?);
    let ingestor = Ingestor::builder()
        .embedder(Arc::new(HashEmbedder::new(config.dimension)))
        .store(store.clone())
        .replace_existing(true)
        .build()?;

    let mut ingested = 0usize;
    for file_name in DEFAULT_CVS {
        let path = cv_dir.join(file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(path = %path.display(), "CV not found, skipping");
            continue;
        }
        let report = ingestor.upload_document(&path, None).await?;
        info!(
            owner = %report.owner,
            pages = report.pages,
            skipped_pages = report.skipped_pages,
            chunks = report.chunks,
            replaced = report.records_replaced,
            "ingested"
        );
        ingested += 1;
    }

    info!(
        documents = ingested,
        total_records = store.count().await?,
        db = %db_path.display(),
        "ingestion complete"
    );
    Ok(())
}
