use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Diagnostic, MessageType, Url};
use tracing::{debug, error, warn};

use crate::lint::DiagnosticPublisher;

/// Paths of the documents the editor currently has open.
#[derive(Debug, Clone, Default)]
pub struct OpenDocuments(Arc<Mutex<HashSet<PathBuf>>>);

impl OpenDocuments {
    pub fn insert(&self, path: PathBuf) {
        self.lock().insert(path);
    }

    pub fn remove(&self, path: &Path) {
        self.lock().remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forwards diagnostic sets to the editor, skipping documents closed while
/// their run was in flight.
pub struct ClientPublisher {
    client: Client,
    open_documents: OpenDocuments,
}

impl ClientPublisher {
    pub fn new(client: Client, open_documents: OpenDocuments) -> Self {
        Self {
            client,
            open_documents,
        }
    }
}

#[async_trait]
impl DiagnosticPublisher for ClientPublisher {
    async fn publish(&self, file: PathBuf, diagnostics: Vec<Diagnostic>) {
        if !self.open_documents.contains(&file) {
            debug!("Skipping diagnostics for closed document {:?}", file);
            return;
        }

        let Ok(uri) = Url::from_file_path(&file) else {
            warn!("Cannot convert {:?} to a file URI", file);
            return;
        };

        self.client
            .log_message(
                MessageType::LOG,
                format!("Publishing {} diagnostics for {}", diagnostics.len(), uri),
            )
            .await;

        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    async fn publish_error(&self, files: Vec<PathBuf>, message: String) {
        error!("golangci-lint failed for {:?}: {}", files, message);
        self.client
            .show_message(MessageType::ERROR, format!("golangci-lint: {}", message))
            .await;
    }
}
