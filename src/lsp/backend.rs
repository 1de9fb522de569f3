use std::path::PathBuf;
use std::sync::OnceLock;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::{InitializationOptions, LintSettings};
use crate::lint::root::normalize_path;
use crate::lint::{CommandLinter, RequestCoordinator, Translator, find_project_root};
use crate::lsp::publisher::{ClientPublisher, OpenDocuments};

type Coordinator = RequestCoordinator<CommandLinter, ClientPublisher>;

/// State fixed at `initialize`.
struct Session {
    settings: LintSettings,
    workspace: PathBuf,
    coordinator: Coordinator,
}

pub struct Backend {
    client: Client,
    settings: LintSettings,
    session: OnceLock<Session>,
    open_documents: OpenDocuments,
}

impl Backend {
    /// Creates a backend with settings from the command line; the client's
    /// initialization options are applied on top at `initialize`.
    pub fn build(client: Client, settings: LintSettings) -> Self {
        Self {
            client,
            settings,
            session: OnceLock::new(),
            open_documents: OpenDocuments::default(),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::NONE),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                    ..Default::default()
                },
            )),
            ..Default::default()
        }
    }

    fn start_session(&self, params: &InitializeParams) {
        let options = params
            .initialization_options
            .clone()
            .map(|value| {
                serde_json::from_value::<InitializationOptions>(value).unwrap_or_else(|e| {
                    warn!("Ignoring malformed initialization options: {}", e);
                    InitializationOptions::default()
                })
            })
            .unwrap_or_default();
        let settings = self.settings.clone().merge(options);
        let workspace = workspace_root(&settings, params);
        info!("Workspace root: {:?}", workspace);

        let coordinator = RequestCoordinator::new(
            CommandLinter::new(
                settings.command.clone(),
                settings.issues_exit_code,
                settings.timeout,
            ),
            ClientPublisher::new(self.client.clone(), self.open_documents.clone()),
            Translator::new(settings.no_linter_name),
        );

        let session = Session {
            settings,
            workspace,
            coordinator,
        };
        if self.session.set(session).is_err() {
            warn!("initialize received twice, keeping the first session");
        }
    }

    async fn lint(&self, uri: Url) {
        let Some(session) = self.session.get() else {
            warn!("Lint requested before initialize: {}", uri);
            return;
        };

        let Ok(path) = uri.to_file_path() else {
            debug!("Ignoring non-file URI {}", uri);
            return;
        };
        let path = normalize_path(&path);
        let Some(dir) = path.parent() else {
            return;
        };

        let root = match find_project_root(dir, &session.workspace, &session.settings.marker) {
            Ok(root) => root,
            Err(e) => {
                warn!("Cannot lint {}: {}", uri, e);
                self.client
                    .log_message(MessageType::WARNING, format!("Cannot lint {}: {}", uri, e))
                    .await;
                self.client.publish_diagnostics(uri, Vec::new(), None).await;
                return;
            }
        };

        self.open_documents.insert(path.clone());
        let ticket = session.coordinator.submit(root, vec![path]);
        tokio::spawn(async move {
            let outcome = ticket.wait().await;
            debug!("Lint request for {} finished: {:?}", uri, outcome);
        });
    }
}

fn workspace_root(settings: &LintSettings, params: &InitializeParams) -> PathBuf {
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();

    settings
        .workspace_root
        .clone()
        .or_else(|| root_uri.and_then(|uri| uri.to_file_path().ok()))
        .or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first())
                .and_then(|folder| folder.uri.to_file_path().ok())
        })
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;
        self.start_session(&params);
        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "golangci-lint-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.client
            .log_message(
                MessageType::LOG,
                format!("Document opened: {}", params.text_document.uri),
            )
            .await;
        self.lint(params.text_document.uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.lint(params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Ok(path) = params.text_document.uri.to_file_path() {
            self.open_documents.remove(&normalize_path(&path));
        }
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }
}
