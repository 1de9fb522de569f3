use tower_lsp::{LspService, Server};
use tracing::info;

use crate::config::LintSettings;
use crate::log::init;
use crate::lsp::backend::Backend;

pub async fn run_server(settings: LintSettings, debug: bool) -> anyhow::Result<()> {
    let _guard = init(debug)?;

    info!("Starting golangci-lint-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::build(client, settings));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("golangci-lint-lsp server stopped");
    Ok(())
}
