//! Shared helpers for E2E tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::Request;
use tower_lsp::lsp_types::Url;

/// Creates a temporary workspace with the given `(relative path, content)` files.
pub fn create_workspace(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = temp_dir.path().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    temp_dir
}

/// Lint command that prints the `report.json` of the project root it runs in.
pub fn fake_lint_command() -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        "cat report.json; exit 1".to_string(),
    ]
}

pub fn unused_report(file: &str, name: &str) -> String {
    json!({
        "Issues": [{
            "FromLinter": "unused",
            "Text": format!("var {name} is unused"),
            "Severity": "",
            "Pos": {"Filename": file, "Offset": 0, "Line": 4, "Column": 5}
        }],
        "Report": {"Linters": []}
    })
    .to_string()
}

pub fn file_uri(path: &Path) -> Url {
    Url::from_file_path(path).unwrap()
}

pub fn create_initialize_request(id: i64, root: &Path, options: Value) -> Request {
    Request::build("initialize")
        .id(id)
        .params(json!({
            "capabilities": {},
            "rootUri": file_uri(root),
            "initializationOptions": options,
        }))
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

pub fn create_did_open_notification(uri: &Url, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "go",
                "version": 1,
                "text": text,
            }
        }))
        .finish()
}

pub fn create_did_save_notification(uri: &Url) -> Request {
    Request::build("textDocument/didSave")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

/// Forwards every server-to-client message into a channel.
pub fn spawn_notification_collector(mut socket: ClientSocket) -> mpsc::UnboundedReceiver<Request> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(request) = socket.next().await {
            if tx.send(request).is_err() {
                break;
            }
        }
    });
    rx
}

/// Waits for the next message with the given method, skipping others.
pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
) -> Option<Request> {
    wait_for_notification_within(rx, method, Duration::from_secs(10)).await
}

/// Like `wait_for_notification`, but gives up after `limit`.
pub async fn wait_for_notification_within(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
    limit: Duration,
) -> Option<Request> {
    tokio::time::timeout(limit, async {
        while let Some(request) = rx.recv().await {
            if request.method() == method {
                return Some(request);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

pub fn create_did_close_notification(uri: &Url) -> Request {
    Request::build("textDocument/didClose")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}
