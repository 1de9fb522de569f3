pub mod config;
pub mod lint;
pub mod log;
pub mod lsp;
