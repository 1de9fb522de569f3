// LSP protocol layer
// - server.rs: stdio server bootstrap
// - backend.rs: LanguageServer trait implementation
// - publisher.rs: client-backed diagnostic publishing

pub mod backend;
pub mod publisher;
pub mod server;
