//! HTTP request handlers for the web server.

mod auth;
mod export;
mod health;
mod helpers;
mod intake;
mod labels;
mod registry;

// Re-export handlers for use by the router
pub use auth::{auth_status, authorize, logout, oauth_callback};
pub use export::save_to_drive;
pub use health::health;
pub use intake::upload_document;
pub use labels::update_label;
pub use registry::list_documents;
