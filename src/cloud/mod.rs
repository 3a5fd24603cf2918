//! Cloud storage collaborators: authorization and file upload.
//!
//! - `session`: the opaque authorized-session capability
//! - `oauth`: Google OAuth 2.0 authorization-code flow with PKCE
//! - `gate`: in-memory login state guarding export
//! - `drive`: Google Drive uploader that files documents by label

mod drive;
mod gate;
mod oauth;
mod session;

pub use drive::{DriveConfig, DriveUploader, StorageUploader, UploadError};
pub use gate::{AuthGate, AuthRedirect};
pub use oauth::{pkce, AuthError, AuthProvider, GoogleOAuth, OAuthConfig};
pub use session::AuthorizedSession;
