//! Formsmith API Client
//!
//! Bridges the in-memory editing model to the REST backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use formsmith_client::{AppContext, ClientConfig, Result};
//! use formsmith_core::{FieldType, Template};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = AppContext::new(ClientConfig::default())?;
//!     ctx.login("ada@example.com", "hunter2").await?;
//!
//!     let mut session = ctx.new_session(Template::Survey, "group-1");
//!     session.edit(|editor| editor.add_field(FieldType::Email));
//!     session.save().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

pub use client::{ClientConfig, FormsClient};
pub use context::{AppContext, AuthSession};
pub use error::{AuthErrorCode, ClientError};
pub use models::*;
pub use session::{EditingSession, LeaveCheck, LeaveChoice, LeaveDecision, SessionState};
pub use store::FormStore;

use std::time::Duration;

/// Client version, sent in the user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
