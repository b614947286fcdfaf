// --- File: crates/tutorlink_common/src/lib.rs ---

pub mod error; // Error kinds and status mapping
pub mod html; // Escaping for server-rendered pages
pub mod http; // Error responses and the shared outbound client
pub mod logging; // Tracing setup
pub mod services; // Payment, notification and identity interfaces

pub use error::{external_service_error, HttpStatusCode, TutorlinkError};

pub use http::{client::HTTP_CLIENT, ApiResult, ErrorBody, ErrorDetail};

pub use logging::{init, init_from_config, init_with_level};

pub use html::escape_html;
