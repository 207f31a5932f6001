//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → dispatch.rs (registry lookup, schema validation, handler call)
//!     → response.rs (success / error envelope)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{Dispatcher, DispatcherBuilder, Handler, RequestContext};
pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::HttpServer;
