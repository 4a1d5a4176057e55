//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! RequestOptions (method, headers, body)
//!     → request.rs (request ID, resolve against a host URL)
//!     → executor.rs (deadline, shutdown abort)
//!     → transport.rs (reqwest or injected transport)
//!     → response.rs (status, headers, body)
//! ```

pub mod executor;
pub mod request;
pub mod response;
pub mod transport;

pub use executor::RequestExecutor;
pub use request::{RequestId, RequestOptions, TransportRequest, X_REQUEST_ID};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportError};
