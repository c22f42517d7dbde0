//! Local stand-in for the voxfill inference service
//!
//! Serves `POST /structure` and `POST /color` with chunked, line-delimited
//! JSON produced by a deterministic [`MockModel`]:
//! ```ignore
//! let server = MockServer::spawn(MockModel::Solid)?;
//! let transport = HttpTransport::new(&server.endpoint())?;
//! ```

pub mod error;
pub mod protocol;
pub mod server;

pub use error::MockError;
pub use protocol::*;
pub use server::{serve, MockServer};

/// Port the standalone server listens on by default
pub const DEFAULT_PORT: u16 = 8001;
