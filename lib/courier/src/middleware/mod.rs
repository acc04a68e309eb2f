//! Tower middleware for [`HyperClient`](crate::HyperClient).
//!
//! Any [`Layer`] whose service maps a courier [`Request`](crate::Request) to a
//! [`Response`](crate::Response) can be added with
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer).
//!
//! ```no_run
//! use courier::HyperClient;
//! use courier::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
