//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use courier_core::prelude::*;

pub use crate::{
    ApiClient, ClientConfig, Fetch, HyperClient, StatusCode, fetch, fetch_with, header,
};
pub use serde::{Deserialize, Serialize};
