//! Call Record Stores
//!
//! Call records live in an external table. This module provides access to
//! it through a common trait so the console never depends on a particular
//! service.
//!
//! # Available Stores
//!
//! - **Rest**: PostgREST-style HTTP table API (default)
//! - **Memory**: in-process store for offline runs and tests
//!
//! # Usage
//!
//! ```ignore
//! use console_core::store::{CallStore, RestStore};
//!
//! let store = RestStore::from_settings(&config.store)?;
//! let recent = store.recent(15).await?;
//! ```

mod memory;
mod rest;
mod traits;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::CallStore;
