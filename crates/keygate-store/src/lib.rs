//! Customer-scoped entity queries and stores for KeyGate.
//!
//! A [`Query`] describes what to fetch. It only reaches an [`EntityStore`]
//! after [`ScopeBinder::bind`] turns it into a [`ScopedQuery`] tied to one
//! credential's customer, so the store never sees an unscoped read.

mod error;
mod memory;
pub mod query;
pub mod scope;
mod store;

pub use error::StoreError;
pub use memory::MemoryEntityStore;
pub use query::{OrderBy, Query};
pub use scope::{ScopeBinder, ScopedQuery};
pub use store::EntityStore;
