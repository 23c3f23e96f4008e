//! Email documents and the in-memory store that owns them.
//!
//! The store is the single source of truth for categorization state.
//! Every write is a shallow merge keyed by the document id, so partial
//! updates from the ingestion source and from manual requests never
//! erase what an earlier writer recorded.

mod model;
mod store;

pub use model::{DisplayFields, EmailDate, EmailDocument, IncomingEmail, classification_text};
pub use store::EmailStore;
