//! In-memory email store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::model::EmailDocument;
use crate::{Error, Result};

/// Process-lifetime keyed collection of email documents.
///
/// A single lock guards the whole map; every mutation runs with exclusive
/// access, so concurrent upserts never interleave field writes.
#[derive(Debug, Default)]
pub struct EmailStore {
    documents: RwLock<HashMap<String, EmailDocument>>,
}

impl EmailStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `partial` into the record for `partial.id`, creating it if absent.
    ///
    /// Returns the resulting full record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is empty.
    pub fn upsert(&self, partial: EmailDocument) -> Result<EmailDocument> {
        validate_id(&partial.id)?;

        let mut documents = self.write();
        let document = documents
            .entry(partial.id.clone())
            .or_insert_with(|| EmailDocument::new(partial.id.clone()));
        document.merge(partial);
        Ok(document.clone())
    }

    /// Apply `mutate` to the record for `id` while holding the write lock.
    ///
    /// A bare record is created first if `id` is unknown. Returns the updated
    /// record together with the closure's output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is empty.
    pub fn update<R>(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut EmailDocument) -> R,
    ) -> Result<(EmailDocument, R)> {
        validate_id(id)?;

        let mut documents = self.write();
        let document = documents
            .entry(id.to_string())
            .or_insert_with(|| EmailDocument::new(id));
        let output = mutate(document);
        Ok((document.clone(), output))
    }

    /// Get the record for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<EmailDocument> {
        self.read().get(id).cloned()
    }

    /// Snapshot of every record, in no particular order.
    #[must_use]
    pub fn list(&self) -> Vec<EmailDocument> {
        self.read().values().cloned().collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Poisoning is recovered: merge only ever assigns whole fields.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, EmailDocument>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, EmailDocument>> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::invalid_argument("email id must not be empty"));
    }
    Ok(())
}
