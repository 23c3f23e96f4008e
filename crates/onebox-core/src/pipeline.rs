//! Ingestion and categorization pipeline.
//!
//! Both the mail source and manual requests end up in
//! [`Pipeline::categorize_and_notify`], which:
//! 1. classifies the text (never fails, see [`Classifier`])
//! 2. normalizes the label into a [`Category`]
//! 3. writes the category and evaluates the notification guard in one
//!    locked store update
//! 4. fires the interested-lead notification in the background if the
//!    guard tripped
//! 5. pushes the updated document to the index in the background
//!
//! The guard flag is set before the notification is attempted, so a lead
//! is notified at most once even if delivery fails.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Result;
use crate::category;
use crate::email::{DisplayFields, EmailDocument, EmailStore, IncomingEmail, classification_text};
use crate::index::SearchIndex;
use crate::llm::Classifier;
use crate::notify::{InterestedPayload, NotificationDispatcher};
use crate::tasks::BackgroundTasks;

/// Orchestrates store updates, classification, notification and indexing.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<EmailStore>,
    classifier: Classifier,
    dispatcher: NotificationDispatcher,
    index: Arc<dyn SearchIndex>,
    background: Arc<BackgroundTasks>,
}

impl Pipeline {
    /// Wire a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<EmailStore>,
        classifier: Classifier,
        dispatcher: NotificationDispatcher,
        index: Arc<dyn SearchIndex>,
        background: Arc<BackgroundTasks>,
    ) -> Self {
        Self {
            store,
            classifier,
            dispatcher,
            index,
            background,
        }
    }

    /// The store this pipeline writes to.
    #[must_use]
    pub const fn store(&self) -> &Arc<EmailStore> {
        &self.store
    }

    /// Classify `text` for document `id` and record the result.
    ///
    /// Creates a bare document if `id` is unknown. Collaborator failures
    /// never surface here; the returned document reflects committed store
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if `id` is empty.
    pub async fn categorize_and_notify(&self, id: &str, text: &str) -> Result<EmailDocument> {
        if id.trim().is_empty() {
            return Err(crate::Error::invalid_argument("email id must not be empty"));
        }

        let label = self.classifier.classify(text).await;
        let category = category::normalize(Some(&label));

        let (document, notify) = self.store.update(id, |document| {
            document.category = Some(category);
            let first_positive = category.is_positive() && !document.is_notified_interested();
            if first_positive {
                document.notified_interested = Some(true);
            }
            first_positive
        })?;

        tracing::info!(email_id = %id, %category, notify, "Email categorized");

        if notify {
            self.spawn_notification(InterestedPayload::for_document(&document, category));
        }
        self.spawn_index(document.clone());

        Ok(document)
    }

    /// Record caller-supplied display fields, then categorize on
    /// `subject + "\n\n" + body`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if `id` is empty.
    pub async fn categorize_manual(
        &self,
        id: &str,
        fields: DisplayFields,
    ) -> Result<EmailDocument> {
        let text = classification_text(fields.subject.as_deref(), fields.body.as_deref());
        self.store.upsert(fields.into_partial(id))?;
        self.categorize_and_notify(id, &text).await
    }

    /// Record a newly discovered message and categorize it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the message id is empty.
    pub async fn ingest(&self, email: IncomingEmail) -> Result<EmailDocument> {
        let text = classification_text(email.subject.as_deref(), email.body.as_deref());
        let document = self.store.upsert(EmailDocument::from(email))?;
        tracing::debug!(email_id = %document.id, "Ingested email");
        self.categorize_and_notify(&document.id, &text).await
    }

    /// Consume messages from the mail source until the channel closes.
    ///
    /// A message that cannot be ingested is logged and skipped.
    pub async fn run_ingest(&self, mut incoming: mpsc::Receiver<IncomingEmail>) {
        while let Some(email) = incoming.recv().await {
            let id = email.id.clone();
            if let Err(e) = self.ingest(email).await {
                tracing::warn!(email_id = %id, error = %e, "Dropping email that could not be ingested");
            }
        }
        tracing::info!("Ingestion source closed");
    }

    fn spawn_notification(&self, payload: InterestedPayload) {
        let dispatcher = self.dispatcher.clone();
        self.background.spawn("notify-interested", async move {
            dispatcher.notify_interested(&payload).await;
        });
    }

    fn spawn_index(&self, document: EmailDocument) {
        let index = Arc::clone(&self.index);
        self.background.spawn("index-email", async move {
            if let Err(e) = index.index(&document).await {
                tracing::warn!(email_id = %document.id, error = %e, "Indexing failed");
            }
        });
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier)
            .field("pending_tasks", &self.background.pending())
            .finish_non_exhaustive()
    }
}
