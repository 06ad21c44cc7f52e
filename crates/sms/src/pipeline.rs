use kharcha_classify::Classifier;
use kharcha_core::{CategorizedTransaction, RawMessage, UserCategoryMapping};
use serde::Serialize;

use crate::extract::Extractor;
use crate::notify::{TracingNotifier, UnknownCategoryNotifier};
use crate::store::{InsertOutcome, StoreError, TransactionStore};

/// Counts from one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Every message in the batch.
    pub total_seen: usize,
    /// Newly stored transactions.
    pub processed: usize,
    /// Messages already recorded, including conflicts lost to another writer.
    pub already_recorded: usize,
    /// Messages that are not transactions.
    pub rejected: usize,
}

/// Orchestrates: dedup check → extract → classify → persist → notify.
pub struct SyncCoordinator<S: TransactionStore, N: UnknownCategoryNotifier = TracingNotifier> {
    store: S,
    extractor: Extractor,
    classifier: Classifier,
    notifier: N,
}

impl<S: TransactionStore> SyncCoordinator<S, TracingNotifier> {
    pub fn new(store: S, extractor: Extractor, classifier: Classifier) -> Self {
        Self {
            store,
            extractor,
            classifier,
            notifier: TracingNotifier,
        }
    }
}

impl<S: TransactionStore, N: UnknownCategoryNotifier> SyncCoordinator<S, N> {
    pub fn with_notifier<M: UnknownCategoryNotifier>(self, notifier: M) -> SyncCoordinator<S, M> {
        SyncCoordinator {
            store: self.store,
            extractor: self.extractor,
            classifier: self.classifier,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract and classify without touching the store.
    pub fn process(
        &self,
        message: &RawMessage,
        mappings: &[UserCategoryMapping],
    ) -> Option<CategorizedTransaction> {
        let candidate = self.extractor.extract_message(message)?;
        let classification = self.classifier.classify(&candidate, mappings);
        Some(CategorizedTransaction::new(candidate, classification))
    }

    /// Runs a batch in the order given. User mappings are read once up front.
    /// Store failures abort the batch; everything else is absorbed per message.
    pub async fn sync<I>(&self, messages: I) -> Result<SyncSummary, StoreError>
    where
        I: IntoIterator<Item = RawMessage>,
    {
        let mappings = self.store.user_mappings().await?;
        let mut summary = SyncSummary::default();

        for message in messages {
            summary.total_seen += 1;
            match self.store_one(&message, &mappings).await? {
                Ingested::Stored(_) => summary.processed += 1,
                Ingested::AlreadyRecorded => summary.already_recorded += 1,
                Ingested::Rejected => summary.rejected += 1,
            }
        }

        tracing::info!(
            total = summary.total_seen,
            processed = summary.processed,
            already_recorded = summary.already_recorded,
            rejected = summary.rejected,
            "sms sync finished"
        );
        Ok(summary)
    }

    /// Handles one freshly received message. Returns the stored transaction,
    /// or `None` if the message was already recorded or is not a transaction.
    pub async fn ingest(
        &self,
        message: RawMessage,
    ) -> Result<Option<CategorizedTransaction>, StoreError> {
        let mappings = self.store.user_mappings().await?;
        match self.store_one(&message, &mappings).await? {
            Ingested::Stored(tx) => Ok(Some(tx)),
            Ingested::AlreadyRecorded | Ingested::Rejected => Ok(None),
        }
    }

    async fn store_one(
        &self,
        message: &RawMessage,
        mappings: &[UserCategoryMapping],
    ) -> Result<Ingested, StoreError> {
        if self.store.exists(&message.body).await? {
            return Ok(Ingested::AlreadyRecorded);
        }

        let Some(mut tx) = self.process(message, mappings) else {
            return Ok(Ingested::Rejected);
        };

        match self.store.insert(&tx).await? {
            InsertOutcome::Inserted(id) => {
                tx.id = Some(id);
                if tx.classification.is_unknown() {
                    self.notifier.unknown_category(&tx);
                }
                Ok(Ingested::Stored(tx))
            }
            InsertOutcome::Duplicate => {
                tracing::warn!(sender = %message.sender, "message recorded concurrently; skipped");
                Ok(Ingested::AlreadyRecorded)
            }
        }
    }
}

enum Ingested {
    Stored(CategorizedTransaction),
    AlreadyRecorded,
    Rejected,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
