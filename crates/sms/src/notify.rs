use kharcha_core::CategorizedTransaction;

/// Receives transactions that ended up with no category so the user can be
/// asked for one. Delivery is best-effort and must not block the sync.
pub trait UnknownCategoryNotifier: Send + Sync {
    fn unknown_category(&self, tx: &CategorizedTransaction);
}

/// Default notifier: a debug-level tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl UnknownCategoryNotifier for TracingNotifier {
    fn unknown_category(&self, tx: &CategorizedTransaction) {
        tracing::debug!(
            id = ?tx.id,
            merchant = %tx.candidate.merchant,
            amount = %tx.candidate.amount,
            "transaction needs a category"
        );
    }
}

impl<F> UnknownCategoryNotifier for F
where
    F: Fn(&CategorizedTransaction) + Send + Sync,
{
    fn unknown_category(&self, tx: &CategorizedTransaction) {
        self(tx)
    }
}
