use chrono::Local;

use crate::filing::NormalizedFiling;
use crate::formats::{PROCESSED_AT_FORMAT, ProcessedReportRecord};
use crate::normalize::FilingIdentity;
use crate::store::{ReportStore, StoreError};

/// Set-membership check over the store. `Unseen -> Seen` is the only transition.
pub struct DedupGate<'a> {
    store: &'a mut dyn ReportStore,
}

impl<'a> DedupGate<'a> {
    pub fn new(store: &'a mut dyn ReportStore) -> Self {
        Self { store }
    }

    pub fn is_new(&self, identity: &FilingIdentity) -> Result<bool, StoreError> {
        let seen = self.store.contains(identity.as_str())?;
        if seen {
            tracing::info!(%identity, "filing already processed");
        }
        Ok(!seen)
    }

    /// Upserts the metadata row for `identity`, marking it seen.
    pub fn record(
        &mut self,
        identity: &FilingIdentity,
        filing: &NormalizedFiling,
    ) -> Result<(), StoreError> {
        let processed_at = Local::now().format(PROCESSED_AT_FORMAT).to_string();
        let record = ProcessedReportRecord::new(identity, filing, processed_at);
        self.store.upsert(&record)?;
        tracing::info!(%identity, "recorded filing as processed");
        Ok(())
    }
}
