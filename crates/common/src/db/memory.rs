//! In-memory property store for development and tests

use crate::db::filter::PropertyFilter;
use crate::db::record::PropertyRecord;
use crate::db::repository::{Page, PropertyStore};
use crate::errors::Result;
use async_trait::async_trait;
use std::time::Instant;
use tokio::sync::RwLock;

/// Property store holding records in process memory
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<PropertyRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PropertyRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn insert(&self, record: PropertyRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PropertyStore for InMemoryStore {
    async fn find(&self, filter: &PropertyFilter, page: Page) -> Result<Vec<PropertyRecord>> {
        let start = Instant::now();
        let records = self.records.read().await;

        let mut matching: Vec<&PropertyRecord> =
            records.iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        let window: Vec<PropertyRecord> = matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();

        crate::metrics::record_store_query(
            start.elapsed().as_secs_f64(),
            self.backend(),
            window.len(),
        );

        Ok(window)
    }

    async fn count(&self, filter: &PropertyFilter) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
