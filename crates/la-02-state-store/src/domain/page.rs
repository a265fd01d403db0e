//! Paged queries.

use super::errors::StoreError;
use shared_types::SharedStateRecord;

/// Which page of a query to return. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpecification {
    pub page_number: usize,
    pub page_size: usize,
}

impl PageSpecification {
    pub const DEFAULT_PAGE_SIZE: usize = 200;

    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Slice `records` down to this page.
    pub fn apply(&self, records: Vec<SharedStateRecord>) -> Result<Page, StoreError> {
        if self.page_number == 0 || self.page_size == 0 {
            return Err(StoreError::InvalidPage {
                page_number: self.page_number,
                page_size: self.page_size,
            });
        }
        let total_records = records.len();
        let start = (self.page_number - 1).saturating_mul(self.page_size);
        let records = records
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();
        Ok(Page {
            records,
            total_records,
        })
    }
}

impl Default for PageSpecification {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<SharedStateRecord>,
    /// Number of matching records across all pages.
    pub total_records: usize,
}
