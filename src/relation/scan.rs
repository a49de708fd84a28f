//! Sequential scan over a heap file.
//!
//! `FileScan` walks the data pages of a relation in physical order and
//! yields each record's address. Exactly one data page is pinned at a
//! time; the pin moves forward with the scan and is released when the
//! scan runs off the end or is dropped.

use crate::buffer::{BufferPool, PageGuard};
use crate::error::{IndexError, IndexResult};
use crate::relation::heap::{DataPage, HeapFile, FIRST_DATA_PAGE};
use crate::storage::page::PageId;
use crate::storage::record::RecordId;

/// Cursor over every record of a heap file, in physical order
pub struct FileScan {
    heap: HeapFile,
    pool: BufferPool,
    next_page: PageId,
    next_slot: u16,
    guard: Option<PageGuard>,
    current: Option<RecordId>,
}

impl FileScan {
    /// Start a scan at the first record of the relation
    pub fn new(heap: &HeapFile, pool: &BufferPool) -> Self {
        FileScan {
            heap: heap.clone(),
            pool: pool.clone(),
            next_page: FIRST_DATA_PAGE,
            next_slot: 0,
            guard: None,
            current: None,
        }
    }

    /// Advance to the next record and return its address, or `EndOfFile`
    /// once the relation is exhausted
    pub fn scan_next(&mut self) -> IndexResult<RecordId> {
        loop {
            let guard = match self.guard.take() {
                Some(guard) => guard,
                None => {
                    if self.next_page >= self.heap.file().page_count() {
                        self.current = None;
                        return Err(IndexError::EndOfFile);
                    }
                    self.next_slot = 0;
                    self.pool.fetch_page(self.heap.file(), self.next_page)?
                }
            };

            let count = {
                let mut page = guard.write();
                DataPage::new(&mut page.data, self.heap.record_len()).count()
            };

            if self.next_slot < count {
                let rid = RecordId::new(self.next_page, self.next_slot);
                self.next_slot += 1;
                self.current = Some(rid);
                self.guard = Some(guard);
                return Ok(rid);
            }

            // page exhausted, release it and move on
            drop(guard);
            self.next_page += 1;
        }
    }

    /// Raw bytes of the record most recently yielded by `scan_next`
    pub fn get_record(&self) -> IndexResult<Vec<u8>> {
        let rid = self.current.ok_or(IndexError::ScanNotInitialized)?;
        let guard = self.guard.as_ref().ok_or(IndexError::ScanNotInitialized)?;
        debug_assert_eq!(guard.page_no(), rid.page);

        let mut page = guard.write();
        let data_page = DataPage::new(&mut page.data, self.heap.record_len());
        Ok(data_page.record(rid.slot).to_vec())
    }
}
