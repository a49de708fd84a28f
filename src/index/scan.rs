//! Range scans over the index.
//!
//! A scan is bounded below by `>`/`>=` and above by `<`/`<=`. Starting a
//! scan descends to the leaf that may hold the lower bound and pins it;
//! from then on exactly one leaf stays pinned while `scan_next` walks the
//! entries and hops across `right_sibling` links. The rightmost leaf ends
//! the chain with page number 0, which cannot be pinned; the cursor
//! records that as the exhausted state and lets the completion checks
//! fire on it.

use crate::buffer::PageGuard;
use crate::error::{IndexError, IndexResult};
use crate::index::btree::BTreeIndex;
use crate::storage::node::{self, InternalNode, LeafNode, LEAF_FANOUT};
use crate::storage::page::INVALID_PAGE;
use crate::storage::record::RecordId;

/// Comparison operator bounding one side of a range scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    /// Less than
    Lt,
    /// Less than or equal to
    Lte,
    /// Greater than or equal to
    Gte,
    /// Greater than
    Gt,
}

/// State of the single active scan
pub(crate) struct ScanState {
    low: i32,
    high: i32,
    low_inclusive: bool,
    high_inclusive: bool,
    /// Slot of the next entry to report in the held leaf
    next_entry: usize,
    /// The currently pinned leaf; `None` once the chain ran out
    guard: Option<PageGuard>,
}

impl BTreeIndex {
    /// Begin a filtered scan over `[low, high]` with the given bound
    /// operators. Any scan already running is ended first.
    ///
    /// Fails with `BadOpcodes` unless `low_op` is `Gt`/`Gte` and
    /// `high_op` is `Lt`/`Lte`, with `BadScanRange` when `low > high`,
    /// and with `NoSuchKeyFound` when no entry falls within the bounds.
    pub fn start_scan(
        &mut self,
        low: i32,
        low_op: RangeOp,
        high: i32,
        high_op: RangeOp,
    ) -> IndexResult<()> {
        let low_inclusive = match low_op {
            RangeOp::Gte => true,
            RangeOp::Gt => false,
            _ => return Err(IndexError::BadOpcodes),
        };
        let high_inclusive = match high_op {
            RangeOp::Lte => true,
            RangeOp::Lt => false,
            _ => return Err(IndexError::BadOpcodes),
        };
        if low > high {
            return Err(IndexError::BadScanRange);
        }

        // implicitly terminate a scan that is still running
        self.scan = None;

        // descend to the leaf that may contain the lower bound, pinning
        // internal pages only while choosing the child
        let mut page_no = self.root_page_no();
        let guard = loop {
            let guard = self.pool().fetch_page(self.file(), page_no)?;
            let child = {
                let mut page = guard.write();
                if node::is_leaf(&page.data) {
                    None
                } else {
                    let inner = InternalNode::new(&mut page.data);
                    Some(inner.child(inner.descend_index(low)))
                }
            };
            match child {
                None => break guard,
                Some(child) => page_no = child, // guard drops clean
            }
        };

        // position on the first candidate entry, hopping to the right
        // sibling when the lower bound falls past this leaf
        let entry = {
            let mut page = guard.write();
            LeafNode::new(&mut page.data).scan_index(low, low_inclusive)
        };
        let mut state = ScanState {
            low,
            high,
            low_inclusive,
            high_inclusive,
            next_entry: 0,
            guard: Some(guard),
        };
        match entry {
            Some(i) => state.next_entry = i,
            None => self.move_to_next_page(&mut state)?,
        }

        if self.scan_entry(&state).is_none() {
            // dropping the state releases the held leaf
            return Err(IndexError::NoSuchKeyFound);
        }
        self.scan = Some(state);
        Ok(())
    }

    /// Record id of the next entry matching the scan.
    ///
    /// Fails with `ScanNotInitialized` when no scan is active and with
    /// `IndexScanCompleted` past the last matching entry (the scan stays
    /// active until `end_scan`).
    pub fn scan_next(&mut self) -> IndexResult<RecordId> {
        let mut state = match self.scan.take() {
            Some(state) => state,
            None => return Err(IndexError::ScanNotInitialized),
        };
        let result = self.scan_step(&mut state);
        self.scan = Some(state);
        result
    }

    /// Terminate the current scan and release the held leaf
    pub fn end_scan(&mut self) -> IndexResult<()> {
        match self.scan.take() {
            Some(_) => Ok(()), // guard drops clean
            None => Err(IndexError::ScanNotInitialized),
        }
    }

    fn scan_step(&self, state: &mut ScanState) -> IndexResult<RecordId> {
        let (_, rid) = self
            .scan_entry(state)
            .ok_or(IndexError::IndexScanCompleted)?;

        // advance past the reported entry
        state.next_entry += 1;
        let hop = state.next_entry >= LEAF_FANOUT
            || match state.guard.as_ref() {
                Some(guard) => {
                    let mut page = guard.write();
                    LeafNode::new(&mut page.data).rid(state.next_entry).is_empty()
                }
                None => false,
            };
        if hop {
            self.move_to_next_page(state)?;
        }

        Ok(rid)
    }

    /// The entry under the cursor, or `None` when it is empty, out of
    /// bounds or the leaf chain is exhausted
    fn scan_entry(&self, state: &ScanState) -> Option<(i32, RecordId)> {
        let guard = state.guard.as_ref()?;
        let mut page = guard.write();
        let leaf = LeafNode::new(&mut page.data);

        let rid = leaf.rid(state.next_entry);
        let key = leaf.key(state.next_entry);
        if rid.is_empty()
            || key > state.high
            || (key == state.high && !state.high_inclusive)
        {
            return None;
        }
        Some((key, rid))
    }

    /// Unpin the held leaf and pin its right sibling; a sibling pointer
    /// of 0 marks the scan as exhausted instead
    fn move_to_next_page(&self, state: &mut ScanState) -> IndexResult<()> {
        let sibling = match state.guard.as_ref() {
            Some(guard) => {
                let mut page = guard.write();
                LeafNode::new(&mut page.data).right_sibling()
            }
            None => return Ok(()),
        };

        state.guard = None; // unpin clean
        state.next_entry = 0;
        if sibling != INVALID_PAGE {
            state.guard = Some(self.pool().fetch_page(self.file(), sibling)?);
        }
        Ok(())
    }
}
