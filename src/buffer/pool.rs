//! Buffer pool: a pinning page cache shared by every paged file.
//!
//! Pages are obtained through [`BufferPool::fetch_page`] and
//! [`BufferPool::alloc_page`], both of which return a [`PageGuard`] that
//! pins the frame. Dropping the guard unpins it exactly once, carrying a
//! dirty flag set through [`PageGuard::mark_dirty`]. Pinned frames are
//! never evicted; when every frame is pinned the pool reports
//! `BufferExhausted` instead of growing.

use lru::LruCache;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::error::{IndexError, IndexResult};
use crate::storage::file::PagedFile;
use crate::storage::page::{Page, PageId};

/// Cache key combining file handle id and page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    file_id: u64,
    page_no: PageId,
}

/// Cached page with pin bookkeeping
struct Frame {
    /// Handle kept so dirty victims can be written back on eviction
    file: PagedFile,
    page: Arc<RwLock<Page>>,
    pin_count: u32,
    dirty: bool,
}

/// Cache statistics
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub dirty_writes: u64,
}

struct PoolShared {
    frames: RwLock<LruCache<FrameKey, Frame>>,
    capacity: usize,
    stats: RwLock<CacheStats>,
}

/// Handle to a shared buffer pool. Cheap to clone.
#[derive(Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    /// Create a new pool with the given capacity (number of frames)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(16); // Minimum 16 frames
        BufferPool {
            shared: Arc::new(PoolShared {
                frames: RwLock::new(LruCache::unbounded()),
                capacity,
                stats: RwLock::new(CacheStats::default()),
            }),
        }
    }

    /// Read a page, pinning it for the lifetime of the returned guard
    pub fn fetch_page(&self, file: &PagedFile, page_no: PageId) -> IndexResult<PageGuard> {
        let key = FrameKey {
            file_id: file.id(),
            page_no,
        };

        let mut frames = self.shared.frames.write();
        if let Some(frame) = frames.get_mut(&key) {
            frame.pin_count += 1;
            let page = frame.page.clone();
            self.shared.stats.write().hits += 1;
            return Ok(self.guard(key, page));
        }
        self.shared.stats.write().misses += 1;

        self.make_room(&mut frames)?;
        let page = Arc::new(RwLock::new(file.read_page(page_no)?));
        frames.put(
            key,
            Frame {
                file: file.clone(),
                page: page.clone(),
                pin_count: 1,
                dirty: false,
            },
        );
        Ok(self.guard(key, page))
    }

    /// Extend `file` with a fresh zeroed page, pinned on receipt
    pub fn alloc_page(&self, file: &PagedFile) -> IndexResult<(PageId, PageGuard)> {
        let mut frames = self.shared.frames.write();
        self.make_room(&mut frames)?;

        let page_no = file.allocate_page()?;
        let key = FrameKey {
            file_id: file.id(),
            page_no,
        };
        let page = Arc::new(RwLock::new(Page::new()));
        frames.put(
            key,
            Frame {
                file: file.clone(),
                page: page.clone(),
                pin_count: 1,
                dirty: false,
            },
        );
        Ok((page_no, self.guard(key, page)))
    }

    /// Write all dirty frames of `file`, drop its frames and fsync it.
    /// Fails with `PagePinned` if any of its pages is still held.
    pub fn flush_file(&self, file: &PagedFile) -> IndexResult<()> {
        let mut frames = self.shared.frames.write();
        let keys: Vec<FrameKey> = frames
            .iter()
            .filter(|(k, _)| k.file_id == file.id())
            .map(|(k, _)| *k)
            .collect();

        for key in &keys {
            if let Some(frame) = frames.peek(key) {
                if frame.pin_count > 0 {
                    return Err(IndexError::PagePinned(key.page_no));
                }
            }
        }

        let mut dirty_writes = 0;
        for key in keys {
            if let Some(frame) = frames.pop(&key) {
                if frame.dirty {
                    file.write_page(key.page_no, &frame.page.read())?;
                    dirty_writes += 1;
                }
            }
        }
        drop(frames);

        if dirty_writes > 0 {
            self.shared.stats.write().dirty_writes += dirty_writes;
        }
        file.sync()
    }

    /// Total pins currently held across all files
    pub fn pinned_pages(&self) -> usize {
        self.shared
            .frames
            .read()
            .iter()
            .map(|(_, f)| f.pin_count as usize)
            .sum()
    }

    /// Snapshot of the cache statistics
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.read().clone()
    }

    /// Evict one unpinned frame if the pool is at capacity, writing it
    /// back first when dirty
    fn make_room(&self, frames: &mut LruCache<FrameKey, Frame>) -> IndexResult<()> {
        if frames.len() < self.shared.capacity {
            return Ok(());
        }

        // least-recently used unpinned frame
        let victim = frames
            .iter()
            .rev()
            .find(|(_, f)| f.pin_count == 0)
            .map(|(k, _)| *k)
            .ok_or(IndexError::BufferExhausted)?;

        let mut stats = self.shared.stats.write();
        if let Some(frame) = frames.peek(&victim) {
            if frame.dirty {
                frame.file.write_page(victim.page_no, &frame.page.read())?;
                stats.dirty_writes += 1;
            }
        }
        frames.pop(&victim);
        stats.evictions += 1;
        Ok(())
    }

    fn guard(&self, key: FrameKey, page: Arc<RwLock<Page>>) -> PageGuard {
        PageGuard {
            pool: self.clone(),
            key,
            page,
            dirty: false,
        }
    }

    fn unpin(&self, key: FrameKey, dirty: bool) {
        let mut frames = self.shared.frames.write();
        if let Some(frame) = frames.get_mut(&key) {
            debug_assert!(frame.pin_count > 0, "unbalanced unpin");
            frame.pin_count = frame.pin_count.saturating_sub(1);
            frame.dirty |= dirty;
        }
    }
}

/// A pinned page. Dropping the guard releases the pin exactly once.
pub struct PageGuard {
    pool: BufferPool,
    key: FrameKey,
    page: Arc<RwLock<Page>>,
    dirty: bool,
}

impl std::fmt::Debug for PageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard").field("key", &self.key).finish()
    }
}

impl PageGuard {
    /// Page number this guard pins
    pub fn page_no(&self) -> PageId {
        self.key.page_no
    }

    /// Shared access to the page bytes
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Exclusive access to the page bytes. Call [`Self::mark_dirty`] when
    /// the page was actually mutated.
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Record that this page was mutated; the flag is handed to the pool
    /// when the guard drops
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.pool.unpin(self.key, self.dirty);
    }
}
