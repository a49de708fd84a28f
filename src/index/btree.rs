//! B+ tree index over a single integer attribute of a relation.
//!
//! The index lives in its own paged file named
//! `"<relation>,<attr_byte_offset>"` next to the relation. Page 1 is the
//! meta page, page 2 the initial leaf root; further nodes follow in
//! allocation order. Insertion descends recursively and propagates
//! splits bottom-up, promoting a new root when the old one splits.
//!
//! Every page touched is pinned through a [`PageGuard`] and released
//! when the guard drops, dirty exactly when it was mutated.

use std::path::{Path, PathBuf};

use crate::buffer::{BufferPool, PageGuard};
use crate::error::{IndexError, IndexResult};
use crate::index::scan::ScanState;
use crate::relation::{FileScan, HeapFile};
use crate::storage::file::PagedFile;
use crate::storage::meta::{AttrType, IndexMetaInfo, RELATION_NAME_LEN};
use crate::storage::node::{self, InternalNode, LeafNode, INTERNAL_FANOUT, LEAF_FANOUT};
use crate::storage::page::PageId;
use crate::storage::record::RecordId;

/// Page number of the index meta page
const META_PAGE: PageId = 1;

/// Where a new entry lands relative to a node split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SplitPlan {
    /// First slot moved to the new right node
    split_at: usize,
    /// Whether the new entry belongs in the left (original) node
    insert_left: bool,
    /// Insertion slot within the chosen half
    insert_pos: usize,
    /// The new separator would be slot 0 of the right half; promote it
    /// directly instead of inserting it (internal nodes only)
    move_key_up: bool,
}

fn leaf_split_plan(index: usize) -> SplitPlan {
    let middle = LEAF_FANOUT / 2;
    let insert_left = index < middle;
    SplitPlan {
        split_at: middle + usize::from(insert_left),
        insert_left,
        insert_pos: if insert_left { index } else { index - middle },
        move_key_up: false,
    }
}

fn internal_split_plan(index: usize) -> SplitPlan {
    let middle = (INTERNAL_FANOUT - 1) / 2;
    let insert_left = index < middle;
    // index == middle means the new separator would have to lead the
    // right half: it is promoted directly instead of inserted
    let move_key_up = index == middle;
    SplitPlan {
        split_at: middle + usize::from(insert_left),
        insert_left,
        // in the right half, the keys after the consumed separator at
        // `middle` shift down by middle + 1 slots
        insert_pos: if insert_left {
            index
        } else {
            index.saturating_sub(middle + 1)
        },
        move_key_up,
    }
}

/// A B+ tree index on one integer attribute of a relation.
///
/// At most one range scan is active at a time; starting a new scan ends
/// any previous one.
pub struct BTreeIndex {
    file: PagedFile,
    pool: BufferPool,
    index_path: PathBuf,
    meta: IndexMetaInfo,
    pub(crate) scan: Option<ScanState>,
    closed: bool,
}

impl BTreeIndex {
    /// Open the index for `relation`'s attribute at `attr_byte_offset`,
    /// creating and bulk-loading it if the index file does not exist yet.
    ///
    /// An existing index file must match the requested relation name,
    /// offset and type, otherwise `BadIndexInfo` is returned.
    pub fn new(
        relation: &HeapFile,
        pool: &BufferPool,
        attr_byte_offset: u32,
        attr_type: AttrType,
    ) -> IndexResult<Self> {
        let relation_path = relation.file().path();
        let relation_name = relation_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                IndexError::InvalidFormat(format!("bad relation path {relation_path:?}"))
            })?;
        let index_path =
            relation_path.with_file_name(format!("{relation_name},{attr_byte_offset}"));

        if index_path.exists() {
            Self::open_existing(index_path, pool, &relation_name, attr_byte_offset, attr_type)
        } else {
            Self::create(
                index_path,
                relation,
                pool,
                &relation_name,
                attr_byte_offset,
                attr_type,
            )
        }
    }

    fn open_existing(
        index_path: PathBuf,
        pool: &BufferPool,
        relation_name: &str,
        attr_byte_offset: u32,
        attr_type: AttrType,
    ) -> IndexResult<Self> {
        let file = PagedFile::open(&index_path)?;
        let meta = {
            let guard = pool.fetch_page(&file, META_PAGE)?;
            let page = guard.read();
            IndexMetaInfo::from_bytes(&page.data)?
        };

        let mut expected_name = relation_name.to_string();
        expected_name.truncate(RELATION_NAME_LEN);
        if meta.relation_name != expected_name
            || meta.attr_byte_offset != attr_byte_offset
            || meta.attr_type != attr_type
        {
            return Err(IndexError::BadIndexInfo(format!(
                "index {} was built for relation {:?}, offset {}, type {:?}",
                index_path.display(),
                meta.relation_name,
                meta.attr_byte_offset,
                meta.attr_type
            )));
        }

        Ok(BTreeIndex {
            file,
            pool: pool.clone(),
            index_path,
            meta,
            scan: None,
            closed: false,
        })
    }

    fn create(
        index_path: PathBuf,
        relation: &HeapFile,
        pool: &BufferPool,
        relation_name: &str,
        attr_byte_offset: u32,
        attr_type: AttrType,
    ) -> IndexResult<Self> {
        let file = PagedFile::create(&index_path)?;

        let (meta_page, mut meta_guard) = pool.alloc_page(&file)?;
        debug_assert_eq!(meta_page, META_PAGE);

        let (root_page, mut root_guard) = pool.alloc_page(&file)?;
        {
            let mut page = root_guard.write();
            LeafNode::new(&mut page.data).init();
        }
        root_guard.mark_dirty();
        drop(root_guard);

        let mut meta = IndexMetaInfo::new(relation_name, attr_byte_offset, attr_type);
        meta.root_page_no = root_page;
        let bytes = meta.to_bytes();
        meta_guard.write().data[..bytes.len()].copy_from_slice(&bytes);
        meta_guard.mark_dirty();
        drop(meta_guard);

        let mut index = BTreeIndex {
            file,
            pool: pool.clone(),
            index_path,
            meta,
            scan: None,
            closed: false,
        };
        index.bulk_build(relation)?;
        Ok(index)
    }

    /// Insert one entry per tuple of the source relation, decoding the
    /// key at the declared byte offset
    fn bulk_build(&mut self, relation: &HeapFile) -> IndexResult<()> {
        let offset = self.meta.attr_byte_offset as usize;
        let mut fscan = FileScan::new(relation, &self.pool);
        let mut loaded = 0u64;

        loop {
            let rid = match fscan.scan_next() {
                Ok(rid) => rid,
                Err(IndexError::EndOfFile) => break,
                Err(e) => return Err(e),
            };
            let record = fscan.get_record()?;
            if offset + 4 > record.len() {
                return Err(IndexError::InvalidFormat(format!(
                    "attribute offset {offset} out of bounds for {}-byte records",
                    record.len()
                )));
            }
            let key = i32::from_le_bytes(record[offset..offset + 4].try_into().unwrap());
            self.insert_entry(key, rid)?;
            loaded += 1;
        }

        tracing::debug!(
            records = loaded,
            index = %self.index_path.display(),
            "bulk build complete"
        );
        Ok(())
    }

    /// Path of the index file (`"<relation>,<attr_byte_offset>"`)
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub(crate) fn root_page_no(&self) -> PageId {
        self.meta.root_page_no
    }

    pub(crate) fn file(&self) -> &PagedFile {
        &self.file
    }

    pub(crate) fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Insert the pair `(key, rid)`. Duplicate keys are permitted.
    pub fn insert_entry(&mut self, key: i32, rid: RecordId) -> IndexResult<()> {
        debug_assert!(!rid.is_empty(), "the (0,0) record id is reserved");

        if let Some((new_page, mid_val)) = self.insert(self.meta.root_page_no, key, rid)? {
            let new_root = self.promote_root(mid_val, self.meta.root_page_no, new_page)?;
            self.meta.root_page_no = new_root;
        }
        Ok(())
    }

    /// Recursive insert into the subtree rooted at `page_no`. Returns the
    /// new sibling's page number and the promoted separator when the
    /// subtree root split.
    fn insert(
        &self,
        page_no: PageId,
        key: i32,
        rid: RecordId,
    ) -> IndexResult<Option<(PageId, i32)>> {
        let mut guard = self.pool.fetch_page(&self.file, page_no)?;

        if node::is_leaf(&guard.read().data) {
            return self.insert_into_leaf(guard, key, rid);
        }

        let child_no = {
            let mut page = guard.write();
            let inner = InternalNode::new(&mut page.data);
            inner.child(inner.descend_index(key))
        };

        // the child stays pinned here while the subtree insert runs
        let (new_child, promoted) = match self.insert(child_no, key, rid)? {
            None => return Ok(None), // guard drops clean
            Some(split) => split,
        };

        // the child split: place the new separator in this node
        let index = {
            let mut page = guard.write();
            let mut inner = InternalNode::new(&mut page.data);
            let index = inner.descend_index(promoted);
            if !inner.is_full() {
                inner.insert_at(index, promoted, new_child);
                drop(page);
                guard.mark_dirty();
                return Ok(None);
            }
            index
        };

        let plan = internal_split_plan(index);
        let (new_page_no, mut new_guard) = self.pool.alloc_page(&self.file)?;

        let promoted_out;
        {
            let mut src_page = guard.write();
            let mut dst_page = new_guard.write();
            let mut src = InternalNode::new(&mut src_page.data);
            let mut dst = InternalNode::new(&mut dst_page.data);
            dst.init(src.level());

            // read the separator before the split zeroes it
            promoted_out = if plan.move_key_up {
                promoted
            } else {
                src.key(plan.split_at)
            };

            src.split_into(&mut dst, plan.split_at, plan.move_key_up);

            if plan.move_key_up {
                // the promoted key separates the halves; its right child
                // leads the new node
                dst.set_child(0, new_child);
            } else {
                let target = if plan.insert_left { &mut src } else { &mut dst };
                target.insert_at(plan.insert_pos, promoted, new_child);
            }
        }
        guard.mark_dirty();
        new_guard.mark_dirty();

        Ok(Some((new_page_no, promoted_out)))
    }

    /// Leaf base case of the recursive insert
    fn insert_into_leaf(
        &self,
        mut guard: PageGuard,
        key: i32,
        rid: RecordId,
    ) -> IndexResult<Option<(PageId, i32)>> {
        let index = {
            let mut page = guard.write();
            let mut leaf = LeafNode::new(&mut page.data);
            let index = leaf.insertion_index(key);
            if !leaf.is_full() {
                leaf.insert_at(index, key, rid);
                drop(page);
                guard.mark_dirty();
                return Ok(None);
            }
            index
        };

        let plan = leaf_split_plan(index);
        let (new_page_no, mut new_guard) = self.pool.alloc_page(&self.file)?;

        let mid_val;
        {
            let mut src_page = guard.write();
            let mut dst_page = new_guard.write();
            let mut src = LeafNode::new(&mut src_page.data);
            let mut dst = LeafNode::new(&mut dst_page.data);
            dst.init();

            src.split_into(&mut dst, plan.split_at);
            if plan.insert_left {
                src.insert_at(plan.insert_pos, key, rid);
            } else {
                dst.insert_at(plan.insert_pos, key, rid);
            }

            dst.set_right_sibling(src.right_sibling());
            src.set_right_sibling(new_page_no);
            mid_val = dst.key(0);
        }
        guard.mark_dirty();
        new_guard.mark_dirty();

        Ok(Some((new_page_no, mid_val)))
    }

    /// Allocate a new root holding one separator and two children
    fn promote_root(&self, mid_val: i32, left: PageId, right: PageId) -> IndexResult<PageId> {
        let (page_no, mut guard) = self.pool.alloc_page(&self.file)?;
        {
            let mut page = guard.write();
            let mut root = InternalNode::new(&mut page.data);
            root.init(0);
            root.set_key(0, mid_val);
            root.set_child(0, left);
            root.set_child(1, right);
        }
        guard.mark_dirty();
        tracing::debug!(new_root = page_no, "root split");
        Ok(page_no)
    }

    /// End any scan, persist the meta page and flush the index file.
    ///
    /// `Drop` performs the same teardown but swallows errors; call this
    /// to observe them.
    pub fn close(mut self) -> IndexResult<()> {
        self.closed = true;
        self.close_impl()
    }

    fn close_impl(&mut self) -> IndexResult<()> {
        self.scan = None; // releases a held leaf, if any

        let mut guard = self.pool.fetch_page(&self.file, META_PAGE)?;
        let bytes = self.meta.to_bytes();
        guard.write().data[..bytes.len()].copy_from_slice(&bytes);
        guard.mark_dirty();
        drop(guard);

        self.pool.flush_file(&self.file)
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close_impl() {
                tracing::warn!(
                    index = %self.index_path.display(),
                    error = %e,
                    "failed to close index cleanly"
                );
            }
        }
    }
}

impl std::fmt::Debug for BTreeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTreeIndex")
            .field("path", &self.index_path)
            .field("root", &self.meta.root_page_no)
            .field("scanning", &self.scan.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::node::LEAF_LEVEL;

    /// Empty relation + fresh index, for driving `insert_entry` directly
    fn empty_index(dir: &tempfile::TempDir) -> (BTreeIndex, BufferPool) {
        let pool = BufferPool::new(64);
        let heap = HeapFile::create(&dir.path().join("rel"), 16, &pool).unwrap();
        let index = BTreeIndex::new(&heap, &pool, 4, AttrType::Integer).unwrap();
        (index, pool)
    }

    fn rid_for(key: i32) -> RecordId {
        RecordId::new((key / 100 + 1) as u32, (key % 100) as u16)
    }

    /// Keys of every leaf, in sibling-chain order starting at the
    /// leftmost leaf. Also checks the chain terminates.
    fn collect_leaf_keys(index: &BTreeIndex) -> Vec<i32> {
        let pool = index.pool();
        let file = index.file();

        let mut page_no = index.root_page_no();
        loop {
            let guard = pool.fetch_page(file, page_no).unwrap();
            let mut page = guard.write();
            if node::is_leaf(&page.data) {
                break;
            }
            page_no = InternalNode::new(&mut page.data).child(0);
        }

        let mut keys = Vec::new();
        let mut hops = 0;
        while page_no != 0 {
            let guard = pool.fetch_page(file, page_no).unwrap();
            let mut page = guard.write();
            let leaf = LeafNode::new(&mut page.data);
            for i in 0..leaf.len() {
                keys.push(leaf.key(i));
            }
            page_no = leaf.right_sibling();
            hops += 1;
            assert!(hops < 100_000, "sibling chain does not terminate");
        }
        keys
    }

    #[test]
    fn test_split_plan_arithmetic() {
        let leaf_mid = LEAF_FANOUT / 2;
        let plan = leaf_split_plan(0);
        assert!(plan.insert_left);
        assert_eq!(plan.split_at, leaf_mid + 1);
        assert_eq!(plan.insert_pos, 0);

        let plan = leaf_split_plan(LEAF_FANOUT);
        assert!(!plan.insert_left);
        assert_eq!(plan.split_at, leaf_mid);
        assert_eq!(plan.insert_pos, LEAF_FANOUT - leaf_mid);

        let int_mid = (INTERNAL_FANOUT - 1) / 2;
        for (index, left, pos, up) in [
            (0, true, 0, false),
            (int_mid - 1, true, int_mid - 1, false),
            // the new separator would lead the right half: promote it
            (int_mid, false, 0, true),
            // first slot of the right half after the consumed separator
            (int_mid + 1, false, 0, false),
            (int_mid + 2, false, 1, false),
            // appending past every key of a full node
            (INTERNAL_FANOUT, false, INTERNAL_FANOUT - int_mid - 1, false),
        ] {
            let plan = internal_split_plan(index);
            assert_eq!(plan.insert_left, left, "index {index}");
            assert_eq!(plan.insert_pos, pos, "index {index}");
            assert_eq!(plan.move_key_up, up, "index {index}");
            assert_eq!(plan.split_at, int_mid + usize::from(left), "index {index}");
        }
    }

    #[test]
    fn test_empty_tree_then_first_insert() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, pool) = empty_index(&dir);

        // single empty leaf root at page 2
        assert_eq!(index.root_page_no(), 2);

        index.insert_entry(42, RecordId::new(9, 3)).unwrap();
        assert_eq!(index.root_page_no(), 2);

        let guard = pool.fetch_page(index.file(), 2).unwrap();
        let mut page = guard.write();
        assert_eq!(node::page_level(&page.data), LEAF_LEVEL);
        let leaf = LeafNode::new(&mut page.data);
        assert_eq!(leaf.len(), 1);
        assert_eq!(leaf.key(0), 42);
        assert_eq!(leaf.rid(0), RecordId::new(9, 3));
        assert_eq!(leaf.right_sibling(), 0);
        drop(page);
        drop(guard);

        assert_eq!(pool.pinned_pages(), 0);
    }

    #[test]
    fn test_first_leaf_split_shape() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, pool) = empty_index(&dir);

        for key in 0..=(LEAF_FANOUT as i32) {
            index.insert_entry(key, rid_for(key)).unwrap();
        }

        // root was promoted to a fresh internal page
        let root_no = index.root_page_no();
        assert_ne!(root_no, 2);

        let (left_no, right_no, separator) = {
            let guard = pool.fetch_page(index.file(), root_no).unwrap();
            let mut page = guard.write();
            assert!(!node::is_leaf(&page.data));
            let root = InternalNode::new(&mut page.data);
            assert_eq!(root.len(), 2);
            (root.child(0), root.child(1), root.key(0))
        };

        let middle = LEAF_FANOUT / 2;
        assert_eq!(separator, middle as i32);

        {
            let guard = pool.fetch_page(index.file(), left_no).unwrap();
            let mut page = guard.write();
            let leaf = LeafNode::new(&mut page.data);
            assert_eq!(leaf.len(), middle);
            assert_eq!(leaf.key(0), 0);
            assert_eq!(leaf.right_sibling(), right_no);
        }
        {
            let guard = pool.fetch_page(index.file(), right_no).unwrap();
            let mut page = guard.write();
            let leaf = LeafNode::new(&mut page.data);
            assert_eq!(leaf.len(), LEAF_FANOUT - middle + 1);
            assert_eq!(leaf.key(0), middle as i32);
            assert_eq!(leaf.right_sibling(), 0);
        }

        assert_eq!(pool.pinned_pages(), 0);
    }

    #[test]
    fn test_descending_inserts_stay_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, pool) = empty_index(&dir);

        for key in (0..3000).rev() {
            index.insert_entry(key, rid_for(key)).unwrap();
        }

        let keys = collect_leaf_keys(&index);
        assert_eq!(keys.len(), 3000);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys.first(), Some(&0));
        assert_eq!(keys.last(), Some(&2999));
        assert_eq!(pool.pinned_pages(), 0);
    }

    /// For every internal node, keys of `children[i]` must stay below
    /// `keys[i]` and keys of `children[i+1]` at or above it
    fn check_separator_bounds(index: &BTreeIndex, page_no: PageId) -> (i32, i32) {
        let guard = index.pool().fetch_page(index.file(), page_no).unwrap();
        let mut page = guard.write();

        if node::is_leaf(&page.data) {
            let leaf = LeafNode::new(&mut page.data);
            let len = leaf.len();
            assert!(len > 0, "empty non-root leaf");
            return (leaf.key(0), leaf.key(len - 1));
        }

        let inner = InternalNode::new(&mut page.data);
        let len = inner.len();
        let children: Vec<PageId> = (0..len).map(|i| inner.child(i)).collect();
        let keys: Vec<i32> = (0..len - 1).map(|i| inner.key(i)).collect();
        drop(page);
        drop(guard);

        let mut low = i32::MAX;
        let mut high = i32::MIN;
        for (i, &child) in children.iter().enumerate() {
            let (child_low, child_high) = check_separator_bounds(index, child);
            if i < keys.len() {
                assert!(child_high < keys[i], "left subtree reaches separator");
            }
            if i > 0 {
                assert!(child_low >= keys[i - 1], "right subtree below separator");
            }
            low = low.min(child_low);
            high = high.max(child_high);
        }
        (low, high)
    }

    #[test]
    fn test_separator_bounds_hold() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, _pool) = empty_index(&dir);

        // distinct keys in a scrambled order
        for i in 0..5000 {
            let key = (i * 2347) % 5000;
            index.insert_entry(key, rid_for(key)).unwrap();
        }

        check_separator_bounds(&index, index.root_page_no());
    }

    #[test]
    fn test_internal_root_split() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, pool) = empty_index(&dir);

        // enough ascending keys to overflow a full internal root
        let total = 360_000;
        for key in 0..total {
            index.insert_entry(key, RecordId::new((key / 1000 + 1) as u32, (key % 1000) as u16))
                .unwrap();
        }

        // the tree is now three levels deep
        let child_no = {
            let guard = pool.fetch_page(index.file(), index.root_page_no()).unwrap();
            let mut page = guard.write();
            assert!(!node::is_leaf(&page.data));
            InternalNode::new(&mut page.data).child(0)
        };
        {
            let guard = pool.fetch_page(index.file(), child_no).unwrap();
            let page = guard.read();
            assert!(!node::is_leaf(&page.data), "root children should be internal");
        }

        let keys = collect_leaf_keys(&index);
        assert_eq!(keys.len(), total as usize);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(pool.pinned_pages(), 0);
    }

    #[test]
    fn test_internal_root_split_descending() {
        let dir = tempfile::tempdir().unwrap();
        let (mut index, pool) = empty_index(&dir);

        let total = 360_000;
        for key in (0..total).rev() {
            index.insert_entry(key, RecordId::new((key / 1000 + 1) as u32, (key % 1000) as u16))
                .unwrap();
        }

        let keys = collect_leaf_keys(&index);
        assert_eq!(keys.len(), total as usize);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys.first(), Some(&0));
        assert_eq!(keys.last(), Some(&(total - 1)));
        assert_eq!(pool.pinned_pages(), 0);
    }

    #[test]
    fn test_bulk_build_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let pool = BufferPool::new(64);
        let heap = HeapFile::create(&dir.path().join("orders"), 16, &pool).unwrap();

        // records: 4 bytes padding, key at offset 4, 8 bytes payload
        let total = 2000;
        for i in 0..total {
            let key: i32 = (i * 37) % total; // a permutation of 0..total
            let mut record = [0u8; 16];
            record[4..8].copy_from_slice(&key.to_le_bytes());
            heap.insert_record(&pool, &record).unwrap();
        }

        let index = BTreeIndex::new(&heap, &pool, 4, AttrType::Integer).unwrap();
        assert_eq!(
            index.index_path().file_name().unwrap().to_str().unwrap(),
            "orders,4"
        );
        let keys = collect_leaf_keys(&index);
        assert_eq!(keys.len(), total as usize);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        index.close().unwrap();

        // reopening finds the persisted tree instead of rebuilding
        let index = BTreeIndex::new(&heap, &pool, 4, AttrType::Integer).unwrap();
        let keys = collect_leaf_keys(&index);
        assert_eq!(keys.len(), total as usize);
        index.close().unwrap();

        // same relation, different offset: a separate index file
        let other = BTreeIndex::new(&heap, &pool, 0, AttrType::Integer).unwrap();
        assert_eq!(
            other.index_path().file_name().unwrap().to_str().unwrap(),
            "orders,0"
        );
        other.close().unwrap();
    }

    #[test]
    fn test_reopen_with_wrong_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let pool = BufferPool::new(64);
        let heap = HeapFile::create(&dir.path().join("orders"), 16, &pool).unwrap();
        let mut record = [0u8; 16];
        record[4..8].copy_from_slice(&7i32.to_le_bytes());
        heap.insert_record(&pool, &record).unwrap();

        let index = BTreeIndex::new(&heap, &pool, 4, AttrType::Integer).unwrap();
        let index_path = index.index_path().to_path_buf();
        index.close().unwrap();
        heap.flush(&pool).unwrap();

        // hand the same index file to a differently-named relation
        let renamed = dir.path().join("returns");
        std::fs::copy(heap.file().path(), &renamed).unwrap();
        let other = HeapFile::open(&renamed, &pool).unwrap();
        std::fs::copy(&index_path, dir.path().join("returns,4")).unwrap();

        match BTreeIndex::new(&other, &pool, 4, AttrType::Integer) {
            Err(IndexError::BadIndexInfo(_)) => {}
            other => panic!("expected BadIndexInfo, got {other:?}"),
        }
    }
}
