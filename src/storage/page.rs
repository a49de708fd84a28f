//! Fixed-size page buffers.
//!
//! Every node of the tree, every heap data page and every file header
//! occupies exactly one page. The page number doubles as the page's byte
//! address in the file (`page_no * PAGE_SIZE`).

/// Size of every page in bytes
pub const PAGE_SIZE: usize = 8192;

/// Page number within a paged file
pub type PageId = u32;

/// Reserved page number meaning "no page"
pub const INVALID_PAGE: PageId = 0;

/// A fixed-size page buffer
pub struct Page {
    /// Raw page data, always `PAGE_SIZE` bytes
    pub data: Vec<u8>,
}

impl Page {
    /// Create a new zeroed page
    pub fn new() -> Self {
        Page {
            data: vec![0; PAGE_SIZE],
        }
    }

    /// Create a page from raw data
    pub fn from_data(data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), PAGE_SIZE);
        Page { data }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("len", &self.data.len()).finish()
    }
}
