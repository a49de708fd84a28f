//! Paged blob files.
//!
//! A paged file is a flat sequence of fixed-size pages. Page 0 holds the
//! file header (signature, format version, page count); allocation starts
//! at page 1 so that page number 0 can serve as the "no page" sentinel
//! everywhere else.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::RwLock;

use crate::error::{IndexError, IndexResult};
use crate::storage::page::{Page, PageId, PAGE_SIZE};

/// Monotonic source of file handle ids, used as cache keys by the pool
static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// File header stored in page 0 of every paged file
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Signature identifying a leafline paged file
    pub signature: [u8; 4],
    /// On-disk format version
    pub version: u16,
    /// Page size the file was written with (must match `PAGE_SIZE`)
    pub page_size: u32,
    /// Number of pages in the file, header included
    pub page_count: u32,
}

impl FileHeader {
    pub const SIGNATURE: [u8; 4] = *b"LFPF";
    pub const VERSION: u16 = 1;

    pub fn new(page_count: u32) -> Self {
        FileHeader {
            signature: Self::SIGNATURE,
            version: Self::VERSION,
            page_size: PAGE_SIZE as u32,
            page_count,
        }
    }

    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        let mut cursor = io::Cursor::new(data);

        let mut signature = [0u8; 4];
        cursor.read_exact(&mut signature)?;
        if signature != Self::SIGNATURE {
            return Err(IndexError::InvalidFormat(
                "not a leafline paged file".into(),
            ));
        }

        let version = cursor.read_u16::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(IndexError::InvalidFormat(format!(
                "unsupported format version {version}"
            )));
        }

        let page_size = cursor.read_u32::<LittleEndian>()?;
        if page_size != PAGE_SIZE as u32 {
            return Err(IndexError::InvalidFormat(format!(
                "page size {page_size} does not match {PAGE_SIZE}"
            )));
        }

        let page_count = cursor.read_u32::<LittleEndian>()?;

        Ok(FileHeader {
            signature,
            version,
            page_size,
            page_count,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&self.signature);
        buf.write_u16::<LittleEndian>(self.version).unwrap();
        buf.write_u32::<LittleEndian>(self.page_size).unwrap();
        buf.write_u32::<LittleEndian>(self.page_count).unwrap();
        buf
    }
}

struct FileInner {
    path: PathBuf,
    id: u64,
    file: RwLock<File>,
    page_count: AtomicU32,
}

/// Handle to an open paged file.
///
/// Cheap to clone; all clones share the underlying file descriptor and
/// page counter.
#[derive(Clone)]
pub struct PagedFile {
    inner: Arc<FileInner>,
}

impl PagedFile {
    /// Create a new paged file, truncating any existing file at `path`.
    /// The file starts with only the header page.
    pub fn create(path: &Path) -> IndexResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let header = FileHeader::new(1);
        let mut page = Page::new();
        let bytes = header.to_bytes();
        page.data[..bytes.len()].copy_from_slice(&bytes);
        file.write_all(&page.data)?;

        Ok(PagedFile {
            inner: Arc::new(FileInner {
                path: path.to_path_buf(),
                id: NEXT_FILE_ID.fetch_add(1, Ordering::SeqCst),
                file: RwLock::new(file),
                page_count: AtomicU32::new(1),
            }),
        })
    }

    /// Open an existing paged file and validate its header.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut buf = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut buf)?;
        let header = FileHeader::from_bytes(&buf)?;

        Ok(PagedFile {
            inner: Arc::new(FileInner {
                path: path.to_path_buf(),
                id: NEXT_FILE_ID.fetch_add(1, Ordering::SeqCst),
                file: RwLock::new(file),
                page_count: AtomicU32::new(header.page_count),
            }),
        })
    }

    /// Unique id of this handle, used to key the buffer pool
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Number of pages in the file, header included
    pub fn page_count(&self) -> u32 {
        self.inner.page_count.load(Ordering::SeqCst)
    }

    /// Read a page from disk
    pub fn read_page(&self, page_no: PageId) -> IndexResult<Page> {
        let mut file = self.inner.file.write();
        file.seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64))?;
        let mut data = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut data)?;
        Ok(Page::from_data(data))
    }

    /// Write a page to disk
    pub fn write_page(&self, page_no: PageId, page: &Page) -> IndexResult<()> {
        let mut file = self.inner.file.write();
        file.seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64))?;
        file.write_all(&page.data)?;
        Ok(())
    }

    /// Extend the file with a zeroed page and return its page number
    pub fn allocate_page(&self) -> IndexResult<PageId> {
        let page_no = self.inner.page_count.fetch_add(1, Ordering::SeqCst);
        self.write_page(page_no, &Page::new())?;
        Ok(page_no)
    }

    /// Persist the header page and fsync the file
    pub fn sync(&self) -> IndexResult<()> {
        let header = FileHeader::new(self.page_count());
        let mut page = self.read_page(0)?;
        let bytes = header.to_bytes();
        page.data[..bytes.len()].copy_from_slice(&bytes);
        self.write_page(0, &page)?;
        self.inner.file.write().sync_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for PagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFile")
            .field("path", &self.inner.path)
            .field("pages", &self.page_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = FileHeader::new(42);
        let bytes = header.to_bytes();
        let parsed = FileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.page_count, 42);
        assert_eq!(parsed.page_size, PAGE_SIZE as u32);
        assert_eq!(parsed.version, FileHeader::VERSION);
    }

    #[test]
    fn test_header_rejects_bad_signature() {
        let mut bytes = FileHeader::new(1).to_bytes();
        bytes[0] = b'X';
        assert!(FileHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_create_allocate_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.lfl");

        let file = PagedFile::create(&path).unwrap();
        assert_eq!(file.page_count(), 1);

        let p1 = file.allocate_page().unwrap();
        let p2 = file.allocate_page().unwrap();
        assert_eq!(p1, 1);
        assert_eq!(p2, 2);

        let mut page = Page::new();
        page.data[100] = 0x5a;
        file.write_page(p2, &page).unwrap();

        let read = file.read_page(p2).unwrap();
        assert_eq!(read.data[100], 0x5a);
    }

    #[test]
    fn test_reopen_preserves_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.lfl");

        {
            let file = PagedFile::create(&path).unwrap();
            file.allocate_page().unwrap();
            file.allocate_page().unwrap();
            file.sync().unwrap();
        }

        let reopened = PagedFile::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 3);
    }
}
