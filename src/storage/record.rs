//! Record identifiers.
//!
//! A `RecordId` names a tuple by the data page holding it and the slot
//! within that page. The all-zero pair is reserved: leaf nodes use it to
//! mark empty entry slots, so no real record may ever live on page 0.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor};

use crate::storage::page::PageId;

/// Physical address of a record (page number + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordId {
    /// Page number containing the record
    pub page: PageId,
    /// Slot index within the page
    pub slot: u16,
}

impl RecordId {
    /// On-disk size: page (4) + slot (2) + padding (2). The padding keeps
    /// leaf entry arithmetic on an 8-byte stride.
    pub const SIZE: usize = 8;

    /// The reserved empty sentinel `(0, 0)`
    pub const EMPTY: RecordId = RecordId { page: 0, slot: 0 };

    /// Create a new record id
    pub fn new(page: PageId, slot: u16) -> Self {
        RecordId { page, slot }
    }

    /// Whether this is the empty sentinel
    pub fn is_empty(&self) -> bool {
        self.page == 0 && self.slot == 0
    }

    /// Pack into the 8-byte on-disk representation
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        (&mut buf[0..4]).write_u32::<LittleEndian>(self.page).unwrap();
        (&mut buf[4..6]).write_u16::<LittleEndian>(self.slot).unwrap();
        buf
    }

    /// Unpack from the 8-byte on-disk representation
    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < Self::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "record id too short",
            ));
        }
        let page = Cursor::new(&data[0..4]).read_u32::<LittleEndian>()?;
        let slot = Cursor::new(&data[4..6]).read_u16::<LittleEndian>()?;
        Ok(RecordId { page, slot })
    }
}
