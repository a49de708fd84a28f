//! Index meta page.
//!
//! Page 1 of every index file records which relation and attribute the
//! index covers plus the current root page. The root starts out as page 2
//! but moves whenever a root split promotes a new one; the in-memory copy
//! is authoritative during operation and is written back before the file
//! is flushed on teardown.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::error::{IndexError, IndexResult};
use crate::storage::page::PageId;

/// Maximum stored length of the relation name; longer names are truncated
pub const RELATION_NAME_LEN: usize = 20;

/// Type of the attribute an index is built over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AttrType {
    /// 32-bit signed integer
    Integer = 0,
}

impl AttrType {
    pub fn tag(&self) -> u32 {
        *self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(AttrType::Integer),
            _ => None,
        }
    }
}

/// Contents of the index meta page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetaInfo {
    /// Name of the base relation, truncated to `RELATION_NAME_LEN` bytes
    pub relation_name: String,
    /// Byte offset of the indexed attribute inside each record
    pub attr_byte_offset: u32,
    /// Type of the indexed attribute
    pub attr_type: AttrType,
    /// Page number of the current root node
    pub root_page_no: PageId,
}

impl IndexMetaInfo {
    /// Serialized size: name (20) + offset (4) + type (4) + root (4)
    pub const SIZE: usize = RELATION_NAME_LEN + 12;

    pub fn new(relation_name: &str, attr_byte_offset: u32, attr_type: AttrType) -> Self {
        let mut name = relation_name.to_string();
        name.truncate(RELATION_NAME_LEN);
        IndexMetaInfo {
            relation_name: name,
            attr_byte_offset,
            attr_type,
            root_page_no: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        let name = self.relation_name.as_bytes();
        let len = name.len().min(RELATION_NAME_LEN);
        buf[..len].copy_from_slice(&name[..len]);

        let mut cursor = io::Cursor::new(&mut buf[RELATION_NAME_LEN..]);
        cursor
            .write_u32::<LittleEndian>(self.attr_byte_offset)
            .unwrap();
        cursor.write_u32::<LittleEndian>(self.attr_type.tag()).unwrap();
        cursor.write_u32::<LittleEndian>(self.root_page_no).unwrap();
        buf
    }

    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        if data.len() < Self::SIZE {
            return Err(IndexError::InvalidFormat("index meta page too short".into()));
        }

        let name_end = data[..RELATION_NAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RELATION_NAME_LEN);
        let relation_name = std::str::from_utf8(&data[..name_end])
            .map_err(|_| IndexError::InvalidFormat("relation name is not ASCII".into()))?
            .to_string();

        let mut cursor = io::Cursor::new(&data[RELATION_NAME_LEN..]);
        let attr_byte_offset = cursor.read_u32::<LittleEndian>()?;
        let tag = cursor.read_u32::<LittleEndian>()?;
        let attr_type = AttrType::from_tag(tag)
            .ok_or_else(|| IndexError::InvalidFormat(format!("unknown attribute type {tag}")))?;
        let root_page_no = cursor.read_u32::<LittleEndian>()?;

        Ok(IndexMetaInfo {
            relation_name,
            attr_byte_offset,
            attr_type,
            root_page_no,
        })
    }
}
