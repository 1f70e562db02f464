use std::io::{Read, Seek, SeekFrom};

use byteordered::Endianness;

use crate::bbi::{ChromInfo, CHROM_TREE_MAGIC};
use crate::byteio::{endianness_from_magic, read_exact_checked, ByteReader};
use crate::error::{BPlusTreeError, BigBedOpenError};

/// Header of the chromosome B+ tree, plus enough state to find or traverse
/// it against a caller-supplied reader.
///
/// Node state is never retained across calls: every `find`/`traverse`
/// re-reads nodes from the shared byte source starting at `root_offset`.
pub(crate) struct BPlusTreeHeader {
    endianness: Endianness,
    key_size: u32,
    val_size: u32,
    item_count: u64,
    root_offset: u64,
}

impl BPlusTreeHeader {
    /// Opens the tree header at `offset`, validating the signature and
    /// determining this tree's own byte order independently of the
    /// container's.
    pub(crate) fn open<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
    ) -> Result<Self, BigBedOpenError> {
        reader.seek(SeekFrom::Start(offset))?;
        let mut magic_bytes = [0u8; 4];
        read_exact_checked(reader, &mut magic_bytes)?;
        let endianness = endianness_from_magic(magic_bytes, CHROM_TREE_MAGIC)
            .ok_or(BigBedOpenError::BadMagic)?;

        let mut reader = ByteReader::new(reader, endianness);
        let _block_size = reader.read_u32()?;
        let key_size = reader.read_u32()?;
        let val_size = reader.read_u32()?;
        let item_count = reader.read_u64()?;
        let _reserved = reader.read_u64()?;
        let root_offset = offset + 4 + 4 + 4 + 4 + 8 + 8;

        if val_size != 8 {
            return Err(BigBedOpenError::InvalidChromTree(format!(
                "expected chromosome B+ tree valSize == 8, got {val_size}"
            )));
        }

        Ok(BPlusTreeHeader {
            endianness,
            key_size,
            val_size,
            item_count,
            root_offset,
        })
    }

    pub(crate) fn item_count(&self) -> u64 {
        self.item_count
    }

    pub(crate) fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Right-null-pads `key` to the tree's key size and returns the raw
    /// `valSize` bytes stored for an exact match, or `None`.
    pub(crate) fn find<R: Read + Seek>(
        &self,
        reader: &mut R,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, BPlusTreeError> {
        if key.len() > self.key_size as usize {
            return Err(BPlusTreeError::KeyTooLong);
        }
        let mut padded = vec![0u8; self.key_size as usize];
        padded[..key.len()].copy_from_slice(key);

        let mut br = ByteReader::new(reader, self.endianness);
        self.find_at(&mut br, self.root_offset, &padded)
    }

    fn find_at<R: Read + Seek>(
        &self,
        br: &mut ByteReader<&mut R>,
        offset: u64,
        padded_key: &[u8],
    ) -> Result<Option<Vec<u8>>, BPlusTreeError> {
        br.seek(offset)?;
        let is_leaf = br.read_u8()?;
        let _reserved = br.read_u8()?;
        let child_count = br.read_u16()?;

        if is_leaf == 1 {
            for _ in 0..child_count {
                let key = br.read_bytes(self.key_size as usize)?;
                let value = br.read_bytes(self.val_size as usize)?;
                if key == padded_key {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        } else {
            if child_count == 0 {
                return Err(BPlusTreeError::CorruptNode(
                    "internal node with childCount == 0".to_owned(),
                ));
            }
            let _first_key = br.read_bytes(self.key_size as usize)?;
            let mut descend_offset = br.read_u64()?;
            for _ in 0..(child_count - 1) {
                let key = br.read_bytes(self.key_size as usize)?;
                if key.as_slice() > padded_key {
                    break;
                }
                descend_offset = br.read_u64()?;
            }
            self.find_at(br, descend_offset, padded_key)
        }
    }

    /// Visits every leaf in left-to-right order, decoding the standard
    /// `(chromId, chromSize)` value layout used by the chromosome tree.
    pub(crate) fn traverse<R: Read + Seek>(
        &self,
        reader: &mut R,
        visit: &mut dyn FnMut(ChromInfo),
    ) -> Result<(), BPlusTreeError> {
        let mut br = ByteReader::new(reader, self.endianness);
        self.traverse_at(&mut br, self.root_offset, visit)
    }

    fn traverse_at<R: Read + Seek>(
        &self,
        br: &mut ByteReader<&mut R>,
        offset: u64,
        visit: &mut dyn FnMut(ChromInfo),
    ) -> Result<(), BPlusTreeError> {
        br.seek(offset)?;
        let is_leaf = br.read_u8()?;
        let _reserved = br.read_u8()?;
        let child_count = br.read_u16()?;

        if is_leaf == 1 {
            for _ in 0..child_count {
                let key = br.read_bytes(self.key_size as usize)?;
                let value = br.read_bytes(self.val_size as usize)?;
                let name = String::from_utf8_lossy(&key)
                    .trim_end_matches('\0')
                    .to_owned();
                let (id, size) = decode_chrom_value(&value, self.endianness);
                visit(ChromInfo { name, id, size });
            }
            Ok(())
        } else {
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                let _key = br.read_bytes(self.key_size as usize)?;
                let offset = br.read_u64()?;
                children.push(offset);
            }
            for child in children {
                self.traverse_at(br, child, visit)?;
            }
            Ok(())
        }
    }
}

pub(crate) fn decode_chrom_value(value: &[u8], endianness: Endianness) -> (u32, u32) {
    let id_bytes: [u8; 4] = value[0..4].try_into().unwrap();
    let size_bytes: [u8; 4] = value[4..8].try_into().unwrap();
    match endianness {
        Endianness::Big => (u32::from_be_bytes(id_bytes), u32::from_be_bytes(size_bytes)),
        Endianness::Little => (u32::from_le_bytes(id_bytes), u32::from_le_bytes(size_bytes)),
    }
}
