use std::io::{Read, Seek, SeekFrom};

use byteordered::Endianness;

use crate::bbi::{Block, CIR_TREE_MAGIC};
use crate::byteio::{endianness_from_magic, read_exact_checked, ByteReader};
use crate::error::{BigBedOpenError, CirTreeError};

/// Header fields of the chromosome-interval R-tree, exposed for
/// introspection/debugging; the core's own overlap search only needs
/// `root_offset` and `endianness`, but the remaining fields are surfaced
/// here the way `ZoomHeader` surfaces the zoom table's fields.
#[derive(Copy, Clone, Debug)]
pub struct CirTreeInfo {
    pub item_count: u64,
    pub start_chrom_ix: u32,
    pub start_base: u32,
    pub end_chrom_ix: u32,
    pub end_base: u32,
    pub file_size: u64,
    pub items_per_slot: u32,
}

/// Header of the chromosome-interval R-tree (CIR-tree), plus enough state
/// to run an overlap search against a caller-supplied reader.
pub(crate) struct CirTreeHeader {
    endianness: Endianness,
    root_offset: u64,
    item_count: u64,
    start_chrom_ix: u32,
    start_base: u32,
    end_chrom_ix: u32,
    end_base: u32,
    file_size: u64,
    items_per_slot: u32,
}

impl CirTreeHeader {
    pub(crate) fn open<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
    ) -> Result<Self, BigBedOpenError> {
        reader.seek(SeekFrom::Start(offset))?;
        let mut magic_bytes = [0u8; 4];
        read_exact_checked(reader, &mut magic_bytes)?;
        let endianness = endianness_from_magic(magic_bytes, CIR_TREE_MAGIC)
            .ok_or(BigBedOpenError::BadMagic)?;

        let mut reader = ByteReader::new(reader, endianness);
        let _block_size = reader.read_u32()?;
        let item_count = reader.read_u64()?;
        let start_chrom_ix = reader.read_u32()?;
        let start_base = reader.read_u32()?;
        let end_chrom_ix = reader.read_u32()?;
        let end_base = reader.read_u32()?;
        let file_size = reader.read_u64()?;
        let items_per_slot = reader.read_u32()?;
        let _reserved = reader.read_u32()?;
        // magic(4) + blockSize(4) + itemCount(8) + 4*u32 + fileSize(8) + itemsPerSlot(4) + reserved(4)
        let root_offset = offset + 4 + 4 + 8 + 16 + 8 + 4 + 4;

        Ok(CirTreeHeader {
            endianness,
            root_offset,
            item_count,
            start_chrom_ix,
            start_base,
            end_chrom_ix,
            end_base,
            file_size,
            items_per_slot,
        })
    }

    /// The tree's own header fields, for introspection/debugging.
    pub(crate) fn info(&self) -> CirTreeInfo {
        CirTreeInfo {
            item_count: self.item_count,
            start_chrom_ix: self.start_chrom_ix,
            start_base: self.start_base,
            end_chrom_ix: self.end_chrom_ix,
            end_base: self.end_base,
            file_size: self.file_size,
            items_per_slot: self.items_per_slot,
        }
    }

    /// Returns every leaf `(offset, size)` block whose interval overlaps
    /// `[qStart, qEnd)` on chromosome `q_chrom`, in pre-order (and therefore
    /// file-offset) order.
    pub(crate) fn find_overlapping<R: Read + Seek>(
        &self,
        reader: &mut R,
        q_chrom: u32,
        q_start: u32,
        q_end: u32,
    ) -> Result<Vec<Block>, CirTreeError> {
        let mut br = ByteReader::new(reader, self.endianness);
        let mut blocks = Vec::new();
        self.search_at(&mut br, self.root_offset, q_chrom, q_start, q_end, &mut blocks)?;
        Ok(blocks)
    }

    fn search_at<R: Read + Seek>(
        &self,
        br: &mut ByteReader<&mut R>,
        offset: u64,
        q_chrom: u32,
        q_start: u32,
        q_end: u32,
        blocks: &mut Vec<Block>,
    ) -> Result<(), CirTreeError> {
        br.seek(offset)?;
        let is_leaf = br.read_u8()?;
        let _reserved = br.read_u8()?;
        let child_count = br.read_u16()?;

        if is_leaf == 1 {
            for _ in 0..child_count {
                let s_chrom = br.read_u32()?;
                let s_base = br.read_u32()?;
                let e_chrom = br.read_u32()?;
                let e_base = br.read_u32()?;
                let child_offset = br.read_u64()?;
                let size = br.read_u64()?;
                if overlaps(q_chrom, q_start, q_end, s_chrom, s_base, e_chrom, e_base) {
                    blocks.push(Block {
                        offset: child_offset,
                        size,
                    });
                }
            }
        } else {
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                let s_chrom = br.read_u32()?;
                let s_base = br.read_u32()?;
                let e_chrom = br.read_u32()?;
                let e_base = br.read_u32()?;
                let child_offset = br.read_u64()?;
                if overlaps(q_chrom, q_start, q_end, s_chrom, s_base, e_chrom, e_base) {
                    children.push(child_offset);
                }
            }
            for child in children {
                self.search_at(br, child, q_chrom, q_start, q_end, blocks)?;
            }
        }
        Ok(())
    }
}

/// Lexicographic comparison of `(chrom, base)` pairs, using the convention
/// `+1` when `a < b`, `-1` when `a > b`, `0` when equal (matching the
/// reference tool's `cmpTwo`, which is inverted from the usual `Ordering`
/// convention; `overlaps` below is written to agree with it).
#[inline]
fn cmp_two(a_hi: u32, a_lo: u32, b_hi: u32, b_lo: u32) -> i32 {
    if a_hi < b_hi {
        1
    } else if a_hi > b_hi {
        -1
    } else if a_lo < b_lo {
        1
    } else if a_lo > b_lo {
        -1
    } else {
        0
    }
}

#[inline]
fn overlaps(
    q_chrom: u32,
    q_start: u32,
    q_end: u32,
    r_start_chrom: u32,
    r_start_base: u32,
    r_end_chrom: u32,
    r_end_base: u32,
) -> bool {
    cmp_two(q_chrom, q_start, r_end_chrom, r_end_base) > 0
        && cmp_two(q_chrom, q_end, r_start_chrom, r_start_base) < 0
}
