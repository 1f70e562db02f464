use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use byteordered::Endianness;

use crate::bbi::bplus_tree::{decode_chrom_value, BPlusTreeHeader};
use crate::bbi::cir_tree::{CirTreeHeader, CirTreeInfo};
use crate::bbi::{BedLine, ChromInfo, Block, BIGBED_MAGIC};
use crate::byteio::{endianness_from_magic, read_exact_checked, ByteReader};
use crate::error::{BigBedOpenError, BigBedReadError};
use crate::utils::reopen::{Reopen, ReopenableFile, SeekableRead};

/// One entry of the BigBed zoom-level table.
///
/// The core reads this table at open time (it is part of the fixed on-disk
/// layout) but never queries a zoom level's summary data; see the crate's
/// non-goals.
#[derive(Copy, Clone, Debug)]
pub struct ZoomHeader {
    pub reduction_level: u32,
    pub data_offset: u64,
    pub index_offset: u64,
}

#[derive(Copy, Clone, Debug)]
struct BBIHeader {
    endianness: Endianness,
    version: u16,
    field_count: u16,
    defined_field_count: u16,
    chrom_tree_offset: u64,
    #[allow(dead_code)]
    unzoomed_data_offset: u64,
    unzoomed_index_offset: u64,
    #[allow(dead_code)]
    as_offset: u64,
    #[allow(dead_code)]
    total_summary_offset: u64,
    uncompress_buf_size: u32,
    /// `None` when `extensionOffset == 0` (no extension header present).
    extension_size: Option<u16>,
    extra_index_count: Option<u16>,
    extra_index_list_offset: Option<u64>,
}

/// A handle onto an open BigBed file.
///
/// Holds one open reader plus the parsed header, the chromosome B+ tree,
/// and (after the first query) the unzoomed CIR-tree. No node state is
/// cached across queries; every `query`/`traverse` re-reads the relevant
/// nodes from `read`.
pub struct BigBedRead<R> {
    read: R,
    header: BBIHeader,
    zoom_headers: Vec<ZoomHeader>,
    chrom_tree: BPlusTreeHeader,
    chrom_info: Vec<ChromInfo>,
    unzoomed_cir: Option<CirTreeHeader>,
}

impl<R: Reopen + SeekableRead> Reopen for BigBedRead<R> {
    fn reopen(&self) -> std::io::Result<Self> {
        let mut read = self.read.reopen()?;
        let chrom_tree = BPlusTreeHeader::open(&mut read, self.header.chrom_tree_offset)
            .expect("chromosome tree was already validated at first open");
        Ok(BigBedRead {
            read,
            header: self.header,
            zoom_headers: self.zoom_headers.clone(),
            chrom_tree,
            chrom_info: self.chrom_info.clone(),
            unzoomed_cir: None,
        })
    }
}

impl BigBedRead<ReopenableFile> {
    /// Opens a BigBed file at `path`.
    pub fn open_file(path: &str) -> Result<Self, BigBedOpenError> {
        let reopen = ReopenableFile {
            path: path.to_string(),
            file: File::open(path)?,
        };
        Self::open(reopen)
    }
}

impl<R: SeekableRead> BigBedRead<R> {
    /// Opens a BigBed container from any seekable reader: validates the
    /// signature, reads the fixed header and zoom table, and attaches the
    /// chromosome B+ tree. The CIR-tree is *not* read yet; see `query`.
    pub fn open(mut read: R) -> Result<Self, BigBedOpenError> {
        read.seek(SeekFrom::Start(0))?;
        let mut magic_bytes = [0u8; 4];
        read_exact_checked(&mut read, &mut magic_bytes)?;
        let endianness =
            endianness_from_magic(magic_bytes, BIGBED_MAGIC).ok_or(BigBedOpenError::BadMagic)?;

        let mut br = ByteReader::new(&mut read, endianness);
        let version = br.read_u16()?;
        let zoom_levels = br.read_u16()?;
        let chrom_tree_offset = br.read_u64()?;
        let unzoomed_data_offset = br.read_u64()?;
        let unzoomed_index_offset = br.read_u64()?;
        let field_count = br.read_u16()?;
        let defined_field_count = br.read_u16()?;
        let as_offset = br.read_u64()?;
        let total_summary_offset = br.read_u64()?;
        let uncompress_buf_size = br.read_u32()?;
        let extension_offset = br.read_u64()?;

        let mut zoom_headers = Vec::with_capacity(zoom_levels as usize);
        for _ in 0..zoom_levels {
            let reduction_level = br.read_u32()?;
            let _reserved = br.read_u32()?;
            let data_offset = br.read_u64()?;
            let index_offset = br.read_u64()?;
            zoom_headers.push(ZoomHeader {
                reduction_level,
                data_offset,
                index_offset,
            });
        }

        let (extension_size, extra_index_count, extra_index_list_offset) = if extension_offset != 0
        {
            br.seek(extension_offset)?;
            let extension_size = br.read_u16()?;
            let extra_index_count = br.read_u16()?;
            let extra_index_list_offset = br.read_u64()?;
            (
                Some(extension_size),
                Some(extra_index_count),
                Some(extra_index_list_offset),
            )
        } else {
            (None, None, None)
        };

        let header = BBIHeader {
            endianness,
            version,
            field_count,
            defined_field_count,
            chrom_tree_offset,
            unzoomed_data_offset,
            unzoomed_index_offset,
            as_offset,
            total_summary_offset,
            uncompress_buf_size,
            extension_size,
            extra_index_count,
            extra_index_list_offset,
        };

        let chrom_tree = BPlusTreeHeader::open(&mut read, chrom_tree_offset)?;
        let mut chrom_info = Vec::with_capacity(chrom_tree.item_count() as usize);
        chrom_tree
            .traverse(&mut read, &mut |c| chrom_info.push(c))
            .map_err(|e| BigBedOpenError::InvalidChromTree(e.to_string()))?;

        Ok(BigBedRead {
            read,
            header,
            zoom_headers,
            chrom_tree,
            chrom_info,
            unzoomed_cir: None,
        })
    }

    pub fn version(&self) -> u16 {
        self.header.version
    }

    pub fn field_count(&self) -> u16 {
        self.header.field_count
    }

    pub fn defined_field_count(&self) -> u16 {
        self.header.defined_field_count
    }

    pub fn zoom_headers(&self) -> &[ZoomHeader] {
        &self.zoom_headers
    }

    /// `extensionSize` from the extension header, or `None` if the file has
    /// no extension header (`extensionOffset == 0`). Read but not otherwise
    /// consumed by the core; see the crate's non-goals around extra-field
    /// indices.
    pub fn extension_size(&self) -> Option<u16> {
        self.header.extension_size
    }

    /// `extraIndexCount` from the extension header, if present.
    pub fn extra_index_count(&self) -> Option<u16> {
        self.header.extra_index_count
    }

    /// `extraIndexListOffset` from the extension header, if present.
    pub fn extra_index_list_offset(&self) -> Option<u64> {
        self.header.extra_index_list_offset
    }

    /// The chromosomes recorded in the B+ tree, in tree (name-sorted) order.
    pub fn chrom_list(&self) -> Vec<ChromInfo> {
        self.chrom_info.clone()
    }

    /// Header fields of the unzoomed CIR-tree, once attached. Returns
    /// `None` before the first `query`, since the CIR-tree is attached
    /// lazily and its header is not read at `open`.
    pub fn cir_tree_info(&self) -> Option<CirTreeInfo> {
        self.unzoomed_cir.as_ref().map(CirTreeHeader::info)
    }

    /// Reads the raw AutoSQL text blob. Its schema is not interpreted.
    pub fn autosql(&mut self) -> Result<String, BigBedReadError> {
        self.read.seek(SeekFrom::Start(self.header.as_offset))?;
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            self.read.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf)
            .map_err(|_| BigBedReadError::CorruptNode("autosql blob was not valid UTF-8".into()))
    }

    /// Looks up `name` in the chromosome B+ tree. A name longer than the
    /// tree's key size can never match a stored key, so it is treated the
    /// same as a plain miss rather than surfaced as a `KeyTooLong` error —
    /// this is what lets the `chr`-prefix fallback in `query` work when the
    /// tree stores short names but the caller passes a `chr`-prefixed one.
    fn find_chrom(&mut self, name: &[u8]) -> Result<Option<Vec<u8>>, BigBedReadError> {
        match self.chrom_tree.find(&mut self.read, name) {
            Ok(v) => Ok(v),
            Err(crate::error::BPlusTreeError::KeyTooLong) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a chromosome's overlapping records in `[start, end)`,
    /// stopping after `max_items` results (`0` means unlimited).
    ///
    /// Falls back to stripping a leading `"chr"` if the exact name is not
    /// found (never the reverse — if the tree stores `"chr1"` a lookup for
    /// `"1"` will not fall back to trying `"chr1"`).
    pub fn query(
        &mut self,
        chrom: &[u8],
        start: u32,
        end: u32,
        max_items: u32,
    ) -> Result<Vec<BedLine>, BigBedReadError> {
        let found = self.find_chrom(chrom)?;
        let value = match found {
            Some(v) => Some(v),
            None => {
                if let Some(stripped) = chrom.strip_prefix(b"chr") {
                    self.find_chrom(stripped)?
                } else {
                    None
                }
            }
        };
        let value = match value {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };
        let (chrom_id, _chrom_size) = decode_chrom_value(&value, self.chrom_tree.endianness());

        if self.unzoomed_cir.is_none() {
            self.unzoomed_cir = Some(CirTreeHeader::open(
                &mut self.read,
                self.header.unzoomed_index_offset,
            )?);
        }

        let padded_start = start.saturating_sub(1);
        let padded_end = end.saturating_add(1);

        let blocks: Vec<Block> = self
            .unzoomed_cir
            .as_ref()
            .unwrap()
            .find_overlapping(&mut self.read, chrom_id, padded_start, padded_end)?;

        crate::bbi::pipeline::read_blocks(
            &mut self.read,
            self.header.endianness,
            self.header.uncompress_buf_size,
            &blocks,
            chrom_id,
            start,
            end,
            max_items,
        )
    }

    /// Enumerates every chromosome's records, in B+ tree order, then by
    /// file offset within each chromosome.
    pub fn to_bed(&mut self, max_items: u32) -> Result<Vec<(String, BedLine)>, BigBedReadError> {
        let mut out = Vec::new();
        let chroms = self.chrom_info.clone();
        for chrom in chroms {
            let remaining = if max_items == 0 {
                0
            } else {
                let used = out.len() as u32;
                if used >= max_items {
                    break;
                }
                max_items - used
            };
            let lines = self.query(chrom.name.as_bytes(), 0, chrom.size, remaining)?;
            out.extend(lines.into_iter().map(|l| (chrom.name.clone(), l)));
        }
        Ok(out)
    }
}
