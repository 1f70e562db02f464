use std::io::{Read, Seek, SeekFrom};

use byteordered::Endianness;

use crate::bbi::BedLine;
use crate::error::BigBedReadError;

/// A contiguous byte range in the BigBed file holding one original
/// (possibly compressed) block of concatenated BED records.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Block {
    pub offset: u64,
    pub size: u64,
}

/// Reads, merges, decompresses, and decodes an offset-ordered run of
/// blocks, filtering to records that overlap `[filter_start, filter_end)`
/// on `filter_chrom`, and stops once `max_items` (if nonzero) records have
/// been produced.
///
/// `blocks` must already be sorted by `offset` (CIR-tree search results are,
/// since leaves are laid out in file order).
pub(crate) fn read_blocks<R: Read + Seek>(
    reader: &mut R,
    endianness: Endianness,
    uncompress_buf_size: u32,
    mut blocks: &[Block],
    filter_chrom: u32,
    filter_start: u32,
    filter_end: u32,
    max_items: u32,
) -> Result<Vec<BedLine>, BigBedReadError> {
    let mut out = Vec::new();

    while !blocks.is_empty() {
        let (before_gap, after_gap) = find_gap(blocks);

        let merged_offset = blocks[0].offset;
        let merged_size = blocks[before_gap].offset + blocks[before_gap].size - merged_offset;
        reader.seek(SeekFrom::Start(merged_offset))?;
        let mut merged_buf = vec![0u8; merged_size as usize];
        reader.read_exact(&mut merged_buf)?;

        let mut block_pt: usize = 0;
        'blocks: for block in &blocks[..after_gap] {
            let block_stream: Vec<u8> = if uncompress_buf_size > 0 {
                decompress(
                    &merged_buf[block_pt..block_pt + block.size as usize],
                    uncompress_buf_size as usize,
                )?
            } else {
                merged_buf[block_pt..block_pt + block.size as usize].to_vec()
            };
            block_pt += block.size as usize;

            let mut cursor = 0usize;
            while cursor < block_stream.len() {
                let (line, advanced) =
                    decode_record(&block_stream[cursor..], endianness)?;
                cursor += advanced;

                let chr = line.chrom_id;
                let s = line.start;
                let e = line.end;
                let matches = chr == filter_chrom
                    && ((s < filter_end && e > filter_start)
                        || (s == e && (s == filter_end || filter_end == filter_start)));
                if matches {
                    out.push(line);
                    if max_items > 0 && out.len() as u32 >= max_items {
                        break 'blocks;
                    }
                }
            }
        }
        if max_items > 0 && out.len() as u32 >= max_items {
            break;
        }
        blocks = &blocks[after_gap..];
    }

    Ok(out)
}

/// Returns `(before_gap, after_gap)`: the index of the last block in the
/// longest physically-contiguous prefix run, and the index just past it.
fn find_gap(blocks: &[Block]) -> (usize, usize) {
    for i in 0..blocks.len() {
        let next = i + 1;
        if next >= blocks.len() || blocks[next].offset != blocks[i].offset + blocks[i].size {
            return (i, next);
        }
    }
    (0, blocks.len())
}

fn decompress(raw: &[u8], uncompress_buf_size: usize) -> Result<Vec<u8>, BigBedReadError> {
    use libdeflater::Decompressor;

    let mut decompressor = Decompressor::new();
    let mut out = vec![0u8; uncompress_buf_size];
    let n = decompressor
        .zlib_decompress(raw, &mut out)
        .map_err(|e| BigBedReadError::DecompressError(e.to_string()))?;
    out.truncate(n);
    Ok(out)
}

/// Decodes one `(chromId, chromStart, chromEnd, rest\0)` record from the
/// front of `buf`, returning the record and the number of bytes consumed
/// (including the null terminator).
fn decode_record(buf: &[u8], endianness: Endianness) -> Result<(BedLine, usize), BigBedReadError> {
    if buf.len() < 12 {
        return Err(BigBedReadError::TruncatedNode {
            expected: 12,
            got: buf.len(),
        });
    }
    let read_u32 = |b: &[u8]| -> u32 {
        let arr: [u8; 4] = b[0..4].try_into().unwrap();
        match endianness {
            Endianness::Big => u32::from_be_bytes(arr),
            Endianness::Little => u32::from_le_bytes(arr),
        }
    };
    let chrom_id = read_u32(&buf[0..4]);
    let start = read_u32(&buf[4..8]);
    let end = read_u32(&buf[8..12]);

    let tail = &buf[12..];
    let rest_len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
        BigBedReadError::CorruptNode("BED record missing null terminator".to_owned())
    })?;
    let rest = if rest_len > 0 {
        Some(tail[..rest_len].to_vec())
    } else {
        None
    };

    // Advance past chrom/start/end, the rest bytes, and the null terminator.
    let advanced = 12 + rest_len + 1;
    Ok((
        BedLine {
            start,
            end,
            chrom_id,
            rest,
        },
        advanced,
    ))
}
