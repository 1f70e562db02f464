//! These tests build minimal BigBed byte buffers by hand (the crate has no
//! write path) rather than reading real `.bb` fixtures produced by an
//! external tool.

use std::io::Cursor;

use bigbed::BigBedRead;

const BIGBED_MAGIC: u32 = 0x8789_F2EB;
const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;
const CIR_TREE_MAGIC: u32 = 0x2468_ACE0;

#[derive(Clone, Copy)]
enum Endian {
    Big,
    Little,
}

struct Writer {
    buf: Vec<u8>,
    endian: Endian,
}

impl Writer {
    fn new(endian: Endian) -> Self {
        Writer {
            buf: Vec::new(),
            endian,
        }
    }

    fn pos(&self) -> u64 {
        self.buf.len() as u64
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        match self.endian {
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
        }
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        match self.endian {
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
        }
        self
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        match self.endian {
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
        }
        self
    }

    fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }
}

/// One BED-like record to bake into a fixture.
struct Rec {
    chrom: usize,
    start: u32,
    end: u32,
    rest: &'static [u8],
}

fn encode_record(w: &mut Writer, chrom_id: u32, r: &Rec) {
    w.u32(chrom_id).u32(r.start).u32(r.end).raw(r.rest).u8(0);
}

fn record_len(r: &Rec) -> usize {
    12 + r.rest.len() + 1
}

/// Builds a minimal valid BigBed byte buffer with one data block per
/// chromosome (in the order chromosomes are given), an uncompressed or
/// zlib-compressed body, and single-leaf-node B+ and CIR trees.
fn build_bigbed(
    chroms: &[(&str, u32)],
    records: &[Rec],
    endian: Endian,
    compress: bool,
) -> Vec<u8> {
    let key_size = chroms.iter().map(|(n, _)| n.len()).max().unwrap_or(1) as u32;

    // Lay out the per-chromosome blocks (each chrom's records concatenated,
    // compressed individually if requested) so we know offsets/sizes
    // before writing the CIR-tree.
    let mut block_bytes: Vec<Vec<u8>> = Vec::new();
    let mut block_ranges: Vec<(u32, u32, u32, u32)> = Vec::new(); // start_base,end_base per chrom (chrom fixed)
    for (chrom_ix, _) in chroms.iter().enumerate() {
        let mut raw = Vec::new();
        let mut min_start = u32::MAX;
        let mut max_end = 0u32;
        for r in records.iter().filter(|r| r.chrom == chrom_ix) {
            let mut rw = Writer::new(endian);
            encode_record(&mut rw, chrom_ix as u32, r);
            raw.extend_from_slice(&rw.buf);
            min_start = min_start.min(r.start);
            max_end = max_end.max(r.end);
        }
        let stored = if compress {
            compress_zlib(&raw)
        } else {
            raw
        };
        block_bytes.push(stored);
        block_ranges.push((chrom_ix as u32, min_start, chrom_ix as u32, max_end));
    }

    // ---- layout ----
    const HEADER_LEN: u64 = 64;
    let bpt_offset = HEADER_LEN;
    let bpt_header_len: u64 = 32;
    let bpt_root_len: u64 = 4 + (chroms.len() as u64) * (key_size as u64 + 8);
    let cir_offset = bpt_offset + bpt_header_len + bpt_root_len;
    let cir_header_len: u64 = 48;
    let cir_root_len: u64 = 4 + (chroms.len() as u64) * 32;
    let data_offset = cir_offset + cir_header_len + cir_root_len;

    let mut block_offsets = Vec::new();
    let mut cursor = data_offset;
    for b in &block_bytes {
        block_offsets.push(cursor);
        cursor += b.len() as u64;
    }

    // ---- BigBed header ----
    let mut w = Writer::new(endian);
    w.u32(BIGBED_MAGIC);
    w.u16(4); // version
    w.u16(0); // zoomLevels
    w.u64(bpt_offset); // chromTreeOffset
    w.u64(data_offset); // unzoomedDataOffset
    w.u64(cir_offset); // unzoomedIndexOffset
    w.u16(4); // fieldCount
    w.u16(3); // definedFieldCount
    w.u64(0); // asOffset
    w.u64(0); // totalSummaryOffset
    w.u32(if compress { 1 << 20 } else { 0 }); // uncompressBufSize
    w.u64(0); // extensionOffset
    assert_eq!(w.pos(), HEADER_LEN);

    // ---- B+ tree ----
    w.u32(CHROM_TREE_MAGIC);
    w.u32(1); // blockSize
    w.u32(key_size);
    w.u32(8); // valSize
    w.u64(chroms.len() as u64); // itemCount
    w.u64(0); // reserved
    assert_eq!(w.pos(), bpt_offset + bpt_header_len);

    w.u8(1); // isLeaf
    w.u8(0); // reserved
    w.u16(chroms.len() as u16);
    for (ix, (name, size)) in chroms.iter().enumerate() {
        let mut key = vec![0u8; key_size as usize];
        key[..name.len()].copy_from_slice(name.as_bytes());
        w.raw(&key);
        w.u32(ix as u32);
        w.u32(*size);
    }
    assert_eq!(w.pos(), cir_offset);

    // ---- CIR tree ----
    w.u32(CIR_TREE_MAGIC);
    w.u32(1); // blockSize
    w.u64(chroms.len() as u64); // itemCount
    w.u32(0); // startChromIx
    w.u32(0); // startBase
    w.u32((chroms.len() as u32).saturating_sub(1)); // endChromIx
    w.u32(u32::MAX); // endBase
    w.u64(cursor); // fileSize
    w.u32(chroms.len() as u32); // itemsPerSlot
    w.u32(0); // reserved
    assert_eq!(w.pos(), cir_offset + cir_header_len);

    w.u8(1); // isLeaf
    w.u8(0);
    w.u16(chroms.len() as u16);
    for (i, (s_chrom, s_base, e_chrom, e_base)) in block_ranges.iter().enumerate() {
        w.u32(*s_chrom);
        w.u32(*s_base);
        w.u32(*e_chrom);
        w.u32(*e_base);
        w.u64(block_offsets[i]);
        w.u64(block_bytes[i].len() as u64);
    }
    assert_eq!(w.pos(), data_offset);

    for b in &block_bytes {
        w.raw(b);
    }

    w.buf
}

fn compress_zlib(raw: &[u8]) -> Vec<u8> {
    use libdeflater::{CompressionLvl, Compressor};
    let mut compressor = Compressor::new(CompressionLvl::default());
    let mut out = vec![0u8; compressor.zlib_compress_bound(raw.len())];
    let n = compressor.zlib_compress(raw, &mut out).unwrap();
    out.truncate(n);
    out
}

fn four_record_fixture(endian: Endian, compress: bool) -> Vec<u8> {
    let chroms = [("chr1", 25u32), ("chr2", 100u32)];
    let records = [
        Rec {
            chrom: 0,
            start: 10,
            end: 20,
            rest: b"a",
        },
        Rec {
            chrom: 0,
            start: 15,
            end: 25,
            rest: b"b",
        },
        Rec {
            chrom: 0,
            start: 30,
            end: 30,
            rest: b"zero",
        },
        Rec {
            chrom: 1,
            start: 0,
            end: 100,
            rest: b"c",
        },
    ];
    build_bigbed(&chroms, &records, endian, compress)
}

#[test]
fn chrom_list_reports_names_ids_and_sizes() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let mut chroms = r.chrom_list();
    chroms.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(chroms.len(), 2);
    assert_eq!(chroms[0].name, "chr1");
    assert_eq!(chroms[0].size, 25);
    assert_eq!(chroms[1].name, "chr2");
    assert_eq!(chroms[1].size, 100);
}

#[test]
fn query_returns_overlapping_records_in_file_order() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chr1", 12, 18, 0).unwrap();
    let pairs: Vec<(u32, u32)> = got.iter().map(|l| (l.start, l.end)).collect();
    assert_eq!(pairs, vec![(10, 20), (15, 25)]);
    assert_eq!(got[0].rest.as_deref(), Some(b"a".as_slice()));
    assert_eq!(got[1].rest.as_deref(), Some(b"b".as_slice()));
}

#[test]
fn query_finds_zero_length_insertion_at_exact_boundary() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chr1", 30, 30, 0).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!((got[0].start, got[0].end), (30, 30));
    assert_eq!(got[0].rest.as_deref(), Some(b"zero".as_slice()));
}

#[test]
fn query_outside_any_record_is_empty() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chr1", 0, 5, 0).unwrap();
    assert!(got.is_empty());
}

#[test]
fn query_bounds_output_with_max_items() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chr1", 0, 25, 1).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!((got[0].start, got[0].end), (10, 20));
}

#[test]
fn unknown_chromosome_returns_empty_not_error() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chrZZZ", 0, 10, 0).unwrap();
    assert!(got.is_empty());
}

#[test]
fn chr_prefix_fallback_is_one_directional() {
    // Tree stores "chr1": looking up "1" does not find it (no reverse
    // fallback from bare name to "chr"-prefixed name).
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    assert!(r.query(b"1", 12, 18, 0).unwrap().is_empty());

    // Tree stores "X": looking up "chrX" strips the prefix and succeeds.
    let chroms = [("X", 50u32)];
    let records = [Rec {
        chrom: 0,
        start: 5,
        end: 10,
        rest: b"",
    }];
    let data2 = build_bigbed(&chroms, &records, Endian::Big, false);
    let mut r2 = BigBedRead::open(Cursor::new(data2)).unwrap();
    let got = r2.query(b"chrX", 0, 50, 0).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!((got[0].start, got[0].end), (5, 10));
}

#[test]
fn to_bed_groups_records_contiguously_per_chromosome() {
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let lines = r.to_bed(0).unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines[..3].iter().all(|(name, _)| name == "chr1"));
    assert_eq!(lines[3].0, "chr2");
}

#[test]
fn little_endian_and_big_endian_fixtures_agree() {
    let big = four_record_fixture(Endian::Big, false);
    let little = four_record_fixture(Endian::Little, false);

    let mut rb = BigBedRead::open(Cursor::new(big)).unwrap();
    let mut rl = BigBedRead::open(Cursor::new(little)).unwrap();

    let bed_b = rb.to_bed(0).unwrap();
    let bed_l = rl.to_bed(0).unwrap();
    assert_eq!(bed_b.len(), bed_l.len());
    for ((name_b, line_b), (name_l, line_l)) in bed_b.iter().zip(bed_l.iter()) {
        assert_eq!(name_b, name_l);
        assert_eq!(line_b.start, line_l.start);
        assert_eq!(line_b.end, line_l.end);
        assert_eq!(line_b.rest, line_l.rest);
    }
}

#[test]
fn compressed_blocks_decode_identically_to_uncompressed() {
    let plain = four_record_fixture(Endian::Big, false);
    let compressed = four_record_fixture(Endian::Big, true);

    let mut rp = BigBedRead::open(Cursor::new(plain)).unwrap();
    let mut rc = BigBedRead::open(Cursor::new(compressed)).unwrap();

    let bed_p = rp.to_bed(0).unwrap();
    let bed_c = rc.to_bed(0).unwrap();
    assert_eq!(bed_p, bed_c);
}

#[test]
fn multi_block_query_coalesces_reads_without_changing_results() {
    // Two chromosomes means two physically adjacent data blocks; querying
    // across both (conceptually) should still only ever return records
    // belonging to the requested chromosome.
    let data = four_record_fixture(Endian::Big, false);
    let mut r = BigBedRead::open(Cursor::new(data)).unwrap();
    let got = r.query(b"chr2", 0, 100, 0).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].rest.as_deref(), Some(b"c".as_slice()));
}
