//! A reader for the BigBed binary genomic annotation format.
//!
//! BigBed pairs a B+ tree (keyed by chromosome name) with an R-tree (keyed
//! by genomic interval) so that range queries over compressed BED records
//! can be served without scanning the whole file. This crate implements
//! that on-disk format decoder and the two index traversals; it does not
//! write BigBed files, query zoom-level summaries, or interpret the
//! AutoSQL schema blob.

mod bbi;
mod byteio;
pub mod error;
pub mod utils;

pub use bbi::{BedLine, BigBedRead, ChromInfo, CirTreeInfo, ZoomHeader};
pub use error::{BigBedOpenError, BigBedReadError};
