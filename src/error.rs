use std::io;

use thiserror::Error;

use crate::byteio::ByteReadError;

/// Errors that can occur while opening a BigBed file.
#[derive(Error, Debug)]
pub enum BigBedOpenError {
    #[error("file signature did not match a BigBed file (checked both byte orders)")]
    BadMagic,
    #[error("header was truncated: expected {expected} bytes, got {got}")]
    TruncatedHeader { expected: usize, got: usize },
    #[error("chromosome B+ tree was invalid: {0}")]
    InvalidChromTree(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ByteReadError> for BigBedOpenError {
    fn from(e: ByteReadError) -> Self {
        match e {
            ByteReadError::Truncated { expected, got } => {
                BigBedOpenError::TruncatedHeader { expected, got }
            }
            ByteReadError::Io(e) => BigBedOpenError::Io(e),
        }
    }
}

impl From<BigBedOpenError> for BigBedReadError {
    fn from(e: BigBedOpenError) -> Self {
        match e {
            BigBedOpenError::BadMagic => {
                BigBedReadError::CorruptNode("bad magic while lazily attaching index".to_owned())
            }
            BigBedOpenError::TruncatedHeader { expected, got } => {
                BigBedReadError::TruncatedNode { expected, got }
            }
            BigBedOpenError::InvalidChromTree(s) => BigBedReadError::CorruptNode(s),
            BigBedOpenError::Io(e) => BigBedReadError::Io(e),
        }
    }
}

/// Errors internal to a single B+ tree descent.
#[derive(Error, Debug)]
pub(crate) enum BPlusTreeError {
    #[error("lookup key is longer than the tree's key size")]
    KeyTooLong,
    #[error("B+ tree node was corrupt: {0}")]
    CorruptNode(String),
    #[error("B+ tree node was truncated: expected {expected} bytes, got {got}")]
    TruncatedNode { expected: usize, got: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ByteReadError> for BPlusTreeError {
    fn from(e: ByteReadError) -> Self {
        match e {
            ByteReadError::Truncated { expected, got } => {
                BPlusTreeError::TruncatedNode { expected, got }
            }
            ByteReadError::Io(e) => BPlusTreeError::Io(e),
        }
    }
}

/// Errors internal to a single CIR-tree descent.
#[derive(Error, Debug)]
pub(crate) enum CirTreeError {
    #[error("CIR-tree node was corrupt: {0}")]
    CorruptNode(String),
    #[error("CIR-tree node was truncated: expected {expected} bytes, got {got}")]
    TruncatedNode { expected: usize, got: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ByteReadError> for CirTreeError {
    fn from(e: ByteReadError) -> Self {
        match e {
            ByteReadError::Truncated { expected, got } => {
                CirTreeError::TruncatedNode { expected, got }
            }
            ByteReadError::Io(e) => CirTreeError::Io(e),
        }
    }
}

impl From<CirTreeError> for BigBedReadError {
    fn from(e: CirTreeError) -> Self {
        match e {
            CirTreeError::CorruptNode(s) => BigBedReadError::CorruptNode(s),
            CirTreeError::TruncatedNode { expected, got } => {
                BigBedReadError::TruncatedNode { expected, got }
            }
            CirTreeError::Io(e) => BigBedReadError::Io(e),
        }
    }
}

impl From<BPlusTreeError> for BigBedReadError {
    fn from(e: BPlusTreeError) -> Self {
        match e {
            BPlusTreeError::KeyTooLong => BigBedReadError::KeyTooLong,
            BPlusTreeError::CorruptNode(s) => BigBedReadError::CorruptNode(s),
            BPlusTreeError::TruncatedNode { expected, got } => {
                BigBedReadError::TruncatedNode { expected, got }
            }
            BPlusTreeError::Io(e) => BigBedReadError::Io(e),
        }
    }
}

/// Errors that can occur while querying an already-open BigBed file.
#[derive(Error, Debug)]
pub enum BigBedReadError {
    #[error("lookup key is longer than the chromosome B+ tree's key size")]
    KeyTooLong,
    #[error("index node was corrupt: {0}")]
    CorruptNode(String),
    #[error("block was truncated: expected {expected} bytes, got {got}")]
    TruncatedNode { expected: usize, got: usize },
    #[error("failed to decompress block: {0}")]
    DecompressError(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
