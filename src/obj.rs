//! LC-3 object image format.
//!
//! An object image is a flat big-endian byte stream:
//! - The first word is the origin, the address the image loads at
//! - Every following word is stored at consecutive addresses from there

use crate::cpu::memory::MEMORY_SIZE;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// A parsed object image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjImage {
    origin: u16,
    words: Vec<u16>,
}

impl ObjImage {
    /// Create an image, checking that it fits between `origin` and 0xFFFF.
    pub fn new(origin: u16, words: Vec<u16>) -> Result<Self, LoadError> {
        if origin as usize + words.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge {
                origin,
                len: words.len(),
            });
        }
        Ok(Self { origin, words })
    }

    /// Parse an image from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < 2 {
            return Err(LoadError::Truncated(bytes.len()));
        }
        if bytes.len() % 2 != 0 {
            return Err(LoadError::OddLength(bytes.len()));
        }

        let mut words = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

        // Length checked above, so there is always an origin word.
        let origin = words.next().unwrap_or_default();
        Self::new(origin, words.collect())
    }

    /// Read and parse an image from a stream until it ends.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Load address of the first word.
    pub fn origin(&self) -> u16 {
        self.origin
    }

    /// Program words, in load order.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Get the number of program words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the image carries no program words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Load an object image from disk.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<ObjImage, LoadError> {
    let file = std::fs::File::open(path.as_ref())?;
    ObjImage::from_reader(std::io::BufReader::new(file))
}

/// Errors that can occur while loading an object image.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image is {0} bytes, too short to hold an origin word")]
    Truncated(usize),

    #[error("image is {0} bytes, not a whole number of words")]
    OddLength(usize),

    #[error("image of {len} words at {origin:#06x} runs past 0xFFFF")]
    TooLarge { origin: u16, len: usize },
}
