//! Little-endian primitives and the shared file header.
//!
//! Arrays are read through a bounded byte buffer, so a corrupt length can
//! never make a reader allocate more than the caller expected.

use std::io::{Read, Write};

use crate::error::CacheError;

/// Elements decoded per buffered read.
const CHUNK_ELEMS: usize = 4096;

// ── Primitive writers ───────────────────────────────────────────

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CacheError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a slice of little-endian u32.
pub fn write_u32_slice(w: &mut dyn Write, values: &[u32]) -> Result<(), CacheError> {
    for chunk in values.chunks(CHUNK_ELEMS) {
        let bytes: Vec<u8> = chunk.iter().flat_map(|v| v.to_le_bytes()).collect();
        w.write_all(&bytes)?;
    }
    Ok(())
}

/// Write a slice of little-endian f32.
pub fn write_f32_slice(w: &mut dyn Write, values: &[f32]) -> Result<(), CacheError> {
    for chunk in values.chunks(CHUNK_ELEMS) {
        let bytes: Vec<u8> = chunk.iter().flat_map(|v| v.to_le_bytes()).collect();
        w.write_all(&bytes)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, CacheError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read `len` little-endian u32 values.
pub fn read_u32_vec(r: &mut dyn Read, len: usize) -> Result<Vec<u32>, CacheError> {
    read_words(r, len, u32::from_le_bytes)
}

/// Read `len` little-endian f32 values.
pub fn read_f32_vec(r: &mut dyn Read, len: usize) -> Result<Vec<f32>, CacheError> {
    read_words(r, len, f32::from_le_bytes)
}

fn read_words<T>(
    r: &mut dyn Read,
    len: usize,
    decode: fn([u8; 4]) -> T,
) -> Result<Vec<T>, CacheError> {
    let mut out = Vec::with_capacity(len.min(CHUNK_ELEMS));
    let mut buf = vec![0u8; len.min(CHUNK_ELEMS) * 4];
    let mut remaining = len;
    while remaining > 0 {
        let take = remaining.min(CHUNK_ELEMS);
        let bytes = &mut buf[..take * 4];
        r.read_exact(bytes)?;
        out.extend(
            bytes
                .chunks_exact(4)
                .map(|c| decode([c[0], c[1], c[2], c[3]])),
        );
        remaining -= take;
    }
    Ok(out)
}

/// Fail unless the reader is exhausted.
pub fn expect_end(r: &mut dyn Read) -> Result<(), CacheError> {
    let mut byte = [0u8; 1];
    match r.read(&mut byte)? {
        0 => Ok(()),
        _ => Err(CacheError::TrailingData),
    }
}

// ── Header ──────────────────────────────────────────────────────

/// Leading fields shared by graph and table files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    /// Checksum of the map the file was computed for.
    pub checksum: u32,
    /// Leaf count of that map.
    pub num_leafs: u32,
    /// Length of the variable-size section (list words or table entries).
    pub section_len: u32,
}

impl FileHeader {
    /// Encode the header.
    pub fn encode(&self, w: &mut dyn Write) -> Result<(), CacheError> {
        write_u32_le(w, self.checksum)?;
        write_u32_le(w, self.num_leafs)?;
        write_u32_le(w, self.section_len)
    }

    /// Decode a header.
    pub fn decode(r: &mut dyn Read) -> Result<Self, CacheError> {
        Ok(Self {
            checksum: read_u32_le(r)?,
            num_leafs: read_u32_le(r)?,
            section_len: read_u32_le(r)?,
        })
    }

    /// Check that the file belongs to a map with `checksum` and `num_leafs`.
    ///
    /// The leaf count is checked first: it bounds every later allocation.
    pub fn check(&self, checksum: u32, num_leafs: u32) -> Result<(), CacheError> {
        if self.num_leafs != num_leafs {
            return Err(CacheError::LeafCountMismatch {
                expected: num_leafs,
                found: self.num_leafs,
            });
        }
        if self.checksum != checksum {
            return Err(CacheError::ChecksumMismatch {
                expected: checksum,
                found: self.checksum,
            });
        }
        Ok(())
    }
}
