//! Content digests and single-pass hashing I/O.
//!
//! The store supports exactly one digest algorithm (BLAKE3). Incoming
//! candidates may carry a digest from another algorithm; those are simply not
//! comparable and are ignored by the reconciliation policy, while an explicit
//! *request* for an unsupported algorithm is an error
//! ([`CacheError::UnsupportedDigest`]).
//!
//! [`HashingWriter`] computes the digest of exactly the bytes it writes, in
//! the same pass as the write itself. Reconciliation relies on this: the
//! stored hash always describes the content file on disk, never a separate
//! read of it.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Digest algorithms this crate knows how to name.
///
/// Only [`DigestKind::Blake3`] is supported by the store; `Md5` exists so the
/// capability check has something concrete to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    Blake3,
    Md5,
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => f.write_str("blake3"),
            Self::Md5 => f.write_str("md5"),
        }
    }
}

/// The single digest algorithm the store computes and compares.
pub const SUPPORTED_DIGEST: DigestKind = DigestKind::Blake3;

/// Fail with [`CacheError::UnsupportedDigest`] unless `kind` is the supported
/// algorithm.
pub fn ensure_supported(kind: DigestKind) -> CacheResult<()> {
    if kind == SUPPORTED_DIGEST {
        Ok(())
    } else {
        Err(CacheError::UnsupportedDigest(kind))
    }
}

/// A content digest tagged with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub kind: DigestKind,
    /// Lowercase hex encoding of the digest bytes.
    pub hex: String,
}

impl Digest {
    /// Construct a BLAKE3 digest from its hex form.
    #[must_use]
    pub fn blake3(hex: impl Into<String>) -> Self {
        Self {
            kind: DigestKind::Blake3,
            hex: hex.into(),
        }
    }

    /// Compute the supported digest of an in-memory buffer.
    ///
    /// Mostly useful for tests and for callers that already hold the bytes;
    /// the write path uses [`HashingWriter`] instead.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::blake3(blake3::hash(bytes).to_hex().to_string())
    }
}

/// Writer adapter that hashes every byte it forwards to the inner writer.
///
/// The digest is derived from exactly the bytes accepted by the inner writer,
/// so a short write never poisons the hash.
pub struct HashingWriter<W: Write> {
    inner: W,
    hasher: blake3::Hasher,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
            written: 0,
        }
    }

    /// Consume the writer, returning the inner writer, the digest of all
    /// bytes written, and the byte count.
    pub fn finalize(self) -> (W, Digest, u64) {
        let digest = Digest::blake3(self.hasher.finalize().to_hex().to_string());
        (self.inner, digest, self.written)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
