//! Fixed-layout binary encoding (`.pdbb`)
//!
//! All integers and floats are **little-endian**, records are packed without
//! padding, and species codes are exactly four raw bytes:
//!
//! | Field            | Layout                                                   |
//! |------------------|----------------------------------------------------------|
//! | version          | `i32` length, then that many UTF-8 bytes (no terminator) |
//! | timestep         | `i32`                                                    |
//! | tree count       | `i32`                                                    |
//! | tree record      | 32 bytes: `i32 id`, `[u8; 4] code`, `i32 x`, `i32 y`, `f32 height`, `f32 radius`, `f32 dbh`, `i32 unused` |
//! | cohort count     | `i32`                                                    |
//! | cohort record    | 24 bytes: `i32 xs`, `i32 ys`, `[u8; 4] code`, `f32 dbh`, `f32 height`, `f32 nplants` |
//!
//! Tree coordinates are stored as integers; writing a fractional coordinate
//! truncates it toward zero.

use super::r#trait::{CohortRecord, RecordReader, RecordWriter, Section, TreeRecord};
use crate::core_types::species::{code_from_bytes, code_to_bytes, SPECIES_CODE_LEN};
use crate::error::ImportError;
use std::io::{ErrorKind, Read, Write};
use tracing::warn;

/// Size in bytes of one encoded tree record
pub const TREE_RECORD_SIZE: usize = 32;

/// Size in bytes of one encoded cohort record
pub const COHORT_RECORD_SIZE: usize = 24;

/// Longest version string accepted when reading
pub const MAX_VERSION_LEN: usize = 256;

fn i32_at(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn f32_at(buf: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn code_at(buf: &[u8], offset: usize) -> Result<String, ImportError> {
    code_from_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Binary-format [`RecordReader`]
#[derive(Debug)]
pub struct BinaryRecordReader<R> {
    inner: R,
}

impl<R: Read> BinaryRecordReader<R> {
    /// Wrap a reader positioned at the start of a binary file
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), ImportError> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ImportError::UnexpectedEof { what },
            _ => ImportError::Stream(e),
        })
    }

    fn read_i32(&mut self, what: &'static str) -> Result<i32, ImportError> {
        let mut buf = [0_u8; 4];
        self.read_exact(&mut buf, what)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Fill `buf` as far as the input allows, returning the bytes read
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, ImportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(ImportError::Stream(e)),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> RecordReader for BinaryRecordReader<R> {
    fn read_version(&mut self) -> Result<String, ImportError> {
        let len = self.read_i32("version length")?;
        let len = usize::try_from(len)
            .ok()
            .filter(|&l| l <= MAX_VERSION_LEN)
            .ok_or_else(|| ImportError::parse("version length", len.to_string()))?;

        let mut buf = vec![0_u8; len];
        self.read_exact(&mut buf, "version")?;
        String::from_utf8(buf)
            .map_err(|e| ImportError::parse("version", String::from_utf8_lossy(e.as_bytes())))
    }

    fn read_timestep(&mut self) -> Result<i32, ImportError> {
        self.read_i32("timestep")
    }

    fn read_count(&mut self, section: Section) -> Result<usize, ImportError> {
        let what = section.count_name();
        let count = self.read_i32(what)?;
        usize::try_from(count).map_err(|_| ImportError::parse(what, count.to_string()))
    }

    fn read_tree(&mut self) -> Result<TreeRecord, ImportError> {
        let mut buf = [0_u8; TREE_RECORD_SIZE];
        self.read_exact(&mut buf, "tree record")?;

        Ok(TreeRecord {
            id: i32_at(&buf, 0),
            code: code_at(&buf, 4)?,
            x: i32_at(&buf, 8) as f32,
            y: i32_at(&buf, 12) as f32,
            height: f32_at(&buf, 16),
            radius: f32_at(&buf, 20),
            dbh: f32_at(&buf, 24),
            unused: i32_at(&buf, 28),
        })
    }

    fn read_cohort(&mut self) -> Result<Option<CohortRecord>, ImportError> {
        let mut buf = [0_u8; COHORT_RECORD_SIZE];
        let filled = self.fill(&mut buf)?;
        if filled < COHORT_RECORD_SIZE {
            if filled > 0 {
                warn!(
                    "Discarding partial cohort record of {} bytes (expected {})",
                    filled, COHORT_RECORD_SIZE
                );
            }
            return Ok(None);
        }

        Ok(Some(CohortRecord {
            xs: i32_at(&buf, 0),
            ys: i32_at(&buf, 4),
            code: code_at(&buf, 8)?,
            dbh: f32_at(&buf, 12),
            height: f32_at(&buf, 16),
            nplants: f32_at(&buf, 20),
        }))
    }
}

/// Binary-format [`RecordWriter`]
#[derive(Debug)]
pub struct BinaryRecordWriter<W> {
    inner: W,
}

impl<W: Write> BinaryRecordWriter<W> {
    /// Wrap a writer; output is written as-is, so pass a `BufWriter` for files
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Recover the wrapped writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_len(&mut self, len: usize, what: &'static str) -> Result<(), ImportError> {
        let len = i32::try_from(len).map_err(|_| ImportError::parse(what, len.to_string()))?;
        self.inner.write_all(&len.to_le_bytes())?;
        Ok(())
    }
}

fn put(buf: &mut [u8], offset: usize, bytes: [u8; 4]) {
    buf[offset..offset + 4].copy_from_slice(&bytes);
}

impl<W: Write> RecordWriter for BinaryRecordWriter<W> {
    fn write_header(&mut self, version: &str, timestep: i32) -> Result<(), ImportError> {
        if version.len() > MAX_VERSION_LEN {
            return Err(ImportError::parse("version", version));
        }
        self.write_len(version.len(), "version length")?;
        self.inner.write_all(version.as_bytes())?;
        self.inner.write_all(&timestep.to_le_bytes())?;
        Ok(())
    }

    fn write_count(&mut self, section: Section, count: usize) -> Result<(), ImportError> {
        self.write_len(count, section.count_name())
    }

    fn write_tree(&mut self, r: &TreeRecord) -> Result<(), ImportError> {
        let code: [u8; SPECIES_CODE_LEN] = code_to_bytes(&r.code)?;
        let mut buf = [0_u8; TREE_RECORD_SIZE];
        put(&mut buf, 0, r.id.to_le_bytes());
        put(&mut buf, 4, code);
        put(&mut buf, 8, (r.x as i32).to_le_bytes());
        put(&mut buf, 12, (r.y as i32).to_le_bytes());
        put(&mut buf, 16, r.height.to_le_bytes());
        put(&mut buf, 20, r.radius.to_le_bytes());
        put(&mut buf, 24, r.dbh.to_le_bytes());
        put(&mut buf, 28, r.unused.to_le_bytes());
        self.inner.write_all(&buf)?;
        Ok(())
    }

    fn write_cohort(&mut self, r: &CohortRecord) -> Result<(), ImportError> {
        let code: [u8; SPECIES_CODE_LEN] = code_to_bytes(&r.code)?;
        let mut buf = [0_u8; COHORT_RECORD_SIZE];
        put(&mut buf, 0, r.xs.to_le_bytes());
        put(&mut buf, 4, r.ys.to_le_bytes());
        put(&mut buf, 8, code);
        put(&mut buf, 12, r.dbh.to_le_bytes());
        put(&mut buf, 16, r.height.to_le_bytes());
        put(&mut buf, 20, r.nplants.to_le_bytes());
        self.inner.write_all(&buf)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ImportError> {
        self.inner.flush()?;
        Ok(())
    }
}
