//! Line-oriented text encoding
//!
//! ```text
//! 2.0                                   version
//! 12                                    timestep
//! 2                                     tree count N
//! 1 PIAB 10 20 25.5 3.1 0.42 0          id code x y height radius dbh unused
//! 2 FASY 40 12 18.0 2.5 0.31 0
//! 1                                     cohort count M
//! 3 5 ABAL 0.02 1.4 37.5                xs ys code dbh height nplants
//! ```

use super::r#trait::{CohortRecord, RecordReader, RecordWriter, Section, TreeRecord};
use crate::error::ImportError;
use std::io::{BufRead, Write};
use std::str::{FromStr, SplitWhitespace};

/// Text-format [`RecordReader`]
#[derive(Debug)]
pub struct TextRecordReader<R> {
    inner: R,
    line: String,
}

impl<R: BufRead> TextRecordReader<R> {
    /// Wrap a buffered reader positioned at the start of a text file
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }

    /// Advance to the next line; `false` at end of input
    fn next_line(&mut self) -> Result<bool, ImportError> {
        self.line.clear();
        let n = self.inner.read_line(&mut self.line)?;
        Ok(n > 0)
    }

    fn require_line(&mut self, what: &'static str) -> Result<&str, ImportError> {
        if self.next_line()? {
            Ok(self.line.trim())
        } else {
            Err(ImportError::UnexpectedEof { what })
        }
    }
}

fn field<T: FromStr>(tokens: &mut SplitWhitespace<'_>, what: &'static str) -> Result<T, ImportError> {
    let token = tokens.next().ok_or(ImportError::Parse {
        what,
        token: String::new(),
    })?;
    token.parse().map_err(|_| ImportError::parse(what, token))
}

impl<R: BufRead> RecordReader for TextRecordReader<R> {
    fn read_version(&mut self) -> Result<String, ImportError> {
        Ok(self.require_line("version")?.to_string())
    }

    fn read_timestep(&mut self) -> Result<i32, ImportError> {
        let line = self.require_line("timestep")?;
        line.parse().map_err(|_| ImportError::parse("timestep", line))
    }

    fn read_count(&mut self, section: Section) -> Result<usize, ImportError> {
        let what = section.count_name();
        let line = self.require_line(what)?;
        line.parse().map_err(|_| ImportError::parse(what, line))
    }

    fn read_tree(&mut self) -> Result<TreeRecord, ImportError> {
        let line = self.require_line("tree record")?;
        let mut tokens = line.split_whitespace();

        let record = TreeRecord {
            id: field(&mut tokens, "tree id")?,
            code: field(&mut tokens, "tree species code")?,
            x: field(&mut tokens, "tree x")?,
            y: field(&mut tokens, "tree y")?,
            height: field(&mut tokens, "tree height")?,
            radius: field(&mut tokens, "tree radius")?,
            dbh: field(&mut tokens, "tree dbh")?,
            // Trailing field is not interpreted; tolerate it being absent
            unused: tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0),
        };
        Ok(record)
    }

    fn read_cohort(&mut self) -> Result<Option<CohortRecord>, ImportError> {
        if !self.next_line()? {
            return Ok(None);
        }
        let line = self.line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let mut tokens = line.split_whitespace();

        let record = CohortRecord {
            xs: field(&mut tokens, "cohort xs")?,
            ys: field(&mut tokens, "cohort ys")?,
            code: field(&mut tokens, "cohort species code")?,
            dbh: field(&mut tokens, "cohort dbh")?,
            height: field(&mut tokens, "cohort height")?,
            nplants: field(&mut tokens, "cohort nplants")?,
        };
        Ok(Some(record))
    }
}

/// Text-format [`RecordWriter`]
#[derive(Debug)]
pub struct TextRecordWriter<W> {
    inner: W,
}

impl<W: Write> TextRecordWriter<W> {
    /// Wrap a writer; output is written as-is, so pass a `BufWriter` for files
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Recover the wrapped writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RecordWriter for TextRecordWriter<W> {
    fn write_header(&mut self, version: &str, timestep: i32) -> Result<(), ImportError> {
        writeln!(self.inner, "{version}")?;
        writeln!(self.inner, "{timestep}")?;
        Ok(())
    }

    fn write_count(&mut self, _section: Section, count: usize) -> Result<(), ImportError> {
        writeln!(self.inner, "{count}")?;
        Ok(())
    }

    fn write_tree(&mut self, r: &TreeRecord) -> Result<(), ImportError> {
        writeln!(
            self.inner,
            "{} {} {} {} {} {} {} {}",
            r.id, r.code, r.x, r.y, r.height, r.radius, r.dbh, r.unused
        )?;
        Ok(())
    }

    fn write_cohort(&mut self, r: &CohortRecord) -> Result<(), ImportError> {
        writeln!(
            self.inner,
            "{} {} {} {} {} {}",
            r.xs, r.ys, r.code, r.dbh, r.height, r.nplants
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ImportError> {
        self.inner.flush()?;
        Ok(())
    }
}
