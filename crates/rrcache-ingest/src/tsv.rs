// SPDX-License-Identifier: Apache-2.0

use flate2::read::GzDecoder;
use rrcache_core::ErrorCode;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::IngestError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Where the column names of a table come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// No header; `#` lines are comments.
    None,
    /// The first non-empty line names the columns, even when it starts with `#`.
    FirstLine,
    /// The last `#` line before the first data row names the columns.
    LastComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    /// Runs of spaces or tabs.
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl TsvRow {
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Value of a looked-up column; `None` when the column or the field is absent.
    #[must_use]
    pub fn field(&self, column: Option<usize>) -> Option<&str> {
        column.and_then(|i| self.get(i))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsvTable {
    header: Vec<String>,
    header_line: usize,
    rows: Vec<TsvRow>,
}

fn split_line(line: &str, delimiter: Delimiter) -> Vec<String> {
    match delimiter {
        Delimiter::Tab => line.split('\t').map(str::to_string).collect(),
        Delimiter::Whitespace => line.split_whitespace().map(str::to_string).collect(),
    }
}

fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('#').trim().to_string()
}

impl TsvTable {
    #[must_use]
    pub fn parse_str(text: &str, header: HeaderMode) -> Self {
        Self::parse_with(text, header, Delimiter::Tab)
    }

    #[must_use]
    pub fn parse_with(text: &str, header: HeaderMode, delimiter: Delimiter) -> Self {
        let mut table = Self::default();
        let mut pending_header = header == HeaderMode::FirstLine;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if pending_header {
                table.header = split_line(line, delimiter)
                    .iter()
                    .map(|h| normalize_header(h))
                    .collect();
                table.header_line = line_no;
                pending_header = false;
                continue;
            }
            if line.starts_with('#') {
                if header == HeaderMode::LastComment && table.rows.is_empty() {
                    table.header = split_line(line, delimiter)
                        .iter()
                        .map(|h| normalize_header(h))
                        .collect();
                    table.header_line = line_no;
                }
                continue;
            }
            table.rows.push(TsvRow {
                line: line_no,
                fields: split_line(line, delimiter),
            });
        }
        table
    }

    /// Reads a table from disk; gzip input is recognised by its magic bytes.
    pub fn read(path: &Path, header: HeaderMode) -> Result<Self, IngestError> {
        Self::read_with(path, header, Delimiter::Tab)
    }

    pub fn read_with(path: &Path, header: HeaderMode, delimiter: Delimiter) -> Result<Self, IngestError> {
        let raw = fs::read(path).map_err(|e| {
            IngestError::new(ErrorCode::Io, format!("cannot read {}: {e}", path.display()))
        })?;
        let text = if raw.starts_with(&GZIP_MAGIC) {
            let mut out = String::new();
            GzDecoder::new(raw.as_slice())
                .read_to_string(&mut out)
                .map_err(|e| {
                    IngestError::new(
                        ErrorCode::Decode,
                        format!("cannot decompress {}: {e}", path.display()),
                    )
                })?;
            out
        } else {
            String::from_utf8(raw).map_err(|e| {
                IngestError::new(
                    ErrorCode::Decode,
                    format!("{} is not UTF-8: {e}", path.display()),
                )
            })?
        };
        Ok(Self::parse_with(&text, header, delimiter))
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Line the header was read from, 0 when there is none.
    #[must_use]
    pub fn header_line(&self) -> usize {
        self.header_line
    }

    /// Case-insensitive column lookup.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn rows(&self) -> &[TsvRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Delimiter, HeaderMode, TsvTable};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    const CHEM_PROP: &str = "### MNXref Version 4.4\n#ID\tname\tformula\n#ID\tname\tInChI\tSMILES\nMNXM1\tH(+)\tInChI=1S/p+1\t[H+]\n\nMNXM2\tH2O\tInChI=1S/H2O/h1H2\tO\n";

    #[test]
    fn last_comment_line_names_the_columns() {
        let table = TsvTable::parse_str(CHEM_PROP, HeaderMode::LastComment);
        assert_eq!(table.header(), ["ID", "name", "InChI", "SMILES"]);
        assert_eq!(table.header_line(), 3);
        assert_eq!(table.column("inchi"), Some(2));
        assert_eq!(table.column("smiles"), Some(3));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].line, 6);
        assert_eq!(table.rows()[1].get(3), Some("O"));
    }

    #[test]
    fn first_line_header_strips_hash_prefix() {
        let table = TsvTable::parse_str(
            "# Rule_ID\tReaction_ID\nRR-01\tMNXR10\r\n",
            HeaderMode::FirstLine,
        );
        assert_eq!(table.column("rule_id"), Some(0));
        assert_eq!(table.rows()[0].get(1), Some("MNXR10"));
    }

    #[test]
    fn headerless_tables_skip_comments() {
        let table = TsvTable::parse_with(
            "# target source\nMNXM4  MNXM2\nMNXM5 R_group\n",
            HeaderMode::None,
            Delimiter::Whitespace,
        );
        assert!(table.header().is_empty());
        assert_eq!(table.rows()[0].fields, ["MNXM4", "MNXM2"]);
        assert_eq!(table.rows()[1].line, 3);
    }

    #[test]
    fn gzip_input_is_detected_by_magic_bytes() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("chem_prop.tsv");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(CHEM_PROP.as_bytes()).expect("gzip");
        std::fs::write(&path, enc.finish().expect("finish")).expect("write");
        let table = TsvTable::read(&path, HeaderMode::LastComment).expect("read");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let tmp = tempdir().expect("tempdir");
        let err = TsvTable::read(&tmp.path().join("absent.tsv"), HeaderMode::None)
            .expect_err("absent");
        assert_eq!(err.code, rrcache_core::ErrorCode::Io);
    }
}
