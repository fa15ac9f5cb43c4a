//! The sequence source (C8): a lazy reader over FASTA-style records, tolerant
//! of mixed-case nucleotide characters. Used both to build the scaffold
//! length index (C1) and to emit group-tagged scaffold output.

use std::io::{BufRead, BufReader, Read};

use crate::errors::{ArcsError, Result};

/// One sequence record: identifier, optional header comment, and the
/// (upper-cased) sequence itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub comment: Option<String>,
    pub seq: String,
}

/// Streams `SeqRecord`s out of a FASTA-formatted reader.
pub struct FastaRecords<R> {
    lines: std::io::Lines<BufReader<R>>,
    pending_header: Option<String>,
}

impl<R: Read> FastaRecords<R> {
    pub fn new(reader: R) -> Self {
        FastaRecords {
            lines: BufReader::new(reader).lines(),
            pending_header: None,
        }
    }

    fn split_header(line: &str) -> (String, Option<String>) {
        let body = &line[1..];
        match body.split_once(char::is_whitespace) {
            Some((id, comment)) => {
                let comment = comment.trim();
                (
                    id.to_string(),
                    if comment.is_empty() {
                        None
                    } else {
                        Some(comment.to_string())
                    },
                )
            }
            None => (body.to_string(), None),
        }
    }
}

impl<R: Read> Iterator for FastaRecords<R> {
    type Item = Result<SeqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut header = self.pending_header.take().or_else(|| loop {
            match self.lines.next()? {
                Ok(line) => {
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(stripped) = line.strip_prefix('>') {
                        break Some(format!(">{stripped}"));
                    }
                    // non-header, non-blank line before any '>': skip, tolerant of junk.
                    continue;
                }
                Err(_) => break None,
            }
        })?;
        if !header.starts_with('>') {
            header = format!(">{header}");
        }
        let (id, comment) = Self::split_header(&header);

        let mut seq = String::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    let line = line.trim_end();
                    if line.starts_with('>') {
                        self.pending_header = Some(line.to_string());
                        break;
                    }
                    seq.push_str(&line.to_uppercase());
                }
                Some(Err(e)) => return Some(Err(ArcsError::InputParse {
                    path: std::path::PathBuf::new(),
                    what: "sequence source",
                    detail: e.to_string(),
                })),
                None => break,
            }
        }

        Some(Ok(SeqRecord { id, comment, seq }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_single_record_uppercased() {
        let data = b">scaf1 some comment\nacgtACGT\nacgt\n";
        let mut it = FastaRecords::new(Cursor::new(&data[..]));
        let rec = it.next().unwrap().unwrap();
        assert_eq!(rec.id, "scaf1");
        assert_eq!(rec.comment.as_deref(), Some("some comment"));
        assert_eq!(rec.seq, "ACGTACGTACGT");
        assert!(it.next().is_none());
    }

    #[test]
    fn reads_multiple_records_and_tolerates_blank_lines() {
        let data = b">a\nACGT\n\n>b comment here\nTTTT\nGGGG\n";
        let mut it = FastaRecords::new(Cursor::new(&data[..]));
        let a = it.next().unwrap().unwrap();
        assert_eq!(a.id, "a");
        assert_eq!(a.seq, "ACGT");
        let b = it.next().unwrap().unwrap();
        assert_eq!(b.id, "b");
        assert_eq!(b.seq, "TTTTGGGG");
        assert!(it.next().is_none());
    }
}
