use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mention::Mention;
use super::sentence::SentenceAnnotations;

/// Number of tab-separated columns in a candidate row
const CANDIDATE_COLUMNS: usize = 15;

/// Errors raised while decoding candidate rows
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected} tab-separated columns, got {got}")]
    ColumnCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: column '{column}': invalid integer '{value}'")]
    BadInt {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: column '{column}': malformed array literal")]
    BadArray { line: usize, column: &'static str },

    #[error("line {line}: invalid JSON candidate row")]
    BadJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Represents one candidate mention pair as supplied by the extraction
/// harness: two person mentions plus the annotated sentence they occur in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub p1_id: String,
    pub p1_begin: usize,
    pub p1_end: usize,
    pub p2_id: String,
    pub p2_begin: usize,
    pub p2_end: usize,
    pub doc_id: String,
    pub sentence_index: u32,
    pub sentence_text: String,
    #[serde(flatten)]
    pub sentence: SentenceAnnotations,
}

impl CandidateRow {
    /// Build the two mentions carried by this row
    pub fn mentions(&self) -> (Mention, Mention) {
        (
            Mention::new(self.p1_id.clone(), self.p1_begin, self.p1_end),
            Mention::new(self.p2_id.clone(), self.p2_begin, self.p2_end),
        )
    }

    /// Decode a tab-separated candidate row.
    ///
    /// Column order matches the harness query output: the two mention ids and
    /// spans, document id, sentence index, sentence text, then the six
    /// annotation arrays as Postgres array literals.
    pub fn from_tsv_line(line: &str, line_no: usize) -> Result<Self, ParseError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != CANDIDATE_COLUMNS {
            return Err(ParseError::ColumnCount {
                line: line_no,
                expected: CANDIDATE_COLUMNS,
                got: columns.len(),
            });
        }

        let row = Self {
            p1_id: columns[0].to_string(),
            p1_begin: parse_int(line_no, "p1_begin", columns[1])?,
            p1_end: parse_int(line_no, "p1_end", columns[2])?,
            p2_id: columns[3].to_string(),
            p2_begin: parse_int(line_no, "p2_begin", columns[4])?,
            p2_end: parse_int(line_no, "p2_end", columns[5])?,
            doc_id: columns[6].to_string(),
            sentence_index: parse_int(line_no, "sentence_index", columns[7])?,
            sentence_text: columns[8].to_string(),
            sentence: SentenceAnnotations {
                tokens: parse_text_array(line_no, "tokens", columns[9])?,
                lemmas: parse_text_array(line_no, "lemmas", columns[10])?,
                pos_tags: parse_text_array(line_no, "pos_tags", columns[11])?,
                ner_tags: parse_text_array(line_no, "ner_tags", columns[12])?,
                dep_types: parse_text_array(line_no, "dep_types", columns[13])?,
                dep_heads: parse_int_array(line_no, "dep_token_indexes", columns[14])?,
            },
        };

        if !row.sentence.is_aligned() {
            log::warn!(
                "line {}: annotation arrays disagree on token count for sentence {}_{}",
                line_no,
                row.doc_id,
                row.sentence_index
            );
        }

        Ok(row)
    }

    /// Decode a JSON candidate row (one object per line)
    pub fn from_json_line(line: &str, line_no: usize) -> Result<Self, ParseError> {
        serde_json::from_str(line).map_err(|source| ParseError::BadJson {
            line: line_no,
            source,
        })
    }
}

fn parse_int<T: std::str::FromStr>(
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::BadInt {
        line,
        column,
        value: value.to_string(),
    })
}

fn parse_text_array(
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<Vec<String>, ParseError> {
    parse_pg_array(value).ok_or(ParseError::BadArray { line, column })
}

fn parse_int_array(
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<Vec<i64>, ParseError> {
    let elements = parse_pg_array(value).ok_or(ParseError::BadArray { line, column })?;
    elements
        .iter()
        .map(|e| parse_int(line, column, e))
        .collect()
}

/// Decodes a Postgres array literal (`{a,b,"c d"}`) into its elements.
///
/// Quoted elements may contain commas, braces and backslash escapes. An
/// unquoted NULL element decodes as an empty string. Returns None when the
/// literal is not well formed.
fn parse_pg_array(literal: &str) -> Option<Vec<String>> {
    let body = literal.strip_prefix('{')?.strip_suffix('}')?;
    if body.is_empty() {
        return Some(Vec::new());
    }

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '\\' => current.push(chars.next()?),
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    quoted = true;
                }
                ',' => finish_element(&mut elements, &mut current, &mut quoted),
                _ => current.push(c),
            }
        }
    }

    if in_quotes {
        return None;
    }
    finish_element(&mut elements, &mut current, &mut quoted);
    Some(elements)
}

fn finish_element(elements: &mut Vec<String>, current: &mut String, quoted: &mut bool) {
    let value = std::mem::take(current);
    // an unquoted NULL stands in for a missing token annotation
    if !*quoted && value == "NULL" {
        elements.push(String::new());
    } else {
        elements.push(value);
    }
    *quoted = false;
}

/// Open a file for buffered line reading, transparently decompressing gzip.
///
/// Detection is by magic bytes, not file extension.
pub fn open_maybe_gzip(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let is_gzip = {
        let buf = reader.fill_buf()?;
        buf.len() >= 2 && buf[0] == 0x1f && buf[1] == 0x8b
    };

    if is_gzip {
        // reopen so the decoder sees the stream from the start
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pg_array_simple() {
        assert_eq!(
            parse_pg_array("{John,Smith,works}"),
            Some(strings(&["John", "Smith", "works"]))
        );
    }

    #[test]
    fn test_pg_array_empty() {
        assert_eq!(parse_pg_array("{}"), Some(Vec::new()));
    }

    #[test]
    fn test_pg_array_quoted_elements() {
        assert_eq!(
            parse_pg_array(r#"{"St. Louis","a,b",plain}"#),
            Some(strings(&["St. Louis", "a,b", "plain"]))
        );
    }

    #[test]
    fn test_pg_array_escaped_quote() {
        assert_eq!(
            parse_pg_array(r#"{"he said \"hi\""}"#),
            Some(strings(&[r#"he said "hi""#]))
        );
    }

    #[test]
    fn test_pg_array_null_element() {
        // unquoted NULL decodes as empty; a quoted "NULL" is a real token
        assert_eq!(
            parse_pg_array(r#"{a,NULL,"NULL"}"#),
            Some(strings(&["a", "", "NULL"]))
        );
    }

    #[test]
    fn test_pg_array_malformed() {
        assert_eq!(parse_pg_array("a,b,c"), None);
        assert_eq!(parse_pg_array(r#"{"unterminated}"#), None);
    }

    fn sample_tsv_line() -> String {
        [
            "doc1_1_0_0",
            "0",
            "0",
            "doc1_1_4_4",
            "4",
            "4",
            "doc1",
            "1",
            "Smith is the boss of Jones",
            "{Smith,is,the,boss,of,Jones}",
            "{Smith,be,the,boss,of,Jones}",
            "{NNP,VBZ,DT,NN,IN,NNP}",
            "{PERSON,O,O,O,O,PERSON}",
            "{nsubj,cop,det,root,case,nmod}",
            "{3,3,3,0,5,3}",
        ]
        .join("\t")
    }

    #[test]
    fn test_tsv_row_decodes() {
        let row = CandidateRow::from_tsv_line(&sample_tsv_line(), 1).unwrap();
        assert_eq!(row.p1_id, "doc1_1_0_0");
        assert_eq!((row.p1_begin, row.p1_end), (0, 0));
        assert_eq!((row.p2_begin, row.p2_end), (4, 4));
        assert_eq!(row.doc_id, "doc1");
        assert_eq!(row.sentence_index, 1);
        assert_eq!(row.sentence.lemmas[3], "boss");
        assert_eq!(row.sentence.ner_tags[0], "PERSON");
        assert_eq!(row.sentence.dep_heads, vec![3, 3, 3, 0, 5, 3]);
        assert!(row.sentence.is_aligned());
    }

    #[test]
    fn test_tsv_row_column_count() {
        let err = CandidateRow::from_tsv_line("only\tthree\tcolumns", 7).unwrap_err();
        match err {
            ParseError::ColumnCount { line, got, .. } => {
                assert_eq!(line, 7);
                assert_eq!(got, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tsv_row_bad_int() {
        let line = sample_tsv_line().replace("doc1_1_0_0\t0\t0", "doc1_1_0_0\tzero\t0");
        let err = CandidateRow::from_tsv_line(&line, 2).unwrap_err();
        match err {
            ParseError::BadInt { column, value, .. } => {
                assert_eq!(column, "p1_begin");
                assert_eq!(value, "zero");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_row_decodes_with_defaults() {
        // pos/dep arrays are optional in the JSON encoding
        let line = r#"{
            "p1_id": "a", "p1_begin": 0, "p1_end": 0,
            "p2_id": "b", "p2_begin": 2, "p2_end": 2,
            "doc_id": "d", "sentence_index": 0, "sentence_text": "x and y",
            "lemmas": ["x", "and", "y"],
            "ner_tags": ["PERSON", "O", "PERSON"]
        }"#
        .replace('\n', " ");
        let row = CandidateRow::from_json_line(&line, 1).unwrap();
        assert_eq!(row.sentence.lemmas, strings(&["x", "and", "y"]));
        assert!(row.sentence.tokens.is_empty());
        assert!(row.sentence.dep_heads.is_empty());
    }

    #[test]
    fn test_json_row_malformed() {
        let err = CandidateRow::from_json_line("not json", 3).unwrap_err();
        assert!(matches!(err, ParseError::BadJson { line: 3, .. }));
    }

    #[test]
    fn test_open_maybe_gzip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("rows.tsv");
        std::fs::write(&plain, "hello\nworld\n").unwrap();
        let lines: Vec<String> = open_maybe_gzip(&plain)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, strings(&["hello", "world"]));

        let gzipped = dir.path().join("rows.tsv.gz");
        let file = File::create(&gzipped).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"hello\nworld\n").unwrap();
        encoder.finish().unwrap();
        let lines: Vec<String> = open_maybe_gzip(&gzipped)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, strings(&["hello", "world"]));
    }
}
