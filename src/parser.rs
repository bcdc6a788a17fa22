//! Record Parser
//!
//! Reads headerless, `::`-separated text into typed records.
//!
//! ## Format
//!
//! - One record per line, no header row
//! - Fields separated by a literal multi-character delimiter (default `::`)
//! - Column order fixed by [`Dataset::schema`](crate::schema::Dataset::schema)
//!
//! ```text
//! 1::Toy Story (1995)::Animation|Children's|Comedy
//! ```
//!
//! ## Load policy
//!
//! - `Strict`: the first schema violation aborts the whole load
//! - `Lenient`: offending records are dropped and counted
//!
//! ## Encoding
//!
//! Lines are decoded as UTF-8 with invalid bytes replaced by U+FFFD, so
//! Latin-1 titles still load. Only real read failures are I/O errors.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{LoadPolicy, ParserConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::record::{Fields, FromFields};

/// Options for record parsing
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Literal field separator
    pub delimiter: String,
    /// What to do with records that fail their schema
    pub policy: LoadPolicy,
    /// Ignore whitespace-only lines instead of treating them as records
    pub skip_blank_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            delimiter: "::".to_string(),
            policy: LoadPolicy::Strict,
            skip_blank_lines: true,
        }
    }
}

impl ParseOptions {
    pub fn from_config(delimiter: &str, parser: &ParserConfig) -> Self {
        ParseOptions {
            delimiter: delimiter.to_string(),
            policy: parser.policy,
            skip_blank_lines: parser.skip_blank_lines,
        }
    }
}

/// Counters for one dataset load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub parsed: usize,
    pub rejected: usize,
}

/// Records of one dataset plus how the load went
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub stats: LoadStats,
}

/// Split a line on a literal separator.
///
/// The delimiter is matched as a plain substring, never as a pattern.
pub fn split_record<'a>(line: &'a str, delimiter: &str) -> Vec<&'a str> {
    line.split(delimiter).collect()
}

/// Parse every line of `reader` into `T`.
///
/// `origin` is only used to identify the source in I/O errors.
pub fn parse_records<T, R>(mut reader: R, origin: &Path, options: &ParseOptions) -> PipelineResult<Loaded<T>>
where
    T: FromFields,
    R: BufRead,
{
    let dataset = T::DATASET;
    let mut records = Vec::new();
    let mut stats = LoadStats::default();

    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| PipelineError::SourceUnavailable {
                dataset,
                path: origin.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let decoded = String::from_utf8_lossy(&buf);
        let line: &str = &decoded;
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if options.skip_blank_lines && line.trim().is_empty() {
            continue;
        }

        let values = split_record(line, &options.delimiter);
        let parsed = Fields::new(dataset, line_no, &values).and_then(|f| T::from_fields(&f));

        match parsed {
            Ok(record) => {
                records.push(record);
                stats.parsed += 1;
            }
            Err(e) if options.policy == LoadPolicy::Lenient => {
                warn!(dataset = %dataset, line = line_no, error = %e, "record_rejected");
                stats.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        dataset = %dataset,
        parsed = stats.parsed,
        rejected = stats.rejected,
        "dataset_parsed"
    );
    Ok(Loaded { records, stats })
}

/// Parse records from an in-memory string.
pub fn parse_str<T: FromFields>(text: &str, options: &ParseOptions) -> PipelineResult<Loaded<T>> {
    parse_records(Cursor::new(text), Path::new("<memory>"), options)
}

/// Open `path` and parse it as `T`'s dataset.
pub fn load_dataset<T: FromFields>(path: &Path, options: &ParseOptions) -> PipelineResult<Loaded<T>> {
    let file = File::open(path).map_err(|source| PipelineError::SourceUnavailable {
        dataset: T::DATASET,
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(BufReader::new(file), path, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MovieRecord, RatingRecord, UserRecord};
    use crate::schema::Dataset;

    fn lenient() -> ParseOptions {
        ParseOptions {
            policy: LoadPolicy::Lenient,
            ..ParseOptions::default()
        }
    }

    #[test]
    fn test_split_is_literal() {
        assert_eq!(split_record("a::b::c", "::"), vec!["a", "b", "c"]);
        // Regex metacharacters are not special
        assert_eq!(split_record("a.|b.|c", ".|"), vec!["a", "b", "c"]);
        // A single colon does not split
        assert_eq!(split_record("a:b::c", "::"), vec!["a:b", "c"]);
    }

    #[test]
    fn test_parse_movies() {
        let text = "1::Toy Story (1995)::Animation|Children's|Comedy\n\
                    2::Jumanji (1995)::Adventure|Children's|Fantasy\n";
        let loaded = parse_str::<MovieRecord>(text, &ParseOptions::default()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].movie_name, "Toy Story (1995)");
        assert_eq!(loaded.records[1].genre, "Adventure|Children's|Fantasy");
        assert_eq!(loaded.stats, LoadStats { parsed: 2, rejected: 0 });
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let text = "1::F::1::10::48067\r\n\r\n2::M::56::16::70072\r\n";
        let loaded = parse_str::<UserRecord>(text, &ParseOptions::default()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].zip_code, 70072);
    }

    #[test]
    fn test_strict_fails_whole_load() {
        let text = "1::1193::5::978300760\n1::661::three::978302109\n";
        let err = parse_str::<RatingRecord>(text, &ParseOptions::default()).unwrap_err();
        match err {
            PipelineError::SchemaViolation {
                dataset,
                line,
                field,
                ..
            } => {
                assert_eq!(dataset, Dataset::Ratings);
                assert_eq!(line, 2);
                assert_eq!(field, "rating");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_drops_bad_records() {
        let text = "1::1193::5::978300760\n1::661::three::978302109\nbroken\n2::1357::4::978298709\n";
        let loaded = parse_str::<RatingRecord>(text, &lenient()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.stats, LoadStats { parsed: 2, rejected: 2 });
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = load_dataset::<UserRecord>(
            Path::new("/definitely/not/here/users.dat"),
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SourceUnavailable {
                dataset: Dataset::Users,
                ..
            }
        ));
    }

    #[test]
    fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.dat");
        std::fs::write(&path, "3::Grumpier Old Men (1995)::Comedy|Romance\n").unwrap();
        let loaded = load_dataset::<MovieRecord>(&path, &ParseOptions::default()).unwrap();
        assert_eq!(loaded.records[0].movie_id, 3);
    }

    #[test]
    fn test_latin1_title_is_decoded_lossily() {
        let mut bytes = b"73::Mis".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"rables, Les (1995)::Drama|War\n");
        bytes.extend_from_slice(b"74::Bed of Roses (1996)::Drama|Romance\n");

        let loaded = parse_records::<MovieRecord, _>(
            Cursor::new(bytes),
            Path::new("movies.dat"),
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(loaded.stats, LoadStats { parsed: 2, rejected: 0 });
        assert_eq!(loaded.records[0].movie_name, "Mis\u{FFFD}rables, Les (1995)");
        assert_eq!(loaded.records[0].genre, "Drama|War");
    }

    #[test]
    fn test_last_line_without_newline() {
        let loaded = parse_str::<RatingRecord>("1::1193::5::978300760", &ParseOptions::default()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].timestamp, 978300760);
    }

    #[test]
    fn test_no_header_skipped() {
        // The first line is data, even if it looks like a header it must parse
        let text = "movie_id::movie_name::genre\n";
        assert!(parse_str::<MovieRecord>(text, &ParseOptions::default()).is_err());
    }
}
