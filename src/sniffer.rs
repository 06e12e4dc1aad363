use memchr::memchr;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::reader::ReaderBuilder;

/// The dialect estimated from a sample: the field delimiter and whether
/// the first row looks like a header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dialect {
    /// The estimated field delimiter.
    pub delimiter: u8,
    /// True if the first row looks like column names rather than data.
    pub has_header: bool,
}

/// Delimiter candidates, in tie-break order.
const CANDIDATES: &[u8] = b",\t;|";

/// Estimate the dialect of a CSV sample.
///
/// Delimiters are scored by occurrence count outside quoted regions, with
/// a 10x bonus when every non-empty line agrees on the count; ties break
/// on candidate order and `,` is the fallback. Header detection needs at
/// least two non-empty lines and classifies the first line's fields as
/// name-like or data-like.
pub fn sniff(sample: &[u8]) -> Dialect {
    let lines: Vec<&[u8]> = sample
        .split(|&b| b == b'\n')
        .map(|line| match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        })
        .filter(|line| !line.is_empty())
        .collect();
    let delimiter = detect_delimiter(&lines);
    let has_header = detect_header(&lines, delimiter);
    Dialect { delimiter, has_header }
}

fn detect_delimiter(lines: &[&[u8]]) -> u8 {
    let mut best = b',';
    let mut best_score = 0u64;
    for &candidate in CANDIDATES {
        let counts: Vec<u64> =
            lines.iter().map(|line| count_unquoted(line, candidate)).collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            continue;
        }
        let consistent =
            counts.iter().all(|&c| c == counts[0]) && counts[0] > 0;
        let score = if consistent { total * 10 } else { total };
        // Strictly greater keeps the declared order on ties.
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }
    best
}

/// Occurrences of `byte` in `line`, ignoring quoted stretches.
fn count_unquoted(line: &[u8], byte: u8) -> u64 {
    if memchr(b'"', line).is_none() {
        return bytecount::count(line, byte) as u64;
    }
    let mut count = 0;
    let mut in_quote = false;
    for &b in line {
        if b == b'"' {
            in_quote = !in_quote;
        } else if b == byte && !in_quote {
            count += 1;
        }
    }
    count
}

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});
static LOWER_CAMEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:[A-Z][A-Za-z0-9]*)+$").unwrap()
});
static TITLE_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][a-z]+(?: [A-Z][a-z]+)*$").unwrap()
});
static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?$").unwrap()
});
static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap()
});

fn detect_header(lines: &[&[u8]], delimiter: u8) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let fields = first_line_fields(lines[0], delimiter);
    let mut name_score = 0i64;
    let mut data_score = 0i64;
    for field in &fields {
        if NUMERIC.is_match(field)
            || field.contains('@')
            || ISO_DATE.is_match(field)
        {
            data_score += 1;
        } else if IDENTIFIER.is_match(field)
            || LOWER_CAMEL.is_match(field)
            || TITLE_CASE.is_match(field)
        {
            name_score += 1;
        }
    }
    name_score > data_score
}

/// Split the first line with the real parser so quoted cells are honored.
fn first_line_fields(line: &[u8], delimiter: u8) -> Vec<String> {
    let parsed = ReaderBuilder::new()
        .delimiter(delimiter)
        .lazy_quotes(true)
        .parse(line);
    match parsed {
        Ok(records) => records
            .first()
            .map(|record| {
                record
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect()
            })
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{count_unquoted, sniff, Dialect};

    #[test]
    fn semicolon_with_header() {
        let dialect = sniff(b"name;age\nAlice;30\nBob;25");
        assert_eq!(
            dialect,
            Dialect { delimiter: b';', has_header: true }
        );
    }

    #[test]
    fn comma_data_without_header() {
        let dialect = sniff(b"1,2,3\n4,5,6\n");
        assert_eq!(dialect.delimiter, b',');
        assert!(!dialect.has_header);
    }

    #[test]
    fn tab_separated() {
        let dialect = sniff(b"col\tother\n1\t2\n");
        assert_eq!(dialect.delimiter, b'\t');
        assert!(dialect.has_header);
    }

    #[test]
    fn pipe_separated() {
        let dialect = sniff(b"a|b|c\nd|e|f\n");
        assert_eq!(dialect.delimiter, b'|');
    }

    #[test]
    fn consistency_beats_raw_count() {
        // Commas are more numerous but inconsistent across lines;
        // semicolons appear exactly once per line.
        let dialect = sniff(b"a;b,c,d,e\nf;g\nh;i\n");
        assert_eq!(dialect.delimiter, b';');
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        let dialect = sniff(b"\"a;b\",c\n\"d;e\",f\n");
        assert_eq!(dialect.delimiter, b',');
        assert_eq!(count_unquoted(b"\"a;b\";c", b';'), 1);
    }

    #[test]
    fn defaults_to_comma() {
        let dialect = sniff(b"singlecolumn\nvalues\n");
        assert_eq!(dialect.delimiter, b',');
    }

    #[test]
    fn single_line_is_never_a_header() {
        let dialect = sniff(b"name,age\n");
        assert!(!dialect.has_header);
    }

    #[test]
    fn data_like_first_row_is_not_a_header() {
        let dialect = sniff(b"2024-01-02,bob@example.com,17\nx,y,z\n");
        assert!(!dialect.has_header);
    }

    #[test]
    fn camel_and_title_names_count_as_header() {
        let dialect =
            sniff(b"firstName,Last Name,user_id\nJo,Smith,7\n");
        assert!(dialect.has_header);
    }

    #[test]
    fn mixed_first_row_requires_majority() {
        // Two data-like cells vs one name-like cell.
        let dialect = sniff(b"id,42,2020-01-01\nname,43,2020-01-02\n");
        assert!(!dialect.has_header);
    }

    #[test]
    fn crlf_sample() {
        let dialect = sniff(b"name;age\r\nAlice;30\r\n");
        assert_eq!(
            dialect,
            Dialect { delimiter: b';', has_header: true }
        );
    }
}
