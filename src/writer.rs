use std::io;

use memchr::memchr;

use crate::error::{
    new_error, new_into_inner_error, ErrorKind, IntoInnerError, Result,
};
use crate::pool;
use crate::record::RecordView;

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter, `\r` or
    /// `\n`, or when a record consists of a single empty field (which
    /// would otherwise be indistinguishable from an empty line).
    ///
    /// This is the default.
    Necessary,
    /// This *never* writes quotes.
    ///
    /// If a field requires quotes, then the writer reports an error.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// Builds a CSV writer with various configuration knobs.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    delimiter: u8,
    use_crlf: bool,
    style: QuoteStyle,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            delimiter: b',',
            use_crlf: false,
            style: QuoteStyle::default(),
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`. The delimiter must not be the quote, `\r`,
    /// `\n` or NUL; an offending value surfaces as an error at
    /// construction.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Use `\r\n` as the record terminator instead of `\n`.
    pub fn use_crlf(&mut self, yes: bool) -> &mut WriterBuilder {
        self.use_crlf = yes;
        self
    }

    /// The quoting style to use when writing CSV.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.style = style;
        self
    }

    /// Build a CSV writer from this configuration that writes to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        if let b'"' | b'\r' | b'\n' | 0 = self.delimiter {
            return Err(new_error(ErrorKind::InvalidOption(format!(
                "delimiter {:?} conflicts with the CSV grammar",
                self.delimiter as char
            ))));
        }
        Ok(Writer {
            wtr,
            delimiter: self.delimiter,
            use_crlf: self.use_crlf,
            style: self.style,
        })
    }

    /// Render a sequence of records to bytes with this configuration.
    ///
    /// Empty input produces empty output; otherwise every record, the last
    /// included, is followed by the configured terminator.
    pub fn render<I, F>(&self, records: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = F>,
        F: IntoIterator,
        <F as IntoIterator>::Item: AsRef<[u8]>,
    {
        let mut wtr = self.from_writer(Vec::new())?;
        for record in records {
            wtr.write_record(record)?;
        }
        wtr.into_inner().map_err(|err| err.into_error().into())
    }
}

/// An already-configured CSV writer.
///
/// All CSV data produced by this writer, with default options, conforms to
/// RFC 4180: a field is written bare if and only if it contains none of the
/// delimiter, `"`, `\r` or `\n`; otherwise it is enclosed in quotes and
/// every internal quote is doubled.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: W,
    delimiter: u8,
    use_crlf: bool,
    style: QuoteStyle,
}

impl<W: io::Write> Writer<W> {
    /// Write a single record.
    ///
    /// Reading back a record written with the same options produces
    /// byte-equal field values.
    pub fn write_record<I>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[u8]>,
    {
        let mut buf = pool::take();
        let result = self.encode_record(record, &mut buf);
        let result = result.and_then(|()| {
            self.wtr.write_all(&buf).map_err(From::from)
        });
        pool::put(buf);
        result
    }

    /// Write a record view produced by a reader.
    pub fn write_view(&mut self, view: &RecordView) -> Result<()> {
        self.write_record(view.iter().map(|field| field.bytes()))
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush().map_err(From::from)
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> std::result::Result<W, IntoInnerError<Writer<W>>> {
        match self.wtr.flush() {
            Ok(()) => Ok(self.wtr),
            Err(err) => Err(new_into_inner_error(self, err)),
        }
    }

    fn encode_record<I>(&self, record: I, buf: &mut Vec<u8>) -> Result<()>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[u8]>,
    {
        let mut count = 0;
        let mut last_len = 0;
        for field in record {
            let field = field.as_ref();
            if count > 0 {
                buf.push(self.delimiter);
            }
            self.encode_field(field, buf)?;
            count += 1;
            last_len = field.len();
        }
        // A record with a single empty field is written as `""`, otherwise
        // it would re-parse as an empty line and vanish.
        if count == 1
            && last_len == 0
            && self.style == QuoteStyle::Necessary
        {
            buf.push(b'"');
            buf.push(b'"');
        }
        if self.use_crlf {
            buf.push(b'\r');
        }
        buf.push(b'\n');
        Ok(())
    }

    fn encode_field(&self, field: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        let needs_quotes = field.iter().any(|&b| {
            b == self.delimiter || b == b'"' || b == b'\r' || b == b'\n'
        });
        match self.style {
            QuoteStyle::Always => self.quote_field(field, buf),
            QuoteStyle::Necessary if needs_quotes => {
                self.quote_field(field, buf)
            }
            QuoteStyle::Never if needs_quotes => {
                return Err(new_error(ErrorKind::Render(format!(
                    "field requires quotes, but the quote style is \
                     'never': {:?}",
                    String::from_utf8_lossy(field)
                ))));
            }
            QuoteStyle::Necessary | QuoteStyle::Never => {
                buf.extend_from_slice(field);
            }
        }
        Ok(())
    }

    fn quote_field(&self, mut field: &[u8], buf: &mut Vec<u8>) {
        buf.push(b'"');
        while let Some(next_quote) = memchr(b'"', field) {
            buf.extend_from_slice(&field[..next_quote]);
            buf.push(b'"');
            buf.push(b'"');
            field = &field[next_quote + 1..];
        }
        buf.extend_from_slice(field);
        buf.push(b'"');
    }
}

/// Render a sequence of records to RFC 4180 bytes with default options.
pub fn render<I, F>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = F>,
    F: IntoIterator,
    <F as IntoIterator>::Item: AsRef<[u8]>,
{
    WriterBuilder::new().render(records)
}

#[cfg(test)]
mod tests {
    use super::{render, QuoteStyle, WriterBuilder};

    fn s(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn bare_fields() {
        let out = render(vec![vec!["a", "b", "c"]]).unwrap();
        assert_eq!(s(&out), "a,b,c\n");
    }

    #[test]
    fn trailing_terminator_after_every_record() {
        let out = render(vec![vec!["a"], vec!["b"]]).unwrap();
        assert_eq!(s(&out), "a\nb\n");
    }

    #[test]
    fn empty_input_empty_output() {
        let records: Vec<Vec<&str>> = vec![];
        assert_eq!(render(records).unwrap(), b"");
    }

    #[test]
    fn quotes_delimiter_and_newlines() {
        let out =
            render(vec![vec!["a,b", "c\nd", "e\rf", "plain"]]).unwrap();
        assert_eq!(s(&out), "\"a,b\",\"c\nd\",\"e\rf\",plain\n");
    }

    #[test]
    fn doubles_internal_quotes() {
        let out = render(vec![vec!["say \"hi\""]]).unwrap();
        assert_eq!(s(&out), "\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn single_empty_field_is_quoted() {
        let out = render(vec![vec![""]]).unwrap();
        assert_eq!(s(&out), "\"\"\n");
    }

    #[test]
    fn multi_field_empties_stay_bare() {
        let out = render(vec![vec!["", ""]]).unwrap();
        assert_eq!(s(&out), ",\n");
    }

    #[test]
    fn crlf_and_custom_delimiter() {
        let out = WriterBuilder::new()
            .use_crlf(true)
            .delimiter(b'\t')
            .render(vec![vec!["a", "b,"]])
            .unwrap();
        assert_eq!(s(&out), "a\t\"b,\"\r\n");
    }

    #[test]
    fn tab_delimited_comma_is_plain() {
        let out = WriterBuilder::new()
            .delimiter(b'\t')
            .render(vec![vec!["a,b", "c\td"]])
            .unwrap();
        assert_eq!(s(&out), "a,b\t\"c\td\"\n");
    }

    #[test]
    fn quote_style_always() {
        let out = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .render(vec![vec!["a", ""]])
            .unwrap();
        assert_eq!(s(&out), "\"a\",\"\"\n");
    }

    #[test]
    fn quote_style_never_errors_when_needed() {
        let err = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .render(vec![vec!["a,b"]])
            .unwrap_err();
        assert!(err.to_string().contains("quote style"));
    }

    #[test]
    fn invalid_delimiter_is_rejected() {
        assert!(WriterBuilder::new()
            .delimiter(b'"')
            .from_writer(Vec::new())
            .is_err());
        assert!(WriterBuilder::new()
            .delimiter(b'\n')
            .from_writer(Vec::new())
            .is_err());
    }

    #[test]
    fn write_record_streams() {
        let mut wtr =
            WriterBuilder::new().from_writer(Vec::new()).unwrap();
        wtr.write_record(&["x", "y"]).unwrap();
        wtr.write_record(&["1", "2"]).unwrap();
        let out = wtr.into_inner().unwrap();
        assert_eq!(s(&out), "x,y\n1,2\n");
    }
}
