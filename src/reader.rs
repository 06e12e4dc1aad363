use std::cmp;
use std::fmt;
use std::io;
use std::mem;

use memchr::{memchr, memchr_iter, memrchr};

use fastcsv_core::{
    split_lazy, split_record, FieldBuf, FieldSpan, LazySplit, QuoteState,
    Scanner, SplitError, CHUNK,
};

use crate::buffer::{Buffer, Fill};
use crate::error::{
    new_error, new_parse_error, Error, ErrorKind, ParseErrorKind, Result,
};
use crate::record::{ByteRecord, Position, RecordView};

/// The field-count policy applied to every record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldCount {
    /// Records may have any number of fields.
    Any,
    /// The first successfully read record fixes the count; subsequent
    /// records must match it.
    FirstRecord,
    /// Every record must have exactly this many fields.
    Exactly(usize),
}

/// What to do with a record that violates parsing or policy constraints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OnBadLine {
    /// Abort parsing with a positioned error. The default.
    Error,
    /// Report the bad line to the warning handler, discard it, and continue
    /// at the next physical line.
    Warn,
    /// Discard the bad line silently and continue at the next physical
    /// line.
    Skip,
}

/// A sink for `OnBadLine::Warn` reports: `(line, message)`.
pub type WarnSink = Box<dyn FnMut(u64, &str) + Send>;

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, comment byte,
/// recovery mode and more for parsing CSV. Once a CSV `Reader` is built,
/// its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    delimiter: u8,
    comment: Option<u8>,
    field_count: FieldCount,
    lazy_quotes: bool,
    trim: bool,
    on_bad_line: OnBadLine,
    max_field_bytes: usize,
    max_record_bytes: usize,
    capacity: usize,
    buffer_limit: usize,
    portable: bool,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            delimiter: b',',
            comment: None,
            field_count: FieldCount::Any,
            lazy_quotes: false,
            trim: false,
            on_bad_line: OnBadLine::Error,
            max_field_bytes: 0,
            max_record_bytes: 0,
            capacity: 8 * (1 << 10),
            buffer_limit: usize::MAX,
            portable: false,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`. The delimiter must not be the quote, `\r`,
    /// `\n` or NUL; an offending value surfaces as an error at
    /// construction, never during parsing.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Skip lines starting with this byte.
    ///
    /// The byte is compared against the first byte of each physical line;
    /// matching lines are consumed whole without being parsed. Disabled by
    /// default.
    pub fn comment(&mut self, comment: u8) -> &mut ReaderBuilder {
        self.comment = if comment == 0 { None } else { Some(comment) };
        self
    }

    /// The field-count policy to enforce.
    ///
    /// The default is `FieldCount::Any`, which disables the check.
    pub fn field_count(&mut self, count: FieldCount) -> &mut ReaderBuilder {
        self.field_count = count;
        self
    }

    /// Permit `"` inside unquoted fields, and bare `"` inside quoted
    /// fields.
    ///
    /// This switches the reader to a permissive scalar parser; the strict
    /// SIMD pipeline cannot express the relaxed grammar.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.lazy_quotes = yes;
        self
    }

    /// Strip leading ASCII space and TAB from each field.
    ///
    /// Whitespace before an opening quote is stripped; whitespace inside
    /// the quotes is preserved verbatim.
    pub fn trim_leading_space(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.trim = yes;
        self
    }

    /// The recovery mode for malformed records.
    ///
    /// The default is `OnBadLine::Error`.
    pub fn on_bad_line(&mut self, mode: OnBadLine) -> &mut ReaderBuilder {
        self.on_bad_line = mode;
        self
    }

    /// Reject any field longer than this many bytes. `0` (the default)
    /// disables the check. The length measured is the raw span, escapes
    /// unresolved.
    pub fn max_field_bytes(&mut self, limit: usize) -> &mut ReaderBuilder {
        self.max_field_bytes = limit;
        self
    }

    /// Reject any record whose decoded field bytes sum to more than this.
    /// `0` (the default) disables the check.
    pub fn max_record_bytes(&mut self, limit: usize) -> &mut ReaderBuilder {
        self.max_record_bytes = limit;
        self
    }

    /// Set the initial capacity (in bytes) of the buffer used in the CSV
    /// reader.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }

    /// Cap the reader's buffer growth. The buffer must hold one record at
    /// a time; a record that cannot fit is a fatal `RecordTooLarge` error.
    /// Unlimited by default.
    pub fn buffer_limit(&mut self, limit: usize) -> &mut ReaderBuilder {
        self.buffer_limit = limit;
        self
    }

    /// Force the portable structural scanner, bypassing the SIMD engine.
    ///
    /// Both engines yield byte-identical records; this is intended for
    /// testing and for pinning down miscompiles in the field.
    pub fn portable_scanner(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.portable = yes;
        self
    }

    /// Build a CSV parser from this configuration that reads from `rdr`.
    ///
    /// The reader is buffered internally, so wrapping `rdr` in a
    /// `BufReader` buys nothing.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        self.validate_options()?;
        let scanner = if self.portable {
            Scanner::portable(self.delimiter)
        } else {
            Scanner::new(self.delimiter)
        };
        Ok(Reader {
            rdr,
            buf: Buffer::new(self.capacity, self.buffer_limit),
            scanner,
            qstate: QuoteState::new(),
            comment: self.comment,
            lazy_quotes: self.lazy_quotes,
            trim: self.trim,
            on_bad_line: self.on_bad_line,
            max_field_bytes: self.max_field_bytes,
            max_record_bytes: self.max_record_bytes,
            buffer_limit: self.buffer_limit,
            field_count: self.field_count,
            warn: None,
            line: 1,
            records: 0,
            expected_fields: match self.field_count {
                FieldCount::Exactly(n) => Some(n),
                _ => None,
            },
            delims: Vec::new(),
            spans: Vec::new(),
            lazybuf: FieldBuf::new(),
            pending: 0,
        })
    }

    /// Build a CSV parser over an in-memory slice.
    pub fn from_slice<'s>(&self, data: &'s [u8]) -> Result<Reader<&'s [u8]>> {
        self.from_reader(data)
    }

    /// Parse `data` to completion with this configuration.
    pub fn parse(&self, data: &[u8]) -> Result<Vec<ByteRecord>> {
        let mut rdr = self.from_slice(data)?;
        let mut out = Vec::new();
        loop {
            let mut record = ByteRecord::new();
            if !rdr.read_record(&mut record)? {
                return Ok(out);
            }
            out.push(record);
        }
    }

    /// Run the full parsing pipeline over `data` without materializing
    /// records.
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        let mut rdr = self.from_slice(data)?;
        while rdr.read_view()?.is_some() {}
        Ok(())
    }

    pub(crate) fn field_count_policy(&self) -> FieldCount {
        self.field_count
    }

    fn validate_options(&self) -> Result<()> {
        fn invalid(msg: String) -> Error {
            new_error(ErrorKind::InvalidOption(msg))
        }
        if let b'"' | b'\r' | b'\n' | 0 = self.delimiter {
            return Err(invalid(format!(
                "delimiter {:?} conflicts with the CSV grammar",
                self.delimiter as char
            )));
        }
        if let Some(comment) = self.comment {
            if comment == self.delimiter {
                return Err(invalid(
                    "comment byte equals the delimiter".to_string(),
                ));
            }
            if let b'"' | b'\r' | b'\n' = comment {
                return Err(invalid(format!(
                    "comment byte {:?} conflicts with the CSV grammar",
                    comment as char
                )));
            }
        }
        if self.field_count == FieldCount::Exactly(0) {
            return Err(invalid(
                "a record always has at least one field".to_string(),
            ));
        }
        if self.buffer_limit == 0 {
            return Err(invalid("buffer limit must be nonzero".to_string()));
        }
        Ok(())
    }
}

/// How to resynchronize after a discarded bad record.
enum Recovery {
    /// The record terminated normally; resume right after it.
    Consume(usize),
    /// The quote structure broke; resume at the next physical line past
    /// this window offset, with the quote state cleared.
    NextLine(usize),
    /// No resynchronization point exists before end of input.
    Abandon,
}

/// The outcome of scanning forward for one record's structure.
enum ScanOut {
    /// A record occupying `window[..data_end]`, terminator excluded;
    /// consuming it takes `nread` bytes.
    Record { data_end: usize, nread: usize },
    /// End of input arrived inside a quoted region opened at `offset`.
    UnclosedQuote { offset: usize },
}

/// An already-configured CSV reader.
///
/// A reader yields records strictly in input order, one at a time; a single
/// instance is a sequential state machine and never blocks on anything but
/// its byte source. Concurrent readers on disjoint inputs are independent.
pub struct Reader<R> {
    rdr: R,
    buf: Buffer,
    scanner: Scanner,
    qstate: QuoteState,
    comment: Option<u8>,
    lazy_quotes: bool,
    trim: bool,
    on_bad_line: OnBadLine,
    max_field_bytes: usize,
    max_record_bytes: usize,
    buffer_limit: usize,
    field_count: FieldCount,
    warn: Option<WarnSink>,
    line: u64,
    records: u64,
    expected_fields: Option<usize>,
    delims: Vec<usize>,
    spans: Vec<FieldSpan>,
    lazybuf: FieldBuf,
    pending: usize,
}

impl<R> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("delimiter", &(self.scanner.delimiter() as char))
            .field("comment", &self.comment)
            .field("lazy_quotes", &self.lazy_quotes)
            .field("trim", &self.trim)
            .field("on_bad_line", &self.on_bad_line)
            .field("field_count", &self.field_count)
            .field("line", &self.line)
            .field("records", &self.records)
            .finish()
    }
}

impl<R: io::Read> Reader<R> {
    /// Install the sink invoked for every discarded record when the
    /// recovery mode is `OnBadLine::Warn`.
    pub fn set_warn_handler<F>(&mut self, sink: F)
    where
        F: FnMut(u64, &str) + Send + 'static,
    {
        self.warn = Some(Box::new(sink));
    }

    /// The position of the next unread byte.
    pub fn position(&self) -> Position {
        Position::at(
            self.buf.abs() + self.pending as u64,
            self.line,
            self.records,
        )
    }

    /// The current 1-based line number.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// True if the SIMD structural scanner is active.
    pub fn is_accelerated(&self) -> bool {
        self.scanner.is_accelerated()
    }

    /// Read the next record as a zero-copy view.
    ///
    /// The view borrows the reader's buffer and is invalidated by the next
    /// read; this is the record-reuse mode, enforced by the borrow rather
    /// than by contract.
    pub fn read_view(&mut self) -> Result<Option<RecordView<'_>>> {
        let pending = mem::take(&mut self.pending);
        self.buf.consume(pending);
        loop {
            if !self.skip_preamble()? {
                return Ok(None);
            }
            let start_line = self.line;
            let start_byte = self.buf.abs();
            if self.lazy_quotes {
                let nread = self.scan_lazy(start_line)?;
                self.spans.clear();
                let mut prev = 0;
                for &end in self.lazybuf.ends() {
                    self.spans.push(FieldSpan {
                        start: prev,
                        end,
                        needs_unescape: false,
                    });
                    prev = end;
                }
                let decoded = self.lazybuf.bytes().len();
                if let Some(err) = self.check_policies(start_line, decoded, false)
                {
                    self.bad_line(err, Recovery::Consume(nread))?;
                    continue;
                }
                let pos = self.accept_record(start_byte, start_line, nread);
                return Ok(Some(RecordView::new(
                    self.lazybuf.bytes(),
                    &self.spans,
                    pos,
                )));
            }
            match self.scan_strict(start_line)? {
                ScanOut::Record { data_end, nread } => {
                    let split = split_record(
                        &self.buf.window()[..data_end],
                        &self.delims,
                        self.trim,
                        &mut self.spans,
                    );
                    match split {
                        Ok(decoded) => {
                            if let Some(err) =
                                self.check_policies(start_line, decoded, true)
                            {
                                self.bad_line(err, Recovery::Consume(nread))?;
                                continue;
                            }
                            let pos = self
                                .accept_record(start_byte, start_line, nread);
                            let window = self.buf.window();
                            return Ok(Some(RecordView::new(
                                &window[..data_end],
                                &self.spans,
                                pos,
                            )));
                        }
                        Err(SplitError::BareQuote { offset }) => {
                            let err = self.parse_error_at(
                                start_line,
                                Some(offset),
                                ParseErrorKind::BareQuote,
                            );
                            self.bad_line(err, Recovery::NextLine(offset))?;
                        }
                        Err(SplitError::UnclosedQuote { offset }) => {
                            let err = self.parse_error_at(
                                start_line,
                                Some(offset),
                                ParseErrorKind::UnclosedQuote,
                            );
                            self.bad_line(err, Recovery::Abandon)?;
                        }
                    }
                }
                ScanOut::UnclosedQuote { offset } => {
                    // A quote that opened a field is unclosed; a quote that
                    // appeared mid-field is bare. Only the former has no
                    // resynchronization point before end of input.
                    if self.quote_opens_field(offset) {
                        let err = self.parse_error_at(
                            start_line,
                            Some(offset),
                            ParseErrorKind::UnclosedQuote,
                        );
                        self.bad_line(err, Recovery::Abandon)?;
                    } else {
                        let err = self.parse_error_at(
                            start_line,
                            Some(offset),
                            ParseErrorKind::BareQuote,
                        );
                        self.bad_line(err, Recovery::NextLine(offset))?;
                    }
                }
            }
        }
    }

    /// Read the next record into `record`, reusing its allocations.
    ///
    /// Returns false when the input is exhausted.
    pub fn read_record(&mut self, record: &mut ByteRecord) -> Result<bool> {
        match self.read_view()? {
            Some(view) => {
                view.materialize(record);
                Ok(true)
            }
            None => {
                record.clear();
                Ok(false)
            }
        }
    }

    /// An iterator over owned records, borrowing the reader.
    pub fn records(&mut self) -> RecordsIter<'_, R> {
        RecordsIter { rdr: self }
    }

    /// An iterator over owned records, consuming the reader.
    pub fn into_records(self) -> IntoRecordsIter<R> {
        IntoRecordsIter { rdr: self }
    }

    /// Skip empty lines and comment lines; false means clean end of input.
    fn skip_preamble(&mut self) -> Result<bool> {
        loop {
            let (first, second, eof) = {
                let window = self.buf.window();
                (window.first().copied(), window.get(1).copied(), self.buf.eof())
            };
            let first = match first {
                Some(byte) => byte,
                None => {
                    if eof {
                        return Ok(false);
                    }
                    self.fill(1, 1)?;
                    continue;
                }
            };
            match first {
                b'\n' => {
                    self.buf.consume(1);
                    self.line += 1;
                }
                b'\r' => match second {
                    Some(b'\n') => {
                        self.buf.consume(2);
                        self.line += 1;
                    }
                    Some(_) => return Ok(true),
                    None if eof => return Ok(true),
                    None => {
                        self.fill(1, 1)?;
                    }
                },
                byte if Some(byte) == self.comment => {
                    self.skip_to_next_line(0)?;
                }
                _ => return Ok(true),
            }
        }
    }

    /// Scan forward for the next record's structural delimiters and
    /// terminator, growing the window as needed.
    fn scan_strict(&mut self, start_line: u64) -> Result<ScanOut> {
        self.delims.clear();
        self.qstate.reset();
        let mut scanned = 0;
        loop {
            loop {
                let (window_len, eof) =
                    (self.buf.window().len(), self.buf.eof());
                if scanned >= window_len {
                    break;
                }
                let remaining = window_len - scanned;
                if remaining < CHUNK && !eof {
                    break;
                }
                let end = scanned + cmp::min(CHUNK, remaining);
                let structural = {
                    let window = self.buf.window();
                    let masks = self.scanner.scan(&window[scanned..end]);
                    self.qstate.fold(&masks)
                };
                let term_bit = if structural.term != 0 {
                    Some(structural.term.trailing_zeros() as usize)
                } else {
                    None
                };
                let delim_mask = match term_bit {
                    Some(bit) => structural.delim & ((1u64 << bit) - 1),
                    None => structural.delim,
                };
                let mut bits = delim_mask;
                while bits != 0 {
                    let bit = bits.trailing_zeros() as usize;
                    self.delims.push(scanned + bit);
                    bits &= bits - 1;
                }
                if let Some(bit) = term_bit {
                    let term = scanned + bit;
                    let mut data_end = term;
                    if data_end > 0
                        && self.buf.window()[data_end - 1] == b'\r'
                    {
                        data_end -= 1;
                    }
                    return Ok(ScanOut::Record { data_end, nread: term + 1 });
                }
                scanned = end;
            }
            let (window_len, eof) = (self.buf.window().len(), self.buf.eof());
            if eof && scanned >= window_len {
                if self.qstate.in_quote() {
                    let offset = unmatched_quote_offset(self.buf.window());
                    return Ok(ScanOut::UnclosedQuote { offset });
                }
                return Ok(ScanOut::Record {
                    data_end: window_len,
                    nread: window_len,
                });
            }
            self.fill(start_line, window_len as u64)?;
        }
    }

    /// Decode one record under the permissive grammar, growing the window
    /// as needed. Returns the bytes consumed.
    fn scan_lazy(&mut self, start_line: u64) -> Result<usize> {
        loop {
            let outcome = {
                let window = self.buf.window();
                split_lazy(
                    window,
                    self.buf.eof(),
                    self.scanner.delimiter(),
                    self.trim,
                    &mut self.lazybuf,
                )
            };
            match outcome {
                LazySplit::Complete { nread } => return Ok(nread),
                LazySplit::NeedMore => {
                    let len = self.buf.window().len() as u64;
                    self.fill(start_line, len)?;
                }
            }
        }
    }

    /// Refill the window, mapping buffer exhaustion to a fatal error.
    fn fill(&mut self, start_line: u64, record_len: u64) -> Result<()> {
        match self.buf.fill(&mut self.rdr)? {
            Fill::Read(_) | Fill::Eof => Ok(()),
            Fill::LimitReached => Err(self.parse_error_at(
                start_line,
                None,
                ParseErrorKind::RecordTooLarge {
                    limit: self.buffer_limit as u64,
                    len: record_len,
                },
            )),
        }
    }

    /// Apply the size and field-count policies to the freshly split
    /// record.
    fn check_policies(
        &self,
        start_line: u64,
        decoded: usize,
        strict: bool,
    ) -> Option<Error> {
        if self.max_field_bytes > 0 {
            for span in &self.spans {
                if span.len() > self.max_field_bytes {
                    let offset = if strict { Some(span.start) } else { None };
                    return Some(self.parse_error_at(
                        start_line,
                        offset,
                        ParseErrorKind::FieldTooLarge {
                            limit: self.max_field_bytes as u64,
                            len: span.len() as u64,
                        },
                    ));
                }
            }
        }
        if self.max_record_bytes > 0 && decoded > self.max_record_bytes {
            return Some(self.parse_error_at(
                start_line,
                None,
                ParseErrorKind::RecordTooLarge {
                    limit: self.max_record_bytes as u64,
                    len: decoded as u64,
                },
            ));
        }
        if self.field_count != FieldCount::Any {
            if let Some(expected) = self.expected_fields {
                if self.spans.len() != expected {
                    return Some(self.parse_error_at(
                        start_line,
                        None,
                        ParseErrorKind::WrongFieldCount {
                            expected: expected as u64,
                            got: self.spans.len() as u64,
                        },
                    ));
                }
            }
        }
        None
    }

    /// Commit a successful record: latch the field count, advance the line
    /// counter past everything the record consumed, and defer the consume
    /// itself until the next read (the view borrows the window).
    fn accept_record(
        &mut self,
        start_byte: u64,
        start_line: u64,
        nread: usize,
    ) -> Position {
        if self.field_count == FieldCount::FirstRecord
            && self.expected_fields.is_none()
        {
            self.expected_fields = Some(self.spans.len());
        }
        let window = self.buf.window();
        self.line += bytecount::count(&window[..nread], b'\n') as u64;
        self.pending = nread;
        let pos = Position::at(start_byte, start_line, self.records);
        self.records += 1;
        pos
    }

    /// Build a positioned parse error. `offset` is window-relative; `None`
    /// points at the record start.
    fn parse_error_at(
        &self,
        start_line: u64,
        offset: Option<usize>,
        kind: ParseErrorKind,
    ) -> Error {
        let (line, column) = match offset {
            None => (start_line, 1),
            Some(offset) => {
                let window = self.buf.window();
                let upto = &window[..cmp::min(offset, window.len())];
                let line =
                    start_line + bytecount::count(upto, b'\n') as u64;
                let column = match memrchr(b'\n', upto) {
                    Some(lf) => (offset - lf) as u64,
                    None => offset as u64 + 1,
                };
                (line, column)
            }
        };
        new_error(ErrorKind::Parse(new_parse_error(
            start_line, line, column, kind,
        )))
    }

    /// Apply the bad-line mode to a discarded record.
    fn bad_line(&mut self, err: Error, recovery: Recovery) -> Result<()> {
        match self.on_bad_line {
            OnBadLine::Error => return Err(err),
            OnBadLine::Warn => {
                if let (Some(sink), Some(parse)) =
                    (self.warn.as_mut(), err.parse_error())
                {
                    sink(parse.line(), &parse.kind().to_string());
                }
            }
            OnBadLine::Skip => {}
        }
        match recovery {
            Recovery::Consume(nread) => {
                let lfs = {
                    let window = self.buf.window();
                    bytecount::count(&window[..nread], b'\n') as u64
                };
                self.line += lfs;
                self.buf.consume(nread);
            }
            Recovery::NextLine(offset) => self.skip_to_next_line(offset)?,
            Recovery::Abandon => {
                let (len, lfs) = {
                    let window = self.buf.window();
                    (window.len(), bytecount::count(window, b'\n') as u64)
                };
                self.line += lfs;
                self.buf.consume(len);
            }
        }
        Ok(())
    }

    /// Consume up to and including the next physical `\n`, or to end of
    /// input, clearing the quote state.
    fn skip_to_next_line(&mut self, mut from: usize) -> Result<()> {
        loop {
            let (found, consumed, lfs) = {
                let window = self.buf.window();
                match memchr(b'\n', &window[from..]) {
                    Some(i) => {
                        let n = from + i + 1;
                        (true, n, bytecount::count(&window[..n], b'\n'))
                    }
                    None => {
                        (false, window.len(), bytecount::count(window, b'\n'))
                    }
                }
            };
            self.line += lfs as u64;
            self.buf.consume(consumed);
            if found {
                self.qstate.reset();
                return Ok(());
            }
            from = 0;
            match self.buf.fill(&mut self.rdr)? {
                Fill::Eof | Fill::LimitReached => return Ok(()),
                Fill::Read(_) => {}
            }
        }
    }

    /// True if the quote at `offset` sits at the start of its field
    /// (ignoring trimmed whitespace), i.e. legitimately opened a quoted
    /// region.
    fn quote_opens_field(&self, offset: usize) -> bool {
        let window = self.buf.window();
        let mut field_start =
            match self.delims.iter().rev().find(|&&d| d < offset) {
                Some(&d) => d + 1,
                None => 0,
            };
        if self.trim {
            while field_start < offset
                && (window[field_start] == b' '
                    || window[field_start] == b'\t')
            {
                field_start += 1;
            }
        }
        field_start == offset
    }
}

/// Locate the unmatched opening quote of a region that ran to end of
/// input.
fn unmatched_quote_offset(window: &[u8]) -> usize {
    let mut open = 0;
    let mut in_quote = false;
    for pos in memchr_iter(b'"', window) {
        if !in_quote {
            open = pos;
        }
        in_quote = !in_quote;
    }
    open
}

/// An iterator over owned records, borrowing its reader.
pub struct RecordsIter<'r, R> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<ByteRecord>;

    fn next(&mut self) -> Option<Result<ByteRecord>> {
        let mut record = ByteRecord::new();
        match self.rdr.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// An iterator over owned records, owning its reader.
pub struct IntoRecordsIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> Iterator for IntoRecordsIter<R> {
    type Item = Result<ByteRecord>;

    fn next(&mut self) -> Option<Result<ByteRecord>> {
        let mut record = ByteRecord::new();
        match self.rdr.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Parse `data` to completion with the default configuration.
pub fn parse(data: &[u8]) -> Result<Vec<ByteRecord>> {
    ReaderBuilder::new().parse(data)
}

/// Run the full parsing pipeline over `data` without materializing
/// records.
pub fn validate(data: &[u8]) -> Result<()> {
    ReaderBuilder::new().validate(data)
}
