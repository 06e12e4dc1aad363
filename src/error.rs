use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use crate::record::Position;
use crate::value::ValueError;

/// A type alias for `Result<T, fastcsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// A crate private constructor for `Error`.
pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

/// An error that can occur when processing CSV data.
///
/// This error can happen when reading, writing or mapping CSV data. The
/// boxed kind keeps the type a single pointer wide on the happy path.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        matches!(*self.0, ErrorKind::Io(_))
    }

    /// Returns the parse error, if this is one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match *self.0 {
            ErrorKind::Parse(ref err) => Some(err),
            _ => None,
        }
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// A structural or policy violation found while parsing.
    Parse(ParseError),
    /// An invalid configuration, reported at construction and never during
    /// parsing.
    InvalidOption(String),
    /// A failed typed conversion in the record mapper. Always fatal for the
    /// mapping call; compose with the reader's bad-line mode for row
    /// skipping.
    Convert(ConvertError),
    /// A field that was asked for as text is not valid UTF-8.
    Utf8 {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The underlying UTF-8 error.
        err: std::str::Utf8Error,
    },
    /// A field could not be written under the configured quoting style.
    Render(String),
    /// Hints that destructuring should not be exhaustive.
    #[doc(hidden)]
    __Nonexhaustive,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        new_error(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Utf8 { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::Parse(ref err) => err.fmt(f),
            ErrorKind::InvalidOption(ref msg) => {
                write!(f, "CSV configuration error: {}", msg)
            }
            ErrorKind::Convert(ref err) => err.fmt(f),
            ErrorKind::Utf8 { pos: None, ref err } => {
                write!(f, "CSV error: invalid UTF-8: {}", err)
            }
            ErrorKind::Utf8 { pos: Some(ref pos), ref err } => {
                write!(
                    f,
                    "CSV error: record {} (line {}, byte {}): \
                     invalid UTF-8: {}",
                    pos.record(),
                    pos.line(),
                    pos.byte(),
                    err
                )
            }
            ErrorKind::Render(ref msg) => {
                write!(f, "CSV write error: {}", msg)
            }
            _ => unreachable!(),
        }
    }
}

/// A structural or policy violation found while parsing CSV data.
///
/// Every parse error points at its input: `start_line` is the first line of
/// the offending record (records may span lines when quoted fields contain
/// newlines), while `line` and `column` point at the earliest byte
/// implicated. Lines and columns are 1-based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    start_line: u64,
    line: u64,
    column: u64,
    kind: ParseErrorKind,
}

/// A crate private constructor for `ParseError`.
pub(crate) fn new_parse_error(
    start_line: u64,
    line: u64,
    column: u64,
    kind: ParseErrorKind,
) -> ParseError {
    ParseError { start_line, line, column, kind }
}

impl ParseError {
    /// The line on which the offending record starts.
    pub fn start_line(&self) -> u64 {
        self.start_line
    }

    /// The line containing the earliest byte implicated.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The 1-based byte column of the earliest byte implicated.
    pub fn column(&self) -> u64 {
        self.column
    }

    /// The category of this error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start_line == self.line {
            write!(
                f,
                "CSV parse error: line {}, column {}: {}",
                self.line, self.column, self.kind
            )
        } else {
            write!(
                f,
                "CSV parse error: record starting on line {}: \
                 line {}, column {}: {}",
                self.start_line, self.line, self.column, self.kind
            )
        }
    }
}

/// The category of a parse error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A quoted field was never closed before end of input.
    UnclosedQuote,
    /// A `"` appeared inside an unquoted field, or after the closing quote
    /// of a quoted field. Permitted when `lazy_quotes` is enabled.
    BareQuote,
    /// A record had a different number of fields than required.
    WrongFieldCount {
        /// The required number of fields.
        expected: u64,
        /// The number of fields found.
        got: u64,
    },
    /// A field exceeded `max_field_bytes`.
    FieldTooLarge {
        /// The configured limit.
        limit: u64,
        /// The size of the offending field.
        len: u64,
    },
    /// A record exceeded `max_record_bytes`, or could not fit within the
    /// reader's buffer limit.
    RecordTooLarge {
        /// The configured limit.
        limit: u64,
        /// The size of the offending record, as far as it was measured.
        len: u64,
    },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseErrorKind::UnclosedQuote => {
                write!(f, "quoted field is missing its closing quote")
            }
            ParseErrorKind::BareQuote => {
                write!(f, "bare \" outside a quoted field")
            }
            ParseErrorKind::WrongFieldCount { expected, got } => {
                write!(f, "expected {} fields, got {}", expected, got)
            }
            ParseErrorKind::FieldTooLarge { limit, len } => {
                write!(
                    f,
                    "field of {} bytes exceeds the limit of {} bytes",
                    len, limit
                )
            }
            ParseErrorKind::RecordTooLarge { limit, len } => {
                write!(
                    f,
                    "record of {} bytes exceeds the limit of {} bytes",
                    len, limit
                )
            }
        }
    }
}

/// A failed typed conversion, reported by the record mapper.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConvertError {
    line: u64,
    column: u64,
    field: String,
    err: ValueError,
}

/// A crate private constructor for `ConvertError`.
pub(crate) fn new_convert_error(
    line: u64,
    column: u64,
    field: &str,
    err: ValueError,
) -> ConvertError {
    ConvertError { line, column, field: field.to_string(), err }
}

impl ConvertError {
    /// The line of the record holding the unconvertible field.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The 1-based CSV column of the unconvertible field.
    pub fn column(&self) -> u64 {
        self.column
    }

    /// The CSV name of the bound field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The underlying conversion failure.
    pub fn value_error(&self) -> &ValueError {
        &self.err
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CSV conversion error: field `{}` (line {}, column {}): {}",
            self.field, self.line, self.column, self.err
        )
    }
}

/// `IntoInnerError` occurs when consuming a `Writer` fails.
///
/// Consuming the `Writer` causes a flush to happen. If the flush fails, then
/// this error is returned, which contains both the original `Writer` and the
/// error that occurred.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

/// Creates a new `IntoInnerError`.
pub(crate) fn new_into_inner_error<W>(
    wtr: W,
    err: io::Error,
) -> IntoInnerError<W> {
    IntoInnerError { wtr, err }
}

impl<W> IntoInnerError<W> {
    /// Returns the error which caused the flush to fail.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Consume this error, returning the flush failure.
    pub fn into_error(self) -> io::Error {
        self.err
    }

    /// Returns the underlying writer, for error recovery.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> StdError for IntoInnerError<W> {}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}
