/*!
A high-performance, RFC 4180-compliant CSV codec: a streaming zero-copy
parser with SIMD-accelerated structural scanning, a symmetric renderer, and
a type-directed record mapper.

# Reading

The parser classifies input in 64-byte chunks into delimiter/quote/newline
bitmasks (SIMD equality + movemask where the CPU supports it, a portable
byte loop everywhere else), folds quote state across chunks, and emits each
record as spans into its buffer. Escapes are resolved only when a field is
materialized.

```
let records = fastcsv::parse(b"name,age\nAlice,30\nBob,25\n")?;
assert_eq!(records.len(), 3);
assert_eq!(&records[1][0], b"Alice");
# Ok::<(), fastcsv::Error>(())
```

Streaming, with zero-copy views and configuration:

```
use fastcsv::ReaderBuilder;

let mut rdr = ReaderBuilder::new()
    .comment(b'#')
    .trim_leading_space(true)
    .from_slice(b"# a comment\n x, y\n")?;
while let Some(view) = rdr.read_view()? {
    for field in view.iter() {
        let _ = field.bytes();
    }
}
# Ok::<(), fastcsv::Error>(())
```

# Writing

```
let out = fastcsv::render(vec![vec!["a", "b,c"]])?;
assert_eq!(out, b"a,\"b,c\"\n");
# Ok::<(), fastcsv::Error>(())
```

# Typed records

Implement [`Tabular`] to bind a struct's fields to CSV columns, then use
[`unmarshal`] and [`marshal`]. Column binding is by case-insensitive header
name; the binding plan is computed once per (type, header) pair and cached
process-wide.

# Dialect sniffing

[`sniff`] estimates the delimiter and header presence of a sample.
*/

#![deny(missing_docs)]

pub use crate::error::{
    ConvertError, Error, ErrorKind, IntoInnerError, ParseError,
    ParseErrorKind, Result,
};
pub use crate::mapper::{
    descriptor, marshal, marshal_with, unmarshal, unmarshal_raw,
    unmarshal_with, Descriptor, FieldOpts, SchemaBuilder, Tabular,
};
pub use crate::reader::{
    parse, validate, FieldCount, IntoRecordsIter, OnBadLine, Reader,
    ReaderBuilder, RecordsIter, WarnSink,
};
pub use crate::record::{
    ByteRecord, ByteRecordIter, FieldView, Position, RecordView,
    RecordViewIter,
};
pub use crate::sniffer::{sniff, Dialect};
pub use crate::value::{
    FieldDecode, FieldEncode, Kind, ValueError, ValueErrorKind,
};
pub use crate::writer::{render, QuoteStyle, Writer, WriterBuilder};

mod buffer;
mod error;
mod mapper;
mod pool;
mod reader;
mod record;
mod sniffer;
mod value;
mod writer;

/// Empty the process-wide caches: schema descriptors, mapper plans, and
/// the render buffer pool. Intended for tests and hot-reload scenarios.
pub fn clear_caches() {
    mapper::clear();
    pool::clear();
}
