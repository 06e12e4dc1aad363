/*!
The structural layer of the `fastcsv` codec.

This crate turns raw byte windows into structure: per-chunk class bitmasks
(`Scanner`), quote-aware structural masks (`QuoteState`), and field spans for
one record at a time (`split_record`). It knows nothing about I/O, options
policy or typed records; those live in the `fastcsv` crate on top.

The fast path works on 64-byte chunks. On `x86_64` the chunk classifier uses
SIMD byte-equality plus movemask (AVX2 when the CPU has it, SSE2 otherwise);
everywhere else, and for partial tail chunks, a portable byte loop produces
bit-identical masks. Quote state is folded across chunks with a prefix-XOR,
so a quoted field may span any number of chunk boundaries.

The permissive `lazy_quotes` grammar cannot be expressed as quote parity (a
bare `"` in the middle of an unquoted field does not open a quoted region),
so it gets its own scalar splitter, `split_lazy`, which decodes fields
eagerly into a reusable `FieldBuf`.
*/

pub use crate::cursor::{
    split_record, unescape, unescape_into, FieldSpan, SplitError,
};
pub use crate::lazy::{split_lazy, FieldBuf, LazySplit};
pub use crate::quote::{prefix_xor, QuoteState, Structural};
pub use crate::scanner::{ChunkMasks, Scanner, CHUNK};

mod cursor;
mod lazy;
mod quote;
mod scanner;

/// The quote byte. The RFC 4180 grammar implemented here fixes it.
pub const QUOTE: u8 = b'"';
