use std::borrow::Cow;

use memchr::memchr;

use crate::QUOTE;

/// One field of a record, as a window-relative byte span.
///
/// For a quoted field the span excludes the enclosing quotes. If
/// `needs_unescape` is set, the span contains doubled quotes that must be
/// collapsed to obtain the field value; otherwise the span bytes are the
/// value verbatim. A span is only meaningful while its backing window is
/// alive and unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
    pub needs_unescape: bool,
}

impl FieldSpan {
    /// Length of the raw (pre-unescape) span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Quote-structure violations found while splitting a record.
///
/// Offsets are relative to the record window handed to [`split_record`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitError {
    /// A `"` appeared where the strict grammar forbids one: inside an
    /// unquoted field, or after the closing quote of a quoted field.
    BareQuote { offset: usize },
    /// A quoted field never closed within the record.
    UnclosedQuote { offset: usize },
}

/// Split one complete record window into field spans.
///
/// `record` holds the record's bytes with the terminator already stripped;
/// `delims` holds the structural delimiter offsets found by the quote
/// resolver, in order. One span is pushed per field (`delims.len() + 1`
/// total). Returns the summed *decoded* length of all fields, i.e. span
/// lengths minus collapsed quote pairs.
///
/// When `trim` is set, leading ASCII space and TAB are excluded from each
/// field; a quote following trimmed whitespace still opens a quoted field,
/// and bytes inside the quotes are never trimmed.
pub fn split_record(
    record: &[u8],
    delims: &[usize],
    trim: bool,
    spans: &mut Vec<FieldSpan>,
) -> Result<usize, SplitError> {
    spans.clear();
    let mut decoded = 0;
    let mut start = 0;
    for i in 0..=delims.len() {
        let end = if i < delims.len() { delims[i] } else { record.len() };
        decoded += push_span(record, start, end, trim, spans)?;
        start = end + 1;
    }
    Ok(decoded)
}

fn push_span(
    record: &[u8],
    mut s: usize,
    e: usize,
    trim: bool,
    spans: &mut Vec<FieldSpan>,
) -> Result<usize, SplitError> {
    if trim {
        while s < e && (record[s] == b' ' || record[s] == b'\t') {
            s += 1;
        }
    }
    if s < e && record[s] == QUOTE {
        return quoted_span(record, s, e, spans);
    }
    if let Some(off) = memchr(QUOTE, &record[s..e]) {
        return Err(SplitError::BareQuote { offset: s + off });
    }
    spans.push(FieldSpan { start: s, end: e, needs_unescape: false });
    Ok(e - s)
}

/// Walk a quoted span: `record[s] == '"'`. Interior quotes must form
/// adjacent pairs; the final quote of the span closes the field.
fn quoted_span(
    record: &[u8],
    s: usize,
    e: usize,
    spans: &mut Vec<FieldSpan>,
) -> Result<usize, SplitError> {
    let inner_start = s + 1;
    let mut needs_unescape = false;
    let mut pairs = 0;
    let mut i = inner_start;
    loop {
        let off = match memchr(QUOTE, &record[i..e]) {
            Some(off) => off,
            // No closing quote anywhere in the span. A structurally
            // terminated record cannot produce this (parity would have
            // suppressed the terminator), but report it sanely anyway.
            None => return Err(SplitError::UnclosedQuote { offset: s }),
        };
        let p = i + off;
        if p == e - 1 {
            spans.push(FieldSpan {
                start: inner_start,
                end: p,
                needs_unescape,
            });
            return Ok(p - inner_start - pairs);
        }
        if record[p + 1] == QUOTE {
            needs_unescape = true;
            pairs += 1;
            i = p + 2;
        } else {
            // Closed, then more bytes before the next delimiter.
            return Err(SplitError::BareQuote { offset: p + 1 });
        }
    }
}

/// Collapse doubled quotes, borrowing when the input contains none.
pub fn unescape(raw: &[u8]) -> Cow<'_, [u8]> {
    match memchr(QUOTE, raw) {
        None => Cow::Borrowed(raw),
        Some(_) => {
            let mut out = Vec::with_capacity(raw.len());
            unescape_into(raw, &mut out);
            Cow::Owned(out)
        }
    }
}

/// Collapse doubled quotes, appending the decoded bytes to `out`.
pub fn unescape_into(raw: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while let Some(off) = memchr(QUOTE, &raw[i..]) {
        let p = i + off;
        out.extend_from_slice(&raw[i..=p]);
        i = if raw.get(p + 1) == Some(&QUOTE) { p + 2 } else { p + 1 };
    }
    out.extend_from_slice(&raw[i..]);
}
