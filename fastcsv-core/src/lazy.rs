use memchr::{memchr, memchr3};

use crate::QUOTE;

/// Decoded fields of one record: contiguous bytes plus per-field end
/// offsets. Reused across records so steady-state reading allocates
/// nothing.
#[derive(Clone, Debug, Default)]
pub struct FieldBuf {
    bytes: Vec<u8>,
    ends: Vec<usize>,
}

impl FieldBuf {
    pub fn new() -> FieldBuf {
        FieldBuf::default()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.ends.clear();
    }

    /// Number of complete fields.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// The decoded bytes of all fields, contiguously.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The end offset of each field within [`FieldBuf::bytes`].
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// The decoded bytes of field `i`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        let end = *self.ends.get(i)?;
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(&self.bytes[start..end])
    }

    fn push(&mut self, b: u8) {
        self.bytes.push(b);
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn end_field(&mut self) {
        self.ends.push(self.bytes.len());
    }
}

/// Outcome of a lazy split attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LazySplit {
    /// A full record was decoded; `nread` bytes of the window were
    /// consumed, terminator included.
    Complete { nread: usize },
    /// The record continues beyond the window; refill and retry.
    NeedMore,
}

/// Split and decode one record under the permissive quote grammar.
///
/// `window` starts at the first byte of the record; `eof` says whether the
/// window ends at end of input. Decoded fields land in `out`.
///
/// The grammar: a quote opens a quoted region only as the first byte of a
/// field (after optional whitespace trim). Inside a quoted region, `""` is
/// a literal quote; a closing quote followed by the delimiter or a newline
/// ends the field; a closing quote followed by anything else is kept as a
/// literal quote and the region continues; end of input closes the region,
/// keeping the remaining bytes. A quote inside an unquoted field is an
/// ordinary byte. Records end at `\n`, `\r\n`, or end of input; a bare
/// `\r` is data.
pub fn split_lazy(
    window: &[u8],
    eof: bool,
    delimiter: u8,
    trim: bool,
    out: &mut FieldBuf,
) -> LazySplit {
    out.clear();
    let mut i = 0;
    'fields: loop {
        if trim {
            while i < window.len()
                && (window[i] == b' ' || window[i] == b'\t')
            {
                i += 1;
            }
        }
        if i >= window.len() {
            if !eof {
                return LazySplit::NeedMore;
            }
            out.end_field();
            return LazySplit::Complete { nread: i };
        }
        if window[i] == QUOTE {
            i += 1;
            loop {
                let off = match memchr(QUOTE, &window[i..]) {
                    Some(off) => off,
                    None => {
                        if !eof {
                            return LazySplit::NeedMore;
                        }
                        // Unclosed region at end of input: keep the bytes.
                        out.extend(&window[i..]);
                        out.end_field();
                        return LazySplit::Complete { nread: window.len() };
                    }
                };
                out.extend(&window[i..i + off]);
                i += off + 1;
                if i >= window.len() {
                    if !eof {
                        return LazySplit::NeedMore;
                    }
                    out.end_field();
                    return LazySplit::Complete { nread: i };
                }
                match window[i] {
                    QUOTE => {
                        out.push(QUOTE);
                        i += 1;
                    }
                    c if c == delimiter => {
                        out.end_field();
                        i += 1;
                        continue 'fields;
                    }
                    b'\n' => {
                        out.end_field();
                        return LazySplit::Complete { nread: i + 1 };
                    }
                    b'\r' => {
                        if i + 1 >= window.len() && !eof {
                            return LazySplit::NeedMore;
                        }
                        if window.get(i + 1) == Some(&b'\n') {
                            out.end_field();
                            return LazySplit::Complete { nread: i + 2 };
                        }
                        // Bare CR after a quote: both are data.
                        out.push(QUOTE);
                        out.push(b'\r');
                        i += 1;
                    }
                    _ => {
                        // A close quote followed by data: keep the quote
                        // literally and stay in the region.
                        out.push(QUOTE);
                    }
                }
            }
        }
        // Unquoted field: runs to the next delimiter or record end.
        let field_start = i;
        let mut j = i;
        loop {
            let off = match memchr3(delimiter, b'\n', b'\r', &window[j..]) {
                Some(off) => off,
                None => {
                    if !eof {
                        return LazySplit::NeedMore;
                    }
                    out.extend(&window[field_start..]);
                    out.end_field();
                    return LazySplit::Complete { nread: window.len() };
                }
            };
            let p = j + off;
            match window[p] {
                b'\r' => {
                    if p + 1 >= window.len() && !eof {
                        return LazySplit::NeedMore;
                    }
                    if window.get(p + 1) == Some(&b'\n') {
                        out.extend(&window[field_start..p]);
                        out.end_field();
                        return LazySplit::Complete { nread: p + 2 };
                    }
                    // Bare CR is data; keep scanning.
                    j = p + 1;
                }
                b'\n' => {
                    out.extend(&window[field_start..p]);
                    out.end_field();
                    return LazySplit::Complete { nread: p + 1 };
                }
                _ => {
                    out.extend(&window[field_start..p]);
                    out.end_field();
                    i = p + 1;
                    continue 'fields;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{split_lazy, FieldBuf, LazySplit};

    fn split(window: &[u8], eof: bool) -> (Vec<Vec<u8>>, LazySplit) {
        let mut buf = FieldBuf::new();
        let res = split_lazy(window, eof, b',', false, &mut buf);
        let fields =
            (0..buf.len()).map(|i| buf.get(i).unwrap().to_vec()).collect();
        (fields, res)
    }

    fn complete(window: &[u8]) -> (Vec<Vec<u8>>, usize) {
        let (fields, res) = split(window, true);
        match res {
            LazySplit::Complete { nread } => (fields, nread),
            LazySplit::NeedMore => panic!("expected complete record"),
        }
    }

    #[test]
    fn plain_record() {
        let (fields, nread) = complete(b"a,b,c\nx,y\n");
        assert_eq!(fields, vec![b"a", b"b", b"c"]);
        assert_eq!(nread, 6);
    }

    #[test]
    fn crlf_terminator() {
        let (fields, nread) = complete(b"a,b\r\nrest");
        assert_eq!(fields, vec![b"a", b"b"]);
        assert_eq!(nread, 5);
    }

    #[test]
    fn bare_cr_is_data() {
        let (fields, _) = complete(b"a\rb,c\n");
        assert_eq!(fields, vec![&b"a\rb"[..], &b"c"[..]]);
    }

    #[test]
    fn quoted_field_decodes() {
        let (fields, _) = complete(b"\"a,b\",\"c\"\"d\"\n");
        assert_eq!(fields, vec![&b"a,b"[..], &b"c\"d"[..]]);
    }

    #[test]
    fn bare_quote_mid_field_is_literal() {
        let (fields, _) = complete(b"a\"b,c\n");
        assert_eq!(fields, vec![&b"a\"b"[..], &b"c"[..]]);
    }

    #[test]
    fn close_quote_then_data_keeps_quote() {
        let (fields, _) = complete(b"\"a\"b,c\n");
        assert_eq!(fields, vec![&b"a\"b"[..], &b"c"[..]]);
    }

    #[test]
    fn unclosed_quote_at_eof_keeps_rest() {
        let (fields, nread) = complete(b"\"abc");
        assert_eq!(fields, vec![b"abc"]);
        assert_eq!(nread, 4);
    }

    #[test]
    fn quoted_field_at_exact_eof() {
        let (fields, nread) = complete(b"\"abc\"");
        assert_eq!(fields, vec![b"abc"]);
        assert_eq!(nread, 5);
    }

    #[test]
    fn trailing_delimiter_yields_empty_field() {
        let (fields, _) = complete(b"a,\n");
        assert_eq!(fields, vec![&b"a"[..], &b""[..]]);
    }

    #[test]
    fn trailing_delimiter_at_eof() {
        let (fields, _) = complete(b"a,");
        assert_eq!(fields, vec![&b"a"[..], &b""[..]]);
    }

    #[test]
    fn needs_more_without_eof() {
        let (_, res) = split(b"a,b", false);
        assert_eq!(res, LazySplit::NeedMore);
        let (_, res) = split(b"\"a,b", false);
        assert_eq!(res, LazySplit::NeedMore);
    }

    #[test]
    fn cr_at_window_edge_waits_for_more() {
        let (_, res) = split(b"a\r", false);
        assert_eq!(res, LazySplit::NeedMore);
        let (fields, nread) = complete(b"a\r");
        assert_eq!(fields, vec![b"a\r"]);
        assert_eq!(nread, 2);
    }

    #[test]
    fn trim_leading_space() {
        let mut buf = FieldBuf::new();
        let res = split_lazy(b"  a, \tb\n", true, b',', true, &mut buf);
        assert_eq!(res, LazySplit::Complete { nread: 8 });
        assert_eq!(buf.get(0), Some(&b"a"[..]));
        assert_eq!(buf.get(1), Some(&b"b"[..]));
    }

    #[test]
    fn trim_then_quote_opens_field() {
        let mut buf = FieldBuf::new();
        let res = split_lazy(b" \" a\",b\n", true, b',', true, &mut buf);
        assert_eq!(res, LazySplit::Complete { nread: 8 });
        assert_eq!(buf.get(0), Some(&b" a"[..]));
        assert_eq!(buf.get(1), Some(&b"b"[..]));
    }

    #[test]
    fn embedded_newline_in_quotes() {
        let (fields, nread) = complete(b"\"a\nb\",c\n");
        assert_eq!(fields, vec![&b"a\nb"[..], &b"c"[..]]);
        assert_eq!(nread, 8);
    }
}
