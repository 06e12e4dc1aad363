use std::cmp;
use std::io;

/// Smallest useful buffer size: one scanner chunk.
const MIN_CAPACITY: usize = 64;

/// The outcome of a refill attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Fill {
    /// This many new bytes were read.
    Read(usize),
    /// The underlying reader is exhausted.
    Eof,
    /// No room could be made: the window already spans `buffer_limit`
    /// bytes of a single record.
    LimitReached,
}

/// A growing contiguous window over a byte stream.
///
/// The window always holds the bytes of the current record contiguously,
/// starting at `start`; field spans index into it. Consumed records are
/// compacted away on the next refill, and the buffer doubles while a record
/// keeps growing, up to `limit`.
#[derive(Debug)]
pub(crate) struct Buffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
    abs: u64,
    limit: usize,
    eof: bool,
}

impl Buffer {
    pub(crate) fn new(capacity: usize, limit: usize) -> Buffer {
        let cap = cmp::min(cmp::max(capacity, MIN_CAPACITY), limit);
        Buffer {
            data: vec![0; cap],
            start: 0,
            end: 0,
            abs: 0,
            limit,
            eof: false,
        }
    }

    /// The unconsumed bytes, starting at the current record base.
    pub(crate) fn window(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// True once the underlying reader returned end of input.
    pub(crate) fn eof(&self) -> bool {
        self.eof
    }

    /// Absolute input offset of the window base.
    pub(crate) fn abs(&self) -> u64 {
        self.abs
    }

    /// Drop `n` bytes from the front of the window.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(self.start + n <= self.end);
        self.start += n;
        self.abs += n as u64;
    }

    /// Pull more bytes from `rdr` into the window.
    pub(crate) fn fill<R: io::Read>(
        &mut self,
        rdr: &mut R,
    ) -> io::Result<Fill> {
        if self.eof {
            return Ok(Fill::Eof);
        }
        if self.end == self.data.len() {
            if self.start > 0 {
                self.data.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            } else {
                let grown = cmp::min(
                    cmp::max(self.data.len().saturating_mul(2), MIN_CAPACITY),
                    self.limit,
                );
                if grown <= self.data.len() {
                    return Ok(Fill::LimitReached);
                }
                self.data.resize(grown, 0);
            }
        }
        loop {
            match rdr.read(&mut self.data[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(Fill::Eof);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(Fill::Read(n));
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
