//! Newline framing for chunked byte streams
//!
//! Reads from a pipe arrive in arbitrary chunks that have nothing to do with
//! line boundaries. [`LineFramer`] buffers the unterminated tail between
//! chunks and hands out complete lines, terminator excluded.

use bytes::{Bytes, BytesMut};

const NEWLINE: u8 = b'\n';

/// Turns a chunked byte stream into newline-delimited lines
///
/// There is no line length limit: a payload is always a single line, however
/// large. Bytes are never dropped or reordered while the stream is open.
///
/// # Example
///
/// ```
/// use slicer_protocol::LineFramer;
///
/// let mut framer = LineFramer::new();
/// assert_eq!(framer.feed(b"OK\nCAND").count(), 1);
///
/// let lines: Vec<_> = framer.feed(b"IDATES Zm9v\n").collect();
/// assert_eq!(&lines[0][..], b"CANDIDATES Zm9v");
/// ```
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
    /// Bytes of `buffer` already searched for a newline
    scanned: usize,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate over the lines it completes
    ///
    /// The iterator is lazy: lines not pulled from it stay buffered and are
    /// returned first by the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.buffer.extend_from_slice(chunk);
        Lines { framer: self }
    }

    /// Pop the next complete line, if the buffer holds one
    pub fn next_line(&mut self) -> Option<Bytes> {
        match self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == NEWLINE)
        {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut line = self.buffer.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Some(line.freeze())
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Number of buffered bytes not yet returned as a line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Close the framer, returning the unterminated remainder if there is one
    ///
    /// A dangling partial line is not a message; callers decide what to do
    /// with it (the client logs and drops it).
    pub fn finish(self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.freeze())
        }
    }
}

/// Lines completed by a [`LineFramer::feed`] call
#[derive(Debug)]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(framer: &mut LineFramer, chunk: &[u8]) -> Vec<Vec<u8>> {
        framer.feed(chunk).map(|line| line.to_vec()).collect()
    }

    #[test]
    fn test_single_chunk_multiple_lines() {
        let mut framer = LineFramer::new();
        let lines = collect(&mut framer, b"OK\nNODE e30=\n");
        assert_eq!(lines, vec![b"OK".to_vec(), b"NODE e30=".to_vec()]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let mut framer = LineFramer::new();
        assert!(collect(&mut framer, b"GRAPHS abc").is_empty());
        assert_eq!(framer.pending(), 10);

        let lines = collect(&mut framer, b"def\n");
        assert_eq!(lines, vec![b"GRAPHS abcdef".to_vec()]);
    }

    #[test]
    fn test_empty_lines_are_preserved() {
        let mut framer = LineFramer::new();
        let lines = collect(&mut framer, b"\n\nOK\n");
        assert_eq!(lines, vec![Vec::new(), Vec::new(), b"OK".to_vec()]);
    }

    #[test]
    fn test_carriage_return_is_not_stripped() {
        let mut framer = LineFramer::new();
        let lines = collect(&mut framer, b"OK\r\n");
        assert_eq!(lines, vec![b"OK\r".to_vec()]);
    }

    #[test]
    fn test_unconsumed_lines_survive_to_next_feed() {
        let mut framer = LineFramer::new();
        let first = framer.feed(b"A\nB\n").next().map(|l| l.to_vec());
        assert_eq!(first, Some(b"A".to_vec()));

        let rest = collect(&mut framer, b"C\n");
        assert_eq!(rest, vec![b"B".to_vec(), b"C".to_vec()]);
    }

    #[test]
    fn test_finish_returns_dangling_remainder() {
        let mut framer = LineFramer::new();
        let _ = collect(&mut framer, b"OK\nGRAPH trunc");
        assert_eq!(framer.finish().as_deref(), Some(&b"GRAPH trunc"[..]));

        let mut framer = LineFramer::new();
        let _ = collect(&mut framer, b"OK\n");
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_large_line_across_many_chunks() {
        let payload = vec![b'x'; 1 << 20];
        let mut framer = LineFramer::new();
        for chunk in payload.chunks(4096) {
            assert!(collect(&mut framer, chunk).is_empty());
        }
        let lines = collect(&mut framer, b"\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), payload.len());
    }

    proptest! {
        /// Property: splitting the stream at arbitrary points yields the same lines
        #[test]
        fn prop_chunking_invariance(
            data in proptest::collection::vec(prop_oneof![Just(b'\n'), any::<u8>()], 0..512),
            cuts in proptest::collection::vec(0usize..512, 0..16),
        ) {
            let mut whole = LineFramer::new();
            let expected = collect(&mut whole, &data);

            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(data.len())).collect();
            cuts.sort_unstable();

            let mut chunked = LineFramer::new();
            let mut actual = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(data.len())) {
                actual.extend(collect(&mut chunked, &data[start..cut]));
                start = cut;
            }

            prop_assert_eq!(actual, expected);
            prop_assert_eq!(chunked.pending(), whole.pending());
        }
    }
}
