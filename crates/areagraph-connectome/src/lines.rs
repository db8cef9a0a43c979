//! Line reader shared by the whitespace-delimited text formats.

use std::io::BufRead;
use std::str::Utf8Error;

/// Whether a raw line carries no data (`#` comment or whitespace only).
#[inline]
pub(crate) fn is_comment_or_blank(line: &[u8]) -> bool {
    match line.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(start) => line[start] == b'#',
        None => true,
    }
}

/// Malformed-row reason for a line that is not UTF-8.
pub(crate) fn not_utf8(err: Utf8Error) -> String {
    format!("row is not valid UTF-8 ({})", err)
}

/// Yields data lines with their 1-based line numbers, reusing one buffer.
///
/// A line that is not valid UTF-8 is still yielded, as `Err`, so callers can count it as
/// a malformed row and keep reading.
pub(crate) struct DataLines<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> DataLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }

    /// Next non-comment, non-blank line, or `None` at end of input.
    pub(crate) fn next_data_line(
        &mut self,
    ) -> std::io::Result<Option<(u64, Result<&str, Utf8Error>)>> {
        loop {
            self.buffer.clear();
            if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if !is_comment_or_blank(&self.buffer) {
                let text = std::str::from_utf8(&self.buffer).map(str::trim_end);
                return Ok(Some((self.line_number, text)));
            }
        }
    }

    pub(crate) fn line_number(&self) -> u64 {
        self.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_skips_comments_and_blanks() {
        let input = "# header\n\n   \n1 2 3\n  # indented comment\n4 5 6";
        let mut lines = DataLines::new(Cursor::new(input));
        assert_eq!(lines.next_data_line().unwrap(), Some((4, Ok("1 2 3"))));
        assert_eq!(lines.next_data_line().unwrap(), Some((6, Ok("4 5 6"))));
        assert_eq!(lines.next_data_line().unwrap(), None);
        assert_eq!(lines.line_number(), 6);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_reading() {
        let input: &[u8] = b"1 2 3\r\n4 \xff 6\n# caf\xe9\n7 8 9\n";
        let mut lines = DataLines::new(Cursor::new(input));
        assert_eq!(lines.next_data_line().unwrap(), Some((1, Ok("1 2 3"))));

        let (number, text) = lines.next_data_line().unwrap().unwrap();
        assert_eq!(number, 2);
        assert!(text.is_err());

        assert_eq!(lines.next_data_line().unwrap(), Some((4, Ok("7 8 9"))));
        assert_eq!(lines.next_data_line().unwrap(), None);
    }
}
