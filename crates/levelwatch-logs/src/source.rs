use std::io::{self, BufRead};

use levelwatch_types::decode_line;

/// Newline-delimited lines of a blocking reader
///
/// Bytes that are not valid UTF-8 are replaced rather than reported, so only
/// real I/O failures surface as errors.
pub fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').map(|line| line.map(decode_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_utf8_line_is_kept() {
        let input = io::Cursor::new(b"T level=info a\nT level=error caf\xe9\r\nT level=warn c".to_vec());
        let lines: Vec<String> = lossy_lines(input).map(|l| l.unwrap()).collect();

        assert_eq!(
            lines,
            vec!["T level=info a", "T level=error caf\u{FFFD}", "T level=warn c"]
        );
    }

    #[test]
    fn test_empty_lines_preserved() {
        let lines: Vec<String> = lossy_lines(io::Cursor::new(b"\n\nT level=info x\n".to_vec()))
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["", "", "T level=info x"]);
    }
}
