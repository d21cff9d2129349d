use crate::{ContentSequence, ContentUnit, Result};

/// Reads UTF-8 text, producing one text block per line.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. Terminators are removed; any other
/// whitespace is kept as read.
///
/// An empty payload yields an empty sequence. No fallback encodings are attempted.
pub fn read_txt(bytes: &[u8]) -> Result<ContentSequence> {
    let text = std::str::from_utf8(bytes)?;

    let units = split_lines(text)
        .into_iter()
        .enumerate()
        .map(|(index, line)| ContentUnit::text(line, index))
        .collect();

    Ok(ContentSequence::flow(units))
}

/// A terminator at the very end does not start another line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find(|c: char| c == '\r' || c == '\n') {
        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn one_block_per_line() {
        let sequence = read_txt(b"a\nb  \r\n\nc").unwrap();
        let texts: Vec<_> = sequence.text_blocks().map(|b| (b.text.as_str(), b.origin_index)).collect();
        assert_eq!(texts, vec![("a", 0), ("b  ", 1), ("", 2), ("c", 3)]);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let sequence = read_txt(b"a\rb\r\nc\r").unwrap();
        let texts: Vec<_> = sequence.text_blocks().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);

        assert_eq!(split_lines("\r\n\r"), vec!["", ""]);
        assert_eq!(split_lines("x\n"), vec!["x"]);
    }

    #[test]
    fn empty_file_has_no_lines() {
        assert!(read_txt(b"").unwrap().units.is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_failure() {
        assert!(matches!(read_txt(&[0x66, 0xff, 0x6f]), Err(Error::EncodingFailure(_))));
    }
}
