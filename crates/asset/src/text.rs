//! Line reading for the text formats. Exporters often leave Latin-1 bytes in
//! comments and names, so invalid UTF-8 is replaced instead of rejected.

use std::io::{self, BufRead};

pub(crate) struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

/// Like [`BufRead::lines`], but never fails on encoding.
pub(crate) fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                Some(Ok(String::from_utf8_lossy(line).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_lf_and_crlf() {
        let lines: Vec<String> = lossy_lines(&b"a\r\nb\nc"[..])
            .collect::<io::Result<_>>()
            .expect("read lines");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn latin1_bytes_are_replaced() {
        let lines: Vec<String> = lossy_lines(&b"# \xA9 2007\nnext\n"[..])
            .collect::<io::Result<_>>()
            .expect("read lines");
        assert_eq!(lines, vec!["# \u{FFFD} 2007", "next"]);
    }
}
