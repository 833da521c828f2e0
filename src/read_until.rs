use std::io::{ErrorKind, Read};

/// Splits a byte stream into delimiter-terminated chunks.
///
/// Serial ports report an idle line as a timeout; those reads are retried and
/// whatever was already buffered is kept.
pub struct DelimitedReader<R> {
    reader: R,
    buf: Vec<u8>,
    until: Vec<u8>,
    /// Bytes of `buf` already searched for the delimiter
    scanned: usize,
    done: bool,
}

pub fn get_reader<R: Read>(reader: R, until: &[u8]) -> DelimitedReader<R> {
    DelimitedReader {
        reader,
        buf: Vec::new(),
        until: until.to_vec(),
        scanned: 0,
        done: false,
    }
}

impl<R: Read> DelimitedReader<R> {
    fn take_chunk(&mut self) -> Option<Vec<u8>> {
        // a delimiter may straddle the previous read
        let start = self.scanned.saturating_sub(self.until.len() - 1);
        let found = self.buf[start..]
            .windows(self.until.len())
            .position(|w| w == self.until);
        let Some(pos) = found.map(|p| start + p) else {
            self.scanned = self.buf.len();
            return None;
        };
        self.scanned = 0;
        let rest = self.buf.split_off(pos + self.until.len());
        let mut chunk = std::mem::replace(&mut self.buf, rest);
        chunk.truncate(pos);
        Some(chunk)
    }
}

impl<R: Read> Iterator for DelimitedReader<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.take_chunk() {
                return Some(Ok(chunk));
            }
            if self.done {
                return None;
            }
            let mut tmp = [0; 1024];
            match self.reader.read(&mut tmp) {
                Ok(0) => {
                    self.done = true;
                    if !self.buf.is_empty() {
                        self.scanned = 0;
                        return Some(Ok(std::mem::take(&mut self.buf)));
                    }
                }
                Ok(n) => self.buf.extend_from_slice(&tmp[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
