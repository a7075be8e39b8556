//! Line splitting for scanner output

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Longest status line kept; anything beyond is cut off
const MAX_LINE_LEN: usize = 8 * 1024;

/// Splits scanner output on `\n` or `\r`
///
/// The scanner redraws its status line in place with `\r`, so both bytes
/// end a line. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Default)]
pub struct ScanLineCodec {
    // Bytes already searched for a terminator
    next_index: usize,
}

impl ScanLineCodec {
    /// Create a new line splitter
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_line(bytes: &[u8]) -> String {
    let bytes = &bytes[..bytes.len().min(MAX_LINE_LEN)];
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for ScanLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let offset = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r');

        match offset {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;
                let line = src.split_to(end + 1);
                Ok(Some(to_line(&line[..end])))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                self.next_index = 0;
                let rest = src.split_to(src.len());
                Ok(Some(to_line(&rest)))
            }
        }
    }
}
