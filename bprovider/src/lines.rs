//! Byte-buffered line splitting for chunked response bodies.

/// Splits an incrementally-read byte stream into decoded text lines.
///
/// Buffering happens at the byte level: a multi-byte UTF-8 sequence split
/// across two network reads stays in the buffer until the newline that
/// completes its line arrives, so no read boundary can corrupt a character.
/// The sequence of lines is finite and non-restartable; `finish` flushes
/// whatever remains once the stream is exhausted.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one network read and drains every complete line it unlocked.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline_index).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        lines
    }

    /// Flushes the buffered partial line at end of stream, if any.
    ///
    /// Normal end-of-stream is not an error; a body that does not end in a
    /// newline still yields its final line here.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}
