use std::borrow::Cow;

/// Splits an incoming byte stream into logical lines.
///
/// Chunks can end anywhere, even inside a multi-byte character, so the bytes
/// after the last newline are held back until the next chunk completes them.
#[derive(Debug, Default)]
pub struct LineDecoder {
    incomplete_line: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, carriage returns stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.incomplete_line.extend_from_slice(chunk);

        // Find last newline to ensure we only hand out complete lines
        let Some(last_newline_pos) = self.incomplete_line.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.incomplete_line.split_off(last_newline_pos + 1);
        let complete = std::mem::replace(&mut self.incomplete_line, rest);

        String::from_utf8_lossy(&complete)
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Text received after the last newline. Never emitted as a line.
    pub fn pending(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.incomplete_line)
    }
}
