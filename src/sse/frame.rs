/// One server-sent event, as delimited by a blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event_type: Option<String>,
    pub data: String,
}

/// Incremental SSE frame parser.
///
/// Only the last `data:` line before the terminating blank line is kept;
/// the servers this talks to never split a payload across lines.
#[derive(Debug, Default)]
pub struct FrameParser {
    current_event_type: Option<String>,
    current_data: Option<String>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its newline). Returns a frame when the line completes one.
    pub fn push_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            // Blank keep-alives with no data line produce nothing
            let event_type = self.current_event_type.take();
            let data = self.current_data.take()?;
            return Some(Frame { event_type, data });
        }

        if let Some(value) = line.strip_prefix("event:") {
            self.current_event_type = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            self.current_data = Some(value.trim().to_string());
        }

        None
    }

    /// Drop any partially accumulated frame.
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.current_data = None;
    }

    pub fn has_partial(&self) -> bool {
        self.current_event_type.is_some() || self.current_data.is_some()
    }
}

/// Parse a complete sequence of lines into frames.
///
/// A trailing frame with no terminating blank line is discarded.
pub fn parse_frames<I, S>(lines: I) -> Vec<Frame>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = FrameParser::new();
    lines
        .into_iter()
        .filter_map(|line| parser.push_line(line.as_ref()))
        .collect()
}
