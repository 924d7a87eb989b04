use serde::Deserialize;
use std::error::Error;
use std::fmt;

#[derive(Deserialize)]
struct ContentPayload {
    content: String,
}

/// The byte stream ended before the terminal sentinel arrived. Whatever text
/// was accumulated is partial output, not a completed generation.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamIncomplete {
    pub partial_text: String,
}

impl fmt::Display for StreamIncomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream ended without terminal sentinel")
    }
}

impl Error for StreamIncomplete {}

/// Incremental decoder for the frame stream produced by the generate
/// endpoint. Frames may arrive split across arbitrary byte boundaries; bytes
/// that do not yet form a complete frame are carried over to the next `feed`.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    carry: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one network chunk. Chunk boundaries carry no meaning: only
    /// complete `\n\n`-terminated frames are processed, the trailing partial
    /// frame is retained. Everything after the terminal sentinel is ignored.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.done {
            return;
        }
        self.carry.extend_from_slice(chunk);

        while let Some(pos) = find_delimiter(&self.carry) {
            let frame: Vec<u8> = self.carry.drain(..pos + 2).collect();
            if let Ok(frame_str) = std::str::from_utf8(&frame[..pos]) {
                self.handle_frame(frame_str);
            }
            if self.done {
                self.carry.clear();
                return;
            }
        }
    }

    fn handle_frame(&mut self, frame: &str) {
        for line in frame.lines() {
            if let Some(data) = line.strip_prefix("data: ") {
                if data == "[DONE]" {
                    self.done = true;
                    return;
                }
                if let Ok(payload) = serde_json::from_str::<ContentPayload>(data) {
                    self.text.push_str(&payload.content);
                }
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Call once the byte stream has ended. Success only if the terminal
    /// sentinel was seen; a premature close yields the partial text as an
    /// error so callers cannot mistake truncated output for a completed one.
    pub fn finish(self) -> Result<String, StreamIncomplete> {
        if self.done {
            Ok(self.text)
        } else {
            Err(StreamIncomplete { partial_text: self.text })
        }
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}
