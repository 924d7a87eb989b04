pub mod decoder;

pub use decoder::{ StreamDecoder, StreamIncomplete };

/// Terminal sentinel frame. Emitted exactly once, after the last content
/// frame of a successfully completed stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Encodes one non-empty fragment as a self-delimiting content frame.
/// JSON escaping guarantees the payload can never contain the blank-line
/// frame delimiter.
pub fn content_frame(content: &str) -> String {
    format!("data: {}\n\n", serde_json::json!({ "content": content }))
}
