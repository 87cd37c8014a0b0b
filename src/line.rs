//! Conversions between text lines and messages.

use processing_shim::Message;

/// Build a message from one input line.
///
/// Returns `None` for empty lines. With a non-empty `key_delim` the line is
/// split at the first delimiter into key and value; empty parts stay unset.
/// A negative `partition` lets the producer choose.
pub fn parse_line(line: &str, topic: &str, partition: i32, key_delim: &str) -> Option<Message> {
    if line.is_empty() {
        return None;
    }

    let mut message = Message {
        topic: topic.to_string(),
        partition: (partition >= 0).then_some(partition),
        ..Default::default()
    };

    if key_delim.is_empty() {
        message.value = line.as_bytes().to_vec();
        return Some(message);
    }

    let mut parts = line.splitn(2, key_delim);
    if let Some(key) = parts.next().filter(|k| !k.is_empty()) {
        message.key = Some(key.as_bytes().to_vec());
    }
    if let Some(value) = parts.next().filter(|v| !v.is_empty()) {
        message.value = value.as_bytes().to_vec();
    }

    Some(message)
}

/// Render a consumed message for output, without a trailing newline.
///
/// The key is printed before the value only when `key_delim` is set.
pub fn format_message(message: &Message, key_delim: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.value.len());
    if !key_delim.is_empty() {
        if let Some(key) = &message.key {
            out.extend_from_slice(key);
            out.extend_from_slice(key_delim.as_bytes());
        }
    }
    out.extend_from_slice(&message.value);
    out
}
