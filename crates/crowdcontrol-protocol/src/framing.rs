//! Splitting the controller's byte stream into messages.
//!
//! The controller writes one JSON object per request and usually ends it
//! with a NUL byte, but nothing on the wire guarantees that one socket read
//! returns exactly one message. [`MessageFramer`] buffers incoming bytes and
//! hands out one complete message at a time:
//!
//! - A complete JSON value is a message, terminated or not.
//! - NUL bytes and whitespace between messages are skipped.
//! - Text that isn't JSON is cut at the next NUL or newline and returned as
//!   a message anyway, so the caller can report it as unknown.
//! - An incomplete value stays buffered until more bytes arrive.
//!
//! The buffer is bounded twice over. A message longer than `max_len` is
//! discarded, and the buffer as a whole never needs to hold more than
//! [`MessageFramer::capacity`] bytes: callers read at most
//! [`MessageFramer::room`] bytes from their source, so a sender that outpaces
//! the reader is held back by the socket rather than by this buffer.

use serde::de::IgnoredAny;

use crate::ProtocolError;

/// How many maximum-size messages the buffer may hold at once.
const CAPACITY_FACTOR: usize = 2;

/// Accumulates inbound bytes and yields whole messages.
#[derive(Debug)]
pub struct MessageFramer {
    buf: Vec<u8>,
    max_len: usize,
}

impl MessageFramer {
    /// Creates an empty framer that rejects messages over `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_len,
        }
    }

    /// Appends freshly received bytes.
    ///
    /// The framer trusts the caller to stay within [`room`](Self::room);
    /// pushing past it only delays the next `MessageTooLarge`.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes waiting to be framed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Upper bound on buffered bytes for a caller that respects
    /// [`room`](Self::room).
    ///
    /// Twice `max_len`, so an incomplete message of up to `max_len` bytes
    /// always has space for the rest of itself to arrive.
    pub fn capacity(&self) -> usize {
        self.max_len.saturating_mul(CAPACITY_FACTOR)
    }

    /// How many more bytes may be pushed before the buffer is full.
    ///
    /// Zero means the caller should leave further input where it is (in
    /// the socket) until messages have been taken out.
    pub fn room(&self) -> usize {
        self.capacity().saturating_sub(self.buf.len())
    }

    /// Drops everything buffered, e.g. after the link was closed.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Takes the next complete message out of the buffer.
    ///
    /// Returns `Ok(None)` when no complete message is buffered yet.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MessageTooLarge`] when a message exceeds the
    /// limit. The offending bytes are dropped, so the next call starts fresh.
    pub fn next_message(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        self.skip_separators();
        if self.buf.is_empty() {
            return Ok(None);
        }

        let end = match self.complete_value_end() {
            Scan::Complete(end) => end,
            Scan::Incomplete => {
                if self.buf.len() > self.max_len {
                    let len = self.buf.len();
                    self.buf.clear();
                    return Err(ProtocolError::MessageTooLarge {
                        len,
                        max: self.max_len,
                    });
                }
                return Ok(None);
            }
            Scan::NotJson => self.next_delimiter().unwrap_or(self.buf.len()),
        };

        let message: Vec<u8> = self.buf.drain(..end).collect();
        if message.len() > self.max_len {
            return Err(ProtocolError::MessageTooLarge {
                len: message.len(),
                max: self.max_len,
            });
        }
        Ok(Some(message))
    }

    fn skip_separators(&mut self) {
        let start = self
            .buf
            .iter()
            .position(|&b| !is_separator(b))
            .unwrap_or(self.buf.len());
        self.buf.drain(..start);
    }

    /// Finds where the leading JSON value ends, without building it.
    fn complete_value_end(&self) -> Scan {
        let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<IgnoredAny>();
        match values.next() {
            Some(Ok(_)) => Scan::Complete(values.byte_offset()),
            Some(Err(e)) if e.is_eof() => Scan::Incomplete,
            Some(Err(_)) => Scan::NotJson,
            None => Scan::Incomplete,
        }
    }

    /// Position just past the next NUL or newline.
    fn next_delimiter(&self) -> Option<usize> {
        self.buf
            .iter()
            .position(|&b| b == 0 || b == b'\n')
            .map(|pos| pos + 1)
    }
}

enum Scan {
    Complete(usize),
    Incomplete,
    NotJson,
}

fn is_separator(b: u8) -> bool {
    b == 0 || b.is_ascii_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &[u8] = br#"{"id":3,"code":"give_stocks_3","parameters":["player_2",3]}"#;

    fn framer() -> MessageFramer {
        MessageFramer::new(4096)
    }

    #[test]
    fn test_empty_framer_has_no_message() {
        assert!(framer().next_message().unwrap().is_none());
    }

    #[test]
    fn test_nul_terminated_message() {
        let mut f = framer();
        f.push(REQUEST);
        f.push(b"\0");
        assert_eq!(f.next_message().unwrap().as_deref(), Some(REQUEST));
        assert!(f.next_message().unwrap().is_none());
        assert_eq!(f.buffered(), 0);
    }

    #[test]
    fn test_unterminated_message() {
        let mut f = framer();
        f.push(REQUEST);
        assert_eq!(f.next_message().unwrap().as_deref(), Some(REQUEST));
    }

    #[test]
    fn test_partial_message_waits_for_rest() {
        let mut f = framer();
        let (head, tail) = REQUEST.split_at(20);
        f.push(head);
        assert!(f.next_message().unwrap().is_none());
        assert_eq!(f.buffered(), head.len());

        f.push(tail);
        assert_eq!(f.next_message().unwrap().as_deref(), Some(REQUEST));
    }

    #[test]
    fn test_back_to_back_messages_come_out_one_at_a_time() {
        let mut f = framer();
        f.push(b"{\"id\":1}\0\n{\"id\":2}\0");
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":1}"[..]));
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":2}"[..]));
        assert!(f.next_message().unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_cut_at_delimiter() {
        let mut f = framer();
        f.push(b"hello there\0{\"id\":2}");
        assert_eq!(
            f.next_message().unwrap().as_deref(),
            Some(&b"hello there\0"[..])
        );
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":2}"[..]));
    }

    #[test]
    fn test_pretty_printed_json_is_one_message() {
        let pretty = b"{\n  \"id\": 4,\n  \"code\": 7,\n  \"parameters\": []\n}\n";
        let mut f = framer();
        f.push(pretty);
        assert_eq!(
            f.next_message().unwrap().as_deref(),
            Some(&pretty[..pretty.len() - 1])
        );
        assert!(f.next_message().unwrap().is_none());
    }

    #[test]
    fn test_trailing_junk_after_value_is_its_own_message() {
        let mut f = framer();
        f.push(b"{\"id\":1} junk\0");
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":1}"[..]));
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"junk\0"[..]));
        assert!(f.next_message().unwrap().is_none());
    }

    #[test]
    fn test_undelimited_garbage_is_one_message() {
        let mut f = framer();
        f.push(b"}}}");
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"}}}"[..]));
        assert_eq!(f.buffered(), 0);
    }

    #[test]
    fn test_oversized_partial_message_is_dropped() {
        let mut f = MessageFramer::new(16);
        f.push(b"{\"id\":1,\"code\":\"abcdefghijklmnop");
        assert!(matches!(
            f.next_message(),
            Err(ProtocolError::MessageTooLarge { max: 16, .. })
        ));
        assert_eq!(f.buffered(), 0);
        assert!(f.next_message().unwrap().is_none());
    }

    #[test]
    fn test_oversized_complete_message_is_dropped() {
        let mut f = MessageFramer::new(16);
        f.push(REQUEST);
        f.push(b"\0{\"id\":2}");
        assert!(matches!(
            f.next_message(),
            Err(ProtocolError::MessageTooLarge { .. })
        ));
        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":2}"[..]));
    }

    #[test]
    fn test_room_shrinks_as_messages_queue_up() {
        let mut f = MessageFramer::new(16);
        assert_eq!(f.capacity(), 32);
        assert_eq!(f.room(), 32);

        f.push(b"{\"id\":1}\0{\"id\":2}\0{\"id\":3}\0{\"id\":4}\0");
        assert_eq!(f.room(), 0);

        assert_eq!(f.next_message().unwrap().as_deref(), Some(&b"{\"id\":1}"[..]));
        assert_eq!(f.room(), 4);
    }

    #[test]
    fn test_clear_discards_buffer() {
        let mut f = framer();
        f.push(b"{\"id\":");
        f.clear();
        assert_eq!(f.buffered(), 0);
    }
}
