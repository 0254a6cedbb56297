//! Incremental UTF-8 decoding.
//!
//! The parser feeds bytes one at a time and may be handed a multibyte
//! character split across `advance` calls, so decoding state persists on
//! the decoder. Invalid input produces U+FFFD and resynchronizes at the
//! next lead byte: a stray continuation or invalid lead is replaced, and
//! a truncated sequence is replaced before the interrupting byte is
//! reprocessed from scratch.

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// More continuation bytes are needed.
    Pending,
    /// A complete scalar value was decoded.
    Emit(char),
    /// The byte is invalid where it stands: emit U+FFFD in place of the
    /// aborted sequence, then feed this byte again (it may start a new
    /// sequence or be a control).
    Rejected,
}

/// Streaming UTF-8 decoder with replacement-character error recovery.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    buf: [u8; 4],
    len: u8,
    want: u8,
}

impl Utf8Decoder {
    /// Create an idle decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a multibyte sequence is in flight.
    #[must_use]
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.want != 0
    }

    /// Drop any in-flight sequence.
    pub fn reset(&mut self) {
        self.len = 0;
        self.want = 0;
    }

    /// Feed one byte.
    ///
    /// ASCII bytes are the caller's fast path; passing one here while idle
    /// simply emits it.
    pub fn push(&mut self, byte: u8) -> Utf8Step {
        if self.want == 0 {
            return match byte {
                0x00..=0x7F => Utf8Step::Emit(char::from(byte)),
                0xC2..=0xDF => self.start(byte, 2),
                0xE0..=0xEF => self.start(byte, 3),
                0xF0..=0xF4 => self.start(byte, 4),
                // Stray continuation byte or invalid lead (0xC0, 0xC1,
                // 0xF5..): replace it.
                _ => Utf8Step::Emit(char::REPLACEMENT_CHARACTER),
            };
        }

        if (0x80..=0xBF).contains(&byte) {
            self.buf[usize::from(self.len)] = byte;
            self.len += 1;
            if self.len < self.want {
                return Utf8Step::Pending;
            }
            let complete = &self.buf[..usize::from(self.len)];
            let decoded = std::str::from_utf8(complete)
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            self.reset();
            Utf8Step::Emit(decoded)
        } else {
            // Sequence truncated by a non-continuation byte.
            self.reset();
            Utf8Step::Rejected
        }
    }

    fn start(&mut self, byte: u8, want: u8) -> Utf8Step {
        self.buf[0] = byte;
        self.len = 1;
        self.want = want;
        Utf8Step::Pending
    }
}
