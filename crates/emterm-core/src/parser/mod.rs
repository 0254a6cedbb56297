//! VT sequence parser.
//!
//! A byte-oriented state machine over the standard VT500-series parse
//! table: ground text, escape sequences, CSI with parameters and
//! intermediates, OSC/DCS/SOS/PM/APC strings. Recognized input is
//! dispatched through the [`ActionSink`] trait; malformed input is
//! silently dropped and the machine resynchronizes. The parser holds no
//! screen state and never allocates on the per-byte path, so feeding a
//! byte stream in arbitrary chunks produces identical dispatches.
//!
//! C1 controls (0x80-0x9F) are accepted as their 7-bit `ESC x`
//! equivalents outside of string payloads; inside OSC/DCS/APC payloads
//! only 0x9C (ST) terminates, so multibyte UTF-8 string content passes
//! through untouched.

mod utf8;

pub use utf8::{Utf8Decoder, Utf8Step};

/// Parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum State {
    /// Printable text and C0 controls.
    #[default]
    Ground,
    /// After ESC.
    Escape,
    /// ESC with intermediates collected.
    EscapeIntermediate,
    /// After CSI.
    CsiEntry,
    /// CSI parameter bytes.
    CsiParam,
    /// CSI intermediate bytes.
    CsiIntermediate,
    /// Malformed CSI; consume until the final byte.
    CsiIgnore,
    /// OSC string payload.
    OscString,
    /// After DCS.
    DcsEntry,
    /// DCS parameter bytes.
    DcsParam,
    /// DCS intermediate bytes.
    DcsIntermediate,
    /// DCS payload, streamed to the sink.
    DcsPassthrough,
    /// Malformed DCS; consume until the string terminator.
    DcsIgnore,
    /// SOS, PM, or APC string payload.
    SosPmApcString,
}

/// Receiver for parsed actions.
///
/// The dispatch set is closed: the screen buffer switches on the final
/// byte rather than on an open-ended polymorphic action type. `dcs_*` and
/// `apc_*` default to no-ops since most sinks ignore those strings.
pub trait ActionSink {
    /// A printable character (decoded from UTF-8 where applicable).
    fn print(&mut self, c: char);
    /// A C0 control byte.
    fn execute(&mut self, byte: u8);
    /// A complete CSI sequence.
    fn csi_dispatch(&mut self, params: &[u16], intermediates: &[u8], final_byte: u8);
    /// A complete non-CSI escape sequence.
    fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8);
    /// A complete OSC string, split at `;`.
    fn osc_dispatch(&mut self, params: &[&[u8]]);
    /// A DCS sequence header was recognized; payload follows via
    /// [`ActionSink::dcs_put`].
    fn dcs_hook(&mut self, _params: &[u16], _intermediates: &[u8], _final_byte: u8) {}
    /// One DCS payload byte.
    fn dcs_put(&mut self, _byte: u8) {}
    /// The DCS string ended (or was aborted).
    fn dcs_unhook(&mut self) {}
    /// A SOS/PM/APC string started.
    fn apc_start(&mut self) {}
    /// One SOS/PM/APC payload byte.
    fn apc_put(&mut self, _byte: u8) {}
    /// The SOS/PM/APC string ended (or was aborted).
    fn apc_end(&mut self) {}
}

/// Maximum collected CSI/DCS parameters; excess parameters are dropped.
const MAX_PARAMS: usize = 32;
/// Maximum collected intermediates; sequences needing more are rare and
/// the excess is ignored.
const MAX_INTERMEDIATES: usize = 2;
/// OSC payload cap, bounding memory against unterminated strings.
const MAX_OSC_LEN: usize = 4096;

/// The VT parser state machine.
#[derive(Debug, Default)]
pub struct Parser {
    state: State,
    params: [u16; MAX_PARAMS],
    num_params: usize,
    current_param: Option<u16>,
    intermediates: [u8; MAX_INTERMEDIATES],
    num_intermediates: usize,
    osc_buf: Vec<u8>,
    utf8: Utf8Decoder,
}

impl Parser {
    /// Create a parser in the ground state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state (exposed for tests and fuzzing).
    #[must_use]
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Return to the ground state, dropping any partial sequence.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.clear_sequence();
        self.osc_buf.clear();
        self.utf8.reset();
    }

    /// Feed a chunk of bytes, dispatching recognized actions to `sink`.
    ///
    /// Chunk boundaries are invisible: splitting a stream at any byte
    /// yields the same dispatches as feeding it whole.
    pub fn advance<S: ActionSink>(&mut self, bytes: &[u8], sink: &mut S) {
        for &byte in bytes {
            self.step(byte, sink);
        }
    }

    fn step<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        // A multibyte character in flight consumes continuations first.
        if self.utf8.is_pending() {
            match self.utf8.push(byte) {
                Utf8Step::Pending => return,
                Utf8Step::Emit(c) => {
                    sink.print(c);
                    return;
                }
                Utf8Step::Rejected => {
                    sink.print(char::REPLACEMENT_CHARACTER);
                    // Fall through: the byte is reprocessed from scratch.
                }
            }
        }

        let in_string = matches!(
            self.state,
            State::OscString | State::DcsPassthrough | State::DcsIgnore | State::SosPmApcString
        );

        match byte {
            0x1B => {
                self.finish_string(sink);
                self.clear_sequence();
                self.state = State::Escape;
                return;
            }
            0x18 | 0x1A => {
                if self.state != State::Ground {
                    self.abort_string(sink);
                    self.state = State::Ground;
                    if byte == 0x1A {
                        sink.print(char::REPLACEMENT_CHARACTER);
                    }
                } else {
                    sink.execute(byte);
                }
                return;
            }
            0x80..=0x9F if !in_string => {
                self.c1(byte, sink);
                return;
            }
            0x9C if in_string => {
                // ST terminates string payloads; other C1 bytes inside a
                // string are content (UTF-8 continuations).
                self.finish_string(sink);
                self.state = State::Ground;
                return;
            }
            _ => {}
        }

        match self.state {
            State::Ground => self.ground(byte, sink),
            State::Escape => self.escape(byte, sink),
            State::EscapeIntermediate => self.escape_intermediate(byte, sink),
            State::CsiEntry => self.csi_entry(byte, sink),
            State::CsiParam => self.csi_param(byte, sink),
            State::CsiIntermediate => self.csi_intermediate(byte, sink),
            State::CsiIgnore => self.csi_ignore(byte, sink),
            State::OscString => self.osc_string(byte, sink),
            State::DcsEntry => self.dcs_entry(byte, sink),
            State::DcsParam => self.dcs_param(byte, sink),
            State::DcsIntermediate => self.dcs_intermediate(byte, sink),
            State::DcsPassthrough => self.dcs_passthrough(byte, sink),
            State::DcsIgnore => {}
            State::SosPmApcString => self.sos_pm_apc(byte, sink),
        }
    }

    // ------------------------------------------------------------------
    // State handlers
    // ------------------------------------------------------------------

    fn ground<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            0x20..=0x7E => sink.print(char::from(byte)),
            0x7F => {}
            _ => match self.utf8.push(byte) {
                Utf8Step::Emit(c) => sink.print(c),
                Utf8Step::Pending | Utf8Step::Rejected => {}
            },
        }
    }

    fn escape<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::EscapeIntermediate;
            }
            b'[' => {
                self.clear_sequence();
                self.state = State::CsiEntry;
            }
            b']' => {
                self.osc_buf.clear();
                self.state = State::OscString;
            }
            b'P' => {
                self.clear_sequence();
                self.state = State::DcsEntry;
            }
            b'X' | b'^' | b'_' => {
                self.state = State::SosPmApcString;
                sink.apc_start();
            }
            0x30..=0x7E => {
                self.state = State::Ground;
                sink.esc_dispatch(self.intermediates(), byte);
            }
            _ => {}
        }
    }

    fn escape_intermediate<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            0x20..=0x2F => self.collect(byte),
            0x30..=0x7E => {
                self.state = State::Ground;
                sink.esc_dispatch(self.intermediates(), byte);
            }
            _ => self.state = State::Ground,
        }
    }

    fn csi_entry<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            b'0'..=b'9' => {
                self.param_digit(byte);
                self.state = State::CsiParam;
            }
            b';' | b':' => {
                self.param_separator();
                self.state = State::CsiParam;
            }
            0x3C..=0x3F => self.collect(byte),
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => {}
        }
    }

    fn csi_param<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            b'0'..=b'9' => self.param_digit(byte),
            b';' | b':' => self.param_separator(),
            0x3C..=0x3F => self.state = State::CsiIgnore,
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => {}
        }
    }

    fn csi_intermediate<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            0x20..=0x2F => self.collect(byte),
            0x30..=0x3F => self.state = State::CsiIgnore,
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => {}
        }
    }

    fn csi_ignore<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => sink.execute(byte),
            0x40..=0x7E => self.state = State::Ground,
            _ => {}
        }
    }

    fn osc_string<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x07 => {
                self.finish_string(sink);
                self.state = State::Ground;
            }
            0x00..=0x06 | 0x08..=0x1F => {}
            _ => {
                if self.osc_buf.len() < MAX_OSC_LEN {
                    self.osc_buf.push(byte);
                }
            }
        }
    }

    fn dcs_entry<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => {}
            b'0'..=b'9' => {
                self.param_digit(byte);
                self.state = State::DcsParam;
            }
            b';' | b':' => {
                self.param_separator();
                self.state = State::DcsParam;
            }
            0x3C..=0x3F => self.collect(byte),
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7E => self.hook_dcs(byte, sink),
            _ => {}
        }
    }

    fn dcs_param<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => {}
            b'0'..=b'9' => self.param_digit(byte),
            b';' | b':' => self.param_separator(),
            0x3C..=0x3F => self.state = State::DcsIgnore,
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7E => self.hook_dcs(byte, sink),
            _ => {}
        }
    }

    fn dcs_intermediate<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x00..=0x1F => {}
            0x20..=0x2F => self.collect(byte),
            0x30..=0x3F => self.state = State::DcsIgnore,
            0x40..=0x7E => self.hook_dcs(byte, sink),
            _ => {}
        }
    }

    fn dcs_passthrough<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        if byte != 0x7F {
            sink.dcs_put(byte);
        }
    }

    fn sos_pm_apc<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        if byte >= 0x20 && byte != 0x7F {
            sink.apc_put(byte);
        }
    }

    // ------------------------------------------------------------------
    // Shared pieces
    // ------------------------------------------------------------------

    /// Handle a C1 control outside string payloads.
    fn c1<S: ActionSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x90 => {
                self.clear_sequence();
                self.state = State::DcsEntry;
            }
            0x9B => {
                self.clear_sequence();
                self.state = State::CsiEntry;
            }
            0x9D => {
                self.osc_buf.clear();
                self.state = State::OscString;
            }
            0x98 | 0x9E | 0x9F => {
                self.state = State::SosPmApcString;
                sink.apc_start();
            }
            0x9C => self.state = State::Ground,
            _ => {
                // Single-character C1 (IND, NEL, HTS, RI, ...) behaves
                // like its ESC Fe equivalent.
                self.state = State::Ground;
                sink.esc_dispatch(&[], byte - 0x40);
            }
        }
    }

    /// Close an in-flight string payload, dispatching what was collected.
    fn finish_string<S: ActionSink>(&mut self, sink: &mut S) {
        match self.state {
            State::OscString => self.dispatch_osc(sink),
            State::DcsPassthrough => sink.dcs_unhook(),
            State::SosPmApcString => sink.apc_end(),
            _ => {}
        }
    }

    /// Abort an in-flight string payload, dropping what was collected.
    fn abort_string<S: ActionSink>(&mut self, sink: &mut S) {
        match self.state {
            State::OscString => self.osc_buf.clear(),
            State::DcsPassthrough => sink.dcs_unhook(),
            State::SosPmApcString => sink.apc_end(),
            _ => {}
        }
    }

    fn dispatch_osc<S: ActionSink>(&mut self, sink: &mut S) {
        let parts: Vec<&[u8]> = self.osc_buf.split(|&b| b == b';').collect();
        sink.osc_dispatch(&parts);
        self.osc_buf.clear();
    }

    fn dispatch_csi<S: ActionSink>(&mut self, final_byte: u8, sink: &mut S) {
        self.flush_param();
        self.state = State::Ground;
        let (params, intermediates) = (
            &self.params[..self.num_params],
            &self.intermediates[..self.num_intermediates],
        );
        sink.csi_dispatch(params, intermediates, final_byte);
    }

    fn hook_dcs<S: ActionSink>(&mut self, final_byte: u8, sink: &mut S) {
        self.flush_param();
        self.state = State::DcsPassthrough;
        let (params, intermediates) = (
            &self.params[..self.num_params],
            &self.intermediates[..self.num_intermediates],
        );
        sink.dcs_hook(params, intermediates, final_byte);
    }

    fn param_digit(&mut self, byte: u8) {
        let digit = u16::from(byte - b'0');
        let value = self.current_param.unwrap_or(0);
        self.current_param = Some(value.saturating_mul(10).saturating_add(digit));
    }

    fn param_separator(&mut self) {
        let value = self.current_param.take().unwrap_or(0);
        self.push_param(value);
    }

    fn flush_param(&mut self) {
        if let Some(value) = self.current_param.take() {
            self.push_param(value);
        }
    }

    fn push_param(&mut self, value: u16) {
        if self.num_params < MAX_PARAMS {
            self.params[self.num_params] = value;
            self.num_params += 1;
        }
    }

    fn collect(&mut self, byte: u8) {
        if self.num_intermediates < MAX_INTERMEDIATES {
            self.intermediates[self.num_intermediates] = byte;
            self.num_intermediates += 1;
        }
    }

    fn intermediates(&self) -> &[u8] {
        &self.intermediates[..self.num_intermediates]
    }

    fn clear_sequence(&mut self) {
        self.num_params = 0;
        self.current_param = None;
        self.num_intermediates = 0;
    }
}
