//! Concrete [`fish_vm::io::Io`] implementations over real stdin/stdout,
//! plus the PRNG seeding policy behind `--no-prng`.
//!
//! The VM core stays generic over `Io` so these decisions — byte vs.
//! UTF-8 input, where randomness comes from — live here instead of
//! being baked into the dispatch loop.

use std::io::{Read, Write};

use fish_vm::error::VmError;
use fish_vm::io::Io;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Whether `i` returns raw bytes (0-255) or decoded UTF-8 codepoints.
#[derive(Clone, Copy, Debug)]
pub enum InputMode {
    Byte,
    Utf8,
}

/// An [`Io`] backed by the process's real stdin and stdout.
pub struct StdIo {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
    mode: InputMode,
}

impl StdIo {
    pub fn new(mode: InputMode) -> Self {
        StdIo { stdin: std::io::stdin(), stdout: std::io::stdout(), mode }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, VmError> {
        let mut buf = [0u8; 1];
        let n = self.stdin.lock().read(&mut buf).map_err(VmError::Io)?;
        Ok(if n == 0 { None } else { Some(buf[0]) })
    }

    /// Decodes one UTF-8 scalar value from stdin, reading 1-4 bytes.
    fn read_utf8_unit(&mut self) -> Result<Option<i64>, VmError> {
        let first = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };
        let extra = match first {
            0x00..=0x7F => 0,
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            _ => return Err(VmError::InvalidUtf8),
        };
        let mut buf = vec![first];
        for _ in 0..extra {
            match self.read_byte()? {
                Some(b) => buf.push(b),
                None => return Err(VmError::InvalidUtf8),
            }
        }
        let decoded = std::str::from_utf8(&buf).map_err(|_| {
            warn!("malformed utf-8 on stdin: {buf:02x?}");
            VmError::InvalidUtf8
        })?;
        let ch = decoded.chars().next().ok_or(VmError::InvalidUtf8)?;
        Ok(Some(ch as i64))
    }
}

impl Io for StdIo {
    fn read_unit(&mut self) -> Result<i64, VmError> {
        let unit = match self.mode {
            InputMode::Byte => self.read_byte()?.map(|b| b as i64),
            InputMode::Utf8 => self.read_utf8_unit()?,
        };
        Ok(unit.unwrap_or(-1))
    }

    fn write_str(&mut self, s: &str) -> Result<(), VmError> {
        self.stdout.lock().write_all(s.as_bytes()).map_err(VmError::Io)
    }

    fn write_codepoint(&mut self, cp: u32) -> Result<(), VmError> {
        let ch = char::from_u32(cp).ok_or(VmError::InvalidOutputCodepoint(cp as i64))?;
        let mut buf = [0u8; 4];
        let encoded = ch.encode_utf8(&mut buf);
        self.stdout.lock().write_all(encoded.as_bytes()).map_err(VmError::Io)
    }
}

/// Builds the VM's PRNG under the `--no-prng` policy: `Some` seeds a
/// fresh [`StdRng`] from OS entropy, `None` makes the `x` mirror a
/// no-op.
pub fn rng_policy(disabled: bool) -> Option<StdRng> {
    if disabled {
        None
    } else {
        Some(StdRng::from_entropy())
    }
}
