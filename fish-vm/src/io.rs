//! The I/O seam between the VM core and the outside world.
//!
//! The core never touches `std::io` directly. `i`, `n`, and `o` go
//! through this trait instead, so stdin decoding policy (byte vs. UTF-8)
//! and PRNG seeding policy stay pluggable collaborators that `fish-io`
//! implements concretely and `fish-cli` wires up.

use crate::error::VmError;

/// The VM's view of the outside world: one input unit and two output
/// forms.
pub trait Io {
    /// Reads one input unit (a byte or a decoded codepoint, depending on
    /// the implementation) and returns it as an integer, or `-1` at EOF.
    fn read_unit(&mut self) -> Result<i64, VmError>;

    /// Writes a decimal-rendered number (the `n` instruction's payload)
    /// to the output.
    fn write_str(&mut self, s: &str) -> Result<(), VmError>;

    /// Writes a single Unicode codepoint, UTF-8 encoded, to the output
    /// (the `o` instruction's payload).
    fn write_codepoint(&mut self, cp: u32) -> Result<(), VmError>;
}
