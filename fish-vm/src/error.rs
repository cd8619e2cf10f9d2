//! Fatal interpreter errors.
//!
//! Every variant here is unrecoverable: the VM never catches its own
//! errors, it only ever propagates them up to whatever is driving it
//! (see `fish-cli`, which turns any of these into the single literal
//! fatal message required of the interpreter).

/// A fatal error raised while running a ><> program.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// `,` with a zero divisor.
    #[error("division by zero")]
    DivByZero,

    /// A pop (or any operation that pops, such as `:`, `$`, `@`, `{`, `}`,
    /// `~`) was attempted on an empty current stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// `[` requested more elements than the current stack holds, or a
    /// negative element count.
    #[error("stack underflow during split")]
    StackUnderflowSplit,

    /// An OTHER-category codepoint was encountered as code outside of
    /// skip/slurp mode.
    #[error("invalid instruction: {0:#x}")]
    InvalidInstruction(u32),

    /// `o` was given a negative value or one that is not a valid Unicode
    /// codepoint.
    #[error("invalid output codepoint: {0}")]
    InvalidOutputCodepoint(i64),

    /// Malformed UTF-8 encountered on stdin in `-u` mode.
    #[error("invalid utf-8 on stdin")]
    InvalidUtf8,

    /// A file read, stdin read, or stdout write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
