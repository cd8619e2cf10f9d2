//! Glyph classification: which of the seven instruction categories a
//! codepoint belongs to, and the literal value a NOUN glyph carries.
//!
//! The category tables are a direct transcription of the reference
//! interpreter's glyph dictionaries; codepoints not present in any of
//! them fall to [`Category::Other`], which is only ever valid while a
//! quote is open or a skip is pending.

/// The seven groups a code cell's codepoint can fall into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// `0`-`9`, `a`-`f`: push the corresponding value 0-15.
    Noun,
    /// `%`, `*`, `+`, `,`, `-`, `(`, `)`, `=`: binary stack operators.
    Dyadic,
    /// `$`, `:`, `@`, `[`, `]`, `l`, `r`, `{`, `}`, `~`: stack shape operators.
    Stack,
    /// `#`, `/`, `<`, `>`, `\`, `^`, `_`, `v`, `x`, `|`: direction changes.
    Mirror,
    /// NUL, space, and the lettered control instructions (`!&.;?ginop`).
    Control,
    /// `"`, `'`: toggle slurp (quote) mode.
    Quote,
    /// Anything else. Only legal as a no-op cell or inside a quote.
    Other,
}

/// Classifies a codepoint into its instruction category.
pub fn classify(codepoint: u32) -> Category {
    match codepoint {
        0x30..=0x39 | 0x61..=0x66 => Category::Noun,
        0x25 | 0x28 | 0x29 | 0x2a | 0x2b | 0x2c | 0x2d | 0x3d => Category::Dyadic,
        0x24 | 0x3a | 0x40 | 0x5b | 0x5d | 0x6c | 0x72 | 0x7b | 0x7d | 0x7e => Category::Stack,
        0x23 | 0x2f | 0x3c | 0x3e | 0x5c | 0x5e | 0x5f | 0x76 | 0x78 | 0x7c => Category::Mirror,
        0x00 | 0x20 | 0x21 | 0x26 | 0x2e | 0x3b | 0x3f | 0x67 | 0x69 | 0x6e | 0x6f | 0x70 => {
            Category::Control
        }
        0x22 | 0x27 => Category::Quote,
        _ => Category::Other,
    }
}

/// Decodes a NOUN glyph's codepoint into the integer it pushes (`0`-`9`
/// map to 0-9, `a`-`f` map to 10-15).
///
/// # Panics
/// If `codepoint` is not actually a NOUN; callers must check
/// [`classify`] first.
pub fn noun_value(codepoint: u32) -> i64 {
    match codepoint {
        0x30..=0x39 => (codepoint - 0x30) as i64,
        0x61..=0x66 => (codepoint - 0x61 + 10) as i64,
        _ => panic!("noun_value called on non-NOUN codepoint {codepoint:#x}"),
    }
}
