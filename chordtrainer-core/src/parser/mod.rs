//! Notation parsers: Roman numerals and chord symbols

pub mod chord_symbol;
pub mod error;
pub mod roman_numeral;

pub use chord_symbol::parse_chord_symbol;
pub use error::ParseError;
pub use roman_numeral::{ResolveOptions, RomanNumeral};
