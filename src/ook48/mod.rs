//! OOK48: GPS-synchronous on-off keying, one character per 8-symbol frame
//! using a 4-of-8 constant-weight alphabet.

pub mod decoder;
pub mod encoder;
pub mod tables;

pub use decoder::{FrameDecode, Ook48Decoder, Ook48Outcome};
pub use encoder::{compile_message, KeyStream, KeyTick, LOCATOR_TOKEN};
