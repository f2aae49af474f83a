//! Compress and expand Doom 64 WAD archives
//!
//! The N64 port stores most of its lumps compressed with one of two codecs:
//! an adaptive-tree coder for maps, demos, textures, and flats (`deflate`),
//! and a flag-byte LZSS inherited from the Jaguar port for sprites and
//! graphics (`jaguar`).  The `wad` module reads the archive directory,
//! routes each lump to the right codec, and writes archives back out with
//! the four-byte lump alignment the game expects.

mod tools;
pub mod deflate;
pub mod jaguar;
pub mod wad;

/// Errors surfaced while transforming lumps or archives
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("archive directory out of bounds")]
    BadDirectory,
    #[error("output would exceed the declared lump size")]
    OutputOverflow,
    #[error("input ended before the end-of-stream code")]
    InputExhausted,
    #[error("decoded symbol out of range")]
    InvalidSymbol,
    #[error("back reference outside decoded history")]
    BadBackReference
}
