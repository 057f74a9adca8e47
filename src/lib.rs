//! Serde-compatible decoder for the Bencode format used by BitTorrent
//! metainfo files.
//!
//! The target shape is described by a `serde::Deserialize` impl; the decoder
//! tokenizes the input buffer and drives that impl directly, so byte strings
//! can be borrowed zero-copy (`&[u8]`, `&str`), unknown dictionary keys are
//! skipped without being materialized, and a failed decode never leaks a
//! partial result.
//!
//! Encoding back to bencode is out of scope for this crate.

pub mod constants;
pub mod decode;
pub mod error;
pub mod options;
pub mod value;

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use crate::decode::Deserializer;
pub use crate::error::{Error, ErrorKind};
pub use crate::options::DecodeOptions;
pub use crate::value::Value;

pub type Result<T> = std::result::Result<T, Error>;

/// Decodes one bencode value from a byte buffer.
///
/// Borrowed fields in `T` alias the input buffer and share its lifetime.
/// Trailing bytes after the value fail with [`ErrorKind::TrailingData`].
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Entry<'a> {
///     name: &'a str,
///     sizes: Vec<i64>,
/// }
///
/// let entry: Entry =
///     serde_bencode::from_slice(b"d4:name4:spam5:sizesli1ei2eee").unwrap();
/// assert_eq!(entry.name, "spam");
/// assert_eq!(entry.sizes, vec![1, 2]);
/// ```
pub fn from_slice<'de, T: Deserialize<'de>>(input: &'de [u8]) -> Result<T> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options<'de, T: Deserialize<'de>>(
    input: &'de [u8],
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_slice(input, options)
}

/// Reads the reader to its end, then decodes. Bencode is not decoded
/// incrementally; the whole input must be in memory first.
pub fn from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<T> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<T: DeserializeOwned, R: Read>(
    reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_reader(reader, options)
}

/// Decodes into the untyped [`Value`] tree.
pub fn decode_to_value(input: &[u8]) -> Result<Value> {
    decode_to_value_with_options(input, &DecodeOptions::default())
}

pub fn decode_to_value_with_options(input: &[u8], options: &DecodeOptions) -> Result<Value> {
    decode::from_slice(input, options)
}

/// Checks that the input is exactly one well-formed bencode value without
/// building anything.
pub fn validate_slice(input: &[u8]) -> Result<()> {
    validate_slice_with_options(input, &DecodeOptions::default())
}

pub fn validate_slice_with_options(input: &[u8], options: &DecodeOptions) -> Result<()> {
    decode::validate_slice(input, options)
}
