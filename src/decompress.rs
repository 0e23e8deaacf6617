//! Transparent gzip decompression of artifacts.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::{HuginnError, Result};

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `data` starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Inflate gzip-framed data; anything else is returned as-is.
///
/// Data carrying the magic but failing to inflate is an error.
///
/// ```rust
/// let plain = huginn::decompress::decompress(b"<testsuite/>").unwrap();
/// assert_eq!(&*plain, b"<testsuite/>");
/// ```
pub fn decompress(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_gzip(data) {
        return Ok(Cow::Borrowed(data));
    }
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(HuginnError::Decompress)?;
    Ok(Cow::Owned(out))
}
