//! Owned copies of NUL-terminated strings out of a byte region.

use alloc::string::String;
use alloc::vec::Vec;

use crate::bytes;
use crate::error::ElfError;

/// A string copied out of a region by [`extract_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// The string, without its terminator.
    pub text: String,
    /// Bytes accounted for, terminator included. Adding this to the start
    /// offset gives the start of the next string in the region.
    pub consumed: usize,
}

/// Copies the string starting at `start` up to the next NUL or `bound`.
///
/// `consumed` always counts one terminator byte, even when the scan stopped
/// at `bound` rather than at a NUL, so a cursor advanced by it moves past
/// `bound` once the region is exhausted.
///
/// Invalid UTF-8 is replaced with `U+FFFD`.
///
/// # Errors
///
/// - [`ElfError::InsufficientSize`] if `bound` exceeds the buffer.
/// - [`ElfError::OutOfRange`] if `start >= bound`.
/// - [`ElfError::AllocationFailure`] if the copy cannot be allocated.
pub fn extract_at(buffer: &[u8], start: usize, bound: usize) -> Result<Extracted, ElfError> {
    if bound > buffer.len() {
        return Err(ElfError::InsufficientSize);
    }
    if start >= bound {
        return Err(ElfError::OutOfRange);
    }
    let region = &buffer[start..bound];
    let len = region.iter().position(|&b| b == 0).unwrap_or(region.len());
    let text = owned_text(region, len)?;
    Ok(Extracted {
        text,
        consumed: len + 1,
    })
}

/// Copies a NUL-terminated string of unknown length.
///
/// The end of the slice is treated as the terminator if no NUL is found.
///
/// # Errors
///
/// - [`ElfError::NullInput`] if `src` is absent.
/// - [`ElfError::AllocationFailure`] if the copy cannot be allocated.
pub fn duplicate(src: Option<&[u8]>) -> Result<String, ElfError> {
    let src = src.ok_or(ElfError::NullInput)?;
    let len = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    owned_text(src, len)
}

fn owned_text(src: &[u8], len: usize) -> Result<String, ElfError> {
    let mut raw = Vec::new();
    raw.try_reserve_exact(len)?;
    raw.resize(len, 0);
    bytes::copy(&mut raw, src, len)?;
    Ok(String::from_utf8(raw)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}
