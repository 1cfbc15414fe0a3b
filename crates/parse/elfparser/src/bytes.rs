//! Bounded byte copy and comparison primitives.
//!
//! Every multi-byte field in the decoders passes through [`copy`] or
//! [`reverse_copy`]: little-endian fields are copied straight into a
//! little-endian temporary, big-endian fields are copied reversed, so the
//! temporary can always be read with `from_le_bytes` regardless of host.

use crate::error::ElfError;

/// Copies the first `len` bytes of `src` into the start of `dest`.
///
/// # Errors
///
/// Returns [`ElfError::CopyFailure`] if either slice is shorter than `len`.
pub fn copy(dest: &mut [u8], src: &[u8], len: usize) -> Result<(), ElfError> {
    let (Some(dest), Some(src)) = (dest.get_mut(..len), src.get(..len)) else {
        return Err(ElfError::CopyFailure);
    };
    dest.copy_from_slice(src);
    Ok(())
}

/// Copies the first `len` bytes of `src` into `dest` in reverse order.
///
/// The last source byte becomes the first destination byte. Applying the
/// copy twice yields the original bytes.
///
/// # Errors
///
/// Returns [`ElfError::CopyFailure`] if either slice is shorter than `len`.
pub fn reverse_copy(dest: &mut [u8], src: &[u8], len: usize) -> Result<(), ElfError> {
    let (Some(dest), Some(src)) = (dest.get_mut(..len), src.get(..len)) else {
        return Err(ElfError::CopyFailure);
    };
    for (d, s) in dest.iter_mut().zip(src.iter().rev()) {
        *d = *s;
    }
    Ok(())
}

/// Compares the first `len` bytes of two regions.
///
/// Returns `0` when equal, otherwise `a[i] - b[i]` for the first differing
/// byte pair.
///
/// # Errors
///
/// Returns [`ElfError::NullInput`] if either region is absent, and
/// [`ElfError::InsufficientSize`] if either is shorter than `len`.
pub fn compare(a: Option<&[u8]>, b: Option<&[u8]>, len: usize) -> Result<i16, ElfError> {
    let (Some(a), Some(b)) = (a, b) else {
        return Err(ElfError::NullInput);
    };
    let (Some(a), Some(b)) = (a.get(..len), b.get(..len)) else {
        return Err(ElfError::InsufficientSize);
    };
    Ok(a.iter()
        .zip(b)
        .find(|(x, y)| x != y)
        .map_or(0, |(&x, &y)| i16::from(x) - i16::from(y)))
}

/// Compares two NUL-terminated strings lexicographically.
///
/// The end of a slice counts as its terminator, so `b"abc"` and `b"abc\0"`
/// are equal. The comparison runs through the terminator of the shorter
/// string: `"abc"` and `"abcdef"` differ by `0 - 'd'`.
///
/// # Errors
///
/// Returns [`ElfError::NullInput`] if either string is absent.
pub fn string_compare(a: Option<&[u8]>, b: Option<&[u8]>) -> Result<i16, ElfError> {
    let (Some(a), Some(b)) = (a, b) else {
        return Err(ElfError::NullInput);
    };
    let mut i = 0;
    loop {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return Ok(i16::from(x) - i16::from(y));
        }
        if x == 0 {
            return Ok(0);
        }
        i += 1;
    }
}
