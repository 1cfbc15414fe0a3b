//! Error kinds shared by every decoder in the crate.

use core::fmt;

/// Errors that can occur while decoding an ELF image.
///
/// Each kind has exactly one meaning across all decoders, so callers can
/// match on the variant without knowing which stage produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfError {
    /// The buffer is too small for a requested field or table.
    InsufficientSize,
    /// A required input is absent, or the table has already been released.
    NullInput,
    /// The identification block does not start with the ELF magic bytes.
    InvalidFormat,
    /// The class or data-encoding byte is not a known value.
    InvalidClassOrEncoding,
    /// A table or string allocation could not be satisfied.
    AllocationFailure,
    /// An index or start parameter lies outside the valid range.
    OutOfRange,
    /// A named entry is not present in the table.
    NotFound,
    /// A byte copy primitive could not complete.
    CopyFailure,
}

impl ElfError {
    /// Returns the stable integer code for this error kind.
    ///
    /// Codes are negative and never overlap; `0` is reserved for success.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InsufficientSize => -1,
            Self::NullInput => -2,
            Self::InvalidFormat => -3,
            Self::InvalidClassOrEncoding => -4,
            Self::AllocationFailure => -5,
            Self::OutOfRange => -6,
            Self::NotFound => -7,
            Self::CopyFailure => -8,
        }
    }

    /// Maps an integer code back to its error kind.
    ///
    /// Returns `None` for `0` and for codes outside the taxonomy.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::InsufficientSize),
            -2 => Some(Self::NullInput),
            -3 => Some(Self::InvalidFormat),
            -4 => Some(Self::InvalidClassOrEncoding),
            -5 => Some(Self::AllocationFailure),
            -6 => Some(Self::OutOfRange),
            -7 => Some(Self::NotFound),
            -8 => Some(Self::CopyFailure),
            _ => None,
        }
    }
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSize => write!(f, "buffer too small for the requested data"),
            Self::NullInput => write!(f, "required input missing or table already released"),
            Self::InvalidFormat => write!(f, "invalid ELF magic bytes"),
            Self::InvalidClassOrEncoding => write!(f, "unknown ELF class or data encoding"),
            Self::AllocationFailure => write!(f, "memory allocation failed"),
            Self::OutOfRange => write!(f, "index out of range"),
            Self::NotFound => write!(f, "named entry not found"),
            Self::CopyFailure => write!(f, "byte copy failed"),
        }
    }
}

impl core::error::Error for ElfError {}

impl From<alloc::collections::TryReserveError> for ElfError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::AllocationFailure
    }
}
