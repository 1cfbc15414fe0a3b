//! Standalone string table decoder.
//!
//! Splits a whole region into its NUL-terminated runs, independently of any
//! section or symbol entry referring into it.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ElfError;
use crate::strings;

/// Every string of a string table region, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    strings: Option<Vec<String>>,
}

impl StringTable {
    /// Splits `data` into owned strings.
    ///
    /// The first string starts at offset 0 and each following string starts
    /// right after the previous terminator. A trailing run without a NUL is
    /// kept as a final string.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::AllocationFailure`] if a string cannot be copied.
    /// Nothing decoded so far is kept.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let nuls = data.iter().filter(|&&b| b == 0).count();
        let mut out = Vec::new();
        out.try_reserve_exact(nuls)?;

        let mut cursor = 0;
        loop {
            match strings::extract_at(data, cursor, data.len()) {
                Ok(extracted) => {
                    cursor += extracted.consumed;
                    out.try_reserve(1)?;
                    out.push(extracted.text);
                }
                // Cursor ran off the end of the region.
                Err(ElfError::OutOfRange) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(Self { strings: Some(out) })
    }

    /// Drops every string.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NullInput`] if the table was already released.
    pub fn release(&mut self) -> Result<(), ElfError> {
        self.strings.take().map(drop).ok_or(ElfError::NullInput)
    }

    /// Returns `true` once [`release`](Self::release) has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.strings.is_none()
    }

    /// Returns the string at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.as_ref()?.get(index).map(String::as_str)
    }

    /// Returns an iterator over the strings (empty once released).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
    }

    /// Number of strings held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.as_ref().map_or(0, Vec::len)
    }

    /// Returns `true` if no strings are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
