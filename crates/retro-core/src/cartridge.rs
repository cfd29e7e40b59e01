//! Cartridge images and mounting them into a ROM region.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::fault::ConfigurationError;
use crate::memory::{Bus, RegionHandle};

/// Failure to obtain a cartridge image.
#[derive(Debug, Error)]
pub enum CartridgeError {
    /// Reading the image from disk failed.
    #[error("cannot read cartridge image: {0}")]
    Io(#[from] io::Error),
    /// The image has no bytes.
    #[error("cartridge image is empty")]
    Empty,
}

/// Where a profile's cartridge header keeps its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderLayout {
    /// 12-byte title at `0xA0`.
    Wide,
    /// 16-byte title at `0x134`.
    Narrow,
}

impl HeaderLayout {
    const fn title_range(self) -> (usize, usize) {
        match self {
            Self::Wide => (0xA0, 0xAC),
            Self::Narrow => (0x134, 0x144),
        }
    }
}

/// Raw cartridge bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    bytes: Vec<u8>,
}

impl Cartridge {
    /// Wraps an in-memory image.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::Empty`] for an empty image.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, CartridgeError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CartridgeError::Empty);
        }
        Ok(Self { bytes })
    }

    /// Reads an image from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::Io`] when the file cannot be read and
    /// [`CartridgeError::Empty`] when it has no bytes.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; empty images are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Header title with trailing NULs trimmed, or `None` when the image is
    /// too short to hold the title field.
    #[must_use]
    pub fn title(&self, layout: HeaderLayout) -> Option<String> {
        let (start, end) = layout.title_range();
        let raw = self.bytes.get(start..end)?;
        let trimmed = match raw.iter().rposition(|&byte| byte != 0) {
            Some(last) => &raw[..=last],
            None => &[],
        };
        Some(String::from_utf8_lossy(trimmed).into_owned())
    }

    /// Copies the image into the memory region behind `handle`, truncating
    /// to the region size, and returns the number of bytes copied.
    ///
    /// The copy bypasses the region's write protection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownHandle`] when `handle` does not
    /// name a byte-buffer region on `bus`.
    pub fn mount_into(&self, bus: &mut Bus, handle: RegionHandle) -> Result<usize, ConfigurationError> {
        let region = bus
            .region_mut(handle)
            .and_then(|region| region.as_memory_mut())
            .ok_or(ConfigurationError::UnknownHandle(handle.index()))?;
        let copied = region.load(&self.bytes);
        if copied < self.bytes.len() {
            tracing::warn!(
                image = self.bytes.len(),
                copied,
                "cartridge image truncated to region size"
            );
        }
        tracing::debug!(copied, "cartridge mounted");
        Ok(copied)
    }
}
