//! Addressable storage units routed by the bus.
//!
//! Every region is addressed with a *local* offset starting at zero; the bus
//! translates global addresses before delegating here. Multi-byte accesses
//! are little-endian and are rejected as a whole when any byte falls outside
//! the region, so a faulting access never touches neighbouring storage.

use std::fmt;

use crate::fault::{ConfigurationError, RegionFault};
use crate::memory::{AccessKind, AccessWidth};

/// Byte/half-word/word access capability shared by all region variants.
pub trait Region {
    /// Human-readable region name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Region size in bytes.
    fn size(&self) -> usize;

    /// Reads one byte at a local offset.
    ///
    /// # Errors
    ///
    /// Returns a [`RegionFault`] when the offset is outside the region or,
    /// for I/O blocks, not bound.
    fn read8(&mut self, offset: usize) -> Result<u8, RegionFault>;

    /// Reads a little-endian half-word at a local offset.
    ///
    /// # Errors
    ///
    /// See [`Region::read8`].
    fn read16(&mut self, offset: usize) -> Result<u16, RegionFault>;

    /// Reads a little-endian word at a local offset.
    ///
    /// # Errors
    ///
    /// See [`Region::read8`].
    fn read32(&mut self, offset: usize) -> Result<u32, RegionFault>;

    /// Writes one byte at a local offset.
    ///
    /// # Errors
    ///
    /// See [`Region::read8`].
    fn write8(&mut self, offset: usize, value: u8) -> Result<(), RegionFault>;

    /// Writes a little-endian half-word at a local offset.
    ///
    /// # Errors
    ///
    /// See [`Region::read8`].
    fn write16(&mut self, offset: usize, value: u16) -> Result<(), RegionFault>;

    /// Writes a little-endian word at a local offset.
    ///
    /// # Errors
    ///
    /// See [`Region::read8`].
    fn write32(&mut self, offset: usize, value: u32) -> Result<(), RegionFault>;
}

const fn check_span(offset: usize, width: AccessWidth, size: usize) -> Result<(), RegionFault> {
    match offset.checked_add(width.bytes()) {
        Some(end) if end <= size => Ok(()),
        _ => Err(RegionFault::OutOfBounds {
            offset,
            width,
            size,
        }),
    }
}

/// Plain byte-buffer region (RAM, VRAM, ROM, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    name: &'static str,
    bytes: Box<[u8]>,
    read_only: bool,
}

impl MemoryRegion {
    /// Allocates a zeroed writable region.
    #[must_use]
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            bytes: vec![0; size].into_boxed_slice(),
            read_only: false,
        }
    }

    /// Allocates a zeroed region that discards bus writes.
    #[must_use]
    pub fn read_only(name: &'static str, size: usize) -> Self {
        Self {
            read_only: true,
            ..Self::new(name, size)
        }
    }

    /// Returns `true` when bus writes are discarded.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Borrows the backing bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Host-side image load starting at offset 0.
    ///
    /// Ignores the read-only flag and truncates `data` to the region
    /// capacity. Returns the number of bytes copied.
    pub fn load(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.bytes.len());
        self.bytes[..len].copy_from_slice(&data[..len]);
        len
    }

    fn bytes_at<const N: usize>(&self, offset: usize, width: AccessWidth) -> Result<[u8; N], RegionFault> {
        check_span(offset, width, self.bytes.len())?;
        let mut out = [0; N];
        out.copy_from_slice(&self.bytes[offset..offset + N]);
        Ok(out)
    }

    fn store(&mut self, offset: usize, width: AccessWidth, data: &[u8]) -> Result<(), RegionFault> {
        check_span(offset, width, self.bytes.len())?;
        if !self.read_only {
            self.bytes[offset..offset + data.len()].copy_from_slice(data);
        }
        Ok(())
    }
}

impl Region for MemoryRegion {
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn read8(&mut self, offset: usize) -> Result<u8, RegionFault> {
        let [byte] = self.bytes_at::<1>(offset, AccessWidth::Byte)?;
        Ok(byte)
    }

    fn read16(&mut self, offset: usize) -> Result<u16, RegionFault> {
        self.bytes_at(offset, AccessWidth::HalfWord)
            .map(u16::from_le_bytes)
    }

    fn read32(&mut self, offset: usize) -> Result<u32, RegionFault> {
        self.bytes_at(offset, AccessWidth::Word)
            .map(u32::from_le_bytes)
    }

    fn write8(&mut self, offset: usize, value: u8) -> Result<(), RegionFault> {
        self.store(offset, AccessWidth::Byte, &[value])
    }

    fn write16(&mut self, offset: usize, value: u16) -> Result<(), RegionFault> {
        self.store(offset, AccessWidth::HalfWord, &value.to_le_bytes())
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<(), RegionFault> {
        self.store(offset, AccessWidth::Word, &value.to_le_bytes())
    }
}

/// Getter invoked for a bound I/O register read.
pub type IoGetter = Box<dyn FnMut() -> u8>;
/// Setter invoked for a bound I/O register write.
pub type IoSetter = Box<dyn FnMut(u8)>;

struct IoBinding {
    getter: IoGetter,
    setter: IoSetter,
}

/// Register block whose byte offsets are served by peripheral callbacks.
///
/// Wider accesses decompose into byte accesses, lowest offset first. All
/// touched offsets are validated before the first callback runs.
pub struct IoRegisterBlock {
    name: &'static str,
    bindings: Vec<Option<IoBinding>>,
}

impl IoRegisterBlock {
    /// Creates a block with `size` unbound byte registers.
    #[must_use]
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            bindings: (0..size).map(|_| None).collect(),
        }
    }

    /// Binds a getter/setter pair to a byte offset, replacing any previous pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BindingOutOfRange`] when `offset` is not
    /// inside the block.
    pub fn bind8(
        &mut self,
        offset: usize,
        getter: impl FnMut() -> u8 + 'static,
        setter: impl FnMut(u8) + 'static,
    ) -> Result<(), ConfigurationError> {
        let size = self.bindings.len();
        let slot = self
            .bindings
            .get_mut(offset)
            .ok_or(ConfigurationError::BindingOutOfRange {
                block: self.name,
                offset,
                size,
            })?;
        *slot = Some(IoBinding {
            getter: Box::new(getter),
            setter: Box::new(setter),
        });
        Ok(())
    }

    /// Returns `true` when a byte offset has callbacks bound.
    #[must_use]
    pub fn is_bound(&self, offset: usize) -> bool {
        matches!(self.bindings.get(offset), Some(Some(_)))
    }

    fn check_bound(&self, offset: usize, width: AccessWidth, kind: AccessKind) -> Result<(), RegionFault> {
        check_span(offset, width, self.bindings.len())?;
        match (offset..offset + width.bytes()).find(|at| !self.is_bound(*at)) {
            Some(unbound) => Err(RegionFault::Unbound {
                offset: unbound,
                kind,
            }),
            None => Ok(()),
        }
    }

    fn read_bytes<const N: usize>(&mut self, offset: usize, width: AccessWidth) -> Result<[u8; N], RegionFault> {
        self.check_bound(offset, width, AccessKind::Read)?;
        let mut out = [0; N];
        for (index, byte) in out.iter_mut().enumerate() {
            if let Some(binding) = self.bindings[offset + index].as_mut() {
                *byte = (binding.getter)();
            }
        }
        Ok(out)
    }

    fn write_bytes(&mut self, offset: usize, width: AccessWidth, data: &[u8]) -> Result<(), RegionFault> {
        self.check_bound(offset, width, AccessKind::Write)?;
        for (index, byte) in data.iter().enumerate() {
            if let Some(binding) = self.bindings[offset + index].as_mut() {
                (binding.setter)(*byte);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for IoRegisterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoRegisterBlock")
            .field("name", &self.name)
            .field("size", &self.bindings.len())
            .field(
                "bound",
                &self.bindings.iter().filter(|slot| slot.is_some()).count(),
            )
            .finish()
    }
}

impl Region for IoRegisterBlock {
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> usize {
        self.bindings.len()
    }

    fn read8(&mut self, offset: usize) -> Result<u8, RegionFault> {
        let [byte] = self.read_bytes::<1>(offset, AccessWidth::Byte)?;
        Ok(byte)
    }

    fn read16(&mut self, offset: usize) -> Result<u16, RegionFault> {
        self.read_bytes(offset, AccessWidth::HalfWord)
            .map(u16::from_le_bytes)
    }

    fn read32(&mut self, offset: usize) -> Result<u32, RegionFault> {
        self.read_bytes(offset, AccessWidth::Word)
            .map(u32::from_le_bytes)
    }

    fn write8(&mut self, offset: usize, value: u8) -> Result<(), RegionFault> {
        self.write_bytes(offset, AccessWidth::Byte, &[value])
    }

    fn write16(&mut self, offset: usize, value: u16) -> Result<(), RegionFault> {
        self.write_bytes(offset, AccessWidth::HalfWord, &value.to_le_bytes())
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<(), RegionFault> {
        self.write_bytes(offset, AccessWidth::Word, &value.to_le_bytes())
    }
}

/// Closed set of region variants the bus can own.
#[derive(Debug)]
pub enum MappedRegion {
    /// Byte-buffer storage.
    Memory(MemoryRegion),
    /// Callback-bound register block.
    Io(IoRegisterBlock),
}

impl MappedRegion {
    fn inner(&self) -> &dyn Region {
        match self {
            Self::Memory(region) => region,
            Self::Io(block) => block,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Region {
        match self {
            Self::Memory(region) => region,
            Self::Io(block) => block,
        }
    }

    /// Borrows the byte-buffer variant.
    #[must_use]
    pub const fn as_memory(&self) -> Option<&MemoryRegion> {
        match self {
            Self::Memory(region) => Some(region),
            Self::Io(_) => None,
        }
    }

    /// Mutably borrows the byte-buffer variant.
    pub fn as_memory_mut(&mut self) -> Option<&mut MemoryRegion> {
        match self {
            Self::Memory(region) => Some(region),
            Self::Io(_) => None,
        }
    }

    /// Mutably borrows the register-block variant.
    pub fn as_io_mut(&mut self) -> Option<&mut IoRegisterBlock> {
        match self {
            Self::Io(block) => Some(block),
            Self::Memory(_) => None,
        }
    }
}

impl From<MemoryRegion> for MappedRegion {
    fn from(region: MemoryRegion) -> Self {
        Self::Memory(region)
    }
}

impl From<IoRegisterBlock> for MappedRegion {
    fn from(block: IoRegisterBlock) -> Self {
        Self::Io(block)
    }
}

impl Region for MappedRegion {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn size(&self) -> usize {
        self.inner().size()
    }

    fn read8(&mut self, offset: usize) -> Result<u8, RegionFault> {
        self.inner_mut().read8(offset)
    }

    fn read16(&mut self, offset: usize) -> Result<u16, RegionFault> {
        self.inner_mut().read16(offset)
    }

    fn read32(&mut self, offset: usize) -> Result<u32, RegionFault> {
        self.inner_mut().read32(offset)
    }

    fn write8(&mut self, offset: usize, value: u8) -> Result<(), RegionFault> {
        self.inner_mut().write8(offset, value)
    }

    fn write16(&mut self, offset: usize, value: u16) -> Result<(), RegionFault> {
        self.inner_mut().write16(offset, value)
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<(), RegionFault> {
        self.inner_mut().write32(offset, value)
    }
}
