//! Physical memory mapping for MMIO access
//!
//! Maps a window of physical memory through /dev/mem so the SPI IP core
//! registers can be accessed from user space.
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root privileges.
//! The mapping functions ensure proper alignment and size constraints.

use crate::error::{PhysMapError, Result};

/// Memory device the window is mapped from
pub const DEV_MEM: &str = "/dev/mem";

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the requested address inside the mapping
    ptr: *mut u8,
    /// Bytes requested, starting at `ptr`
    span: usize,
    /// Size of the page-aligned mapping
    size: usize,
    /// Bytes between the page base and `ptr`
    page_offset: usize,
    /// Physical address (for error reporting)
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `size` bytes of physical memory starting at `phys_addr`
    ///
    /// The caller must make sure the range is MMIO belonging to the device
    /// it intends to drive and that nothing else drives it concurrently.
    pub fn new(phys_addr: u64, size: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(DEV_MEM)
            .map_err(|source| PhysMapError::Open {
                path: DEV_MEM.into(),
                source,
            })?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let page_offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + page_offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(PhysMapError::Map {
                address: phys_addr,
                size,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "Mapped {:#x} ({} bytes, {} byte window)",
            phys_addr,
            size,
            map_size
        );

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(page_offset) },
            span: size,
            size: map_size,
            page_offset,
            phys_addr,
        })
    }

    /// Read a 32-bit value from the mapped region
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.span);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Write a 32-bit value to the mapped region
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.span);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }

    /// Physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Bytes usable from the requested address
    pub fn span(&self) -> usize {
        self.span
    }

    /// Size of the page-aligned mapping
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        let base = unsafe { self.ptr.sub(self.page_offset) };
        unsafe {
            libc::munmap(base as *mut libc::c_void, self.size);
        }
        log::debug!("Unmapped {:#x}", self.phys_addr);
    }
}

// MMIO registers have no aliasing concerns; exclusive use is up to the owner
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}
#[cfg(target_os = "linux")]
unsafe impl Sync for PhysMap {}

/// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    /// Always fails on this platform
    pub fn new(_phys_addr: u64, _size: usize) -> Result<Self> {
        Err(PhysMapError::NotSupported(
            "Physical memory mapping only supported on Linux",
        ))
    }

    /// Read a 32-bit value (unreachable, no mapping can exist)
    pub fn read32(&self, _offset: usize) -> u32 {
        0
    }

    /// Write a 32-bit value (unreachable, no mapping can exist)
    pub fn write32(&self, _offset: usize, _value: u32) {}

    /// Physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        0
    }

    /// Bytes usable from the requested address
    pub fn span(&self) -> usize {
        0
    }

    /// Size of the mapping
    pub fn size(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires root, /dev/mem and the FPGA bridge enabled
    fn test_physmap_bridge() {
        let map = PhysMap::new(0xFF20_0000, 16).unwrap();
        assert_eq!(map.phys_addr(), 0xFF20_0000);
        assert_eq!(map.span(), 16);
        assert!(map.size() >= 16);
    }
}
