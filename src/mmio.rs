//! Register access primitives.

/// Atomic 32-bit accesses to the peripheral register space.
///
/// The drivers only ever touch registers through this trait, which lets the
/// same sequences run against real memory-mapped hardware ([`Volatile`]) or a
/// simulated register file.
pub trait Mmio {
    /// Reads the register at `addr`.
    fn read(&self, addr: usize) -> u32;

    /// Writes `value` to the register at `addr`.
    fn write(&self, addr: usize, value: u32);

    /// Read-modify-write.
    #[inline]
    fn modify(&self, addr: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(addr);
        self.write(addr, f(value));
    }

    #[inline]
    fn set_bits(&self, addr: usize, mask: u32) {
        self.modify(addr, |v| v | mask);
    }

    #[inline]
    fn clear_bits(&self, addr: usize, mask: u32) {
        self.modify(addr, |v| v & !mask);
    }

    #[inline]
    fn is_set(&self, addr: usize, mask: u32) -> bool {
        self.read(addr) & mask == mask
    }
}

/// Volatile accesses to the S32K14x peripheral address space.
#[derive(Debug)]
pub struct Volatile {
    _private: (),
}

impl Volatile {
    /// # Safety
    ///
    /// Only valid on an S32K14x where the FTM, LPIT, LPTMR and SRTC register
    /// blocks are mapped, clocked, and owned exclusively by this driver.
    pub const unsafe fn new() -> Self {
        Volatile { _private: () }
    }
}

impl Mmio for Volatile {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        // SAFETY: `Volatile::new` contract; `addr` is an aligned register.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

impl<T: Mmio> Mmio for &T {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        T::read(self, addr)
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        T::write(self, addr, value)
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "arm", target_os = "none"))] {
        /// Completes an interrupt-flag clear before the exception returns, so the
        /// NVIC does not see the stale request and re-enter the handler.
        #[inline(always)]
        pub(crate) fn flag_barrier() {
            cortex_m::asm::dsb();
        }
    } else {
        #[inline(always)]
        pub(crate) fn flag_barrier() {}
    }
}
