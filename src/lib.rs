#![no_std]
#![doc = include_str!("../README.md")]

pub(crate) mod define;
mod interface;
pub mod sys_reg;

pub mod clic0;
pub mod cpu_intc;

use core::fmt::Display;

pub use clic0::{Clic, ControllerConfig, Description};
pub use cpu_intc::{CpuIntc, CsrBackend, EmulatedCsr, HartCsr, LocalIrq, MachineCsr};
pub use define::*;
pub use interface::{InterruptController, IrqHandler};

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VirtAddr(usize);

impl VirtAddr {
    pub const fn new(val: usize) -> Self {
        Self(val)
    }

    /// The address as a pointer to `T`.
    pub const fn as_ptr<T>(&self) -> *mut T {
        self.0 as *mut T
    }
}

impl Display for VirtAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#p}", self.0 as *const u8)
    }
}
