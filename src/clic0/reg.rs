use tock_registers::{register_bitfields, register_structs, registers::*};

use super::timer::{read_counter, write_compare};

/// Offset of the machine-mode CLIC aperture from the control base.
pub const MMODE_APERTURE: usize = 0x80_0000;

/// Harts addressable through the `msip`/`mtimecmp` arrays.
pub const MAX_HARTS: usize = 4095;

/// Interrupt IDs addressable through the per-line byte arrays.
pub const MAX_INTERRUPTS: usize = 0x400;

register_structs! {
    /// A 64-bit register exposed as two 32-bit words that are not latched
    /// together.
    #[allow(non_snake_case)]
    pub Split64 {
        (0x0 => pub LO: ReadWrite<u32>),
        (0x4 => pub HI: ReadWrite<u32>),
        (0x8 => @END),
    }
}

impl Split64 {
    /// Rollover-safe read.
    pub fn load(&self) -> u64 {
        read_counter(&self.LO, &self.HI)
    }

    /// Write that never passes through a value below both the old and the
    /// new one.
    pub fn store(&self, value: u64) {
        write_compare(&self.LO, &self.HI, value)
    }
}

register_structs! {
    /// CLINT-compatible block at the start of the control region.
    #[allow(non_snake_case)]
    pub ClintReg {
        /// Machine Software Interrupt Pending, one word per hart.
        (0x0000 => pub MSIP: [ReadWrite<u32>; MAX_HARTS]),
        (0x3ffc => _rsv0),
        /// Machine Timer Compare, one per hart.
        (0x4000 => pub MTIMECMP: [Split64; MAX_HARTS]),
        /// Machine Timer.
        (0xbff8 => pub MTIME: Split64),
        (0xc000 => @END),
    }
}

register_structs! {
    /// Per-privilege-mode CLIC aperture.
    #[allow(non_snake_case)]
    pub ModeReg {
        /// Interrupt Pending, one byte per interrupt. Hardware owned.
        (0x000 => pub INTIP: [ReadOnly<u8>; MAX_INTERRUPTS]),
        /// Interrupt Enable, one byte per interrupt.
        (0x400 => pub INTIE: [ReadWrite<u8>; MAX_INTERRUPTS]),
        /// Interrupt Control: privilege, level and priority fields.
        (0x800 => pub INTCTL: [ReadWrite<u8>; MAX_INTERRUPTS]),
        /// CLIC Configuration.
        (0xc00 => pub CFG: ReadWrite<u8, CLICCFG::Register>),
        (0xc01 => @END),
    }
}

register_bitfields! [
    u8,
    pub CLICCFG [
        /// Selective hardware vectoring implemented.
        NVBITS OFFSET(0) NUMBITS(1) [],
        /// Width of the level field.
        NLBITS OFFSET(1) NUMBITS(4) [],
        /// Width of the privilege mode field.
        NMBITS OFFSET(5) NUMBITS(2) [],
    ],
];
