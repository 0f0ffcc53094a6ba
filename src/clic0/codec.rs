//! Bit-field layout of `cliccfg` and of the per-line `clicintctl` byte.
//!
//! `clicintctl` packs up to three fields into its top `num_intbits` bits:
//!
//! ```text
//!  7                                       0
//! +-----------+-----------+--------------+------+
//! | privilege |   level   |   priority   | ones |
//! +-----------+-----------+--------------+------+
//!  nmbits      nlbits*     num_intbits - nmbits - nlbits
//! ```
//!
//! The widths come from `cliccfg` and the implemented bit count, they are
//! never stored per line. The selective-vectoring bit is the lowest
//! implemented bit, `1 << (8 - num_intbits)`.

use tock_registers::LocalRegisterCopy;

use super::reg::CLICCFG;

/// Widest level field `cliccfg.nlbits` may select.
pub const MAX_LEVEL_BITS: u8 = 8;

/// Widest privilege field `cliccfg.nmbits` may select.
pub const MAX_PRIVILEGE_BITS: u8 = 2;

/// Decoded `cliccfg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerConfig {
    /// `nmbits`: privilege-mode bits at the top of each control byte.
    pub privilege_width: u8,
    /// `nlbits`: level bits following the privilege field.
    pub level_width: u8,
    /// `nvbits`: selective hardware vectoring is implemented.
    pub vectored: bool,
}

impl ControllerConfig {
    pub fn decode(raw: u8) -> Self {
        let reg = LocalRegisterCopy::<u8, CLICCFG::Register>::new(raw);
        Self {
            privilege_width: reg.read(CLICCFG::NMBITS),
            level_width: reg.read(CLICCFG::NLBITS),
            vectored: reg.is_set(CLICCFG::NVBITS),
        }
    }

    /// Out-of-range widths are truncated to their register field.
    pub fn encode(&self) -> u8 {
        (CLICCFG::NMBITS.val(self.privilege_width)
            + CLICCFG::NLBITS.val(self.level_width)
            + CLICCFG::NVBITS.val(self.vectored as u8))
        .value
    }
}

/// One sub-field of a control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub width: u8,
    /// Position of the field's least significant bit.
    pub shift: u8,
}

impl Field {
    pub const fn mask(self) -> u8 {
        if self.width == 0 {
            return 0;
        }
        (((1u16 << self.width) - 1) as u8) << self.shift
    }

    /// Store the top `width` bits of an 8-bit scaled `value`.
    pub fn insert(self, ctl: u8, value: u8) -> u8 {
        if self.width == 0 {
            return ctl;
        }
        let bits = value >> (8 - self.width);
        (ctl & !self.mask()) | (bits << self.shift)
    }

    /// Read the field back at 8-bit scale. Bits below the field's precision
    /// read as ones and a missing field reads as the maximum.
    pub fn extract(self, ctl: u8) -> u8 {
        if self.width == 0 {
            return u8::MAX;
        }
        let bits = (ctl & self.mask()) >> self.shift;
        (bits << (8 - self.width)) | u8::MAX.checked_shr(self.width as u32).unwrap_or(0)
    }

    /// Raw, right-aligned field contents.
    pub fn bits(self, ctl: u8) -> u8 {
        if self.width == 0 {
            return 0;
        }
        (ctl & self.mask()) >> self.shift
    }

    pub fn with_bits(self, ctl: u8, bits: u8) -> u8 {
        if self.width == 0 {
            return ctl;
        }
        (ctl & !self.mask()) | ((bits << self.shift) & self.mask())
    }
}

/// Effective field layout of every control byte under one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLayout {
    pub privilege: Field,
    pub level: Field,
    pub priority: Field,
}

impl LineLayout {
    pub fn new(cfg: ControllerConfig, num_intbits: u8) -> Self {
        let num_intbits = num_intbits.min(8);
        let privilege = cfg.privilege_width.min(num_intbits);
        let level = cfg
            .level_width
            .min(MAX_LEVEL_BITS)
            .min(num_intbits - privilege);
        let priority =
            num_intbits.saturating_sub(cfg.privilege_width.saturating_add(cfg.level_width));

        Self {
            privilege: Field {
                width: privilege,
                shift: 8 - privilege,
            },
            level: Field {
                width: level,
                shift: 8 - privilege - level,
            },
            priority: Field {
                width: priority,
                shift: 8 - privilege - level - priority,
            },
        }
    }
}

/// Privilege mode a line runs in when `nmbits` is zero.
pub const MACHINE_MODE: u8 = 0b11;

/// Field contents selecting privilege `mode` under a `width`-bit privilege
/// field. One bit only tells user (0) from machine (1).
pub fn privilege_bits(width: u8, mode: u8) -> Option<u8> {
    match (width, mode) {
        (0, MACHINE_MODE) => Some(0),
        (1, 0) => Some(0),
        (1, MACHINE_MODE) => Some(1),
        (2, 0..=MACHINE_MODE) => Some(mode),
        _ => None,
    }
}

/// Inverse of [`privilege_bits`].
pub fn privilege_mode(width: u8, bits: u8) -> u8 {
    match width {
        0 => MACHINE_MODE,
        1 if bits & 1 == 0 => 0,
        1 => MACHINE_MODE,
        _ => bits & MACHINE_MODE,
    }
}

/// Mask of the selective-vectoring bit: the lowest implemented control bit,
/// shared with the least significant bit of the last configured field.
/// Zero when no control bits are implemented.
pub fn vector_bit(num_intbits: u8) -> u8 {
    (1u16 << (8 - num_intbits.min(8))) as u8
}
