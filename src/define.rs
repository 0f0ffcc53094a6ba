use core::fmt::{self, Debug, Display};

/// Number of hart-local interrupt ids owned by the root controller.
pub const LOCAL_LINES: usize = 16;

/// Diagnostic code handed to the shutdown hook when a claimed line fires
/// without a handler.
pub const UNHANDLED_INTERRUPT_CODE: i32 = 300;

/// Interrupt ID as seen by the hart: `0..16` are the hart-local causes owned
/// by the root controller, `16..` are CLIC sub-interrupts.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Ord, PartialOrd, PartialEq, Hash)]
pub struct IntId(u32);

impl IntId {
    /// Selects the controller-wide trap vector in `enable_vector`/`disable_vector`.
    pub const BASE: Self = Self(0);
    /// Machine software interrupt.
    pub const SOFTWARE: Self = Self(3);
    /// Machine timer interrupt.
    pub const TIMER: Self = Self(7);
    /// Machine external interrupt.
    pub const EXTERNAL: Self = Self(11);
    /// First CLIC sub-interrupt.
    pub const LC0: Self = Self(LOCAL_LINES as u32);

    /// Create a hart-local interrupt ID.
    pub const fn local(id: u32) -> Self {
        assert!(id < LOCAL_LINES as u32, "Invalid local interrupt ID");
        Self(id)
    }

    /// Create the ID of CLIC sub-interrupt line `line`.
    pub const fn sub(line: u32) -> Self {
        assert!(
            line <= u32::MAX - LOCAL_LINES as u32,
            "Invalid sub-interrupt line"
        );
        Self(line + LOCAL_LINES as u32)
    }

    pub const fn raw(id: u32) -> Self {
        Self(id)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn is_local(self) -> bool {
        self.0 < LOCAL_LINES as u32
    }

    /// Offset of this ID inside the sub-interrupt space, `None` for hart-local IDs.
    pub const fn sub_line(self) -> Option<u32> {
        if self.is_local() {
            None
        } else {
            Some(self.0 - LOCAL_LINES as u32)
        }
    }
}

impl Debug for IntId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_line() {
            None => write!(f, "Local({})", self.0),
            Some(line) => write!(f, "Sub({line})"),
        }
    }
}

impl From<IntId> for u32 {
    fn from(id: IntId) -> Self {
        id.0
    }
}

impl From<u32> for IntId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Trap vector layout selected through `mtvec.MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorMode {
    /// Every trap enters at the `mtvec` base.
    Direct,
    /// CLINT vectored: interrupts enter at `base + 4 * cause`.
    Vectored,
    /// CLIC mode. Traps enter the shared software entry through `mtvt`;
    /// lines with their vector bit set are vectored by hardware.
    Selective,
    /// CLIC vectored mode: every line jumps through the `mtvt` table.
    Hardware,
}

/// Requests carried over [`InterruptController::command`](crate::InterruptController::command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read the free-running `mtime` counter.
    MtimeGet,
    /// Program this hart's `mtimecmp`.
    MtimecmpSet(u64),
    /// Raise the software interrupt of `hart`.
    SoftwareIpiSet { hart: usize },
    /// Lower the software interrupt of `hart`.
    SoftwareIpiClear { hart: usize },
    /// Query the software interrupt bit of `hart`.
    SoftwareMsipGet { hart: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Done,
    Time(u64),
    Msip(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntcError {
    /// The ID, line or hart index as passed by the caller is not implemented.
    OutOfRange { id: u32 },
    /// The vector mode is not valid for the addressed ID.
    InvalidVectorMode(VectorMode),
    /// Per-line vectoring needs the hart to be in selective (CLIC) mode.
    NotSelective,
    /// The value does not fit the configured field width.
    FieldOverflow { value: u8, width: u8 },
    Unsupported,
}

impl Display for IntcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { id } => write!(f, "interrupt id {id} out of range"),
            Self::InvalidVectorMode(mode) => write!(f, "vector mode {mode:?} not valid here"),
            Self::NotSelective => write!(f, "hart is not in selective vector mode"),
            Self::FieldOverflow { value, width } => {
                write!(f, "value {value:#x} does not fit in {width} bits")
            }
            Self::Unsupported => write!(f, "operation not supported"),
        }
    }
}

impl core::error::Error for IntcError {}

pub type IntcResult<T = ()> = core::result::Result<T, IntcError>;
