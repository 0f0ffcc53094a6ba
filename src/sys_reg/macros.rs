// SPDX-License-Identifier: Apache-2.0 OR MIT
//
// RISC-V machine CSR access macros

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
macro_rules! csr_read {
    ($addr:literal) => {{
        let value: usize;
        unsafe { core::arch::asm!(concat!("csrr {0}, ", stringify!($addr)), out(reg) value) }
        value
    }};
}

#[cfg(not(any(target_arch = "riscv32", target_arch = "riscv64")))]
macro_rules! csr_read {
    ($addr:literal) => {
        unimplemented!(concat!("CSR ", stringify!($addr), " is only reachable on a RISC-V hart"))
    };
}

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
macro_rules! csr_write {
    ($addr:literal, $value:expr) => {
        unsafe { core::arch::asm!(concat!("csrw ", stringify!($addr), ", {0}"), in(reg) $value) }
    };
}

#[cfg(not(any(target_arch = "riscv32", target_arch = "riscv64")))]
macro_rules! csr_write {
    ($addr:literal, $value:expr) => {{
        let _ = $value;
        unimplemented!(concat!("CSR ", stringify!($addr), " is only reachable on a RISC-V hart"))
    }};
}

/// 定义读写 CSR 的宏
macro_rules! define_readwrite_csr {
    (
        $(#[$attr:meta])*
        $register:ident = $addr:literal {
            $($field:ident OFFSET($offset:expr) NUMBITS($bits:expr) $values:tt,)*
        }
    ) => {
        paste::paste! {
        $(#[$attr])*
        pub mod [<$register:lower>] {
            use tock_registers::{interfaces::*, register_bitfields};

            /// CSR number.
            pub const ADDR: u16 = $addr;

            register_bitfields! {usize,
                pub $register [
                    $($field OFFSET($offset) NUMBITS($bits) $values,)*
                ]
            }

            pub struct Reg;

            impl Readable for Reg {
                type T = usize;
                type R = $register::Register;

                #[inline(always)]
                fn get(&self) -> Self::T {
                    csr_read!($addr)
                }
            }

            impl Writeable for Reg {
                type T = usize;
                type R = $register::Register;

                #[inline(always)]
                fn set(&self, value: Self::T) {
                    csr_write!($addr, value)
                }
            }

            pub const $register: Reg = Reg{};
        }
        pub use [<$register:lower>]::$register;
    }
    };
}
