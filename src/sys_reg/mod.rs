// SPDX-License-Identifier: Apache-2.0 OR MIT
//
// RISC-V machine-mode CSR definitions

#[macro_use]
mod macros;

// Trap vector and interrupt-enable CSRs
pub mod machine;

pub use machine::*;
