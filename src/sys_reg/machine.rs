// SPDX-License-Identifier: Apache-2.0 OR MIT
//
// Machine trap setup CSRs used by the hart-local and CLIC controllers

define_readwrite_csr! {
    /// Machine interrupt-enable register.
    MIE = 0x304 {
        MSIE OFFSET(3) NUMBITS(1) [],
        MTIE OFFSET(7) NUMBITS(1) [],
        MEIE OFFSET(11) NUMBITS(1) [],
    }
}

define_readwrite_csr! {
    /// Machine trap-handler base address. The CLIC modes reuse `MODE`
    /// encodings 2 and 3 and reserve `SUBMODE`.
    MTVEC = 0x305 {
        MODE OFFSET(0) NUMBITS(2) [
            Direct = 0,
            Vectored = 1,
            Clic = 2,
            ClicVectored = 3,
        ],
        SUBMODE OFFSET(2) NUMBITS(4) [],
    }
}

define_readwrite_csr! {
    /// CLIC trap-handler vector table base. The table must be 64-byte aligned.
    MTVT = 0x307 {
        ALIGN OFFSET(0) NUMBITS(6) [],
    }
}
