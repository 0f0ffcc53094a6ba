//! Hart-local interrupt controller: the root of the controller hierarchy.
//!
//! Owns the sixteen local causes (`mie`), the trap vector CSRs (`mtvec`,
//! `mtvt`) and a handler slot per local cause.

use bitflags::bitflags;
use enum_dispatch::enum_dispatch;
use log::{debug, trace, warn};
use tock_registers::{
    LocalRegisterCopy,
    interfaces::{Readable, Writeable},
    registers::InMemoryRegister,
};

use crate::{
    Command, IntId, IntcError, IntcResult, LOCAL_LINES, Reply, VectorMode,
    interface::{HandlerTable, InterruptController, IrqHandler},
    sys_reg::{MIE, MTVEC, MTVT},
};

bitflags! {
    /// Hart-local interrupt bits as laid out in `mie`/`mip`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocalIrq: usize {
        const SSI = 1 << 1;
        const MSI = 1 << 3;
        const STI = 1 << 5;
        const MTI = 1 << 7;
        const SEI = 1 << 9;
        const MEI = 1 << 11;
    }
}

impl LocalIrq {
    /// `mie` bit of a hart-local ID.
    pub fn from_id(id: IntId) -> Option<Self> {
        id.is_local()
            .then(|| Self::from_bits_retain(1 << id.to_u32()))
    }
}

/// Access to the trap setup CSRs of the current hart.
#[enum_dispatch]
pub trait HartCsr {
    fn mtvec(&self) -> usize;
    fn set_mtvec(&self, value: usize);
    fn mtvt(&self) -> usize;
    fn set_mtvt(&self, value: usize);
    fn mie(&self) -> LocalIrq;
    fn set_mie(&self, value: LocalIrq);
}

/// The real machine-mode CSRs. Only usable on a RISC-V hart.
pub struct MachineCsr;

impl HartCsr for MachineCsr {
    fn mtvec(&self) -> usize {
        MTVEC.get()
    }

    fn set_mtvec(&self, value: usize) {
        MTVEC.set(value)
    }

    fn mtvt(&self) -> usize {
        MTVT.get()
    }

    fn set_mtvt(&self, value: usize) {
        MTVT.set(value)
    }

    fn mie(&self) -> LocalIrq {
        LocalIrq::from_bits_retain(MIE.get())
    }

    fn set_mie(&self, value: LocalIrq) {
        MIE.set(value.bits())
    }
}

/// In-memory CSR file for running the controllers off-target.
pub struct EmulatedCsr {
    mtvec: InMemoryRegister<usize, MTVEC::Register>,
    mtvt: InMemoryRegister<usize, MTVT::Register>,
    mie: InMemoryRegister<usize, MIE::Register>,
}

impl EmulatedCsr {
    pub const fn new() -> Self {
        Self {
            mtvec: InMemoryRegister::new(0),
            mtvt: InMemoryRegister::new(0),
            mie: InMemoryRegister::new(0),
        }
    }
}

impl Default for EmulatedCsr {
    fn default() -> Self {
        Self::new()
    }
}

impl HartCsr for EmulatedCsr {
    fn mtvec(&self) -> usize {
        self.mtvec.get()
    }

    fn set_mtvec(&self, value: usize) {
        self.mtvec.set(value)
    }

    fn mtvt(&self) -> usize {
        self.mtvt.get()
    }

    fn set_mtvt(&self, value: usize) {
        // Low bits are hardwired to zero.
        self.mtvt.set(value & !MTVT::ALIGN.mask)
    }

    fn mie(&self) -> LocalIrq {
        LocalIrq::from_bits_retain(self.mie.get())
    }

    fn set_mie(&self, value: LocalIrq) {
        self.mie.set(value.bits())
    }
}

#[enum_dispatch(HartCsr)]
pub enum CsrBackend {
    Machine(MachineCsr),
    Emulated(EmulatedCsr),
}

/// Root interrupt controller of one hart.
pub struct CpuIntc {
    csr: CsrBackend,
    handlers: HandlerTable<LOCAL_LINES>,
    trap_entry: usize,
    shutdown: fn(i32) -> !,
    init_done: bool,
}

unsafe impl Send for CpuIntc {}

impl CpuIntc {
    /// `trap_entry`: address of the platform trap entry that calls
    /// [`InterruptController::dispatch`]. `shutdown`: invoked with a diagnostic
    /// code when a claimed line fires without a handler.
    pub const fn new(csr: CsrBackend, trap_entry: usize, shutdown: fn(i32) -> !) -> Self {
        Self {
            csr,
            handlers: HandlerTable::new(),
            trap_entry,
            shutdown,
            init_done: false,
        }
    }

    pub fn csr(&self) -> &CsrBackend {
        &self.csr
    }

    pub fn is_enabled(&self, id: IntId) -> bool {
        LocalIrq::from_id(id).is_some_and(|bit| self.csr.mie().contains(bit))
    }

    fn local_index(id: IntId) -> IntcResult<usize> {
        if id.is_local() {
            Ok(id.to_u32() as usize)
        } else {
            warn!("CPU intc: {id:?} is not a hart-local interrupt");
            Err(IntcError::OutOfRange { id: id.to_u32() })
        }
    }
}

impl InterruptController for CpuIntc {
    fn init(&mut self) {
        if self.init_done {
            return;
        }
        trace!("Initializing hart-local interrupt controller...");
        // 1. Mask every local cause
        self.csr.set_mie(LocalIrq::empty());

        // 2. Forget stale handlers
        for index in 0..LOCAL_LINES {
            self.handlers.clear(index);
        }

        // 3. Direct mode until a nested controller asks for more
        self.set_trap_vector(VectorMode::Direct, self.trap_entry);
        self.init_done = true;
    }

    fn register_handler(
        &mut self,
        id: IntId,
        handler: Option<IrqHandler>,
        context: *mut (),
    ) -> IntcResult {
        let index = Self::local_index(id)?;
        self.handlers.register(index, handler, context);
        Ok(())
    }

    fn enable(&mut self, id: IntId) -> IntcResult {
        Self::local_index(id)?;
        if let Some(bit) = LocalIrq::from_id(id) {
            self.csr.set_mie(self.csr.mie() | bit);
        }
        Ok(())
    }

    fn disable(&mut self, id: IntId) -> IntcResult {
        Self::local_index(id)?;
        if let Some(bit) = LocalIrq::from_id(id) {
            self.csr.set_mie(self.csr.mie() - bit);
        }
        Ok(())
    }

    fn enable_vector(&mut self, id: IntId, mode: VectorMode) -> IntcResult {
        if id != IntId::BASE {
            return Err(IntcError::Unsupported);
        }
        self.set_trap_vector(mode, self.trap_entry);
        Ok(())
    }

    fn disable_vector(&mut self, id: IntId) -> IntcResult {
        if id != IntId::BASE {
            return Err(IntcError::Unsupported);
        }
        self.set_trap_vector(VectorMode::Direct, self.trap_entry);
        Ok(())
    }

    fn command(&mut self, command: Command) -> IntcResult<Reply> {
        warn!("CPU intc: command {command:?} not supported");
        Err(IntcError::Unsupported)
    }

    fn set_trap_vector(&mut self, mode: VectorMode, table: usize) {
        let mut mtvec = LocalRegisterCopy::<usize, MTVEC::Register>::new(self.csr.mtvec());
        match mode {
            VectorMode::Direct => {
                mtvec.set(table);
                mtvec.modify(MTVEC::MODE::Direct + MTVEC::SUBMODE.val(0));
            }
            VectorMode::Vectored => {
                mtvec.set(table);
                mtvec.modify(MTVEC::MODE::Vectored + MTVEC::SUBMODE.val(0));
            }
            // The CLIC modes keep the mtvec base and load the table into mtvt.
            VectorMode::Selective => {
                self.csr.set_mtvt(table);
                mtvec.modify(MTVEC::MODE::Clic + MTVEC::SUBMODE.val(0));
            }
            VectorMode::Hardware => {
                self.csr.set_mtvt(table);
                mtvec.modify(MTVEC::MODE::ClicVectored + MTVEC::SUBMODE.val(0));
            }
        }
        self.csr.set_mtvec(mtvec.get());
        debug!("Trap vector: {mode:?} @ {table:#x}");
    }

    fn trap_vector_mode(&self) -> VectorMode {
        let mtvec = LocalRegisterCopy::<usize, MTVEC::Register>::new(self.csr.mtvec());
        match mtvec.read_as_enum(MTVEC::MODE) {
            Some(MTVEC::MODE::Value::Vectored) => VectorMode::Vectored,
            Some(MTVEC::MODE::Value::Clic) => VectorMode::Selective,
            Some(MTVEC::MODE::Value::ClicVectored) => VectorMode::Hardware,
            Some(MTVEC::MODE::Value::Direct) | None => VectorMode::Direct,
        }
    }

    fn dispatch(&self, id: IntId) {
        if id.is_local() {
            self.handlers
                .dispatch(id.to_u32() as usize, id, self.shutdown);
        }
    }
}
