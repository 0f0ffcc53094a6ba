//! SiFive CLIC nested under the hart-local controller.

use log::{debug, trace, warn};
use tock_registers::{interfaces::*, registers::ReadWrite};

mod codec;
mod reg;
mod timer;

pub use codec::*;
pub use reg::{ClintReg, MAX_HARTS, MAX_INTERRUPTS, MMODE_APERTURE, ModeReg, Split64};
pub use timer::{read_counter, write_compare};

use crate::{
    Command, IntId, IntcError, IntcResult, LOCAL_LINES, Reply, VectorMode, VirtAddr,
    interface::{HandlerTable, InterruptController, IrqHandler, Slot},
};

/// Hardware description of one CLIC instance.
#[derive(Debug, Clone, Copy)]
pub struct Description {
    /// Base of the control region (CLINT block, then the mode apertures).
    pub control_base: VirtAddr,
    /// Implemented bits of each `clicintctl` byte.
    pub num_intbits: u8,
    /// Level bits the platform wants configured at init.
    pub max_levels: u8,
    /// Parent interrupts that aggregate this controller's lines.
    pub interrupt_lines: &'static [IntId],
    /// Hart whose `mtimecmp` this instance drives.
    pub hart: usize,
    /// Shared software trap entry.
    pub trap_entry: usize,
    /// Called with a diagnostic code when a claimed line has no handler.
    pub shutdown: fn(i32) -> !,
}

/// Index as reported in [`IntcError::OutOfRange`].
fn saturate(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Jump table installed as `mtvt` in hardware-vectored mode.
#[repr(C, align(64))]
struct VectorTable<const N: usize> {
    local: [usize; LOCAL_LINES],
    lines: [usize; N],
}

/// CLIC driver with `N` sub-interrupt lines, forwarding hart-local IDs to
/// `parent`.
pub struct Clic<P, const N: usize> {
    desc: Description,
    parent: P,
    handlers: HandlerTable<N>,
    vectors: VectorTable<N>,
    init_done: bool,
}

unsafe impl<P: Send, const N: usize> Send for Clic<P, N> {}

impl<P: InterruptController, const N: usize> Clic<P, N> {
    /// # Safety
    ///
    /// `desc.control_base` must map the whole CLIC control region. The
    /// controller must not move after a hardware vector table has been
    /// installed with [`InterruptController::enable_vector`].
    pub const unsafe fn new(desc: Description, parent: P) -> Self {
        const { assert!(N <= MAX_INTERRUPTS - LOCAL_LINES, "Too many CLIC lines") };
        assert!(desc.num_intbits <= 8, "clicintctl has at most 8 bits");
        assert!(desc.hart < MAX_HARTS, "Invalid hart index");
        Self {
            desc,
            parent,
            handlers: HandlerTable::new(),
            vectors: VectorTable {
                local: [desc.trap_entry; LOCAL_LINES],
                lines: [desc.trap_entry; N],
            },
            init_done: false,
        }
    }

    pub fn description(&self) -> &Description {
        &self.desc
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }

    pub fn parent_mut(&mut self) -> &mut P {
        &mut self.parent
    }

    fn clint(&self) -> &ClintReg {
        unsafe { &*self.desc.control_base.as_ptr() }
    }

    fn mmode(&self) -> &ModeReg {
        unsafe {
            &*self
                .desc
                .control_base
                .as_ptr::<u8>()
                .add(MMODE_APERTURE)
                .cast()
        }
    }

    /// Register index of `line`.
    fn check_line(line: usize) -> IntcResult<usize> {
        if line < N {
            Ok(line + LOCAL_LINES)
        } else {
            warn!("CLIC: line {line} out of range (0..{N})");
            Err(IntcError::OutOfRange { id: saturate(line) })
        }
    }

    fn layout(&self) -> LineLayout {
        LineLayout::new(self.read_config(), self.desc.num_intbits)
    }

    fn write_field(&self, index: usize, field: Field, value: u8) {
        if field.width == 0 {
            return;
        }
        let ctl = &self.mmode().INTCTL[index];
        ctl.set(field.insert(ctl.get(), value));
    }

    fn write_enable(&self, index: usize, enable: bool) {
        self.mmode().INTIE[index].set(enable as u8);
    }

    pub fn read_config(&self) -> ControllerConfig {
        ControllerConfig::decode(self.mmode().CFG.get())
    }

    /// Write `cliccfg` and return what the hardware kept.
    pub fn write_config(&self, cfg: ControllerConfig) -> ControllerConfig {
        self.mmode().CFG.set(cfg.encode());
        let effective = self.read_config();
        debug!("CLIC config: {effective:?}");
        effective
    }

    pub fn configure_privilege(&self, width: u8) -> ControllerConfig {
        let mut cfg = self.read_config();
        cfg.privilege_width = width.min(MAX_PRIVILEGE_BITS);
        self.write_config(cfg)
    }

    pub fn configure_level(&self, width: u8) -> ControllerConfig {
        let mut cfg = self.read_config();
        cfg.level_width = width.min(MAX_LEVEL_BITS);
        self.write_config(cfg)
    }

    /// Set the level of `line` from an 8-bit scaled value. Only the top
    /// level-width bits are kept.
    pub fn set_level(&self, line: usize, level: u8) -> IntcResult {
        let index = Self::check_line(line)?;
        self.write_field(index, self.layout().level, level);
        Ok(())
    }

    /// 255 when no level bits are configured.
    pub fn level(&self, line: usize) -> IntcResult<u8> {
        let index = Self::check_line(line)?;
        Ok(self.layout().level.extract(self.mmode().INTCTL[index].get()))
    }

    pub fn set_priority(&self, line: usize, priority: u8) -> IntcResult {
        let index = Self::check_line(line)?;
        self.write_field(index, self.layout().priority, priority);
        Ok(())
    }

    pub fn priority(&self, line: usize) -> IntcResult<u8> {
        let index = Self::check_line(line)?;
        Ok(self
            .layout()
            .priority
            .extract(self.mmode().INTCTL[index].get()))
    }

    /// Set the privilege mode (`0b00` user, `0b01` supervisor, `0b11`
    /// machine) `line` traps into.
    pub fn set_privilege(&self, line: usize, mode: u8) -> IntcResult {
        let index = Self::check_line(line)?;
        let field = self.layout().privilege;
        let bits = privilege_bits(field.width, mode).ok_or(IntcError::FieldOverflow {
            value: mode,
            width: field.width,
        })?;
        if field.width > 0 {
            let ctl = &self.mmode().INTCTL[index];
            ctl.set(field.with_bits(ctl.get(), bits));
        }
        Ok(())
    }

    pub fn privilege(&self, line: usize) -> IntcResult<u8> {
        let index = Self::check_line(line)?;
        let field = self.layout().privilege;
        Ok(privilege_mode(
            field.width,
            field.bits(self.mmode().INTCTL[index].get()),
        ))
    }

    /// Toggle hardware vectoring of `line` while the hart is in selective mode.
    pub fn set_vector(&self, line: usize, enable: bool) -> IntcResult {
        let index = Self::check_line(line)?;
        let bit = vector_bit(self.desc.num_intbits);
        let ctl = &self.mmode().INTCTL[index];
        let value = if enable {
            ctl.get() | bit
        } else {
            ctl.get() & !bit
        };
        ctl.set(value);
        Ok(())
    }

    pub fn is_vectored(&self, line: usize) -> bool {
        let bit = vector_bit(self.desc.num_intbits);
        Self::check_line(line).is_ok_and(|index| self.mmode().INTCTL[index].get() & bit != 0)
    }

    pub fn enable_line(&self, line: usize) -> IntcResult {
        let index = Self::check_line(line)?;
        self.write_enable(index, true);
        Ok(())
    }

    pub fn disable_line(&self, line: usize) -> IntcResult {
        let index = Self::check_line(line)?;
        self.write_enable(index, false);
        Ok(())
    }

    pub fn is_line_enabled(&self, line: usize) -> bool {
        Self::check_line(line).is_ok_and(|index| self.mmode().INTIE[index].get() & 1 != 0)
    }

    pub fn is_line_pending(&self, line: usize) -> bool {
        Self::check_line(line).is_ok_and(|index| self.mmode().INTIP[index].get() & 1 != 0)
    }

    /// Pending bits are owned by the hardware; only the line is validated.
    pub fn set_pending(&self, line: usize) -> IntcResult {
        Self::check_line(line)?;
        // TODO: drive clicintip once software-writable pending is confirmed
        trace!("CLIC: set_pending({line}) ignored");
        Ok(())
    }

    pub fn clear_pending(&self, line: usize) -> IntcResult {
        Self::check_line(line)?;
        trace!("CLIC: clear_pending({line}) ignored");
        Ok(())
    }

    /// Context registered for `line`, `None` while the line is unclaimed.
    pub fn handler_context(&self, line: usize) -> Option<*mut ()> {
        self.handlers.get(line).and_then(Slot::context)
    }

    /// Address of the hardware vector table.
    pub fn vector_table(&self) -> usize {
        &self.vectors as *const VectorTable<N> as usize
    }

    pub fn mtime(&self) -> u64 {
        self.clint().MTIME.load()
    }

    pub fn mtimecmp(&self) -> u64 {
        self.clint().MTIMECMP[self.desc.hart].load()
    }

    pub fn set_mtimecmp(&self, value: u64) {
        trace!("CLIC: hart {} mtimecmp <- {value:#x}", self.desc.hart);
        self.clint().MTIMECMP[self.desc.hart].store(value);
    }

    fn msip(&self, hart: usize) -> IntcResult<&ReadWrite<u32>> {
        self.clint().MSIP.get(hart).ok_or_else(|| {
            warn!("CLIC: hart {hart} out of range");
            IntcError::OutOfRange { id: saturate(hart) }
        })
    }

    /// Selective and hardware vectoring of a single line.
    fn line_vector(&mut self, line: usize, mode: Option<VectorMode>) -> IntcResult {
        Self::check_line(line)?;
        if let Some(mode @ (VectorMode::Direct | VectorMode::Vectored)) = mode {
            warn!("CLIC: {mode:?} is not a per-line vector mode");
            return Err(IntcError::InvalidVectorMode(mode));
        }
        if self.parent.trap_vector_mode() != VectorMode::Selective {
            warn!("CLIC: line {line} vectoring needs selective mode");
            return Err(IntcError::NotSelective);
        }
        self.set_vector(line, mode.is_some())
    }
}

impl<P: InterruptController, const N: usize> InterruptController for Clic<P, N> {
    fn init(&mut self) {
        if self.init_done {
            return;
        }
        trace!("Initializing CLIC@{}...", self.desc.control_base);
        // 1. Bring up the parent and route traps through the shared entry
        self.parent.init();
        self.parent
            .set_trap_vector(VectorMode::Selective, self.desc.trap_entry);

        // 2. Claim the parent lines this controller aggregates
        let owner = self as *mut Self as *mut ();
        for &id in self.desc.interrupt_lines {
            if let Err(e) = self.parent.register_handler(id, None, owner) {
                warn!("CLIC: parent refused {id:?}: {e}");
            }
        }

        // 3. Default configuration, all level bits and no privilege bits
        let cfg = self.write_config(ControllerConfig {
            privilege_width: 0,
            level_width: self.desc.max_levels.min(MAX_LEVEL_BITS),
            vectored: false,
        });
        let level = LineLayout::new(cfg, self.desc.num_intbits).level;

        // 4. Every line unclaimed, disabled and at the highest level
        for line in 0..N {
            self.handlers.clear(line);
            self.vectors.lines[line] = self.desc.trap_entry;
            self.write_enable(line + LOCAL_LINES, false);
            self.write_field(line + LOCAL_LINES, level, u8::MAX);
        }
        trace!("[CLIC] {N} lines disabled at level {:#x}", level.extract(u8::MAX));
        self.init_done = true;
    }

    fn register_handler(
        &mut self,
        id: IntId,
        handler: Option<IrqHandler>,
        context: *mut (),
    ) -> IntcResult {
        let Some(line) = id.sub_line() else {
            return self.parent.register_handler(id, handler, context);
        };
        let line = line as usize;
        Self::check_line(line)?;
        self.handlers.register(line, handler, context);
        self.vectors.lines[line] = handler.map_or(self.desc.trap_entry, |h| h as usize);
        debug!("CLIC: {id:?} claimed, handler={}", handler.is_some());
        Ok(())
    }

    fn enable(&mut self, id: IntId) -> IntcResult {
        match id.sub_line() {
            None => self.parent.enable(id),
            Some(line) => self.enable_line(line as usize),
        }
    }

    fn disable(&mut self, id: IntId) -> IntcResult {
        match id.sub_line() {
            None => self.parent.disable(id),
            Some(line) => self.disable_line(line as usize),
        }
    }

    fn enable_vector(&mut self, id: IntId, mode: VectorMode) -> IntcResult {
        if let Some(line) = id.sub_line() {
            return self.line_vector(line as usize, Some(mode));
        }
        if id != IntId::BASE {
            return Err(IntcError::Unsupported);
        }
        match mode {
            VectorMode::Selective => {
                self.parent.set_trap_vector(mode, self.desc.trap_entry);
                Ok(())
            }
            VectorMode::Hardware => {
                let table = self.vector_table();
                self.parent.set_trap_vector(mode, table);
                Ok(())
            }
            mode => {
                warn!("CLIC: base vector mode {mode:?} rejected");
                Err(IntcError::InvalidVectorMode(mode))
            }
        }
    }

    fn disable_vector(&mut self, id: IntId) -> IntcResult {
        if let Some(line) = id.sub_line() {
            return self.line_vector(line as usize, None);
        }
        if id != IntId::BASE {
            return Err(IntcError::Unsupported);
        }
        self.parent
            .set_trap_vector(VectorMode::Selective, self.desc.trap_entry);
        Ok(())
    }

    fn command(&mut self, command: Command) -> IntcResult<Reply> {
        match command {
            Command::MtimeGet => Ok(Reply::Time(self.mtime())),
            Command::MtimecmpSet(value) => {
                self.set_mtimecmp(value);
                Ok(Reply::Done)
            }
            Command::SoftwareIpiSet { hart } => {
                self.msip(hart)?.set(1);
                Ok(Reply::Done)
            }
            Command::SoftwareIpiClear { hart } => {
                self.msip(hart)?.set(0);
                Ok(Reply::Done)
            }
            Command::SoftwareMsipGet { hart } => Ok(Reply::Msip(self.msip(hart)?.get() & 1 != 0)),
        }
    }

    fn set_trap_vector(&mut self, mode: VectorMode, table: usize) {
        self.parent.set_trap_vector(mode, table)
    }

    fn trap_vector_mode(&self) -> VectorMode {
        self.parent.trap_vector_mode()
    }

    fn dispatch(&self, id: IntId) {
        match id.sub_line() {
            None => self.parent.dispatch(id),
            Some(line) => {
                self.handlers
                    .dispatch(line as usize, id, self.desc.shutdown);
            }
        }
    }
}
