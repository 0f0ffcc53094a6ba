use log::{error, trace};

use crate::{Command, IntId, IntcResult, Reply, UNHANDLED_INTERRUPT_CODE, VectorMode};

/// Interrupt handler: receives the raw ID that fired and the context pointer
/// given at registration.
pub type IrqHandler = fn(IntId, *mut ());

/// Operations shared by the root (hart-local) controller and nested
/// controllers. A nested controller forwards hart-local IDs to its parent
/// through this trait.
pub trait InterruptController {
    /// Bring the controller to its default state. Repeated calls are no-ops.
    fn init(&mut self);

    /// Claim `id`. With `handler == None` the line is claimed by the default
    /// handler, which shuts the system down when the line fires.
    fn register_handler(
        &mut self,
        id: IntId,
        handler: Option<IrqHandler>,
        context: *mut (),
    ) -> IntcResult;

    fn enable(&mut self, id: IntId) -> IntcResult;

    fn disable(&mut self, id: IntId) -> IntcResult;

    /// `IntId::BASE` switches the controller-wide mode, other IDs switch a
    /// single line.
    fn enable_vector(&mut self, id: IntId, mode: VectorMode) -> IntcResult;

    fn disable_vector(&mut self, id: IntId) -> IntcResult;

    fn command(&mut self, command: Command) -> IntcResult<Reply>;

    /// Program the hart trap vector (`mtvec`, and `mtvt` in CLIC modes).
    fn set_trap_vector(&mut self, mode: VectorMode, table: usize);

    fn trap_vector_mode(&self) -> VectorMode;

    /// Route a trap reported for `id` to its handler.
    fn dispatch(&self, id: IntId);
}

impl<T: InterruptController + ?Sized> InterruptController for &mut T {
    fn init(&mut self) {
        (**self).init()
    }

    fn register_handler(
        &mut self,
        id: IntId,
        handler: Option<IrqHandler>,
        context: *mut (),
    ) -> IntcResult {
        (**self).register_handler(id, handler, context)
    }

    fn enable(&mut self, id: IntId) -> IntcResult {
        (**self).enable(id)
    }

    fn disable(&mut self, id: IntId) -> IntcResult {
        (**self).disable(id)
    }

    fn enable_vector(&mut self, id: IntId, mode: VectorMode) -> IntcResult {
        (**self).enable_vector(id, mode)
    }

    fn disable_vector(&mut self, id: IntId) -> IntcResult {
        (**self).disable_vector(id)
    }

    fn command(&mut self, command: Command) -> IntcResult<Reply> {
        (**self).command(command)
    }

    fn set_trap_vector(&mut self, mode: VectorMode, table: usize) {
        (**self).set_trap_vector(mode, table)
    }

    fn trap_vector_mode(&self) -> VectorMode {
        (**self).trap_vector_mode()
    }

    fn dispatch(&self, id: IntId) {
        (**self).dispatch(id)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Slot {
    Vacant,
    /// Claimed without a handler. `owner` is the context given at
    /// registration, usually the nested controller itself.
    Fatal { owner: *mut () },
    Isr {
        handler: IrqHandler,
        context: *mut (),
    },
}

impl Slot {
    /// Context pointer given at registration, `None` for vacant slots.
    pub fn context(&self) -> Option<*mut ()> {
        match *self {
            Slot::Vacant => None,
            Slot::Fatal { owner } => Some(owner),
            Slot::Isr { context, .. } => Some(context),
        }
    }
}

/// Per-line handler slots, indexed by the controller's own line offset.
pub(crate) struct HandlerTable<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> HandlerTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::Vacant; N],
        }
    }

    pub fn register(&mut self, index: usize, handler: Option<IrqHandler>, context: *mut ()) {
        self.slots[index] = match handler {
            Some(handler) => Slot::Isr { handler, context },
            None => Slot::Fatal { owner: context },
        };
    }

    pub fn clear(&mut self, index: usize) {
        self.slots[index] = Slot::Vacant;
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Returns `false` when nothing claimed the slot.
    pub fn dispatch(&self, index: usize, id: IntId, shutdown: fn(i32) -> !) -> bool {
        match self.slots.get(index) {
            Some(Slot::Isr { handler, context }) => {
                handler(id, *context);
                true
            }
            Some(Slot::Fatal { .. }) => {
                error!("Unhandled interrupt {id:?}, shutting down");
                shutdown(UNHANDLED_INTERRUPT_CODE)
            }
            Some(Slot::Vacant) | None => {
                trace!("Spurious interrupt {id:?}: no handler registered");
                false
            }
        }
    }
}
