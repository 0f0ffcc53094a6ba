use tock_registers::interfaces::{Readable, Writeable};

/// Read a 64-bit counter through its two 32-bit halves.
///
/// The high word is sampled before and after the low word; when the two
/// samples differ the low word wrapped in between and the sequence restarts.
pub fn read_counter<L, H>(lo: &L, hi: &H) -> u64
where
    L: Readable<T = u32>,
    H: Readable<T = u32>,
{
    loop {
        let high = hi.get();
        let low = lo.get();
        if hi.get() == high {
            return (u64::from(high) << 32) | u64::from(low);
        }
    }
}

/// Write a 64-bit compare value through its two 32-bit halves.
///
/// The high word is parked at all-ones first so the intermediate compare
/// value is never due; the real high word is committed last.
pub fn write_compare<L, H>(lo: &L, hi: &H, value: u64)
where
    L: Writeable<T = u32>,
    H: Writeable<T = u32>,
{
    hi.set(u32::MAX);
    lo.set(value as u32);
    hi.set((value >> 32) as u32);
}
