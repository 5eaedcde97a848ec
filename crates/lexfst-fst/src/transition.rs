// Fixed-size transition slots of the compiled format.

use bytemuck::{Pod, Zeroable};

/// One 8-byte slot of a compiled section's transition table.
///
/// - `sym_in` (u16): input symbol id, or one of the sentinels below
/// - `sym_out` (u16): output symbol id
/// - `trans_info` (u32): target state in bits 0-23 and, on the first slot of
///   a state, the number of further slots in bits 24-31
///
/// A state is addressed by the index of its first slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Slot {
    pub sym_in: u16,
    pub sym_out: u16,
    pub trans_info: u32,
}

/// `sym_in` of the slot marking a state as final.
pub const FINAL_SYM: u16 = 0xFFFF;

/// `sym_in` of the only slot of a state with no way out.
pub const DEAD_SYM: u16 = 0xFFFE;

/// Largest slot index a transition can target (24 bits).
pub const MAX_SLOT_INDEX: usize = 0x00FF_FFFF;

/// `more_transitions` value announcing an overflow cell in the next slot.
pub const OVERFLOW_MARK: u8 = 255;

impl Slot {
    pub fn new(sym_in: u16, sym_out: u16, target: u32, more: u8) -> Self {
        Self {
            sym_in,
            sym_out,
            trans_info: (target & 0x00FF_FFFF) | ((more as u32) << 24),
        }
    }

    pub fn final_marker() -> Self {
        Self::new(FINAL_SYM, 0, 0, 0)
    }

    pub fn dead() -> Self {
        Self::new(DEAD_SYM, 0, 0, 0)
    }

    /// Extract the target state index (bits 0-23).
    #[inline]
    pub fn target_state(&self) -> u32 {
        self.trans_info & 0x00FF_FFFF
    }

    /// Extract the more_transitions count (bits 24-31).
    #[inline]
    pub fn more_transitions(&self) -> u8 {
        (self.trans_info >> 24) as u8
    }

    /// Overwrite the more_transitions count, keeping the target.
    #[inline]
    pub fn set_more_transitions(&mut self, more: u8) {
        self.trans_info = (self.trans_info & 0x00FF_FFFF) | ((more as u32) << 24);
    }

    #[inline]
    pub fn is_final_marker(&self) -> bool {
        self.sym_in == FINAL_SYM
    }
}

/// Overflow cell (8 bytes).
///
/// When the first slot of a state has `more_transitions == 255`, the next slot
/// is an overflow cell holding the real count.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OverflowCell {
    pub more_transitions: u32,
    pub _padding: u32,
}

/// Encode an overflow cell as a slot.
pub fn overflow_slot(more_transitions: u32) -> Slot {
    bytemuck::cast(OverflowCell {
        more_transitions,
        _padding: 0,
    })
}

/// Compute the maximum slot offset (0-based) for a state, given the index of
/// its first slot.
///
/// If `more_transitions < 255`, the state has `more_transitions + 1` slots
/// (offsets 0..=more_transitions). If `more_transitions == 255`, slot 1 is an
/// `OverflowCell` whose `more_transitions` field gives the adjusted count and
/// is skipped during traversal.
#[inline]
pub fn max_tc(slots: &[Slot], state_index: u32) -> u32 {
    let state_head = &slots[state_index as usize];
    let max_tc = state_head.more_transitions() as u32;
    if max_tc == OVERFLOW_MARK as u32 {
        let oc: OverflowCell = bytemuck::cast(slots[state_index as usize + 1]);
        oc.more_transitions + 1
    } else {
        max_tc
    }
}

const _: () = assert!(size_of::<Slot>() == 8);
const _: () = assert!(size_of::<OverflowCell>() == 8);
