/// Resolved extra value of one operand slot.
///
/// Which variant a slot holds is fixed by the slot's operand kind; the
/// per-architecture builders are the only producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    /// Immediate, absolute address or any other value printed in hex.
    Imm(u32),
    /// Signed value printed in decimal (vector, displacement, count).
    Int(i32),
    /// Register number.
    Reg(u8),
    /// DSP pointer register and its modifier.
    RegMod { reg: u8, modifier: i8 },
    /// `(d16,An)` / `(d16,PC)`.
    BaseDisp { disp: i16, base: u8 },
    /// `(d8,An,Xn.s)` / `(d8,PC,Xn.s)`.
    Indexed {
        disp: i8,
        base: u8,
        index: u8,
        index_is_data: bool,
        index_is_word: bool,
    },
    /// Relative branch: signed offset and resolved target.
    Branch { offset: i32, target: u32 },
    /// MOVEM register mask, bit 0 = D0 .. bit 15 = A7.
    RegList(u16),
}

impl Extra {
    pub fn imm(self) -> Option<u32> {
        match self {
            Self::Imm(v) => Some(v),
            _ => None,
        }
    }

    pub fn int(self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn reg(self) -> Option<u8> {
        match self {
            Self::Reg(r) => Some(r),
            _ => None,
        }
    }
}
