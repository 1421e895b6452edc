//! 6502 instruction set tables shared by the CPU decoder and the assembler
//! encoder — the "same binary surface" both subsystems are built from.
//!
//! Two views over one data set, as the design notes for this crate prefer:
//! a fixed 256-entry array keyed by opcode byte (decode direction) and a
//! mnemonic+mode lookup (encode direction) derived from the same array.

/// The 14 addressing modes named in the instruction-set design.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddressingMode {
    pub fn name(self) -> &'static str {
        match self {
            AddressingMode::Implicit => "implicit",
            AddressingMode::Accumulator => "accumulator",
            AddressingMode::Immediate => "immediate",
            AddressingMode::ZeroPage => "zero-page",
            AddressingMode::ZeroPageX => "zero-page,X",
            AddressingMode::ZeroPageY => "zero-page,Y",
            AddressingMode::Absolute => "absolute",
            AddressingMode::AbsoluteX => "absolute,X",
            AddressingMode::AbsoluteY => "absolute,Y",
            AddressingMode::Indirect => "indirect",
            AddressingMode::IndirectX => "indexed-indirect (X)",
            AddressingMode::IndirectY => "indirect-indexed (Y)",
            AddressingMode::Relative => "relative",
        }
    }

    /// Encoded size in bytes (opcode included), per spec's size(m,v) rule.
    pub fn size(self) -> u8 {
        match self {
            AddressingMode::Implicit | AddressingMode::Accumulator => 1,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::Relative => 2,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 3,
        }
    }
}

/// One entry in the opcode table: the decoded shape of a single byte value.
#[derive(Clone, Copy, Debug)]
pub struct OpInfo {
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    pub cycles: u8,
}

use AddressingMode::*;

const fn op(mnemonic: &'static str, mode: AddressingMode, cycles: u8) -> Option<OpInfo> {
    Some(OpInfo {
        mnemonic,
        mode,
        cycles,
    })
}

/// All 256 opcode slots; `None` marks an opcode with no official 6502
/// instruction mapped to it (the CPU's illegal-opcode halt path handles
/// these at runtime; the assembler never emits them).
pub const OPCODE_TABLE: [Option<OpInfo>; 256] = {
    let mut t: [Option<OpInfo>; 256] = [None; 256];
    t[0x00] = op("BRK", Implicit, 7);
    t[0x01] = op("ORA", IndirectX, 6);
    t[0x05] = op("ORA", ZeroPage, 3);
    t[0x06] = op("ASL", ZeroPage, 5);
    t[0x08] = op("PHP", Implicit, 3);
    t[0x09] = op("ORA", Immediate, 2);
    t[0x0A] = op("ASL", Accumulator, 2);
    t[0x0D] = op("ORA", Absolute, 4);
    t[0x0E] = op("ASL", Absolute, 6);
    t[0x10] = op("BPL", Relative, 2);
    t[0x11] = op("ORA", IndirectY, 5);
    t[0x15] = op("ORA", ZeroPageX, 4);
    t[0x16] = op("ASL", ZeroPageX, 6);
    t[0x18] = op("CLC", Implicit, 2);
    t[0x19] = op("ORA", AbsoluteY, 4);
    t[0x1D] = op("ORA", AbsoluteX, 4);
    t[0x1E] = op("ASL", AbsoluteX, 7);
    t[0x20] = op("JSR", Absolute, 6);
    t[0x21] = op("AND", IndirectX, 6);
    t[0x24] = op("BIT", ZeroPage, 3);
    t[0x25] = op("AND", ZeroPage, 3);
    t[0x26] = op("ROL", ZeroPage, 5);
    t[0x28] = op("PLP", Implicit, 4);
    t[0x29] = op("AND", Immediate, 2);
    t[0x2A] = op("ROL", Accumulator, 2);
    t[0x2C] = op("BIT", Absolute, 4);
    t[0x2D] = op("AND", Absolute, 4);
    t[0x2E] = op("ROL", Absolute, 6);
    t[0x30] = op("BMI", Relative, 2);
    t[0x31] = op("AND", IndirectY, 5);
    t[0x35] = op("AND", ZeroPageX, 4);
    t[0x36] = op("ROL", ZeroPageX, 6);
    t[0x38] = op("SEC", Implicit, 2);
    t[0x39] = op("AND", AbsoluteY, 4);
    t[0x3D] = op("AND", AbsoluteX, 4);
    t[0x3E] = op("ROL", AbsoluteX, 7);
    t[0x40] = op("RTI", Implicit, 6);
    t[0x41] = op("EOR", IndirectX, 6);
    t[0x45] = op("EOR", ZeroPage, 3);
    t[0x46] = op("LSR", ZeroPage, 5);
    t[0x48] = op("PHA", Implicit, 3);
    t[0x49] = op("EOR", Immediate, 2);
    t[0x4A] = op("LSR", Accumulator, 2);
    t[0x4C] = op("JMP", Absolute, 3);
    t[0x4D] = op("EOR", Absolute, 4);
    t[0x4E] = op("LSR", Absolute, 6);
    t[0x50] = op("BVC", Relative, 2);
    t[0x51] = op("EOR", IndirectY, 5);
    t[0x55] = op("EOR", ZeroPageX, 4);
    t[0x56] = op("LSR", ZeroPageX, 6);
    t[0x58] = op("CLI", Implicit, 2);
    t[0x59] = op("EOR", AbsoluteY, 4);
    t[0x5D] = op("EOR", AbsoluteX, 4);
    t[0x5E] = op("LSR", AbsoluteX, 7);
    t[0x60] = op("RTS", Implicit, 6);
    t[0x61] = op("ADC", IndirectX, 6);
    t[0x65] = op("ADC", ZeroPage, 3);
    t[0x66] = op("ROR", ZeroPage, 5);
    t[0x68] = op("PLA", Implicit, 4);
    t[0x69] = op("ADC", Immediate, 2);
    t[0x6A] = op("ROR", Accumulator, 2);
    t[0x6C] = op("JMP", Indirect, 5);
    t[0x6D] = op("ADC", Absolute, 4);
    t[0x6E] = op("ROR", Absolute, 6);
    t[0x70] = op("BVS", Relative, 2);
    t[0x71] = op("ADC", IndirectY, 5);
    t[0x75] = op("ADC", ZeroPageX, 4);
    t[0x76] = op("ROR", ZeroPageX, 6);
    t[0x78] = op("SEI", Implicit, 2);
    t[0x79] = op("ADC", AbsoluteY, 4);
    t[0x7D] = op("ADC", AbsoluteX, 4);
    t[0x7E] = op("ROR", AbsoluteX, 7);
    t[0x81] = op("STA", IndirectX, 6);
    t[0x84] = op("STY", ZeroPage, 3);
    t[0x85] = op("STA", ZeroPage, 3);
    t[0x86] = op("STX", ZeroPage, 3);
    t[0x88] = op("DEY", Implicit, 2);
    t[0x8A] = op("TXA", Implicit, 2);
    t[0x8C] = op("STY", Absolute, 4);
    t[0x8D] = op("STA", Absolute, 4);
    t[0x8E] = op("STX", Absolute, 4);
    t[0x90] = op("BCC", Relative, 2);
    t[0x91] = op("STA", IndirectY, 6);
    t[0x94] = op("STY", ZeroPageX, 4);
    t[0x95] = op("STA", ZeroPageX, 4);
    t[0x96] = op("STX", ZeroPageY, 4);
    t[0x98] = op("TYA", Implicit, 2);
    t[0x99] = op("STA", AbsoluteY, 5);
    t[0x9A] = op("TXS", Implicit, 2);
    t[0x9D] = op("STA", AbsoluteX, 5);
    t[0xA0] = op("LDY", Immediate, 2);
    t[0xA1] = op("LDA", IndirectX, 6);
    t[0xA2] = op("LDX", Immediate, 2);
    t[0xA4] = op("LDY", ZeroPage, 3);
    t[0xA5] = op("LDA", ZeroPage, 3);
    t[0xA6] = op("LDX", ZeroPage, 3);
    t[0xA8] = op("TAY", Implicit, 2);
    t[0xA9] = op("LDA", Immediate, 2);
    t[0xAA] = op("TAX", Implicit, 2);
    t[0xAC] = op("LDY", Absolute, 4);
    t[0xAD] = op("LDA", Absolute, 4);
    t[0xAE] = op("LDX", Absolute, 4);
    t[0xB0] = op("BCS", Relative, 2);
    t[0xB1] = op("LDA", IndirectY, 5);
    t[0xB4] = op("LDY", ZeroPageX, 4);
    t[0xB5] = op("LDA", ZeroPageX, 4);
    t[0xB6] = op("LDX", ZeroPageY, 4);
    t[0xB8] = op("CLV", Implicit, 2);
    t[0xB9] = op("LDA", AbsoluteY, 4);
    t[0xBA] = op("TSX", Implicit, 2);
    t[0xBC] = op("LDY", AbsoluteX, 4);
    t[0xBD] = op("LDA", AbsoluteX, 4);
    t[0xBE] = op("LDX", AbsoluteY, 4);
    t[0xC0] = op("CPY", Immediate, 2);
    t[0xC1] = op("CMP", IndirectX, 6);
    t[0xC4] = op("CPY", ZeroPage, 3);
    t[0xC5] = op("CMP", ZeroPage, 3);
    t[0xC6] = op("DEC", ZeroPage, 5);
    t[0xC8] = op("INY", Implicit, 2);
    t[0xC9] = op("CMP", Immediate, 2);
    t[0xCA] = op("DEX", Implicit, 2);
    t[0xCC] = op("CPY", Absolute, 4);
    t[0xCD] = op("CMP", Absolute, 4);
    t[0xCE] = op("DEC", Absolute, 6);
    t[0xD0] = op("BNE", Relative, 2);
    t[0xD1] = op("CMP", IndirectY, 5);
    t[0xD5] = op("CMP", ZeroPageX, 4);
    t[0xD6] = op("DEC", ZeroPageX, 6);
    t[0xD8] = op("CLD", Implicit, 2);
    t[0xD9] = op("CMP", AbsoluteY, 4);
    t[0xDD] = op("CMP", AbsoluteX, 4);
    t[0xDE] = op("DEC", AbsoluteX, 7);
    t[0xE0] = op("CPX", Immediate, 2);
    t[0xE1] = op("SBC", IndirectX, 6);
    t[0xE4] = op("CPX", ZeroPage, 3);
    t[0xE5] = op("SBC", ZeroPage, 3);
    t[0xE6] = op("INC", ZeroPage, 5);
    t[0xE8] = op("INX", Implicit, 2);
    t[0xE9] = op("SBC", Immediate, 2);
    t[0xEA] = op("NOP", Implicit, 2);
    t[0xEC] = op("CPX", Absolute, 4);
    t[0xED] = op("SBC", Absolute, 4);
    t[0xEE] = op("INC", Absolute, 6);
    t[0xF0] = op("BEQ", Relative, 2);
    t[0xF1] = op("SBC", IndirectY, 5);
    t[0xF5] = op("SBC", ZeroPageX, 4);
    t[0xF6] = op("INC", ZeroPageX, 6);
    t[0xF8] = op("SED", Implicit, 2);
    t[0xF9] = op("SBC", AbsoluteY, 4);
    t[0xFD] = op("SBC", AbsoluteX, 4);
    t[0xFE] = op("INC", AbsoluteX, 7);
    t
};

/// Decode an opcode byte. `None` means illegal/unmapped.
pub fn decode(opcode: u8) -> Option<OpInfo> {
    OPCODE_TABLE[opcode as usize]
}

/// Encode direction: mnemonic + addressing mode -> (opcode, size). Used by
/// the assembler's second pass. Mnemonic matching is case-sensitive
/// uppercase, as produced by the lexer.
pub fn encode(mnemonic: &str, mode: AddressingMode) -> Option<(u8, u8)> {
    for (opcode, slot) in OPCODE_TABLE.iter().enumerate() {
        if let Some(info) = slot {
            if info.mnemonic == mnemonic && info.mode == mode {
                return Some((opcode as u8, mode.size()));
            }
        }
    }
    None
}

/// All addressing modes a mnemonic supports, in opcode order. Used to build
/// diagnostics ("X cannot use Y addressing mode").
pub fn supported_modes(mnemonic: &str) -> Vec<AddressingMode> {
    let mut modes = Vec::new();
    for slot in OPCODE_TABLE.iter().flatten() {
        if slot.mnemonic == mnemonic && !modes.contains(&slot.mode) {
            modes.push(slot.mode);
        }
    }
    modes
}

pub const BRANCH_MNEMONICS: [&str; 8] = [
    "BCC", "BCS", "BEQ", "BNE", "BMI", "BPL", "BVC", "BVS",
];

pub fn is_branch_mnemonic(mnemonic: &str) -> bool {
    BRANCH_MNEMONICS.contains(&mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_opcodes() {
        let lda_imm = decode(0xA9).unwrap();
        assert_eq!(lda_imm.mnemonic, "LDA");
        assert_eq!(lda_imm.mode, AddressingMode::Immediate);
        assert_eq!(lda_imm.cycles, 2);

        let brk = decode(0x00).unwrap();
        assert_eq!(brk.mnemonic, "BRK");
        assert_eq!(brk.cycles, 7);
    }

    #[test]
    fn illegal_opcode_decodes_to_none() {
        assert!(decode(0x02).is_none());
        assert!(decode(0xFF).is_none());
    }

    #[test]
    fn encode_round_trips_with_decode() {
        for opcode in 0u16..256 {
            if let Some(info) = decode(opcode as u8) {
                let (encoded, size) = encode(info.mnemonic, info.mode).unwrap();
                assert_eq!(encoded, opcode as u8);
                assert_eq!(size, info.mode.size());
            }
        }
    }

    #[test]
    fn branch_mnemonics_force_relative() {
        for m in BRANCH_MNEMONICS {
            assert!(is_branch_mnemonic(m));
            let modes = supported_modes(m);
            assert_eq!(modes, vec![AddressingMode::Relative]);
        }
    }

    #[test]
    fn addressing_error_reports_unsupported_combo() {
        assert!(encode("LDA", AddressingMode::Implicit).is_none());
        assert!(encode("TAX", AddressingMode::Immediate).is_none());
    }

    proptest::proptest! {
        #[test]
        fn decoded_mode_size_matches_reencoded_byte_count(opcode in 0u8..=255) {
            if let Some(info) = decode(opcode) {
                let size = info.mode.size();
                proptest::prop_assert!((1..=3).contains(&size));
                let (reencoded, reencoded_size) = encode(info.mnemonic, info.mode).unwrap();
                proptest::prop_assert_eq!(reencoded, opcode);
                proptest::prop_assert_eq!(reencoded_size, size);
            }
        }
    }
}
