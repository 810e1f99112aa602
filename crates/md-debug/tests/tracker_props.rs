#![cfg(not(target_arch = "wasm32"))]

use std::collections::{BTreeSet, HashMap};

use md_debug::ExecTracker;
use md_disasm::{svp, z80, Isa};
use proptest::prelude::*;

fn svp_inst(pc: u16) -> svp::Instruction {
    svp::Svp::build(&svp::Step {
        pc,
        mnemonic: svp::Mnemonic::Ld,
        op1: svp::OperandKind::NoOperand,
        op2: svp::OperandKind::NoOperand,
        words: [0x0000, 0x0000],
        nwords: 1,
        ri: [svp::RegIndirect::default(); 2],
        cond_f: false,
        simm: 0,
        adr: svp::RamAddr::default(),
    })
}

fn z80_inst(pc: u16) -> z80::Instruction {
    z80::Z80::build(&z80::Step {
        pc,
        mnemonic: z80::Mnemonic::Nop,
        op1: z80::OperandKind::NoOperand,
        op2: z80::OperandKind::NoOperand,
        bytes: vec![0x00],
        extra1: z80::ExtraPayload::default(),
        extra2: z80::ExtraPayload::default(),
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn hits_grow_by_one_and_max_never_drops(pcs in proptest::collection::vec(0u16..64, 1..200)) {
        let mut tracker = ExecTracker::<svp::Svp>::new();
        let mut expected: HashMap<u16, u64> = HashMap::new();
        let mut max = 0;

        for pc in pcs {
            let addr = pc.wrapping_sub(1);
            let hits = tracker.record(svp_inst(pc));
            let count = expected.entry(addr).or_insert(0);
            *count += 1;
            prop_assert_eq!(hits, Some(*count));

            prop_assert!(tracker.max_hits() >= max);
            max = tracker.max_hits();
            prop_assert_eq!(max, expected.values().copied().max().unwrap_or(0));
        }
    }

    #[test]
    fn out_of_table_addresses_never_appear(pcs in proptest::collection::vec(any::<u16>(), 0..100)) {
        let mut tracker = ExecTracker::<z80::Z80>::new();
        let mut in_range = BTreeSet::new();

        for pc in pcs {
            let addr = u32::from(pc.wrapping_sub(1));
            let hits = tracker.record(z80_inst(pc));
            if (addr as usize) < z80::TABLE_LEN {
                prop_assert!(hits.is_some());
                in_range.insert(addr);
            } else {
                prop_assert_eq!(hits, None);
            }
        }

        let seen: BTreeSet<u32> = tracker.entries().map(|(addr, _)| addr).collect();
        prop_assert_eq!(&seen, &in_range);
        prop_assert_eq!(tracker.is_allocated(), !in_range.is_empty());

        let mut out = Vec::new();
        tracker.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let printed = text.lines().filter(|l| !l.is_empty()).count();
        prop_assert_eq!(printed, in_range.len());
    }
}
