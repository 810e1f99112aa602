//! Per-architecture execution-frequency table.

use std::fmt;
use std::io::{self, Write};

use md_disasm::Isa;
use serde::Serialize;
use tracing::{debug, trace};

/// One traced address: the latest decode seen there and how many times it
/// was fetched.
pub struct ExecRecord<I: Isa> {
    inst: I::Inst,
    hits: u64,
}

impl<I: Isa> ExecRecord<I> {
    pub fn inst(&self) -> &I::Inst {
        &self.inst
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

impl<I: Isa> Clone for ExecRecord<I> {
    fn clone(&self) -> Self {
        Self {
            inst: self.inst.clone(),
            hits: self.hits,
        }
    }
}

impl<I: Isa> fmt::Debug for ExecRecord<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecRecord")
            .field("inst", &self.inst)
            .field("hits", &self.hits)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EntrySnapshot {
    address: u32,
    hits: u64,
    text: String,
}

/// Sparse address-indexed table of [`ExecRecord`]s covering
/// `0..I::TABLE_LEN`.
///
/// The table is allocated on the first recorded instruction and released by
/// [`ExecTracker::clear`] or on drop.
pub struct ExecTracker<I: Isa> {
    table: Option<Box<[Option<Box<ExecRecord<I>>>]>>,
    max_hits: u64,
}

impl<I: Isa> Default for ExecTracker<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Isa> fmt::Debug for ExecTracker<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecTracker")
            .field("arch", &I::NAME)
            .field("allocated", &self.is_allocated())
            .field("max_hits", &self.max_hits)
            .finish()
    }
}

impl<I: Isa> ExecTracker<I> {
    pub const fn new() -> Self {
        Self {
            table: None,
            max_hits: 0,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.table.is_some()
    }

    /// Highest hit count of any address since the last clear.
    pub fn max_hits(&self) -> u64 {
        self.max_hits
    }

    /// Records one fetch of `inst` and returns the new hit count at its
    /// address, or `None` when the address is outside the table.
    ///
    /// A re-fetch replaces the stored decode and keeps counting.
    pub fn record(&mut self, inst: I::Inst) -> Option<u64> {
        let addr = I::address(&inst) as usize;
        if addr >= I::TABLE_LEN {
            trace!(arch = I::NAME, addr, "address outside trace table, dropped");
            return None;
        }

        let table = self.table.get_or_insert_with(|| {
            debug!(arch = I::NAME, len = I::TABLE_LEN, "allocating trace table");
            // All-`None` is the zero bit pattern, so this is a zeroed
            // allocation the OS commits page by page.
            vec![None; I::TABLE_LEN].into_boxed_slice()
        });

        let rec = match table[addr].take() {
            Some(mut rec) => {
                rec.inst = inst;
                rec
            }
            None => Box::new(ExecRecord { inst, hits: 0 }),
        };
        let rec = table[addr].insert(rec);
        rec.hits += 1;
        let hits = rec.hits;

        self.max_hits = self.max_hits.max(hits);
        Some(hits)
    }

    pub fn get(&self, addr: u32) -> Option<&ExecRecord<I>> {
        self.table.as_deref()?.get(addr as usize)?.as_deref()
    }

    /// Occupied addresses in ascending order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &ExecRecord<I>)> + '_ {
        self.table
            .iter()
            .flat_map(|table| table.iter().enumerate())
            .filter_map(|(addr, slot)| slot.as_deref().map(|rec| (addr as u32, rec)))
    }

    /// Serializes every occupied entry as `{address, hits, text}`.
    pub fn export_json(&self) -> crate::Result<Vec<u8>> {
        let entries: Vec<EntrySnapshot> = self
            .entries()
            .map(|(address, rec)| EntrySnapshot {
                address,
                hits: rec.hits,
                text: I::render(&rec.inst),
            })
            .collect();
        Ok(serde_json::to_vec(&entries)?)
    }

    /// Drops every record and releases the table.
    pub fn clear(&mut self) {
        if self.table.take().is_some() {
            debug!(arch = I::NAME, "released trace table");
        }
        self.max_hits = 0;
    }

    /// Writes `<prefix>[<hits>] <line>` for every occupied address.
    ///
    /// Each record skips the scan past its own units, so bytes belonging to
    /// an already printed instruction are not printed again. A blank line
    /// precedes every run of occupied addresses. Nothing is written (and
    /// nothing allocated) when no instruction was ever recorded.
    pub fn dump<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let Some(table) = self.table.as_deref() else {
            return Ok(());
        };
        let width = decimal_digits(self.max_hits);

        let mut in_run = false;
        let mut addr = 0;
        while addr < table.len() {
            match &table[addr] {
                None => {
                    in_run = false;
                    addr += 1;
                }
                Some(rec) => {
                    if !in_run {
                        writeln!(out)?;
                    }
                    writeln!(
                        out,
                        "{}[{:>width$}] {}",
                        I::LINE_PREFIX,
                        rec.hits,
                        I::render(&rec.inst)
                    )?;
                    in_run = true;
                    addr += I::unit_len(&rec.inst).max(1);
                }
            }
        }
        Ok(())
    }
}

fn decimal_digits(mut v: u64) -> usize {
    let mut digits = 0;
    while v != 0 {
        digits += 1;
        v /= 10;
    }
    digits
}
