//! Dynamic CPU address-space region registry.
//!
//! Generalizes the old per-address `match` dispatcher into an ordered list of
//! mapped regions a mapper (or the Bus itself, for RAM/PPU registers) can
//! install at runtime. Reader/writer are plain `fn` pointers rather than
//! capturing closures: a `fn` value is `Copy`, so it can be pulled out of
//! `self.regions` by value and called with `&mut Bus` afterward, without
//! holding a borrow of the `Vec` across the call.

use super::Bus;

pub type RegionReader = fn(&mut Bus, u16) -> u8;
pub type RegionWriter = fn(&mut Bus, u16, u8);

/// One mapped window of the 16-bit CPU address space.
#[derive(Clone, Copy)]
pub struct Region {
    pub start: u16,
    pub end: u16, // inclusive
    pub reader: Option<RegionReader>,
    pub writer: Option<RegionWriter>,
}

impl Region {
    #[inline]
    fn covers(&self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }
}

/// Ordered region list with a most-recently-used cache for the hot loop.
#[derive(Default)]
pub struct RegionTable {
    regions: Vec<Region>,
    mru_read: Option<usize>,
    mru_write: Option<usize>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            mru_read: None,
            mru_write: None,
        }
    }

    /// Register a region. Later registrations are not removed by earlier
    /// ones; lookup always takes the first region (in registration order)
    /// that covers the address and supports the requested direction, so
    /// callers that want to override a window should register afterward
    /// only if they also want priority — in practice each mapper/device
    /// owns a disjoint window and ordering does not matter.
    pub fn map(&mut self, region: Region) {
        self.mru_read = None;
        self.mru_write = None;
        self.regions.push(region);
    }

    #[inline]
    pub fn find_reader(&mut self, addr: u16) -> Option<RegionReader> {
        if let Some(idx) = self.mru_read {
            let r = self.regions[idx];
            if r.covers(addr) {
                if let Some(reader) = r.reader {
                    return Some(reader);
                }
            }
        }
        for (idx, r) in self.regions.iter().enumerate() {
            if r.covers(addr) {
                if let Some(reader) = r.reader {
                    self.mru_read = Some(idx);
                    return Some(reader);
                }
            }
        }
        None
    }

    #[inline]
    pub fn find_writer(&mut self, addr: u16) -> Option<RegionWriter> {
        if let Some(idx) = self.mru_write {
            let r = self.regions[idx];
            if r.covers(addr) {
                if let Some(writer) = r.writer {
                    return Some(writer);
                }
            }
        }
        for (idx, r) in self.regions.iter().enumerate() {
            if r.covers(addr) {
                if let Some(writer) = r.writer {
                    self.mru_write = Some(idx);
                    return Some(writer);
                }
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.mru_read = None;
        self.mru_write = None;
    }
}
