#![doc = r#"
Bus module: CPU-visible address space, owned devices, and region registry.

Overview
- `Bus` owns CPU RAM, the PPU, the inserted `Cartridge` (if any), the OAM DMA
  controller, and a `RegionTable` of installed read/write bridges.
- CPU reads/writes first consult the region table (RAM, PPU registers, OAM
  DMA trigger, cartridge PRG); anything uncovered falls through to a flat
  64 KiB backing array (open bus / unmapped space, since the APU and
  controller ports are not implemented).

Modules
- region: dynamic `fn`-pointer region registry (`RegionTable`, `Region`).
- dma: cycle-accurate OAM DMA state machine (`DmaController`).
- dma_glue: `OamWriter` impl wiring the DMA controller to `Ppu::write_reg`.
- ram: 2 KiB mirrored CPU RAM.
- clock: per-cycle orchestration (PPU step ×3, DMA micro-step, NMI latch, IRQ aggregation).
"#]

pub mod clock;
pub mod dma;
mod dma_glue;
pub mod ram;
pub mod region;

use crate::cartridge::Cartridge;
use crate::error::{EmuError, EmuResult};
use crate::ppu::Ppu;
use dma::{CpuMemoryView, DmaController};
use ram::Ram;
use region::{Region, RegionTable};

/// A logged CPU write, captured when write-logging is enabled (debugger/tooling hook).
/// `pc` is the address of the instruction whose execution produced this write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedWrite {
    pub addr: u16,
    pub value: u8,
    pub pc: u16,
}

/// A bounded write-logging window: only writes with `start <= addr <= end` are
/// captured.
struct WriteLog {
    start: u16,
    end: u16,
    entries: Vec<LoggedWrite>,
}

pub struct Bus {
    ram: Ram,
    ppu: Ppu,
    pub cartridge: Option<Cartridge>,
    regions: RegionTable,
    backing: Box<[u8; 0x10000]>,

    pub cpu_cycle: u64,
    pub ppu_cycle: u64,

    dma: DmaController,

    /// Latched by the PPU at scanline 241/dot 1 when NMI-on-vblank is enabled;
    /// consumed (and cleared) by `cpu::dispatch::step`.
    pub nmi_pending: bool,
    /// Aggregated IRQ line (mapper only; the APU is not implemented).
    pub irq_line: bool,

    /// PC of the instruction currently executing, stamped by `cpu::dispatch::step`
    /// at the start of each instruction/interrupt-service step. Used only to tag
    /// write-log entries with the PC of the write's originating instruction.
    pub(crate) current_instruction_pc: u16,

    write_log: Option<WriteLog>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        let mut regions = RegionTable::new();
        regions.map(Region {
            start: 0x0000,
            end: 0x1FFF,
            reader: Some(ram_region_read),
            writer: Some(ram_region_write),
        });
        regions.map(Region {
            start: 0x2000,
            end: 0x3FFF,
            reader: Some(ppu_region_read),
            writer: Some(ppu_region_write),
        });
        regions.map(Region {
            start: 0x4014,
            end: 0x4014,
            reader: None,
            writer: Some(oamdma_region_write),
        });
        regions.map(Region {
            start: 0x6000,
            end: 0x7FFF,
            reader: Some(cart_prg_read),
            writer: Some(cart_prg_write),
        });
        regions.map(Region {
            start: 0x8000,
            end: 0xFFFF,
            reader: Some(cart_prg_read),
            writer: Some(cart_prg_write),
        });

        Self {
            ram: Ram::new(),
            ppu: Ppu::new(),
            cartridge: None,
            regions,
            backing: Box::new([0u8; 0x10000]),
            cpu_cycle: 0,
            ppu_cycle: 0,
            dma: DmaController::new(),
            nmi_pending: false,
            irq_line: false,
            current_instruction_pc: 0,
            write_log: None,
        }
    }

    /// Install a cartridge: seeds PPU CHR and nametable mirroring from it, then
    /// leaves `$6000-$7FFF`/`$8000-$FFFF` bridged to the mapper for the session.
    pub fn attach_cartridge(&mut self, cart: Cartridge) {
        let mut chr = vec![0u8; 0x2000];
        {
            let mut mapper = cart.mapper.borrow_mut();
            for (addr, slot) in chr.iter_mut().enumerate() {
                *slot = mapper.ppu_read(addr as u16);
            }
        }
        self.ppu.set_chr(&chr);
        self.ppu.set_mirroring(mirroring_to_ppu(cart.mirroring()));
        self.cartridge = Some(cart);
    }

    /// Alias for `attach_cartridge`, matching the common "load a ROM" phrasing.
    pub fn load_cartridge(&mut self, cart: Cartridge) {
        self.attach_cartridge(cart);
    }

    /// Install a mapper directly, without going through the iNES loader. Wraps
    /// it in a minimal `Cartridge` and attaches it the same way `load_cartridge`
    /// would. Useful for embedders/tests that build a mapper programmatically.
    pub fn install_mapper(
        &mut self,
        mapper: Box<dyn crate::mapper::Mapper>,
        mirroring: crate::cartridge::Mirroring,
    ) {
        self.attach_cartridge(Cartridge::from_mapper(mapper, mirroring));
    }

    /// Write the CPU reset vector ($FFFC/$FFFD) directly into the backing store.
    /// Only observable when no cartridge region covers that address (e.g. bare
    /// `Bus` instances used by assembler/CPU unit tests).
    pub fn write_reset_vector(&mut self, addr: u16) {
        self.backing[0xFFFC] = (addr & 0xFF) as u8;
        self.backing[0xFFFD] = (addr >> 8) as u8;
    }

    /// Register a custom region. Rejects an inverted range.
    pub fn map_region(
        &mut self,
        start: u16,
        end: u16,
        reader: Option<region::RegionReader>,
        writer: Option<region::RegionWriter>,
    ) -> EmuResult<()> {
        if end < start {
            return Err(EmuError::BusMapError { start, end });
        }
        self.regions.map(Region {
            start,
            end,
            reader,
            writer,
        });
        Ok(())
    }

    #[inline]
    pub fn read(&mut self, addr: u16) -> u8 {
        if let Some(reader) = self.regions.find_reader(addr) {
            reader(self, addr)
        } else {
            self.backing[addr as usize]
        }
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        if let Some(log) = self.write_log.as_mut() {
            if addr >= log.start && addr <= log.end {
                let pc = self.current_instruction_pc;
                log.entries.push(LoggedWrite { addr, value, pc });
            }
        }
        if let Some(writer) = self.regions.find_writer(addr) {
            writer(self, addr, value);
        } else {
            self.backing[addr as usize] = value;
        }
    }

    #[inline]
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Start logging writes within `[start, end]` (inclusive). Writes outside
    /// the range are not captured. Replaces any previously active log.
    pub fn enable_write_logging(&mut self, start: u16, end: u16) {
        self.write_log = Some(WriteLog { start, end, entries: Vec::new() });
    }

    pub fn disable_write_logging(&mut self) {
        self.write_log = None;
    }

    pub fn get_write_log(&self) -> &[LoggedWrite] {
        self.write_log.as_ref().map(|log| log.entries.as_slice()).unwrap_or(&[])
    }

    pub fn clear_write_log(&mut self) {
        if let Some(log) = self.write_log.as_mut() {
            log.entries.clear();
        }
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    /// Raw (unmirrored) PPU address-space peek, bypassing the $2000-$2007 CPU
    /// register protocol. Used by tests/tools to seed pattern/nametable data.
    pub fn ppu_read(&self, addr: u16) -> u8 {
        self.ppu.peek_vram(addr)
    }

    /// Raw (unmirrored) PPU address-space poke; see `ppu_read`.
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        self.ppu.poke_vram(addr, value);
    }

    pub fn render_ppu_frame(&mut self) {
        self.ppu.render_frame();
    }

    pub fn dma_is_active(&self) -> bool {
        self.dma.is_active()
    }

    /// Start an OAM DMA transfer (equivalent to a CPU write to $4014).
    pub fn start_dma(&mut self, src_page: u8) {
        self.dma.start(src_page, self.cpu_cycle);
    }

    /// Advance `cycles` CPU cycles, stepping the PPU/DMA/IRQ aggregation in lockstep.
    pub fn tick(&mut self, cycles: u32) {
        clock::tick(self, cycles);
    }

    /// Perform one DMA micro-step using the field-splitting `CpuMemoryView` adapter,
    /// so the OAM destination (`&mut Ppu`) and the DMA source read don't alias.
    pub(in crate::bus) fn step_dma_micro(&mut self) {
        let mut view = CpuMemoryView::from_parts(&mut self.ram, self.cartridge.as_mut());
        self.dma.step_one_cycle(&mut view, &mut self.ppu);
    }
}

fn mirroring_to_ppu(m: crate::cartridge::Mirroring) -> crate::ppu::Mirroring {
    use crate::cartridge::Mirroring as CartMirroring;
    use crate::ppu::Mirroring as PpuMirroring;
    match m {
        CartMirroring::Horizontal => PpuMirroring::Horizontal,
        CartMirroring::Vertical => PpuMirroring::Vertical,
        CartMirroring::FourScreen => PpuMirroring::FourScreen,
    }
}

fn ram_region_read(bus: &mut Bus, addr: u16) -> u8 {
    bus.ram.read(addr)
}

fn ram_region_write(bus: &mut Bus, addr: u16, value: u8) {
    bus.ram.write(addr, value);
}

/// CPU-visible PPU register window ($2000-$3FFF, mirrored every 8 bytes).
/// Write-only registers read back as open bus (0) rather than reaching `Ppu::read_reg`.
fn ppu_region_read(bus: &mut Bus, addr: u16) -> u8 {
    match addr & 0x7 {
        0 | 1 | 3 | 5 | 6 => 0,
        _ => bus.ppu.read_reg(addr),
    }
}

fn ppu_region_write(bus: &mut Bus, addr: u16, value: u8) {
    bus.ppu.write_reg(addr, value);
}

fn oamdma_region_write(bus: &mut Bus, _addr: u16, value: u8) {
    bus.start_dma(value);
}

fn cart_prg_read(bus: &mut Bus, addr: u16) -> u8 {
    if let Some(cart) = &bus.cartridge {
        cart.mapper.borrow_mut().cpu_read(addr)
    } else if addr >= 0x8000 {
        0xFF
    } else {
        0
    }
}

fn cart_prg_write(bus: &mut Bus, addr: u16, value: u8) {
    if let Some(cart) = &bus.cartridge {
        cart.mapper.borrow_mut().cpu_write(addr, value);
    }
}
