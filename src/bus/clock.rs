/*!
Clock/timing orchestrator for the Bus.

Purpose
- Centralize the order-of-operations for a single CPU cycle:
  * Increment CPU cycle counter
  * Step the (self-contained) PPU three times
  * Step one DMA micro-cycle, if active
  * Latch NMI from PPU
  * Aggregate IRQ from the mapper

Integration
- `Bus::tick(cycles)` delegates here. The PPU no longer needs a view back
  into the Bus for rendering (it owns its own VRAM), so this loop is a
  straight sequence with no self-borrow juggling.
*/

use crate::bus::Bus;

pub fn tick(bus: &mut Bus, cycles: u32) {
    for _ in 0..cycles {
        bus.cpu_cycle = bus.cpu_cycle.wrapping_add(1);

        bus.ppu_mut().step(3);
        bus.ppu_cycle = bus.ppu_cycle.wrapping_add(3);

        if bus.dma_is_active() {
            bus.step_dma_micro();
        }

        if bus.ppu_mut().take_nmi_request() {
            bus.nmi_pending = true;
        }

        let mapper_irq = bus
            .cartridge
            .as_ref()
            .map(|cart| cart.mapper.borrow().irq_pending())
            .unwrap_or(false);
        bus.irq_line = mapper_irq;
    }
}
