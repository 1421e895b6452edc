/*!
cpu::mod - Public façade for the 6502 CPU core.

Module layout:

    state.rs    - Canonical CPU architectural state (registers, flags).
    regs.rs     - `CpuRegs` trait implemented by `CpuState`.
    addressing.rs - Addressing mode operand resolution helpers.
    execute.rs  - Instruction semantic helpers (ALU, stack, RMW, branch).
    cycles.rs   - Base cycle counts and RMW classification per opcode.
    table.rs    - Feature-gated (`table_dispatch`) table-driven fast path.
    dispatch/   - Per-step orchestration (DMA stall, interrupts, opcode families).
    core/       - `Cpu`, the public façade wrapping `CpuState`.

Only `Cpu` and the flag constants are re-exported here; downstream code
should go through `Cpu::reset`/`Cpu::step`/`Cpu::irq`/`Cpu::nmi` rather
than reaching into the submodules directly.
*/

pub(crate) mod addressing;
pub(crate) mod core;
pub(crate) mod cycles;
pub(crate) mod dispatch;
pub(crate) mod execute;
pub(crate) mod regs;
pub(crate) mod state;

#[cfg(feature = "table_dispatch")]
pub(crate) mod table;

pub use core::Cpu;
pub use state::{BREAK, CARRY, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, UNUSED, ZERO};
