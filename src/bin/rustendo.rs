//! Interactive NES shell: loads an iNES ROM, runs the CPU/PPU/Bus core, and
//! presents the PPU framebuffer in a window via `pixels`/`winit`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use rustendo::{Bus, Cartridge, Cpu};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 240;
/// Roughly one NTSC frame's worth of CPU cycles (29780.5, rounded up).
const CYCLES_PER_FRAME: u32 = 29781;

#[derive(Parser, Debug)]
#[command(name = "rustendo", about = "NES emulator shell")]
struct Args {
    /// Path to an iNES (.nes) ROM file.
    rom: PathBuf,
}

struct Emulator {
    cpu: Cpu,
    bus: Bus,
}

impl Emulator {
    fn new(rom_path: &PathBuf) -> Result<Self, String> {
        let cart = Cartridge::from_ines_file(rom_path)?;
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        Ok(Self { cpu, bus })
    }

    /// Runs CPU steps until either a PPU frame completes or the CPU halts,
    /// whichever comes first.
    fn run_frame(&mut self) {
        let mut cycles = 0u32;
        while cycles < CYCLES_PER_FRAME {
            if self.cpu.is_halted() {
                break;
            }
            if self.bus.ppu_mut().take_frame_complete() {
                break;
            }
            cycles += self.cpu.step(&mut self.bus);
        }
        self.bus.ppu_mut().take_frame_complete();
    }
}

struct App {
    rom_path: PathBuf,
    emulator: Emulator,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
}

impl App {
    fn new(rom_path: PathBuf, emulator: Emulator) -> Self {
        Self { rom_path, emulator, window: None, pixels: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(format!("rustendo - {}", self.rom_path.display()))
            .with_inner_size(winit::dpi::LogicalSize::new((WIDTH * 2) as f64, (HEIGHT * 2) as f64));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!(error = %e, "failed to create window");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = match Pixels::new(WIDTH, HEIGHT, surface_texture) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "failed to create pixel surface");
                event_loop.exit();
                return;
            }
        };
        window.request_redraw();
        self.window = Some(window);
        self.pixels = Some(pixels);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(pixels) = self.pixels.as_mut() {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        warn!(error = %e, "failed to resize pixel surface");
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                if self.emulator.cpu.is_halted() {
                    info!(pc = self.emulator.cpu.pc(), "CPU halted");
                    event_loop.exit();
                    return;
                }
                self.emulator.run_frame();
                if let Some(pixels) = self.pixels.as_mut() {
                    pixels.frame_mut().copy_from_slice(self.emulator.bus.ppu().framebuffer());
                    if let Err(e) = pixels.render() {
                        error!(error = %e, "pixel render failed");
                        event_loop.exit();
                    }
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let emulator = match Emulator::new(&args.rom) {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, rom = %args.rom.display(), "failed to load ROM");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            error!(error = %e, "failed to create event loop");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args.rom, emulator);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!(error = %e, "event loop exited with error");
        std::process::exit(1);
    }
}
