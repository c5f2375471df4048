extern crate sdl2;

use chip8::settings::{Settings, MAX_SCALE};
use chip8::{Chip8, Keypad, Status, TimerMode, HEIGHT, WIDTH};
use clap::Parser;
use log::{error, info};
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};
use sdl2::event::Event;
use sdl2::gfx::primitives::DrawRenderer;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::pixels;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2::EventPump;
use std::error::Error;
use std::path::PathBuf;

/// 1 2 3 C / 4 5 6 D / 7 8 9 E / A 0 B F on the left of a QWERTY keyboard
const KEYMAP: [(Scancode, u8); 16] = [
    (Scancode::Num1, 0x1),
    (Scancode::Num2, 0x2),
    (Scancode::Num3, 0x3),
    (Scancode::Num4, 0xC),
    (Scancode::Q, 0x4),
    (Scancode::W, 0x5),
    (Scancode::E, 0x6),
    (Scancode::R, 0xD),
    (Scancode::A, 0x7),
    (Scancode::S, 0x8),
    (Scancode::D, 0x9),
    (Scancode::F, 0xE),
    (Scancode::Z, 0xA),
    (Scancode::X, 0x0),
    (Scancode::C, 0xB),
    (Scancode::V, 0xF),
];

const TONE_HZ: f32 = 440.0;

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 emulator")]
struct Args {
    /// Raw CHIP-8 program to run
    rom: PathBuf,

    /// key=value settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window pixels per CHIP-8 pixel
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SCALE)))]
    scale: Option<u32>,

    /// Instructions per 60Hz frame
    #[arg(long)]
    cycles_per_frame: Option<u32>,
}

struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for x in out.iter_mut() {
            *x = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

fn open_beeper(sdl_ctx: &sdl2::Sdl) -> Result<AudioDevice<SquareWave>, String> {
    let audio = sdl_ctx.audio()?;
    let desired = AudioSpecDesired {
        freq: Some(44_100),
        channels: Some(1),
        samples: None,
    };
    audio.open_playback(None, &desired, |spec| SquareWave {
        phase_inc: TONE_HZ / spec.freq as f32,
        phase: 0.0,
        volume: 0.25,
    })
}

fn sample_keypad(event_pump: &EventPump) -> Keypad {
    let state = event_pump.keyboard_state();
    KEYMAP
        .iter()
        .filter(|(scancode, _)| state.is_scancode_pressed(*scancode))
        .map(|&(_, key)| key)
        .collect()
}

fn render(canvas: &mut Canvas<Window>, emu: &Chip8, scale: u32) -> Result<(), String> {
    let black = pixels::Color::RGB(0, 0, 0);
    let white = pixels::Color::RGB(255, 255, 255);
    let scale = scale as i16;

    canvas.set_draw_color(black);
    canvas.clear();
    for (x, y, lit) in emu.framebuffer().pixels() {
        if !lit {
            continue;
        }
        let x = x as i16 * scale;
        let y = y as i16 * scale;
        canvas.box_(x, y, x + scale - 1, y + scale - 1, white)?;
    }
    canvas.present();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(scale) = args.scale {
        settings.scale = scale;
    }
    if let Some(cycles) = args.cycles_per_frame {
        settings.cycles_per_frame = cycles;
    }

    let mut emu = Chip8::load_game(settings.vm_config(), &args.rom)?;
    info!("loaded {}", args.rom.display());

    let sdl_ctx = sdl2::init()?;
    let video = sdl_ctx.video()?;

    let window = video
        .window(
            "CHIP-8",
            WIDTH as u32 * settings.scale,
            HEIGHT as u32 * settings.scale,
        )
        .position_centered()
        .build()?;
    let mut canvas = window.into_canvas().build()?;
    render(&mut canvas, &emu, settings.scale)?;

    let beeper = if settings.sound {
        Some(open_beeper(&sdl_ctx)?)
    } else {
        None
    };

    let mut event_pump = sdl_ctx.event_pump()?;

    let sleep = std::time::Duration::from_millis(16);

    'main: loop {
        for e in event_pump.poll_iter() {
            match e {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'main,
                _ => {}
            }
        }

        let keys = sample_keypad(&event_pump);
        for _ in 0..settings.cycles_per_frame {
            match emu.step(Some(&keys)) {
                Status::Continue | Status::AwaitingKey => {}
                Status::Halted => {
                    info!("program finished");
                    break 'main;
                }
                Status::Faulted(fault) => {
                    error!("stopped: {}", fault);
                    return Err(fault.into());
                }
            }
        }

        if settings.timer_mode == TimerMode::External {
            emu.tick_timers();
        }

        if let Some(beeper) = &beeper {
            if emu.sound_flag() {
                beeper.resume();
            } else {
                beeper.pause();
            }
        }

        if emu.take_draw_flag() {
            render(&mut canvas, &emu, settings.scale)?;
        }

        std::thread::sleep(sleep);
    }

    Ok(())
}
