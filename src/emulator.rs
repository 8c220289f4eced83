use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8::Cpu;
use chip8::clock::{Pacer, TIMER_HZ};
use crossterm::event::{
    self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::beep::TerminalBell;
use crate::display::SharedDisplay;
use crate::input::{Flow, Input};
use crate::settings::Settings;

/// Kept alive for as long as tones should play.
#[cfg(feature = "audio")]
type AudioOutput = rodio::OutputStream;
#[cfg(not(feature = "audio"))]
type AudioOutput = ();

/// Raw mode, plus release reporting where the terminal supports it, for as
/// long as the guard lives.
struct RawTerminal {
    reports_release: bool,
}

impl RawTerminal {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        // From here on dropping the guard restores the terminal.
        let mut guard = RawTerminal {
            reports_release: false,
        };
        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.reports_release = true;
        }
        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.reports_release {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        if let Err(err) = disable_raw_mode() {
            log::warn!("failed to leave raw mode: {err}");
        }
    }
}

pub struct Emulator {
    cpu: Cpu,
    display: SharedDisplay,
    settings: Settings,
}

impl Emulator {
    pub fn new(settings: Settings) -> Self {
        let mut cpu = Cpu::new(settings.cpu_config());
        let display = SharedDisplay::new();
        cpu.set_screen_observer(Box::new(display.clone()));

        Emulator {
            cpu,
            display,
            settings,
        }
    }

    #[cfg(feature = "audio")]
    fn attach_speaker(&mut self) -> Option<AudioOutput> {
        let opened = crate::beep::open_output()
            .and_then(|(stream, handle)| Ok((crate::beep::Beep::new(&handle)?, stream)));
        match opened {
            Ok((beep, stream)) => {
                self.cpu.set_speaker(Box::new(beep));
                Some(stream)
            }
            Err(err) => {
                log::warn!("no audio output, falling back to the terminal bell: {err:#}");
                self.cpu.set_speaker(Box::new(TerminalBell::new(std::io::stdout())));
                None
            }
        }
    }

    #[cfg(not(feature = "audio"))]
    fn attach_speaker(&mut self) -> Option<AudioOutput> {
        self.cpu.set_speaker(Box::new(TerminalBell::new(std::io::stdout())));
        None
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let rom = self.settings.rom.clone();
        let rom_stem = rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string());

        self.cpu.reset();
        self.cpu
            .load_file(&rom)
            .with_context(|| format!("failed to load {}", rom.display()))?;

        let _audio_output = if self.settings.mute {
            None
        } else {
            self.attach_speaker()
        };

        let keys = self.cpu.key_sender();
        let raw = RawTerminal::enter()?;

        #[cfg(feature = "global-keys")]
        let input = Input::global(keys);
        #[cfg(not(feature = "global-keys"))]
        let input = Input::terminal(keys, raw.reports_release);

        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        terminal.clear()?;

        let result = self.main_loop(&mut terminal, input, &rom_stem);
        let _ = terminal.clear();
        drop(raw);

        result
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        mut input: Input,
        rom_stem: &str,
    ) -> anyhow::Result<()> {
        let start = Instant::now();
        let mut instructions = Pacer::new(self.settings.ips, start);
        let mut timers = Pacer::new(TIMER_HZ, start);
        let mut frames = Pacer::new(self.settings.frame_rate, start);

        loop {
            let now = Instant::now();

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if input.handle(key, now) == Flow::Quit {
                        return Ok(());
                    }
                }
            }
            input.expire(now);
            if input.quit_requested() {
                return Ok(());
            }

            for _ in 0..instructions.due(now) {
                self.cpu.next().context("emulation halted")?;
            }
            for _ in 0..timers.due(now) {
                self.cpu.ticker();
            }
            if frames.due(now) > 0 {
                terminal.draw(|frame| self.display.render(frame, rom_stem))?;
            }

            let wake = instructions
                .deadline()
                .min(timers.deadline())
                .min(frames.deadline());
            let now = Instant::now();
            if wake > now {
                std::thread::sleep(wake - now);
            }
        }
    }
}
