use std::io::Write;

use chip8::Speaker;

/// Rings the terminal bell.
pub struct TerminalBell<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        TerminalBell { out }
    }
}

impl<W: Write + Send> Speaker for TerminalBell<W> {
    fn on_sound_trigger(&mut self) {
        if let Err(err) = self.out.write_all(b"\x07").and_then(|()| self.out.flush()) {
            log::warn!("failed to ring bell: {err}");
        }
    }
}

#[cfg(feature = "audio")]
pub use tone::{Beep, open_output};

#[cfg(feature = "audio")]
mod tone {
    use std::time::Duration;

    use anyhow::Context;
    use chip8::Speaker;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source, source::SineWave};

    const FREQUENCY: f32 = 440.0;
    const TONE_LENGTH: Duration = Duration::from_millis(120);
    const VOLUME: f32 = 0.25;

    /// Keeps the audio device open. Dropping it silences every [`Beep`].
    pub fn open_output() -> anyhow::Result<(OutputStream, OutputStreamHandle)> {
        OutputStream::try_default().context("failed to open audio output")
    }

    /// Plays a short sine tone per trigger, queued behind any still playing.
    pub struct Beep {
        sink: Sink,
    }

    impl Beep {
        pub fn new(handle: &OutputStreamHandle) -> anyhow::Result<Self> {
            let sink = Sink::try_new(handle).context("failed to create audio sink")?;
            Ok(Beep { sink })
        }
    }

    impl Speaker for Beep {
        fn on_sound_trigger(&mut self) {
            log::debug!("play tone");
            let tone = SineWave::new(FREQUENCY)
                .take_duration(TONE_LENGTH)
                .amplify(VOLUME);
            self.sink.append(tone);
        }
    }
}
