use std::path::PathBuf;

use chip8::Config;
use chip8::cpu::DEFAULT_STACK_DEPTH;
use clap::Parser;

pub const DEFAULT_FRAME_RATE: u64 = 60;
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u64 = 700;

/// Run a CHIP-8 ROM in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Settings {
    /// ROM image to load at 0x200
    pub rom: PathBuf,

    /// Instructions executed per second
    #[arg(
        long,
        default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub ips: u64,

    /// Screen redraws per second
    #[arg(
        long,
        default_value_t = DEFAULT_FRAME_RATE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub frame_rate: u64,

    /// Maximum subroutine nesting
    #[arg(long, default_value_t = DEFAULT_STACK_DEPTH)]
    pub stack_depth: usize,

    /// Advance I past the last register on FX55/FX65
    #[arg(long)]
    pub increment_index: bool,

    /// Do not play the sound timer tone
    #[arg(long)]
    pub mute: bool,

    /// Write debug logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn cpu_config(&self) -> Config {
        Config {
            stack_depth: self.stack_depth,
            load_store_increments_index: self.increment_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["chip8", "roms/pong.ch8"]).unwrap();
        assert_eq!(settings.rom, PathBuf::from("roms/pong.ch8"));
        assert_eq!(settings.ips, DEFAULT_INSTRUCTIONS_PER_SECOND);
        assert_eq!(settings.frame_rate, DEFAULT_FRAME_RATE);
        assert!(!settings.mute);
        assert!(settings.log_file.is_none());

        let config = settings.cpu_config();
        assert_eq!(config.stack_depth, 16);
        assert!(!config.load_store_increments_index);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "chip8",
            "--ips",
            "1000",
            "--stack-depth",
            "12",
            "--increment-index",
            "--mute",
            "--log-file",
            "chip8.log",
            "game.ch8",
        ])
        .unwrap();
        assert_eq!(settings.ips, 1000);
        assert!(settings.mute);
        assert_eq!(settings.log_file, Some(PathBuf::from("chip8.log")));

        let config = settings.cpu_config();
        assert_eq!(config.stack_depth, 12);
        assert!(config.load_store_increments_index);
    }

    #[test]
    fn test_rejects_zero_rates() {
        assert!(Settings::try_parse_from(["chip8", "--ips", "0", "a.ch8"]).is_err());
        assert!(Settings::try_parse_from(["chip8", "--frame-rate", "0", "a.ch8"]).is_err());
    }

    #[test]
    fn test_requires_rom() {
        assert!(Settings::try_parse_from(["chip8"]).is_err());
    }
}
