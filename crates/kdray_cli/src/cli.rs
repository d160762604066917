//! Command line option parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::settings::{IntegratorKind, Settings};

#[derive(Debug, Clone, Parser)]
#[command(name = "kdray", version, about = "Render the demo scene with a kd-tree ray tracer")]
pub struct Args {
    /// JSON settings file. Command line options take precedence.
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output image; the format follows the extension (png, jpg)
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    pub width: Option<usize>,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<usize>,

    #[arg(short, long, value_enum)]
    pub integrator: Option<IntegratorKind>,

    /// Worker threads
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Image applied to the ground plane
    #[arg(long, value_name = "FILE")]
    pub ground_texture: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Args {
    /// Apply the options given on the command line on top of `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(integrator) = self.integrator {
            settings.integrator = integrator;
        }
        if let Some(workers) = self.workers {
            settings.render.workers = Some(workers);
        }
        if let Some(tex) = &self.ground_texture {
            settings.ground_texture = Some(tex.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["kdray"]).unwrap();
        assert_eq!(args.output, PathBuf::from("render.png"));
        assert_eq!(args.log_level, LogLevel::Info);
        assert!(args.settings.is_none());

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "kdray", "-W", "64", "-H", "48", "-i", "trivial", "-j", "3", "-o", "out.jpg", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(log::LevelFilter::from(args.log_level), log::LevelFilter::Debug);
        assert_eq!(args.output, PathBuf::from("out.jpg"));

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!((settings.width, settings.height), (64, 48));
        assert_eq!(settings.integrator, IntegratorKind::Trivial);
        assert_eq!(settings.render.workers, Some(3));
    }

    #[test]
    fn test_rejects_unknown_integrator() {
        assert!(Args::try_parse_from(["kdray", "--integrator", "pathtrace"]).is_err());
    }
}
