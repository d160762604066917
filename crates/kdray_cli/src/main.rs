use anyhow::{Context, Result};
use clap::Parser;
use kdray_renderer::{render, save_image, DirectLighting, Integrator, Trivial};

mod cli;
mod demo;
mod settings;

use cli::Args;
use settings::{IntegratorKind, Settings};

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    log::info!("Starting kdray");

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    args.apply(&mut settings);

    let mut scene = demo::build_scene(&settings).context("Failed to build scene")?;
    let mut integrator: Box<dyn Integrator> = match settings.integrator {
        IntegratorKind::Direct => Box::new(DirectLighting::new(settings.direct)),
        IntegratorKind::Trivial => Box::new(Trivial),
    };

    let image = render(&mut scene, integrator.as_mut(), &settings.render).context("Render failed")?;
    save_image(&image, &args.output, settings.gamma)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;

    Ok(())
}
