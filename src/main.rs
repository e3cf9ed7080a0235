use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wakegate::app::{run_monitor, run_session, SessionOptions};
use wakegate::audio::capture::{list_devices, suppress_audio_warnings, CpalAudioSource};
use wakegate::audio::resample::LinearResampler;
use wakegate::cli::{Cli, Commands};
use wakegate::config::Config;
use wakegate::dispatch::WavDispatcher;
use wakegate::features::resolve_provider;
use wakegate::prepare::prepare_dir;
use wakegate::wake::gallery::TemplateGallery;

#[tokio::main]
async fn main() -> Result<()> {
    suppress_audio_warnings();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => {
            list_audio_devices()?;
            Ok(())
        }
        Some(Commands::Prepare {
            ref input,
            ref output,
            duration,
        }) => {
            let config = load_config(&cli)?;
            let written = prepare_dir(
                input,
                output,
                config.audio.analysis_rate,
                duration,
                &LinearResampler,
            )?;
            if !cli.quiet {
                println!(
                    "{} prepared {} reference recording(s) into {}",
                    "✓".green(),
                    written,
                    output.display()
                );
            }
            Ok(())
        }
        Some(Commands::Monitor) => {
            let config = load_config(&cli)?;
            run_core(config, cli.quiet, None).await
        }
        None => {
            let config = load_config(&cli)?;
            let options = SessionOptions {
                once: cli.once,
                quiet: cli.quiet,
            };
            run_core(config, cli.quiet, Some(options)).await
        }
    }
}

/// Run the blocking capture core on a worker thread, with Ctrl-C wired to
/// the interrupt flag both state machines observe.
async fn run_core(config: Config, quiet: bool, session: Option<SessionOptions>) -> Result<()> {
    config.validate()?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = Arc::clone(&interrupt);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc_flag.store(true, Ordering::SeqCst);
        }
    });

    let handle = tokio::task::spawn_blocking(move || -> wakegate::Result<()> {
        let (extractor, scorer) =
            resolve_provider(&config.wake.provider, config.audio.analysis_rate)?;
        let resampler = LinearResampler;

        let gallery = TemplateGallery::load_dir(&config.wake.templates_dir, extractor.as_ref())?;
        if !quiet {
            println!(
                "Loaded {} reference template(s) from {}",
                gallery.len(),
                config.wake.templates_dir.display()
            );
        }

        let mut source =
            CpalAudioSource::new(config.audio.device.as_deref(), config.audio.native_rate)?;

        match session {
            Some(options) => {
                let mut dispatcher = WavDispatcher::new(config.dispatch.captures_dir.clone());
                run_session(
                    &config,
                    &gallery,
                    &mut source,
                    extractor.as_ref(),
                    scorer.as_ref(),
                    &resampler,
                    &mut dispatcher,
                    interrupt.as_ref(),
                    options,
                )
            }
            None => run_monitor(
                &config,
                &gallery,
                &mut source,
                extractor.as_ref(),
                scorer.as_ref(),
                &resampler,
                interrupt.as_ref(),
            ),
        }
    });

    handle.await.context("capture core panicked")??;
    Ok(())
}

/// Resolve the config file path, load it, and apply environment and CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?
        .with_env_overrides();

    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(templates) = &cli.templates {
        config.wake.templates_dir = templates.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.wake.threshold = threshold;
    }
    if let Some(max_duration) = cli.max_duration {
        config.recording.max_secs = max_duration;
    }
    if let Some(silence) = cli.silence {
        config.recording.silence_secs = silence;
    }

    config.validate()?;
    Ok(config)
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wakegate")
        .join("wakegate.toml")
}

fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("{}", "No audio input devices found".yellow());
        return Ok(());
    }

    println!("Available audio input devices:");
    for device in devices {
        println!("  {}", device);
    }
    Ok(())
}
