use anyhow::Result;
use clap::Parser;
use notify::{Config, Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use spiralwled::config::{Args, EngineConfig};
use spiralwled::geometry::{FibonacciLayout, Topology};
use spiralwled::gradients::PaletteSet;
use spiralwled::output::{DdpSink, FrameSink, NullSink, PreviewSink};
use spiralwled::patterns::Registry;
use spiralwled::renderer::{ControlInput, Renderer};
use spiralwled::types::Rgb;

#[derive(Serialize)]
struct ListEntry<'a> {
    index: usize,
    name: &'a str,
}

#[derive(Serialize)]
struct Listing<'a> {
    patterns: Vec<ListEntry<'a>>,
    palettes: Vec<ListEntry<'a>>,
}

fn print_listing(registry: &Registry, palettes: &PaletteSet, json: bool) -> Result<()> {
    let listing = Listing {
        patterns: registry.list().into_iter().map(|(index, name)| ListEntry { index, name }).collect(),
        palettes: palettes.names().into_iter().enumerate().map(|(index, name)| ListEntry { index, name }).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Patterns:");
    for entry in &listing.patterns {
        println!("  {:>2}  {}", entry.index, entry.name);
    }
    println!("Palettes:");
    for entry in &listing.palettes {
        println!("  {:>2}  {}", entry.index, entry.name);
    }
    Ok(())
}

fn open_sink(config: &EngineConfig) -> Result<Box<dyn FrameSink>> {
    match config.output.as_str() {
        "preview" => Ok(Box::new(PreviewSink::stdout())),
        "none" => Ok(Box::new(NullSink)),
        _ => Ok(Box::new(DdpSink::new(&config.wled_ip)?)),
    }
}

/// Watch the config file and forward reloaded control input to the render loop
fn spawn_config_watcher(
    config_path: PathBuf,
    startup: EngineConfig,
    palettes: PaletteSet,
    initial_palette: usize,
    control_tx: mpsc::Sender<ControlInput>,
) {
    std::thread::spawn(move || {
        let (tx, rx) = mpsc::channel();
        let mut watcher = match RecommendedWatcher::new(tx, Config::default()) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("Config watcher unavailable: {}", e);
                return;
            }
        };

        if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
            log::warn!("Cannot watch {}: {}", config_path.display(), e);
            return;
        }

        let mut palette = initial_palette;
        loop {
            match rx.recv() {
                Ok(Ok(NotifyEvent { kind, .. })) => {
                    if !matches!(kind, notify::EventKind::Modify(_)) {
                        continue;
                    }
                    let config = match EngineConfig::load_with_path(config_path.to_str()) {
                        Ok(c) => c,
                        Err(e) => {
                            log::warn!("Ignoring config change: {}", e);
                            continue;
                        }
                    };
                    warn_on_restart_only_changes(&startup, &config);

                    let input = config.control_input(&palettes, palette);
                    palette = input.palette;
                    log::info!("Config reloaded: pattern '{}', palette {}", config.pattern, palette);
                    if control_tx.send(input).is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => log::warn!("Config watch error: {}", e),
                Err(_) => break,
            }
        }
    });
}

fn warn_on_restart_only_changes(startup: &EngineConfig, reloaded: &EngineConfig) {
    if reloaded.total_leds != startup.total_leds || reloaded.spiral_arms != startup.spiral_arms {
        log::warn!("Layout changes (total_leds, spiral_arms) apply on restart");
    }
    if reloaded.output != startup.output || reloaded.wled_ip != startup.wled_ip || reloaded.fps != startup.fps {
        log::warn!("Output changes (output, wled_ip, fps) apply on restart");
    }
    if reloaded.custom_palettes != startup.custom_palettes {
        log::warn!("Custom palette changes apply on restart");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.quiet { "warn" } else { "info" }),
    )
    .init();

    // Set global config path immediately (before any config loads)
    EngineConfig::set_config_path(args.cfg.clone());

    let cfg_arg = args.cfg.as_deref();
    let config_path = EngineConfig::config_path(cfg_arg)?;
    let config_file_exists = config_path.exists();

    let mut config = if config_file_exists {
        match EngineConfig::load_with_path(cfg_arg) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to load config file {}: {}", config_path.display(), e);
                log::error!("Please fix the config file or delete it to regenerate with defaults.");
                return Err(e);
            }
        }
    } else {
        // No config file - use defaults (will be saved below)
        EngineConfig { config_path: Some(config_path.clone()), ..EngineConfig::default() }
    };

    let palettes = PaletteSet::with_custom(&config.custom_palettes)?;
    let registry = Registry::standard();

    if args.list {
        return print_listing(&registry, &palettes, args.json);
    }

    let args_provided = config.merge_with_args(&args);
    if !config_file_exists || args_provided {
        config.save()?;
    }
    log::info!("Using config file: {}", config_path.display());

    let layout = FibonacciLayout::new(config.total_leds, config.spiral_arms)?;
    let topology = Topology::from_layout(&layout)?;
    log::info!("Layout: {} LEDs on {} spiral arms", topology.len(), layout.arms());

    let mut renderer = Renderer::new(topology, registry, palettes.clone())?
        .with_hue_interval(config.hue_interval_ms)
        .with_reset_on_switch(config.reset_on_switch);

    let initial = config.control_input(&palettes, 0);
    let initial_palette = initial.palette;
    renderer.apply_control(initial);

    let mut sink = open_sink(&config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::Relaxed);
    })?;

    let (control_tx, control_rx) = mpsc::channel();
    spawn_config_watcher(config_path, config.clone(), palettes, initial_palette, control_tx);

    log::info!("Rendering at {} fps to {} output (Ctrl-C to stop)", config.fps, config.output);
    renderer.run(sink.as_mut(), config.fps, &control_rx, &shutdown);

    // Leave the LEDs dark on exit
    let dark = vec![Rgb::BLACK; renderer.leds().len()];
    if let Err(e) = sink.send(&dark, 0) {
        log::warn!("Failed to blank LEDs on exit: {}", e);
    }

    Ok(())
}
