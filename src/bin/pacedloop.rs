// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! pacedloop entry point
//!
//! Runs the bouncing-quads demo either in a window (wgpu) or headless with a
//! simulated frame cost, then prints the final loop status as JSON.

use clap::Parser;
use pacedloop::core::config::CoreConfig;
use pacedloop::core::lifecycle::LifecycleController;
use pacedloop::core::render::HeadlessRenderer;
use pacedloop::core::render_loop::{Core, CoreStatus};
use pacedloop::core::surface::SurfaceHandle;
use pacedloop::core::time::MonotonicClock;
use pacedloop::demo::BouncingQuads;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "PACEDLOOP_CONFIG";

/// Default config file when neither `--config` nor the environment names one
const DEFAULT_CONFIG: &str = "pacedloop.toml";

#[derive(Parser)]
#[command(name = "pacedloop")]
#[command(about = "Frame-paced render loop demo")]
struct Args {
    /// TOML config file (falls back to $PACEDLOOP_CONFIG, then pacedloop.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many rendered frames
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Simulated CPU cost per frame in headless mode (ms)
    #[arg(long, default_value = "4")]
    frame_cost_ms: u64,

    /// Surface width
    #[arg(long, default_value = "800")]
    width: u32,

    /// Surface height
    #[arg(long, default_value = "600")]
    height: u32,

    /// Number of quads at start
    #[arg(long, default_value = "8")]
    quads: usize,

    /// Present without vsync pacing
    #[arg(long)]
    no_vsync: bool,

    /// Write the effective config to this path and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = CoreConfig::load_or_default(&config_path)?;
    if args.no_vsync {
        config.pacer.vsync = false;
    }
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        log::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    log::info!("Starting pacedloop ({} Hz)", config.pacer.refresh_rate_hz);

    let status = if args.headless {
        run_headless(&config, &args)?
    } else {
        run_windowed(&config, &args)?
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn run_headless(
    config: &CoreConfig,
    args: &Args,
) -> Result<CoreStatus, Box<dyn std::error::Error>> {
    let frames = args.frames.unwrap_or(120);
    let core = Core::new(
        config,
        HeadlessRenderer::with_frame_cost(Duration::from_millis(args.frame_cost_ms)),
        BouncingQuads::new(args.quads),
        MonotonicClock::new(),
    )?;

    let controller = LifecycleController::new(core);
    controller.on_create(SurfaceHandle::headless(args.width, args.height))?;
    controller.start()?;
    log::info!("Running headless for {} frames", frames);

    // Generous bound: every frame at the maximum swap interval, plus slack
    let refresh = config.pacer.refresh_period();
    let budget = refresh
        .saturating_mul(config.pacer.max_swap_interval)
        .saturating_mul(u32::try_from(frames).unwrap_or(u32::MAX))
        .saturating_add(Duration::from_secs(5));
    let deadline = Instant::now() + budget;

    while controller.status().frames_rendered < frames {
        if Instant::now() >= deadline {
            log::warn!("Gave up after {:?}", budget);
            break;
        }
        if !controller.is_running() {
            log::error!("Loop stopped early");
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    controller.on_destroy()?;
    controller.wait_terminated(Duration::from_secs(5))?;
    Ok(controller.join()?)
}

#[cfg(feature = "window")]
fn run_windowed(
    config: &CoreConfig,
    args: &Args,
) -> Result<CoreStatus, Box<dyn std::error::Error>> {
    use pacedloop::frontend::{Application, WindowOptions};
    use winit::event_loop::EventLoop;

    let event_loop = EventLoop::new()?;
    let mut app = Application::new(
        config,
        BouncingQuads::new(args.quads),
        WindowOptions {
            title: "pacedloop".to_string(),
            width: args.width,
            height: args.height,
            frame_limit: args.frames,
        },
    )?;

    log::info!("Running event loop...");
    event_loop.run_app(&mut app)?;

    Ok(app.finish()?)
}

#[cfg(not(feature = "window"))]
fn run_windowed(
    config: &CoreConfig,
    args: &Args,
) -> Result<CoreStatus, Box<dyn std::error::Error>> {
    log::warn!("Built without the `window` feature, running headless");
    run_headless(config, args)
}
