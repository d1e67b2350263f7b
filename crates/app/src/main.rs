mod presenter;
mod signal;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use spectrum_canvas_core::{
    AnalysisHandle, AppConfig, AudioEngine, BarLayoutKind, ChannelArithmetic, ControlPanel,
    TintChannel, VisualizationMode, Visualizer,
};
use tracing_subscriber::EnvFilter;

use presenter::StatsPresenter;
use signal::SyntheticSignal;

fn main() -> spectrum_canvas_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scene,
            frames,
            fps,
            tone,
            cycle_effects,
        } => run_live(&scene, frames, fps, tone, cycle_effects),
        Commands::Bench { scene, ticks } => run_bench(&scene, ticks),
    }
}

/// Everything a tick loop needs, wired together from the command line.
struct Session {
    audio: AudioEngine,
    controls: ControlPanel,
    visualizer: Visualizer<AnalysisHandle>,
    signal: SyntheticSignal,
}

impl Session {
    fn build(scene: &SceneArgs, tone: f32) -> spectrum_canvas_core::Result<Self> {
        let config = match &scene.config {
            Some(path) => {
                tracing::info!(?path, "loading configuration");
                AppConfig::from_json_str(&std::fs::read_to_string(path)?)?
            }
            None => AppConfig::live_defaults(),
        };

        let controls = ControlPanel::new(config.controls);
        scene.apply(&controls);

        let audio = AudioEngine::with_config(config.audio.clone());
        let analysis = audio.start()?;
        let visualizer = Visualizer::from_config(analysis, &config);
        let signal = SyntheticSignal::new(config.audio.sample_rate, tone);

        Ok(Self {
            audio,
            controls,
            visualizer,
            signal,
        })
    }

    /// Pushes `seconds` of synthetic audio into the analysis engine.
    fn feed(&mut self, block: &mut Vec<f32>, seconds: f32) -> spectrum_canvas_core::Result<()> {
        block.resize(self.signal.samples_for(seconds), 0.0);
        self.signal.fill(block);
        self.audio.push_samples(block)
    }
}

fn run_live(
    scene: &SceneArgs,
    frames: u64,
    fps: f32,
    tone: f32,
    cycle_effects: bool,
) -> spectrum_canvas_core::Result<()> {
    let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
    let interval = Duration::from_secs_f32(1.0 / fps);
    tracing::info!(frames, fps, tone, "starting live mode");

    let mut session = Session::build(scene, tone)?;
    let mut presenter = StatsPresenter::new(fps.round() as u64);
    let stop = Arc::new(AtomicBool::new(false));
    let cycler = cycle_effects.then(|| spawn_effect_cycler(session.controls.clone(), stop.clone()));

    let mut block = Vec::new();
    let mut deadline = Instant::now();
    for _ in 0..frames {
        session.feed(&mut block, interval.as_secs_f32())?;
        let settings = session.controls.snapshot();
        let visualizer = &mut session.visualizer;
        visualizer.tick_and_present(&settings, &mut presenter)?;

        deadline += interval;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }

    stop.store(true, Ordering::Relaxed);
    if let Some(handle) = cycler {
        let _ = handle.join();
    }
    tracing::info!(presented = presenter.frames(), "live mode finished");
    Ok(())
}

fn run_bench(scene: &SceneArgs, ticks: u64) -> spectrum_canvas_core::Result<()> {
    tracing::info!(ticks, "running benchmark");

    let mut session = Session::build(scene, 220.0)?;
    let mut block = Vec::new();
    let mut busy = Duration::ZERO;

    for _ in 0..ticks {
        session.feed(&mut block, 1.0 / 60.0)?;
        let settings = session.controls.snapshot();
        let started = Instant::now();
        session.visualizer.tick(&settings);
        busy += started.elapsed();
    }

    let per_tick = busy.as_secs_f64() / ticks.max(1) as f64;
    tracing::info!(
        ticks,
        ms_per_tick = (per_tick * 1e5).round() / 100.0,
        max_fps = (1.0 / per_tick.max(f64::EPSILON)).round(),
        "benchmark finished"
    );
    Ok(())
}

/// Plays the part of a user clicking through the effect toggles, one every
/// two seconds, from a separate thread.
fn spawn_effect_cycler(controls: ControlPanel, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut step = 0u32;
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));
            step += 1;
            if step % 20 != 0 {
                continue;
            }
            let phase = step / 20 % 6;
            controls.set_tint(phase == 1, TintChannel::Red);
            controls.set_invert(phase == 2);
            controls.set_noise(phase == 3);
            controls.set_scanlines(phase == 4);
            controls.set_brightness_enabled(phase == 5);
            tracing::debug!(phase, "effects cycled");
        }
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive raster visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render in real time from a synthetic audio signal.
    Run {
        #[command(flatten)]
        scene: SceneArgs,
        /// Number of ticks to render before exiting.
        #[arg(long, default_value_t = 600)]
        frames: u64,
        /// Target tick rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// Centre frequency of the synthetic tone, in Hz.
        #[arg(long, default_value_t = 220.0)]
        tone: f32,
        /// Toggle through the effects every two seconds.
        #[arg(long)]
        cycle_effects: bool,
    },
    /// Run ticks back to back and report the time spent per tick.
    Bench {
        #[command(flatten)]
        scene: SceneArgs,
        #[arg(long, default_value_t = 300)]
        ticks: u64,
    },
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// JSON configuration file; command line flags override its controls.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    /// Add a fixed offset to one colour channel.
    #[arg(long, value_enum)]
    tint: Option<ChannelArg>,
    #[arg(long)]
    invert: bool,
    #[arg(long)]
    noise: bool,
    #[arg(long)]
    scanlines: bool,
    /// Brightness level 0-100; enables the brightness effect.
    #[arg(long)]
    brightness: Option<String>,
    /// Radius of the main circle tier at full amplitude.
    #[arg(long)]
    max_radius: Option<String>,
    /// Echo delay in seconds fed to the analyser input.
    #[arg(long)]
    delay: Option<String>,
    /// Wrap channel arithmetic instead of clamping.
    #[arg(long)]
    wrap: bool,
}

impl SceneArgs {
    /// Pushes the flags through the same setters a UI would use.
    fn apply(&self, controls: &ControlPanel) {
        if let Some(mode) = self.mode {
            controls.set_mode(mode.into());
        }
        if let Some(layout) = self.layout {
            controls.set_layout(layout.into());
        }
        if let Some(channel) = self.tint {
            controls.set_tint(true, channel.into());
        }
        if self.invert {
            controls.set_invert(true);
        }
        if self.noise {
            controls.set_noise(true);
        }
        if self.scanlines {
            controls.set_scanlines(true);
        }
        if let Some(level) = &self.brightness {
            controls.set_brightness_enabled(true);
            controls.set_brightness_input(level);
        }
        if let Some(radius) = &self.max_radius {
            controls.set_max_radius_input(radius);
        }
        if let Some(delay) = &self.delay {
            controls.set_delay_input(delay);
        }
        if self.wrap {
            controls.set_arithmetic(ChannelArithmetic::Wrapping);
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Frequency,
    Waveform,
}

impl From<ModeArg> for VisualizationMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Frequency => Self::Frequency,
            ModeArg::Waveform => Self::Waveform,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    Classic,
    Dense,
}

impl From<LayoutArg> for BarLayoutKind {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Classic => Self::Classic,
            LayoutArg::Dense => Self::Dense,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChannelArg {
    Red,
    Green,
    Blue,
}

impl From<ChannelArg> for TintChannel {
    fn from(value: ChannelArg) -> Self {
        match value {
            ChannelArg::Red => Self::Red,
            ChannelArg::Green => Self::Green,
            ChannelArg::Blue => Self::Blue,
        }
    }
}
