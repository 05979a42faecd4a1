use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use lumicard::{
    ConfigUpdate, DiskFrameSource, Experience, ExperienceConfig, FrameSource, MemoryFrameSource,
    Millis, NullSink, StaticCatalog, Surface,
};

#[derive(Parser, Debug)]
#[command(name = "lumicard", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the experience on a virtual clock and write PNG snapshots.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Experience config JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Config-update JSON applied halfway through the run.
    #[arg(long)]
    update: Option<PathBuf>,

    /// Asset root directory; synthesized frames are used when omitted.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Output directory for PNG snapshots.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Total simulated time in milliseconds.
    #[arg(long, default_value_t = 20_000)]
    duration_ms: u64,

    /// Virtual-clock step per iteration.
    #[arg(long, default_value_t = 16)]
    step_ms: u64,

    /// Instant at which the first floater is selected.
    #[arg(long, default_value_t = 3_000)]
    select_at_ms: u64,

    /// Snapshot interval; 0 writes only the final frame.
    #[arg(long, default_value_t = 1_000)]
    snapshot_every_ms: u64,

    /// Logical stage snapshot size.
    #[arg(long, default_value_t = 500)]
    width: u32,

    #[arg(long, default_value_t = 375)]
    height: u32,

    /// Device pixel ratio for the snapshot surfaces.
    #[arg(long, default_value_t = 2.0)]
    dpr: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse '{}'", path.display()))
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let config: ExperienceConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => ExperienceConfig::default(),
    };
    let update: Option<ConfigUpdate> = match &args.update {
        Some(path) => Some(read_json(path)?),
        None => None,
    };

    let source: Box<dyn FrameSource> = match &args.assets {
        Some(root) => Box::new(DiskFrameSource::new(root)),
        None => Box::new(MemoryFrameSource::new()),
    };
    let mut exp = Experience::new(
        config,
        Box::new(StaticCatalog::demo()),
        source,
        Box::new(NullSink),
    );

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let mut stage = Surface::new();
    stage.resize(args.width, args.height, args.dpr);
    let mut card = Surface::new();
    card.resize(args.width, args.width * 3 / 2, args.dpr);

    exp.start(Millis::ZERO);

    let mut selected = false;
    let mut updated = false;
    let mut next_snapshot = args.snapshot_every_ms;
    let mut now = Millis::ZERO;

    while now.0 <= args.duration_ms {
        exp.advance(now);

        if !selected && now.0 >= args.select_at_ms {
            if let Some(f) = exp.manager().floaters().first() {
                exp.select(f.id, now);
                selected = true;
            }
        }
        if !updated && now.0 >= args.duration_ms / 2 {
            if let Some(update) = &update {
                exp.apply_update(update, now);
            }
            updated = true;
        }

        let due = args.snapshot_every_ms > 0 && now.0 >= next_snapshot;
        if due || now.0 + args.step_ms > args.duration_ms {
            exp.render_stage(&mut stage, now);
            write_png(&stage, &args.out.join(format!("stage_{:06}.png", now.0)))?;
            if exp.player().is_open() {
                exp.render_card(&mut card, now);
                write_png(&card, &args.out.join(format!("card_{:06}.png", now.0)))?;
            }
            next_snapshot += args.snapshot_every_ms.max(1);
        }

        now = now.plus(args.step_ms.max(1));
    }

    eprintln!("wrote snapshots to {}", args.out.display());
    Ok(())
}

fn write_png(surface: &Surface, path: &Path) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        surface.data(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
