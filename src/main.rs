//! Binary entrypoint: composites one output's lock-screen background and
//! writes it to a PNG.

use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use clap::{ArgAction, Parser};
use tiny_skia::Pixmap;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use lock_background::config::{BackgroundConfig, BackgroundMode, Color};
use lock_background::loader::load_background_image;
use lock_background::render::render_background;

#[derive(Debug, Parser)]
#[command(
    name = "lock-background",
    about = "Composites a lock-screen background for one output"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Background image path (overrides config)
    #[arg(short, long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Background mode: stretch|fill|fit|center|tile|solid_color
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Solid/fallback color as #RRGGBB[AA]
    #[arg(long, value_name = "COLOR")]
    color: Option<Color>,

    /// Gaussian blur sigma (>0 activates)
    #[arg(long, value_name = "SIGMA")]
    blur: Option<f32>,

    /// Darkening overlay percent, 0-100 (>0 activates)
    #[arg(long, value_name = "PERCENT")]
    opacity: Option<f32>,

    /// Select per-output overrides from the config
    #[arg(long, value_name = "NAME")]
    output_name: Option<String>,

    /// Buffer width in pixels
    #[arg(long, value_name = "PIXELS")]
    width: u32,

    /// Buffer height in pixels
    #[arg(long, value_name = "PIXELS")]
    height: u32,

    /// Output PNG path
    #[arg(short, long, value_name = "FILE")]
    out: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("lock_background={}", level).parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    ensure!(
        cli.width > 0 && cli.height > 0,
        "buffer dimensions must be positive"
    );

    let config = match &cli.config {
        Some(path) => BackgroundConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?
            .validated()
            .context("validating configuration")?,
        None => BackgroundConfig::default(),
    };

    let mut settings = config.settings_for(cli.output_name.as_deref());
    if let Some(image) = cli.image {
        settings.image = Some(image);
    }
    if let Some(mode) = &cli.mode {
        settings.mode = BackgroundMode::parse(mode);
    }
    if let Some(color) = cli.color {
        settings.color = color;
    }
    if let Some(blur) = cli.blur {
        settings.blur_sigma = blur;
    }
    if let Some(opacity) = cli.opacity {
        settings.opacity_percent = opacity;
    }
    settings.validate().context("validating settings")?;

    let mut canvas =
        Pixmap::new(cli.width, cli.height).context("allocating the output buffer")?;

    // Load only when the mode actually composites an image; a missing path
    // just leaves the solid fill. A path that fails to load aborts instead.
    let image = match (settings.mode.fit(), settings.image.as_deref()) {
        (Some(_), Some(path)) => {
            let loaded =
                load_background_image(path, settings.blur_sigma, settings.opacity_percent);
            if loaded.is_none() {
                bail!("failed to load background image {}", path.display());
            }
            loaded
        }
        _ => None,
    };

    render_background(
        &mut canvas,
        image.as_ref(),
        settings.mode,
        settings.color,
        cli.width,
        cli.height,
    );

    canvas
        .save_png(&cli.out)
        .with_context(|| format!("writing {}", cli.out.display()))?;
    info!(
        width = cli.width,
        height = cli.height,
        mode = %settings.mode,
        "composited background"
    );
    Ok(())
}
