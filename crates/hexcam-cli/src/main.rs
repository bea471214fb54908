use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use hexcam_core::config::MAX_DIMENSION;
use hexcam_core::frame::{MAX_IMAGE_PIXELS, RgbFrame, SinkError};
use hexcam_core::pipeline::{
    self, FrameRenderer, PipelineError, PipelineStats, StreamSummary, spawn_stream_reader,
};
use hexcam_core::source::{DEFAULT_BAUD, SerialLineSource, TextLineSource};
use hexcam_core::{
    ColorModel, ConfigError, ConversionSummary, DecodePolicy, FrameConfig, GroupLayout,
    OverflowPolicy,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_RENDER_SCALE: u32 = 4;
const DEFAULT_PATTERN_SCALE: u32 = 5;
const DEFAULT_TIMEOUT_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "hexcam")]
#[command(version)]
#[command(
    about = "Convert hex-text camera dumps into bytes, raw RGB and PNG frames.",
    long_about = None,
    after_help = "Examples:\n  hexcam hex2bin dump.txt -o dump.bin\n  hexcam render yuv_96x96.txt -o frame.png --color-model full-yuv\n  hexcam stream /dev/ttyACM0 --follow --snapshot-dir frames"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print a JSON conversion summary to stdout
    #[arg(long, global = true)]
    summary: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode hex text into raw bytes.
    Hex2bin {
        /// Hex text input (glob patterns must match exactly one file)
        input: PathBuf,

        /// Output binary path
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Fail on the first malformed hex token
        #[arg(long)]
        strict: bool,
    },
    /// Convert hex YUV text into headerless RGB records (full YUV by default).
    Yuv2raw {
        /// Hex text input (glob patterns must match exactly one file)
        input: PathBuf,

        /// Output raw RGB path
        #[arg(short = 'o', long)]
        output: PathBuf,

        #[command(flatten)]
        frame: FrameArgs,
    },
    /// Render hex YUV text into a PNG image.
    Render {
        /// Hex text input (glob patterns must match exactly one file)
        input: PathBuf,

        /// Output PNG path
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Integer zoom factor
        #[arg(long, default_value_t = DEFAULT_RENDER_SCALE)]
        scale: u32,

        #[command(flatten)]
        frame: FrameArgs,
    },
    /// Read frames from a serial port and render them as they arrive.
    #[command(
        after_help = "Each status line starting with '#' closes the current frame. Completed frames\nare written to --snapshot-dir as frame_0001.png, frame_0002.png, ..."
    )]
    Stream {
        /// Serial port, e.g. /dev/ttyACM0 or COM3
        port: String,

        #[arg(long, default_value_t = DEFAULT_BAUD)]
        baud: u32,

        /// Per-read timeout; an idle timeout ends the session unless --follow
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        /// Keep reading across idle timeouts
        #[arg(long)]
        follow: bool,

        /// Directory for PNG snapshots of completed frames
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,

        /// PNG path for the last frame when the session ends
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Events buffered between the reader and the renderer
        #[arg(long, default_value_t = pipeline::stream::DEFAULT_CHANNEL_CAPACITY)]
        capacity: usize,

        /// Integer zoom factor
        #[arg(long, default_value_t = DEFAULT_RENDER_SCALE)]
        scale: u32,

        #[command(flatten)]
        frame: FrameArgs,
    },
    /// Write a synthetic test pattern PNG.
    Pattern {
        /// Output PNG path
        #[arg(short = 'o', long)]
        output: PathBuf,

        #[arg(long, default_value_t = hexcam_core::config::DEFAULT_WIDTH)]
        width: u32,

        #[arg(long, default_value_t = hexcam_core::config::DEFAULT_HEIGHT)]
        height: u32,

        /// Integer zoom factor
        #[arg(long, default_value_t = DEFAULT_PATTERN_SCALE)]
        scale: u32,
    },
}

/// Frame options; flags override the config file, which overrides defaults.
#[derive(Args, Debug)]
struct FrameArgs {
    /// JSON frame configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// packed-nibble | yuyv
    #[arg(long)]
    layout: Option<GroupLayout>,

    /// luma-only | full-yuv
    #[arg(long)]
    color_model: Option<ColorModel>,

    /// truncate | wrap | error
    #[arg(long)]
    overflow: Option<OverflowPolicy>,

    /// Fail on the first malformed hex token
    #[arg(long)]
    strict: bool,
}

impl FrameArgs {
    /// `base` supplies every setting that neither the config file nor a flag
    /// sets.
    fn resolve(&self, base: FrameConfig) -> Result<FrameConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => FrameConfig::load_over(path, base).map_err(invalid_config)?,
            None => base,
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(color_model) = self.color_model {
            config.color_model = color_model;
        }
        if let Some(overflow) = self.overflow {
            config.overflow = overflow;
        }
        if self.strict {
            config.decode_policy = DecodePolicy::Strict;
        }
        config.validate().map_err(invalid_config)?;
        Ok(config)
    }
}

fn invalid_config(err: ConfigError) -> CliError {
    let hint = match err {
        ConfigError::ZeroDimension { .. } | ConfigError::TooLarge { .. } => {
            format!("use --width/--height between 1 and {}", MAX_DIMENSION)
        }
        _ => "see --help for the accepted config fields".to_string(),
    };
    CliError::new(err.to_string(), Some(hint))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let summary = cli.summary;
    let result = match cli.command {
        Commands::Hex2bin {
            input,
            output,
            strict,
        } => cmd_hex2bin(input, output, strict, summary),
        Commands::Yuv2raw {
            input,
            output,
            frame,
        } => cmd_yuv2raw(input, output, frame, summary),
        Commands::Render {
            input,
            output,
            scale,
            frame,
        } => cmd_render(input, output, scale, frame, summary),
        Commands::Stream {
            port,
            baud,
            timeout_ms,
            follow,
            snapshot_dir,
            output,
            capacity,
            scale,
            frame,
        } => cmd_stream(
            StreamOptions {
                port,
                baud,
                timeout: Duration::from_millis(timeout_ms),
                follow,
                snapshot_dir,
                output,
                capacity,
                scale,
            },
            frame,
            summary,
        ),
        Commands::Pattern {
            output,
            width,
            height,
            scale,
        } => cmd_pattern(output, width, height, scale),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn conversion_failed(err: PipelineError) -> CliError {
    let hint = match &err {
        PipelineError::Decode { .. } => Some("drop --strict to skip malformed tokens".to_string()),
        PipelineError::Frame(_) => {
            Some("use --overflow truncate or wrap, or check --width/--height".to_string())
        }
        _ => None,
    };
    CliError::new(format!("conversion failed: {}", err), hint)
}

fn cmd_hex2bin(
    input: PathBuf,
    output: PathBuf,
    strict: bool,
    summary: bool,
) -> Result<(), CliError> {
    let input = open_input(&input, &output)?;
    let policy = if strict {
        DecodePolicy::Strict
    } else {
        DecodePolicy::Lenient
    };
    let writer = create_output(&output)?;
    let mut source = TextLineSource::open(&input.path)
        .with_context(|| format!("Failed to open input: {}", input.path.display()))?;
    let stats = pipeline::hex_to_bin(&mut source, writer, policy).map_err(conversion_failed)?;

    tracing::info!(
        bytes = stats.tokens_decoded,
        skipped = stats.tokens_skipped,
        "wrote {}",
        output.display()
    );
    if summary {
        let mut report = input.summary();
        report.decode = stats;
        print_summary(&report)?;
    }
    Ok(())
}

fn cmd_yuv2raw(
    input: PathBuf,
    output: PathBuf,
    frame: FrameArgs,
    summary: bool,
) -> Result<(), CliError> {
    let config = frame.resolve(FrameConfig {
        color_model: ColorModel::FullYuv,
        ..FrameConfig::default()
    })?;
    let input = open_input(&input, &output)?;
    let writer = create_output(&output)?;
    let mut source = TextLineSource::open(&input.path)
        .with_context(|| format!("Failed to open input: {}", input.path.display()))?;
    let stats = pipeline::yuv_to_raw(&mut source, writer, &config).map_err(conversion_failed)?;

    log_frame_stats(&stats, &output);
    if summary {
        print_summary(&input.summary().with_stats(stats, &config))?;
    }
    Ok(())
}

fn cmd_render(
    input: PathBuf,
    output: PathBuf,
    scale: u32,
    frame: FrameArgs,
    summary: bool,
) -> Result<(), CliError> {
    let config = frame.resolve(FrameConfig::default())?;
    validate_scale(scale, config.width, config.height)?;
    let input = open_input(&input, &output)?;
    let mut source = TextLineSource::open(&input.path)
        .with_context(|| format!("Failed to open input: {}", input.path.display()))?;
    let (image, stats) = pipeline::render_frame(&mut source, &config).map_err(conversion_failed)?;
    write_png(&image, &output, scale)?;

    log_frame_stats(&stats, &output);
    if summary {
        print_summary(&input.summary().with_stats(stats, &config))?;
    }
    Ok(())
}

struct StreamOptions {
    port: String,
    baud: u32,
    timeout: Duration,
    follow: bool,
    snapshot_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    capacity: usize,
    scale: u32,
}

fn cmd_stream(options: StreamOptions, frame: FrameArgs, summary: bool) -> Result<(), CliError> {
    let config = frame.resolve(FrameConfig::default())?;
    validate_scale(options.scale, config.width, config.height)?;
    if let Some(dir) = &options.snapshot_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot directory: {}", dir.display()))?;
    }

    let source = SerialLineSource::open(&options.port, options.baud, options.timeout)
        .map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("check the port name and that no other program holds it".to_string()),
            )
        })?
        .follow(options.follow);
    let reader =
        spawn_stream_reader(source, config, options.capacity).map_err(conversion_failed)?;

    let mut renderer = FrameRenderer::new(config.width, config.height);
    let mut latest: Option<RgbFrame> = None;
    for event in reader.iter() {
        let completed = renderer
            .apply(&event)
            .context("Failed to apply stream event")?;
        if let Some(done) = completed {
            if let Some(dir) = &options.snapshot_dir {
                let path = dir.join(format!("frame_{:04}.png", renderer.completed()));
                write_png(&done, &path, options.scale)?;
                tracing::debug!(path = %path.display(), "snapshot written");
            }
            latest = Some(done);
        }
    }
    let session: StreamSummary = reader.join().map_err(conversion_failed)?;

    if let Some(last) = renderer.take_frame() {
        latest = Some(last);
    }
    if let Some(output) = &options.output {
        match &latest {
            Some(image) => write_png(image, output, options.scale)?,
            None => tracing::warn!("no frame received; {} not written", output.display()),
        }
    }
    tracing::info!(
        frames = renderer.completed(),
        pixels = session.stats.frame.pixels_emitted,
        "stream ended"
    );
    if summary {
        let report = hexcam_core::make_summary(&options.port, None)
            .with_stats(session.stats, &config);
        print_summary(&report)?;
    }
    Ok(())
}

fn cmd_pattern(output: PathBuf, width: u32, height: u32, scale: u32) -> Result<(), CliError> {
    FrameConfig {
        width,
        height,
        ..FrameConfig::default()
    }
    .validate()
    .map_err(invalid_config)?;
    validate_scale(scale, width, height)?;
    let image = hexcam_core::pattern::test_pattern(width, height)
        .context("Failed to build test pattern")?;
    write_png(&image, &output, scale)?;
    tracing::info!(width, height, "wrote {}", output.display());
    Ok(())
}

/// A resolved input file.
struct Input {
    path: PathBuf,
    display: String,
    bytes: u64,
}

impl Input {
    fn summary(&self) -> ConversionSummary {
        hexcam_core::make_summary(&self.display, Some(self.bytes))
    }
}

fn open_input(input: &Path, output: &Path) -> Result<Input, CliError> {
    let resolved = resolve_input_path(input)?;
    validate_input_file(&resolved)?;
    ensure_distinct(&resolved, output)?;
    let meta = fs::metadata(&resolved)
        .with_context(|| format!("Failed to read input file: {}", resolved.display()))?;
    Ok(Input {
        display: resolved.display().to_string(),
        path: resolved,
        bytes: meta.len(),
    })
}

fn create_output(output: &Path) -> Result<BufWriter<File>, CliError> {
    ensure_parent_dir(output)?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create output: {}", output.display()))?;
    Ok(BufWriter::new(file))
}

fn write_png(image: &RgbFrame, output: &Path, scale: u32) -> Result<(), CliError> {
    ensure_parent_dir(output)?;
    match image.write_png(output, scale) {
        Ok(()) => Ok(()),
        Err(err @ SinkError::ImageTooLarge { .. }) => Err(CliError::new(
            err.to_string(),
            Some("use a smaller --scale".to_string()),
        )),
        Err(err) => Err(CliError::from(anyhow::Error::new(err).context(format!(
            "Failed to write PNG: {}",
            output.display()
        )))),
    }
}

fn ensure_parent_dir(output: &Path) -> Result<(), CliError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn print_summary(summary: &ConversionSummary) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(summary).context("JSON serialization failed")?;
    println!("{}", json);
    Ok(())
}

fn log_frame_stats(stats: &PipelineStats, output: &Path) {
    tracing::info!(
        pixels = stats.frame.pixels_emitted,
        dropped = stats.frame.pixels_dropped,
        frames = stats.frame.frames,
        "wrote {}",
        output.display()
    );
}

fn validate_scale(scale: u32, width: u32, height: u32) -> Result<(), CliError> {
    if scale == 0 {
        return Err(CliError::new(
            "scale must be at least 1",
            Some("use --scale 1 for unscaled output".to_string()),
        ));
    }
    let side = |dimension: u32| u64::from(dimension) * u64::from(scale);
    if side(width).saturating_mul(side(height)) > MAX_IMAGE_PIXELS {
        return Err(CliError::new(
            format!(
                "scale {} turns the {}x{} frame into more than {} pixels",
                scale, width, height, MAX_IMAGE_PIXELS
            ),
            Some("use a smaller --scale".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a hex text dump such as yuv_96x96.txt".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a hex text dump such as yuv_96x96.txt".to_string()),
        ));
    }
    Ok(())
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let Ok(output_abs) = fs::canonicalize(output) else {
        return Ok(());
    };
    if output_abs == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single dump file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
