//! Exam sheet server
//!
//! Teachers upload a worksheet or past paper as PDF and get back a clean
//! exam sheet: the academy header with blank class/name/score fields,
//! followed by the original text re-flowed into justified paragraphs.
//!
//! ## Commands
//!
//! - `serve`: HTTP service with an upload page and `POST /api/exam-sheet`
//! - `convert`: one-shot conversion of a local file
//!
//! ## Architecture
//!
//! Generation is CPU-bound (text extraction and Typst layout), so the
//! handler runs it on tokio's blocking pool under a timeout. The loaded
//! fonts are shared read-only between requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use exam_engine::{ExamSheetGenerator, FontConfig, RenderError, SheetConfig};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
#[cfg(test)]
mod tests;

/// Command-line interface for the exam sheet server
#[derive(Parser, Debug)]
#[command(name = "exam-server")]
#[command(about = "Turn uploaded PDFs into exam sheets", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, env = "EXAM_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Convert one local PDF and print the output path
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "EXAM_PORT")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "EXAM_HOST")]
    host: String,

    /// Generation timeout in milliseconds
    #[arg(long, default_value = "30000", env = "EXAM_TIMEOUT_MS")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10", env = "EXAM_RATE_LIMIT")]
    rate_limit: u32,

    /// Largest accepted upload in MiB
    #[arg(long, default_value = "20", env = "EXAM_MAX_UPLOAD_MB")]
    max_upload_mb: usize,

    #[command(flatten)]
    sheet: SheetArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF to convert
    input: PathBuf,

    /// Directory for the output (defaults to the input's directory)
    #[arg(long, env = "EXAM_OUT_DIR")]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    sheet: SheetArgs,
}

/// Options shaping the generated sheet
#[derive(Args, Debug, Clone)]
struct SheetArgs {
    /// Institution name printed at the top of the sheet
    #[arg(long, env = "EXAM_TITLE")]
    title: Option<String>,

    /// Extra font directory (repeatable)
    #[arg(long = "font-dir", env = "EXAM_FONT_DIRS", value_delimiter = ',')]
    font_dirs: Vec<PathBuf>,

    /// Preferred font family, most preferred first (repeatable)
    #[arg(long = "font", env = "EXAM_FONTS", value_delimiter = ',')]
    fonts: Vec<String>,

    /// Do not scan the platform font directories
    #[arg(long, env = "EXAM_NO_SYSTEM_FONTS")]
    no_system_fonts: bool,
}

impl SheetArgs {
    fn into_config(self) -> SheetConfig {
        let mut config = SheetConfig {
            fonts: FontConfig {
                font_dirs: self.font_dirs,
                system_fonts: !self.no_system_fonts,
            },
            ..SheetConfig::default()
        };
        if let Some(title) = self.title {
            config.title = title;
        }
        if !self.fonts.is_empty() {
            config.font_families = self.fonts;
        }
        config
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ExamSheetGenerator>,
    /// Generation timeout in milliseconds
    pub timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Convert(args) => convert(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting exam sheet server on {}:{}", args.host, args.port);

    let generator = ExamSheetGenerator::new(args.sheet.into_config());
    let fonts = generator.composer().fonts();
    info!("Loaded {} fonts", fonts.len());
    debug!("Font families: {}", fonts.list_font_families().join(", "));
    ensure_header_renderable(&generator)?;

    let rate = args.rate_limit.max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_interval_ms(rate))
            .burst_size(rate * 2)
            .finish()
            .context("Failed to create rate limiter config")?,
    );

    let state = AppState {
        generator: Arc::new(generator),
        timeout_ms: args.timeout_ms,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = args.max_upload_mb * 1024 * 1024;
    let app = api::router(state, max_upload_bytes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .layer(cors),
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", rate);
    info!("Generation timeout: {}ms", args.timeout_ms);
    info!("Upload limit: {} MiB", args.max_upload_mb);

    // The rate limiter keys on the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let original_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let generator = ExamSheetGenerator::new(args.sheet.into_config());
    ensure_header_renderable(&generator)?;
    let sheet = generator
        .generate(&bytes, &original_name)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default(),
    };
    let out_path = out_dir.join(&sheet.filename);
    std::fs::write(&out_path, &sheet.pdf)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    info!(
        "Wrote {} ({} pages, {} paragraphs)",
        out_path.display(),
        sheet.page_count,
        sheet.paragraph_count
    );
    println!("{}", out_path.display());
    Ok(())
}

/// Milliseconds between replenished requests for a rate in requests per second
fn replenish_interval_ms(requests_per_second: u32) -> u64 {
    (1000 / u64::from(requests_per_second.max(1))).max(1)
}

/// Refuse to run when the sheet header cannot be drawn with the loaded fonts
fn ensure_header_renderable(generator: &ExamSheetGenerator) -> anyhow::Result<()> {
    generator
        .composer()
        .check_header()
        .map_err(|err| match err {
            RenderError::UnsupportedGlyph { character, .. } => anyhow!(
                "No loaded font can render {:?} in the sheet header. \
                 Install a Korean font, pass --font-dir with one, or change --title",
                character
            ),
            other => anyhow!(other),
        })
}
