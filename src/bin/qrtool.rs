use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qr_pipeline::payload::extract;
use qr_pipeline::render::{Surface, encode_png, rasterize, rendered_size};
use qr_pipeline::{
    Charset, Color, ECLevel, EyeShape, Generator, LayoutEngine, PageRenderer, PageSize,
    PixelShape, QrContent, QrStyle, QrSymbol, RasterPageRenderer, RenderOutcome,
    SettingsProvider, classify, parse_wifi, settings, strip_tracking_params,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR pipeline CLI tools")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a payload and show the extracted fields
    Classify { payload: String },
    /// Parse a WiFi payload
    Wifi { payload: String },
    /// Remove utm* tracking parameters from a URL
    StripUrl { url: String },
    /// Generate a styled symbol and write it as PNG
    Generate {
        #[command(flatten)]
        symbol: SymbolArgs,
        /// Output PNG path
        #[arg(long)]
        out: PathBuf,
        /// Pixels per module (clamped to 10-15)
        #[arg(long)]
        scale: Option<u32>,
    },
    /// Show the print layout for N copies
    Layout {
        #[command(flatten)]
        symbol: SymbolArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Rasterise print pages to PNG files
    Print {
        #[command(flatten)]
        symbol: SymbolArgs,
        #[command(flatten)]
        page: PageArgs,
        /// Directory for page images
        #[arg(long)]
        out_dir: PathBuf,
        /// Page resolution
        #[arg(long, default_value_t = 150)]
        dpi: u32,
        /// Job name, used for file names
        #[arg(long, default_value = "qr")]
        job_name: String,
    },
}

#[derive(Args)]
struct SymbolArgs {
    /// Text to encode
    #[arg(long)]
    text: String,
    /// Error correction level (L, M, Q, H)
    #[arg(long)]
    level: Option<ECLevel>,
    /// Text charset (utf8, latin1)
    #[arg(long)]
    charset: Option<Charset>,
    /// Data module color, #RRGGBB[AA]
    #[arg(long, default_value = "#000000")]
    fg: Color,
    /// Background color
    #[arg(long, default_value = "#ffffff")]
    bg: Color,
    /// Finder ring color (defaults to --fg)
    #[arg(long)]
    eye: Option<Color>,
    /// Finder center color (defaults to --eye)
    #[arg(long)]
    pupil: Option<Color>,
    #[arg(long, value_enum, default_value_t = PixelArg::Square)]
    pixel_shape: PixelArg,
    #[arg(long, value_enum, default_value_t = EyeArg::Square)]
    eye_shape: EyeArg,
}

#[derive(Args)]
struct PageArgs {
    /// Number of copies
    #[arg(long, default_value_t = 1)]
    copies: usize,
    #[arg(long, value_enum, default_value_t = PageArg::Letter)]
    page: PageArg,
    /// Scale symbols to fill their cells
    #[arg(long)]
    fill: bool,
    /// Align the grid to the top-left margin instead of centering
    #[arg(long)]
    top_left: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PixelArg {
    Square,
    Circle,
    Rounded,
}

#[derive(Clone, Copy, ValueEnum)]
enum EyeArg {
    Square,
    Circle,
    Rounded,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageArg {
    Letter,
    A4,
}

impl SymbolArgs {
    fn build(&self) -> anyhow::Result<QrSymbol> {
        let config = settings();
        let eye = self.eye.unwrap_or(self.fg);
        let style = QrStyle {
            background_color: self.bg,
            foreground_color: self.fg,
            eye_color: eye,
            pupil_color: self.pupil.unwrap_or(eye),
            pixel_shape: match self.pixel_shape {
                PixelArg::Square => PixelShape::Square,
                PixelArg::Circle => PixelShape::Circle,
                PixelArg::Rounded => PixelShape::RoundedSquare,
            },
            eye_shape: match self.eye_shape {
                EyeArg::Square => EyeShape::Square,
                EyeArg::Circle => EyeShape::Circle,
                EyeArg::Rounded => EyeShape::Rounded,
            },
            ..QrStyle::default()
        };
        let content = QrContent::new(
            self.text.clone(),
            self.level.unwrap_or_else(|| config.default_ec_level()),
        );
        let generator = Generator::new(self.charset.unwrap_or_else(|| config.charset()));
        Ok(generator.generate(&content, &style)?)
    }
}

impl PageArgs {
    fn engine(&self) -> LayoutEngine {
        let mut engine = LayoutEngine::from_settings(settings());
        engine.scale_to_fill |= self.fill;
        engine.center_on_page &= !self.top_left;
        engine
    }

    fn size(&self) -> PageSize {
        match self.page {
            PageArg::Letter => PageSize::LETTER,
            PageArg::A4 => PageSize::A4,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Classify { payload } => classify_cmd(&payload),
        Command::Wifi { payload } => wifi_cmd(&payload)?,
        Command::StripUrl { url } => println!("{}", strip_tracking_params(&url)),
        Command::Generate { symbol, out, scale } => generate_cmd(&symbol, &out, scale)?,
        Command::Layout { symbol, page } => layout_cmd(&symbol, &page)?,
        Command::Print {
            symbol,
            page,
            out_dir,
            dpi,
            job_name,
        } => print_cmd(&symbol, &page, out_dir, dpi, &job_name).await?,
    }
    Ok(())
}

fn classify_cmd(payload: &str) {
    let category = classify(payload);
    println!("Category: {}", category);
    match extract(category, payload) {
        Ok(fields) => println!("Fields:   {:?}", fields),
        Err(e) => println!("Fields:   <{}>", e),
    }
}

fn wifi_cmd(payload: &str) -> anyhow::Result<()> {
    let credentials = parse_wifi(payload)?;
    println!("Security: {:?}", credentials.security);
    println!("SSID:     {}", credentials.ssid);
    println!("Password: {}", credentials.password);
    println!("Hidden:   {}", credentials.hidden);
    Ok(())
}

fn generate_cmd(args: &SymbolArgs, out: &Path, scale: Option<u32>) -> anyhow::Result<()> {
    let symbol = args.build()?;
    let scale = Surface::Export.scale(
        &symbol.style,
        scale.unwrap_or_else(|| settings().export_scale()),
    );
    let png = encode_png(&rasterize(&symbol, scale))?;
    std::fs::write(out, &png).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(
        version = symbol.version.number(),
        level = %symbol.error_correction,
        mask = symbol.mask_pattern.bits(),
        bytes = png.len(),
        "wrote {}",
        out.display()
    );
    Ok(())
}

fn layout_cmd(args: &SymbolArgs, page: &PageArgs) -> anyhow::Result<()> {
    let symbol = Arc::new(args.build()?);
    let bytes = rendered_size(&symbol, settings().export_scale())?;
    let pages = page
        .engine()
        .layout_measured(&symbol, page.copies, page.size(), bytes)?;
    println!(
        "Symbol: version {} ({}x{}), {} bytes as PNG",
        symbol.version.number(),
        symbol.size(),
        symbol.size(),
        bytes
    );
    for (i, p) in pages.iter().enumerate() {
        println!("Page {} ({} x {} pt)", i + 1, p.size.width, p.size.height);
        for cell in &p.cells {
            let f = cell.frame;
            println!("  cell at ({:.1}, {:.1}) size {:.1}", f.x, f.y, f.width);
        }
    }
    Ok(())
}

async fn print_cmd(
    args: &SymbolArgs,
    page: &PageArgs,
    out_dir: PathBuf,
    dpi: u32,
    job_name: &str,
) -> anyhow::Result<()> {
    let symbol = Arc::new(args.build()?);
    let pages = page.engine().layout(&symbol, page.copies, page.size())?;
    let renderer = RasterPageRenderer::new(dpi).with_output_dir(out_dir);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match renderer.render(&pages, job_name, &cancel).await? {
        RenderOutcome::Completed => Ok(()),
        RenderOutcome::Cancelled => anyhow::bail!("Print job cancelled"),
    }
}
