use anyhow::{anyhow, bail, Context};
use clap::Parser;
use lumen_svg::{font_registry, Document};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// lumen-svg: Render SVG documents to PNG images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input SVG file, or - to read from stdin
    input: String,

    /// Path to the output PNG file, or - to write to stdout
    output: String,

    /// Output width in pixels. Derived from the height when omitted
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels. Derived from the width when omitted
    #[arg(long)]
    height: Option<u32>,

    /// Background color as 0xRRGGBBAA. Shorter values are zero-extended
    #[arg(long, default_value = "0x00000000", value_parser = parse_color)]
    background: u32,

    /// Register a font face before rendering: FAMILY[:bold][:italic]=PATH
    #[arg(long = "font", value_name = "FAMILY[:bold][:italic]=PATH")]
    fonts: Vec<FontArg>,
}

#[derive(Debug, Clone, PartialEq)]
struct FontArg {
    family: String,
    bold: bool,
    italic: bool,
    path: PathBuf,
}

impl FromStr for FontArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (face, path) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FAMILY[:bold][:italic]=PATH, got '{s}'"))?;
        let mut parts = face.split(':');
        let family = parts.next().unwrap_or_default().trim();
        if family.is_empty() {
            bail!("font family must not be empty in '{s}'");
        }
        if path.is_empty() {
            bail!("font path must not be empty in '{s}'");
        }

        let (mut bold, mut italic) = (false, false);
        for flag in parts {
            match flag {
                "bold" => bold = true,
                "italic" => italic = true,
                other => bail!("unknown font style '{other}', expected bold or italic"),
            }
        }
        Ok(FontArg {
            family: family.to_string(),
            bold,
            italic,
            path: PathBuf::from(path),
        })
    }
}

fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('#'))
        .unwrap_or(s);
    if hex.is_empty() || hex.len() > 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected up to 8 hex digits (RRGGBBAA), got '{s}'"));
    }
    // shorter values fill the low bits, so `ff` is opaque black
    u32::from_str_radix(hex, 16).map_err(|err| format!("invalid color '{s}': {err}"))
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read SVG from stdin")?;
        Ok(data)
    } else {
        std::fs::read(input).with_context(|| format!("Failed to read input file: {input}"))
    }
}

fn open_output(output: &str) -> anyhow::Result<Box<dyn Write>> {
    if output == "-" {
        Ok(Box::new(std::io::stdout().lock()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("Failed to create output file: {output}"))?;
        Ok(Box::new(std::io::BufWriter::new(file)))
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    for font in &args.fonts {
        font_registry::add_font_face_from_file(&font.family, font.bold, font.italic, &font.path)
            .with_context(|| format!("Failed to load font {}", font.path.display()))?;
        log::info!("registered font face {:?}", font.family);
    }

    let data = read_input(&args.input)?;
    let document = Document::load_from_data(&data)
        .with_context(|| format!("Failed to load SVG document: {}", args.input))?;
    let bitmap = document
        .render_to_bitmap(args.width, args.height, args.background)
        .context("Failed to render SVG document")?;
    log::debug!("rendered {}x{} bitmap", bitmap.width(), bitmap.height());

    let mut out = open_output(&args.output)?;
    let mut written = Ok(());
    bitmap.write_to_png_stream(|chunk| {
        if written.is_ok() {
            written = out.write_all(chunk);
        }
    })?;
    written
        .and_then(|_| out.flush())
        .with_context(|| format!("Failed to write output: {}", args.output))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(Args::parse())
}
