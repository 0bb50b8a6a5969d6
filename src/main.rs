use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "scantitle",
    version,
    about = "Guess a document title from a scanned page using tesseract OCR"
)]
struct Cli {
    /// Scanned document (PDF or image)
    #[arg(required_unless_present = "show_languages")]
    source: Option<PathBuf>,

    /// Display name of the document (defaults to the file name).
    /// A "_rotate<deg>" marker in it forces a single rotation.
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Directory for rasterized pages and OCR output
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Try only this rotation angle
    #[arg(short = 'a', long = "angle")]
    angle: Option<u32>,

    /// OCR languages, tesseract style (e.g. deu+eng)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Print the selection as JSON
    #[arg(long = "json")]
    json: bool,

    /// Keep OCR output of every rotation attempt
    #[arg(long = "keep-all")]
    keep_all: bool,

    /// Show installed tesseract languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    scantitle::logging::init(cli.verbose)?;

    let output = scantitle::run(scantitle::Config {
        source: cli.source.unwrap_or_default(),
        name: cli.name,
        out_dir: cli.out_dir,
        settings_path: cli.read_settings,
        angle: cli.angle,
        lang: cli.lang,
        json: cli.json,
        keep_all: cli.keep_all,
        show_languages: cli.show_languages,
    })?;

    println!("{}", output);
    Ok(())
}
