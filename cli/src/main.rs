//! sempdf CLI - locate prose, formulas, images and tables in PDFs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use sempdf::render::{self, OverlayOptions};
use sempdf::{
    ExtractOptions, ExtractorRegistry, Fragment, FragmentKind, JsonFormat, LopdfBackend,
    PageSelection, TextMode,
};

#[derive(Parser)]
#[command(name = "sempdf")]
#[command(version)]
#[command(about = "Extract prose, formulas, images and tables with bounding boxes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fragments as JSON or text
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Fragment kind
        #[arg(short, long, value_enum, default_value = "all", env = "SEMPDF_KIND")]
        kind: KindArg,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Skip pages that cannot be read
        #[arg(long)]
        lenient: bool,

        /// Process pages one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Write a copy of the PDF with every fragment outlined
    Annotate {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Annotated output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Fragment kind
        #[arg(short, long, value_enum, default_value = "all")]
        kind: KindArg,

        /// Do not label boxes with their kind
        #[arg(long)]
        no_labels: bool,

        /// Skip fragments containing this term (repeatable)
        #[arg(long, value_name = "TERM")]
        boilerplate: Vec<String>,

        /// Minimum box width and height
        #[arg(long, default_value = "1.0")]
        min_size: f32,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Prose blocks
    Text,
    /// One fragment per visual line of each sentence
    Sentences,
    /// Merged formulas
    Formula,
    /// Image placements
    Image,
    /// Parsed tables
    Table,
    /// Everything: text, formulas, images, tables
    All,
}

impl KindArg {
    fn kind(self) -> Option<FragmentKind> {
        match self {
            KindArg::Text | KindArg::Sentences => Some(FragmentKind::Text),
            KindArg::Formula => Some(FragmentKind::Formula),
            KindArg::Image => Some(FragmentKind::Image),
            KindArg::Table => Some(FragmentKind::Table),
            KindArg::All => None,
        }
    }

    fn apply(self, options: ExtractOptions) -> ExtractOptions {
        match self {
            KindArg::Sentences => options.with_text_mode(TextMode::Sentences),
            _ => options,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// JSON array of fragment records
    Json,
    /// One line per fragment
    Text,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            kind,
            output,
            format,
            compact,
            pages,
            lenient,
            sequential,
        } => {
            let options = build_options(kind, pages.as_deref(), lenient, sequential);
            options.and_then(|options| {
                cmd_extract(&input, kind, options, output.as_deref(), format, compact)
            })
        }
        Commands::Annotate {
            input,
            output,
            kind,
            no_labels,
            boilerplate,
            min_size,
        } => {
            let overlay = boilerplate
                .into_iter()
                .fold(OverlayOptions::new(), OverlayOptions::with_boilerplate)
                .with_labels(!no_labels)
                .with_min_size(min_size);
            cmd_annotate(&input, &output, kind, &overlay)
        }
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(
    kind: KindArg,
    pages: Option<&str>,
    lenient: bool,
    sequential: bool,
) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p)?
    } else {
        PageSelection::All
    };

    let mut options = ExtractOptions::new()
        .with_pages(page_selection)
        .with_parallel(!sequential);
    if lenient {
        options = options.lenient();
    }
    Ok(kind.apply(options))
}

/// Run one extractor, or all of them behind a spinner.
fn run_extraction(
    input: &Path,
    kind: KindArg,
    options: ExtractOptions,
) -> Result<Vec<Fragment>, Box<dyn std::error::Error>> {
    let registry = ExtractorRegistry::with_options(options);

    if let Some(kind) = kind.kind() {
        return Ok(registry.extract(input, kind)?);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting fragments from {}...", input.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = registry.extract_all(input);
    pb.finish_and_clear();
    Ok(result?)
}

fn cmd_extract(
    input: &Path,
    kind: KindArg,
    options: ExtractOptions,
    output: Option<&Path>,
    format: OutputFormat,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fragments = run_extraction(input, kind, options)?;

    let rendered = match format {
        OutputFormat::Json => {
            let json_format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            render::to_json(&fragments, json_format)?
        }
        OutputFormat::Text => render::to_text(&fragments),
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!(
            "{} {} fragments to {}",
            "Saved".green(),
            fragments.len(),
            path.display()
        );
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn cmd_annotate(
    input: &Path,
    output: &Path,
    kind: KindArg,
    overlay: &OverlayOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = kind.apply(ExtractOptions::new().lenient());
    let fragments = run_extraction(input, kind, options)?;
    log::debug!("Annotating {} fragments", fragments.len());
    let report = render::annotate_copy(input, output, &fragments, overlay)?;

    println!("{} {}", "Saved to".green(), output.display());
    println!("  {} {} boxes drawn", "├─".dimmed(), report.drawn);
    println!("  {} {} rejected", "├─".dimmed(), report.rejected);
    println!("  {} {} filtered as boilerplate", "├─".dimmed(), report.filtered);
    println!("  {} {} labels skipped", "└─".dimmed(), report.skipped_labels);

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let info = LopdfBackend::open(input)?.info();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if info.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = info.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref created) = info.created {
        println!("{}: {}", "Created".bold(), created.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    println!();
    println!("{}", "Fragments".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    // Info should still report counts when some pages are unreadable
    let registry = ExtractorRegistry::with_options(ExtractOptions::new().lenient());
    for kind in FragmentKind::ALL {
        match registry.extract(input, kind) {
            Ok(fragments) => println!("{}: {}", kind.as_str().bold(), fragments.len()),
            Err(e) => println!("{}: {}", kind.as_str().bold(), e.to_string().yellow()),
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "sempdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Formula, prose, image and table extraction with bounding boxes");
    println!();
    println!("License: MIT");
}
