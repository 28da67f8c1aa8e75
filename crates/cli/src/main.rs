mod echo;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use tagratio_core::{
    Extraction, ExtractionKind, ExtractorConfig, HttpExtractor, InputForm, JsonConfig, convert_to_json, fetch_file,
    fetch_stdin,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the parsed result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Page,
    Report,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "page" | "html" => Ok(Self::Page),
            "report" | "table" => Ok(Self::Report),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: page, report, json", s)),
        }
    }
}

/// Which extractor to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Kind(ExtractionKind);

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content" | "cetr" => Ok(Self(ExtractionKind::Content)),
            "text" => Ok(Self(ExtractionKind::Text)),
            _ => Err(format!("Invalid kind: {}. Valid options: content, text", s)),
        }
    }
}

/// Where the document comes from
#[derive(Clone, Copy)]
enum Input<'a> {
    Url(&'a str),
    File(&'a str),
    Stdin,
}

impl<'a> Input<'a> {
    fn classify(raw: &'a str) -> Self {
        if raw == "-" {
            Self::Stdin
        } else if raw.contains("://") {
            Self::Url(raw)
        } else {
            Self::File(raw)
        }
    }

    fn form(&self) -> InputForm {
        match self {
            Self::Url(_) => InputForm::Url,
            Self::File(_) => InputForm::File,
            Self::Stdin => InputForm::Html,
        }
    }
}

/// Classify the lines of an HTML document by tag ratio and render the report
#[derive(Parser, Debug)]
#[command(name = "tagratio")]
#[command(version)]
#[command(about = "Run a tag-ratio extraction engine over a web page and render its report", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Extraction kind (content, text)
    #[arg(short, long, default_value = "content", value_name = "KIND")]
    kind: Kind,

    /// Output format (page, report, json)
    #[arg(short, long, default_value = "page", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the archive entry for a URL instead of running the engine
    #[arg(long)]
    emit_archive: bool,

    /// Content extractor program
    #[arg(long, value_name = "PROGRAM")]
    content_engine: Option<String>,

    /// Text extractor program
    #[arg(long, value_name = "PROGRAM")]
    text_engine: Option<String>,

    /// Engine timeout in seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    engine_timeout: u64,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::new(self.kind.0);
        config.fetch.timeout = self.timeout;
        if let Some(user_agent) = &self.user_agent {
            config.fetch.user_agent = user_agent.clone();
        }
        if let Some(program) = &self.content_engine {
            config.engine.content.program = program.clone();
        }
        if let Some(program) = &self.text_engine {
            config.engine.text.program = program.clone();
        }
        config.engine.timeout = self.engine_timeout;
        config
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(path: Option<&PathBuf>, output: &[u8], verbose: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            if verbose {
                echo::print_success(&format!("Output written to {}", path.display().bright_white()));
            }
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(output).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info(&format!("{} extraction", args.kind.0));
        eprintln!();
    }

    let extractor = HttpExtractor::new(args.extractor_config()).context("Failed to build HTTP client")?;
    let input = Input::classify(&args.input);
    let started = Instant::now();

    if args.emit_archive {
        let Input::Url(url) = input else {
            bail!("--emit-archive needs a URL input");
        };
        if args.verbose {
            echo::print_step(1, 2, &format!("Fetching {}", url.bright_white().underline()));
        }
        let archive = extractor.fetch_archive(url).await.with_context(|| format!("Failed to fetch {url}"))?;
        if args.verbose {
            eprintln!("  {} {}", "Archive:".dimmed(), echo::format_size(archive.len()).bright_white());
            echo::print_step(2, 2, "Writing archive");
        }
        return write_output(args.output.as_ref(), &archive, args.verbose);
    }

    let extraction = match input {
        Input::Url(url) => {
            if args.verbose {
                echo::print_step(1, 3, &format!("Fetching and analyzing {}", url.bright_white().underline()));
            }
            extractor.extract_url(url).await.with_context(|| format!("Failed to extract from {url}"))?
        }
        Input::File(path) => {
            if args.verbose {
                echo::print_step(1, 3, &format!("Reading from file {}", path.bright_white()));
            }
            let document = fetch_file(path).with_context(|| format!("Failed to read file: {path}"))?;
            if args.verbose {
                eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(document.len()).bright_white());
            }
            extractor.extract_document(document).await.context("Failed to extract from file")?
        }
        Input::Stdin => {
            if args.verbose {
                echo::print_step(1, 3, "Reading from stdin");
            }
            let document = fetch_stdin().context("Failed to read from stdin")?;
            extractor.extract_document(document).await.context("Failed to extract from stdin")?
        }
    };

    if args.verbose {
        echo::print_step(2, 3, "Parsed engine output");
        echo::print_extraction_details(&extraction);
    }

    let output = match args.format {
        OutputFormat::Page => extractor.result_page(input.form(), &extraction),
        OutputFormat::Report => extractor.render(&extraction),
        OutputFormat::Json => {
            let config = JsonConfig { pretty: args.pretty, skip_blank_lines: matches!(extraction, Extraction::Content(_)) };
            let mut json = convert_to_json(&extraction, &config).context("Failed to convert to JSON")?;
            json.push('\n');
            json
        }
    };

    if args.verbose {
        echo::print_step(3, 3, &format!("Writing {:?} output", args.format));
        echo::print_timing("Elapsed", started.elapsed());
        eprintln!();
    }

    write_output(args.output.as_ref(), output.as_bytes(), args.verbose)
}
