//! CLI entry point for `mailpeel`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};

use mailpeel::config::Config;
use mailpeel::extract::Extractor;
use mailpeel::output::dir::prepare_output_dir;
use mailpeel::output::writer::{OutputNames, OutputWriter};
use mailpeel::{ExtractError, FormatPath, FormatTag};

#[derive(Parser)]
#[command(name = "mailpeel", version, about = "Extract all the emails from the provided file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every message reachable along a format path
    Extract {
        /// The file whose content to extract
        #[arg(value_name = "FILE")]
        input: PathBuf,
        /// Layering of the input, outermost first, e.g. ZIP,EML
        #[arg(short = 'f', long = "filetype", value_delimiter = ',', required = true)]
        format: Vec<FormatTag>,
        /// Output path to extract files to
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Size of the buffers allocated when reading/writing files
        #[arg(short, long, value_name = "BYTES")]
        buffer: Option<usize>,
        /// Maximum number of bytes to write per output file
        #[arg(short, long, value_name = "BYTES")]
        limit: Option<u64>,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; failures are reported once logging is up
    let (config, config_error) = match mailpeel::config::load_config() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Using default configuration");
    }

    match cli.command {
        Commands::Extract {
            input,
            format,
            output,
            buffer,
            limit,
            json,
        } => {
            let mut extraction = config.extraction.clone();
            if let Some(output) = output {
                extraction.output_dir = output;
            }
            if let Some(buffer) = buffer {
                extraction.buffer_size = buffer;
            }
            if let Some(limit) = limit {
                extraction.max_output_size = limit;
            }
            cmd_extract(&input, FormatPath::new(format), &extraction, json)
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = mailpeel::config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailpeel.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailpeel", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Validate the request, prepare the output directory and run one extraction.
fn cmd_extract(
    input: &Path,
    mut format: FormatPath,
    extraction: &mailpeel::config::ExtractionConfig,
    json: bool,
) -> anyhow::Result<()> {
    format.validate()?;
    if !input.exists() {
        tracing::error!(path = %input.display(), "File not exists");
        return Err(ExtractError::InputNotFound(input.to_path_buf()).into());
    }

    let output_dir = &extraction.output_dir;
    prepare_output_dir(output_dir)?;

    let before = format.clone();
    let writer = OutputWriter::new(output_dir, OutputNames::new(), extraction.limits());
    let mut extractor = Extractor::new(writer).with_text_policy(extraction.text_policy());

    let start = Instant::now();
    let summary = extractor.run(input, &mut format)?;
    let elapsed = start.elapsed();

    if format != before {
        anyhow::bail!(
            "Processing broken, format path before ({}) differs from path after ({})",
            before,
            format
        );
    }

    if json {
        let output = serde_json::json!({
            "input": input.to_string_lossy(),
            "format": format.to_string(),
            "output_dir": output_dir.to_string_lossy(),
            "files": summary.written,
            "bytes_written": summary.bytes_written(),
            "failed_entries": summary.failed_entries,
            "leftover_text_parts": summary.leftover_text_parts,
            "elapsed_ms": elapsed.as_millis(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};
    println!();
    println!("  {:<25} {}", "Input", input.display());
    println!("  {:<25} {}", "Format path", format);
    println!("  {:<25} {}", "Messages extracted", summary.written.len());
    println!(
        "  {:<25} {}",
        "Bytes written",
        format_size(summary.bytes_written(), BINARY)
    );
    if summary.failed_entries > 0 {
        println!("  {:<25} {}", "Skipped zip entries", summary.failed_entries);
    }
    if summary.leftover_text_parts > 0 {
        println!(
            "  {:<25} {}",
            "Text parts left behind", summary.leftover_text_parts
        );
    }
    println!("  {:<25} {:.2?}", "Time", elapsed);
    println!("  {:<25} {}", "Output directory", output_dir.display());
    println!();

    Ok(())
}
