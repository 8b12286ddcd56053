//! fbox: file toolbox for interactive shells
//!
//! Commands:
//!   split <file>          - split a file by byte size, part count, or characters
//!   join <chunk>          - reassemble a split family from any one chunk
//!   concat <dir>          - concatenate source files under a directory
//!   tree [<dir>]          - render a directory tree
//!   config show           - display current configuration

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use fbox_core::config::FboxConfig;
use fbox_split::{parse_byte_size, SplitOptions, SplitStrategy};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fbox",
    version,
    about = "file toolbox for interactive shells",
    long_about = "fbox: split, join, and concatenate files, and render directory trees"
)]
struct Cli {
    /// Path to fbox.toml configuration file (default: ~/.config/fbox/fbox.toml)
    #[arg(long, short = 'c', env = "FBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (e.g. info, fbox_split=debug)
    #[arg(long, env = "FBOX_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a file into an ordered sequence of smaller files
    ///
    /// Exactly one strategy is required: --chunk-size (bytes per chunk),
    /// --part-count (number of parts, per-chunk size rounded up), or
    /// --char-count (characters per chunk, text-aware).
    #[command(group(
        ArgGroup::new("strategy")
            .required(true)
            .multiple(false)
            .args(["chunk_size", "part_count", "char_count"])
    ))]
    Split {
        /// Source file to split
        path: PathBuf,

        /// Destination directory (default: the source file's directory)
        #[arg(long, short = 'd')]
        destination: Option<PathBuf>,

        /// Base name for chunk files (default: source name without extension)
        #[arg(long, short = 'b')]
        base_name: Option<String>,

        /// Bytes per chunk; accepts KB/MB/GB suffixes (1 KB = 1024)
        #[arg(long, value_parser = parse_byte_size)]
        chunk_size: Option<u64>,

        /// Number of parts; rounding up can produce fewer files than requested
        #[arg(long)]
        part_count: Option<u32>,

        /// Characters per chunk; never splits a multi-byte character
        #[arg(long)]
        char_count: Option<u64>,

        /// Print the split report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reassemble a split family given any one of its chunk files
    Join {
        /// Any chunk of the family (e.g. notes_size_part0002.txt)
        chunk: PathBuf,

        /// Output path (default: {base}{extension} next to the chunks)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Concatenate source files under a directory into one output file
    Concat {
        /// Root directory to collect from
        dir: PathBuf,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Extension to collect, repeatable (default: from config; none = all)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Suppress the per-file banner lines
        #[arg(long)]
        no_banner: bool,
    },

    /// Render a directory tree
    Tree {
        /// Root directory (default: current directory)
        dir: Option<PathBuf>,

        /// Maximum depth below the root (0 = just the root line)
        #[arg(long)]
        depth: Option<usize>,

        /// Glob pattern to exclude, repeatable (adds to config patterns)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Include hidden (dot-prefixed) entries
        #[arg(long, short = 'a')]
        all: bool,

        /// List directories only
        #[arg(long)]
        dirs_only: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "fbox starting"
    );

    match cli.command {
        Commands::Split {
            path,
            destination,
            base_name,
            chunk_size,
            part_count,
            char_count,
            json,
        } => {
            let strategy = match (chunk_size, part_count, char_count) {
                (Some(n), None, None) => SplitStrategy::Bytes(n),
                (None, Some(k), None) => SplitStrategy::Parts(k),
                (None, None, Some(n)) => SplitStrategy::Chars(n),
                _ => anyhow::bail!(
                    "exactly one of --chunk-size, --part-count, --char-count is required"
                ),
            };
            cmd_split(&config, &path, destination, base_name, strategy, json)
        }
        Commands::Join { chunk, output } => cmd_join(&chunk, output.as_deref()),
        Commands::Concat {
            dir,
            output,
            extensions,
            no_banner,
        } => cmd_concat(&config, &dir, &output, extensions, no_banner),
        Commands::Tree {
            dir,
            depth,
            exclude,
            all,
            dirs_only,
        } => cmd_tree(&config, dir.as_deref(), depth, exclude, all, dirs_only),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(filter: &str) {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

// ── Config loading ────────────────────────────────────────────────────────────

fn resolve_config_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(p) = override_path {
        return p.to_path_buf();
    }
    expand_tilde(Path::new("~/.config/fbox/fbox.toml"))
}

fn load_config(path: &Path) -> Result<FboxConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(FboxConfig::default())
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{}/{}", home, &s[2..]))
    } else {
        path.to_path_buf()
    }
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(total: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ── `fbox split` ──────────────────────────────────────────────────────────────

fn cmd_split(
    config: &FboxConfig,
    path: &Path,
    destination: Option<PathBuf>,
    base_name: Option<String>,
    strategy: SplitStrategy,
    json: bool,
) -> Result<()> {
    let mut opts = SplitOptions::new(path, strategy);
    if let Some(dest) = destination.or_else(|| config.split.destination.clone()) {
        opts = opts.destination(dest);
    }
    if let Some(base) = base_name {
        opts = opts.base_name(base);
    }

    let pb = make_progress_bar(0, "split");
    pb.set_message(format!("{}", path.display()));

    let pb_clone = pb.clone();
    let progress: fbox_split::ProgressFn = Box::new(move |done, total, msg| {
        pb_clone.set_length(total);
        pb_clone.set_position(done);
        pb_clone.set_message(msg.to_string());
    });

    let report = fbox_split::split_file(&opts, Some(&progress))
        .with_context(|| format!("splitting {}", path.display()))?;

    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let source_name = report
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.source.display().to_string());
    println!(
        "Split {}: {} parts → {}",
        source_name,
        report.part_count(),
        report.destination.display()
    );
    if report.part_count() > 0 {
        let unit = if report.mode == "char" { "chars" } else { "bytes" };
        println!("  mode:    {}", report.mode);
        println!("  written: {} {}", report.total_written, unit);
        println!(
            "  first:   {}",
            report.chunks[0].path.file_name().unwrap_or_default().to_string_lossy()
        );
    }

    Ok(())
}

// ── `fbox join` ───────────────────────────────────────────────────────────────

fn cmd_join(chunk: &Path, output: Option<&Path>) -> Result<()> {
    let report = fbox_split::join_chunks(chunk, output)
        .with_context(|| format!("joining from {}", chunk.display()))?;

    println!(
        "Joined {} parts → {} ({})",
        report.parts,
        report.output.display(),
        fmt_bytes(report.bytes)
    );
    Ok(())
}

// ── `fbox concat` ─────────────────────────────────────────────────────────────

fn cmd_concat(
    config: &FboxConfig,
    dir: &Path,
    output: &Path,
    extensions: Vec<String>,
    no_banner: bool,
) -> Result<()> {
    let extensions = if extensions.is_empty() {
        config.concat.extensions.clone()
    } else {
        extensions
    };

    let opts = fbox_concat::ConcatOptions {
        root: dir.to_path_buf(),
        output: output.to_path_buf(),
        extensions,
        banner: !no_banner && config.concat.banner,
    };

    let pb = make_progress_bar(0, "concat");
    let pb_clone = pb.clone();
    let progress: fbox_concat::ProgressFn = Box::new(move |done, total, msg| {
        pb_clone.set_length(total);
        pb_clone.set_position(done);
        pb_clone.set_message(msg.to_string());
    });

    let report = fbox_concat::concat_sources(&opts, Some(&progress))
        .with_context(|| format!("concatenating {}", dir.display()))?;

    pb.finish_and_clear();
    println!(
        "Concatenated {} files → {} ({})",
        report.files,
        report.output.display(),
        fmt_bytes(report.bytes)
    );
    Ok(())
}

// ── `fbox tree` ───────────────────────────────────────────────────────────────

fn cmd_tree(
    config: &FboxConfig,
    dir: Option<&Path>,
    depth: Option<usize>,
    exclude: Vec<String>,
    all: bool,
    dirs_only: bool,
) -> Result<()> {
    let root = dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    let mut exclude_patterns = config.tree.exclude_patterns.clone();
    exclude_patterns.extend(exclude);

    let opts = fbox_tree::TreeOptions {
        max_depth: depth.or(config.tree.max_depth),
        exclude_patterns,
        show_hidden: all || config.tree.show_hidden,
        dirs_only,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    fbox_tree::render_tree(&root, &opts, &mut out)
        .with_context(|| format!("rendering tree for {}", root.display()))?;
    Ok(())
}

// ── `fbox config show` ────────────────────────────────────────────────────────

fn cmd_config_show(config: &FboxConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
