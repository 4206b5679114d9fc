//! Tessel CLI — the command-line interface for the Tessel fabric toolchain.
//!
//! Provides `tessel build` to construct the routing-resource graph of a
//! device, `tessel estimate` for the node count alone, `tessel lookahead` to
//! refresh the router lookahead cache, `tessel layouts` to list the grid
//! layouts of an architecture and `tessel noc-route` to trace a flow through
//! a mesh network-on-chip.

#![warn(missing_docs)]

mod build;
mod lookahead;
mod noc;
mod pipeline;

use std::io::IsTerminal;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tessel_arch::LayoutKind;

/// Tessel — routing-resource graphs for tileable fabrics.
#[derive(Parser, Debug)]
#[command(name = "tessel", version, about = "Tessel FPGA fabric toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `tessel.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the routing-resource graph and print its statistics.
    Build(BuildArgs),
    /// Print the predicted node counts without building the graph.
    Estimate(EstimateArgs),
    /// Compute or refresh the router lookahead cache file.
    Lookahead(LookaheadArgs),
    /// List the grid layouts of an architecture.
    Layouts {
        /// Built-in architecture name or description file.
        arch: Option<String>,
    },
    /// Route one flow through a mesh network-on-chip.
    NocRoute(NocRouteArgs),
}

/// Fabric selection shared by the graph commands. Each flag overrides the
/// matching `tessel.toml` setting.
#[derive(Args, Debug, Default)]
pub struct FabricArgs {
    /// Built-in architecture name, or a `.toml`/`.json` description file.
    #[arg(short, long)]
    pub arch: Option<String>,

    /// Grid layout name, or `auto`.
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Tracks per channel in both directions.
    #[arg(short = 'w', long)]
    pub chan_width: Option<usize>,
}

/// Arguments for the `tessel build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Fabric selection.
    #[command(flatten)]
    pub fabric: FabricArgs,

    /// Output format for statistics and diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Also compute the router lookahead, through the configured cache file.
    #[arg(long)]
    pub lookahead: bool,
}

/// Arguments for the `tessel estimate` subcommand.
#[derive(Parser, Debug)]
pub struct EstimateArgs {
    /// Fabric selection.
    #[command(flatten)]
    pub fabric: FabricArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `tessel lookahead` subcommand.
#[derive(Parser, Debug)]
pub struct LookaheadArgs {
    /// Fabric selection.
    #[command(flatten)]
    pub fabric: FabricArgs,

    /// Cache file to write (default: `[lookahead] cache` from `tessel.toml`).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Recompute even when the existing file matches the fabric.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `tessel noc-route` subcommand.
#[derive(Parser, Debug)]
pub struct NocRouteArgs {
    /// Source router ID.
    pub src: u32,

    /// Destination router ID.
    pub dst: u32,

    /// Routing algorithm (e.g., `xy_routing`, `odd_even_routing`).
    #[arg(long)]
    pub algorithm: Option<String>,

    /// Mesh columns.
    #[arg(long)]
    pub width: Option<usize>,

    /// Mesh rows.
    #[arg(long)]
    pub height: Option<usize>,

    /// Flow ID, which seeds the adaptive direction choices.
    #[arg(long, default_value_t = 0)]
    pub flow: u32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Estimate(ref args) => build::run_estimate(args, &global),
        Command::Lookahead(ref args) => lookahead::run(args, &global),
        Command::Layouts { ref arch } => run_layouts(arch.as_deref(), &global),
        Command::NocRoute(ref args) => noc::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn default_log_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_logging(global: &GlobalArgs) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_filter(global)))
        .format_timestamp(None)
        .init();
}

/// Runs the `tessel layouts` command.
fn run_layouts(arch: Option<&str>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let source = match arch {
        Some(arch) => pipeline::arch_source(arch),
        None => {
            let (config, dir) = pipeline::load_flow_config(global)?;
            tessel_config::resolve_build(&config, &dir)?.arch
        }
    };
    let arch = source.load()?;
    if !global.quiet {
        eprintln!("   Layouts of {}", arch.name);
    }
    for layout in &arch.layouts {
        let size = match layout.kind {
            LayoutKind::Fixed { width, height } => format!("fixed {width}x{height}"),
            LayoutKind::Auto { aspect_ratio } => format!("auto (aspect ratio {aspect_ratio})"),
        };
        println!("{:<16} {size}, {} layer(s)", layout.name, layout.num_layers);
    }
    Ok(0)
}
