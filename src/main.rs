mod commands;

use clap::{Args, Parser, Subcommand};

use usacloud_update::scan::{SortKey, SortOrder};

#[derive(Parser)]
#[command(
    name = "usacloud-update",
    version,
    about = "Migrate usacloud shell scripts from v0.x/v1.0 syntax to v1.1"
)]
pub(crate) struct Cli {
    /// Input script path, "-" for stdin
    #[arg(long = "in", value_name = "PATH", default_value = "-")]
    pub input: String,

    /// Output path, "-" for stdout
    #[arg(long = "out", value_name = "PATH", default_value = "-")]
    pub output: String,

    /// Print the per-rule rewrite table to stderr after processing
    #[arg(long)]
    pub stats: bool,

    /// Show processing details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and rank scripts that invoke usacloud
    Scan(ScanArgs),
    /// List the built-in migration rules
    Rules {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Root directory (or single file) to scan
    pub path: String,

    /// Worker threads for classification (0 = number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Directory recursion depth (0 = root files only)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Minimum confidence for a file to count as a script
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Drop results below this importance
    #[arg(long)]
    pub min_importance: Option<f64>,

    /// Keep only high/critical results
    #[arg(long)]
    pub only_high_priority: bool,

    /// Glob pattern to restrict the scan to (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Glob pattern to drop from the report (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Ranking key
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Ranking direction
    #[arg(long, value_enum)]
    pub order: Option<SortOrder>,

    /// Output the full report as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Some(Commands::Scan(args)) => commands::or_exit(commands::cmd_scan(args, cli.verbose)),
        Some(Commands::Rules { json }) => commands::or_exit(commands::cmd_rules(*json)),
        None => commands::or_exit(commands::cmd_transform(
            &cli.input,
            &cli.output,
            cli.stats,
            cli.verbose,
        )),
    };
    std::process::exit(exit_code);
}
