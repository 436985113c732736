use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use customer_wrangler::Result;
use customer_wrangler::logging::init_logging;
use customer_wrangler::pipeline::{
    self, DEFAULT_BILLING_PATH, DEFAULT_OFFERS_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_PERSONAL_PATH,
    PipelineConfig, Variant,
};
use tracing::info;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    init_logging(args.verbose)?;

    let config = args.into_config();
    let summary = pipeline::run(&config)?;
    info!(
        rows = summary.report_rows,
        output = %config.output_path.display(),
        "merge complete"
    );
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge personal, billing, and offer exports into one customer report."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Join the three sources and write the spreadsheet report.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Personal entries (JSON).
    #[arg(long, default_value = DEFAULT_PERSONAL_PATH)]
    personal: PathBuf,

    /// Billing entries (JSON).
    #[arg(long, default_value = DEFAULT_BILLING_PATH)]
    billing: PathBuf,

    /// Sales offers (semicolon-separated, no header).
    #[arg(long, default_value = DEFAULT_OFFERS_PATH)]
    offers: PathBuf,

    /// Report file path.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Billing schema and stage preset.
    #[arg(long, value_enum, default_value_t = VariantKind::Extended)]
    variant: VariantKind,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum VariantKind {
    Basic,
    Extended,
}

impl From<VariantKind> for Variant {
    fn from(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Basic => Variant::Basic,
            VariantKind::Extended => Variant::Extended,
        }
    }
}

impl MergeArgs {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            personal_path: self.personal,
            billing_path: self.billing,
            offers_path: self.offers,
            output_path: self.output,
            ..PipelineConfig::for_variant(self.variant.into())
        }
    }
}
