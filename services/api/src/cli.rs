use crate::demo::{run_demo, run_readiness_report, DemoArgs, ReadinessArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use tqm_lifecycle::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "TQM Lifecycle Engine",
    about = "Run the PDCA/CAPA lifecycle service or score store snapshots from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a portfolio snapshot exported from the store
    Readiness(ReadinessArgs),
    /// Walk a synthetic portfolio through the lifecycle and print the scores
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Readiness(args) => run_readiness_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
