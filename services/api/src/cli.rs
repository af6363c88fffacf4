use crate::demo::{run_demo, run_evaluation_report, DemoArgs, EvaluationReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use supplier_srm::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Supplier Performance Evaluation",
    about = "Run and demonstrate the supplier performance evaluation service",
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
    /// Work with supplier evaluations offline
    Evaluation {
        #[command(subcommand)]
        command: EvaluationCommand,
    },
    /// Walk one scorecard from draft to confirmation using in-memory storage
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EvaluationCommand {
    /// Score an item sheet and print the evaluation summary
    Report(EvaluationReportArgs),
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
        Command::Evaluation {
            command: EvaluationCommand::Report(args),
        } => run_evaluation_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
