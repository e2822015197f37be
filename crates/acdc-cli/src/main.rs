use acdc_cli::cli::{Cli, Commands};
use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Scenario failures and non-convergence never reach here; only harness
    // errors (bad suite, missing solver, unwritable store) end the run early.
    let result = match &cli.command {
        Commands::Run {
            suite,
            solver,
            case_root,
            out,
            verbose_solver,
        } => commands::run::handle(
            suite.as_deref(),
            solver.as_deref(),
            case_root.as_deref(),
            out,
            *verbose_solver,
        ),
        Commands::Summary { results } => commands::summary::handle(results),
        Commands::Compare {
            reference,
            candidate,
            tolerance,
            nan_equal,
            detailed,
            report,
        } => commands::compare::handle(
            reference,
            candidate,
            *tolerance,
            *nan_equal,
            detailed.as_deref(),
            report.as_deref(),
        ),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
