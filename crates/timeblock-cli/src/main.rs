use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "timeblock-cli", version, about = "Timeblock scheduling CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a schedule preview for pending tasks
    Preview(commands::plan::PlanArgs),
    /// Compute a schedule and commit it to the plan file
    Apply(commands::plan::PlanArgs),
    /// Mark overdue scheduled tasks as missed
    Sweep(commands::sweep::SweepArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Preview(args) => commands::plan::run(args, false),
        Commands::Apply(args) => commands::plan::run(args, true),
        Commands::Sweep(args) => commands::sweep::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
