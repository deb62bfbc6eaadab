//! Preview and apply commands over a plan file.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::Args;
use timeblock_core::{PlacementEngine, SchedulerConfig};

use super::PlanFile;

#[derive(Args)]
pub struct PlanArgs {
    /// Plan file with tasks, committed blocks, and the working-hours policy
    pub file: PathBuf,

    /// First day of the planning range (defaults to today, UTC)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Number of days to plan
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    /// TOML file with scheduler config overrides
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: PlanArgs, apply: bool) -> Result<(), Box<dyn std::error::Error>> {
    let plan = PlanFile::load(&args.file)?;
    let policy = plan.policy.clone();

    let config = match &args.config {
        Some(path) => toml::from_str::<SchedulerConfig>(&std::fs::read_to_string(path)?)?,
        None => SchedulerConfig::default(),
    };

    let start = args.from.unwrap_or_else(|| Utc::now().date_naive());
    let end = start + chrono::Duration::days(i64::from(args.days.max(1)) - 1);

    let (user, mut workflow) = plan.into_workflow(PlacementEngine::with_config(config));
    let result = workflow.run_preview(&user, start, end)?.clone();
    println!("{}", serde_json::to_string_pretty(&result)?);

    if apply {
        let applied = workflow.apply_preview()?;
        PlanFile::from_workflow(user, policy, &workflow).save(&args.file)?;
        eprintln!("applied {} block(s)", applied.len());
    }

    Ok(())
}
