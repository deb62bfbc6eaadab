//! Sweep command: move overdue scheduled tasks to MISSED.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use timeblock_core::PlacementEngine;

use super::PlanFile;

#[derive(Args)]
pub struct SweepArgs {
    /// Plan file with tasks, committed blocks, and the working-hours policy
    pub file: PathBuf,

    /// Sweep reference time (defaults to now), RFC 3339
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

pub fn run(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let plan = PlanFile::load(&args.file)?;
    let policy = plan.policy.clone();

    let now = args.now.unwrap_or_else(Utc::now);
    let (user, mut workflow) = plan.into_workflow(PlacementEngine::new());
    let missed = workflow.sweep_missed(&user, now)?;

    PlanFile::from_workflow(user, policy, &workflow).save(&args.file)?;
    if missed.is_empty() {
        println!("no overdue tasks");
    } else {
        for id in &missed {
            println!("missed: {id}");
        }
    }
    Ok(())
}
