//! Preview lifecycle: staleness, cancellation, sweep, manual placement.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use timeblock_core::{
    CoreError, InMemoryPolicyProvider, InMemoryScheduleStore, InMemoryTaskStore, PreviewError,
    PreviewWorkflow, ScheduleBlock, ScheduleStore, Task, TaskPriority, TaskStatus,
    ValidationError, WorkingHoursPolicy,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
}

fn workflow(
    tasks: Vec<Task>,
    blocks: Vec<ScheduleBlock>,
) -> PreviewWorkflow<InMemoryTaskStore, InMemoryScheduleStore, InMemoryPolicyProvider> {
    let mut task_store = InMemoryTaskStore::new();
    for task in tasks {
        task_store.insert(task);
    }
    let mut schedule_store = InMemoryScheduleStore::new();
    for block in blocks {
        schedule_store.insert(block);
    }
    let mut policies = InMemoryPolicyProvider::new();
    policies.insert(
        "u-1",
        WorkingHoursPolicy::new(
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            chrono_tz::UTC,
        ),
    );
    PreviewWorkflow::new(task_store, schedule_store, policies)
}

#[test]
fn concurrent_commit_makes_the_preview_stale() {
    let task = Task::new("u-1", "Deep work", 120);
    let mut wf = workflow(vec![task], vec![]);

    wf.run_preview(&"u-1".to_string(), monday(), monday()).unwrap();

    // someone else books the morning while the preview is on screen
    wf.schedule_store_mut()
        .insert(ScheduleBlock::new("t-x", "u-1", at(2, 10, 0), at(2, 11, 0)));

    let err = wf.apply_preview().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Preview(PreviewError::Stale { .. })
    ));
    // the preview survives the failed apply so the caller can retry it
    assert!(wf.active_preview().is_some());

    // retry recomputes around the new booking and then applies cleanly
    let result = wf.retry_preview().unwrap();
    assert_eq!(result.blocks[0].start_time, at(2, 11, 0));
    wf.apply_preview().unwrap();

    let committed = wf
        .schedule_store()
        .list_blocks(&"u-1".to_string(), at(2, 0, 0), at(3, 0, 0))
        .unwrap();
    assert_eq!(committed.len(), 2);
}

#[test]
fn starting_a_new_preview_cancels_the_old_one() {
    let task = Task::new("u-1", "Deep work", 120);
    let mut wf = workflow(vec![task], vec![]);

    let first_start = wf
        .run_preview(&"u-1".to_string(), monday(), monday())
        .unwrap()
        .blocks[0]
        .start_time;
    // second preview over a different range replaces the first
    let tuesday = monday() + Duration::days(1);
    wf.run_preview(&"u-1".to_string(), tuesday, tuesday).unwrap();

    let active = wf.active_preview().unwrap();
    assert_ne!(active.blocks[0].start_time, first_start);

    // applying commits only the active preview's block
    wf.apply_preview().unwrap();
    let committed = wf
        .schedule_store()
        .list_blocks(&"u-1".to_string(), at(1, 0, 0), at(5, 0, 0))
        .unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].start_time, at(3, 10, 0));
}

#[test]
fn cancel_leaves_tasks_waiting_and_stores_untouched() {
    let task = Task::new("u-1", "Deep work", 120);
    let task_id = task.id.clone();
    let mut wf = workflow(vec![task], vec![]);

    wf.run_preview(&"u-1".to_string(), monday(), monday()).unwrap();
    assert!(wf.cancel_preview());

    let stored = wf
        .task_store()
        .tasks()
        .find(|t| t.id == task_id)
        .unwrap()
        .clone();
    assert_eq!(stored.status, TaskStatus::Waiting);
    assert_eq!(
        wf.schedule_store()
            .list_blocks(&"u-1".to_string(), at(1, 0, 0), at(5, 0, 0))
            .unwrap()
            .len(),
        0
    );
}

#[test]
fn split_apply_preserves_total_duration() {
    let busy = ScheduleBlock::new("t-0", "u-1", at(2, 12, 30), at(2, 17, 30));
    let task = Task::new("u-1", "Marathon", 300);
    let task_id = task.id.clone();
    let mut wf = workflow(vec![task], vec![busy]);

    wf.run_preview(&"u-1".to_string(), monday(), monday()).unwrap();
    wf.apply_preview().unwrap();

    let committed: Vec<ScheduleBlock> = wf
        .schedule_store()
        .blocks()
        .filter(|b| b.task_id == task_id)
        .cloned()
        .collect();
    let total: i64 = committed.iter().map(|b| b.duration_minutes()).sum();
    assert_eq!(total, 300);
}

#[test]
fn sweep_marks_overdue_tasks_missed_and_boosts_them() {
    let mut task = Task::new("u-1", "Slipped", 60).with_priority(TaskPriority::Medium);
    task.transition_to(TaskStatus::Scheduled).unwrap();
    task.priority_boost = false;
    let task_id = task.id.clone();
    let block = ScheduleBlock::new(task_id.clone(), "u-1", at(2, 10, 0), at(2, 11, 0));
    let mut wf = workflow(vec![task], vec![block]);

    // within grace: nothing happens
    let moved = wf.sweep_missed(&"u-1".to_string(), at(2, 11, 15)).unwrap();
    assert!(moved.is_empty());

    // past grace: the task goes MISSED and carries its re-entry boost
    let moved = wf.sweep_missed(&"u-1".to_string(), at(2, 11, 45)).unwrap();
    assert_eq!(moved, vec![task_id.clone()]);

    let stored = wf
        .task_store()
        .tasks()
        .find(|t| t.id == task_id)
        .unwrap()
        .clone();
    assert_eq!(stored.status, TaskStatus::Missed);
    assert!(stored.priority_boost);
    assert_eq!(stored.effective_priority(), TaskPriority::High);

    // a second sweep is a no-op
    let moved = wf.sweep_missed(&"u-1".to_string(), at(2, 12, 30)).unwrap();
    assert!(moved.is_empty());
}

#[test]
fn missed_task_reenters_scheduling_and_boost_is_consumed_on_apply() {
    let mut task = Task::new("u-1", "Slipped", 60);
    task.transition_to(TaskStatus::Scheduled).unwrap();
    let task_id = task.id.clone();
    let old_block = ScheduleBlock::new(task_id.clone(), "u-1", at(2, 10, 0), at(2, 11, 0));
    let mut wf = workflow(vec![task], vec![old_block]);

    wf.sweep_missed(&"u-1".to_string(), at(2, 12, 0)).unwrap();

    // reschedule onto Tuesday; the missed task is pending again
    let tuesday = monday() + Duration::days(1);
    let result = wf.run_preview(&"u-1".to_string(), tuesday, tuesday).unwrap();
    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].task_id, task_id);

    wf.apply_preview().unwrap();
    let stored = wf
        .task_store()
        .tasks()
        .find(|t| t.id == task_id)
        .unwrap()
        .clone();
    assert_eq!(stored.status, TaskStatus::Scheduled);
    assert!(!stored.priority_boost, "boost is consumed once placed");
}

#[test]
fn manual_placement_can_land_outside_working_hours() {
    let task = Task::new("u-1", "Evening errand", 60);
    let task_id = task.id.clone();
    let mut wf = workflow(vec![task], vec![]);

    // 21:00 is outside the 10:00-20:00 policy; manual placement allows it
    let block = wf.place_manual(&task_id, at(2, 21, 0)).unwrap();
    assert_eq!(block.end_time, at(2, 22, 0));

    let stored = wf
        .task_store()
        .tasks()
        .find(|t| t.id == task_id)
        .unwrap()
        .clone();
    assert_eq!(stored.status, TaskStatus::Scheduled);
}

#[test]
fn manual_placement_rejects_conflicts() {
    let busy = ScheduleBlock::new("t-0", "u-1", at(2, 10, 0), at(2, 12, 0));
    let task = Task::new("u-1", "Clash", 60);
    let task_id = task.id.clone();
    let mut wf = workflow(vec![task], vec![busy]);

    let err = wf.place_manual(&task_id, at(2, 11, 30)).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::PlacementConflict { .. })
    ));

    // touching the busy block's end is fine -- half-open intervals
    let block = wf.place_manual(&task_id, at(2, 12, 0)).unwrap();
    assert_eq!(block.start_time, at(2, 12, 0));
}

#[test]
fn manual_placement_of_a_completed_task_is_an_invalid_transition() {
    let mut task = Task::new("u-1", "Done already", 60);
    task.transition_to(TaskStatus::Completed).unwrap();
    let task_id = task.id.clone();
    let mut wf = workflow(vec![task], vec![]);

    let err = wf.place_manual(&task_id, at(2, 10, 0)).unwrap_err();
    assert!(matches!(err, CoreError::Transition(_)));
}
