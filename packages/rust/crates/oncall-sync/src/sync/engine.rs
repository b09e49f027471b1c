//! Reconciliation engine: one stateless evaluation of every configured schedule.
//!
//! Schedules and their two group branches run strictly in sequence. A failure in one
//! branch is logged and recorded; the remaining branches and schedules still run.

use std::collections::HashSet;

use crate::clients::{ChatDirectory, OnCallSource};
use crate::compare::equal_as_sets;
use crate::config::{Config, GroupKind, Schedule};
use crate::error::SyncError;

use super::report::{BranchOutcome, BranchReport, SyncReport};

const BRANCH_ORDER: [GroupKind; 2] = [GroupKind::Current, GroupKind::All];

/// Run one pass over `config.schedules` against the given collaborators.
pub async fn reconcile(
    config: &Config,
    oncall: &dyn OnCallSource,
    chat: &dyn ChatDirectory,
) -> SyncReport {
    let mut report = SyncReport::default();

    for schedule in &config.schedules {
        for kind in BRANCH_ORDER {
            let group = schedule.group(kind);
            let outcome = if group.is_required {
                match sync_branch(config, schedule, kind, oncall, chat).await {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        log_branch_failure(schedule, kind, &error);
                        BranchOutcome::Failed(error)
                    }
                }
            } else {
                BranchOutcome::Skipped
            };

            report.branches.push(BranchReport {
                group_name: group.name.clone(),
                kind,
                rotation_ids: schedule.rotation_ids.clone(),
                outcome,
            });
        }
    }

    tracing::info!(
        schedules = config.schedules.len(),
        updated = report.updated(),
        unchanged = report.unchanged(),
        skipped = report.skipped(),
        failed = report.failed(),
        "sync pass finished"
    );
    report
}

async fn sync_branch(
    config: &Config,
    schedule: &Schedule,
    kind: GroupKind,
    oncall: &dyn OnCallSource,
    chat: &dyn ChatDirectory,
) -> Result<BranchOutcome, SyncError> {
    let group = schedule.group(kind);

    let emails = desired_emails(config, schedule, kind, oncall).await?;
    let desired = dedup_first_seen(chat.resolve_member_ids(&emails).await?);

    let handle = chat.resolve_or_create_group(&group.name).await?;
    let current = chat.current_members(&handle).await?;

    if equal_as_sets(&current, &desired) {
        tracing::debug!(
            group = %group.name,
            %kind,
            members = desired.len(),
            "group membership already up to date"
        );
        return Ok(BranchOutcome::Unchanged);
    }

    chat.set_members(&handle, &desired).await?;

    let added = difference(&desired, &current);
    let removed = difference(&current, &desired);
    tracing::info!(
        group = %group.name,
        %kind,
        rotation_ids = ?schedule.rotation_ids,
        added = ?added,
        removed = ?removed,
        "group membership updated"
    );
    Ok(BranchOutcome::Updated { added, removed })
}

/// Union of on-call emails over every rotation of `schedule`, first-seen order.
async fn desired_emails(
    config: &Config,
    schedule: &Schedule,
    kind: GroupKind,
    oncall: &dyn OnCallSource,
) -> Result<Vec<String>, SyncError> {
    let mut emails = Vec::new();
    for rotation_id in &schedule.rotation_ids {
        let found = match kind {
            GroupKind::Current => oncall.current_on_call(rotation_id).await?,
            GroupKind::All => {
                oncall
                    .on_call_within(rotation_id, config.schedule_lookahead)
                    .await?
            }
        };
        emails.extend(found);
    }
    Ok(dedup_first_seen(emails))
}

fn dedup_first_seen(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_ascii_lowercase()))
        .collect()
}

/// Entries of `left` absent from `right`, ignoring ASCII case.
fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let right: HashSet<String> = right.iter().map(|v| v.to_ascii_lowercase()).collect();
    left.iter()
        .filter(|value| !right.contains(&value.to_ascii_lowercase()))
        .cloned()
        .collect()
}

fn log_branch_failure(schedule: &Schedule, kind: GroupKind, error: &SyncError) {
    let group = &schedule.group(kind).name;
    match error {
        SyncError::UnknownIdentity { emails } => tracing::error!(
            group = %group,
            %kind,
            rotation_ids = ?schedule.rotation_ids,
            unknown_emails = ?emails,
            "on-call users have no chat account; group not updated this pass"
        ),
        _ => tracing::warn!(
            group = %group,
            %kind,
            rotation_ids = ?schedule.rotation_ids,
            error = %error,
            "group sync failed; continuing with remaining groups"
        ),
    }
}
