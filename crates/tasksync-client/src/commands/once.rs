//! Single-cycle sync.

use std::io::Write;

use tasksync_core::{MirrorItem, TaskItem};
use tasksync_server::{CycleOutcome, SyncSession};

use super::build_session;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Runs one cycle against the configured Google task list and Notion
/// database, then prints what was mirrored.
pub async fn once(config: &ClientConfig, json: bool, dry_run: bool) -> ClientResult<()> {
    let (session, _) = build_session(config)?;
    execute(session, json, dry_run, &mut std::io::stdout()).await
}

async fn execute(
    mut session: SyncSession,
    json: bool,
    dry_run: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    if dry_run {
        let pending: Vec<TaskItem> = session
            .preview()
            .await?
            .into_iter()
            .map(|create| create.task)
            .collect();
        return render_pending(&pending, json, out);
    }

    let report = session.sync_once().await?;
    let created: Vec<&MirrorItem> = report.created().collect();
    render_created(&created, json, out)?;

    for result in &report.creates {
        if let Err(e) = result {
            writeln!(out, "failed  {}", e)?;
        }
    }
    if !json && report.failed() > 0 {
        writeln!(out, "{} created, {} failed", created.len(), report.failed())?;
    }

    match report.outcome {
        CycleOutcome::TransientError(e) => Err(ClientError::Sync(e)),
        _ => Ok(()),
    }
}

fn render_pending(pending: &[TaskItem], json: bool, out: &mut dyn Write) -> ClientResult<()> {
    if json {
        return write_json(pending, out);
    }
    if pending.is_empty() {
        writeln!(out, "Nothing to mirror.")?;
    }
    for task in pending {
        writeln!(out, "would mirror  {}  {}", task.id, task.title)?;
    }
    Ok(())
}

fn render_created(created: &[&MirrorItem], json: bool, out: &mut dyn Write) -> ClientResult<()> {
    if json {
        return write_json(created, out);
    }
    if created.is_empty() {
        writeln!(out, "Nothing to mirror.")?;
    }
    for item in created {
        writeln!(out, "created  {}  {}", item.task_id, item.title)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(value: &T, out: &mut dyn Write) -> ClientResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|e| ClientError::Io(std::io::Error::other(e)))?;
    writeln!(out)?;
    Ok(())
}
