//! StateManager - actor that owns the PlanStore
//!
//! Processes commands sequentially. Each status transition is a single
//! read-check-write inside the store's directory lock, so neither another
//! caller nor another process sharing the store can interleave with it.

use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{ExecutionPlan, GeneratedArtifact, PlanRecord, PlanStatus};

use super::messages::{StateCommand, StateError, StateResponse, TransitionUpdate};
use super::store::{INTERRUPTED, PlanStore, StoreError};

impl From<StoreError> for StateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => StateError::NotFound(id),
            other => StateError::StoreError(other.to_string()),
        }
    }
}

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Open the store and spawn the actor
    pub fn spawn(store_dir: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_dir = %store_dir.as_ref().display(), "spawn: called");
        let store = PlanStore::open(store_dir.as_ref())?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));

        info!("StateManager spawned");
        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand,
    ) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Persist a new plan record
    pub async fn create_plan(&self, record: PlanRecord) -> StateResponse<String> {
        debug!(plan_id = %record.id(), status = %record.status, "create_plan: called");
        self.request(|reply| StateCommand::CreatePlan { record, reply }).await
    }

    /// Get a plan record by ID
    pub async fn get_plan(&self, id: &str) -> StateResponse<Option<PlanRecord>> {
        debug!(%id, "get_plan: called");
        self.request(|reply| StateCommand::GetPlan {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Get a plan record by ID, returning error if not found
    pub async fn get_plan_required(&self, id: &str) -> StateResponse<PlanRecord> {
        debug!(%id, "get_plan_required: called");
        self.get_plan(id).await?.ok_or_else(|| StateError::NotFound(id.to_string()))
    }

    /// List plan records, oldest first
    pub async fn list_plans(&self, status_filter: Option<PlanStatus>) -> StateResponse<Vec<PlanRecord>> {
        debug!(?status_filter, "list_plans: called");
        self.request(|reply| StateCommand::ListPlans { status_filter, reply }).await
    }

    /// Mark a pending plan approved
    pub async fn approve_plan(&self, id: &str) -> StateResponse<PlanRecord> {
        debug!(%id, "approve_plan: called");
        self.request(|reply| StateCommand::Approve {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Atomically move a status along the state machine
    pub async fn transition(&self, id: &str, to: PlanStatus, update: TransitionUpdate) -> StateResponse<PlanRecord> {
        debug!(%id, %to, "transition: called");
        self.request(|reply| StateCommand::Transition {
            id: id.to_string(),
            to,
            update,
            reply,
        })
        .await
    }

    /// `pending + approved -> executing`; exactly one concurrent caller wins
    pub async fn start_execution(&self, id: &str) -> StateResponse<PlanRecord> {
        self.transition(id, PlanStatus::Executing, TransitionUpdate::default()).await
    }

    /// `executing -> completed` with the executed plan and its artifact
    pub async fn complete_execution(
        &self,
        id: &str,
        plan: ExecutionPlan,
        artifact: GeneratedArtifact,
    ) -> StateResponse<PlanRecord> {
        let update = TransitionUpdate {
            plan: Some(plan),
            error: None,
            artifact: Some(artifact),
        };
        self.transition(id, PlanStatus::Completed, update).await
    }

    /// `executing -> failed` with the error message
    pub async fn fail_execution(&self, id: &str, error: impl Into<String>) -> StateResponse<PlanRecord> {
        let update = TransitionUpdate {
            error: Some(error.into()),
            ..Default::default()
        };
        self.transition(id, PlanStatus::Failed, update).await
    }

    /// `executing -> failed` with error `interrupted`, without waiting
    ///
    /// For callers that cannot await, such as a drop guard. The command is
    /// queued ahead of anything the caller sends afterwards.
    pub fn interrupt_execution(&self, id: &str) {
        debug!(%id, "interrupt_execution: called");
        let (reply, _) = oneshot::channel();
        let cmd = StateCommand::Transition {
            id: id.to_string(),
            to: PlanStatus::Failed,
            update: TransitionUpdate {
                error: Some(INTERRUPTED.to_string()),
                ..Default::default()
            },
            reply,
        };
        if let Err(e) = self.tx.try_send(cmd) {
            warn!(plan_id = %id, error = %e, "could not queue interrupted execution");
        }
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

fn approve(store: &mut PlanStore, id: &str) -> StateResponse<PlanRecord> {
    let record = store.modify(id, |record| {
        if record.status != PlanStatus::Pending {
            return Err(StateError::InvalidTransition {
                id: id.to_string(),
                from: record.status,
                to: PlanStatus::Pending,
            });
        }
        if record.approved {
            return Ok(false);
        }
        record.approve();
        Ok(true)
    })?;
    info!(plan_id = %id, "Plan approved");
    Ok(record)
}

/// Compare-and-set against the record as currently on disk
fn transition(store: &mut PlanStore, id: &str, to: PlanStatus, update: TransitionUpdate) -> StateResponse<PlanRecord> {
    let mut from = to;
    let record = store.modify(id, |record| {
        from = record.status;
        if !from.can_transition_to(to) {
            return Err(StateError::InvalidTransition {
                id: id.to_string(),
                from,
                to,
            });
        }
        if to == PlanStatus::Executing && !record.approved {
            return Err(StateError::NotApproved(id.to_string()));
        }

        if let Some(plan) = update.plan {
            record.plan = plan;
        }
        if update.error.is_some() {
            record.error = update.error;
        }
        if update.artifact.is_some() {
            record.artifact = update.artifact;
        }
        record.set_status(to);
        Ok(true)
    })?;

    info!(plan_id = %id, %from, %to, "Plan status changed");
    Ok(record)
}

/// The actor loop that owns the store and processes commands
async fn actor_loop(mut store: PlanStore, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreatePlan { record, reply } => {
                debug!(plan_id = %record.id(), "actor_loop: CreatePlan command");
                let _ = reply.send(store.create(record).map_err(StateError::from));
            }

            StateCommand::GetPlan { id, reply } => {
                debug!(%id, "actor_loop: GetPlan command");
                let _ = reply.send(store.get(&id).map_err(StateError::from));
            }

            StateCommand::ListPlans { status_filter, reply } => {
                debug!(?status_filter, "actor_loop: ListPlans command");
                let _ = reply.send(store.list(status_filter).map_err(StateError::from));
            }

            StateCommand::Approve { id, reply } => {
                debug!(%id, "actor_loop: Approve command");
                let _ = reply.send(approve(&mut store, &id));
            }

            StateCommand::Transition { id, to, update, reply } => {
                debug!(%id, %to, "actor_loop: Transition command");
                let _ = reply.send(transition(&mut store, &id, to, update));
            }

            StateCommand::Shutdown => {
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AggregatedContext, TaskType, now_ms};
    use crate::planning::synthesize;
    use tempfile::tempdir;

    fn record(task_type: TaskType) -> PlanRecord {
        let plan = synthesize(task_type, &AggregatedContext::default(), None);
        PlanRecord::new(plan, "test query", None)
    }

    fn artifact(plan_id: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            id: "artifact-1".to_string(),
            plan_id: plan_id.to_string(),
            output_format: crate::domain::OutputFormat::Slides,
            location: "/tmp/out.md".to_string(),
            created_at: now_ms(),
        }
    }

    #[tokio::test]
    async fn test_state_manager_plan_crud() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        let rec = record(TaskType::QbrGeneration);
        let id = manager.create_plan(rec.clone()).await.unwrap();
        assert_eq!(id, rec.id());

        let retrieved = manager.get_plan(&id).await.unwrap().unwrap();
        assert_eq!(retrieved.query, "test query");
        assert!(manager.get_plan("nonexistent").await.unwrap().is_none());
        assert_eq!(
            manager.get_plan_required("nonexistent").await,
            Err(StateError::NotFound("nonexistent".to_string()))
        );

        assert_eq!(manager.list_plans(None).await.unwrap().len(), 1);
        assert!(manager.list_plans(Some(PlanStatus::Completed)).await.unwrap().is_empty());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_requires_approval() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        let id = manager.create_plan(record(TaskType::SavePlay)).await.unwrap();

        assert_eq!(manager.start_execution(&id).await, Err(StateError::NotApproved(id.clone())));

        let approved = manager.approve_plan(&id).await.unwrap();
        assert!(approved.approved);
        assert!(approved.approved_at.is_some());

        let running = manager.start_execution(&id).await.unwrap();
        assert_eq!(running.status, PlanStatus::Executing);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_and_fail_are_terminal() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        let done = record(TaskType::QbrGeneration);
        let done_id = manager.create_plan(done.clone()).await.unwrap();
        manager.approve_plan(&done_id).await.unwrap();
        manager.start_execution(&done_id).await.unwrap();
        let completed = manager
            .complete_execution(&done_id, done.plan.clone(), artifact(&done_id))
            .await
            .unwrap();
        assert_eq!(completed.status, PlanStatus::Completed);
        assert_eq!(completed.artifact.unwrap().plan_id, done_id);

        let broken_id = manager.create_plan(record(TaskType::SavePlay)).await.unwrap();
        manager.approve_plan(&broken_id).await.unwrap();
        manager.start_execution(&broken_id).await.unwrap();
        let failed = manager.fail_execution(&broken_id, "generator exploded").await.unwrap();
        assert_eq!(failed.status, PlanStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("generator exploded"));

        for id in [&done_id, &broken_id] {
            assert!(matches!(
                manager.start_execution(id).await,
                Err(StateError::InvalidTransition { to: PlanStatus::Executing, .. })
            ));
            assert!(matches!(
                manager.approve_plan(id).await,
                Err(StateError::InvalidTransition { .. })
            ));
        }

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_requires_executing() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        let rec = record(TaskType::AccountPlan);
        let id = manager.create_plan(rec.clone()).await.unwrap();

        let err = manager.complete_execution(&id, rec.plan, artifact(&id)).await.unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                id: id.clone(),
                from: PlanStatus::Pending,
                to: PlanStatus::Completed,
            }
        );

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_start_lets_exactly_one_through() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        let id = manager.create_plan(record(TaskType::RiskAssessment)).await.unwrap();
        manager.approve_plan(&id).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let manager = manager.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move { manager.start_execution(&id).await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_is_exclusive_across_managers() {
        let temp = tempdir().unwrap();
        let first = StateManager::spawn(temp.path()).unwrap();
        let second = StateManager::spawn(temp.path()).unwrap();

        let id = first.create_plan(record(TaskType::QbrGeneration)).await.unwrap();
        second.approve_plan(&id).await.unwrap();

        let (a, b) = tokio::join!(first.start_execution(&id), second.start_execution(&id));
        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "first = {:?}, second = {:?}", a, b);

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser,
            Err(StateError::InvalidTransition {
                from: PlanStatus::Executing,
                to: PlanStatus::Executing,
                ..
            })
        ));

        first.shutdown().await.unwrap();
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_completion_survives_another_manager_opening() {
        let temp = tempdir().unwrap();
        let runner = StateManager::spawn(temp.path()).unwrap();
        let rec = record(TaskType::RenewalForecast);
        let id = runner.create_plan(rec.clone()).await.unwrap();
        runner.approve_plan(&id).await.unwrap();
        runner.start_execution(&id).await.unwrap();

        let observer = StateManager::spawn(temp.path()).unwrap();
        runner.complete_execution(&id, rec.plan, artifact(&id)).await.unwrap();
        assert_eq!(
            observer.get_plan_required(&id).await.unwrap().status,
            PlanStatus::Completed
        );
        runner.shutdown().await.unwrap();
        observer.shutdown().await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let reopened = StateManager::spawn(temp.path()).unwrap();
        assert_eq!(
            reopened.get_plan_required(&id).await.unwrap().status,
            PlanStatus::Completed
        );
        reopened.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_interrupt_execution_marks_failed() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        let id = manager.create_plan(record(TaskType::SavePlay)).await.unwrap();
        manager.approve_plan(&id).await.unwrap();
        manager.start_execution(&id).await.unwrap();

        manager.interrupt_execution(&id);
        let rec = manager.get_plan_required(&id).await.unwrap();
        assert_eq!(rec.status, PlanStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some(INTERRUPTED));

        // Nothing to interrupt once terminal
        manager.interrupt_execution(&id);
        assert_eq!(
            manager.get_plan_required(&id).await.unwrap().error.as_deref(),
            Some(INTERRUPTED)
        );
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let temp = tempdir().unwrap();
        let id = {
            let manager = StateManager::spawn(temp.path()).unwrap();
            let id = manager.create_plan(record(TaskType::ValueSummary)).await.unwrap();
            manager.approve_plan(&id).await.unwrap();
            manager.shutdown().await.unwrap();
            id
        };

        let manager = StateManager::spawn(temp.path()).unwrap();
        let rec = manager.get_plan_required(&id).await.unwrap();
        assert!(rec.is_executable());
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_error_after_shutdown() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        manager.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(manager.list_plans(None).await, Err(StateError::ChannelError));
    }
}
