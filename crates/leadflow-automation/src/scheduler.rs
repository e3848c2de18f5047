// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick-driven executor for flow executions.
//!
//! Each tick selects a bounded batch of due active executions and runs
//! one effective step per execution. Step effects happen before the
//! cursor is persisted, so a crash between the two yields at-least-once
//! delivery rather than a silently skipped step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use leadflow_config::model::SchedulerConfig;
use leadflow_core::types::{ExecutionStatus, FlowExecution, FlowStep};
use leadflow_core::{time, ChannelAdapter, FlowProvider, LeadflowError, StorageAdapter};

use crate::trigger::FlowTrigger;

/// Executes due flow steps on a fixed interval.
pub struct FlowScheduler {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn FlowProvider>,
    channel: Arc<dyn ChannelAdapter>,
    trigger: Arc<FlowTrigger>,
    config: SchedulerConfig,
    tick_guard: Mutex<()>,
}

impl FlowScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn FlowProvider>,
        channel: Arc<dyn ChannelAdapter>,
        trigger: Arc<FlowTrigger>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            channel,
            trigger,
            config,
            tick_guard: Mutex::new(()),
        }
    }

    /// Tick loop. Runs until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.tick_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_secs = self.config.tick_secs, "scheduler started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One scheduling pass. A tick that arrives while the previous one
    /// is still running is skipped, never stacked.
    pub async fn tick(&self) {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            warn!("previous tick still running, skipped");
            return;
        };

        let now = time::now();
        let due = match self
            .storage
            .due_executions(&now, self.config.batch_size)
            .await
        {
            Ok(due) => due,
            Err(e) => {
                warn!(error = %e, "due execution scan failed");
                return;
            }
        };
        if due.is_empty() {
            return;
        }
        debug!(count = due.len(), "processing due executions");

        for execution in &due {
            if let Err(e) = self.process(execution).await {
                warn!(execution_id = %execution.id, error = %e, "execution step failed");
                if let Err(e) = self
                    .storage
                    .set_execution_status(&execution.id, ExecutionStatus::Failed, None)
                    .await
                {
                    warn!(execution_id = %execution.id, error = %e, "could not mark execution failed");
                }
            }
        }
    }

    /// Runs one effective step of `execution` and persists the advance.
    ///
    /// A `wait` step the execution was parked on carries no effect of
    /// its own (its delay already elapsed through `next_run_at`), so the
    /// cursor falls through to the step behind it within the same tick.
    async fn process(&self, execution: &FlowExecution) -> Result<(), LeadflowError> {
        let flow = self
            .provider
            .get_flow(&execution.flow_id)
            .await?
            .filter(|f| f.is_active);
        let Some(flow) = flow else {
            debug!(
                execution_id = %execution.id,
                flow_id = %execution.flow_id,
                "flow deleted or deactivated, execution completed"
            );
            self.storage
                .set_execution_status(&execution.id, ExecutionStatus::Completed, None)
                .await?;
            return Ok(());
        };

        let parked = usize::try_from(execution.current_step).unwrap_or(usize::MAX);
        let mut cursor = parked;
        loop {
            let Some(step) = flow.steps.get(cursor) else {
                self.storage
                    .set_execution_status(
                        &execution.id,
                        ExecutionStatus::Completed,
                        Some(cursor as i64),
                    )
                    .await?;
                debug!(execution_id = %execution.id, "execution completed");
                return Ok(());
            };

            match step {
                FlowStep::Wait { delay_minutes } => {
                    if cursor == parked {
                        // Delay already served; fall through.
                        cursor += 1;
                        continue;
                    }
                    // A later wait parks the execution with its own delay.
                    self.storage
                        .advance_execution(
                            &execution.id,
                            cursor as i64,
                            &time::minutes_from_now(*delay_minutes),
                        )
                        .await?;
                    return Ok(());
                }
                FlowStep::SendMessage { content } => {
                    self.channel
                        .send_text(&execution.customer_id, content)
                        .await?;
                    if let Err(e) = self
                        .storage
                        .log_message(&execution.customer_id, "outgoing", "text", content, None)
                        .await
                    {
                        warn!(execution_id = %execution.id, error = %e, "outbound audit log failed");
                    }
                }
                FlowStep::ChangeStatus { status } => {
                    // Lead write plus re-trigger, so flows listening on
                    // the new status start before the next tick.
                    self.trigger.apply_status(&execution.customer_id, status).await?;
                }
            }

            // One effective step per tick: park at the next step.
            let next = cursor + 1;
            return match flow.steps.get(next) {
                None => {
                    self.storage
                        .set_execution_status(
                            &execution.id,
                            ExecutionStatus::Completed,
                            Some(next as i64),
                        )
                        .await?;
                    debug!(execution_id = %execution.id, "execution completed");
                    Ok(())
                }
                Some(FlowStep::Wait { delay_minutes }) => {
                    self.storage
                        .advance_execution(
                            &execution.id,
                            next as i64,
                            &time::minutes_from_now(*delay_minutes),
                        )
                        .await
                }
                Some(_) => {
                    self.storage
                        .advance_execution(&execution.id, next as i64, &time::now())
                        .await
                }
            };
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tempfile::tempdir;

    use leadflow_config::model::StorageConfig;
    use leadflow_core::types::{Button, MessageId};
    use leadflow_core::{AdapterType, HealthStatus, PluginAdapter};
    use leadflow_storage::SqliteStorage;

    use crate::provider::TomlFlowProvider;

    struct RecordingChannel {
        sent: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Channel
        }
        async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), LeadflowError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelAdapter for RecordingChannel {
        async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, LeadflowError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(LeadflowError::Channel {
                    message: "simulated delivery failure".to_string(),
                    source: None,
                });
            }
            self.sent
                .lock()
                .await
                .push((to.to_string(), body.to_string()));
            Ok(MessageId("mock-id".to_string()))
        }

        async fn send_buttons(
            &self,
            to: &str,
            body: &str,
            _buttons: &[Button],
        ) -> Result<MessageId, LeadflowError> {
            self.send_text(to, body).await
        }
    }

    const FLOWS: &str = r#"
[[flows]]
id = "drip"
name = "Drip"
is_active = true
trigger_on_status = "completed"

[[flows.steps]]
type = "send_message"
content = "Thanks for your interest!"

[[flows.steps]]
type = "wait"
delay_minutes = 10

[[flows.steps]]
type = "change_status"
status = "contacted"

[[flows]]
id = "chained"
name = "Chained ping"
is_active = true
trigger_on_status = "contacted"

[[flows.steps]]
type = "send_message"
content = "Still interested?"
"#;

    struct Fixture {
        scheduler: FlowScheduler,
        storage: Arc<SqliteStorage>,
        channel: Arc<RecordingChannel>,
        trigger: Arc<FlowTrigger>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(flows: &str) -> Fixture {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("scheduler.db");
        let storage: Arc<SqliteStorage> = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        let provider = Arc::new(TomlFlowProvider::from_str(flows).unwrap());
        let channel = Arc::new(RecordingChannel::new());
        let trigger = Arc::new(FlowTrigger::new(storage.clone(), provider.clone(), 8));
        let scheduler = FlowScheduler::new(
            storage.clone(),
            provider,
            channel.clone(),
            trigger.clone(),
            SchedulerConfig {
                tick_secs: 60,
                batch_size: 100,
                max_chain_depth: 8,
            },
        );
        Fixture {
            scheduler,
            storage,
            channel,
            trigger,
            _dir: dir,
        }
    }

    async fn sole_execution(storage: &SqliteStorage, customer: &str) -> FlowExecution {
        let executions = storage.list_executions(customer).await.unwrap();
        assert_eq!(executions.len(), 1);
        executions.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn due_send_message_step_delivers_and_parks_at_wait() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550300", "completed").await.unwrap();

        f.scheduler.tick().await;

        let sent = f.channel.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[("+15550300".to_string(), "Thanks for your interest!".to_string())]
        );
        drop(sent);

        let execution = sole_execution(&f.storage, "+15550300").await;
        assert_eq!(execution.status, "active");
        assert_eq!(execution.current_step, 1);
        assert!(execution.next_run_at > time::now(), "parked at the wait step");
    }

    #[tokio::test]
    async fn not_yet_due_execution_is_untouched() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550301", "completed").await.unwrap();

        f.scheduler.tick().await;
        f.scheduler.tick().await;

        // The second tick sees the wait-parked execution as not due.
        assert_eq!(f.channel.sent.lock().await.len(), 1);
        let execution = sole_execution(&f.storage, "+15550301").await;
        assert_eq!(execution.current_step, 1);
    }

    #[tokio::test]
    async fn elapsed_wait_falls_through_to_change_status_and_chains() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550302", "completed").await.unwrap();
        f.scheduler.tick().await;

        // Simulate the 10 minutes passing.
        let execution = sole_execution(&f.storage, "+15550302").await;
        f.storage
            .advance_execution(&execution.id, 1, "2020-01-01T00:00:00.000Z")
            .await
            .unwrap();

        f.scheduler.tick().await;

        let lead = f.storage.get_lead("+15550302").await.unwrap().unwrap();
        assert_eq!(lead.status, "contacted");

        let executions = f.storage.list_executions("+15550302").await.unwrap();
        let drip = executions.iter().find(|e| e.flow_id == "drip").unwrap();
        assert_eq!(drip.status, "completed");
        assert_eq!(drip.current_step, 3);

        // change_status fired the trigger, starting the chained flow.
        let chained = executions.iter().find(|e| e.flow_id == "chained").unwrap();
        assert_eq!(chained.status, "active");
        assert_eq!(chained.current_step, 0);
    }

    #[tokio::test]
    async fn change_status_creates_missing_lead() {
        let flows = r#"
[[flows]]
id = "promote"
name = "Promote"
is_active = true
trigger_on_status = "new"

[[flows.steps]]
type = "change_status"
status = "vip"
"#;
        let f = fixture(flows).await;
        f.trigger.trigger("+15550303", "new").await.unwrap();
        f.scheduler.tick().await;

        let lead = f.storage.get_lead("+15550303").await.unwrap().unwrap();
        assert_eq!(lead.status, "vip");
    }

    #[tokio::test]
    async fn deactivated_flow_completes_execution_without_sending() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550304", "completed").await.unwrap();

        // Same definitions, but the drip flow got switched off after
        // the execution was created.
        let stale = FLOWS.replacen("is_active = true", "is_active = false", 1);
        let provider = Arc::new(TomlFlowProvider::from_str(&stale).unwrap());
        let scheduler = FlowScheduler::new(
            f.storage.clone(),
            provider.clone(),
            f.channel.clone(),
            Arc::new(FlowTrigger::new(f.storage.clone(), provider, 8)),
            SchedulerConfig {
                tick_secs: 60,
                batch_size: 100,
                max_chain_depth: 8,
            },
        );
        scheduler.tick().await;

        assert!(f.channel.sent.lock().await.is_empty());
        let execution = sole_execution(&f.storage, "+15550304").await;
        assert_eq!(execution.status, "completed");
    }

    #[tokio::test]
    async fn deleted_flow_completes_execution() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550305", "completed").await.unwrap();

        let provider = Arc::new(TomlFlowProvider::empty());
        let scheduler = FlowScheduler::new(
            f.storage.clone(),
            provider.clone(),
            f.channel.clone(),
            Arc::new(FlowTrigger::new(f.storage.clone(), provider, 8)),
            SchedulerConfig {
                tick_secs: 60,
                batch_size: 100,
                max_chain_depth: 8,
            },
        );
        scheduler.tick().await;

        let execution = sole_execution(&f.storage, "+15550305").await;
        assert_eq!(execution.status, "completed");
    }

    #[tokio::test]
    async fn delivery_failure_marks_execution_failed() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550306", "completed").await.unwrap();
        f.channel.fail.store(true, Ordering::SeqCst);

        f.scheduler.tick().await;

        let execution = sole_execution(&f.storage, "+15550306").await;
        assert_eq!(execution.status, "failed");
        // Cursor untouched: the step never completed.
        assert_eq!(execution.current_step, 0);
    }

    #[tokio::test]
    async fn one_failing_execution_does_not_block_others() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550307", "completed").await.unwrap();
        f.trigger.trigger("+15550308", "completed").await.unwrap();

        // Both are due and both deliveries fail; each must end up in its
        // own failed state rather than the first aborting the tick.
        f.channel.fail.store(true, Ordering::SeqCst);
        f.scheduler.tick().await;

        let a = sole_execution(&f.storage, "+15550307").await;
        let b = sole_execution(&f.storage, "+15550308").await;
        assert_eq!(a.status, "failed");
        assert_eq!(b.status, "failed");
    }

    #[tokio::test]
    async fn final_step_completes_with_cursor_past_end() {
        let flows = r#"
[[flows]]
id = "one-shot"
name = "One shot"
is_active = true
trigger_on_status = "new"

[[flows.steps]]
type = "send_message"
content = "only step"
"#;
        let f = fixture(flows).await;
        f.trigger.trigger("+15550309", "new").await.unwrap();
        f.scheduler.tick().await;

        let execution = sole_execution(&f.storage, "+15550309").await;
        assert_eq!(execution.status, "completed");
        assert_eq!(execution.current_step, 1);
        assert_eq!(f.channel.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn scheduled_send_is_written_to_the_audit_log() {
        let f = fixture(FLOWS).await;
        f.trigger.trigger("+15550310", "completed").await.unwrap();
        f.scheduler.tick().await;

        let log = f.storage.get_messages("+15550310", None).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].direction, "outgoing");
        assert_eq!(log[0].content, "Thanks for your interest!");
    }

    #[tokio::test]
    async fn run_loop_stops_on_cancellation() {
        let f = fixture(FLOWS).await;
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(async move {
            // Move the whole fixture in so storage outlives the loop.
            f.scheduler.run(cancel_clone).await;
        });
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler must stop promptly")
            .unwrap();
    }
}
