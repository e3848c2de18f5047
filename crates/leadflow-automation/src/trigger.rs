// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status-change trigger: starts flow executions when a lead enters a
//! status that matches an active flow definition.
//!
//! A flow whose first step is `change_status` re-enters the trigger: that
//! step runs inline and its target status joins an explicit work queue,
//! so chains are processed iteratively rather than by recursive calls.
//! A per-invocation visited set and a depth bound keep a misconfigured
//! flow graph from starting the same flow twice or looping without
//! limit. Later `change_status` steps are the scheduler's business and
//! chain one hop per tick.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use leadflow_core::types::{ExecutionStatus, FlowExecution, FlowStep, Lead};
use leadflow_core::{time, FlowProvider, LeadflowError, StatusChangeHook, StorageAdapter};

/// Starts executions for flows triggered by lead status changes.
pub struct FlowTrigger {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn FlowProvider>,
    max_chain_depth: usize,
}

impl FlowTrigger {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn FlowProvider>,
        max_chain_depth: usize,
    ) -> Self {
        Self {
            storage,
            provider,
            max_chain_depth,
        }
    }

    /// Write `status` onto the customer's lead, then start matching flows.
    ///
    /// Creates a minimal lead row when none exists yet, so a
    /// `change_status` step can promote a customer the funnel never
    /// finalized.
    pub async fn apply_status(
        &self,
        customer_id: &str,
        status: &str,
    ) -> Result<(), LeadflowError> {
        self.write_lead_status(customer_id, status).await?;
        self.trigger(customer_id, status).await
    }

    async fn write_lead_status(
        &self,
        customer_id: &str,
        status: &str,
    ) -> Result<(), LeadflowError> {
        let updated = self.storage.update_lead_status(customer_id, status).await?;
        if !updated {
            let now = time::now();
            self.storage
                .upsert_lead(&Lead {
                    customer_id: customer_id.to_string(),
                    intent: None,
                    size_category: None,
                    site_condition: None,
                    location: None,
                    status: status.to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                })
                .await?;
        }
        Ok(())
    }

    /// Start executions for every active flow matching `new_status`.
    ///
    /// Idempotent per `(flow, customer)` pair: an existing active
    /// execution suppresses creation. Failures while handling one flow
    /// are logged and do not affect the other matching flows.
    ///
    /// A flow led by a `change_status` step runs that step before the
    /// next tick could: the lead is rewritten, the execution advances
    /// past the step, and the target status is enqueued so flows
    /// listening on it start in the same invocation.
    pub async fn trigger(&self, customer_id: &str, new_status: &str) -> Result<(), LeadflowError> {
        let mut queue: VecDeque<String> = VecDeque::from([new_status.to_string()]);
        let mut started: HashSet<String> = HashSet::new();
        let mut depth = 0usize;

        while let Some(status) = queue.pop_front() {
            if depth >= self.max_chain_depth {
                warn!(
                    customer_id,
                    status, depth, "status chain depth bound reached, remaining statuses dropped"
                );
                break;
            }
            depth += 1;

            let flows = self.provider.flows_for_status(&status).await?;
            if flows.is_empty() {
                debug!(customer_id, status, "no matching flows");
                continue;
            }

            for flow in flows {
                if flow.steps.is_empty() {
                    warn!(flow_id = %flow.id, "flow has no steps, skipped");
                    continue;
                }
                if !started.insert(flow.id.clone()) {
                    warn!(
                        flow_id = %flow.id,
                        customer_id,
                        "flow already started in this chain, cycle suppressed"
                    );
                    continue;
                }

                match self.storage.find_active_execution(&flow.id, customer_id).await {
                    Ok(Some(existing)) => {
                        debug!(
                            flow_id = %flow.id,
                            customer_id,
                            execution_id = %existing.id,
                            "active execution exists, skipped"
                        );
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(flow_id = %flow.id, customer_id, error = %e, "lookup failed, flow skipped");
                        continue;
                    }
                }

                let next_run_at = first_run_at(&flow.steps[0]);
                let now = time::now();
                let execution = FlowExecution {
                    id: uuid::Uuid::new_v4().to_string(),
                    flow_id: flow.id.clone(),
                    customer_id: customer_id.to_string(),
                    current_step: 0,
                    next_run_at,
                    status: "active".to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                };

                if let Err(e) = self.storage.create_execution(&execution).await {
                    warn!(flow_id = %flow.id, customer_id, error = %e, "execution creation failed");
                    continue;
                }
                debug!(
                    flow_id = %flow.id,
                    customer_id,
                    execution_id = %execution.id,
                    "execution started"
                );

                if let FlowStep::ChangeStatus { status: chained } = &flow.steps[0] {
                    if let Err(e) = self.write_lead_status(customer_id, chained).await {
                        warn!(
                            flow_id = %flow.id,
                            customer_id,
                            error = %e,
                            "leading status change failed, execution left for the scheduler"
                        );
                        continue;
                    }
                    if let Err(e) = self.advance_past_first(&execution, &flow.steps).await {
                        warn!(
                            execution_id = %execution.id,
                            error = %e,
                            "cursor advance failed after status change"
                        );
                    }
                    queue.push_back(chained.clone());
                }
            }
        }

        Ok(())
    }

    /// Move a fresh execution past its already-executed first step.
    async fn advance_past_first(
        &self,
        execution: &FlowExecution,
        steps: &[FlowStep],
    ) -> Result<(), LeadflowError> {
        match steps.get(1) {
            None => {
                self.storage
                    .set_execution_status(&execution.id, ExecutionStatus::Completed, Some(1))
                    .await
            }
            Some(step) => {
                self.storage
                    .advance_execution(&execution.id, 1, &first_run_at(step))
                    .await
            }
        }
    }
}

/// First due time for a fresh execution, from the leading step's type.
fn first_run_at(step: &FlowStep) -> String {
    match step {
        FlowStep::Wait { delay_minutes } => time::minutes_from_now(*delay_minutes),
        FlowStep::SendMessage { .. } | FlowStep::ChangeStatus { .. } => time::now(),
    }
}

#[async_trait]
impl StatusChangeHook for FlowTrigger {
    async fn on_status_change(
        &self,
        customer_id: &str,
        new_status: &str,
    ) -> Result<(), LeadflowError> {
        self.trigger(customer_id, new_status).await
    }
}
