// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The side-effecting funnel engine.
//!
//! Applies [`crate::machine::evaluate`] transitions: per-customer
//! serialization, audit logging, session persistence, lead finalization,
//! and fire-and-forget delivery. Send and notification failures are
//! logged and never roll back a transition; persistence failures
//! propagate to the caller.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use leadflow_config::model::{ButtonCatalog, KeywordConfig, MessageCatalog};
use leadflow_core::types::{InboundContent, InboundEvent, Lead, OutboundCommand, Session};
use leadflow_core::{
    time, ChannelAdapter, LeadflowError, NoopStatusHook, NotifierAdapter, StatusChangeHook,
    StorageAdapter,
};

use crate::classifier;
use crate::machine::{self, Notice};

/// Engine driving the conversation funnel for all customers.
pub struct FunnelEngine {
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    notifier: Arc<dyn NotifierAdapter>,
    messages: MessageCatalog,
    buttons: ButtonCatalog,
    keywords: KeywordConfig,
    status_hook: Arc<dyn StatusChangeHook>,
    // Serializes inbound handling per customer: two messages from the
    // same customer cannot interleave their read-modify-write
    // sequences. Lead writes from the scheduler or admin commands do
    // not take these locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FunnelEngine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        notifier: Arc<dyn NotifierAdapter>,
        messages: MessageCatalog,
        buttons: ButtonCatalog,
        keywords: KeywordConfig,
    ) -> Self {
        Self {
            storage,
            channel,
            notifier,
            messages,
            buttons,
            keywords,
            status_hook: Arc::new(NoopStatusHook),
            locks: DashMap::new(),
        }
    }

    /// Attach the automation trigger invoked when a lead is finalized.
    /// Without one, finalization keeps the no-op hook and starts no
    /// flows.
    pub fn with_status_hook(mut self, hook: Arc<dyn StatusChangeHook>) -> Self {
        self.status_hook = hook;
        self
    }

    fn customer_lock(&self, customer_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Process one inbound customer event end to end.
    pub async fn handle_inbound(&self, event: &InboundEvent) -> Result<(), LeadflowError> {
        let customer_id = event.customer_id.as_str();
        let lock = self.customer_lock(customer_id);
        let _guard = lock.lock().await;

        // The inbound audit entry is written before evaluation so the
        // trail survives a later failure.
        let button_id = match &event.content {
            InboundContent::Button { id, .. } => Some(id.as_str()),
            InboundContent::Text(_) => None,
        };
        self.storage
            .log_message(
                customer_id,
                "incoming",
                event.content.kind(),
                event.content.display_text(),
                button_id,
            )
            .await?;

        // Staff see every inbound message, including during handoff.
        if let Err(e) = self
            .notifier
            .notify(&format!(
                "[{customer_id}] {}",
                event.content.display_text()
            ))
            .await
        {
            warn!(customer_id, error = %e, "inbound forwarding failed");
        }

        let session = match self.storage.get_session(customer_id).await? {
            Some(session) => session,
            None => {
                let now = time::now();
                let session = Session {
                    customer_id: customer_id.to_string(),
                    current_state: leadflow_core::types::FunnelState::Welcome.to_string(),
                    lead_data: Default::default(),
                    created_at: now.clone(),
                    updated_at: now,
                };
                self.storage.create_session(&session).await?;
                debug!(customer_id, "session created");
                session
            }
        };

        let input = classifier::classify(&event.content, &self.keywords);
        let transition = machine::evaluate(
            &session.current_state,
            &input,
            &session.lead_data,
            &self.messages,
            &self.buttons,
        );

        let mut updated = session;
        updated.current_state = transition.next_state.to_string();
        updated.lead_data = transition.lead_data.clone();
        self.storage.update_session(&updated).await?;

        if transition.finalize_lead {
            let now = time::now();
            let lead = Lead {
                customer_id: customer_id.to_string(),
                intent: transition.lead_data.intent.clone(),
                size_category: transition.lead_data.size_category.clone(),
                site_condition: transition.lead_data.site_condition.clone(),
                location: transition.lead_data.location.clone(),
                status: "completed".to_string(),
                created_at: now.clone(),
                updated_at: now,
            };
            self.storage.upsert_lead(&lead).await?;
            debug!(customer_id, "lead finalized");

            if let Err(e) = self
                .status_hook
                .on_status_change(customer_id, "completed")
                .await
            {
                warn!(customer_id, error = %e, "status-change hook failed");
            }
        }

        for command in &transition.commands {
            self.deliver(customer_id, command).await;
        }

        if let Some(notice) = transition.notice {
            let text = match notice {
                Notice::AgentRequested => {
                    format!("Customer {customer_id} requested a human agent")
                }
                Notice::LeadQualified => format!(
                    "New qualified lead: {customer_id} ({})",
                    transition
                        .lead_data
                        .location
                        .as_deref()
                        .unwrap_or("no location")
                ),
            };
            if let Err(e) = self.notifier.notify(&text).await {
                warn!(customer_id, error = %e, "notification failed");
            }
        }

        Ok(())
    }

    /// Deliver one outbound command, fire and forget.
    ///
    /// Successful sends are appended to the audit log; failures are
    /// logged and swallowed.
    async fn deliver(&self, customer_id: &str, command: &OutboundCommand) {
        let (result, kind, body) = match command {
            OutboundCommand::Text { body } => (
                self.channel.send_text(customer_id, body).await,
                "text",
                body,
            ),
            OutboundCommand::Buttons { body, buttons } => (
                self.channel.send_buttons(customer_id, body, buttons).await,
                "buttons",
                body,
            ),
        };

        match result {
            Ok(message_id) => {
                if let Err(e) = self
                    .storage
                    .log_message(customer_id, "outgoing", kind, body, None)
                    .await
                {
                    warn!(customer_id, error = %e, "outbound audit log failed");
                }
                debug!(customer_id, message_id = %message_id.0, kind, "sent");
            }
            Err(e) => {
                warn!(customer_id, error = %e, kind, "send failed, transition kept");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    use leadflow_config::model::StorageConfig;
    use leadflow_core::types::{AdapterType, Button, FunnelState, HealthStatus, MessageId};
    use leadflow_core::PluginAdapter;
    use leadflow_storage::SqliteStorage;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Text { to: String, body: String },
        Buttons { to: String, body: String, ids: Vec<String> },
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: StdMutex<Vec<Sent>>,
        fail: bool,
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
            if self.fail {
                return Err(LeadflowError::Channel {
                    message: "down".to_string(),
                    source: None,
                });
            }
            self.sent.lock().unwrap().push(Sent::Text {
                to: to.to_string(),
                body: body.to_string(),
            });
            Ok(MessageId("mid".to_string()))
        }

        async fn send_buttons(
            &self,
            to: &str,
            body: &str,
            buttons: &[Button],
        ) -> Result<MessageId, LeadflowError> {
            if self.fail {
                return Err(LeadflowError::Channel {
                    message: "down".to_string(),
                    source: None,
                });
            }
            self.sent.lock().unwrap().push(Sent::Buttons {
                to: to.to_string(),
                body: body.to_string(),
                ids: buttons.iter().map(|b| b.id.clone()).collect(),
            });
            Ok(MessageId("mid".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl PluginAdapter for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Notifier
        }
        async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), LeadflowError> {
            Ok(())
        }
    }

    #[async_trait]
    impl NotifierAdapter for RecordingNotifier {
        async fn notify(&self, text: &str) -> Result<(), LeadflowError> {
            self.notices.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        calls: StdMutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl StatusChangeHook for RecordingHook {
        async fn on_status_change(
            &self,
            customer_id: &str,
            new_status: &str,
        ) -> Result<(), LeadflowError> {
            self.calls
                .lock()
                .unwrap()
                .push((customer_id.to_string(), new_status.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        engine: FunnelEngine,
        storage: Arc<SqliteStorage>,
        channel: Arc<RecordingChannel>,
        notifier: Arc<RecordingNotifier>,
        hook: Arc<RecordingHook>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        fixture_with_channel(RecordingChannel::default()).await
    }

    async fn fixture_with_channel(channel: RecordingChannel) -> Fixture {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("engine.db");
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        let channel = Arc::new(channel);
        let notifier = Arc::new(RecordingNotifier::default());
        let hook = Arc::new(RecordingHook::default());
        let engine = FunnelEngine::new(
            storage.clone(),
            channel.clone(),
            notifier.clone(),
            MessageCatalog::default(),
            ButtonCatalog::default(),
            KeywordConfig::default(),
        )
        .with_status_hook(hook.clone());

        Fixture {
            engine,
            storage,
            channel,
            notifier,
            hook,
            _dir: dir,
        }
    }

    fn text_event(customer: &str, text: &str) -> InboundEvent {
        InboundEvent {
            customer_id: customer.to_string(),
            content: InboundContent::Text(text.to_string()),
            timestamp: time::now(),
        }
    }

    fn button_event(customer: &str, id: &str) -> InboundEvent {
        InboundEvent {
            customer_id: customer.to_string(),
            content: InboundContent::Button {
                id: id.to_string(),
                title: id.to_string(),
            },
            timestamp: time::now(),
        }
    }

    #[tokio::test]
    async fn first_contact_creates_session_and_sends_menu() {
        let f = fixture().await;
        f.engine
            .handle_inbound(&text_event("+15550100", "hi"))
            .await
            .unwrap();

        let session = f.storage.get_session("+15550100").await.unwrap().unwrap();
        assert_eq!(session.current_state, "welcome");

        let sent = f.channel.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            Sent::Buttons { to, ids, .. }
                if to == "+15550100" && ids.contains(&"btn_sales".to_string())
        ));
    }

    #[tokio::test]
    async fn full_qualification_finalizes_completed_lead() {
        let f = fixture().await;
        let c = "+15550101";

        f.engine.handle_inbound(&text_event(c, "hello")).await.unwrap();
        f.engine
            .handle_inbound(&button_event(c, "btn_sales"))
            .await
            .unwrap();
        f.engine
            .handle_inbound(&button_event(c, "size_medium"))
            .await
            .unwrap();
        f.engine
            .handle_inbound(&button_event(c, "site_unprepared"))
            .await
            .unwrap();
        f.engine
            .handle_inbound(&text_event(c, "Springfield"))
            .await
            .unwrap();

        // Session auto-reset back to welcome after the summary.
        let session = f.storage.get_session(c).await.unwrap().unwrap();
        assert_eq!(session.current_state, FunnelState::Welcome.to_string());

        let lead = f.storage.get_lead(c).await.unwrap().unwrap();
        assert_eq!(lead.status, "completed");
        assert_eq!(lead.location, Some("Springfield".to_string()));
        assert_eq!(lead.size_category, Some("size_medium".to_string()));
        assert_eq!(lead.site_condition, Some("site_unprepared".to_string()));

        // The floor warning preceded the location prompt.
        let sent = f.channel.sent.lock().unwrap().clone();
        let warning_pos = sent.iter().position(|s| matches!(
            s, Sent::Text { body, .. } if body.contains("Heads up")
        ));
        let prompt_pos = sent.iter().position(|s| matches!(
            s, Sent::Text { body, .. } if body.contains("city or town")
        ));
        assert!(warning_pos.unwrap() < prompt_pos.unwrap());

        // The status hook fired for the finalization.
        let calls = f.hook.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(c.to_string(), "completed".to_string())]);

        // Staff were told about the new lead.
        let notices = f.notifier.notices.lock().unwrap().clone();
        assert!(notices.iter().any(|n| n.contains("New qualified lead")));
    }

    #[tokio::test]
    async fn finalization_without_attached_hook_still_completes_lead() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nohook.db");
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        // No with_status_hook call: the default hook must swallow the
        // finalization without error.
        let engine = FunnelEngine::new(
            storage.clone(),
            Arc::new(RecordingChannel::default()),
            Arc::new(RecordingNotifier::default()),
            MessageCatalog::default(),
            ButtonCatalog::default(),
            KeywordConfig::default(),
        );

        let c = "+15550106";
        engine.handle_inbound(&text_event(c, "hello")).await.unwrap();
        engine.handle_inbound(&button_event(c, "btn_sales")).await.unwrap();
        engine.handle_inbound(&button_event(c, "size_small")).await.unwrap();
        engine.handle_inbound(&button_event(c, "site_ready")).await.unwrap();
        engine.handle_inbound(&text_event(c, "Springfield")).await.unwrap();

        let lead = storage.get_lead(c).await.unwrap().unwrap();
        assert_eq!(lead.status, "completed");
    }

    #[tokio::test]
    async fn agent_keyword_hands_off_and_suppresses_followups() {
        let f = fixture().await;
        let c = "+15550102";

        f.engine.handle_inbound(&text_event(c, "hello")).await.unwrap();
        f.engine
            .handle_inbound(&button_event(c, "btn_sales"))
            .await
            .unwrap();
        f.engine
            .handle_inbound(&text_event(c, "I want a human"))
            .await
            .unwrap();

        let session = f.storage.get_session(c).await.unwrap().unwrap();
        assert_eq!(session.current_state, "human_handoff");

        let sends_before = f.channel.sent.lock().unwrap().len();
        f.engine
            .handle_inbound(&text_event(c, "anyone there?"))
            .await
            .unwrap();
        let sends_after = f.channel.sent.lock().unwrap().len();
        assert_eq!(sends_before, sends_after, "handoff must be silent");

        // The silent message still reaches the audit log and staff.
        let log = f.storage.get_messages(c, None).await.unwrap();
        assert!(log.iter().any(|m| m.content == "anyone there?"));
        let notices = f.notifier.notices.lock().unwrap().clone();
        assert!(notices.iter().any(|n| n.contains("anyone there?")));
    }

    #[tokio::test]
    async fn reset_keyword_exits_handoff() {
        let f = fixture().await;
        let c = "+15550103";

        f.engine
            .handle_inbound(&text_event(c, "agent please"))
            .await
            .unwrap();
        f.engine.handle_inbound(&text_event(c, "reset")).await.unwrap();

        let session = f.storage.get_session(c).await.unwrap().unwrap();
        assert_eq!(session.current_state, "welcome");
    }

    #[tokio::test]
    async fn send_failure_does_not_roll_back_transition() {
        let f = fixture_with_channel(RecordingChannel {
            sent: StdMutex::new(Vec::new()),
            fail: true,
        })
        .await;
        let c = "+15550104";

        f.engine.handle_inbound(&text_event(c, "hello")).await.unwrap();
        f.engine
            .handle_inbound(&button_event(c, "btn_sales"))
            .await
            .unwrap();

        // The channel was down the whole time; the session advanced anyway.
        let session = f.storage.get_session(c).await.unwrap().unwrap();
        assert_eq!(session.current_state, "qualify_size");

        // Failed sends are not logged as outgoing.
        let log = f.storage.get_messages(c, None).await.unwrap();
        assert!(log.iter().all(|m| m.direction == "incoming"));
    }

    #[tokio::test]
    async fn inbound_is_logged_before_outbound() {
        let f = fixture().await;
        let c = "+15550105";
        f.engine.handle_inbound(&text_event(c, "hi")).await.unwrap();

        let log = f.storage.get_messages(c, None).await.unwrap();
        assert_eq!(log[0].direction, "incoming");
        assert_eq!(log[0].content, "hi");
        assert_eq!(log[1].direction, "outgoing");
    }
}
