//! Routes long-polled chat updates onto the workflow flows: invite
//! redemption from participants, the appeal button, and supervisor
//! commands in the audit group.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use chrono::Duration;
use paceline_core::{Clock, CourseId, LogId, PacelineError};
use paceline_notify::{IncomingEvent, TelegramClient};
use paceline_workflow::{ActivationFlow, ActivationOutcome, AppealWorkflow, SupervisorActions};

const POLL_TIMEOUT_SECS: u64 = 25;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Redeem(String),
    OpenAppeal(CourseId),
    AcceptAppeal(CourseId),
    DeclineAppeal(CourseId),
    Reject(CourseId),
    Complete(CourseId),
    Extend(CourseId, u32),
    BeginReview(LogId),
    Approve(LogId),
    Reshoot(LogId, i64),
}

pub fn parse_text(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?;
    let arg = parts.next();
    match command {
        "/start" => Some(Command::Redeem(arg?.to_string())),
        "/appeal_ok" => arg?.parse().ok().map(Command::AcceptAppeal),
        "/appeal_no" => arg?.parse().ok().map(Command::DeclineAppeal),
        "/reject" => arg?.parse().ok().map(Command::Reject),
        "/complete" => arg?.parse().ok().map(Command::Complete),
        "/extend" => {
            let id = arg?.parse().ok()?;
            let days = parts.next()?.parse().ok()?;
            Some(Command::Extend(id, days))
        }
        "/review" => arg?.parse().ok().map(Command::BeginReview),
        "/approve" => arg?.parse().ok().map(Command::Approve),
        "/reshoot" => {
            let id = arg?.parse().ok()?;
            let hours = parts.next()?.parse().ok()?;
            Some(Command::Reshoot(id, hours))
        }
        _ => None,
    }
}

pub fn parse_callback(data: &str) -> Option<Command> {
    let id = data.strip_prefix("appeal:")?;
    id.parse().ok().map(Command::OpenAppeal)
}

pub struct Dispatcher {
    client: Arc<TelegramClient>,
    activation: ActivationFlow,
    appeals: AppealWorkflow,
    supervisor: SupervisorActions,
    clock: Arc<dyn Clock>,
    group_chat_id: i64,
}

impl Dispatcher {
    pub fn new(
        client: Arc<TelegramClient>,
        activation: ActivationFlow,
        appeals: AppealWorkflow,
        supervisor: SupervisorActions,
        clock: Arc<dyn Clock>,
        group_chat_id: i64,
    ) -> Self {
        Self { client, activation, appeals, supervisor, clock, group_chat_id }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset = 0i64;
        info!("Update dispatcher started");
        loop {
            let poll = self.client.get_updates(offset, POLL_TIMEOUT_SECS);
            let updates = tokio::select! {
                result = poll => result,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Update dispatcher stopping");
                        return;
                    }
                    continue;
                }
            };
            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Update poll failed, backing off");
                    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                    continue;
                }
            };
            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.handle(update.event).await;
            }
        }
    }

    async fn handle(&self, event: IncomingEvent) {
        match event {
            // Supervisor commands are honored only inside the audit group.
            IncomingEvent::Text { chat_id, text, .. } if chat_id == self.group_chat_id => {
                let Some(cmd) = parse_text(&text) else { return };
                self.run_group_command(cmd).await;
            }
            IncomingEvent::Text { text, .. } => {
                if let Some(Command::Redeem(token)) = parse_text(&text) {
                    match self.activation.redeem(&token).await {
                        Ok(outcome) => {
                            info!(outcome = outcome_kind(&outcome), "Invite redeemed")
                        }
                        Err(e) => warn!(error = %e, "Invite redemption failed"),
                    }
                }
            }
            IncomingEvent::Callback { callback_id, data, .. } => {
                let answer = match parse_callback(&data) {
                    Some(Command::OpenAppeal(id)) => self.open_appeal(id).await,
                    _ => None,
                };
                if let Err(e) = self.client.answer_callback(&callback_id, answer.as_deref()).await
                {
                    warn!(error = %e, "Callback acknowledgement lost");
                }
            }
            IncomingEvent::Other => {}
        }
    }

    async fn run_group_command(&self, cmd: Command) {
        let (name, result) = match cmd {
            Command::AcceptAppeal(id) => ("appeal_ok", self.appeals.accept(id).await),
            Command::DeclineAppeal(id) => ("appeal_no", self.appeals.decline(id).await),
            Command::Reject(id) => ("reject", self.supervisor.reject(id).await),
            Command::Complete(id) => ("complete", self.supervisor.complete(id).await),
            Command::Extend(id, days) => ("extend", self.supervisor.extend(id, days).await),
            Command::BeginReview(id) => ("review", self.supervisor.begin_review(id).await),
            Command::Approve(id) => ("approve", self.supervisor.approve_log(id).await),
            Command::Reshoot(id, hours) => {
                let deadline = self.clock.now() + Duration::hours(hours);
                ("reshoot", self.supervisor.request_reshoot(id, deadline).await)
            }
            // Participant-side commands carry no meaning in the group.
            Command::Redeem(_) | Command::OpenAppeal(_) => return,
        };
        match result {
            Ok(true) => info!(command = name, "Supervisor command applied"),
            Ok(false) => info!(command = name, "Supervisor command lost the race"),
            Err(e) => warn!(command = name, error = %e, "Supervisor command failed"),
        }
    }

    async fn open_appeal(&self, id: CourseId) -> Option<String> {
        match self.appeals.start_appeal(id, None, None).await {
            Ok(true) => Some("Appeal submitted.".to_string()),
            Ok(false) => Some("This appeal is no longer available.".to_string()),
            Err(PacelineError::AppealQuotaExhausted { .. }) => {
                Some("No appeal attempts remain.".to_string())
            }
            Err(PacelineError::NotAppealable(_)) => {
                Some("This removal cannot be appealed.".to_string())
            }
            Err(e) => {
                warn!(course_id = %id, error = %e, "Appeal open failed");
                None
            }
        }
    }
}

fn outcome_kind(outcome: &ActivationOutcome) -> &'static str {
    match outcome {
        ActivationOutcome::Activated(_) => "activated",
        ActivationOutcome::UnknownToken => "unknown_token",
        ActivationOutcome::AlreadyUsed => "already_used",
        ActivationOutcome::Expired => "expired",
    }
}
