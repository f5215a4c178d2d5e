// Lifecycle of one assist panel: idle -> loading -> ready | failed.
//
// Each trigger bumps a generation counter. A result is applied only when it
// carries the latest generation and the panel is still open, so answers to
// superseded or abandoned requests are dropped.

use serde::Serialize;

use crate::assist::client::{AssistError, CompletionService};
use crate::assist::prompt::{prioritize_candidates, AssistTask};
use crate::assist::ranking::{parse_ranking, RankedProspect};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AssistOutput {
    Text(String),
    Ranking(Vec<RankedProspect>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AssistState {
    #[default]
    Idle,
    Loading,
    Ready(AssistOutput),
    Failed(String),
}

impl AssistState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AssistState::Loading)
    }
}

/// Handle for one outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct AssistSession {
    generation: u64,
    state: AssistState,
    closed: bool,
}

impl AssistSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AssistState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a new request. Any earlier ticket becomes stale.
    pub fn trigger(&mut self) -> Ticket {
        self.generation += 1;
        self.closed = false;
        self.state = AssistState::Loading;
        Ticket {
            generation: self.generation,
        }
    }

    /// Apply a finished request. Returns false when the result was discarded.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<AssistOutput, AssistError>) -> bool {
        if self.closed || ticket.generation != self.generation {
            log::debug!(
                "discarding stale assist result (ticket {}, current {}, closed {})",
                ticket.generation,
                self.generation,
                self.closed
            );
            return false;
        }
        self.state = match result {
            Ok(output) => AssistState::Ready(output),
            Err(e) => {
                log::warn!("assist request failed: {}", e);
                AssistState::Failed(e.user_message())
            }
        };
        true
    }

    /// Panel closed: outstanding tickets are invalidated
    pub fn close(&mut self) {
        self.generation += 1;
        self.closed = true;
        self.state = AssistState::Idle;
    }

    /// Trigger, send exactly one request, and apply its result.
    pub fn run<S>(&mut self, service: &S, task: &AssistTask<'_>) -> &AssistState
    where
        S: CompletionService + ?Sized,
    {
        let ticket = self.trigger();
        let request = task.request();
        log::info!("assist {}: sending request", task.mode());
        let result = service
            .generate(&request)
            .and_then(|text| parse_output(task, &text));
        self.resolve(ticket, result);
        &self.state
    }

    /// Like `run`, for a service that may have failed to start. A setup
    /// error ends up in the panel as a failure, the same as a failed call.
    pub fn run_with<S>(&mut self, service: Result<S, AssistError>, task: &AssistTask<'_>) -> &AssistState
    where
        S: CompletionService,
    {
        match service {
            Ok(service) => self.run(&service, task),
            Err(e) => {
                let ticket = self.trigger();
                self.resolve(ticket, Err(e));
                &self.state
            }
        }
    }
}

/// Turn raw service text into panel output for the task's mode
pub fn parse_output(task: &AssistTask<'_>, text: &str) -> Result<AssistOutput, AssistError> {
    match task {
        AssistTask::Prioritize { prospects, stages } => {
            parse_ranking(text, prioritize_candidates(prospects, stages)).map(AssistOutput::Ranking)
        }
        _ => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(AssistError::Response("empty response".to_string()))
            } else {
                Ok(AssistOutput::Text(trimmed.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::client::{CompletionRequest, MockCompletionService};
    use crate::models::{Prospect, Stage};
    use std::cell::{Cell, RefCell};

    struct CountingService {
        calls: Cell<usize>,
        prompts: RefCell<Vec<String>>,
        reply: String,
    }

    impl CountingService {
        fn new(reply: &str) -> Self {
            Self {
                calls: Cell::new(0),
                prompts: RefCell::new(Vec::new()),
                reply: reply.to_string(),
            }
        }
    }

    impl CompletionService for CountingService {
        fn generate(&self, request: &CompletionRequest) -> Result<String, AssistError> {
            self.calls.set(self.calls.get() + 1);
            self.prompts.borrow_mut().push(request.prompt.clone());
            Ok(self.reply.clone())
        }
    }

    fn prospect(id: &str) -> Prospect {
        Prospect {
            id: id.to_string(),
            name: id.to_uppercase(),
            company: "Acme".to_string(),
            email: None,
            phone: None,
            stage_id: "new".to_string(),
            created_ts: 0,
            qualification: None,
        }
    }

    #[test]
    fn test_run_sends_exactly_one_request() {
        let p = prospect("p1");
        let service = CountingService::new("Acme sells anvils.");
        let mut session = AssistSession::new();

        let state = session.run(&service, &AssistTask::Research(&p)).clone();
        assert_eq!(service.calls.get(), 1);
        assert_eq!(state, AssistState::Ready(AssistOutput::Text("Acme sells anvils.".into())));
        assert!(service.prompts.borrow()[0].contains("P1"));
    }

    #[test]
    fn test_second_trigger_supersedes_first() {
        let mut session = AssistSession::new();
        let first = session.trigger();
        let second = session.trigger();
        assert!(session.state().is_loading());

        // Second answer arrives first and is shown
        assert!(session.resolve(second, Ok(AssistOutput::Text("second".into()))));
        // First answer arrives late and is ignored
        assert!(!session.resolve(first, Ok(AssistOutput::Text("first".into()))));
        assert_eq!(session.state(), &AssistState::Ready(AssistOutput::Text("second".into())));
    }

    #[test]
    fn test_stale_result_ignored_while_loading() {
        let mut session = AssistSession::new();
        let first = session.trigger();
        let _second = session.trigger();
        assert!(!session.resolve(first, Err(AssistError::Http("late".into()))));
        assert!(session.state().is_loading());
    }

    #[test]
    fn test_result_after_close_is_suppressed() {
        let mut session = AssistSession::new();
        let ticket = session.trigger();
        session.close();
        assert!(!session.resolve(ticket, Ok(AssistOutput::Text("too late".into()))));
        assert_eq!(session.state(), &AssistState::Idle);
        assert!(session.is_closed());

        // Reopening works with a fresh ticket
        let ticket = session.trigger();
        assert!(!session.is_closed());
        assert!(session.resolve(ticket, Ok(AssistOutput::Text("fresh".into()))));
    }

    #[test]
    fn test_failure_becomes_user_message() {
        let p = prospect("p1");
        let service = MockCompletionService::failing("connection reset by peer");
        let mut session = AssistSession::new();
        match session.run(&service, &AssistTask::Icebreaker(&p)) {
            AssistState::Failed(message) => {
                assert!(!message.contains("connection reset"));
                assert!(message.contains("try again"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_setup_failure_stays_in_panel() {
        let p = prospect("p1");
        let mut session = AssistSession::new();
        let service: Result<MockCompletionService, AssistError> =
            Err(AssistError::Http("TLS backend unavailable".into()));

        match session.run_with(service, &AssistTask::Research(&p)) {
            AssistState::Failed(message) => {
                assert!(!message.contains("TLS"));
                assert!(message.contains("try again"));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let state = session.run_with(Ok(MockCompletionService::replying("fine")), &AssistTask::Research(&p));
        assert_eq!(state, &AssistState::Ready(AssistOutput::Text("fine".into())));
    }

    #[test]
    fn test_prioritize_ignores_prospects_outside_columns() {
        let mut orphan = prospect("orphan");
        orphan.stage_id = "gone".to_string();
        let prospects = vec![prospect("p1"), orphan];
        let stages = vec![Stage::new("new", "New", 0)];
        let reply = r#"[
            {"prospectId":"orphan","score":99,"action":"Call","rationale":"Never listed"},
            {"prospectId":"p1","score":60,"action":"Email","rationale":"Listed"}
        ]"#;
        let service = CountingService::new(reply);
        let mut session = AssistSession::new();
        let task = AssistTask::Prioritize { prospects: &prospects, stages: &stages };

        match session.run(&service, &task) {
            AssistState::Ready(AssistOutput::Ranking(rows)) => {
                let ids: Vec<&str> = rows.iter().map(|r| r.prospect_id.as_str()).collect();
                assert_eq!(ids, vec!["p1"]);
            }
            other => panic!("expected ranking, got {:?}", other),
        }
        assert!(!service.prompts.borrow()[0].contains("orphan"));
    }

    #[test]
    fn test_prioritize_drops_unknown_and_keeps_order() {
        let prospects = vec![prospect("p1"), prospect("p2")];
        let stages = vec![Stage::new("new", "New", 0)];
        let reply = r#"[
            {"prospectId":"p2","score":88,"action":"Call","rationale":"Asked for a quote"},
            {"prospectId":"ghost","score":70,"action":"Email","rationale":"?"},
            {"prospectId":"p1","score":95,"action":"Visit","rationale":"Budget approved"}
        ]"#;
        let service = MockCompletionService::replying(reply);
        let mut session = AssistSession::new();
        let task = AssistTask::Prioritize { prospects: &prospects, stages: &stages };

        match session.run(&service, &task) {
            AssistState::Ready(AssistOutput::Ranking(rows)) => {
                let ids: Vec<&str> = rows.iter().map(|r| r.prospect_id.as_str()).collect();
                assert_eq!(ids, vec!["p2", "p1"]);
                assert_eq!(rows[1].score, 95.0);
            }
            other => panic!("expected ranking, got {:?}", other),
        }
    }

    #[test]
    fn test_prioritize_malformed_json_fails() {
        let prospects = vec![prospect("p1")];
        let stages = vec![Stage::new("new", "New", 0)];
        let service = MockCompletionService::replying("Sorry, I cannot rank these.");
        let mut session = AssistSession::new();
        let task = AssistTask::Prioritize { prospects: &prospects, stages: &stages };
        assert!(matches!(session.run(&service, &task), AssistState::Failed(_)));
    }

    #[test]
    fn test_blank_text_fails() {
        let p = prospect("p1");
        let service = MockCompletionService::replying("   \n");
        let mut session = AssistSession::new();
        assert!(matches!(session.run(&service, &AssistTask::Research(&p)), AssistState::Failed(_)));
    }
}
