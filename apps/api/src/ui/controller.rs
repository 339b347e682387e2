//! The analyzer view-controller.
//!
//! Owns the page, a transport, and a notifier. A submission moves the
//! controller from `Idle` to `Submitting` (submit control disabled, loading
//! style applied) and back to `Idle` once the request settles, whatever the
//! outcome. A submit that arrives while `Submitting` is ignored, which is the
//! only guard against duplicate requests.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::form::{FormFields, FormPayload};
use super::notify::Notifier;
use super::page::Page;
use super::renderer::render_results;
use super::transport::AnalysisTransport;
use super::SubmitError;
use crate::analysis::models::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

/// What a call to `submit` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Results were rendered; carries the number of competency cards.
    Rendered(usize),
    /// The user was notified with this message.
    Failed(String),
    /// A request was already in flight.
    Ignored,
}

pub struct AnalyzeView<T, N> {
    page: Page,
    transport: T,
    notifier: N,
    state: watch::Sender<SubmitState>,
}

impl<T, N> AnalyzeView<T, N>
where
    T: AnalysisTransport,
    N: Notifier,
{
    /// Builds the page and fills the footer year. Call once per page.
    pub fn init(transport: T, notifier: N, current_year: i32) -> Self {
        let mut page = Page::new();
        page.set_footer_year(current_year);
        let (state, _) = watch::channel(SubmitState::Idle);
        Self {
            page,
            transport,
            notifier,
            state,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    #[cfg(test)]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn state(&self) -> SubmitState {
        *self.state.borrow()
    }

    /// Observes state transitions.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    pub fn into_parts(self) -> (Page, N) {
        (self.page, self.notifier)
    }

    /// Handles one form submission end to end.
    pub async fn submit(&mut self, fields: FormFields) -> SubmitOutcome {
        if self.state() == SubmitState::Submitting {
            debug!("Submit ignored: a request is already in flight");
            return SubmitOutcome::Ignored;
        }

        self.enter_loading();

        let outcome = match self.request(&fields).await {
            Ok(result) => {
                render_results(&mut self.page, &result);
                info!(
                    "Rendered job role {} with {} competencies",
                    result.job_role_id,
                    result.competencies.len()
                );
                SubmitOutcome::Rendered(result.competencies.len())
            }
            Err(err) => {
                let message = err.to_string();
                warn!("Analysis request failed: {err:?}");
                self.notifier.alert(&message);
                SubmitOutcome::Failed(message)
            }
        };

        self.exit_loading();
        outcome
    }

    async fn request(&self, fields: &FormFields) -> Result<AnalysisResult, SubmitError> {
        let payload = FormPayload::from_fields(fields)?;
        self.transport.analyze(&payload).await
    }

    fn enter_loading(&mut self) {
        self.page.set_loading(true);
        self.state.send_replace(SubmitState::Submitting);
    }

    fn exit_loading(&mut self) {
        self.page.set_loading(false);
        self.state.send_replace(SubmitState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::CompetencyRecord;
    use crate::ui::notify::PageAlert;
    use crate::ui::page::LOADING_CLASS;
    use crate::ui::transport::HttpTransport;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records the controller state seen while the request is outstanding.
    struct ObservingTransport {
        observer: Mutex<Option<watch::Receiver<SubmitState>>>,
        seen: Arc<Mutex<Vec<SubmitState>>>,
        payloads: Arc<Mutex<Vec<serde_json::Value>>>,
        response: Result<AnalysisResult, SubmitError>,
    }

    impl ObservingTransport {
        fn new(response: Result<AnalysisResult, SubmitError>) -> Self {
            Self {
                observer: Mutex::new(None),
                seen: Arc::new(Mutex::new(Vec::new())),
                payloads: Arc::new(Mutex::new(Vec::new())),
                response,
            }
        }
    }

    #[async_trait]
    impl AnalysisTransport for ObservingTransport {
        async fn analyze(&self, payload: &FormPayload) -> Result<AnalysisResult, SubmitError> {
            if let Some(rx) = self.observer.lock().unwrap().as_ref() {
                self.seen.lock().unwrap().push(*rx.borrow());
            }
            self.payloads.lock().unwrap().push(payload.as_value());
            tokio::task::yield_now().await;
            self.response.clone()
        }
    }

    fn sample_result(n: usize) -> AnalysisResult {
        AnalysisResult {
            job_role_id: "role-1".to_string(),
            normalized_job_role_summary: "Summary".to_string(),
            competencies: (0..n)
                .map(|i| CompetencyRecord {
                    name: format!("Skill {i}"),
                    level: (i as i64 % 5) + 1,
                    kind: None,
                })
                .collect(),
        }
    }

    fn fields() -> FormFields {
        FormFields::from_pairs([
            ("job_title", "Engineer"),
            ("job_description", "Writes code"),
            ("years_of_experience", "5"),
        ])
    }

    fn view(
        transport: ObservingTransport,
    ) -> AnalyzeView<ObservingTransport, PageAlert> {
        let view = AnalyzeView::init(transport, PageAlert::default(), 2026);
        *view.transport.observer.lock().unwrap() = Some(view.subscribe());
        view
    }

    fn assert_idle(view: &AnalyzeView<ObservingTransport, PageAlert>) {
        assert_eq!(view.state(), SubmitState::Idle);
        let button = view.page().submit_button();
        assert!(!button.is_disabled());
        assert!(!button.has_class(LOADING_CLASS));
    }

    #[test]
    fn test_init_fills_footer_year() {
        let view = AnalyzeView::init(
            ObservingTransport::new(Ok(sample_result(0))),
            PageAlert::default(),
            2026,
        );
        assert_eq!(view.page().footer_year().text_content(), "2026");
        assert_eq!(view.state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_success_locks_during_request_and_renders() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(3))));
        let seen = view.transport.seen.clone();

        let outcome = view.submit(fields()).await;

        assert_eq!(outcome, SubmitOutcome::Rendered(3));
        assert_eq!(*seen.lock().unwrap(), vec![SubmitState::Submitting]);
        assert_idle(&view);
        assert_eq!(view.page().competency_list().children().count(), 3);
        assert!(view.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn test_failure_notifies_and_unlocks() {
        let mut view = view(ObservingTransport::new(Err(SubmitError::Rejected {
            status: 404,
            detail: "Role not found".to_string(),
        })));
        let seen = view.transport.seen.clone();

        let outcome = view.submit(fields()).await;

        assert_eq!(outcome, SubmitOutcome::Failed("Role not found".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec![SubmitState::Submitting]);
        assert_eq!(view.notifier().messages(), ["Role not found".to_string()]);
        assert_idle(&view);
        assert!(view.page().results().is_hidden());
    }

    #[tokio::test]
    async fn test_network_failure_unlocks() {
        let mut view = view(ObservingTransport::new(Err(SubmitError::Network(
            "connection refused".to_string(),
        ))));

        let outcome = view.submit(fields()).await;

        assert_eq!(outcome, SubmitOutcome::Failed("connection refused".to_string()));
        assert_idle(&view);
    }

    #[tokio::test]
    async fn test_invalid_years_never_reach_transport() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(1))));
        let payloads = view.transport.payloads.clone();
        let mut bad = fields();
        bad.insert("years_of_experience", "a lot");

        let outcome = view.submit(bad).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Failed("Years of experience must be a number.".to_string())
        );
        assert!(payloads.lock().unwrap().is_empty());
        assert_idle(&view);
    }

    #[tokio::test]
    async fn test_payload_carries_numeric_years() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(1))));
        let payloads = view.transport.payloads.clone();

        view.submit(fields()).await;

        let sent = payloads.lock().unwrap()[0].clone();
        assert_eq!(sent["years_of_experience"], serde_json::json!(5));
        assert!(sent["years_of_experience"].is_number());
    }

    #[tokio::test]
    async fn test_resubmission_replaces_cards() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(4))));
        view.submit(fields()).await;
        view.submit(fields()).await;
        assert_eq!(view.page().competency_list().children().count(), 4);
    }

    #[tokio::test]
    async fn test_submit_while_submitting_is_ignored() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(1))));
        view.enter_loading();

        assert_eq!(view.submit(fields()).await, SubmitOutcome::Ignored);
        assert!(view.transport.payloads.lock().unwrap().is_empty());
        assert!(view.page().submit_button().is_disabled());
    }

    #[tokio::test]
    async fn test_subscribers_see_both_transitions() {
        let mut view = view(ObservingTransport::new(Ok(sample_result(1))));
        let mut rx = view.subscribe();

        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                seen.push(state);
                if state == SubmitState::Idle {
                    break;
                }
            }
            seen
        });

        view.submit(fields()).await;

        assert_eq!(
            collector.await.unwrap(),
            vec![SubmitState::Submitting, SubmitState::Idle]
        );
    }

    #[tokio::test]
    async fn test_http_round_trip_against_live_server() {
        use axum::{routing::post, Json, Router};
        use serde_json::{json, Value};

        let router = Router::new().route(
            "/api/analyze",
            post(|Json(body): Json<Value>| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let years = body["years_of_experience"].as_i64().unwrap_or(-1);
                Json(json!({
                    "job_role_id": format!("years-{years}"),
                    "normalized_job_role_summary": "From server",
                    "competencies": [
                        {"name": "A", "level": 1},
                        {"name": "B", "level": 5, "type": "soft"}
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let mut view = AnalyzeView::init(
            HttpTransport::new(&format!("http://{addr}")),
            PageAlert::default(),
            2026,
        );
        let outcome = view.submit(fields()).await;

        assert_eq!(outcome, SubmitOutcome::Rendered(2));
        assert_eq!(view.page().role_id().text_content(), "years-5");
        assert_eq!(view.state(), SubmitState::Idle);
    }
}
