//! Server-rendered analyzer page and its no-script form fallback.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Form,
};
use chrono::{Datelike, Utc};

use crate::state::AppState;
use crate::ui::controller::AnalyzeView;
use crate::ui::form::FormFields;
use crate::ui::notify::PageAlert;
use crate::ui::page::STYLESHEET;
use crate::ui::transport::LocalTransport;

fn view(state: &AppState) -> AnalyzeView<LocalTransport, PageAlert> {
    AnalyzeView::init(
        LocalTransport::new(state.analyzer.clone()),
        PageAlert::default(),
        Utc::now().year(),
    )
}

/// GET /
pub async fn handle_page(State(state): State<AppState>) -> Html<String> {
    Html(view(&state).page().to_html())
}

/// POST /analyze
///
/// Runs the same submit path as the CLI, in-process, and returns the page with
/// either the results or the alert filled in. Submitted values are kept.
pub async fn handle_form_submit(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Html<String> {
    let fields = FormFields::from_pairs(pairs);
    let mut view = view(&state);

    view.submit(fields.clone()).await;

    let (mut page, alerts) = view.into_parts();
    if let Some(message) = alerts.last() {
        page.show_alert(message);
    }
    page.fill_form(&fields);

    Html(page.to_html())
}

/// GET /static/style.css
pub async fn handle_stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
