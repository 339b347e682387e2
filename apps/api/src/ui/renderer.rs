//! Result renderer: fills the results area from an analysis result.

use super::dom::Element;
use super::page::Page;
use crate::analysis::models::{AnalysisResult, CompetencyRecord, DEFAULT_COMPETENCY_TYPE, MAX_LEVEL, MIN_LEVEL};

pub const LEVEL_DOTS: i64 = MAX_LEVEL;
pub const ACTIVE_DOT_CLASS: &str = "is-active";

/// Shows the results area, writes the role slots, and replaces the competency cards.
pub fn render_results(page: &mut Page, result: &AnalysisResult) {
    page.placeholder.set_hidden(true);
    page.results.set_hidden(false);
    page.role_id.set_text(&result.job_role_id);
    page.role_summary.set_text(&result.normalized_job_role_summary);

    page.competency_list.clear_children();
    for competency in &result.competencies {
        page.competency_list.append_child(competency_card(competency));
    }
}

/// One card: name, "Level N" with a five-dot indicator, and the type label.
///
/// Levels outside 1..=5 are clamped for both the label and the indicator.
pub fn competency_card(competency: &CompetencyRecord) -> Element {
    let level = competency.level.clamp(MIN_LEVEL, MAX_LEVEL);

    let mut indicator = Element::new("span").with_class("level-indicator");
    for position in 1..=LEVEL_DOTS {
        let mut dot = Element::new("span");
        if position <= level {
            dot.add_class(ACTIVE_DOT_CLASS);
        }
        indicator.append_child(dot);
    }

    let level_label = Element::new("span")
        .with_class("competency-card__level")
        .with_text(&format!("Level {level}"))
        .with_child(indicator);

    let kind = competency
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_COMPETENCY_TYPE);

    let meta = Element::new("div")
        .with_class("competency-card__meta")
        .with_child(level_label)
        .with_child(Element::new("span").with_text(kind));

    Element::new("div")
        .with_class("competency-card")
        .with_child(
            Element::new("div")
                .with_class("competency-card__name")
                .with_text(&competency.name),
        )
        .with_child(meta)
}
