//! The analyzer page and the element slots the form handler and renderer work with.

use super::dom::Element;
use super::form::FormFields;

pub const FORM_ID: &str = "analyze-form";
pub const SUBMIT_ID: &str = "analyze-submit";
pub const RESULTS_ID: &str = "results";
pub const PLACEHOLDER_ID: &str = "results-placeholder";
pub const ROLE_ID_ID: &str = "role-id";
pub const ROLE_SUMMARY_ID: &str = "role-summary";
pub const COMPETENCY_LIST_ID: &str = "competency-list";
pub const FOOTER_YEAR_ID: &str = "footer-year";
pub const ALERT_ID: &str = "alert";

pub const LOADING_CLASS: &str = "button--loading";

pub const STYLESHEET: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6fa; color: #1f2430; }
.hero { padding: 2rem 1.5rem 1rem; }
.layout { display: grid; gap: 1.5rem; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); padding: 0 1.5rem 2rem; }
.panel { background: #fff; border-radius: 12px; padding: 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.field { display: flex; flex-direction: column; gap: .35rem; margin-bottom: 1rem; }
.field input, .field textarea { font: inherit; padding: .5rem .65rem; border: 1px solid #ccd; border-radius: 8px; }
.button { font: inherit; padding: .6rem 1.2rem; border: 0; border-radius: 8px; background: #3454d1; color: #fff; cursor: pointer; }
.button[disabled], .button--loading { opacity: .6; cursor: progress; }
.alert { background: #fdecea; color: #8a1c12; padding: .75rem 1rem; border-radius: 8px; margin-bottom: 1rem; }
.competency-card { border: 1px solid #e3e5ee; border-radius: 10px; padding: .75rem 1rem; margin-top: .75rem; }
.competency-card__name { font-weight: 600; }
.competency-card__meta { display: flex; justify-content: space-between; margin-top: .35rem; font-size: .9rem; color: #555b6e; }
.level-indicator { display: inline-flex; gap: 3px; margin-left: .5rem; vertical-align: middle; }
.level-indicator span { width: 8px; height: 8px; border-radius: 50%; background: #d5d8e4; }
.level-indicator span.is-active { background: #3454d1; }
footer { text-align: center; padding: 1rem; color: #777; }
"#;

/// The page as a set of owned element slots, assembled into a document on demand.
#[derive(Debug, Clone)]
pub struct Page {
    pub(super) form: Element,
    pub(super) submit_button: Element,
    pub(super) alert: Element,
    pub(super) placeholder: Element,
    pub(super) results: Element,
    pub(super) role_id: Element,
    pub(super) role_summary: Element,
    pub(super) competency_list: Element,
    pub(super) footer_year: Element,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Builds the initial page: empty form, placeholder visible, results hidden.
    pub fn new() -> Self {
        let form = Element::new("form")
            .with_id(FORM_ID)
            .with_attr("method", "post")
            .with_attr("action", "/analyze")
            .with_child(text_field("job_title", "Job title", "input"))
            .with_child(text_field("job_description", "Job description", "textarea"))
            .with_child(
                Element::new("label")
                    .with_class("field")
                    .with_child(Element::new("span").with_text("Years of experience"))
                    .with_child(
                        Element::new("input")
                            .with_attr("type", "number")
                            .with_attr("name", "years_of_experience")
                            .with_attr("min", "0")
                            .with_attr("required", "required"),
                    ),
            );

        Self {
            form,
            submit_button: Element::new("button")
                .with_id(SUBMIT_ID)
                .with_class("button")
                .with_attr("type", "submit")
                .with_attr("form", FORM_ID)
                .with_text("Analyze"),
            alert: Element::new("div")
                .with_id(ALERT_ID)
                .with_class("alert")
                .with_attr("role", "alert")
                .with_hidden(true),
            placeholder: Element::new("p")
                .with_id(PLACEHOLDER_ID)
                .with_text("Submit a job description to see its competencies."),
            results: Element::new("div").with_id(RESULTS_ID).with_hidden(true),
            role_id: Element::new("code").with_id(ROLE_ID_ID),
            role_summary: Element::new("p").with_id(ROLE_SUMMARY_ID),
            competency_list: Element::new("div").with_id(COMPETENCY_LIST_ID),
            footer_year: Element::new("span").with_id(FOOTER_YEAR_ID),
        }
    }

    pub(super) fn set_footer_year(&mut self, year: i32) {
        self.footer_year.set_text(&year.to_string());
    }

    pub(super) fn set_loading(&mut self, loading: bool) {
        if loading {
            self.submit_button.add_class(LOADING_CLASS);
        } else {
            self.submit_button.remove_class(LOADING_CLASS);
        }
        self.submit_button.set_disabled(loading);
    }

    /// Shows a message in the alert slot (the page's stand-in for a blocking dialog).
    pub fn show_alert(&mut self, message: &str) {
        self.alert.set_text(message);
        self.alert.set_hidden(false);
    }

    /// Writes submitted values back into the form controls so a re-rendered page keeps them.
    pub fn fill_form(&mut self, fields: &FormFields) {
        for (name, value) in fields.iter() {
            let Some(control) = self.form.find_mut(&|e| e.attr("name") == Some(name)) else {
                continue;
            };
            if control.tag() == "textarea" {
                control.set_text(value);
            } else {
                control.set_attr("value", value);
            }
        }
    }

    /// Assembles the full HTML document.
    pub fn to_html(&self) -> String {
        let form_panel = Element::new("section")
            .with_class("panel")
            .with_child(Element::new("h2").with_text("Describe the role"))
            .with_child(self.form.clone())
            .with_child(self.submit_button.clone());

        let mut results = self.results.clone();
        results.append_child(
            Element::new("p")
                .with_text("Role ID: ")
                .with_child(self.role_id.clone()),
        );
        results.append_child(self.role_summary.clone());
        results.append_child(Element::new("h3").with_text("Competencies"));
        results.append_child(self.competency_list.clone());

        let results_panel = Element::new("section")
            .with_class("panel")
            .with_child(Element::new("h2").with_text("Analysis"))
            .with_child(self.alert.clone())
            .with_child(self.placeholder.clone())
            .with_child(results);

        let head = Element::new("head")
            .with_child(Element::new("meta").with_attr("charset", "utf-8"))
            .with_child(
                Element::new("meta")
                    .with_attr("name", "viewport")
                    .with_attr("content", "width=device-width, initial-scale=1"),
            )
            .with_child(Element::new("title").with_text("Job Role Analyzer"))
            .with_child(
                Element::new("link")
                    .with_attr("rel", "stylesheet")
                    .with_attr("href", "/static/style.css"),
            );

        let body = Element::new("body")
            .with_child(
                Element::new("header")
                    .with_class("hero")
                    .with_child(Element::new("h1").with_text("Job Role Analyzer"))
                    .with_child(Element::new("p").with_text(
                        "Normalize a job description and see the competencies it calls for.",
                    )),
            )
            .with_child(
                Element::new("main")
                    .with_class("layout")
                    .with_child(form_panel)
                    .with_child(results_panel),
            )
            .with_child(
                Element::new("footer")
                    .with_text("© ")
                    .with_child(self.footer_year.clone())
                    .with_text(" Job Role Analyzer"),
            );

        let html = Element::new("html")
            .with_attr("lang", "en")
            .with_child(head)
            .with_child(body);

        format!("<!DOCTYPE html>\n{}", html.to_html())
    }

    /// Terminal rendering of the results area.
    pub fn results_as_text(&self) -> String {
        if self.results.is_hidden() {
            return self.placeholder.text_content();
        }

        let mut out = format!(
            "Role ID: {}\n\n{}\n\nCompetencies:\n",
            self.role_id.text_content(),
            self.role_summary.text_content()
        );

        for card in self.competency_list.children() {
            let name = card
                .find_by_class("competency-card__name")
                .map(Element::text_content)
                .unwrap_or_default();
            let level = card.find_by_class("competency-card__level");
            let label = level.map(Element::own_text).unwrap_or_default();
            let dots: String = card
                .find_by_class("level-indicator")
                .map(|indicator| {
                    indicator
                        .children()
                        .map(|dot| if dot.has_class("is-active") { '●' } else { '○' })
                        .collect()
                })
                .unwrap_or_default();
            let kind = card
                .find_by_class("competency-card__meta")
                .and_then(|meta| meta.children().nth(1))
                .map(Element::text_content)
                .unwrap_or_default();

            out.push_str(&format!("  - {name}\n      {label} {dots}  {kind}\n"));
        }
        out
    }
}

fn text_field(name: &str, label: &str, tag: &str) -> Element {
    let mut control = Element::new(tag)
        .with_attr("name", name)
        .with_attr("required", "required");
    if tag == "input" {
        control.set_attr("type", "text");
    } else {
        control.set_attr("rows", "8");
    }
    Element::new("label")
        .with_class("field")
        .with_child(Element::new("span").with_text(label))
        .with_child(control)
}

/// Read access to the slots, for assertions.
#[cfg(test)]
impl Page {
    pub fn submit_button(&self) -> &Element {
        &self.submit_button
    }

    pub fn results(&self) -> &Element {
        &self.results
    }

    pub fn placeholder(&self) -> &Element {
        &self.placeholder
    }

    pub fn role_id(&self) -> &Element {
        &self.role_id
    }

    pub fn role_summary(&self) -> &Element {
        &self.role_summary
    }

    pub fn competency_list(&self) -> &Element {
        &self.competency_list
    }

    pub fn footer_year(&self) -> &Element {
        &self.footer_year
    }

    pub fn alert(&self) -> &Element {
        &self.alert
    }
}
