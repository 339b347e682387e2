// LLM prompt templates for job role analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Prompt that rewrites a raw job description into a normalized summary.
/// Replace: {job_title}, {years_of_experience}, {job_description}, {format_instruction}
pub const NORMALIZE_JD_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter.

Rewrite the job description below as a concise, neutral summary of the role
(3 to 5 sentences). Remove company marketing, benefits, and legal boilerplate.
Keep the responsibilities, the seniority implied by the experience requirement,
and the core technical and interpersonal expectations.

{format_instruction}

JOB TITLE: {job_title}
YEARS OF EXPERIENCE: {years_of_experience}

JOB DESCRIPTION:
{job_description}"#;

/// Prompt that extracts the competency list for a normalized role.
/// Replace: {job_title}, {years_of_experience}, {normalized_summary},
///          {job_description}, {max_competencies}, {format_instruction}
pub const EXTRACT_COMPETENCIES_PROMPT_TEMPLATE: &str = r#"You are an expert in competency modelling.

List the competencies a person needs to succeed in the role below, at most
{max_competencies} of them, most important first.

Return a JSON ARRAY with this EXACT schema:
[
  {"name": "System Design", "level": 4, "type": "technical"}
]

Rules:
- `level` is an integer from 1 (awareness) to 5 (expert), calibrated to the years of experience
- `type` is "technical" or "soft"
- `name` is a short noun phrase, no trailing punctuation

{format_instruction}

JOB TITLE: {job_title}
YEARS OF EXPERIENCE: {years_of_experience}

ROLE SUMMARY:
{normalized_summary}

ORIGINAL JOB DESCRIPTION:
{job_description}"#;

/// Fills `{name}` placeholders in a template in a single pass.
///
/// Only placeholders in the template itself are substituted; braces inside
/// inserted values are copied through untouched. Unknown names (and JSON
/// examples such as `{"name": ...}`) are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let out = render("{a} and {a} but {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x but y");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{missing}", &[("a", "x")]), "{missing}");
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_values() {
        let description = "Literal {max_competencies} and {format_instruction} in JD";
        let summary = "Summary quoting {job_description}";
        let out = render(
            EXTRACT_COMPETENCIES_PROMPT_TEMPLATE,
            &[
                ("job_title", "Engineer"),
                ("normalized_summary", summary),
                ("years_of_experience", "3"),
                ("job_description", description),
                ("max_competencies", "5"),
                ("format_instruction", "FMT"),
            ],
        );

        assert!(out.ends_with(description));
        assert!(out.contains(summary));
        assert!(out.contains("at most\n5 of them"));
        assert!(out.contains(r#"{"name": "System Design", "level": 4, "type": "technical"}"#));
    }

    #[test]
    fn test_render_handles_unclosed_brace() {
        assert_eq!(render("a { b {a}", &[("a", "x")]), "a { b x");
    }

    #[test]
    fn test_competency_template_names_all_placeholders() {
        for key in [
            "{job_title}",
            "{years_of_experience}",
            "{normalized_summary}",
            "{job_description}",
            "{max_competencies}",
            "{format_instruction}",
        ] {
            assert!(EXTRACT_COMPETENCIES_PROMPT_TEMPLATE.contains(key), "{key}");
        }
    }
}
