use serde_json::Value;

use crate::common::get_handlebars;
use crate::errors::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
    SummarizeText,
    AnalyzeNotes,
    GlobalSearch,
    SearchExternalGrants,
    MatchResearchers,
    GrantEmail,
}

impl Prompt {
    pub fn name(&self) -> &'static str {
        match self {
            Prompt::SummarizeText => "summarize_text",
            Prompt::AnalyzeNotes => "analyze_notes",
            Prompt::GlobalSearch => "global_search",
            Prompt::SearchExternalGrants => "search_external_grants",
            Prompt::MatchResearchers => "match_researchers",
            Prompt::GrantEmail => "grant_email",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Prompt::SummarizeText => include_str!("prompts/summarize_text.hbs"),
            Prompt::AnalyzeNotes => include_str!("prompts/analyze_notes.hbs"),
            Prompt::GlobalSearch => include_str!("prompts/global_search.hbs"),
            Prompt::SearchExternalGrants => include_str!("prompts/search_external_grants.hbs"),
            Prompt::MatchResearchers => include_str!("prompts/match_researchers.hbs"),
            Prompt::GrantEmail => include_str!("prompts/grant_email.hbs"),
        }
    }
}

pub fn render(prompt: Prompt, context: &Value) -> CoreResult<String> {
    let handlebars = get_handlebars();
    handlebars
        .render_template(prompt.template(), context)
        .map_err(|e| {
            CoreError::internal(format!("Failed to render {} prompt: {}", prompt.name(), e))
        })
}
