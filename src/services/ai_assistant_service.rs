//! AI-assisted text operations over the research records
//!
//! Each operation renders a prompt, sends it to the injected
//! [`TextGenerator`] and checks the decoded answer before returning it.
//! A top-level shape mismatch is an upstream failure; individual list items
//! that lack required keys are dropped.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::ai::{parse_json_response, render_prompt, Prompt, TextGenerator};
use crate::common::truncate_chars;
use crate::database::entities::{compute_resources, grants, labs, notes, projects, researchers};
use crate::errors::{AiServiceError, CoreError, CoreResult};
use crate::services::graph_consistency::require_researcher;
use crate::services::validation::ValidationService;
use crate::services::views::{
    ComputeResourceView, GrantView, LabView, NoteView, ProjectView, ResearcherView,
};

const MAX_INPUT_LEN: usize = 100_000;
const MATCH_CANDIDATES: u64 = 10;
const RESEARCH_SUMMARY_LEN: usize = 200;
pub const SENTIMENTS: [&str; 5] = ["Positive", "Negative", "Neutral", "Mixed", "Unknown"];

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SummarizeTextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TextSummary {
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeNotesRequest {
    pub notes_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotesAnalysis {
    pub sentiment: String,
    pub key_themes: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GlobalSearchRequest {
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub match_context: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantSearchCriteria {
    pub keywords: Option<String>,
    pub focus_area: Option<String>,
    /// Free-form: a number or a range such as "50k-100k"
    #[schema(value_type = Option<String>)]
    pub funding_amount: Option<Value>,
    pub eligibility: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalGrantSearchRequest {
    pub search_criteria: Option<GrantSearchCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalGrant {
    pub id: String,
    pub title: String,
    pub agency: String,
    pub description: String,
    pub amount: String,
    pub submission_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub award_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResearchersRequest {
    pub grant_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherMatch {
    pub original_id: String,
    pub name: String,
    pub match_reason: String,
    pub research: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResearcherMatches {
    pub matches: Vec<ResearcherMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailGrantDetails {
    pub title: Option<String>,
    pub agency: Option<String>,
    pub description: Option<String>,
    pub submission_date: Option<String>,
    pub award_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantEmailRequest {
    pub grant: Option<EmailGrantDetails>,
    pub pi_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct AiAssistantService {
    db: DatabaseConnection,
    generator: Arc<dyn TextGenerator>,
}

impl AiAssistantService {
    pub fn new(db: DatabaseConnection, generator: Arc<dyn TextGenerator>) -> Self {
        Self { db, generator }
    }

    async fn ask(&self, prompt: Prompt, context: Value) -> CoreResult<String> {
        let rendered = render_prompt(prompt, &context)?;
        debug!("Sending {} prompt ({} chars)", prompt.name(), rendered.len());
        let answer = self.generator.generate(&rendered).await?;
        Ok(answer)
    }

    async fn ask_json(&self, prompt: Prompt, context: Value) -> CoreResult<Value> {
        let answer = self.ask(prompt, context).await?;
        Ok(parse_json_response(&answer)?)
    }

    pub async fn summarize_text(&self, request: SummarizeTextRequest) -> CoreResult<TextSummary> {
        let text = ValidationService::required_text("text", request.text.as_deref(), MAX_INPUT_LEN)?;
        let answer = self
            .ask(Prompt::SummarizeText, json!({ "text": text }))
            .await?;
        let summary = answer.trim();
        if summary.is_empty() {
            return Err(AiServiceError::EmptyResponse.into());
        }
        Ok(TextSummary {
            summary: summary.to_string(),
        })
    }

    pub async fn analyze_notes(&self, request: AnalyzeNotesRequest) -> CoreResult<NotesAnalysis> {
        let notes_text =
            ValidationService::required_text("notesText", request.notes_text.as_deref(), MAX_INPUT_LEN)?;
        let value = self
            .ask_json(Prompt::AnalyzeNotes, json!({ "notes_text": notes_text }))
            .await?;
        let analysis = notes_analysis_from_value(&value)?;
        if !SENTIMENTS.contains(&analysis.sentiment.as_str()) {
            warn!(
                "AI returned unexpected sentiment '{}'; passing it through",
                analysis.sentiment
            );
        }
        Ok(analysis)
    }

    pub async fn global_search(&self, request: GlobalSearchRequest) -> CoreResult<Vec<SearchHit>> {
        let query = ValidationService::required_text("query", request.query.as_deref(), 1000)?;
        let context = self.search_context(&query).await?;
        let value = self.ask_json(Prompt::GlobalSearch, context).await?;
        let hits = items_of(&value, "global search")?
            .iter()
            .filter_map(|item| {
                let hit = search_hit_from_value(item);
                if hit.is_none() {
                    warn!("Dropping malformed global search item: {}", item);
                }
                hit
            })
            .collect::<Vec<_>>();
        info!("Global search for '{}' returned {} item(s)", query, hits.len());
        Ok(hits)
    }

    /// The first few records of every kind, as shown to the collaborator.
    async fn search_context(&self, query: &str) -> CoreResult<Value> {
        let researchers: Vec<ResearcherView> = researchers::Entity::find()
            .order_by_asc(researchers::Column::Id)
            .limit(5)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let labs: Vec<LabView> = labs::Entity::find()
            .order_by_asc(labs::Column::Id)
            .limit(5)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let projects: Vec<ProjectView> = projects::Entity::find()
            .order_by_asc(projects::Column::Id)
            .limit(5)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let compute_resources: Vec<ComputeResourceView> = compute_resources::Entity::find()
            .order_by_asc(compute_resources::Column::Id)
            .limit(3)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let grants: Vec<GrantView> = grants::Entity::find()
            .order_by_asc(grants::Column::Id)
            .limit(3)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let notes: Vec<NoteView> = notes::Entity::find()
            .order_by_asc(notes::Column::Id)
            .limit(10)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(json!({
            "query": query,
            "researchers": researchers,
            "labs": labs,
            "projects": projects,
            "compute_resources": compute_resources,
            "grants": grants,
            "notes": notes,
        }))
    }

    pub async fn search_external_grants(
        &self,
        request: ExternalGrantSearchRequest,
    ) -> CoreResult<Vec<ExternalGrant>> {
        let criteria = request.search_criteria.ok_or_else(|| {
            CoreError::invalid_field("searchCriteria", "searchCriteria is required")
        })?;
        let keywords = ValidationService::optional_text("keywords", criteria.keywords.as_deref(), 500)?;
        let focus_area =
            ValidationService::optional_text("focusArea", criteria.focus_area.as_deref(), 500)?;
        if keywords.is_none() && focus_area.is_none() {
            return Err(CoreError::invalid_field(
                "searchCriteria",
                "searchCriteria needs at least one of keywords or focusArea",
            ));
        }
        let funding_amount = criteria.funding_amount.as_ref().and_then(text_of);
        let eligibility =
            ValidationService::optional_text("eligibility", criteria.eligibility.as_deref(), 500)?;

        let value = self
            .ask_json(
                Prompt::SearchExternalGrants,
                json!({
                    "keywords": keywords,
                    "focus_area": focus_area,
                    "funding_amount": funding_amount,
                    "eligibility": eligibility,
                }),
            )
            .await?;
        let grants = items_of(&value, "external grant search")?
            .iter()
            .filter_map(|item| {
                let grant = external_grant_from_value(item);
                if grant.is_none() {
                    warn!("Dropping malformed external grant item: {}", item);
                }
                grant
            })
            .collect::<Vec<_>>();
        info!("External grant search returned {} opportunity(ies)", grants.len());
        Ok(grants)
    }

    pub async fn match_researchers(
        &self,
        request: MatchResearchersRequest,
    ) -> CoreResult<ResearcherMatches> {
        let grant_description = ValidationService::required_text(
            "grantDescription",
            request.grant_description.as_deref(),
            MAX_INPUT_LEN,
        )?;

        let candidates = researchers::Entity::find()
            .order_by_asc(researchers::Column::Id)
            .limit(MATCH_CANDIDATES)
            .all(&self.db)
            .await?;
        if candidates.is_empty() {
            return Ok(ResearcherMatches {
                matches: Vec::new(),
                message: Some("No researchers available to match against".to_string()),
            });
        }

        let researchers: Vec<Value> = candidates
            .iter()
            .map(|r| {
                json!({
                    "id": r.id.to_string(),
                    "name": r.name,
                    "department": r.department,
                    "research": research_summary(r.bio.as_deref()),
                })
            })
            .collect();
        let value = self
            .ask_json(
                Prompt::MatchResearchers,
                json!({ "grant_description": grant_description, "researchers": researchers }),
            )
            .await?;
        let matches = items_of(&value, "researcher matching")?
            .iter()
            .filter_map(|item| {
                let matched = researcher_match_from_value(item);
                if matched.is_none() {
                    warn!("Dropping malformed researcher match item: {}", item);
                }
                matched
            })
            .collect::<Vec<_>>();
        let message = matches
            .is_empty()
            .then(|| "No suitable researchers found".to_string());
        Ok(ResearcherMatches { matches, message })
    }

    pub async fn generate_grant_email(&self, request: GrantEmailRequest) -> CoreResult<EmailDraft> {
        let grant = request
            .grant
            .ok_or_else(|| CoreError::invalid_field("grant", "grant is required"))?;
        let title = ValidationService::required_text("grant.title", grant.title.as_deref(), 300)?;
        let pi_id = ValidationService::required_id("piId", request.pi_id)?;
        let pi = require_researcher(&self.db, pi_id).await?;

        let value = self
            .ask_json(
                Prompt::GrantEmail,
                json!({
                    "grant": {
                        "title": title,
                        "agency": grant.agency.unwrap_or_else(|| "N/A".to_string()),
                        "description": grant.description.unwrap_or_else(|| "N/A".to_string()),
                        "submissionDate": grant.submission_date,
                        "awardNumber": grant.award_number,
                    },
                    "pi": {
                        "name": pi.name,
                        "email": pi.email,
                        "department": pi.department,
                        "research": pi.bio,
                    }
                }),
            )
            .await?;
        email_draft_from_value(&value)
    }
}

fn research_summary(bio: Option<&str>) -> String {
    let bio = bio.unwrap_or_default();
    if bio.chars().count() > RESEARCH_SUMMARY_LEN {
        format!("{}...", truncate_chars(bio, RESEARCH_SUMMARY_LEN - 3))
    } else {
        bio.to_string()
    }
}

fn items_of<'a>(value: &'a Value, operation: &str) -> Result<&'a Vec<Value>, AiServiceError> {
    value.as_array().ok_or_else(|| {
        AiServiceError::InvalidShape(format!(
            "{} response is not a JSON array",
            operation
        ))
    })
}

/// Strings as-is, numbers rendered; anything else is not text.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(text_of)
}

fn notes_analysis_from_value(value: &Value) -> Result<NotesAnalysis, AiServiceError> {
    let object = value
        .as_object()
        .ok_or_else(|| AiServiceError::InvalidShape("notes analysis is not a JSON object".into()))?;
    let missing: Vec<&str> = ["sentiment", "keyThemes", "summary"]
        .into_iter()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(AiServiceError::InvalidShape(format!(
            "notes analysis is missing {}",
            missing.join(", ")
        )));
    }
    let key_themes = object
        .get("keyThemes")
        .and_then(Value::as_array)
        .ok_or_else(|| AiServiceError::InvalidShape("keyThemes is not an array".into()))?
        .iter()
        .map(|theme| {
            theme
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| AiServiceError::InvalidShape("keyThemes must contain strings".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let sentiment = field(object, "sentiment")
        .ok_or_else(|| AiServiceError::InvalidShape("sentiment is not a string".into()))?;
    let summary = field(object, "summary")
        .ok_or_else(|| AiServiceError::InvalidShape("summary is not a string".into()))?;

    Ok(NotesAnalysis {
        sentiment,
        key_themes,
        summary,
    })
}

fn search_hit_from_value(value: &Value) -> Option<SearchHit> {
    let object = value.as_object()?;
    Some(SearchHit {
        id: field(object, "id")?,
        kind: field(object, "type")?,
        name: field(object, "name")?,
        match_context: field(object, "matchContext")?,
    })
}

fn external_grant_from_value(value: &Value) -> Option<ExternalGrant> {
    let object = value.as_object()?;
    Some(ExternalGrant {
        id: field(object, "id")?,
        title: field(object, "title")?,
        agency: field(object, "agency")?,
        description: field(object, "description")?,
        amount: field(object, "amount")?,
        submission_date: field(object, "submissionDate")?,
        award_number: field(object, "awardNumber"),
        url: field(object, "url"),
    })
}

fn researcher_match_from_value(value: &Value) -> Option<ResearcherMatch> {
    let object = value.as_object()?;
    Some(ResearcherMatch {
        original_id: field(object, "originalId")?,
        name: field(object, "name")?,
        match_reason: field(object, "matchReason")?,
        research: field(object, "research").unwrap_or_default(),
    })
}

fn email_draft_from_value(value: &Value) -> CoreResult<EmailDraft> {
    let object = value
        .as_object()
        .ok_or_else(|| AiServiceError::InvalidShape("email draft is not a JSON object".into()))?;
    match (object.get("subject"), object.get("body")) {
        (Some(Value::String(subject)), Some(Value::String(body))) => Ok(EmailDraft {
            subject: subject.clone(),
            body: body.clone(),
        }),
        _ => Err(AiServiceError::InvalidShape(
            "email draft needs string 'subject' and 'body'".into(),
        )
        .into()),
    }
}
