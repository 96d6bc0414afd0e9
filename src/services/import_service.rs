//! Full-graph restore from a [`Snapshot`]
//!
//! One import runs in a single transaction through six ordered phases:
//! validate, detach, purge, create, link and commit. Any failure rolls the
//! transaction back, so the store is either fully replaced or untouched.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::database::entities::{
    compute_resources, grant_co_pis, grants, labs, notes, project_compute_resources,
    project_grants, project_labs, projects, researchers,
};
use crate::errors::{CoreError, CoreResult};
use crate::services::compute_resource_service;
use crate::services::grant_service;
use crate::services::graph_consistency::{self, EntityKind};
use crate::services::identity_mapper::IdentityMapper;
use crate::services::snapshot::{
    ComputeResourceRecord, ExternalId, GrantRecord, ImportCounts, ImportSummary, LabRecord,
    ProjectRecord, ResearcherRecord, Snapshot,
};
use crate::services::validation::ValidationService;

/// The five collections, borrowed once validation has proven they exist.
struct Collections<'a> {
    researchers: &'a [ResearcherRecord],
    labs: &'a [LabRecord],
    projects: &'a [ProjectRecord],
    compute_resources: &'a [ComputeResourceRecord],
    grants: &'a [GrantRecord],
}

#[derive(Clone)]
pub struct ImportService {
    db: DatabaseConnection,
}

impl ImportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn import(&self, snapshot: &Snapshot) -> CoreResult<ImportSummary> {
        let collections = validate(snapshot)?;

        let txn = self.db.begin().await?;
        match rebuild(&txn, &collections).await {
            Ok(created) => {
                txn.commit().await?;
                info!(
                    "Imported snapshot: {} researchers, {} labs, {} projects, {} compute resources, {} grants, {} notes",
                    created.researchers,
                    created.labs,
                    created.projects,
                    created.compute_resources,
                    created.grants,
                    created.notes
                );
                Ok(ImportSummary {
                    message: "Data imported successfully".to_string(),
                    created,
                })
            }
            Err(err) => {
                warn!("Import aborted, rolling back: {}", err);
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    pub async fn import_json(&self, json: &str) -> CoreResult<ImportSummary> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.import(&snapshot).await
    }
}

async fn rebuild<C: ConnectionTrait>(
    conn: &C,
    collections: &Collections<'_>,
) -> CoreResult<ImportCounts> {
    detach(conn).await?;
    purge(conn).await?;

    let mut mapper = IdentityMapper::new();
    create(conn, collections, &mut mapper).await?;
    let notes = link(conn, collections, &mut mapper).await?;

    Ok(ImportCounts {
        researchers: mapper.count(EntityKind::Researcher),
        labs: mapper.count(EntityKind::Lab),
        projects: mapper.count(EntityKind::Project),
        compute_resources: mapper.count(EntityKind::ComputeResource),
        grants: mapper.count(EntityKind::Grant),
        notes,
    })
}

fn validate(snapshot: &Snapshot) -> CoreResult<Collections<'_>> {
    let missing: Vec<&str> = [
        ("researchers", snapshot.researchers.is_none()),
        ("labs", snapshot.labs.is_none()),
        ("projects", snapshot.projects.is_none()),
        ("computeResources", snapshot.compute_resources.is_none()),
        ("grants", snapshot.grants.is_none()),
    ]
    .into_iter()
    .filter_map(|(key, absent)| absent.then_some(key))
    .collect();

    match (
        &snapshot.researchers,
        &snapshot.labs,
        &snapshot.projects,
        &snapshot.compute_resources,
        &snapshot.grants,
    ) {
        (Some(researchers), Some(labs), Some(projects), Some(compute_resources), Some(grants)) => {
            let collections = Collections {
                researchers,
                labs,
                projects,
                compute_resources,
                grants,
            };
            check_unique_ids(&collections)?;
            Ok(collections)
        }
        _ => Err(CoreError::validation(format!(
            "Invalid snapshot: missing top-level collection(s): {}",
            missing.join(", ")
        ))
        .with_field("missing", missing.join(","))),
    }
}

fn check_unique_ids(collections: &Collections<'_>) -> CoreResult<()> {
    fn unique<'a>(
        kind: EntityKind,
        ids: impl Iterator<Item = &'a ExternalId>,
    ) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(CoreError::validation(format!(
                    "Duplicate {} id '{}' in snapshot",
                    kind, id
                ))
                .with_field("entity", kind.label())
                .with_field("id", id.as_str()));
            }
        }
        Ok(())
    }

    unique(EntityKind::Researcher, collections.researchers.iter().map(|r| &r.id))?;
    unique(EntityKind::Lab, collections.labs.iter().map(|l| &l.id))?;
    unique(EntityKind::Project, collections.projects.iter().map(|p| &p.id))?;
    unique(
        EntityKind::ComputeResource,
        collections.compute_resources.iter().map(|c| &c.id),
    )?;
    unique(EntityKind::Grant, collections.grants.iter().map(|g| &g.id))?;
    unique(
        EntityKind::Note,
        collections
            .researchers
            .iter()
            .flat_map(|r| r.notes.iter().map(|n| &n.id)),
    )
}

/// Clears every association row and nullable cross-reference.
async fn detach<C: ConnectionTrait>(conn: &C) -> CoreResult<()> {
    project_labs::Entity::delete_many().exec(conn).await?;
    project_compute_resources::Entity::delete_many().exec(conn).await?;
    project_grants::Entity::delete_many().exec(conn).await?;
    grant_co_pis::Entity::delete_many().exec(conn).await?;
    labs::Entity::update_many()
        .col_expr(
            labs::Column::PrincipalInvestigatorId,
            Expr::value(Option::<i32>::None),
        )
        .exec(conn)
        .await?;
    researchers::Entity::update_many()
        .col_expr(researchers::Column::LabId, Expr::value(Option::<i32>::None))
        .exec(conn)
        .await?;
    debug!("Import: detached existing graph");
    Ok(())
}

async fn purge<C: ConnectionTrait>(conn: &C) -> CoreResult<()> {
    notes::Entity::delete_many().exec(conn).await?;
    projects::Entity::delete_many().exec(conn).await?;
    grants::Entity::delete_many().exec(conn).await?;
    compute_resources::Entity::delete_many().exec(conn).await?;
    labs::Entity::delete_many().exec(conn).await?;
    researchers::Entity::delete_many().exec(conn).await?;
    debug!("Import: purged existing graph");
    Ok(())
}

fn record(kind: EntityKind, id: &ExternalId) -> String {
    format!("{} '{}'", kind, id)
}

/// Inserts the kinds with no required references and records their ids.
async fn create<C: ConnectionTrait>(
    conn: &C,
    collections: &Collections<'_>,
    mapper: &mut IdentityMapper,
) -> CoreResult<()> {
    for r in collections.researchers {
        let owner = record(EntityKind::Researcher, &r.id);
        let model = researcher_model(r).map_err(|e| e.in_context(&owner))?;
        let inserted = model.insert(conn).await?;
        mapper.register(EntityKind::Researcher, r.id.as_str(), inserted.id)?;
    }

    for l in collections.labs {
        let owner = record(EntityKind::Lab, &l.id);
        let name = ValidationService::required_text("name", l.name.as_deref(), 100)
            .map_err(|e| e.in_context(&owner))?;
        let description =
            ValidationService::optional_text("description", l.description.as_deref(), 5000)
                .map_err(|e| e.in_context(&owner))?;
        let inserted = labs::ActiveModel {
            name: Set(name),
            description: Set(description),
            principal_investigator_id: Set(None),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        mapper.register(EntityKind::Lab, l.id.as_str(), inserted.id)?;
    }

    for c in collections.compute_resources {
        let owner = record(EntityKind::ComputeResource, &c.id);
        let model = compute_resource_model(c).map_err(|e| e.in_context(&owner))?;
        let inserted = model.insert(conn).await?;
        mapper.register(EntityKind::ComputeResource, c.id.as_str(), inserted.id)?;
    }

    debug!("Import: created researchers, labs and compute resources");
    Ok(())
}

fn researcher_model(r: &ResearcherRecord) -> CoreResult<researchers::ActiveModel> {
    Ok(researchers::ActiveModel {
        name: Set(ValidationService::required_text("name", r.name.as_deref(), 100)?),
        email: Set(ValidationService::email(r.email.as_deref())?),
        department: Set(ValidationService::required_text(
            "department",
            r.department.as_deref(),
            120,
        )?),
        bio: Set(ValidationService::optional_text("bio", r.bio.as_deref(), 5000)?),
        lab_id: Set(None),
        ..Default::default()
    })
}

fn compute_resource_model(c: &ComputeResourceRecord) -> CoreResult<compute_resources::ActiveModel> {
    let resource_type = compute_resource_service::parse_type(c.resource_type.as_deref())?;
    let status = compute_resource_service::parse_status(c.status.as_deref())?;
    Ok(compute_resources::ActiveModel {
        name: Set(ValidationService::required_text("name", c.name.as_deref(), 200)?),
        resource_type: Set(resource_type.as_str().to_string()),
        description: Set(c.description.clone()),
        specification: Set(ValidationService::required_text(
            "specification",
            c.specification.as_deref(),
            10_000,
        )?),
        status: Set(status.as_str().to_string()),
        cluster_type: Set(c.cluster_type.clone()),
        nodes: Set(ValidationService::optional_count("nodes", c.nodes)?),
        cpus_per_node: Set(ValidationService::optional_count("cpusPerNode", c.cpus_per_node)?),
        gpus_per_node: Set(ValidationService::optional_count("gpusPerNode", c.gpus_per_node)?),
        memory_per_node: Set(c.memory_per_node.clone()),
        storage_per_node: Set(c.storage_per_node.clone()),
        network_bandwidth: Set(c.network_bandwidth.clone()),
        ..Default::default()
    })
}

/// Resolves every reference through the mapper. Returns the number of notes.
async fn link<C: ConnectionTrait>(
    conn: &C,
    collections: &Collections<'_>,
    mapper: &mut IdentityMapper,
) -> CoreResult<usize> {
    for l in collections.labs {
        let owner = record(EntityKind::Lab, &l.id);
        let pi = mapper.resolve_optional(
            EntityKind::Researcher,
            l.principal_investigator_id.as_ref().map(ExternalId::as_str),
            &owner,
        )?;
        if let (Some(pi), Some(lab_id)) = (pi, mapper.lookup(EntityKind::Lab, l.id.as_str())) {
            labs::ActiveModel {
                id: Set(lab_id),
                principal_investigator_id: Set(Some(pi)),
                ..Default::default()
            }
            .update(conn)
            .await?;
        }
    }

    for r in collections.researchers {
        let owner = record(EntityKind::Researcher, &r.id);
        let lab = mapper.resolve_optional(
            EntityKind::Lab,
            r.lab_id.as_ref().map(ExternalId::as_str),
            &owner,
        )?;
        if let (Some(lab), Some(researcher_id)) =
            (lab, mapper.lookup(EntityKind::Researcher, r.id.as_str()))
        {
            researchers::ActiveModel {
                id: Set(researcher_id),
                lab_id: Set(Some(lab)),
                ..Default::default()
            }
            .update(conn)
            .await?;
        }
    }

    for p in collections.projects {
        let owner = record(EntityKind::Project, &p.id);
        let model = project_model(p, mapper, &owner)?;
        let inserted = model.insert(conn).await?;
        mapper.register(EntityKind::Project, p.id.as_str(), inserted.id)?;
    }

    for g in collections.grants {
        let owner = record(EntityKind::Grant, &g.id);
        let model = grant_model(g, mapper, &owner)?;
        let inserted = model.insert(conn).await?;
        mapper.register(EntityKind::Grant, g.id.as_str(), inserted.id)?;
    }

    for p in collections.projects {
        let owner = record(EntityKind::Project, &p.id);
        let project_id = mapper.resolve(EntityKind::Project, p.id.as_str(), &owner)?;
        let lab_ids = mapper.resolve_all(EntityKind::Lab, &p.lab_ids, &owner)?;
        let resource_ids =
            mapper.resolve_all(EntityKind::ComputeResource, &p.compute_resource_ids, &owner)?;
        let grant_ids = mapper.resolve_all(EntityKind::Grant, &p.grant_ids, &owner)?;
        graph_consistency::replace_project_labs(conn, project_id, &lab_ids).await?;
        graph_consistency::replace_project_compute_resources(conn, project_id, &resource_ids)
            .await?;
        graph_consistency::replace_project_grants(conn, project_id, &grant_ids).await?;
    }

    for g in collections.grants {
        let owner = record(EntityKind::Grant, &g.id);
        let grant_id = mapper.resolve(EntityKind::Grant, g.id.as_str(), &owner)?;
        let co_pi_ids = mapper.resolve_all(EntityKind::Researcher, &g.co_pi_ids, &owner)?;
        graph_consistency::replace_grant_co_pis(conn, grant_id, &co_pi_ids).await?;
    }

    let mut note_count = 0;
    for r in collections.researchers {
        let researcher_owner = record(EntityKind::Researcher, &r.id);
        let researcher_id = mapper.resolve(EntityKind::Researcher, r.id.as_str(), &researcher_owner)?;
        for n in &r.notes {
            let owner = record(EntityKind::Note, &n.id);
            if let Some(declared) = n.researcher_id.as_ref() {
                let declared_id =
                    mapper.resolve(EntityKind::Researcher, declared.as_str(), &owner)?;
                if declared_id != researcher_id {
                    return Err(CoreError::invalid_field(
                        "researcherId",
                        format!(
                            "{} declares researcher '{}' but is nested under researcher '{}'",
                            owner, declared, r.id
                        ),
                    ));
                }
            }
            let project_id = mapper.resolve_optional(
                EntityKind::Project,
                n.project_id.as_ref().map(ExternalId::as_str),
                &owner,
            )?;
            let content = ValidationService::required_text("content", n.content.as_deref(), 20_000)
                .map_err(|e| e.in_context(&owner))?;
            let now = Utc::now();
            let created_at = n.created_at.unwrap_or(now);
            let inserted = notes::ActiveModel {
                content: Set(content),
                created_at: Set(created_at),
                updated_at: Set(n.updated_at.unwrap_or(created_at)),
                researcher_id: Set(researcher_id),
                project_id: Set(project_id),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            mapper.register(EntityKind::Note, n.id.as_str(), inserted.id)?;
            note_count += 1;
        }
    }

    debug!("Import: linked projects, grants, associations and notes");
    Ok(note_count)
}

fn project_model(
    p: &ProjectRecord,
    mapper: &IdentityMapper,
    owner: &str,
) -> CoreResult<projects::ActiveModel> {
    let fields = || -> CoreResult<_> {
        let name = ValidationService::required_text("name", p.name.as_deref(), 200)?;
        let description =
            ValidationService::optional_text("description", p.description.as_deref(), 10_000)?;
        let start_date = ValidationService::required_date("startDate", p.start_date.as_deref())?;
        let end_date = ValidationService::optional_date("endDate", p.end_date.as_deref())?;
        ValidationService::date_order(Some(start_date), end_date, "endDate")?;
        Ok((name, description, start_date, end_date))
    };
    let (name, description, start_date, end_date) = fields().map_err(|e| e.in_context(owner))?;
    let lead = p.lead_researcher_id.as_ref().ok_or_else(|| {
        CoreError::invalid_field("leadResearcherId", "leadResearcherId is required")
            .in_context(owner)
    })?;
    let pi_id = mapper.resolve(EntityKind::Researcher, lead.as_str(), owner)?;

    Ok(projects::ActiveModel {
        name: Set(name),
        description: Set(description),
        start_date: Set(start_date),
        end_date: Set(end_date),
        pi_id: Set(pi_id),
        ..Default::default()
    })
}

fn grant_model(
    g: &GrantRecord,
    mapper: &IdentityMapper,
    owner: &str,
) -> CoreResult<grants::ActiveModel> {
    let fields = || -> CoreResult<_> {
        let title = ValidationService::required_text("title", g.title.as_deref(), 200)?;
        let agency = ValidationService::required_text("agency", g.agency.as_deref(), 150)?;
        let amount = ValidationService::non_negative_amount("amount", g.amount)?;
        let status = grant_service::parse_status(g.status.as_deref())?;
        let start_date = ValidationService::optional_date("startDate", g.start_date.as_deref())?;
        let end_date = ValidationService::optional_date("endDate", g.end_date.as_deref())?;
        ValidationService::date_order(start_date, end_date, "endDate")?;
        Ok((title, agency, amount, status, start_date, end_date))
    };
    let (title, agency, amount, status, start_date, end_date) =
        fields().map_err(|e| e.in_context(owner))?;
    let proposal_due_date =
        ValidationService::optional_date("proposalDueDate", g.proposal_due_date.as_deref())
            .map_err(|e| e.in_context(owner))?;
    let award_date = ValidationService::optional_date("awardDate", g.award_date.as_deref())
        .map_err(|e| e.in_context(owner))?;
    let pi = g.principal_investigator_id.as_ref().ok_or_else(|| {
        CoreError::invalid_field("principalInvestigatorId", "principalInvestigatorId is required")
            .in_context(owner)
    })?;
    let pi_id = mapper.resolve(EntityKind::Researcher, pi.as_str(), owner)?;

    Ok(grants::ActiveModel {
        title: Set(title),
        description: Set(g.description.clone()),
        amount: Set(amount),
        status: Set(status.as_str().to_string()),
        agency: Set(agency),
        grant_number: Set(g
            .grant_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)),
        proposal_due_date: Set(proposal_due_date),
        award_date: Set(award_date),
        start_date: Set(start_date),
        end_date: Set(end_date),
        pi_id: Set(pi_id),
        ..Default::default()
    })
}
