use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, TransactionTrait};
use tracing::info;

use crate::database::entities::{
    compute_resources, grant_co_pis, grants, labs, notes, project_compute_resources,
    project_grants, project_labs, projects, researchers,
};
use crate::errors::{CoreError, CoreResult};
use crate::services::snapshot::{
    ComputeResourceRecord, ExternalId, GrantRecord, LabRecord, NoteRecord, ProjectRecord,
    ResearcherRecord, Snapshot,
};

pub const EXPORT_FILENAME: &str = "research_data_export.json";

/// Projects the whole entity graph into a [`Snapshot`].
#[derive(Clone)]
pub struct ExportService {
    db: DatabaseConnection,
}

impl ExportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All tables are read inside one transaction.
    pub async fn export(&self) -> CoreResult<Snapshot> {
        let txn = self.db.begin().await?;
        let snapshot = export_snapshot(&txn).await?;
        txn.commit().await?;
        info!(
            "Exported snapshot: {} researchers, {} labs, {} projects, {} compute resources, {} grants",
            len(&snapshot.researchers),
            len(&snapshot.labs),
            len(&snapshot.projects),
            len(&snapshot.compute_resources),
            len(&snapshot.grants),
        );
        Ok(snapshot)
    }

    pub async fn export_json(&self) -> CoreResult<String> {
        let snapshot = self.export().await?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| {
            CoreError::internal(format!("Failed to serialize snapshot: {}", e)).with_source(e)
        })
    }
}

fn len<T>(records: &Option<Vec<T>>) -> usize {
    records.as_ref().map(Vec::len).unwrap_or(0)
}

/// Groups join rows by their owning side, preserving member order.
fn group_pairs(pairs: impl IntoIterator<Item = (i32, i32)>) -> HashMap<i32, Vec<ExternalId>> {
    let mut grouped: HashMap<i32, Vec<ExternalId>> = HashMap::new();
    for (owner, member) in pairs {
        grouped.entry(owner).or_default().push(member.into());
    }
    grouped
}

fn format_date(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub async fn export_snapshot<C: ConnectionTrait>(conn: &C) -> CoreResult<Snapshot> {
    let mut notes_by_researcher: HashMap<i32, Vec<NoteRecord>> = HashMap::new();
    for note in notes::Entity::find()
        .order_by_asc(notes::Column::Id)
        .all(conn)
        .await?
    {
        notes_by_researcher
            .entry(note.researcher_id)
            .or_default()
            .push(NoteRecord {
                id: note.id.into(),
                researcher_id: Some(note.researcher_id.into()),
                project_id: note.project_id.map(ExternalId::from),
                content: Some(note.content),
                created_at: Some(note.created_at),
                updated_at: Some(note.updated_at),
            });
    }

    let researchers = researchers::Entity::find()
        .order_by_asc(researchers::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|r| ResearcherRecord {
            id: r.id.into(),
            notes: notes_by_researcher.remove(&r.id).unwrap_or_default(),
            name: Some(r.name),
            email: Some(r.email),
            department: Some(r.department),
            bio: r.bio,
            lab_id: r.lab_id.map(ExternalId::from),
        })
        .collect();

    let labs = labs::Entity::find()
        .order_by_asc(labs::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|l| LabRecord {
            id: l.id.into(),
            name: Some(l.name),
            description: l.description,
            principal_investigator_id: l.principal_investigator_id.map(ExternalId::from),
        })
        .collect();

    let mut lab_links = group_pairs(
        project_labs::Entity::find()
            .order_by_asc(project_labs::Column::ProjectId)
            .order_by_asc(project_labs::Column::LabId)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.project_id, row.lab_id)),
    );
    let mut resource_links = group_pairs(
        project_compute_resources::Entity::find()
            .order_by_asc(project_compute_resources::Column::ProjectId)
            .order_by_asc(project_compute_resources::Column::ComputeResourceId)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.project_id, row.compute_resource_id)),
    );
    let mut grant_links = group_pairs(
        project_grants::Entity::find()
            .order_by_asc(project_grants::Column::ProjectId)
            .order_by_asc(project_grants::Column::GrantId)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.project_id, row.grant_id)),
    );
    let mut co_pi_links = group_pairs(
        grant_co_pis::Entity::find()
            .order_by_asc(grant_co_pis::Column::GrantId)
            .order_by_asc(grant_co_pis::Column::ResearcherId)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.grant_id, row.researcher_id)),
    );

    let projects = projects::Entity::find()
        .order_by_asc(projects::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|p| ProjectRecord {
            id: p.id.into(),
            lab_ids: lab_links.remove(&p.id).unwrap_or_default(),
            compute_resource_ids: resource_links.remove(&p.id).unwrap_or_default(),
            grant_ids: grant_links.remove(&p.id).unwrap_or_default(),
            name: Some(p.name),
            description: p.description,
            start_date: format_date(Some(p.start_date)),
            end_date: format_date(p.end_date),
            lead_researcher_id: Some(p.pi_id.into()),
        })
        .collect();

    let compute_resources = compute_resources::Entity::find()
        .order_by_asc(compute_resources::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|c| ComputeResourceRecord {
            id: c.id.into(),
            name: Some(c.name),
            resource_type: Some(c.resource_type),
            description: c.description,
            specification: Some(c.specification),
            status: Some(c.status),
            cluster_type: c.cluster_type,
            nodes: c.nodes,
            cpus_per_node: c.cpus_per_node,
            gpus_per_node: c.gpus_per_node,
            memory_per_node: c.memory_per_node,
            storage_per_node: c.storage_per_node,
            network_bandwidth: c.network_bandwidth,
        })
        .collect();

    let grants = grants::Entity::find()
        .order_by_asc(grants::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|g| GrantRecord {
            id: g.id.into(),
            co_pi_ids: co_pi_links.remove(&g.id).unwrap_or_default(),
            title: Some(g.title),
            agency: Some(g.agency),
            grant_number: g.grant_number,
            description: g.description,
            amount: Some(g.amount),
            status: Some(g.status),
            proposal_due_date: format_date(g.proposal_due_date),
            award_date: format_date(g.award_date),
            start_date: format_date(g.start_date),
            end_date: format_date(g.end_date),
            principal_investigator_id: Some(g.pi_id.into()),
        })
        .collect();

    Ok(Snapshot {
        researchers: Some(researchers),
        labs: Some(labs),
        projects: Some(projects),
        compute_resources: Some(compute_resources),
        grants: Some(grants),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::services::grant_service::{GrantService, NewGrant};
    use crate::services::lab_service::{LabService, NewLab};
    use crate::services::note_service::{NewNote, NoteService};
    use crate::services::researcher_service::{NewResearcher, ResearcherService};

    #[tokio::test]
    async fn empty_store_exports_empty_collections() {
        let db = setup_test_db().await.unwrap();
        let value = serde_json::to_value(ExportService::new(db).export().await.unwrap()).unwrap();
        for key in ["researchers", "labs", "projects", "computeResources", "grants"] {
            assert_eq!(value[key], serde_json::json!([]), "{}", key);
        }
    }

    #[tokio::test]
    async fn notes_nest_under_owner_and_links_use_string_ids() {
        let db = setup_test_db().await.unwrap();
        let pi = ResearcherService::new(db.clone())
            .create(NewResearcher {
                name: Some("Marie".into()),
                email: Some("marie@lab.edu".into()),
                department: Some("Physics".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .researcher
            .id;
        LabService::new(db.clone())
            .create(NewLab {
                name: Some("Radiation".into()),
                principal_investigator_id: Some(pi),
                ..Default::default()
            })
            .await
            .unwrap();
        GrantService::new(db.clone())
            .create(NewGrant {
                title: Some("Isotopes".into()),
                amount: Some(10.0),
                status: Some("PENDING".into()),
                agency: Some("ERC".into()),
                start_date: Some("2025-01-01".into()),
                end_date: Some("2025-12-31".into()),
                principal_investigator_id: Some(pi),
                co_pi_ids: Some(vec![pi]),
                ..Default::default()
            })
            .await
            .unwrap();
        NoteService::new(db.clone())
            .create(
                pi,
                NewNote {
                    content: Some("Sample prepared".into()),
                    project_id: None,
                },
            )
            .await
            .unwrap();

        let value = serde_json::to_value(ExportService::new(db).export().await.unwrap()).unwrap();
        let researcher = &value["researchers"][0];
        assert_eq!(researcher["id"], serde_json::json!(pi.to_string()));
        assert_eq!(researcher["notes"][0]["content"], "Sample prepared");
        assert!(value.get("notes").is_none());
        assert_eq!(
            value["labs"][0]["principalInvestigatorId"],
            serde_json::json!(pi.to_string())
        );
        assert_eq!(value["grants"][0]["coPiIds"], serde_json::json!([pi.to_string()]));
        assert_eq!(value["grants"][0]["startDate"], "2025-01-01");
        assert!(value["labs"][0].get("members").is_none());
    }

    #[tokio::test]
    async fn export_reads_see_one_state_and_release_the_connection() {
        let db = setup_test_db().await.unwrap();
        let people = ResearcherService::new(db.clone());
        let first = people
            .create(NewResearcher {
                name: Some("Marie".into()),
                email: Some("marie@lab.edu".into()),
                department: Some("Physics".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .researcher
            .id;

        let txn = db.begin().await.unwrap();
        researchers::Entity::delete_by_id(first).exec(&txn).await.unwrap();
        let inside = export_snapshot(&txn).await.unwrap();
        txn.rollback().await.unwrap();
        assert_eq!(len(&inside.researchers), 0);

        let service = ExportService::new(db.clone());
        assert_eq!(len(&service.export().await.unwrap().researchers), 1);

        people
            .create(NewResearcher {
                name: Some("Pierre".into()),
                email: Some("pierre@lab.edu".into()),
                department: Some("Physics".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(len(&service.export().await.unwrap().researchers), 2);
    }
}
