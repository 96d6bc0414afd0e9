use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::notes;
use crate::errors::{CoreError, CoreResult};
use crate::services::graph_consistency::{require_project, require_researcher};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::NoteView;

const MAX_NOTE_LEN: usize = 20_000;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub content: Option<String>,
    pub project_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub project_id: Option<Option<i32>>,
}

/// Notes are only reachable through their owning researcher.
#[derive(Clone)]
pub struct NoteService {
    db: DatabaseConnection,
}

impl NoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, researcher_id: i32, input: NewNote) -> CoreResult<NoteView> {
        let content =
            ValidationService::required_text("content", input.content.as_deref(), MAX_NOTE_LEN)?;

        let txn = self.db.begin().await?;
        require_researcher(&txn, researcher_id).await?;
        if let Some(project_id) = input.project_id {
            require_project(&txn, project_id).await?;
        }

        let now = Utc::now();
        let note = notes::ActiveModel {
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
            researcher_id: Set(researcher_id),
            project_id: Set(input.project_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!("Created note {} for researcher {}", note.id, researcher_id);
        Ok(note.into())
    }

    pub async fn list_for_researcher(&self, researcher_id: i32) -> CoreResult<Vec<NoteView>> {
        require_researcher(&self.db, researcher_id).await?;
        let notes = notes::Entity::find()
            .filter(notes::Column::ResearcherId.eq(researcher_id))
            .order_by_desc(notes::Column::CreatedAt)
            .order_by_desc(notes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(notes.into_iter().map(NoteView::from).collect())
    }

    pub async fn update(
        &self,
        researcher_id: i32,
        note_id: i32,
        input: NoteUpdate,
    ) -> CoreResult<NoteView> {
        let txn = self.db.begin().await?;
        let note = owned_note(&txn, researcher_id, note_id).await?;
        let mut active: notes::ActiveModel = note.into();

        if let Some(content) = input.content.as_deref() {
            active.content = Set(ValidationService::required_text(
                "content",
                Some(content),
                MAX_NOTE_LEN,
            )?);
        }
        if let Some(project_id) = input.project_id {
            if let Some(project_id) = project_id {
                require_project(&txn, project_id).await?;
            }
            active.project_id = Set(project_id);
        }
        active.updated_at = Set(Utc::now());

        let note = active.update(&txn).await?;
        txn.commit().await?;
        Ok(note.into())
    }

    pub async fn delete(&self, researcher_id: i32, note_id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        owned_note(&txn, researcher_id, note_id).await?;
        notes::Entity::delete_by_id(note_id).exec(&txn).await?;
        txn.commit().await?;
        info!("Deleted note {} of researcher {}", note_id, researcher_id);
        Ok(())
    }
}

async fn owned_note<C: sea_orm::ConnectionTrait>(
    conn: &C,
    researcher_id: i32,
    note_id: i32,
) -> CoreResult<notes::Model> {
    require_researcher(conn, researcher_id).await?;
    let note = notes::Entity::find_by_id(note_id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found("Note", note_id))?;
    if note.researcher_id != researcher_id {
        return Err(CoreError::forbidden(format!(
            "Note {} does not belong to researcher {}",
            note_id, researcher_id
        )));
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::CoreErrorKind;
    use crate::services::researcher_service::{NewResearcher, ResearcherService};

    async fn researcher(db: &DatabaseConnection, email: &str) -> i32 {
        ResearcherService::new(db.clone())
            .create(NewResearcher {
                name: Some("R".into()),
                email: Some(email.into()),
                department: Some("Physics".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .researcher
            .id
    }

    #[tokio::test]
    async fn create_list_update() {
        let db = setup_test_db().await.unwrap();
        let owner = researcher(&db, "owner@lab.edu").await;
        let service = NoteService::new(db);

        let note = service
            .create(
                owner,
                NewNote {
                    content: Some("Calibrated the detector".into()),
                    project_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(note.created_at, note.updated_at);

        let updated = service
            .update(
                owner,
                note.id,
                NoteUpdate {
                    content: Some("Recalibrated".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "Recalibrated");
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(service.list_for_researcher(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn foreign_note_is_forbidden() {
        let db = setup_test_db().await.unwrap();
        let owner = researcher(&db, "owner@lab.edu").await;
        let other = researcher(&db, "other@lab.edu").await;
        let service = NoteService::new(db);
        let note = service
            .create(
                owner,
                NewNote {
                    content: Some("Private".into()),
                    project_id: None,
                },
            )
            .await
            .unwrap();

        let err = service.delete(other, note.id).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Forbidden);
        assert_eq!(service.list_for_researcher(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_content_and_unknown_project_are_rejected() {
        let db = setup_test_db().await.unwrap();
        let owner = researcher(&db, "owner@lab.edu").await;
        let service = NoteService::new(db);

        let err = service
            .create(
                owner,
                NewNote {
                    content: Some("   ".into()),
                    project_id: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);

        let err = service
            .create(
                owner,
                NewNote {
                    content: Some("Linked".into()),
                    project_id: Some(77),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }
}
