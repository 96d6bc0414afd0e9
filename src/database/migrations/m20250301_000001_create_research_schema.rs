use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Foreign keys carry no cascade actions: dependent rows are cleaned up
/// explicitly by the services before a parent row is removed.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Labs and researchers reference each other; SQLite resolves the
        // forward reference to researchers at write time.
        manager
            .create_table(
                Table::create()
                    .table(Labs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Labs::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Labs::Description).text())
                    .col(ColumnDef::new(Labs::PrincipalInvestigatorId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labs_principal_investigator_id")
                            .from(Labs::Table, Labs::PrincipalInvestigatorId)
                            .to(Researchers::Table, Researchers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Researchers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Researchers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Researchers::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Researchers::Email)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Researchers::Department).string_len(100).not_null())
                    .col(ColumnDef::new(Researchers::Bio).text())
                    .col(ColumnDef::new(Researchers::LabId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_researchers_lab_id")
                            .from(Researchers::Table, Researchers::LabId)
                            .to(Labs::Table, Labs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(ColumnDef::new(Projects::StartDate).date().not_null())
                    .col(ColumnDef::new(Projects::EndDate).date())
                    .col(ColumnDef::new(Projects::PiId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_pi_id")
                            .from(Projects::Table, Projects::PiId)
                            .to(Researchers::Table, Researchers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComputeResources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComputeResources::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ComputeResources::Name).string_len(100).not_null())
                    .col(ColumnDef::new(ComputeResources::ResourceType).string_len(16).not_null())
                    .col(ColumnDef::new(ComputeResources::Description).text())
                    .col(ColumnDef::new(ComputeResources::Specification).text().not_null())
                    .col(
                        ColumnDef::new(ComputeResources::Status)
                            .string_len(16)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(ColumnDef::new(ComputeResources::ClusterType).string_len(100))
                    .col(ColumnDef::new(ComputeResources::Nodes).integer())
                    .col(ColumnDef::new(ComputeResources::CpusPerNode).integer())
                    .col(ColumnDef::new(ComputeResources::GpusPerNode).integer())
                    .col(ColumnDef::new(ComputeResources::MemoryPerNode).string_len(50))
                    .col(ColumnDef::new(ComputeResources::StoragePerNode).string_len(50))
                    .col(ColumnDef::new(ComputeResources::NetworkBandwidth).string_len(50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Grants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grants::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Grants::Description).text())
                    .col(ColumnDef::new(Grants::Amount).double().not_null())
                    .col(
                        ColumnDef::new(Grants::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Grants::Agency).string_len(100).not_null())
                    .col(ColumnDef::new(Grants::GrantNumber).string_len(100).unique_key())
                    .col(ColumnDef::new(Grants::ProposalDueDate).date())
                    .col(ColumnDef::new(Grants::AwardDate).date())
                    .col(ColumnDef::new(Grants::StartDate).date())
                    .col(ColumnDef::new(Grants::EndDate).date())
                    .col(ColumnDef::new(Grants::PiId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grants_pi_id")
                            .from(Grants::Table, Grants::PiId)
                            .to(Researchers::Table, Researchers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notes::Content).text().not_null())
                    .col(ColumnDef::new(Notes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Notes::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Notes::ResearcherId).integer().not_null())
                    .col(ColumnDef::new(Notes::ProjectId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_researcher_id")
                            .from(Notes::Table, Notes::ResearcherId)
                            .to(Researchers::Table, Researchers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_project_id")
                            .from(Notes::Table, Notes::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        create_join_table(
            manager,
            ProjectLabs::Table,
            (ProjectLabs::ProjectId, Projects::Table, Projects::Id),
            (ProjectLabs::LabId, Labs::Table, Labs::Id),
            ("fk_project_labs_project_id", "fk_project_labs_lab_id"),
        )
        .await?;

        create_join_table(
            manager,
            ProjectComputeResources::Table,
            (ProjectComputeResources::ProjectId, Projects::Table, Projects::Id),
            (
                ProjectComputeResources::ComputeResourceId,
                ComputeResources::Table,
                ComputeResources::Id,
            ),
            (
                "fk_project_compute_resources_project_id",
                "fk_project_compute_resources_compute_resource_id",
            ),
        )
        .await?;

        create_join_table(
            manager,
            ProjectGrants::Table,
            (ProjectGrants::ProjectId, Projects::Table, Projects::Id),
            (ProjectGrants::GrantId, Grants::Table, Grants::Id),
            ("fk_project_grants_project_id", "fk_project_grants_grant_id"),
        )
        .await?;

        create_join_table(
            manager,
            GrantCoPis::Table,
            (GrantCoPis::GrantId, Grants::Table, Grants::Id),
            (GrantCoPis::ResearcherId, Researchers::Table, Researchers::Id),
            ("fk_grant_co_pis_grant_id", "fk_grant_co_pis_researcher_id"),
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GrantCoPis::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectGrants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectComputeResources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectLabs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComputeResources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Researchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labs::Table).to_owned())
            .await?;

        Ok(())
    }
}

/// Two-column association table whose composite primary key makes every
/// membership a set element.
async fn create_join_table<T, L, R, LT, LC, RT, RC>(
    manager: &SchemaManager<'_>,
    table: T,
    left: (L, LT, LC),
    right: (R, RT, RC),
    fk_names: (&str, &str),
) -> Result<(), DbErr>
where
    T: Iden + Copy + 'static,
    L: Iden + Copy + 'static,
    R: Iden + Copy + 'static,
    LT: Iden + 'static,
    LC: Iden + 'static,
    RT: Iden + 'static,
    RC: Iden + 'static,
{
    let (left_col, left_table, left_ref) = left;
    let (right_col, right_table, right_ref) = right;

    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(ColumnDef::new(left_col).integer().not_null())
                .col(ColumnDef::new(right_col).integer().not_null())
                .primary_key(Index::create().col(left_col).col(right_col))
                .foreign_key(
                    ForeignKey::create()
                        .name(fk_names.0)
                        .from(table, left_col)
                        .to(left_table, left_ref),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(fk_names.1)
                        .from(table, right_col)
                        .to(right_table, right_ref),
                )
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Researchers {
    Table,
    Id,
    Name,
    Email,
    Department,
    Bio,
    LabId,
}

#[derive(DeriveIden)]
enum Labs {
    Table,
    Id,
    Name,
    Description,
    PrincipalInvestigatorId,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    Description,
    StartDate,
    EndDate,
    PiId,
}

#[derive(DeriveIden)]
enum ComputeResources {
    Table,
    Id,
    Name,
    ResourceType,
    Description,
    Specification,
    Status,
    ClusterType,
    Nodes,
    CpusPerNode,
    GpusPerNode,
    MemoryPerNode,
    StoragePerNode,
    NetworkBandwidth,
}

#[derive(DeriveIden)]
enum Grants {
    Table,
    Id,
    Title,
    Description,
    Amount,
    Status,
    Agency,
    GrantNumber,
    ProposalDueDate,
    AwardDate,
    StartDate,
    EndDate,
    PiId,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    Content,
    CreatedAt,
    UpdatedAt,
    ResearcherId,
    ProjectId,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectLabs {
    Table,
    ProjectId,
    LabId,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectComputeResources {
    Table,
    ProjectId,
    ComputeResourceId,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectGrants {
    Table,
    ProjectId,
    GrantId,
}

#[derive(DeriveIden, Clone, Copy)]
enum GrantCoPis {
    Table,
    GrantId,
    ResearcherId,
}
