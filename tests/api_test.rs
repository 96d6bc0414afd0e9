//! API integration tests
//!
//! CRUD routes, relationship bookkeeping and error mapping over HTTP

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create, create_grant, create_project, create_researcher, setup_server};

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "research-admin");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_openapi_document_lists_routes() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let doc: Value = response.json();
    assert!(doc["paths"]["/api/researchers/{id}"].is_object());
    assert!(doc["paths"]["/api/data/import"]["post"].is_object());
    for schema in ["ErrorBody", "LabPage", "GrantPage", "ResearcherPage"] {
        assert!(doc["components"]["schemas"][schema].is_object(), "{}", schema);
    }
    assert_eq!(
        doc["paths"]["/api/labs/{id}"]["get"]["responses"]["404"]["content"]["application/json"]
            ["schema"]["$ref"],
        "#/components/schemas/ErrorBody"
    );

    Ok(())
}

#[tokio::test]
async fn test_researcher_crud_api() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let lab = create(&server, "/api/labs", json!({ "name": "Optics Lab" })).await;
    let lab_id = lab["id"].as_i64().unwrap();

    let researcher = create(
        &server,
        "/api/researchers",
        json!({
            "name": "Ada",
            "email": "ada@example.edu",
            "department": "Physics",
            "bio": "Lasers",
            "labId": lab_id
        }),
    )
    .await;
    let id = researcher["id"].as_i64().unwrap();
    assert_eq!(researcher["lab"]["id"], lab_id);

    let response = server.get(&format!("/api/researchers/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let fetched: Value = response.json();
    assert_eq!(fetched["email"], "ada@example.edu");

    // null clears the nullable fields, absent fields stay
    let response = server
        .put(&format!("/api/researchers/{}", id))
        .json(&json!({ "bio": null, "labId": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert!(updated["bio"].is_null());
    assert!(updated["labId"].is_null());
    assert_eq!(updated["name"], "Ada");

    let response = server.delete(&format!("/api/researchers/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["message"].is_string());

    let response = server.get(&format!("/api/researchers/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    create_researcher(&server, "Ada", "ada@example.edu").await;

    let response = server
        .post("/api/researchers")
        .json(&json!({ "name": "Other", "email": "ada@example.edu", "department": "Math" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server
        .post("/api/grants")
        .json(&json!({ "title": "T", "amount": "a lot" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");

    let response = server
        .post("/api/researchers")
        .json(&json!({ "name": "No Email", "department": "Math" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_principal_investigator_blocks_delete_until_reassigned() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let pi = create_researcher(&server, "Ada", "ada@example.edu").await;
    let other = create_researcher(&server, "Grace", "grace@example.edu").await;
    let grant = create_grant(&server, "Quantum Optics", pi).await;

    let response = server.delete(&format!("/api/researchers/{}", pi)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "CONFLICT");

    // Still there
    let response = server.get(&format!("/api/researchers/{}", pi)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "principalInvestigatorId": other }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.delete(&format!("/api/researchers/{}", pi)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_grant_principal_investigator_cannot_be_cleared() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let pi = create_researcher(&server, "Ada", "ada@example.edu").await;
    let grant = create_grant(&server, "Quantum Optics", pi).await;

    let response = server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "principalInvestigatorId": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "principalInvestigatorId": 999 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "endDate": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["fields"]["field"], "endDate");

    let detail: Value = server.get(&format!("/api/grants/{}", grant)).await.json();
    assert!(detail["endDate"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_unknown_compute_type_lists_valid_values() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server
        .post("/api/compute-resources")
        .json(&json!({
            "name": "Q1",
            "type": "QPU",
            "specification": "64 qubits",
            "status": "AVAILABLE"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("CPU"));
    assert!(message.contains("GPU"));
    assert!(message.contains("TPU"));

    Ok(())
}

#[tokio::test]
async fn test_project_association_sets_are_replaced() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let lead = create_researcher(&server, "Ada", "ada@example.edu").await;
    let lab_a = create(&server, "/api/labs", json!({ "name": "A" })).await["id"]
        .as_i64()
        .unwrap();
    let lab_b = create(&server, "/api/labs", json!({ "name": "B" })).await["id"]
        .as_i64()
        .unwrap();
    let project = create_project(&server, "Survey", lead).await;

    let response = server
        .put(&format!("/api/projects/{}", project))
        .json(&json!({ "labIds": [lab_a, lab_a] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail: Value = response.json();
    assert_eq!(detail["labs"].as_array().unwrap().len(), 1);

    let response = server
        .put(&format!("/api/projects/{}", project))
        .json(&json!({ "labIds": [lab_b, 999] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // The failed replacement left the previous set in place
    let detail: Value = server.get(&format!("/api/projects/{}", project)).await.json();
    let labs = detail["labs"].as_array().unwrap();
    assert_eq!(labs.len(), 1);
    assert_eq!(labs[0]["id"], lab_a);

    // Lab deletion removes it from the project's set
    let response = server.delete(&format!("/api/labs/{}", lab_a)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail: Value = server.get(&format!("/api/projects/{}", project)).await.json();
    assert!(detail["labs"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_grant_co_investigators_and_delete() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let pi = create_researcher(&server, "Ada", "ada@example.edu").await;
    let co = create_researcher(&server, "Grace", "grace@example.edu").await;
    let grant = create_grant(&server, "Quantum Optics", pi).await;

    let response = server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "coPiIds": [co] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail: Value = response.json();
    assert_eq!(detail["coPis"][0]["id"], co);

    let researcher: Value = server.get(&format!("/api/researchers/{}", co)).await.json();
    assert_eq!(researcher["coPiGrants"][0]["id"], grant);

    let response = server.delete(&format!("/api/grants/{}", grant)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let researcher: Value = server.get(&format!("/api/researchers/{}", co)).await.json();
    assert!(researcher["coPiGrants"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_notes_belong_to_their_researcher() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let ada = create_researcher(&server, "Ada", "ada@example.edu").await;
    let grace = create_researcher(&server, "Grace", "grace@example.edu").await;

    let note = create(
        &server,
        &format!("/api/researchers/{}/notes", ada),
        json!({ "content": "Calibrated the laser" }),
    )
    .await;
    let note_id = note["id"].as_i64().unwrap();
    assert_eq!(note["researcherId"], ada);

    let response = server
        .put(&format!("/api/researchers/{}/notes/{}", grace, note_id))
        .json(&json!({ "content": "hijacked" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/researchers/{}/notes/{}", grace, note_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .put(&format!("/api/researchers/{}/notes/{}", ada, note_id))
        .json(&json!({ "content": "Calibrated the laser twice" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let notes: Vec<Value> = server
        .get(&format!("/api/researchers/{}/notes", ada))
        .await
        .json();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["content"], "Calibrated the laser twice");

    let response = server
        .delete(&format!("/api/researchers/{}/notes/{}", ada, note_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_list_pagination() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    for i in 0..12 {
        create(&server, "/api/labs", json!({ "name": format!("Lab {}", i) })).await;
    }

    let page: Value = server
        .get("/api/labs")
        .add_query_param("page", 2)
        .add_query_param("per_page", 5)
        .await
        .json();
    assert_eq!(page["items"].as_array().unwrap().len(), 5);
    assert_eq!(page["totalItems"], 12);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["currentPage"], 2);
    assert_eq!(page["perPage"], 5);
    assert_eq!(page["items"][0]["name"], "Lab 5");

    let page: Value = server.get("/api/labs").await.json();
    assert_eq!(page["perPage"], 10);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);

    let page: Value = server
        .get("/api/labs")
        .add_query_param("per_page", 1000)
        .await
        .json();
    assert_eq!(page["perPage"], 100);
    assert_eq!(page["items"].as_array().unwrap().len(), 12);

    let page: Value = server
        .get("/api/labs")
        .add_query_param("page", 9)
        .await
        .json();
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["currentPage"], 9);

    Ok(())
}

#[tokio::test]
async fn test_huge_page_is_a_validation_error() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    create_researcher(&server, "Ada", "ada@example.edu").await;

    let response = server
        .get("/api/researchers")
        .add_query_param("page", "9223372036854775807")
        .add_query_param("per_page", "10")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert_eq!(body["fields"]["field"], "page");

    let response = server.get("/api/researchers").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_malformed_query_and_path_are_validation_errors() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server
        .get("/api/labs")
        .add_query_param("page", "abc")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");

    let response = server.get("/api/labs/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");

    let response = server.delete("/api/researchers/1/notes/xyz").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");

    Ok(())
}

#[tokio::test]
async fn test_project_lead_reassignment_unblocks_delete() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let a = create_researcher(&server, "Ada", "ada@example.edu").await;
    let b = create_researcher(&server, "Grace", "grace@example.edu").await;
    let project = create_project(&server, "Survey", a).await;

    let response = server.delete(&format!("/api/researchers/{}", a)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .put(&format!("/api/projects/{}", project))
        .json(&json!({ "leadResearcherId": b }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail: Value = response.json();
    assert_eq!(detail["leadResearcher"]["id"], b);

    let response = server.delete(&format!("/api/researchers/{}", a)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_deleting_lab_leader_clears_lab_pi() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    let ada = create_researcher(&server, "Ada", "ada@example.edu").await;
    let lab = create(
        &server,
        "/api/labs",
        json!({ "name": "Optics Lab", "principalInvestigatorId": ada }),
    )
    .await;
    let lab_id = lab["id"].as_i64().unwrap();
    assert_eq!(lab["principalInvestigator"]["id"], ada);

    let response = server.delete(&format!("/api/researchers/{}", ada)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let lab: Value = server.get(&format!("/api/labs/{}", lab_id)).await.json();
    assert!(lab["principalInvestigator"].is_null());
    assert!(lab["principalInvestigatorId"].is_null());

    Ok(())
}
