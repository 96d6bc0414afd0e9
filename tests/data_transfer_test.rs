//! Snapshot export/import tests
//!
//! Exports are compared after replacing row ids with natural keys, since an
//! import assigns fresh ids.

mod common;

use std::collections::HashMap;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{create, create_grant, create_project, create_researcher, setup_server};

fn names_by_id(records: &Value, key: &str) -> HashMap<String, String> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["id"].as_str().unwrap().to_string(), r[key].as_str().unwrap().to_string()))
        .collect()
}

fn resolve(map: &HashMap<String, String>, id: &Value) -> Value {
    match id.as_str() {
        Some(id) => json!(map[id]),
        None => Value::Null,
    }
}

fn resolve_sorted(map: &HashMap<String, String>, ids: &Value) -> Value {
    let mut names: Vec<String> = ids
        .as_array()
        .unwrap()
        .iter()
        .map(|id| map[id.as_str().unwrap()].clone())
        .collect();
    names.sort();
    json!(names)
}

fn sorted_by(mut items: Vec<Value>, key: &str) -> Vec<Value> {
    items.sort_by(|a, b| a[key].as_str().cmp(&b[key].as_str()));
    items
}

/// The snapshot with every id replaced by the referenced record's natural key
fn canonical(snapshot: &Value) -> Value {
    let researchers = names_by_id(&snapshot["researchers"], "email");
    let labs = names_by_id(&snapshot["labs"], "name");
    let projects = names_by_id(&snapshot["projects"], "name");
    let resources = names_by_id(&snapshot["computeResources"], "name");
    let grants = names_by_id(&snapshot["grants"], "title");

    let researcher_items = snapshot["researchers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            let notes = sorted_by(
                r["notes"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|n| {
                        json!({
                            "content": n["content"],
                            "researcher": resolve(&researchers, &n["researcherId"]),
                            "project": resolve(&projects, &n["projectId"]),
                            "createdAt": n["createdAt"],
                            "updatedAt": n["updatedAt"],
                        })
                    })
                    .collect(),
                "content",
            );
            json!({
                "email": r["email"],
                "name": r["name"],
                "department": r["department"],
                "bio": r["bio"],
                "lab": resolve(&labs, &r["labId"]),
                "notes": notes,
            })
        })
        .collect();

    let lab_items = snapshot["labs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| {
            json!({
                "name": l["name"],
                "description": l["description"],
                "pi": resolve(&researchers, &l["principalInvestigatorId"]),
            })
        })
        .collect();

    let project_items = snapshot["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            json!({
                "name": p["name"],
                "startDate": p["startDate"],
                "endDate": p["endDate"],
                "lead": resolve(&researchers, &p["leadResearcherId"]),
                "labs": resolve_sorted(&labs, &p["labIds"]),
                "computeResources": resolve_sorted(&resources, &p["computeResourceIds"]),
                "grants": resolve_sorted(&grants, &p["grantIds"]),
            })
        })
        .collect();

    let resource_items = snapshot["computeResources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            let mut c = c.clone();
            c["id"] = Value::Null;
            c
        })
        .collect();

    let grant_items = snapshot["grants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| {
            let mut g = g.clone();
            g["id"] = Value::Null;
            g["principalInvestigatorId"] = resolve(&researchers, &g["principalInvestigatorId"]);
            g["coPiIds"] = resolve_sorted(&researchers, &g["coPiIds"]);
            g
        })
        .collect();

    json!({
        "researchers": sorted_by(researcher_items, "email"),
        "labs": sorted_by(lab_items, "name"),
        "projects": sorted_by(project_items, "name"),
        "computeResources": sorted_by(resource_items, "name"),
        "grants": sorted_by(grant_items, "title"),
    })
}

async fn seed_graph(server: &TestServer) {
    let ada = create_researcher(server, "Ada", "ada@example.edu").await;
    let grace = create_researcher(server, "Grace", "grace@example.edu").await;
    let lab = create(
        server,
        "/api/labs",
        json!({ "name": "Optics Lab", "principalInvestigatorId": ada }),
    )
    .await["id"]
        .as_i64()
        .unwrap();
    server
        .put(&format!("/api/researchers/{}", grace))
        .json(&json!({ "labId": lab }))
        .await;
    let gpu = create(
        server,
        "/api/compute-resources",
        json!({
            "name": "gpu-01",
            "type": "GPU",
            "specification": "8x A100",
            "status": "AVAILABLE",
            "nodes": 2,
            "gpusPerNode": 8
        }),
    )
    .await["id"]
        .as_i64()
        .unwrap();
    let grant = create_grant(server, "Quantum Optics", ada).await;
    server
        .put(&format!("/api/grants/{}", grant))
        .json(&json!({ "coPiIds": [grace] }))
        .await;
    let project = create_project(server, "Survey", ada).await;
    server
        .put(&format!("/api/projects/{}", project))
        .json(&json!({ "labIds": [lab], "computeResourceIds": [gpu], "grantIds": [grant] }))
        .await;
    create(
        server,
        &format!("/api/researchers/{}/notes", grace),
        json!({ "content": "Aligned the mirrors", "projectId": project }),
    )
    .await;
    create(
        server,
        &format!("/api/researchers/{}/notes", ada),
        json!({ "content": "Drafted the proposal" }),
    )
    .await;
}

#[tokio::test]
async fn test_export_download_shape() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    seed_graph(&server).await;

    let response = server.get("/api/data/export").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=research_data_export.json");

    let snapshot: Value = response.json();
    assert_eq!(snapshot["researchers"].as_array().unwrap().len(), 2);
    assert!(snapshot["researchers"][0]["id"].is_string());
    assert_eq!(snapshot["computeResources"][0]["type"], "GPU");
    assert_eq!(snapshot["projects"][0]["startDate"], "2024-01-01");

    Ok(())
}

#[tokio::test]
async fn test_export_import_round_trip() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    seed_graph(&server).await;

    let before: Value = server.get("/api/data/export").await.json();

    let response = server.post("/api/data/import").json(&before).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    let summary: Value = response.json();
    assert_eq!(summary["created"]["researchers"], 2);
    assert_eq!(summary["created"]["labs"], 1);
    assert_eq!(summary["created"]["projects"], 1);
    assert_eq!(summary["created"]["computeResources"], 1);
    assert_eq!(summary["created"]["grants"], 1);
    assert_eq!(summary["created"]["notes"], 2);

    let after: Value = server.get("/api/data/export").await.json();
    assert_eq!(canonical(&before), canonical(&after));

    Ok(())
}

#[tokio::test]
async fn test_import_resolves_opaque_ids() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let snapshot = json!({
        "researchers": [
            {
                "id": "r-ada",
                "name": "Ada",
                "email": "ada@example.edu",
                "department": "Physics",
                "labId": "optics",
                "notes": [{ "id": 1, "content": "Hello", "projectId": "p-1" }]
            }
        ],
        "labs": [{ "id": "optics", "name": "Optics Lab", "principalInvestigatorId": "r-ada" }],
        "projects": [{
            "id": "p-1",
            "name": "Survey",
            "startDate": "2024-03-01",
            "leadResearcherId": "r-ada",
            "labIds": ["optics"]
        }],
        "computeResources": [],
        "grants": []
    });

    let response = server.post("/api/data/import").json(&snapshot).await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());

    let labs: Value = server.get("/api/labs").await.json();
    let lab_id = labs["items"][0]["id"].as_i64().unwrap();
    let lab: Value = server.get(&format!("/api/labs/{}", lab_id)).await.json();
    assert_eq!(lab["principalInvestigator"]["email"], "ada@example.edu");
    assert_eq!(lab["members"].as_array().unwrap().len(), 1);
    assert_eq!(lab["projects"][0]["name"], "Survey");

    Ok(())
}

#[tokio::test]
async fn test_dangling_reference_leaves_store_unchanged() -> Result<()> {
    let (server, _dir) = setup_server().await?;
    seed_graph(&server).await;
    let before: Value = server.get("/api/data/export").await.json();

    let snapshot = json!({
        "researchers": [{
            "id": "r1",
            "name": "Ada",
            "email": "ada@example.edu",
            "department": "Physics",
            "notes": [{ "id": "n1", "researcherId": "r999", "content": "orphan" }]
        }],
        "labs": [],
        "projects": [],
        "computeResources": [],
        "grants": []
    });
    let response = server.post("/api/data/import").json(&snapshot).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "IMPORT_FAILED");

    let after: Value = server.get("/api/data/export").await.json();
    assert_eq!(before, after);

    Ok(())
}

#[tokio::test]
async fn test_unknown_project_lead_is_import_error() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let snapshot = json!({
        "researchers": [],
        "labs": [],
        "projects": [{ "id": "p1", "name": "Survey", "startDate": "2024-01-01", "leadResearcherId": "nobody" }],
        "computeResources": [],
        "grants": []
    });
    let response = server.post("/api/data/import").json(&snapshot).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "IMPORT_FAILED");
    assert!(body["message"].as_str().unwrap().contains("nobody"));

    Ok(())
}

#[tokio::test]
async fn test_malformed_snapshots_are_validation_errors() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server
        .post("/api/data/import")
        .json(&json!({ "researchers": [], "labs": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert!(body["message"].as_str().unwrap().contains("computeResources"));

    let response = server
        .post("/api/data/import")
        .json(&json!({
            "researchers": [],
            "labs": [{ "id": "l1", "name": "A" }, { "id": "l1", "name": "B" }],
            "projects": [],
            "computeResources": [],
            "grants": []
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");

    Ok(())
}
