use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{body::Body, http::Request, http::StatusCode, Router};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;

use hm_api::auth::{AuthConfig, AuthMode};
use hm_common::assignment::{MemoryStore, TaskRecord, TaskStatus, UserRecord};
use hm_common::{EnvironmentTolerance, TaskDefinition, UserProfile};

const SECRET: &str = "integration-test-secret";

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: usize,
}

fn bearer_token(user_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
        + 3600;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn task(id: &str, name: &str) -> TaskRecord {
    TaskRecord {
        id: id.into(),
        definition: TaskDefinition {
            name: name.into(),
            tags: vec!["日常例行任务".into()],
            time_slots: vec!["9:00-11:00".into()],
            ..TaskDefinition::default()
        },
        status: TaskStatus::Unassigned,
    }
}

fn user(id: &str, skills: &[&str]) -> UserRecord {
    UserRecord {
        id: id.into(),
        name: id.into(),
        password_hash: None,
        profile: UserProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            preferences: ["日常例行任务".to_string()].into(),
            time_slots: ["9:00-11:00".to_string()].into(),
            environment: EnvironmentTolerance::default(),
        },
        active_tasks: vec![],
    }
}

async fn seeded_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user("u1", &["洗碗"])).await;
    store.insert_task(task("t1", "洗碗")).await;
    store.insert_task(task("t2", "修水管")).await;

    let auth = AuthConfig {
        mode: AuthMode::Jwt,
        api_key: None,
        jwt_secret: Some(SECRET.to_string()),
    };

    let state = hm_api::test_state_with_store(store.clone(), auth);
    (hm_api::create_router(state), store)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn recommended_ranks_skilled_task_first() {
    let (app, _store) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tasks/recommended?limit=2")
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let ranked = body.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["task"]["id"], "t1");
    assert_eq!(ranked[0]["result"]["final_score"], 90.0);
    assert!(ranked[0]["result"]["final_score"].as_f64().unwrap()
        >= ranked[1]["result"]["final_score"].as_f64().unwrap());
}

#[tokio::test]
async fn choose_then_complete_walks_the_lifecycle() {
    let (app, store) = seeded_app().await;

    let choose = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tasks/choose/t1")
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(choose.status(), StatusCode::OK);
    let body = json_body(choose).await;
    assert_eq!(body["assignment"]["user_id"], "u1");
    assert_eq!(body["assignment"]["final_score"], 90.0);
    assert_eq!(body["task"]["status"], "assigned");
    assert_eq!(body["user"]["name"], "u1");
    assert!(body["user"].get("password_hash").is_none());
    let assignment_id = body["assignment"]["id"].as_str().unwrap().to_string();

    // 同一任务不能被再次选中
    let conflict = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tasks/choose/t1")
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let start = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/assignments/{assignment_id}/start"))
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::OK);

    let complete = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/assignments/{assignment_id}/complete"))
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::OK);
    let body = json_body(complete).await;
    assert_eq!(body["status"], "completed");

    use hm_common::assignment::AssignmentStore;
    let done = store.find_task_by_id("t1").await.unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    let holder = store.find_user_by_id("u1").await.unwrap().unwrap();
    assert!(holder.active_tasks.is_empty());
}

#[tokio::test]
async fn batch_preview_then_assign() {
    let (app, _store) = seeded_app().await;

    let preview = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/assignments/assign")
                .header("authorization", bearer_token("u1"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"task_ids": ["t1", "t2"], "auto_assign": false}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(preview.status(), StatusCode::OK);
    let body = json_body(preview).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["outcome"] == "preview"));
    assert_eq!(results[0]["best"]["user_id"], "u1");

    let assign = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/assignments/assign")
                .header("authorization", bearer_token("u1"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"task_ids": ["t1", "missing"]}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(assign.status(), StatusCode::OK);
    let body = json_body(assign).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["outcome"], "assigned");
    assert_eq!(results[0]["assignment"]["user_id"], "u1");
    assert_eq!(results[1]["outcome"], "not_found");

    // 再跑一次：t1 已被占用，与不存在的 id 区分上报
    let rerun = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/assignments/assign")
                .header("authorization", bearer_token("u1"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"task_ids": ["t1"]}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(rerun.status(), StatusCode::OK);
    let body = json_body(rerun).await;
    assert_eq!(body["results"][0]["outcome"], "skipped");
}

#[tokio::test]
async fn empty_batch_is_a_bad_request() {
    let (app, _store) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/assignments/assign")
                .header("authorization", bearer_token("u1"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"task_ids": []}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_task_cascades() {
    let (app, store) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/tasks/t2")
                .header("authorization", bearer_token("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    use hm_common::assignment::AssignmentStore;
    assert!(store.find_task_by_id("t2").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let (app, _store) = seeded_app().await;

    let claims = Claims {
        sub: "u1".into(),
        exp: 1,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tasks/recommended")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
