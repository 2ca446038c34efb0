//! Raw HTTP checks against the mock server

use serde_json::{Value, json};

async fn login(client: &reqwest::Client, base: &str) -> String {
    let body: Value = client
        .post(format!("{}/auth/login", base))
        .json(&json!({"username": "admin", "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let backend = staff_mock::spawn().await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/employees", backend.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_bad_credentials_are_not_401() {
    let backend = staff_mock::spawn().await.unwrap();
    let response = reqwest::Client::new()
        .post(format!("{}/auth/login", backend.base_url()))
        .json(&json!({"username": "admin", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_employee_delete_has_no_body() {
    let backend = staff_mock::spawn().await.unwrap();
    let client = reqwest::Client::new();
    let token = login(&client, &backend.base_url()).await;

    let response = client
        .delete(format!("{}/employees/3", backend.base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_department_with_employees_cannot_be_deleted() {
    let backend = staff_mock::spawn().await.unwrap();
    let client = reqwest::Client::new();
    let token = login(&client, &backend.base_url()).await;

    let response = client
        .delete(format!("{}/departments/1", backend.base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cannot delete department");
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let backend = staff_mock::spawn().await.unwrap();
    let client = reqwest::Client::new();
    let token = login(&client, &backend.base_url()).await;

    backend.revoke_all_tokens().await;
    let response = client
        .get(format!("{}/auth/me", backend.base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
