//! API integration tests.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{TEST_SECRET, get_json, post_json, register, test_app, test_app_with};

/// Health endpoint works without authentication.
#[tokio::test]
async fn test_health_endpoint() {
    let harness = test_app().await;

    let (status, body) = get_json(&harness.app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

/// The portal page renders with all placeholders substituted.
#[tokio::test]
async fn test_portal_page() {
    let harness = test_app().await;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(html.contains("Haven"));
    assert!(!html.contains("{{OS_NAME}}"));
}

/// Register then login yields tokens that verify to the same username, and
/// the home directory exists and starts empty.
#[tokio::test]
async fn test_register_login_verify_flow() {
    let harness = test_app().await;

    let token = register(&harness.app, "alice", "secret1").await;

    // Home directory provisioned and empty.
    let home = harness.state.accounts.home_dir("alice");
    assert!(home.is_dir());
    assert_eq!(std::fs::read_dir(&home).unwrap().count(), 0);

    // Token verifies to the registered username.
    let (status, body) = post_json(
        &harness.app,
        "/api/auth/verify",
        json!({ "token": token, "username": "alice" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["username"], "alice");

    // Login works with the same credentials.
    let (status, body) = post_json(
        &harness.app,
        "/api/auth/login",
        json!({ "username": "alice", "password": "secret1" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], "alice");
    assert!(body["token"].is_string());
}

/// Registration validation errors arrive as 200 + `{error}`.
#[tokio::test]
async fn test_register_validation_errors() {
    let harness = test_app().await;

    let (status, body) = post_json(
        &harness.app,
        "/api/auth/register",
        json!({ "username": "Bad Name", "password": "secret1" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["error"],
        "Invalid username. Must be 3-32 chars, start with letter, lowercase alphanumeric only."
    );

    let (_, body) = post_json(
        &harness.app,
        "/api/auth/register",
        json!({ "username": "alice", "password": "short" }),
        None,
    )
    .await;
    assert_eq!(body["error"], "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let harness = test_app().await;

    register(&harness.app, "alice", "secret1").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/auth/register",
        json!({ "username": "alice", "password": "other-password" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Username already taken");
}

#[tokio::test]
async fn test_login_failures() {
    let harness = test_app().await;
    register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/auth/login",
        json!({ "username": "nobody", "password": "secret1" }),
        None,
    )
    .await;
    assert_eq!(body["error"], "User not found");

    let (_, body) = post_json(
        &harness.app,
        "/api/auth/login",
        json!({ "username": "alice", "password": "wrong" }),
        None,
    )
    .await;
    assert_eq!(body["error"], "Invalid password");
}

/// Verify is strict about the username matching the token.
#[tokio::test]
async fn test_verify_mismatch_and_garbage() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/auth/verify",
        json!({ "token": token, "username": "bob" }),
        None,
    )
    .await;
    assert_eq!(body["valid"], false);

    let (_, body) = post_json(
        &harness.app,
        "/api/auth/verify",
        json!({ "token": "garbage", "username": "alice" }),
        None,
    )
    .await;
    assert_eq!(body["valid"], false);
}

/// Every gate failure is the identical 401 response.
#[tokio::test]
async fn test_auth_gate_uniform_failures() {
    let harness = test_app().await;

    // Missing header.
    let (status, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "ls" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // Wrong scheme and invalid token: same outcome, same message.
    for auth_value in ["Basic dXNlcg==", "Bearer not.a.real.token", "bearer lowercase"] {
        let request = Request::builder()
            .uri("/api/terminal/exec")
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, auth_value)
            .body(Body::from(r#"{"command":"ls"}"#))
            .unwrap();

        let response = harness.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Invalid or expired token");
    }
}

/// An expired token fails the gate even though its signature is valid.
#[tokio::test]
async fn test_expired_token_rejected() {
    let harness = test_app().await;
    register(&harness.app, "alice", "secret1").await;

    let expired = haven::auth::TokenService::new(TEST_SECRET, -10).issue("alice");

    let (status, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "ls" }),
        Some(&expired),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

/// `ls` in a fresh home prints nothing and carries no error field at all.
#[tokio::test]
async fn test_exec_ls_in_fresh_home() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "ls" }),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_exec_blocked_and_unknown_commands() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "sudo ls" }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Command not allowed: sudo");

    let (_, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "nmap -sV localhost" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Command not allowed: nmap");
}

#[tokio::test]
async fn test_exec_empty_command() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "   " }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "No command provided");
}

/// `help` reports the allowed set sorted alphabetically, for any tenant.
#[tokio::test]
async fn test_exec_help_sorted() {
    let harness = test_app_with(|config| {
        config.terminal.allowed_commands =
            ["wc", "ls", "cat"].iter().map(|s| s.to_string()).collect();
    })
    .await;

    for user in ["alice", "bob"] {
        let token = register(&harness.app, user, "secret1").await;
        let (_, body) = post_json(
            &harness.app,
            "/api/terminal/exec",
            json!({ "command": "help" }),
            Some(&token),
        )
        .await;
        assert_eq!(body["output"], "Available commands: cat, ls, wc");
    }
}

/// Only the leading token is policy-checked; the shell interprets the rest
/// of the line, chaining included.
#[tokio::test]
async fn test_exec_chained_command_line() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "touch file.txt" }),
        Some(&token),
    )
    .await;

    let (_, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "rm file.txt; echo done" }),
        Some(&token),
    )
    .await;

    assert_eq!(body["output"], "done");
    assert!(body.get("error").is_none());

    let home = harness.state.accounts.home_dir("alice");
    assert!(!home.join("file.txt").exists());
}

/// Command execution past the wall clock limit reports a timeout and no
/// partial output.
#[tokio::test]
async fn test_exec_timeout() {
    let harness = test_app_with(|config| {
        config.terminal.allowed_commands.push("sleep".to_string());
        config.terminal.timeout_secs = 1;
    })
    .await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/terminal/exec",
        json!({ "command": "echo partial && sleep 5" }),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Command timed out");
    assert!(body.get("output").is_none());
}

/// Listing the home root: directories first, case-insensitive order within
/// each group, display path rewritten to `~`.
#[tokio::test]
async fn test_files_list_home() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let home = harness.state.accounts.home_dir("alice");
    tokio::fs::write(home.join("beta.txt"), "b").await.unwrap();
    tokio::fs::write(home.join("Alpha.txt"), "a").await.unwrap();
    tokio::fs::create_dir(home.join("zebra")).await.unwrap();
    tokio::fs::create_dir(home.join("Docs")).await.unwrap();

    let (status, body) = get_json(&harness.app, "/api/files/list", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "~");

    let names: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Docs", "zebra", "Alpha.txt", "beta.txt"]);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files[0]["type"], "directory");
    assert_eq!(files[0]["size"], 0);
    assert_eq!(files[2]["type"], "file");
    assert_eq!(files[2]["size"], 1);
}

#[tokio::test]
async fn test_files_list_subdirectory_display_path() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let home = harness.state.accounts.home_dir("alice");
    tokio::fs::create_dir_all(home.join("docs/notes")).await.unwrap();

    let (_, body) = get_json(&harness.app, "/api/files/list?path=~/docs", Some(&token)).await;
    assert_eq!(body["path"], "~/docs");
    assert_eq!(body["files"][0]["name"], "notes");
}

/// Paths that canonicalize outside the home root are denied.
#[tokio::test]
async fn test_files_list_confinement() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (status, body) = get_json(&harness.app, "/api/files/list?path=/etc", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Access denied");

    let (_, body) = get_json(&harness.app, "/api/files/list?path=~/..", Some(&token)).await;
    assert_eq!(body["error"], "Access denied");
}

/// Tenants cannot see each other's homes.
#[tokio::test]
async fn test_files_list_cross_tenant_denied() {
    let harness = test_app().await;
    let alice = register(&harness.app, "alice", "secret1").await;
    register(&harness.app, "bob", "secret2").await;

    let bob_home = harness.state.accounts.home_dir("bob");
    let uri = format!("/api/files/list?path={}", bob_home.display());

    let (_, body) = get_json(&harness.app, &uri, Some(&alice)).await;
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn test_files_list_not_a_directory() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let home = harness.state.accounts.home_dir("alice");
    tokio::fs::write(home.join("file.txt"), "x").await.unwrap();

    let (_, body) = get_json(
        &harness.app,
        "/api/files/list?path=~/file.txt",
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Not a directory");
}

#[tokio::test]
async fn test_files_write_read_roundtrip() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/files/write",
        json!({ "path": "~/notes.txt", "content": "hello haven" }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["info"]["path"], "~/notes.txt");
    assert_eq!(body["info"]["type"], "file");

    let (_, body) = post_json(
        &harness.app,
        "/api/files/read",
        json!({ "path": "~/notes.txt" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["content"], "hello haven");
    assert_eq!(body["info"]["name"], "notes.txt");
}

#[tokio::test]
async fn test_files_read_failures() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/files/read",
        json!({ "path": "~/missing.txt" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "File not found");

    let home = harness.state.accounts.home_dir("alice");
    tokio::fs::create_dir(home.join("docs")).await.unwrap();
    let (_, body) = post_json(
        &harness.app,
        "/api/files/read",
        json!({ "path": "~/docs" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Cannot read directory as file");

    tokio::fs::write(home.join("blob.bin"), [0u8, 1, 2, 3]).await.unwrap();
    let (_, body) = post_json(
        &harness.app,
        "/api/files/read",
        json!({ "path": "~/blob.bin" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Binary file");
}

#[tokio::test]
async fn test_files_write_confinement_and_validation() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/files/write",
        json!({ "path": "", "content": "x" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Path required");

    let (_, body) = post_json(
        &harness.app,
        "/api/files/write",
        json!({ "path": "~/../evil.txt", "content": "x" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn test_files_mkdir_and_delete() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/files/mkdir",
        json!({ "path": "~/projects" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["info"]["type"], "directory");

    let (_, body) = post_json(
        &harness.app,
        "/api/files/mkdir",
        json!({ "path": "~/projects" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Path already exists");

    // Deleting a non-empty directory is refused.
    let home = harness.state.accounts.home_dir("alice");
    tokio::fs::write(home.join("projects/keep.txt"), "x").await.unwrap();
    let (_, body) = post_json(
        &harness.app,
        "/api/files/delete",
        json!({ "path": "~/projects" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Directory not empty");

    // Delete the file, then the now-empty directory.
    let (_, body) = post_json(
        &harness.app,
        "/api/files/delete",
        json!({ "path": "~/projects/keep.txt" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["success"], true);

    let (_, body) = post_json(
        &harness.app,
        "/api/files/delete",
        json!({ "path": "~/projects" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["success"], true);
    assert!(!home.join("projects").exists());
}

#[tokio::test]
async fn test_files_delete_home_root_refused() {
    let harness = test_app().await;
    let token = register(&harness.app, "alice", "secret1").await;

    let (_, body) = post_json(
        &harness.app,
        "/api/files/delete",
        json!({ "path": "~" }),
        Some(&token),
    )
    .await;
    assert_eq!(body["error"], "Cannot delete home directory");
}
