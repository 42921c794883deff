use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("SCHOOLD_WORKSPACE")
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn health_works_without_workspace_and_unknown_methods_are_reported() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));
    assert!(health.get("user").map(|v| v.is_null()).unwrap_or(false));

    let unknown = request(&mut stdin, &mut reader, "2", "grades.compute", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    let no_ws = request(&mut stdin, &mut reader, "3", "auth.login", json!({
        "email": "admin@greenvalley.edu",
        "password": "password",
    }));
    assert_eq!(error_code(&no_ws), "no_workspace");

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let bad = read_response(&mut reader);
    assert_eq!(error_code(&bad), "bad_json");

    // The loop keeps serving after a bad line.
    let _ = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn login_and_role_gating() {
    let workspace = temp_dir("schoold-auth");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("empty").and_then(|v| v.as_bool()), Some(true));
    let seeded = request_ok(&mut stdin, &mut reader, "2", "workspace.seedDemo", json!({}));
    assert_eq!(seeded.pointer("/seeded/students").and_then(|v| v.as_u64()), Some(12));
    assert_eq!(seeded.get("demoPassword").and_then(|v| v.as_str()), Some("password"));

    let again = request(&mut stdin, &mut reader, "3", "workspace.seedDemo", json!({}));
    assert_eq!(error_code(&again), "conflict");

    let before_login = request(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(error_code(&before_login), "unauthenticated");

    let wrong = request(&mut stdin, &mut reader, "5", "auth.login", json!({
        "email": "rajesh@greenvalley.edu",
        "password": "nope",
    }));
    assert_eq!(error_code(&wrong), "invalid_credentials");
    let unknown_user = request(&mut stdin, &mut reader, "6", "auth.login", json!({
        "email": "nobody@greenvalley.edu",
        "password": "password",
    }));
    assert_eq!(error_code(&unknown_user), "invalid_credentials");

    // Email lookup ignores case.
    let login = request_ok(&mut stdin, &mut reader, "7", "auth.login", json!({
        "email": "Rajesh@GreenValley.edu",
        "password": "password",
    }));
    assert_eq!(login.pointer("/user/role").and_then(|v| v.as_str()), Some("teacher"));
    assert!(login.pointer("/user/passwordHash").is_none());

    let students = request_ok(&mut stdin, &mut reader, "8", "students.list", json!({}));
    assert_eq!(
        students.get("students").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(12)
    );
    let teachers = request(&mut stdin, &mut reader, "9", "teachers.list", json!({}));
    assert_eq!(error_code(&teachers), "forbidden");
    let class_create = request(&mut stdin, &mut reader, "10", "classes.create", json!({
        "class": { "grade": "7", "section": "A" }
    }));
    assert_eq!(error_code(&class_create), "forbidden");

    // A teacher cannot borrow the admin role.
    let switched = request(&mut stdin, &mut reader, "11", "auth.switchRole", json!({ "role": "admin" }));
    assert_eq!(error_code(&switched), "forbidden");
    let escalate = request(&mut stdin, &mut reader, "12", "users.create", json!({
        "name": "Mallory",
        "email": "mallory@greenvalley.edu",
        "password": "x",
        "role": "admin",
    }));
    assert_eq!(error_code(&escalate), "forbidden");
    let me = request_ok(&mut stdin, &mut reader, "13", "auth.me", json!({}));
    assert_eq!(me.pointer("/user/role").and_then(|v| v.as_str()), Some("teacher"));

    let _ = request_ok(&mut stdin, &mut reader, "14", "auth.logout", json!({}));
    let me = request_ok(&mut stdin, &mut reader, "15", "auth.me", json!({}));
    assert!(me.get("user").map(|v| v.is_null()).unwrap_or(false));
    let after_logout = request(&mut stdin, &mut reader, "16", "students.list", json!({}));
    assert_eq!(error_code(&after_logout), "unauthenticated");

    let no_account = request(&mut stdin, &mut reader, "17", "auth.login", json!({
        "email": "mallory@greenvalley.edu",
        "password": "x",
    }));
    assert_eq!(error_code(&no_account), "invalid_credentials");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn admin_creates_users_that_can_log_in() {
    let workspace = temp_dir("schoold-users");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "workspace.seedDemo", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "3", "auth.login", json!({
        "email": "admin@greenvalley.edu",
        "password": "password",
    }));

    let created = request_ok(&mut stdin, &mut reader, "4", "users.create", json!({
        "name": "Sunita Iyer",
        "email": "sunita@greenvalley.edu",
        "password": "s3cret",
        "role": "teacher",
    }));
    assert_eq!(created.pointer("/user/email").and_then(|v| v.as_str()), Some("sunita@greenvalley.edu"));

    let duplicate = request(&mut stdin, &mut reader, "5", "users.create", json!({
        "name": "Someone Else",
        "email": "SUNITA@greenvalley.edu",
        "password": "x",
        "role": "teacher",
    }));
    assert_eq!(error_code(&duplicate), "conflict");

    let bad_role = request(&mut stdin, &mut reader, "6", "users.create", json!({
        "name": "Someone Else",
        "email": "else@greenvalley.edu",
        "password": "x",
        "role": "principal",
    }));
    assert_eq!(error_code(&bad_role), "bad_params");

    // An admin previewing the teacher screens keeps admin permissions, and the
    // stored role is unchanged by the preview.
    let preview = request_ok(&mut stdin, &mut reader, "7", "auth.switchRole", json!({ "role": "teacher" }));
    assert_eq!(preview.pointer("/user/role").and_then(|v| v.as_str()), Some("teacher"));
    let _ = request_ok(&mut stdin, &mut reader, "8", "teachers.list", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "9", "auth.logout", json!({}));
    let admin_again = request_ok(&mut stdin, &mut reader, "10", "auth.login", json!({
        "email": "admin@greenvalley.edu",
        "password": "password",
    }));
    assert_eq!(admin_again.pointer("/user/role").and_then(|v| v.as_str()), Some("admin"));

    let login = request_ok(&mut stdin, &mut reader, "11", "auth.login", json!({
        "email": "sunita@greenvalley.edu",
        "password": "s3cret",
    }));
    assert_eq!(login.pointer("/user/name").and_then(|v| v.as_str()), Some("Sunita Iyer"));
    let denied = request(&mut stdin, &mut reader, "12", "users.create", json!({
        "name": "Another",
        "email": "another@greenvalley.edu",
        "password": "x",
        "role": "teacher",
    }));
    assert_eq!(error_code(&denied), "forbidden");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
