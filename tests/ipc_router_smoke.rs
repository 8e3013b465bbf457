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
    let exe = env!("CARGO_BIN_EXE_gradeplannerd");
    let mut child = Command::new(exe)
        .env_remove("GRADEPLANNERD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradeplannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
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
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("gradeplanner-router-smoke");
    let export_out = workspace.join("export.json");
    let bundle_out = workspace.join("smoke.gpbundle.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").is_some());
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["courses"].as_array().map(|a| a.len()), Some(1));

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.create",
        json!({ "name": "Smoke Course" }),
    );
    let course_id = created["courseId"].as_str().expect("courseId").to_string();
    let cat = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "categories.create",
        json!({ "courseId": course_id, "name": "Quizzes", "weight": 1 }),
    );
    let category_id = cat["category"]["id"].as_str().expect("category id").to_string();
    let item = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "items.create",
        json!({ "courseId": course_id, "categoryId": category_id }),
    );
    let item_id = item["item"]["id"].as_str().expect("item id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "items.setScore",
        json!({ "courseId": course_id, "categoryId": category_id, "itemId": item_id, "field": "possible", "value": 10 }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "7", "cuts.get", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "whatif.set",
        json!({ "courseId": course_id, "earned": 9, "possible": 10 }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "9", "planner.get", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "planner.export",
        json!({ "path": export_out.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "backup.exportBundle",
        json!({ "path": bundle_out.to_string_lossy() }),
    );
    assert!(export_out.is_file());
    assert!(bundle_out.is_file());

    let unknown = request(&mut stdin, &mut reader, "12", "nope.nothing", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    writeln!(stdin, "this is not json").expect("write junk");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json response");
    let bad: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(error_code(&bad), Some("bad_json"));

    let still_alive = request_ok(&mut stdin, &mut reader, "13", "health", json!({}));
    assert!(still_alive.get("workspacePath").is_some());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_ids_are_reported_not_found() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "courses.rename",
        json!({ "courseId": "ghost", "name": "x" }),
    );
    assert_eq!(error_code(&resp), Some("not_found"));
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "items.setFull",
        json!({ "courseId": "ghost", "categoryId": "ghost", "itemId": "ghost" }),
    );
    assert_eq!(error_code(&resp), Some("not_found"));
    let resp = request(&mut stdin, &mut reader, "3", "courses.delete", json!({}));
    assert_eq!(error_code(&resp), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
