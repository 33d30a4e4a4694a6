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
    let exe = env!("CARGO_BIN_EXE_growthd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn growthd");
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

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error object")
}

fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, rows: &[(&str, &str, f64, f64, f64)]) {
    for (i, (roll, subject, marks, attendance, hours)) in rows.iter().enumerate() {
        let _ = request_ok(
            stdin,
            reader,
            &format!("seed-{}", i),
            "students.add",
            json!({
                "rollNumber": roll,
                "studentName": format!("Student {}", roll),
                "subject": subject,
                "marks": marks,
                "attendance": attendance,
                "studyHours": hours
            }),
        );
    }
}

#[test]
fn leaderboard_and_subject_performance_views() {
    let workspace = temp_dir("growthd-views");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed(
        &mut stdin,
        &mut reader,
        &[
            ("1", "Math", 80.0, 90.0, 2.0),
            ("2", "Science", 70.0, 85.0, 1.0),
            ("3", "Math", 90.0, 95.0, 4.0),
            ("4", "Science", 70.0, 60.0, 0.5),
        ],
    );

    let board = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.leaderboard",
        json!({ "limit": 3 }),
    );
    let rolls: Vec<_> = board["students"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|s| s["rollNumber"].clone())
        .collect();
    assert_eq!(rolls, vec![json!("3"), json!("1"), json!("2")]);

    let all = request_ok(&mut stdin, &mut reader, "3", "views.leaderboard", json!({}));
    assert_eq!(all["limit"], json!(10));
    assert_eq!(all["students"].as_array().map(|a| a.len()), Some(4));

    let perf = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "views.subjectPerformance",
        json!({}),
    );
    assert_eq!(
        perf["subjects"],
        json!([
            { "subject": "Math", "averageMarks": 85.0 },
            { "subject": "Science", "averageMarks": 70.0 }
        ])
    );

    let progress = request_ok(&mut stdin, &mut reader, "5", "views.progress", json!({}));
    let points = progress["points"].as_array().cloned().unwrap_or_default();
    assert_eq!(points.len(), 4);
    assert_eq!(points[3]["rollNumber"], json!("4"));
    assert_eq!(points[3]["attendance"].as_f64(), Some(60.0));
    assert_eq!(points[3]["studyHours"].as_f64(), Some(0.5));

    let bad = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "views.leaderboard",
        json!({ "limit": -1 }),
    );
    assert_eq!(bad["code"], json!("bad_params"));
}

#[test]
fn marks_histogram_uses_config_default_and_handles_equal_marks() {
    let workspace = temp_dir("growthd-histogram");
    std::fs::write(
        workspace.join("growthd.toml"),
        "histogram_buckets = 4\nleaderboard_limit = 1\n",
    )
    .expect("write config");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let empty = request_ok(&mut stdin, &mut reader, "2", "views.marksHistogram", json!({}));
    assert_eq!(empty["buckets"], json!([]));

    seed(
        &mut stdin,
        &mut reader,
        &[("1", "Math", 60.0, 90.0, 1.0), ("2", "Math", 60.0, 90.0, 1.0)],
    );
    let flat = request_ok(&mut stdin, &mut reader, "3", "views.marksHistogram", json!({}));
    assert_eq!(
        flat["buckets"],
        json!([{ "lower": 60.0, "upper": 60.0, "count": 2 }])
    );

    seed(
        &mut stdin,
        &mut reader,
        &[("3", "Math", 20.0, 90.0, 1.0), ("4", "Math", 100.0, 90.0, 1.0)],
    );
    let spread = request_ok(&mut stdin, &mut reader, "4", "views.marksHistogram", json!({}));
    let counts: Vec<_> = spread["buckets"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|b| b["count"].as_u64().unwrap_or(0))
        .collect();
    // Width 20 over [20, 100]: {20} {} {60, 60} {100}
    assert_eq!(counts, vec![1, 0, 2, 1]);

    let two = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "views.marksHistogram",
        json!({ "buckets": 2 }),
    );
    assert_eq!(two["buckets"].as_array().map(|a| a.len()), Some(2));

    let zero = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "views.marksHistogram",
        json!({ "buckets": 0 }),
    );
    assert_eq!(zero["code"], json!("bad_params"));

    for (id, buckets) in [("6a", json!(1001)), ("6b", json!(4_611_686_018_427_387_904u64))] {
        let huge = request_err(
            &mut stdin,
            &mut reader,
            id,
            "views.marksHistogram",
            json!({ "buckets": buckets }),
        );
        assert_eq!(huge["code"], json!("bad_params"), "{huge}");
    }

    let board = request_ok(&mut stdin, &mut reader, "7", "views.leaderboard", json!({}));
    assert_eq!(board["students"][0]["rollNumber"], json!("4"));
    assert_eq!(board["students"].as_array().map(|a| a.len()), Some(1));
}

#[test]
fn rewards_classify_covers_every_tier() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let cases = [
        (json!(95), "Gold"),
        (json!(90), "Gold"),
        (json!(85), "Silver"),
        (json!(70), "Bronze"),
        (json!(60.5), "Great Effort"),
        (json!(50), "Keep Trying"),
        (json!(42), "Better luck next time"),
        (json!(-5), "Better luck next time"),
        (json!(130), "Gold"),
        (json!("75"), "Bronze"),
    ];
    for (i, (marks, expected)) in cases.iter().enumerate() {
        let r = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "rewards.classify",
            json!({ "marks": marks }),
        );
        assert_eq!(r["reward"], json!(expected), "marks {}", marks);
    }

    let missing = request_err(&mut stdin, &mut reader, "x", "rewards.classify", json!({}));
    assert_eq!(missing["code"], json!("bad_params"));
}
