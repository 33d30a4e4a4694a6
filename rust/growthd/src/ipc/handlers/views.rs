use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{get_optional_usize, repo};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn handle_leaderboard(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let limit = get_optional_usize(&req.params, "limit")?.unwrap_or(state.settings.leaderboard_limit);
    let students = repo(state)?.top_n_by_marks(limit)?;
    Ok(json!({ "limit": limit, "students": students }))
}

fn handle_subject_performance(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let subjects = repo(state)?
        .average_marks_by_subject()?
        .into_iter()
        .map(|(subject, avg)| json!({ "subject": subject, "averageMarks": avg }))
        .collect::<Vec<_>>();
    Ok(json!({ "subjects": subjects }))
}

fn handle_marks_histogram(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let buckets = get_optional_usize(&req.params, "buckets")?.unwrap_or(state.settings.histogram_buckets);
    let histogram = repo(state)?.marks_histogram(buckets)?;
    Ok(json!({ "buckets": histogram }))
}

fn handle_progress(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let points = repo(state)?.progress_series()?;
    Ok(json!({ "points": points }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "views.leaderboard" => handle_leaderboard(state, req),
        "views.subjectPerformance" => handle_subject_performance(state, req),
        "views.marksHistogram" => handle_marks_histogram(state, req),
        "views.progress" => handle_progress(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
