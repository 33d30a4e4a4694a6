use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{
    get_required_number, get_required_str, get_required_text, repo, repo_mut,
};
use crate::ipc::types::{AppState, Request};
use crate::record::StudentRecord;
use crate::reward;
use serde_json::{json, Value};

fn record_from_params(params: &Value) -> Result<StudentRecord, HandlerErr> {
    Ok(StudentRecord {
        roll_number: get_required_text(params, "rollNumber")?,
        student_name: get_required_str(params, "studentName")?,
        subject: get_required_str(params, "subject")?,
        marks: get_required_number(params, "marks")?,
        attendance: get_required_number(params, "attendance")?,
        study_hours: get_required_number(params, "studyHours")?,
    })
}

fn handle_students_add(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let repo = repo_mut(state)?;
    let record = record_from_params(&req.params)?;
    repo.add(&record)?;
    let r = reward::classify(record.marks);
    Ok(json!({
        "rollNumber": record.roll_number,
        "studentName": record.student_name,
        "reward": r.label(),
        "badge": r.badge(),
    }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let repo = repo_mut(state)?;
    let roll_number = get_required_text(&req.params, "rollNumber")?;
    let row = repo.delete(&roll_number)?;
    Ok(json!({ "rollNumber": roll_number, "row": row }))
}

fn handle_students_list(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let students = repo(state)?.list_all()?;
    Ok(json!({ "students": students }))
}

fn handle_students_filter(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let repo = repo(state)?;
    // Filtering on an empty query shows everyone, like an empty search box.
    let query = match req.params.get("query") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(HandlerErr::bad_params("query must be a string")),
    };
    let students = repo.filter_by_roll_substring(&query)?;
    Ok(json!({ "query": query, "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.add" => handle_students_add(state, req),
        "students.delete" => handle_students_delete(state, req),
        "students.list" => handle_students_list(state, req),
        "students.filter" => handle_students_filter(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
