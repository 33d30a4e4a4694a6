use crate::ipc::error::respond;
use crate::ipc::params::get_required_number;
use crate::ipc::types::{AppState, Request};
use crate::reward;
use serde_json::{json, Value};

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    if req.method != "rewards.classify" {
        return None;
    }
    let result = get_required_number(&req.params, "marks").map(|marks| {
        let r = reward::classify(marks);
        json!({ "marks": marks, "reward": r.label(), "badge": r.badge() })
    });
    Some(respond(&req.id, result))
}
