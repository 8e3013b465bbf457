use crate::input::parse_number;
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_whatif_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.what_if.view(&state.planner)))
}

/// Any subset of `courseId`, `categoryId`, `earned`, `possible`. A course change
/// resets the category before `categoryId` is applied. Targets that do not
/// resolve clear the selection instead of failing.
fn handle_whatif_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params = &req.params;
    if let Some(course_id) = params.get("courseId").and_then(|v| v.as_str()) {
        state.what_if.retarget_course(&state.planner, course_id);
    }
    if let Some(category_id) = params.get("categoryId").and_then(|v| v.as_str()) {
        state.what_if.set_category(&state.planner, category_id);
    }
    if let Some(v) = params.get("earned") {
        state.what_if.set_earned(parse_number(v));
    }
    if let Some(v) = params.get("possible") {
        state.what_if.set_possible(parse_number(v));
    }
    ok(&req.id, json!(state.what_if.view(&state.planner)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "whatif.get" => Some(handle_whatif_get(state, req)),
        "whatif.set" => Some(handle_whatif_set(state, req)),
        _ => None,
    }
}
