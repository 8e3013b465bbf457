use crate::calc::{summarize_course, CourseSummary};
use crate::input::{parse_number, parse_number_or};
use crate::ipc::error::ok;
use crate::ipc::helpers::{after_mutation, opt_text, req_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::DEFAULT_CATEGORY_WEIGHT;
use serde_json::json;

fn course_summary(state: &AppState, course_id: &str) -> Option<CourseSummary> {
    state
        .planner
        .course(course_id)
        .map(|c| summarize_course(c, state.planner.grade_cuts()))
}

fn handle_categories_create(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let name = opt_text(req, "name").unwrap_or_default();
    let weight = parse_number_or(req.params.get("weight"), DEFAULT_CATEGORY_WEIGHT);
    let Some(category) = state.planner.add_category(&course_id, &name, weight) else {
        return Err(HandlerErr::not_found("course not found"));
    };
    after_mutation(state);
    Ok(json!({ "category": category, "course": course_summary(state, &course_id) }))
}

fn handle_categories_rename(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let category_id = req_str(req, "categoryId")?;
    let Some(name) = opt_text(req, "name") else {
        return Err(HandlerErr::bad_params("missing name"));
    };
    if !state.planner.rename_category(&course_id, &category_id, &name) {
        return Err(HandlerErr::not_found("category not found"));
    }
    after_mutation(state);
    Ok(json!({ "categoryId": category_id, "name": name }))
}

/// `percent` that does not parse leaves the weight untouched.
fn handle_categories_set_weight(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let category_id = req_str(req, "categoryId")?;
    let exists = state
        .planner
        .course(&course_id)
        .and_then(|c| c.category(&category_id))
        .is_some();
    if !exists {
        return Err(HandlerErr::not_found("category not found"));
    }
    let percent = req.params.get("percent").and_then(parse_number);
    let applied = state
        .planner
        .set_category_weight(&course_id, &category_id, percent);
    if applied {
        after_mutation(state);
    }
    Ok(json!({ "applied": applied, "course": course_summary(state, &course_id) }))
}

fn handle_categories_delete(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let category_id = req_str(req, "categoryId")?;
    if !state.planner.remove_category(&course_id, &category_id) {
        return Err(HandlerErr::not_found("category not found"));
    }
    after_mutation(state);
    Ok(json!({ "deleted": category_id, "course": course_summary(state, &course_id) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "categories.create" => handle_categories_create(state, req),
        "categories.rename" => handle_categories_rename(state, req),
        "categories.setWeight" => handle_categories_set_weight(state, req),
        "categories.delete" => handle_categories_delete(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
