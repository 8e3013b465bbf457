use crate::calc::summarize_course;
use crate::ipc::error::ok;
use crate::ipc::helpers::{after_mutation, opt_text, planner_view, req_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_courses_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = opt_text(req, "name").unwrap_or_default();
    let course = state.planner.add_course(&name);
    after_mutation(state);
    ok(
        &req.id,
        json!({ "courseId": course.id, "name": course.name }),
    )
}

fn handle_courses_rename(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let Some(name) = opt_text(req, "name") else {
        return Err(HandlerErr::bad_params("missing name"));
    };
    if !state.planner.rename_course(&course_id, &name) {
        return Err(HandlerErr::not_found("course not found"));
    }
    after_mutation(state);
    Ok(json!({ "courseId": course_id, "name": name }))
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    if !state.planner.remove_course(&course_id) {
        return Err(HandlerErr::not_found("course not found"));
    }
    after_mutation(state);
    Ok(json!({
        "deleted": course_id,
        "currentCourseId": state.planner.current_course_id(),
    }))
}

fn handle_courses_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    if !state.planner.select_course(&course_id) {
        return Err(HandlerErr::not_found("course not found"));
    }
    after_mutation(state);
    Ok(planner_view(state))
}

fn handle_courses_apply_preset_8020(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    if !state.planner.apply_preset_8020(&course_id) {
        return Err(HandlerErr::not_found("course not found"));
    }
    after_mutation(state);
    let course = state
        .planner
        .course(&course_id)
        .map(|c| summarize_course(c, state.planner.grade_cuts()));
    Ok(json!({ "course": course }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "courses.create" => return Some(handle_courses_create(state, req)),
        "courses.rename" => handle_courses_rename(state, req),
        "courses.delete" => handle_courses_delete(state, req),
        "courses.select" => handle_courses_select(state, req),
        "courses.applyPreset8020" => handle_courses_apply_preset_8020(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
