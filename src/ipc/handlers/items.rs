use crate::calc::summarize_course;
use crate::input::parse_number;
use crate::ipc::error::ok;
use crate::ipc::helpers::{after_mutation, opt_text, req_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::ScoreField;
use serde_json::json;

struct ItemRef {
    course_id: String,
    category_id: String,
    item_id: String,
}

fn item_ref(req: &Request) -> Result<ItemRef, HandlerErr> {
    Ok(ItemRef {
        course_id: req_str(req, "courseId")?,
        category_id: req_str(req, "categoryId")?,
        item_id: req_str(req, "itemId")?,
    })
}

/// Derived grades for the touched course, so the caller can refresh in place.
fn updated(state: &AppState, r: &ItemRef) -> serde_json::Value {
    let course = state
        .planner
        .course(&r.course_id)
        .map(|c| summarize_course(c, state.planner.grade_cuts()));
    json!({ "itemId": r.item_id, "course": course })
}

fn handle_items_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course_id = req_str(req, "courseId")?;
    let category_id = req_str(req, "categoryId")?;
    let label = opt_text(req, "label").unwrap_or_default();
    let Some(item) = state.planner.add_item(&course_id, &category_id, &label) else {
        return Err(HandlerErr::not_found("category not found"));
    };
    after_mutation(state);
    Ok(json!({ "item": item }))
}

fn handle_items_rename(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let r = item_ref(req)?;
    let Some(label) = opt_text(req, "label") else {
        return Err(HandlerErr::bad_params("missing label"));
    };
    if !state
        .planner
        .rename_item(&r.course_id, &r.category_id, &r.item_id, &label)
    {
        return Err(HandlerErr::not_found("item not found"));
    }
    after_mutation(state);
    Ok(json!({ "itemId": r.item_id, "label": label }))
}

fn handle_items_set_score(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let r = item_ref(req)?;
    let field = req
        .params
        .get("field")
        .and_then(|v| v.as_str())
        .and_then(ScoreField::from_name)
        .ok_or_else(|| HandlerErr::bad_params("field must be one of: earned, possible"))?;
    // Non-numeric input is stored as "absent" and simply stops counting.
    let value = req.params.get("value").and_then(parse_number);
    if !state
        .planner
        .set_item_score(&r.course_id, &r.category_id, &r.item_id, field, value)
    {
        return Err(HandlerErr::not_found("item not found"));
    }
    after_mutation(state);
    Ok(updated(state, &r))
}

fn handle_items_set_full(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let r = item_ref(req)?;
    if !state
        .planner
        .set_item_to_full(&r.course_id, &r.category_id, &r.item_id)
    {
        return Err(HandlerErr::not_found("item not found"));
    }
    after_mutation(state);
    Ok(updated(state, &r))
}

fn handle_items_set_zero(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let r = item_ref(req)?;
    if !state
        .planner
        .set_item_to_zero(&r.course_id, &r.category_id, &r.item_id)
    {
        return Err(HandlerErr::not_found("item not found"));
    }
    after_mutation(state);
    Ok(updated(state, &r))
}

fn handle_items_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let r = item_ref(req)?;
    if !state
        .planner
        .remove_item(&r.course_id, &r.category_id, &r.item_id)
    {
        return Err(HandlerErr::not_found("item not found"));
    }
    after_mutation(state);
    Ok(updated(state, &r))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "items.create" => handle_items_create(state, req),
        "items.rename" => handle_items_rename(state, req),
        "items.setScore" => handle_items_set_score(state, req),
        "items.setFull" => handle_items_set_full(state, req),
        "items.setZero" => handle_items_set_zero(state, req),
        "items.delete" => handle_items_delete(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
