use crate::cuts::CutPreset;
use crate::ipc::error::ok;
use crate::ipc::helpers::{after_mutation, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn cuts_view(state: &AppState) -> serde_json::Value {
    let cuts = state.planner.grade_cuts();
    let scale: Vec<serde_json::Value> = cuts
        .scale()
        .iter()
        .map(|(letter, min)| json!({ "letter": letter, "min": min }))
        .collect();
    json!({ "gradeCuts": cuts, "scale": scale })
}

fn handle_cuts_get(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    Ok(cuts_view(state))
}

/// Saves the settings form: non-numeric fields are skipped, the rest apply.
fn handle_cuts_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let Some(partial) = req.params.get("cuts").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("cuts must be an object"));
    };
    let applied = state.planner.update_cuts(partial);
    after_mutation(state);
    let mut view = cuts_view(state);
    view["applied"] = json!(applied);
    Ok(view)
}

fn handle_cuts_apply_preset(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let name = req
        .params
        .get("preset")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let Some(preset) = CutPreset::from_name(name) else {
        return Err(HandlerErr {
            code: "bad_params",
            message: "preset must be one of: standard, simple".to_string(),
            details: Some(json!({ "preset": name })),
        });
    };
    state.planner.apply_cut_preset(preset);
    after_mutation(state);
    Ok(cuts_view(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "cuts.get" => handle_cuts_get(state, req),
        "cuts.update" => handle_cuts_update(state, req),
        "cuts.applyPreset" => handle_cuts_apply_preset(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
