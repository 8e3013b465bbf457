use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::planner_view;
use crate::ipc::types::{AppState, Request};
use crate::store::{PlannerStore, STORAGE_KEY};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Open the workspace store and load its planner (or the default one).
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    // An unreadable row is treated like an empty store; startup never fails on content.
    let raw = match db::kv_get(&conn, STORAGE_KEY) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("failed to read persisted planner: {:#}", e);
            None
        }
    };
    state.planner = PlannerStore::load_or_default(raw.as_deref());
    state.what_if.reset(&state.planner);
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    tracing::info!(
        workspace = %path.display(),
        courses = state.planner.courses().len(),
        "workspace opened"
    );
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => {
            let mut result = planner_view(state);
            result["workspacePath"] = json!(path.to_string_lossy());
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_planner_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, planner_view(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "planner.get" => Some(handle_planner_get(state, req)),
        _ => None,
    }
}
