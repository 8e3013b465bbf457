use crate::backup;
use crate::ipc::error::ok;
use crate::ipc::helpers::{persist, planner_view, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::ValidationError;
use serde_json::json;
use std::path::PathBuf;

fn io_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "io_failed",
        message: format!("{e:#}"),
        details: None,
    }
}

fn validation_failed(e: ValidationError) -> HandlerErr {
    HandlerErr {
        code: "validation_failed",
        message: e.to_string(),
        details: None,
    }
}

fn path_param(req: &Request) -> Option<PathBuf> {
    req.params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// Replacing the planner is atomic: the store only swaps state once the whole
/// document validated.
fn apply_import(state: &mut AppState, result: Result<(), ValidationError>) -> Result<(), HandlerErr> {
    if let Err(e) = result {
        tracing::info!("import rejected: {}", e);
        return Err(validation_failed(e));
    }
    state.what_if.reset(&state.planner);
    persist(state);
    tracing::info!(courses = state.planner.courses().len(), "import applied");
    Ok(())
}

fn handle_planner_export(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let snapshot = state.planner.export_snapshot();
    let text = serde_json::to_string_pretty(&snapshot).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: None,
    })?;
    let path = path_param(req);
    if let Some(p) = path.as_ref() {
        backup::write_export_file(p, &text).map_err(io_failed)?;
    }
    Ok(json!({
        "snapshot": snapshot,
        "text": text,
        "fileName": backup::EXPORT_FILE_NAME,
        "path": path.map(|p| p.to_string_lossy().to_string()),
    }))
}

/// Source is one of `snapshot` (a value), `text`, or `path`.
fn handle_planner_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let result = if let Some(doc) = req.params.get("snapshot") {
        state.planner.import_snapshot(doc)
    } else if let Some(text) = req.params.get("text").and_then(|v| v.as_str()) {
        state.planner.import_text(text)
    } else if let Some(path) = path_param(req) {
        let text = backup::read_import_file(&path).map_err(io_failed)?;
        state.planner.import_text(&text)
    } else {
        return Err(HandlerErr::bad_params("missing snapshot, text or path"));
    };
    apply_import(state, result)?;
    Ok(planner_view(state))
}

fn handle_backup_export_bundle(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(out_path) = path_param(req) else {
        return Err(HandlerErr::bad_params("missing path"));
    };
    let text = serde_json::to_string_pretty(&state.planner.export_snapshot()).map_err(|e| {
        HandlerErr {
            code: "io_failed",
            message: e.to_string(),
            details: None,
        }
    })?;
    let summary = backup::export_planner_bundle(&text, &out_path).map_err(|e| HandlerErr {
        code: "bundle_failed",
        message: format!("{e:#}"),
        details: None,
    })?;
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "snapshotSha256": summary.snapshot_sha256,
    }))
}

fn handle_backup_import_bundle(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(in_path) = path_param(req) else {
        return Err(HandlerErr::bad_params("missing path"));
    };
    let bundle = backup::import_planner_bundle(&in_path).map_err(|e| HandlerErr {
        code: "bundle_failed",
        message: format!("{e:#}"),
        details: None,
    })?;
    let result = state.planner.import_text(&bundle.snapshot_text);
    apply_import(state, result)?;
    let mut view = planner_view(state);
    view["bundleFormatDetected"] = json!(bundle.bundle_format_detected);
    Ok(view)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "planner.export" => handle_planner_export(state, req),
        "planner.import" => handle_planner_import(state, req),
        "backup.exportBundle" => handle_backup_export_bundle(state, req),
        "backup.importBundle" => handle_backup_import_bundle(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
