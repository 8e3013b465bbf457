use crate::calc::summarize_course;
use crate::db;
use crate::input::parse_text;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::STORAGE_KEY;
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: "not_found",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Required string param (ids).
pub fn req_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) => Ok(v.to_string()),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Optional text param; numbers are accepted and rendered as text.
pub fn opt_text(req: &Request, key: &str) -> Option<String> {
    req.params.get(key).and_then(parse_text)
}

/// Write the snapshot to the workspace store. Best-effort: a failure is logged
/// and the in-memory planner keeps serving the session.
pub fn persist(state: &AppState) {
    let Some(conn) = state.db.as_ref() else {
        return;
    };
    let text = match serde_json::to_string(&state.planner.export_snapshot()) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!("failed to serialize planner snapshot: {}", e);
            return;
        }
    };
    if let Err(e) = db::kv_set(conn, STORAGE_KEY, &text) {
        tracing::warn!("failed to persist planner snapshot: {:#}", e);
    }
}

/// Run after every successful planner mutation.
pub fn after_mutation(state: &mut AppState) {
    state.what_if.reconcile(&state.planner);
    persist(state);
}

/// Course tabs, the selected course with derived grades, cuts and what-if.
pub fn planner_view(state: &AppState) -> serde_json::Value {
    let planner = &state.planner;
    let courses: Vec<serde_json::Value> = planner
        .courses()
        .iter()
        .map(|c| json!({ "id": c.id, "name": c.name }))
        .collect();
    let current = planner
        .current_course()
        .map(|c| summarize_course(c, planner.grade_cuts()));
    json!({
        "courses": courses,
        "currentCourseId": planner.current_course_id(),
        "currentCourse": current,
        "gradeCuts": planner.grade_cuts(),
        "whatIf": state.what_if.view(planner),
    })
}
