use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::store::PlannerStore;
use crate::whatif::WhatIfSimulator;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the process owns. Without a workspace the planner still works
/// but nothing is persisted.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub planner: PlannerStore,
    pub what_if: WhatIfSimulator,
}

impl AppState {
    pub fn new() -> Self {
        let planner = PlannerStore::default();
        let mut what_if = WhatIfSimulator::new();
        what_if.reset(&planner);
        Self {
            workspace: None,
            db: None,
            planner,
            what_if,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
