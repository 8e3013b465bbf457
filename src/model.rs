use crate::cuts::GradeCutTable;
use crate::input::{parse_id, parse_number, parse_number_or, parse_text};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub label: String,
    /// `None` when the stored value was blank or not a number.
    pub earned: Option<f64>,
    pub possible: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
}

/// The persisted / exported document shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerSnapshot {
    pub courses: Vec<Course>,
    pub grade_cuts: GradeCutTable,
    pub current_course_id: Option<String>,
}

impl Item {
    pub fn new(label: impl Into<String>, earned: f64, possible: f64) -> Self {
        Self {
            id: new_id(),
            label: label.into(),
            earned: Some(earned),
            possible: Some(possible),
        }
    }
}

impl Category {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            weight,
            items: Vec::new(),
        }
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            categories: Vec::new(),
        }
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn category_mut(&mut self, category_id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == category_id)
    }
}

/// Sample course seeded into a fresh planner.
pub fn default_course() -> Course {
    let mut assessments = Category::new("Assessments", 0.8);
    assessments.items.push(Item::new("Quiz 1", 18.0, 20.0));
    assessments.items.push(Item::new("Unit Test", 42.0, 50.0));

    let mut classwork = Category::new("Classwork/Homework", 0.2);
    classwork.items.push(Item::new("HW 1", 10.0, 10.0));
    classwork.items.push(Item::new("HW 2", 9.0, 10.0));

    let mut course = Course::new("Algebra II");
    course.categories = vec![assessments, classwork];
    course
}

// Lenient decoding of untrusted documents. Missing or mistyped fields fall back
// to defaults; missing, blank or duplicate ids get a fresh id so the uniqueness
// invariants hold for whatever was loaded.

fn unique_id(raw: Option<&Value>, seen: &mut HashSet<String>) -> String {
    let id = match parse_id(raw) {
        Some(id) if !seen.contains(&id) => id,
        _ => new_id(),
    };
    seen.insert(id.clone());
    id
}

fn text_or_empty(raw: Option<&Value>) -> String {
    raw.and_then(parse_text).unwrap_or_default()
}

fn decode_items(raw: Option<&Value>) -> Vec<Item> {
    let Some(arr) = raw.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    arr.iter()
        .filter_map(|v| v.as_object())
        .map(|obj| Item {
            id: unique_id(obj.get("id"), &mut seen),
            label: text_or_empty(obj.get("label")),
            earned: obj.get("earned").and_then(parse_number),
            possible: obj.get("possible").and_then(parse_number),
        })
        .collect()
}

fn decode_categories(raw: Option<&Value>) -> Vec<Category> {
    let Some(arr) = raw.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    arr.iter()
        .filter_map(|v| v.as_object())
        .map(|obj| Category {
            id: unique_id(obj.get("id"), &mut seen),
            name: text_or_empty(obj.get("name")),
            weight: parse_number_or(obj.get("weight"), 0.0),
            items: decode_items(obj.get("items")),
        })
        .collect()
}

/// Decode a `courses` array. Entries that are not objects are dropped.
pub fn decode_courses(arr: &[Value]) -> Vec<Course> {
    let mut seen = HashSet::new();
    arr.iter()
        .filter_map(|v| v.as_object())
        .map(|obj| Course {
            id: unique_id(obj.get("id"), &mut seen),
            name: text_or_empty(obj.get("name")),
            categories: decode_categories(obj.get("categories")),
        })
        .collect()
}
