use crate::cuts::{CutPreset, GradeCutTable};
use crate::input::{clamp_unit, parse_id};
use crate::model::{decode_courses, default_course, Category, Course, Item, PlannerSnapshot};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key under which the snapshot is persisted.
pub const STORAGE_KEY: &str = "gradeplanner:v2";

pub const DEFAULT_COURSE_NAME: &str = "New Course";
pub const DEFAULT_CATEGORY_NAME: &str = "New Category";
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.5;
pub const DEFAULT_ITEM_LABEL: &str = "New Item";

/// Import rejected as a whole; the planner is left as it was.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("courses must be an array")]
    CoursesNotSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Earned,
    Possible,
}

impl ScoreField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "earned" => Some(Self::Earned),
            "possible" => Some(Self::Possible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    pub courses: Vec<Course>,
    pub grade_cuts: GradeCutTable,
    pub current_course_id: Option<String>,
}

impl Default for PlannerState {
    fn default() -> Self {
        let course = default_course();
        Self {
            current_course_id: Some(course.id.clone()),
            courses: vec![course],
            grade_cuts: GradeCutTable::default(),
        }
    }
}

/// Owns the planner state. Mutations return `false`/`None` when an id does not
/// resolve; nothing here fails on bad references or bad numbers. Callers save
/// after every mutation that reported a change.
#[derive(Debug, Clone, Default)]
pub struct PlannerStore {
    state: PlannerState,
}

impl PlannerStore {
    pub fn new(state: PlannerState) -> Self {
        let mut store = Self { state };
        store.ensure_current_course();
        store
    }

    /// Build from persisted text. Missing or unreadable content gives the
    /// default planner; this never fails.
    pub fn load_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let doc: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("persisted planner is not valid JSON, starting fresh: {}", e);
                return Self::default();
            }
        };

        let courses = match doc.get("courses").and_then(|v| v.as_array()) {
            Some(arr) => decode_courses(arr),
            None => vec![default_course()],
        };
        let mut grade_cuts = GradeCutTable::default();
        if let Some(obj) = doc.get("gradeCuts").and_then(|v| v.as_object()) {
            grade_cuts.update(obj);
        }
        Self::new(PlannerState {
            courses,
            grade_cuts,
            current_course_id: parse_id(doc.get("currentCourseId")),
        })
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn courses(&self) -> &[Course] {
        &self.state.courses
    }

    pub fn grade_cuts(&self) -> &GradeCutTable {
        &self.state.grade_cuts
    }

    pub fn current_course_id(&self) -> Option<&str> {
        self.state.current_course_id.as_deref()
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.state.courses.iter().find(|c| c.id == id)
    }

    pub fn current_course(&self) -> Option<&Course> {
        self.course(self.current_course_id()?)
    }

    fn course_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.state.courses.iter_mut().find(|c| c.id == id)
    }

    fn category_mut(&mut self, course_id: &str, category_id: &str) -> Option<&mut Category> {
        self.course_mut(course_id)?.category_mut(category_id)
    }

    fn item_mut(&mut self, course_id: &str, category_id: &str, item_id: &str) -> Option<&mut Item> {
        self.category_mut(course_id, category_id)?.item_mut(item_id)
    }

    /// Keep the selection pointing at an existing course (first one as fallback).
    fn ensure_current_course(&mut self) {
        let valid = self
            .state
            .current_course_id
            .as_deref()
            .map(|id| self.state.courses.iter().any(|c| c.id == id))
            .unwrap_or(false);
        if !valid {
            self.state.current_course_id = self.state.courses.first().map(|c| c.id.clone());
        }
    }

    pub fn add_course(&mut self, name: &str) -> Course {
        let name = if name.trim().is_empty() {
            DEFAULT_COURSE_NAME
        } else {
            name
        };
        let course = Course::new(name);
        self.state.current_course_id = Some(course.id.clone());
        self.state.courses.push(course.clone());
        course
    }

    /// Remove a course. If it was selected, the selection moves to whatever now
    /// sits at the same position, else the one before it, else nothing.
    pub fn remove_course(&mut self, id: &str) -> bool {
        let Some(idx) = self.state.courses.iter().position(|c| c.id == id) else {
            return false;
        };
        self.state.courses.remove(idx);
        if self.current_course_id() == Some(id) {
            let next = self
                .state
                .courses
                .get(idx)
                .or_else(|| idx.checked_sub(1).and_then(|i| self.state.courses.get(i)));
            self.state.current_course_id = next.map(|c| c.id.clone());
        }
        self.ensure_current_course();
        true
    }

    pub fn rename_course(&mut self, id: &str, name: &str) -> bool {
        let Some(course) = self.course_mut(id) else {
            return false;
        };
        course.name = name.to_string();
        true
    }

    pub fn select_course(&mut self, id: &str) -> bool {
        if self.course(id).is_none() {
            return false;
        }
        self.state.current_course_id = Some(id.to_string());
        true
    }

    /// Replace the course structure with an empty 80/20 split.
    pub fn apply_preset_8020(&mut self, course_id: &str) -> bool {
        let Some(course) = self.course_mut(course_id) else {
            return false;
        };
        course.categories = vec![
            Category::new("Assessments", 0.8),
            Category::new("Classwork/Homework", 0.2),
        ];
        true
    }

    pub fn add_category(&mut self, course_id: &str, name: &str, weight: f64) -> Option<Category> {
        let course = self.course_mut(course_id)?;
        let name = if name.trim().is_empty() {
            DEFAULT_CATEGORY_NAME
        } else {
            name
        };
        let weight = if weight.is_finite() {
            clamp_unit(weight)
        } else {
            DEFAULT_CATEGORY_WEIGHT
        };
        let category = Category::new(name, weight);
        course.categories.push(category.clone());
        Some(category)
    }

    pub fn rename_category(&mut self, course_id: &str, category_id: &str, name: &str) -> bool {
        let Some(cat) = self.category_mut(course_id, category_id) else {
            return false;
        };
        cat.name = name.to_string();
        true
    }

    /// Store `percent / 100` clamped to [0, 1]. An unparsable value is ignored.
    pub fn set_category_weight(
        &mut self,
        course_id: &str,
        category_id: &str,
        percent: Option<f64>,
    ) -> bool {
        let Some(percent) = percent.filter(|p| p.is_finite()) else {
            return false;
        };
        let Some(cat) = self.category_mut(course_id, category_id) else {
            return false;
        };
        cat.weight = clamp_unit(percent / 100.0);
        true
    }

    pub fn remove_category(&mut self, course_id: &str, category_id: &str) -> bool {
        let Some(course) = self.course_mut(course_id) else {
            return false;
        };
        let before = course.categories.len();
        course.categories.retain(|c| c.id != category_id);
        course.categories.len() != before
    }

    pub fn add_item(&mut self, course_id: &str, category_id: &str, label: &str) -> Option<Item> {
        let cat = self.category_mut(course_id, category_id)?;
        let label = if label.trim().is_empty() {
            DEFAULT_ITEM_LABEL
        } else {
            label
        };
        let item = Item::new(label, 0.0, 0.0);
        cat.items.push(item.clone());
        Some(item)
    }

    pub fn rename_item(
        &mut self,
        course_id: &str,
        category_id: &str,
        item_id: &str,
        label: &str,
    ) -> bool {
        let Some(item) = self.item_mut(course_id, category_id, item_id) else {
            return false;
        };
        item.label = label.to_string();
        true
    }

    /// No clamping: zero or negative values are stored and later skipped by the
    /// grade math. `None` stores "absent".
    pub fn set_item_score(
        &mut self,
        course_id: &str,
        category_id: &str,
        item_id: &str,
        field: ScoreField,
        value: Option<f64>,
    ) -> bool {
        let Some(item) = self.item_mut(course_id, category_id, item_id) else {
            return false;
        };
        let value = value.filter(|v| v.is_finite());
        match field {
            ScoreField::Earned => item.earned = value,
            ScoreField::Possible => item.possible = value,
        }
        true
    }

    pub fn set_item_to_full(&mut self, course_id: &str, category_id: &str, item_id: &str) -> bool {
        let Some(item) = self.item_mut(course_id, category_id, item_id) else {
            return false;
        };
        item.earned = item.possible;
        true
    }

    pub fn set_item_to_zero(&mut self, course_id: &str, category_id: &str, item_id: &str) -> bool {
        let Some(item) = self.item_mut(course_id, category_id, item_id) else {
            return false;
        };
        item.earned = Some(0.0);
        true
    }

    pub fn remove_item(&mut self, course_id: &str, category_id: &str, item_id: &str) -> bool {
        let Some(cat) = self.category_mut(course_id, category_id) else {
            return false;
        };
        let before = cat.items.len();
        cat.items.retain(|i| i.id != item_id);
        cat.items.len() != before
    }

    pub fn apply_cut_preset(&mut self, preset: CutPreset) {
        self.state.grade_cuts.apply_preset(preset);
    }

    pub fn update_cuts(&mut self, partial: &Map<String, Value>) -> usize {
        self.state.grade_cuts.update(partial)
    }

    pub fn export_snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot {
            courses: self.state.courses.clone(),
            grade_cuts: self.state.grade_cuts,
            current_course_id: self.state.current_course_id.clone(),
        }
    }

    /// Replace the whole planner from an imported document. Only `courses` is
    /// validated; everything else decodes permissively. On error nothing changes.
    pub fn import_snapshot(&mut self, doc: &Value) -> Result<(), ValidationError> {
        let Some(arr) = doc.get("courses").and_then(|v| v.as_array()) else {
            return Err(ValidationError::CoursesNotSequence);
        };
        let courses = decode_courses(arr);

        // A partial table fills its gaps from the defaults, never from the session.
        let grade_cuts = match doc.get("gradeCuts").and_then(|v| v.as_object()) {
            Some(obj) => {
                let mut table = GradeCutTable::default();
                table.update(obj);
                table
            }
            None => self.state.grade_cuts,
        };

        let mut next = Self {
            state: PlannerState {
                courses,
                grade_cuts,
                current_course_id: parse_id(doc.get("currentCourseId")),
            },
        };
        next.ensure_current_course();
        *self = next;
        Ok(())
    }

    pub fn import_text(&mut self, text: &str) -> Result<(), ValidationError> {
        let doc: Value = serde_json::from_str(text).map_err(ValidationError::InvalidJson)?;
        self.import_snapshot(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::course_grade;
    use serde_json::json;

    fn store_with_courses(names: &[&str]) -> PlannerStore {
        let mut store = PlannerStore::new(PlannerState {
            courses: Vec::new(),
            grade_cuts: GradeCutTable::default(),
            current_course_id: None,
        });
        for n in names {
            store.add_course(n);
        }
        store
    }

    fn id_of(store: &PlannerStore, idx: usize) -> String {
        store.courses()[idx].id.clone()
    }

    #[test]
    fn default_planner_has_sample_course_selected() {
        let store = PlannerStore::default();
        assert_eq!(store.courses().len(), 1);
        let course = store.current_course().expect("selected");
        assert_eq!(course.name, "Algebra II");
        assert_eq!(course.categories.len(), 2);
        assert!(course_grade(course).is_some());
    }

    #[test]
    fn add_course_selects_it() {
        let mut store = PlannerStore::default();
        let c = store.add_course("");
        assert_eq!(c.name, DEFAULT_COURSE_NAME);
        assert!(c.categories.is_empty());
        assert_eq!(store.current_course_id(), Some(c.id.as_str()));
    }

    #[test]
    fn removing_selected_first_course_selects_new_first() {
        let mut store = store_with_courses(&["a", "b", "c"]);
        let (a, b) = (id_of(&store, 0), id_of(&store, 1));
        store.select_course(&a);
        assert!(store.remove_course(&a));
        assert_eq!(store.current_course_id(), Some(b.as_str()));
    }

    #[test]
    fn removing_selected_middle_course_selects_same_position() {
        let mut store = store_with_courses(&["a", "b", "c"]);
        let (b, c) = (id_of(&store, 1), id_of(&store, 2));
        store.select_course(&b);
        store.remove_course(&b);
        assert_eq!(store.current_course_id(), Some(c.as_str()));
    }

    #[test]
    fn removing_selected_last_course_selects_previous() {
        let mut store = store_with_courses(&["a", "b", "c"]);
        let (b, c) = (id_of(&store, 1), id_of(&store, 2));
        store.select_course(&c);
        store.remove_course(&c);
        assert_eq!(store.current_course_id(), Some(b.as_str()));
    }

    #[test]
    fn removing_only_course_clears_selection() {
        let mut store = store_with_courses(&["a"]);
        let a = id_of(&store, 0);
        store.remove_course(&a);
        assert!(store.courses().is_empty());
        assert_eq!(store.current_course_id(), None);
    }

    #[test]
    fn removing_unselected_course_keeps_selection() {
        let mut store = store_with_courses(&["a", "b", "c"]);
        let (a, c) = (id_of(&store, 0), id_of(&store, 2));
        store.select_course(&a);
        store.remove_course(&c);
        assert_eq!(store.current_course_id(), Some(a.as_str()));
        assert!(!store.remove_course("missing"));
    }

    #[test]
    fn select_unknown_course_is_noop() {
        let mut store = store_with_courses(&["a", "b"]);
        let b = id_of(&store, 1);
        assert!(!store.select_course("nope"));
        assert_eq!(store.current_course_id(), Some(b.as_str()));
    }

    #[test]
    fn weight_is_percent_clamped() {
        let mut store = PlannerStore::default();
        let course = store.courses()[0].clone();
        let cat = course.categories[0].id.clone();
        assert!(store.set_category_weight(&course.id, &cat, Some(35.0)));
        assert_eq!(store.courses()[0].categories[0].weight, 0.35);
        store.set_category_weight(&course.id, &cat, Some(250.0));
        assert_eq!(store.courses()[0].categories[0].weight, 1.0);
        store.set_category_weight(&course.id, &cat, Some(-5.0));
        assert_eq!(store.courses()[0].categories[0].weight, 0.0);
        assert!(!store.set_category_weight(&course.id, &cat, None));
        assert_eq!(store.courses()[0].categories[0].weight, 0.0);
    }

    #[test]
    fn item_lifecycle_and_full_zero() {
        let mut store = PlannerStore::default();
        let course_id = id_of(&store, 0);
        let cat = store
            .add_category(&course_id, "Labs", 0.3)
            .expect("category");
        let item = store.add_item(&course_id, &cat.id, "").expect("item");
        assert_eq!(item.label, DEFAULT_ITEM_LABEL);
        assert_eq!((item.earned, item.possible), (Some(0.0), Some(0.0)));

        store.set_item_to_full(&course_id, &cat.id, &item.id);
        let got = |s: &PlannerStore| s.courses()[0].categories[2].items[0].clone();
        assert_eq!(got(&store).earned, Some(0.0));

        store.set_item_score(&course_id, &cat.id, &item.id, ScoreField::Possible, Some(25.0));
        store.set_item_to_full(&course_id, &cat.id, &item.id);
        assert_eq!(got(&store).earned, Some(25.0));
        store.set_item_to_zero(&course_id, &cat.id, &item.id);
        assert_eq!(got(&store).earned, Some(0.0));

        store.set_item_score(&course_id, &cat.id, &item.id, ScoreField::Possible, Some(-4.0));
        assert_eq!(got(&store).possible, Some(-4.0));
        store.set_item_score(&course_id, &cat.id, &item.id, ScoreField::Earned, None);
        assert_eq!(got(&store).earned, None);

        assert!(store.remove_item(&course_id, &cat.id, &item.id));
        assert!(!store.remove_item(&course_id, &cat.id, &item.id));
    }

    #[test]
    fn remove_category_cascades_items() {
        let mut store = PlannerStore::default();
        let course_id = id_of(&store, 0);
        let cat_id = store.courses()[0].categories[0].id.clone();
        assert!(store.remove_category(&course_id, &cat_id));
        assert_eq!(store.courses()[0].categories.len(), 1);
        assert!(!store.rename_category(&course_id, &cat_id, "gone"));
    }

    #[test]
    fn preset_8020_replaces_structure() {
        let mut store = PlannerStore::default();
        let course_id = id_of(&store, 0);
        let old: Vec<String> = store.courses()[0]
            .categories
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert!(store.apply_preset_8020(&course_id));
        let cats = &store.courses()[0].categories;
        assert_eq!(cats.len(), 2);
        assert_eq!((cats[0].name.as_str(), cats[0].weight), ("Assessments", 0.8));
        assert_eq!((cats[1].name.as_str(), cats[1].weight), ("Classwork/Homework", 0.2));
        assert!(cats.iter().all(|c| c.items.is_empty() && !old.contains(&c.id)));
        assert_eq!(course_grade(&store.courses()[0]), None);
    }

    #[test]
    fn import_without_courses_array_changes_nothing() {
        let mut store = PlannerStore::default();
        store.apply_cut_preset(CutPreset::Simple);
        let before = store.state().clone();

        let err = store
            .import_snapshot(&json!({ "courses": { "not": "a list" }, "gradeCuts": { "A": 1 } }))
            .expect_err("must reject");
        assert!(matches!(err, ValidationError::CoursesNotSequence));
        assert!(store.import_snapshot(&json!({})).is_err());
        let err = store.import_text("{ nope").expect_err("must reject");
        assert_eq!(err.to_string(), "Invalid JSON");
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn export_import_round_trip() {
        let mut store = PlannerStore::default();
        store.add_course("Chem");
        let first = id_of(&store, 0);
        store.select_course(&first);
        store.update_cuts(json!({ "A": 94.5 }).as_object().expect("object"));
        let snapshot = serde_json::to_value(store.export_snapshot()).expect("serialize");

        let mut other = store_with_courses(&["x"]);
        other.import_snapshot(&snapshot).expect("import");
        assert_eq!(other.state(), store.state());
    }

    #[test]
    fn import_keeps_cuts_when_absent_and_falls_back_on_selection() {
        let mut store = PlannerStore::default();
        store.apply_cut_preset(CutPreset::Simple);
        store
            .import_snapshot(&json!({
                "courses": [{ "id": "c1", "name": "One" }, { "id": "c2", "name": "Two" }],
                "currentCourseId": "missing"
            }))
            .expect("import");
        assert_eq!(store.grade_cuts(), &crate::cuts::SIMPLE_CUTS);
        assert_eq!(store.current_course_id(), Some("c1"));

        store.import_snapshot(&json!({ "courses": [] })).expect("import");
        assert_eq!(store.current_course_id(), None);
    }

    #[test]
    fn imported_partial_cuts_fill_from_defaults() {
        let mut store = PlannerStore::default();
        store.apply_cut_preset(CutPreset::Simple);
        store
            .import_snapshot(&json!({ "courses": [], "gradeCuts": { "A": 95, "Bminus": "x" } }))
            .expect("import");
        let cuts = store.grade_cuts();
        assert_eq!(cuts.a, 95.0);
        assert_eq!(cuts.a_minus, crate::cuts::STANDARD_CUTS.a_minus);
        assert_eq!(cuts.b_minus, crate::cuts::STANDARD_CUTS.b_minus);
        assert_ne!(cuts.a_minus, crate::cuts::SIMPLE_CUTS.a_minus);
    }

    #[test]
    fn load_handles_absent_and_corrupt_content() {
        assert_eq!(PlannerStore::load_or_default(None).courses().len(), 1);
        let corrupt = PlannerStore::load_or_default(Some("{{{"));
        assert_eq!(corrupt.courses()[0].name, "Algebra II");
        let no_courses = PlannerStore::load_or_default(Some(r#"{"gradeCuts":{"A":99}}"#));
        assert_eq!(no_courses.courses()[0].name, "Algebra II");
        assert_eq!(no_courses.grade_cuts().a, 99.0);
        assert!(no_courses.current_course().is_some());
    }
}
