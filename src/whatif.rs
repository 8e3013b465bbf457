use crate::calc::{course_grade, course_grade_with, format_percent, letter_from_fraction, Hypothetical, NO_GRADE};
use crate::store::PlannerStore;
use serde::Serialize;

/// Hypothetical-score preview. Lives only in process memory and is never
/// written with the planner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhatIfSimulator {
    course_id: Option<String>,
    category_id: Option<String>,
    earned: f64,
    possible: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfView {
    pub course_id: Option<String>,
    pub category_id: Option<String>,
    pub earned: f64,
    pub possible: f64,
    pub current: Option<f64>,
    pub projected: Option<f64>,
    pub percent: String,
    pub letter: String,
    pub display: String,
}

impl WhatIfSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    /// Point at the first course and its first category.
    pub fn reset(&mut self, store: &PlannerStore) {
        let first = store.courses().first();
        self.course_id = first.map(|c| c.id.clone());
        self.category_id = first
            .and_then(|c| c.categories.first())
            .map(|cat| cat.id.clone());
    }

    /// Target a course; the category target moves to its first category.
    /// An unknown course clears both targets.
    pub fn retarget_course(&mut self, store: &PlannerStore, course_id: &str) -> bool {
        match store.course(course_id) {
            Some(course) => {
                self.course_id = Some(course.id.clone());
                self.category_id = course.categories.first().map(|c| c.id.clone());
                true
            }
            None => {
                self.course_id = None;
                self.category_id = None;
                false
            }
        }
    }

    pub fn set_category(&mut self, store: &PlannerStore, category_id: &str) -> bool {
        let valid = self
            .course_id
            .as_deref()
            .and_then(|id| store.course(id))
            .and_then(|c| c.category(category_id))
            .is_some();
        self.category_id = if valid {
            Some(category_id.to_string())
        } else {
            None
        };
        valid
    }

    /// Non-numeric input counts as 0.
    pub fn set_earned(&mut self, earned: Option<f64>) {
        self.earned = earned.unwrap_or(0.0);
    }

    /// Non-numeric or negative input counts as 0.
    pub fn set_possible(&mut self, possible: Option<f64>) {
        self.possible = possible.unwrap_or(0.0).max(0.0);
    }

    /// Keep targets valid after a planner mutation. A target that no longer
    /// resolves falls back to the first course and its first category.
    pub fn reconcile(&mut self, store: &PlannerStore) {
        let course = self
            .course_id
            .as_deref()
            .and_then(|id| store.course(id))
            .or_else(|| store.courses().first());
        let Some(course) = course else {
            self.course_id = None;
            self.category_id = None;
            return;
        };
        if self.course_id.as_deref() != Some(course.id.as_str()) {
            self.course_id = Some(course.id.clone());
            self.category_id = None;
        }
        let category_valid = self
            .category_id
            .as_deref()
            .is_some_and(|id| course.category(id).is_some());
        if !category_valid {
            self.category_id = course.categories.first().map(|c| c.id.clone());
        }
    }

    /// Projected course grade with the hypothetical item added. Without a usable
    /// category or a positive `possible`, the real grade is returned as-is.
    pub fn project(&self, store: &PlannerStore) -> Option<f64> {
        let course = store.course(self.course_id.as_deref()?)?;
        let category_id = self
            .category_id
            .as_deref()
            .filter(|id| course.category(id).is_some());
        match category_id {
            Some(category_id) if self.possible > 0.0 => course_grade_with(
                course,
                Some(&Hypothetical {
                    category_id,
                    earned: self.earned,
                    possible: self.possible,
                }),
            ),
            _ => course_grade(course),
        }
    }

    pub fn view(&self, store: &PlannerStore) -> WhatIfView {
        let current = self
            .course_id
            .as_deref()
            .and_then(|id| store.course(id))
            .and_then(course_grade);
        let projected = self.project(store);
        let letter = letter_from_fraction(projected, store.grade_cuts());
        let percent = format_percent(projected);
        let display = match projected {
            Some(_) => format!("{} ({})", percent, letter),
            None => NO_GRADE.to_string(),
        };
        WhatIfView {
            course_id: self.course_id().map(str::to_owned),
            category_id: self.category_id().map(str::to_owned),
            earned: self.earned,
            possible: self.possible,
            current,
            projected,
            percent,
            letter: letter.to_string(),
            display,
        }
    }
}
