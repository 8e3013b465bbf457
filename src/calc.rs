use crate::cuts::GradeCutTable;
use crate::model::{Course, Item};
use serde::Serialize;

/// Display marker for "no grade".
pub const NO_GRADE: &str = "—";

/// One extra scored item folded into a category without touching the course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hypothetical<'a> {
    pub category_id: &'a str,
    pub earned: f64,
    pub possible: f64,
}

/// Points an item contributes, or `None` if it is ungraded or malformed.
/// Negative or non-finite values and `possible <= 0` are excluded.
fn gradeable(earned: Option<f64>, possible: Option<f64>) -> Option<(f64, f64)> {
    let (e, p) = (earned?, possible?);
    if !e.is_finite() || !p.is_finite() || e < 0.0 || p <= 0.0 {
        return None;
    }
    Some((e, p))
}

fn sanitize_weight(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

pub fn item_fraction(item: &Item) -> Option<f64> {
    gradeable(item.earned, item.possible).map(|(e, p)| e / p)
}

fn category_points(items: &[Item]) -> (f64, f64) {
    items
        .iter()
        .filter_map(|it| gradeable(it.earned, it.possible))
        .fold((0.0, 0.0), |(se, sp), (e, p)| (se + e, sp + p))
}

/// Sum-of-points average: Σearned / Σpossible over gradeable items.
pub fn category_average(items: &[Item]) -> Option<f64> {
    let (earned, possible) = category_points(items);
    if possible > 0.0 {
        Some(earned / possible)
    } else {
        None
    }
}

pub fn course_grade(course: &Course) -> Option<f64> {
    course_grade_with(course, None)
}

/// Course grade with weights renormalised over the categories that have a
/// defined average. `hypothetical`, when given, is counted as one more item in
/// its category.
pub fn course_grade_with(course: &Course, hypothetical: Option<&Hypothetical<'_>>) -> Option<f64> {
    let extra = hypothetical.and_then(|h| {
        gradeable(Some(h.earned), Some(h.possible)).map(|pts| (h.category_id, pts))
    });

    let mut parts: Vec<(f64, f64)> = Vec::new(); // (avg, weight)
    for cat in &course.categories {
        let (mut earned, mut possible) = category_points(&cat.items);
        if let Some((cat_id, (e, p))) = extra {
            if cat_id == cat.id {
                earned += e;
                possible += p;
            }
        }
        if possible > 0.0 {
            parts.push((earned / possible, sanitize_weight(cat.weight)));
        }
    }

    if parts.is_empty() {
        return None;
    }
    let used_weight: f64 = parts.iter().map(|(_, w)| w).sum();
    if used_weight <= 0.0 {
        return None;
    }
    Some(
        parts
            .iter()
            .map(|(avg, w)| avg * (w / used_weight))
            .sum(),
    )
}

/// Highest letter whose threshold is at or below the percentage, else "F".
pub fn letter_from_fraction(fraction: Option<f64>, cuts: &GradeCutTable) -> &'static str {
    let Some(x) = fraction.filter(|x| x.is_finite()) else {
        return NO_GRADE;
    };
    let pct = x * 100.0;
    cuts.scale()
        .iter()
        .find(|(_, threshold)| pct >= *threshold)
        .map(|(letter, _)| *letter)
        .unwrap_or("F")
}

pub fn format_percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(x) if x.is_finite() => format!("{:.1}%", x * 100.0),
        _ => NO_GRADE.to_string(),
    }
}

/// Category weight as the one-decimal percentage shown in the weight field.
pub fn weight_percent(weight: f64) -> f64 {
    (weight * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: String,
    pub label: String,
    pub earned: Option<f64>,
    pub possible: Option<f64>,
    pub fraction: Option<f64>,
    pub percent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_id: String,
    pub name: String,
    pub weight: f64,
    pub weight_percent: f64,
    pub average: Option<f64>,
    pub percent: String,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course_id: String,
    pub name: String,
    pub grade: Option<f64>,
    pub percent: String,
    pub letter: String,
    pub categories: Vec<CategorySummary>,
}

/// Everything the course view displays, derived in one pass.
pub fn summarize_course(course: &Course, cuts: &GradeCutTable) -> CourseSummary {
    let grade = course_grade(course);
    let categories = course
        .categories
        .iter()
        .map(|cat| {
            let average = category_average(&cat.items);
            CategorySummary {
                category_id: cat.id.clone(),
                name: cat.name.clone(),
                weight: cat.weight,
                weight_percent: weight_percent(cat.weight),
                average,
                percent: format_percent(average),
                items: cat
                    .items
                    .iter()
                    .map(|it| {
                        let fraction = item_fraction(it);
                        ItemSummary {
                            item_id: it.id.clone(),
                            label: it.label.clone(),
                            earned: it.earned,
                            possible: it.possible,
                            fraction,
                            percent: format_percent(fraction),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    CourseSummary {
        course_id: course.id.clone(),
        name: course.name.clone(),
        grade,
        percent: format_percent(grade),
        letter: letter_from_fraction(grade, cuts).to_string(),
        categories,
    }
}
