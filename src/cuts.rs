use crate::input::parse_number;
use serde::Serialize;
use serde_json::{Map, Value};

/// Minimum percentage for each letter grade. F is implicit below `d_minus`.
///
/// Thresholds are not required to be descending; a misordered table is kept
/// as entered and the letter scan simply reports what it finds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeCutTable {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "Aminus")]
    pub a_minus: f64,
    #[serde(rename = "Bplus")]
    pub b_plus: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "Bminus")]
    pub b_minus: f64,
    #[serde(rename = "Cplus")]
    pub c_plus: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "Cminus")]
    pub c_minus: f64,
    #[serde(rename = "Dplus")]
    pub d_plus: f64,
    #[serde(rename = "D")]
    pub d: f64,
    #[serde(rename = "Dminus")]
    pub d_minus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutPreset {
    Standard,
    Simple,
}

pub const STANDARD_CUTS: GradeCutTable = GradeCutTable {
    a: 93.0,
    a_minus: 90.0,
    b_plus: 87.0,
    b: 83.0,
    b_minus: 80.0,
    c_plus: 77.0,
    c: 73.0,
    c_minus: 70.0,
    d_plus: 67.0,
    d: 63.0,
    d_minus: 60.0,
};

pub const SIMPLE_CUTS: GradeCutTable = GradeCutTable {
    a: 90.0,
    a_minus: 85.0,
    b_plus: 80.0,
    b: 75.0,
    b_minus: 70.0,
    c_plus: 65.0,
    c: 60.0,
    c_minus: 55.0,
    d_plus: 50.0,
    d: 45.0,
    d_minus: 40.0,
};

/// Document key and display letter, in scan order.
const KEYS: [(&str, &str); 11] = [
    ("A", "A"),
    ("Aminus", "A-"),
    ("Bplus", "B+"),
    ("B", "B"),
    ("Bminus", "B-"),
    ("Cplus", "C+"),
    ("C", "C"),
    ("Cminus", "C-"),
    ("Dplus", "D+"),
    ("D", "D"),
    ("Dminus", "D-"),
];

impl CutPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "mps" => Some(Self::Standard),
            "simple" => Some(Self::Simple),
            _ => None,
        }
    }

    pub fn table(self) -> GradeCutTable {
        match self {
            Self::Standard => STANDARD_CUTS,
            Self::Simple => SIMPLE_CUTS,
        }
    }
}

impl Default for GradeCutTable {
    fn default() -> Self {
        STANDARD_CUTS
    }
}

impl GradeCutTable {
    pub fn apply_preset(&mut self, preset: CutPreset) {
        *self = preset.table();
    }

    /// Overwrite the thresholds named in `partial`, skipping values that are
    /// not finite numbers. Keys may use the document form (`Aminus`) or the
    /// display form (`A-`). Returns the number of thresholds written.
    pub fn update(&mut self, partial: &Map<String, Value>) -> usize {
        let mut applied = 0;
        for (key, raw) in partial {
            let Some(v) = parse_number(raw) else {
                continue;
            };
            if let Some(slot) = self.slot_mut(key) {
                *slot = v;
                applied += 1;
            }
        }
        applied
    }

    /// `(letter, threshold)` pairs from A down to D-.
    pub fn scale(&self) -> [(&'static str, f64); 11] {
        let v = self.values();
        let mut out = [("", 0.0); 11];
        for (i, (_, letter)) in KEYS.iter().enumerate() {
            out[i] = (*letter, v[i]);
        }
        out
    }

    fn values(&self) -> [f64; 11] {
        [
            self.a,
            self.a_minus,
            self.b_plus,
            self.b,
            self.b_minus,
            self.c_plus,
            self.c,
            self.c_minus,
            self.d_plus,
            self.d,
            self.d_minus,
        ]
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut f64> {
        let idx = KEYS
            .iter()
            .position(|(doc, letter)| *doc == key || *letter == key)?;
        Some(match idx {
            0 => &mut self.a,
            1 => &mut self.a_minus,
            2 => &mut self.b_plus,
            3 => &mut self.b,
            4 => &mut self.b_minus,
            5 => &mut self.c_plus,
            6 => &mut self.c,
            7 => &mut self.c_minus,
            8 => &mut self.d_plus,
            9 => &mut self.d,
            _ => &mut self.d_minus,
        })
    }
}
