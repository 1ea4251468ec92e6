//! Aspect-ratio labels accepted by the generation API.

/// Candidate ratios in priority order; earlier entries win ties.
pub const ASPECT_CANDIDATES: &[(&str, f64)] = &[
    ("16:9", 16.0 / 9.0),
    ("9:16", 9.0 / 16.0),
    ("4:3", 4.0 / 3.0),
    ("3:4", 3.0 / 4.0),
    ("3:2", 3.0 / 2.0),
    ("2:3", 2.0 / 3.0),
    ("5:4", 5.0 / 4.0),
    ("4:5", 4.0 / 5.0),
];

/// Map requested pixel dimensions to the closest supported ratio label.
pub fn aspect_ratio(width: Option<i64>, height: Option<i64>) -> &'static str {
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) if w != h && w > 0 && h > 0 => (w, h),
        _ => return "1:1",
    };

    match (width, height) {
        (1152, 896) => return "9:7",
        (896, 1152) => return "7:9",
        _ => {}
    }

    let ratio = width as f64 / height as f64;
    let mut best = ASPECT_CANDIDATES[0];
    for candidate in &ASPECT_CANDIDATES[1..] {
        if (ratio - candidate.1).abs() < (ratio - best.1).abs() {
            best = *candidate;
        }
    }
    best.0
}
