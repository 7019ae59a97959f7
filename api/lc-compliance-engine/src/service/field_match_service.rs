use crate::module::lc_check::model::{FieldValue, Severity};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Enumerated,
    FreeText,
    Date,
}

/// Matching rule for one document field: how to compare it, whether the
/// document must carry it, and the UCP 600 article cited on a mismatch.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub ucp_rule_ref: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct FieldMatchOutcome {
    pub severity: Severity,
    pub explanation: String,
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
];

const UNIT_ALIASES: &[&[&str]] = &[
    &["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms"],
    &["mt", "ton", "tons", "tonne", "tonnes", "metric ton", "metric tons"],
    &["lb", "lbs", "pound", "pounds"],
    &["pc", "pcs", "piece", "pieces", "unit", "units"],
    &["ctn", "carton", "cartons"],
    &["bag", "bags"],
    &["l", "lt", "ltr", "liter", "liters", "litre", "litres"],
];

/// Compare one LC-term value against one document value under the field's
/// rule. Pure and side-effect free. Returns `None` when there is nothing to
/// report for this field (no LC expectation, or optional and absent).
pub fn match_field(
    spec: &FieldSpec,
    lc_value: Option<&FieldValue>,
    doc_value: Option<&FieldValue>,
    tolerance_pct: f64,
) -> Option<FieldMatchOutcome> {
    let lc_value = lc_value?;

    let Some(doc_value) = doc_value else {
        // Presence rule: missing-but-required is RED; dates get an AMBER
        // note when optional since the presented document itself is partial
        // evidence; everything else optional is skipped.
        if spec.required {
            return Some(FieldMatchOutcome {
                severity: Severity::Red,
                explanation: "required field missing from document".to_string(),
            });
        }
        if spec.kind == FieldKind::Date {
            return Some(FieldMatchOutcome {
                severity: Severity::Amber,
                explanation: "date not stated on document".to_string(),
            });
        }
        return None;
    };

    Some(match spec.kind {
        FieldKind::Numeric => match_numeric(lc_value, doc_value, tolerance_pct),
        FieldKind::Enumerated => match_enumerated(lc_value, doc_value),
        FieldKind::FreeText => match_free_text(lc_value, doc_value),
        FieldKind::Date => match_date(lc_value, doc_value),
    })
}

fn match_numeric(lc: &FieldValue, doc: &FieldValue, tolerance_pct: f64) -> FieldMatchOutcome {
    let (Some(expected), Some(presented)) = (lc.as_number(), doc.as_number()) else {
        return FieldMatchOutcome {
            severity: Severity::Red,
            explanation: format!(
                "value could not be read as a number (declared \"{}\", presented \"{}\")",
                lc.as_text(),
                doc.as_text()
            ),
        };
    };

    let deviation_pct = if expected == 0.0 {
        if presented == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        ((presented - expected) / expected).abs() * 100.0
    };

    if deviation_pct < f64::EPSILON {
        return FieldMatchOutcome {
            severity: Severity::Green,
            explanation: "matches LC terms exactly".to_string(),
        };
    }
    if deviation_pct <= tolerance_pct {
        return FieldMatchOutcome {
            severity: Severity::Amber,
            explanation: format!(
                "within {tolerance_pct}% tolerance (declared {}, presented {})",
                lc.as_text(),
                doc.as_text()
            ),
        };
    }
    FieldMatchOutcome {
        severity: Severity::Red,
        explanation: format!(
            "deviates {:.1}% from LC terms, beyond the {tolerance_pct}% tolerance (declared {}, presented {})",
            deviation_pct,
            lc.as_text(),
            doc.as_text()
        ),
    }
}

fn match_enumerated(lc: &FieldValue, doc: &FieldValue) -> FieldMatchOutcome {
    let expected = lc.as_text().trim().to_lowercase();
    let presented = doc.as_text().trim().to_lowercase();

    if expected == presented {
        return FieldMatchOutcome {
            severity: Severity::Green,
            explanation: "matches LC terms".to_string(),
        };
    }
    if alias_match(&expected, &presented) {
        return FieldMatchOutcome {
            severity: Severity::Amber,
            explanation: format!(
                "\"{}\" is an accepted alias of \"{}\"",
                doc.as_text(),
                lc.as_text()
            ),
        };
    }
    // Incoterm-style values often carry a named place ("FOB Shanghai"): a
    // shared leading code is a soft match.
    if code_prefix_match(&expected, &presented) {
        return FieldMatchOutcome {
            severity: Severity::Amber,
            explanation: format!(
                "code matches but wording differs (declared \"{}\", presented \"{}\")",
                lc.as_text(),
                doc.as_text()
            ),
        };
    }
    FieldMatchOutcome {
        severity: Severity::Red,
        explanation: format!(
            "does not match LC terms (declared \"{}\", presented \"{}\")",
            lc.as_text(),
            doc.as_text()
        ),
    }
}

fn match_free_text(lc: &FieldValue, doc: &FieldValue) -> FieldMatchOutcome {
    let expected = normalize_text(&lc.as_text());
    let presented = normalize_text(&doc.as_text());

    if expected == presented && !expected.is_empty() {
        return FieldMatchOutcome {
            severity: Severity::Green,
            explanation: "matches LC terms".to_string(),
        };
    }
    if !expected.is_empty()
        && !presented.is_empty()
        && (expected.contains(&presented)
            || presented.contains(&expected)
            || token_containment(&expected, &presented) >= 0.6)
    {
        return FieldMatchOutcome {
            severity: Severity::Amber,
            explanation: format!(
                "wording differs from LC terms (declared \"{}\", presented \"{}\")",
                lc.as_text(),
                doc.as_text()
            ),
        };
    }
    FieldMatchOutcome {
        severity: Severity::Red,
        explanation: format!(
            "does not correspond to LC terms (declared \"{}\", presented \"{}\")",
            lc.as_text(),
            doc.as_text()
        ),
    }
}

fn match_date(lc: &FieldValue, doc: &FieldValue) -> FieldMatchOutcome {
    let Some(deadline) = parse_date(&lc.as_text()) else {
        return FieldMatchOutcome {
            severity: Severity::Red,
            explanation: format!("LC deadline \"{}\" is not a readable date", lc.as_text()),
        };
    };
    let Some(presented) = parse_date(&doc.as_text()) else {
        return FieldMatchOutcome {
            severity: Severity::Red,
            explanation: format!("\"{}\" is not a readable date", doc.as_text()),
        };
    };

    if presented <= deadline {
        FieldMatchOutcome {
            severity: Severity::Green,
            explanation: format!("{presented} is on or before the deadline {deadline}"),
        }
    } else {
        FieldMatchOutcome {
            severity: Severity::Red,
            explanation: format!("{presented} is after the deadline {deadline}"),
        }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn normalize_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn alias_match(a: &str, b: &str) -> bool {
    UNIT_ALIASES
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

fn code_prefix_match(a: &str, b: &str) -> bool {
    let first = |s: &str| s.split_whitespace().next().map(str::to_string);
    match (first(a), first(b)) {
        (Some(ca), Some(cb)) => ca == cb && ca.len() >= 3,
        _ => false,
    }
}

/// Share of the smaller token set contained in the larger one.
fn token_containment(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    let (small, large) = if ta.len() <= tb.len() { (&ta, &tb) } else { (&tb, &ta) };
    if small.is_empty() {
        return 0.0;
    }
    let shared = small.iter().filter(|t| large.contains(**t)).count();
    shared as f64 / small.len() as f64
}
