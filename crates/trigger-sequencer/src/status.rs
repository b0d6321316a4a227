use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One trigger's operator-facing snapshot. Field values are always present;
/// timestamps that have not happened yet render as empty strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepStatus {
    pub position: u32,
    pub kind: String,
    pub start: String,
    pub target: String,
    pub description: String,
    pub active: bool,
}

pub(crate) fn fmt_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Render integer-valued floats without the trailing `.0` so target text
/// reads like an operator wrote it ("2 SECS", not "2.0 SECS").
pub(crate) fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_drop_the_point() {
        assert_eq!(fmt_num(2.0), "2");
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(1.5), "1.5");
    }

    #[test]
    fn status_serializes_with_stable_fields() {
        let status = StepStatus {
            position: 3,
            kind: "wait".to_string(),
            start: String::new(),
            target: "0 MIN 2 SECS".to_string(),
            description: "0 MIN 2 SECS".to_string(),
            active: true,
        };
        let value = match serde_json::to_value(&status) {
            Ok(v) => v,
            Err(e) => panic!("serialize failed: {e}"),
        };
        assert_eq!(value["position"], 3);
        assert_eq!(value["start"], "");
        assert_eq!(value["active"], true);
    }
}
