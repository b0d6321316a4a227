use crate::{
    ProbeSource, SequenceError, StepParams, TemperatureTrigger, Trigger, TriggerSequencer,
    WaitTrigger,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A brew session plan: the ordered step list recipe ingestion produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    pub session: String,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub kind: String,
    #[serde(default)]
    pub params: StepParams,
}

pub fn load_plan_file(path: impl AsRef<Path>) -> anyhow::Result<SessionPlan> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading session plan: {}", path.display()))?;
    load_plan_str(&raw).with_context(|| format!("parsing session plan: {}", path.display()))
}

pub fn load_plan_str(raw: &str) -> anyhow::Result<SessionPlan> {
    let plan: SessionPlan = serde_yaml::from_str(raw).context("decoding session plan yaml")?;
    Ok(plan)
}

/// Instantiate a sequencer from a plan, steps in listed order at positions
/// 0..n. Condition steps resolve their probe by name from `probes`.
pub fn build_sequencer(
    plan: &SessionPlan,
    probes: &HashMap<String, Arc<dyn ProbeSource>>,
) -> Result<TriggerSequencer, SequenceError> {
    let sequencer = TriggerSequencer::new();
    for (i, step) in plan.steps.iter().enumerate() {
        let position = i as u32;
        let trigger: Arc<dyn Trigger> = match step.kind.as_str() {
            "wait" => Arc::new(WaitTrigger::new(position, &step.params)),
            "temperature" => {
                let name = step
                    .params
                    .get("probe")
                    .ok_or_else(|| SequenceError::UnknownProbe(String::new()))?;
                let probe = probes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SequenceError::UnknownProbe(name.to_string()))?;
                Arc::new(TemperatureTrigger::new(position, &step.params, probe))
            }
            other => return Err(SequenceError::UnknownKind(other.to_string())),
        };
        sequencer.add(trigger)?;
    }
    Ok(sequencer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
session: mash
steps:
  - kind: wait
    params: { minutes: "1", seconds: "30" }
  - kind: temperature
    params: { threshold: "66.5", direction: "over", probe: "mash-tun" }
  - kind: wait
    params: { seconds: "10" }
"#;

    struct FixedProbe(f64);

    impl ProbeSource for FixedProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        fn read(&self) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.0)
        }
    }

    fn probes() -> HashMap<String, Arc<dyn ProbeSource>> {
        let mut map: HashMap<String, Arc<dyn ProbeSource>> = HashMap::new();
        map.insert("mash-tun".to_string(), Arc::new(FixedProbe(20.0)));
        map
    }

    #[test]
    fn plan_parses_and_builds_dense_positions() {
        let plan = match load_plan_str(PLAN) {
            Ok(p) => p,
            Err(e) => panic!("plan parse failed: {e}"),
        };
        assert_eq!(plan.session, "mash");
        assert_eq!(plan.steps.len(), 3);

        let seq = match build_sequencer(&plan, &probes()) {
            Ok(s) => s,
            Err(e) => panic!("build failed: {e}"),
        };
        let statuses = seq.status();
        assert_eq!(statuses.len(), 3);
        assert_eq!(
            statuses.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(statuses[0].kind, "wait");
        assert_eq!(statuses[1].kind, "temperature");
        assert!(statuses[0].target.contains("1 MIN 30 SECS"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let plan = SessionPlan {
            session: "boil".to_string(),
            steps: vec![StepSpec {
                kind: "gravity".to_string(),
                params: StepParams::new(),
            }],
        };
        match build_sequencer(&plan, &probes()) {
            Err(SequenceError::UnknownKind(kind)) => assert_eq!(kind, "gravity"),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn missing_probe_is_rejected() {
        let plan = SessionPlan {
            session: "mash".to_string(),
            steps: vec![StepSpec {
                kind: "temperature".to_string(),
                params: StepParams::new().with("probe", "kettle"),
            }],
        };
        match build_sequencer(&plan, &probes()) {
            Err(SequenceError::UnknownProbe(name)) => assert_eq!(name, "kettle"),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }
}
