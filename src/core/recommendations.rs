use crate::domain::model::Record;
use std::collections::{BTreeMap, HashSet};

/// Event category -> ordered remediation steps.
pub type Playbook = BTreeMap<String, Vec<String>>;

pub const DEFAULT_KEY: &str = "default";
pub const GENERIC_EVENT_TYPE: &str = "generic";
pub const AUTH_FAILURE_KEY: &str = "auth_failure";
pub const MALWARE_KEY: &str = "malware";

const BUILTIN_DEFAULT_ACTIONS: [&str; 3] =
    ["Investigate event", "Apply patch", "Isolate affected asset"];

const AUTH_FAILURE_LIMIT: f64 = 3.0;

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    playbook: Playbook,
}

impl Recommender {
    pub fn new(playbook: Playbook) -> Self {
        Self { playbook }
    }

    pub fn playbook(&self) -> &Playbook {
        &self.playbook
    }

    /// Playbook 的 `default` 項目，沒有設定時使用內建的三個步驟
    pub fn default_actions(&self) -> Vec<String> {
        match self.playbook.get(DEFAULT_KEY) {
            Some(actions) => actions.clone(),
            None => BUILTIN_DEFAULT_ACTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Exact key first, then a case-insensitive match.
    pub fn lookup(&self, event_type: &str) -> Option<&Vec<String>> {
        self.playbook.get(event_type).or_else(|| {
            self.playbook
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(event_type))
                .map(|(_, actions)| actions)
        })
    }

    pub fn suggest(&self, record: &Record) -> Vec<String> {
        let event_type = record
            .get_str("event_type")
            .unwrap_or_else(|| GENERIC_EVENT_TYPE.to_string());

        let mut recos = match self.lookup(&event_type) {
            Some(actions) => actions.clone(),
            None => self.default_actions(),
        };

        // 規則補充：暴力破解 / 惡意程式的訊號會帶入對應的 playbook 項目
        let lowered = event_type.to_lowercase();
        let auth_failures = record.get_f64("auth_failures").unwrap_or(0.0);
        if lowered.contains("brute") || auth_failures > AUTH_FAILURE_LIMIT {
            if let Some(actions) = self.playbook.get(AUTH_FAILURE_KEY) {
                recos.extend(actions.iter().cloned());
            }
        }

        let malware_alerts = record.get_f64("malware_alerts").unwrap_or(0.0);
        if lowered.contains("malware") || malware_alerts > 0.0 {
            if let Some(actions) = self.playbook.get(MALWARE_KEY) {
                recos.extend(actions.iter().cloned());
            }
        }

        dedup_preserving_order(recos)
    }
}

pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
