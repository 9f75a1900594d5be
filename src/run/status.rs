use serde::{Deserialize, Serialize};

/// Status of a workflow run.
///
/// `Pending -> Running -> {Succeeded | Failed}`; a run that never starts a node
/// may go straight from `Pending` to a terminal status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(RunStatus::Pending.as_ref(), "pending");
        assert_eq!(RunStatus::Succeeded.to_string(), "succeeded");
        assert_eq!("failed".parse::<RunStatus>().unwrap(), RunStatus::Failed);
        assert_eq!(serde_json::to_string(&RunStatus::Running).unwrap(), "\"running\"");
    }

    #[test]
    fn test_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }
}
