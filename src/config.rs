use crate::agent::Modes;
use crate::policies::PolicyType;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub seed: Option<u64>,
    pub contextual: bool,
    pub delayed_reward: bool,
    pub restless: bool,
    pub policy: PolicyType,
}

impl AgentSettings {
    /// Reads settings from `path`, the format being taken from its extension.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        builder.try_deserialize()
    }

    pub fn modes(&self) -> Modes {
        Modes {
            contextual: self.contextual,
            delayed_reward: self.delayed_reward,
            restless: self.restless,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use uuid::Uuid;

    struct TempSettings {
        path: std::path::PathBuf,
    }

    impl TempSettings {
        fn new(contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!("agent-settings-{}.toml", Uuid::new_v4()));
            fs::write(&path, contents).expect("settings file should be writable");
            Self { path }
        }

        fn load(&self) -> Result<AgentSettings, ConfigError> {
            AgentSettings::from_file(self.path.to_str().expect("temp path is utf-8"))
        }
    }

    impl Drop for TempSettings {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    #[test]
    fn defaults() {
        let settings = TempSettings::new("").load().unwrap();
        assert_eq!(settings, AgentSettings::default());
        assert_eq!(settings.policy, PolicyType::ThompsonSampling);
        assert_eq!(settings.modes(), Modes::default());
    }

    #[test]
    fn reads_modes_and_policy() {
        let settings = TempSettings::new(
            r#"
seed = 42
delayed_reward = true
restless = true

[policy]
type = "EpsilonGreedy"
epsilon = 0.25
"#,
        )
        .load()
        .unwrap();

        assert_eq!(settings.seed, Some(42));
        assert_eq!(
            settings.modes(),
            Modes {
                contextual: false,
                delayed_reward: true,
                restless: true,
            }
        );
        assert_eq!(
            settings.policy,
            PolicyType::EpsilonGreedy {
                epsilon: 0.25,
                samples: 1000
            }
        );
    }

    #[test]
    fn missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.toml", Uuid::new_v4()));
        assert!(AgentSettings::from_file(path.to_str().unwrap()).is_err());
    }
}
