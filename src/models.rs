use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::session::Label;

/// One contestant: the provider's model identifier plus the system message
/// it competes with. Fixed for the lifetime of the process.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelConfig {
    pub id: String,
    #[serde(default)]
    pub system_message: String,
    pub display_name: String,
}

/// The two contestants, indexed by label. Votes snapshot the ids at vote
/// time, so historical rows keep meaning even if the lineup changes between
/// runs.
#[derive(Debug, Clone)]
pub struct ModelPair {
    a: ModelConfig,
    b: ModelConfig,
}

impl ModelPair {
    /// Default lineup, overridable per slot from the config file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            a: config.model_a.clone().unwrap_or_else(default_model_a),
            b: config.model_b.clone().unwrap_or_else(default_model_b),
        }
    }

    pub fn get(&self, label: Label) -> &ModelConfig {
        match label {
            Label::A => &self.a,
            Label::B => &self.b,
        }
    }
}

fn default_model_a() -> ModelConfig {
    ModelConfig {
        id: "openai/chatgpt-4o-latest".to_string(),
        system_message: String::new(),
        display_name: "Model A".to_string(),
    }
}

fn default_model_b() -> ModelConfig {
    ModelConfig {
        id: "openai/gpt-4o-mini".to_string(),
        system_message: "Be terse. Use plain text, no lists or bullet points. \
                         Keep answers engaging and interesting, but terse. \
                         Never lecture or patronize the user."
            .to_string(),
        display_name: "Model B".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pair_lookup() {
        let pair = ModelPair::from_config(&Config::default());
        assert_eq!(pair.get(Label::A).id, "openai/chatgpt-4o-latest");
        assert_eq!(pair.get(Label::B).id, "openai/gpt-4o-mini");
        assert!(pair.get(Label::A).system_message.is_empty());
        assert!(!pair.get(Label::B).system_message.is_empty());
    }

    #[test]
    fn test_config_overrides_one_slot() {
        let config = Config {
            model_a: Some(ModelConfig {
                id: "mistralai/mistral-large".to_string(),
                system_message: String::new(),
                display_name: "Model A".to_string(),
            }),
            ..Config::default()
        };
        let pair = ModelPair::from_config(&config);
        assert_eq!(pair.get(Label::A).id, "mistralai/mistral-large");
        assert_eq!(pair.get(Label::B).id, "openai/gpt-4o-mini");
    }
}
