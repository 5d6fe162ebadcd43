use serde::{Deserialize, Serialize};

/// Fixed delays the engine inserts between scripted effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingConfig {
    pub interaction_message_delay_ms: u64,
    pub interaction_advance_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub acknowledgment_delay_ms: u64,
    /// Longest wait for the explanation stream to open or yield its next
    /// chunk before the text received so far is treated as final.
    pub stream_idle_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interaction_message_delay_ms: 600,
            interaction_advance_delay_ms: 1_000,
            settle_delay_ms: 400,
            acknowledgment_delay_ms: 300,
            stream_idle_timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub verdict: GenerationSettings,
    pub explanation: GenerationSettings,
    pub acknowledgment: GenerationSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            verdict: GenerationSettings {
                temperature: 0.3,
                max_tokens: 20,
            },
            explanation: GenerationSettings {
                temperature: 0.7,
                max_tokens: 320,
            },
            acknowledgment: GenerationSettings {
                temperature: 0.7,
                max_tokens: 120,
            },
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let timing: TimingConfig =
            serde_json::from_str(r#"{"settleDelayMs": 10}"#).expect("timing should parse");
        assert_eq!(timing.settle_delay_ms, 10);
        assert_eq!(timing.interaction_advance_delay_ms, 1_000);
        assert_eq!(timing.stream_idle_timeout_ms, 20_000);

        let generation: GenerationConfig = serde_json::from_str(
            r#"{"verdict": {"temperature": 0.0, "maxTokens": 8}}"#,
        )
        .expect("generation should parse");
        assert_eq!(generation.verdict.max_tokens, 8);
        assert_eq!(generation.explanation.max_tokens, 320);
    }
}
