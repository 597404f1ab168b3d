use serde::{Deserialize, Serialize};
use trellis_protocol::{MismatchHandler, RecordingMismatchHandler, ThrowingMismatchHandler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Every unknown tag aborts the batch.
    #[default]
    Throwing,
    /// Unknown tags are logged and skipped.
    Recording,
}

impl MismatchPolicy {
    pub fn handler(self) -> Box<dyn MismatchHandler> {
        match self {
            MismatchPolicy::Throwing => Box::new(ThrowingMismatchHandler),
            MismatchPolicy::Recording => Box::new(RecordingMismatchHandler::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Pool removed subtrees so a rebuilt tree can take them over.
    pub reuse: bool,
    /// Maximum number of removed subtrees kept in the pool.
    pub reuse_pool_capacity: usize,
    pub mismatch: MismatchPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reuse: true,
            reuse_pool_capacity: 16,
            mismatch: MismatchPolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn lenient() -> Self {
        Self {
            mismatch: MismatchPolicy::Recording,
            ..Self::default()
        }
    }

    pub fn without_reuse(mut self) -> Self {
        self.reuse = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{ "mismatch": "recording" }"#).unwrap();
        assert_eq!(
            config,
            BridgeConfig {
                reuse: true,
                reuse_pool_capacity: 16,
                mismatch: MismatchPolicy::Recording,
            }
        );
    }

    #[test]
    fn test_policy_handlers() {
        let strict = MismatchPolicy::Throwing.handler();
        assert!(strict.on_unknown_widget(trellis_protocol::WidgetTag(5)).is_err());

        let lenient = MismatchPolicy::Recording.handler();
        assert!(lenient.on_unknown_widget(trellis_protocol::WidgetTag(5)).is_ok());
    }
}
