//! Graph construction settings.

use crate::GraphError;
use serde::{Deserialize, Serialize};

/// Branching order used when none is configured.
pub const DEFAULT_ORDER: usize = 16;

/// Smallest order that still yields a valid B-tree (one key per non-root node).
pub const MIN_ORDER: usize = 3;

/// Environment variable read by [`GraphConfig::from_env`].
pub const ORDER_ENV: &str = "DIABLO_BTREE_ORDER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum number of children per node index tree node.
    #[serde(default = "default_order")]
    pub order: usize,
}

fn default_order() -> usize {
    DEFAULT_ORDER
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

impl GraphConfig {
    pub fn with_order(order: usize) -> Self {
        Self { order }
    }

    /// Read the order from `DIABLO_BTREE_ORDER`; unset or unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let order = std::env::var(ORDER_ENV)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_ORDER);
        Self { order }
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        if self.order < MIN_ORDER {
            return Err(GraphError::InvalidOrder(self.order));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_sixteen() {
        assert_eq!(GraphConfig::default().order, 16);
        assert!(GraphConfig::default().validate().is_ok());
    }

    #[test]
    fn small_orders_are_rejected() {
        assert_eq!(
            GraphConfig::with_order(2).validate(),
            Err(GraphError::InvalidOrder(2))
        );
        assert!(GraphConfig::with_order(3).validate().is_ok());
    }

    #[test]
    fn missing_order_deserializes_to_default() {
        let cfg: GraphConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.order, DEFAULT_ORDER);
        let cfg: GraphConfig = serde_json::from_str(r#"{"order":5}"#).unwrap();
        assert_eq!(cfg.order, 5);
    }
}
