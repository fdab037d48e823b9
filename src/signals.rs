//! Decoded request snapshot and the action sent back
//!
//! These types sit on the boundary with the HTTP front end. They derive serde
//! so a collaborator can decode JSON (or TOML in scenario files) straight into
//! them; the pipeline never sees raw wire data.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ANGLE, DEFAULT_SPEEDBOOST};

/// One snapshot of everything the bot can see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signals {
    #[serde(default)]
    pub player: Option<PlayerFrame>,
    #[serde(default)]
    pub food: Option<Vec<EntityRecord>>,
    #[serde(default)]
    pub prey: Option<Vec<EntityRecord>>,
    #[serde(default)]
    pub enemies: Option<Vec<EnemyRecord>>,
}

/// Absolute position of the controlled player
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerFrame {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl PlayerFrame {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// Both coordinates, if present and finite
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }
}

/// A food pellet, prey item or enemy segment as sent by the client.
///
/// Coordinates are optional so that a record missing a field decodes fine and
/// is counted as malformed by the merger instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub size: Option<f64>,
    /// Per-tick displacement `[dx, dy, ...]`
    #[serde(default)]
    pub delta: Option<Vec<f64>>,
}

impl EntityRecord {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_delta(mut self, dx: f64, dy: f64) -> Self {
        self.delta = Some(vec![dx, dy]);
        self
    }
}

/// Another snake, head first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnemyRecord {
    #[serde(default)]
    pub parts: Vec<EntityRecord>,
}

/// Steering command returned to the client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub angle: f64,
    pub speedboost: bool,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            angle: DEFAULT_ANGLE,
            speedboost: DEFAULT_SPEEDBOOST,
        }
    }
}

/// Payload handed back to the HTTP layer: either an action or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Action {
        #[serde(flatten)]
        action: Action,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        render_error: Option<String>,
    },
    Error {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_partial_records() {
        let json = r#"{
            "player": {"x": 10, "y": 20},
            "food": [{"x": 1, "y": 2, "size": 3, "delta": [0.5, -0.5]}, {"y": 4}],
            "enemies": [{"parts": [{"x": 0, "y": 0, "size": 2}]}]
        }"#;
        let signals: Signals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.player.unwrap().position(), Some((10.0, 20.0)));
        let food = signals.food.unwrap();
        assert_eq!(food.len(), 2);
        assert_eq!(food[0].delta.as_deref(), Some(&[0.5, -0.5][..]));
        assert!(food[1].x.is_none());
        assert!(signals.prey.is_none());
        assert_eq!(signals.enemies.unwrap()[0].parts.len(), 1);
    }

    #[test]
    fn response_shapes() {
        let ok = Response::Action {
            action: Action::default(),
            render_error: None,
        };
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"angle":0.0,"speedboost":false}"#
        );

        let err = Response::Error {
            error: "No player".to_string(),
        };
        assert_eq!(serde_json::to_string(&err).unwrap(), r#"{"error":"No player"}"#);
    }
}
