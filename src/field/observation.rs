//! Merging food, prey and enemy segments into one weighted point list

use tracing::warn;

use crate::constants::{
    ENEMY_BODY_MULTIPLIER, ENEMY_HEAD_MULTIPLIER, FOOD_DEFAULT_WEIGHT, PREY_WEIGHT,
};
use crate::error::ProcessError;
use crate::signals::{EntityRecord, Signals};

/// A single weighted point fed into the binner and the vector aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    /// Positive for food and prey, negative for threats
    pub weight: f64,
    /// Raw per-tick displacement
    pub velocity: Option<(f64, f64)>,
}

impl Observation {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self {
            x,
            y,
            weight,
            velocity: None,
        }
    }

    pub fn with_velocity(mut self, dx: f64, dy: f64) -> Self {
        self.velocity = Some((dx, dy));
        self
    }
}

/// Per-kind weighting applied while merging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRules {
    pub food_default: f64,
    pub prey: f64,
    pub enemy_head_multiplier: f64,
    pub enemy_body_multiplier: f64,
}

impl Default for WeightRules {
    fn default() -> Self {
        Self {
            food_default: FOOD_DEFAULT_WEIGHT,
            prey: PREY_WEIGHT,
            enemy_head_multiplier: ENEMY_HEAD_MULTIPLIER,
            enemy_body_multiplier: ENEMY_BODY_MULTIPLIER,
        }
    }
}

/// Result of a merge that found food to aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct MergedObservations {
    /// Absolute player position, the origin for reprojection
    pub player: (f64, f64),
    /// Absolute positions, not yet reprojected
    pub observations: Vec<Observation>,
    /// Records dropped for missing coordinates or size
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Merged {
    /// No food in the snapshot: nothing to aggregate, keep the last frame
    Empty,
    Ready(MergedObservations),
}

#[derive(Debug, Clone, Default)]
pub struct ObservationMerger {
    pub rules: WeightRules,
}

impl ObservationMerger {
    pub fn new(rules: WeightRules) -> Self {
        Self { rules }
    }

    pub fn merge(&self, signals: &Signals) -> Result<Merged, ProcessError> {
        let player = signals
            .player
            .as_ref()
            .and_then(|p| p.position())
            .ok_or(ProcessError::MissingPlayer)?;

        let Some(food) = signals.food.as_deref().filter(|f| !f.is_empty()) else {
            return Ok(Merged::Empty);
        };

        let mut observations = Vec::with_capacity(food.len());
        let mut skipped = 0;

        for record in food {
            let weight = record.size.unwrap_or(self.rules.food_default);
            match observation_from(record, weight) {
                Some(obs) => observations.push(obs),
                None => skipped += 1,
            }
        }

        for enemy in signals.enemies.iter().flatten() {
            for (i, part) in enemy.parts.iter().enumerate() {
                let Some(size) = part.size else {
                    skipped += 1;
                    continue;
                };
                let multiplier = if i == 0 {
                    self.rules.enemy_head_multiplier
                } else {
                    self.rules.enemy_body_multiplier
                };
                match observation_from(part, -size * multiplier) {
                    Some(obs) => observations.push(obs),
                    None => skipped += 1,
                }
            }
        }

        for record in signals.prey.iter().flatten() {
            match observation_from(record, self.rules.prey) {
                Some(obs) => observations.push(obs),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, kept = observations.len(), "Skipped malformed observation records");
        }

        Ok(Merged::Ready(MergedObservations {
            player,
            observations,
            skipped,
        }))
    }
}

fn observation_from(record: &EntityRecord, weight: f64) -> Option<Observation> {
    let (x, y) = (record.x?, record.y?);
    if !x.is_finite() || !y.is_finite() || !weight.is_finite() {
        return None;
    }
    let velocity = match record.delta.as_deref() {
        Some([dx, dy, ..]) => Some((*dx, *dy)),
        _ => None,
    };
    Some(Observation {
        x,
        y,
        weight,
        velocity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{EnemyRecord, PlayerFrame};

    fn ready(merged: Merged) -> MergedObservations {
        match merged {
            Merged::Ready(m) => m,
            Merged::Empty => panic!("expected observations"),
        }
    }

    #[test]
    fn missing_player_is_an_error() {
        let signals = Signals {
            food: Some(vec![EntityRecord::at(1.0, 1.0)]),
            ..Default::default()
        };
        assert_eq!(
            ObservationMerger::default().merge(&signals),
            Err(ProcessError::MissingPlayer)
        );

        let half_player = Signals {
            player: Some(PlayerFrame {
                x: Some(1.0),
                y: None,
            }),
            ..signals
        };
        assert_eq!(
            ObservationMerger::default().merge(&half_player),
            Err(ProcessError::MissingPlayer)
        );
    }

    #[test]
    fn empty_food_skips_everything() {
        let signals = Signals {
            player: Some(PlayerFrame::at(0.0, 0.0)),
            food: Some(Vec::new()),
            prey: Some(vec![EntityRecord::at(1.0, 1.0)]),
            ..Default::default()
        };
        assert_eq!(ObservationMerger::default().merge(&signals), Ok(Merged::Empty));

        let no_food = Signals {
            food: None,
            ..signals
        };
        assert_eq!(ObservationMerger::default().merge(&no_food), Ok(Merged::Empty));
    }

    #[test]
    fn applies_weighting_rules() {
        let signals = Signals {
            player: Some(PlayerFrame::at(0.0, 0.0)),
            food: Some(vec![
                EntityRecord::at(1.0, 1.0).with_size(7.0),
                EntityRecord::at(2.0, 2.0),
            ]),
            prey: Some(vec![EntityRecord::at(3.0, 3.0).with_size(2.0)]),
            enemies: Some(vec![EnemyRecord {
                parts: vec![
                    EntityRecord::at(4.0, 4.0).with_size(3.0).with_delta(1.0, 0.0),
                    EntityRecord::at(5.0, 5.0).with_size(3.0),
                ],
            }]),
        };
        let merged = ready(ObservationMerger::default().merge(&signals).unwrap());
        let weights: Vec<f64> = merged.observations.iter().map(|o| o.weight).collect();
        assert_eq!(weights, vec![7.0, 1.0, -15.0, -3.0, 50.0]);
        assert_eq!(merged.observations[2].velocity, Some((1.0, 0.0)));
        assert_eq!(merged.skipped, 0);
    }

    #[test]
    fn counts_malformed_records() {
        let signals = Signals {
            player: Some(PlayerFrame::at(0.0, 0.0)),
            food: Some(vec![
                EntityRecord::at(1.0, 1.0),
                EntityRecord {
                    y: Some(2.0),
                    ..Default::default()
                },
            ]),
            enemies: Some(vec![EnemyRecord {
                parts: vec![EntityRecord::at(4.0, 4.0)],
            }]),
            ..Default::default()
        };
        let merged = ready(ObservationMerger::default().merge(&signals).unwrap());
        assert_eq!(merged.observations.len(), 1);
        assert_eq!(merged.skipped, 2);
    }

    #[test]
    fn short_delta_has_no_velocity() {
        let mut record = EntityRecord::at(0.0, 0.0);
        record.delta = Some(vec![3.0]);
        let obs = observation_from(&record, 1.0).unwrap();
        assert_eq!(obs.velocity, None);
    }
}
