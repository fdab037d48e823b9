//! Assertion checking for scenario expectations

use super::parser::{CellAssertion, ExpectedRender, PanelAssertion, ScenarioExpectations};
use crate::error::ProcessError;
use crate::field::FieldFrame;
use crate::pipeline::{Outcome, RenderStatus};

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n    Expected: {}\n    Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

/// Everything a scenario run produced
pub struct RunRecord {
    pub result: Result<Outcome, ProcessError>,
    /// Frames handed to the render target on the last run (empty if none)
    pub frames: Vec<FieldFrame>,
    pub presents: u64,
}

/// Check every expectation; returns how many individual checks ran
pub fn check_expectations(
    expect: &ScenarioExpectations,
    run: &RunRecord,
) -> Result<usize, AssertionError> {
    let mut checks = 0;

    match (&expect.error, &run.result) {
        (Some(message), Err(e)) => {
            checks += 1;
            if e.to_string() != *message {
                return Err(AssertionError {
                    message: "Wrong error".to_string(),
                    expected: message.clone(),
                    actual: e.to_string(),
                });
            }
        }
        (Some(message), Ok(_)) => {
            return Err(AssertionError {
                message: "Expected an error response".to_string(),
                expected: message.clone(),
                actual: "action".to_string(),
            });
        }
        (None, Err(e)) => {
            return Err(AssertionError {
                message: "Unexpected error response".to_string(),
                expected: "action".to_string(),
                actual: e.to_string(),
            });
        }
        (None, Ok(_)) => {}
    }

    if let Ok(outcome) = &run.result {
        checks += check_outcome(expect, outcome)?;
    }

    if let Some(presents) = expect.presents {
        checks += 1;
        if run.presents != presents {
            return Err(AssertionError {
                message: "Display present count".to_string(),
                expected: presents.to_string(),
                actual: run.presents.to_string(),
            });
        }
    }

    for panel in &expect.panel {
        checks += check_panel(panel, &run.frames)?;
    }
    for cell in &expect.cell {
        checks += check_cell(cell, &run.frames)?;
    }

    Ok(checks)
}

fn check_outcome(expect: &ScenarioExpectations, outcome: &Outcome) -> Result<usize, AssertionError> {
    let mut checks = 0;

    if let Some(render) = expect.render {
        checks += 1;
        let actual = match outcome.render {
            RenderStatus::Rendered(_) => ExpectedRender::Rendered,
            RenderStatus::Skipped => ExpectedRender::Skipped,
            RenderStatus::Failed(_) => ExpectedRender::Failed,
        };
        if actual != render {
            return Err(AssertionError {
                message: "Render status".to_string(),
                expected: format!("{:?}", render),
                actual: format!("{:?}", outcome.render),
            });
        }
    }

    if let Some(skipped) = expect.skipped {
        checks += 1;
        if outcome.skipped != skipped {
            return Err(AssertionError {
                message: "Skipped record count".to_string(),
                expected: skipped.to_string(),
                actual: outcome.skipped.to_string(),
            });
        }
    }

    if let Some(count) = expect.observations {
        checks += 1;
        if outcome.observations.len() != count {
            return Err(AssertionError {
                message: "Observation count".to_string(),
                expected: count.to_string(),
                actual: outcome.observations.len().to_string(),
            });
        }
    }

    Ok(checks)
}

fn frame_at(frames: &[FieldFrame], index: usize) -> Result<&FieldFrame, AssertionError> {
    frames.get(index).ok_or_else(|| AssertionError {
        message: format!("Panel {} was not rendered", index),
        expected: format!("at least {} panels", index + 1),
        actual: format!("{} panels", frames.len()),
    })
}

fn check_float(what: String, expected: f64, actual: f64, tolerance: f64) -> Result<(), AssertionError> {
    if (expected - actual).abs() > tolerance {
        return Err(AssertionError {
            message: what,
            expected: format!("{} (±{})", expected, tolerance),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn check_panel(assertion: &PanelAssertion, frames: &[FieldFrame]) -> Result<usize, AssertionError> {
    let frame = frame_at(frames, assertion.index)?;
    let mut checks = 1;

    if let Some([rows, cols]) = assertion.shape {
        checks += 1;
        if frame.shape() != (rows, cols) {
            return Err(AssertionError {
                message: format!("Panel {} shape", assertion.index),
                expected: format!("{}x{}", rows, cols),
                actual: format!("{}x{}", frame.shape().0, frame.shape().1),
            });
        }
    }

    if let Some(total) = assertion.total {
        checks += 1;
        check_float(
            format!("Panel {} total density", assertion.index),
            total,
            frame.density.sum(),
            assertion.tolerance,
        )?;
    }

    if let Some(count) = assertion.vectors {
        checks += 1;
        let actual = frame.vectors.populated_cells();
        if actual != count {
            return Err(AssertionError {
                message: format!("Panel {} populated vector cells", assertion.index),
                expected: count.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(checks)
}

fn check_cell(assertion: &CellAssertion, frames: &[FieldFrame]) -> Result<usize, AssertionError> {
    let frame = frame_at(frames, assertion.panel)?;
    let label = format!("Panel {} cell at ({}, {})", assertion.panel, assertion.x, assertion.y);
    let mut checks = 1;

    let Some(density) = frame.density_at(assertion.x, assertion.y) else {
        return Err(AssertionError {
            message: format!("{} is outside the grid", label),
            expected: format!("point within ±{}", frame.zoom),
            actual: format!("({}, {})", assertion.x, assertion.y),
        });
    };

    if let Some(expected) = assertion.density {
        checks += 1;
        check_float(format!("{} density", label), expected, density, assertion.tolerance)?;
    }

    let vector = frame.vector_at(assertion.x, assertion.y).flatten();

    if let Some(empty) = assertion.empty {
        checks += 1;
        if vector.is_none() != empty {
            return Err(AssertionError {
                message: format!("{} vector presence", label),
                expected: if empty { "no vector" } else { "a vector" }.to_string(),
                actual: format!("{:?}", vector),
            });
        }
    }

    if let Some([u, v]) = assertion.vector {
        checks += 1;
        let Some((au, av)) = vector else {
            return Err(AssertionError {
                message: format!("{} has no vector", label),
                expected: format!("({}, {})", u, v),
                actual: "empty".to_string(),
            });
        };
        check_float(format!("{} u", label), u, au, assertion.tolerance)?;
        check_float(format!("{} v", label), v, av, assertion.tolerance)?;
    }

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Observation, VectorRules, ZoomLevel};
    use crate::signals::Action;

    fn record(observations: Vec<Observation>) -> RunRecord {
        let level = ZoomLevel::new(100.0, 2.0).unwrap();
        let frame = FieldFrame::compute(&observations, &level, 0.1, &VectorRules::default());
        RunRecord {
            result: Ok(Outcome {
                action: Action::default(),
                render: RenderStatus::Skipped,
                skipped: 0,
                observations,
            }),
            frames: vec![frame],
            presents: 0,
        }
    }

    #[test]
    fn cell_density_mismatch_reports_values() {
        let run = record(vec![Observation::new(5.0, 5.0, 2.0)]);
        let expect = ScenarioExpectations {
            cell: vec![CellAssertion {
                panel: 0,
                x: 5.0,
                y: 5.0,
                density: Some(3.0),
                vector: None,
                empty: None,
                tolerance: 1e-6,
            }],
            ..Default::default()
        };
        let err = check_expectations(&expect, &run).unwrap_err();
        assert!(err.message.contains("density"));
        assert_eq!(err.actual, "2");
    }

    #[test]
    fn unexpected_error_fails() {
        let run = RunRecord {
            result: Err(ProcessError::MissingPlayer),
            frames: Vec::new(),
            presents: 0,
        };
        let err = check_expectations(&ScenarioExpectations::default(), &run).unwrap_err();
        assert_eq!(err.actual, "No player");
    }

    #[test]
    fn passing_checks_are_counted() {
        let run = record(vec![Observation::new(5.0, 5.0, 2.0)]);
        let expect = ScenarioExpectations {
            render: Some(ExpectedRender::Skipped),
            observations: Some(1),
            cell: vec![CellAssertion {
                panel: 0,
                x: 5.0,
                y: 5.0,
                density: Some(2.0),
                vector: None,
                empty: Some(true),
                tolerance: 1e-6,
            }],
            ..Default::default()
        };
        assert_eq!(check_expectations(&expect, &run).unwrap(), 5);
    }

    #[test]
    fn missing_panel_is_reported() {
        let run = record(Vec::new());
        let expect = ScenarioExpectations {
            panel: vec![PanelAssertion {
                index: 3,
                shape: None,
                total: None,
                vectors: None,
                tolerance: 1e-6,
            }],
            ..Default::default()
        };
        let err = check_expectations(&expect, &run).unwrap_err();
        assert_eq!(err.actual, "1 panels");
    }
}
