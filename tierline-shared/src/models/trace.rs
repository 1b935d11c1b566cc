use serde::{Deserialize, Serialize};

/// A single step in a resolution trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: String,
    pub description: String,
    pub value: Option<String>,
}

impl TraceStep {
    pub fn new(step: impl Into<String>, description: impl Into<String>, value: Option<String>) -> Self {
        Self {
            step: step.into(),
            description: description.into(),
            value,
        }
    }

    /// Render as a single line, `bullet step: description = value`.
    pub fn render(&self, bullet: &str) -> String {
        match &self.value {
            Some(value) => format!("{} {}: {} = {}", bullet, self.step, self.description, value),
            None => format!("{} {}: {}", bullet, self.step, self.description),
        }
    }
}

/// Render a trace as newline separated text.
pub fn render_trace(steps: &[TraceStep], bullet: &str) -> String {
    steps
        .iter()
        .map(|s| s.render(bullet))
        .collect::<Vec<_>>()
        .join("\n")
}
