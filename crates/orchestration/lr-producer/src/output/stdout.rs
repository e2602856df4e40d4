//! Stdout output for dry runs.

use async_trait::async_trait;
use lr_error::{QueueError, Result};
use lr_types::RollupTask;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::Output;

/// Output format for stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON Lines format - one message body per line (default)
    #[default]
    Jsonl,

    /// Pretty-printed JSON
    Json,
}

/// Stdout output implementation.
///
/// Prints each task exactly as it would be queued, without splitting, so a
/// dry run can be piped to `jq` or counted with `wc -l`.
pub struct StdoutOutput {
    format: OutputFormat,
}

impl StdoutOutput {
    /// Create a new StdoutOutput with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Create a new StdoutOutput with JSONL format (default).
    pub fn jsonl() -> Self {
        Self::new(OutputFormat::Jsonl)
    }

    /// Create a new StdoutOutput with pretty-printed JSON format.
    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    fn render(&self, task: &RollupTask) -> Result<String> {
        let rendered = match self.format {
            OutputFormat::Jsonl => task.to_message()?,
            OutputFormat::Json => serde_json::to_string_pretty(task)
                .map_err(|e| QueueError::Serialize(format!("Failed to encode {task}: {e}")))?,
        };
        Ok(rendered)
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::jsonl()
    }
}

#[async_trait]
impl Output for StdoutOutput {
    async fn output(&self, task: &RollupTask) -> Result<()> {
        let rendered = self.render(task)?;
        println!("{rendered}");
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}
