//! Renderer module
//!
//! Renders serializable items as JSON Lines or a single JSON array.

use serde::Serialize;
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for item lists
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render items to a string
    pub fn render<T: Serialize>(&self, items: &[T]) -> serde_json::Result<String> {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(items),
            OutputFormat::Json => self.render_value(&items),
        }
    }

    /// Render one standalone value (used for reports that are not lists)
    pub fn render_value<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    /// Render items to a writer, followed by a newline
    pub fn render_to<T: Serialize, W: Write>(&self, items: &[T], mut writer: W) -> anyhow::Result<()> {
        let output = self.render(items)?;
        if !output.is_empty() {
            writeln!(writer, "{}", output)?;
        }
        Ok(())
    }

    /// One JSON object per line
    fn render_jsonl<T: Serialize>(&self, items: &[T]) -> serde_json::Result<String> {
        let lines = items
            .iter()
            .map(|item| self.render_value(item))
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(lines.join(if self.config.pretty { "\n\n" } else { "\n" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("md".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_jsonl() {
        let renderer = Renderer::with_config(RenderConfig::default());
        let items = vec![json!({"a": 1}), json!({"b": 2})];
        let output = renderer.render(&items).unwrap();
        assert_eq!(output, "{\"a\":1}\n{\"b\":2}");
    }

    #[test]
    fn test_render_json_array() {
        let renderer =
            Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Json, false));
        let items = vec![json!(1), json!(2)];
        assert_eq!(renderer.render(&items).unwrap(), "[1,2]");
    }

    #[test]
    fn test_render_to_skips_empty_jsonl() {
        let renderer = Renderer::with_config(RenderConfig::default());
        let mut buffer = Vec::new();
        let items: Vec<serde_json::Value> = Vec::new();
        renderer.render_to(&items, &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
