//! Renderer module
//!
//! Renders ResultSet to different output formats: text, jsonl, json, md

use colored::Colorize;

use crate::core::model::{Kind, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
    pub color: bool,
}

impl RenderConfig {
    pub fn with_options(format: OutputFormat, pretty: bool, color: bool) -> Self {
        Self {
            format,
            pretty,
            color,
        }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Text => self.render_text(result_set),
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
        }
    }

    /// One summary line per item
    fn render_text(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                let summary = item.summary.as_deref()?;
                Some(match item.kind {
                    Kind::Error => self.paint_error(&format!("! {}", summary)),
                    Kind::Decision => self.paint_decision(item, summary),
                    _ => summary.to_string(),
                })
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn paint_error(&self, line: &str) -> String {
        if self.config.color {
            line.yellow().to_string()
        } else {
            line.to_string()
        }
    }

    fn paint_decision(&self, item: &ResultItem, line: &str) -> String {
        if !self.config.color {
            return line.to_string();
        }
        let safe = item
            .data
            .as_ref()
            .and_then(|d| d.get("verdict"))
            .and_then(|v| v.as_str())
            == Some("Safe");
        if safe {
            line.green().bold().to_string()
        } else {
            line.red().bold().to_string()
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut errors = Vec::new();
        let mut conditions = Vec::new();
        let mut decisions = Vec::new();
        let mut cache = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Error => errors.push(item),
                Kind::Tide | Kind::Station | Kind::Weather | Kind::Location => {
                    conditions.push(item)
                }
                Kind::Decision => decisions.push(item),
                Kind::Cache => cache.push(item),
            }
        }

        if !errors.is_empty() {
            output.push_str("## Errors\n\n");
            for item in errors {
                for error in &item.errors {
                    output.push_str(&format!("- **{}**: {}\n", error.code, error.message));
                }
            }
            output.push('\n');
        }

        if !conditions.is_empty() {
            output.push_str("## Conditions\n\n");
            for item in conditions {
                self.render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        if !decisions.is_empty() {
            output.push_str("## Decision\n\n");
            for item in decisions {
                self.render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        if !cache.is_empty() {
            output.push_str("## Cache\n\n");
            for item in cache {
                self.render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        output
    }

    fn render_item_md(&self, output: &mut String, item: &ResultItem) {
        if let Some(summary) = &item.summary {
            output.push_str(&format!("- {}", summary));
            if item.source_mode == crate::core::model::SourceMode::Cache
                && item.kind != Kind::Cache
            {
                output.push_str(" _(cached)_");
            }
            output.push('\n');
        }
    }
}
