use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::{EntryView, NavigationReport};

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }

        let rendered = render_value(&serde_json::to_value(value)?, 0);
        println!("{rendered}");
        Ok(())
    }

    pub fn print_navigation(&self, report: &NavigationReport) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(report)?);
            return Ok(());
        }

        let state_style = match report.state {
            stepsort::NavState::Idle => self.style("IDLE", "90"),
            stepsort::NavState::Stepping => self.style("STEPPING", "33;1"),
            stepsort::NavState::Complete => self.style("COMPLETE", "32;1"),
        };

        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {}/{}\n",
            self.style("stepsort", "36;1"),
            state_style,
            report.current_step,
            report.total_steps
        ));

        if !report.visited.is_empty() {
            out.push_str(&format!("{}\n", self.style("visited", "37;1")));
            for entry in &report.visited {
                out.push_str(&self.render_entry(entry));
            }
        }

        out.push_str(&format!("{}\n", self.style("last steps", "37;1")));
        for entry in &report.history {
            out.push_str(&self.render_entry(entry));
        }

        if !report.discovered_buckets.is_empty() {
            let buckets: Vec<String> = report.discovered_buckets.iter().map(|b| b.to_string()).collect();
            out.push_str(&format!("{} {}\n", self.style("buckets", "90"), buckets.join(",")));
        }

        println!("{}", out.trim_end());
        Ok(())
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "code": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    pub fn print_warning(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "warning",
                "code": "warning",
                "message": msg,
            });
            eprintln!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("warn", "33;1"));
    }

    fn render_entry(&self, entry: &EntryView) -> String {
        let highlight = entry
            .highlight
            .map(|i| format!(" {}", self.style(&format!("@{i}"), "35")))
            .unwrap_or_default();
        format!(
            "  {} {}{}\n",
            self.style(&format!("[{:>4}]", entry.index), "90"),
            entry.description,
            highlight
        )
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) => render_array(items, indent),
        Value::Object(map) => render_object(map, indent),
    }
}

fn is_compound(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn render_array(items: &[Value], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    // Scalar lists such as inputs read best on one line.
    if !items.iter().any(is_compound) {
        let parts: Vec<String> = items.iter().map(|v| render_value(v, 0)).collect();
        return format!("[{}]", parts.join(", "));
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for item in items {
        out.push_str(&format!("{pad}-\n{}\n", render_value(item, indent + 2)));
    }
    out.trim_end().to_string()
}

fn render_object(map: &serde_json::Map<String, Value>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, value) in map {
        let nested = match value {
            Value::Array(items) => items.iter().any(is_compound),
            other => is_compound(other),
        };
        let rendered = render_value(value, indent + 2);
        if nested {
            out.push_str(&format!("{pad}{key}:\n{rendered}\n"));
        } else {
            out.push_str(&format!("{pad}{key}: {rendered}\n"));
        }
    }
    out.trim_end().to_string()
}
