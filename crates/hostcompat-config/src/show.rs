//! Source-annotated display of the resolved configuration.
//!
//! Prints the merged configuration with annotations showing which layer
//! (defaults, user, workspace, environment) set each value.

use std::fmt::{self, Write as _};

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML with inline comments showing source.
    Toml,
    /// JSON (for programmatic consumption).
    Json,
}

impl ResolvedConfig {
    /// Which layer set `field` (a dotted path such as `"bridge.mode"`).
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// Render the configuration, optionally restricted to one section.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or `section` does not exist.
    pub fn show(&self, format: ShowFormat, section: Option<&str>) -> Result<String, fmt::Error> {
        match format {
            ShowFormat::Toml => self.show_toml(section),
            ShowFormat::Json => self.show_json(section),
        }
    }

    fn section_value(&self, section: &str) -> Result<toml::Value, fmt::Error> {
        let val = toml::Value::try_from(&self.config).map_err(|_| fmt::Error)?;
        val.as_table()
            .and_then(|table| table.get(section))
            .cloned()
            .ok_or(fmt::Error)
    }

    fn show_toml(&self, section: Option<&str>) -> Result<String, fmt::Error> {
        let toml_str = match section {
            Some(name) => {
                let mut wrapper = toml::map::Map::new();
                wrapper.insert(name.to_owned(), self.section_value(name)?);
                toml::to_string_pretty(&wrapper).map_err(|_| fmt::Error)?
            },
            None => toml::to_string_pretty(&self.config).map_err(|_| fmt::Error)?,
        };

        let mut output = String::new();
        output.push_str("# Resolved hostcompat configuration\n");
        output.push_str("# Source annotations: [defaults] [user] [workspace] [env]\n");

        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (in precedence order):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }
        output.push('\n');

        let mut current_table = String::new();
        for line in toml_str.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                current_table = header.trim_matches('"').to_owned();
            }

            match self.annotate_line(trimmed, &current_table) {
                Some(annotation) => writeln!(output, "{line}  # [{annotation}]")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }

    fn show_json(&self, section: Option<&str>) -> Result<String, fmt::Error> {
        match section {
            Some(name) => {
                serde_json::to_string_pretty(&self.section_value(name)?).map_err(|_| fmt::Error)
            },
            None => serde_json::to_string_pretty(&self.config).map_err(|_| fmt::Error),
        }
    }

    /// Source annotation for a `key = value` line inside `table`.
    fn annotate_line(&self, trimmed: &str, table: &str) -> Option<String> {
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            return None;
        }

        let key = trimmed.split('=').next()?.trim().trim_matches('"');
        let field_path = if table.is_empty() {
            key.to_owned()
        } else {
            format!("{table}.{key}")
        };

        self.source_of(&field_path).map(|layer| match layer {
            ConfigLayer::Defaults => "defaults",
            ConfigLayer::User => "user",
            ConfigLayer::Workspace => "workspace",
            ConfigLayer::Environment => "env",
        })
        .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        let mut config = Config::default();
        config.bridge.mode = "poll".to_owned();

        let mut field_sources = FieldSources::new();
        field_sources.insert("bridge.mode".to_owned(), ConfigLayer::Workspace);
        field_sources.insert("bridge.poll_interval_ms".to_owned(), ConfigLayer::Defaults);
        field_sources.insert("logging.level".to_owned(), ConfigLayer::Environment);

        ResolvedConfig {
            config,
            field_sources,
            loaded_files: vec!["/project/.hostcompat/config.toml".to_owned()],
        }
    }

    #[test]
    fn test_toml_annotations() {
        let out = resolved().show(ShowFormat::Toml, None).unwrap();
        assert!(out.contains("1. /project/.hostcompat/config.toml"));
        assert!(out.contains("mode = \"poll\"  # [workspace]"));
        assert!(out.contains("poll_interval_ms = 5000  # [defaults]"));
        assert!(out.contains("level = \"info\"  # [env]"));
    }

    #[test]
    fn test_single_section() {
        let resolved = resolved();
        let out = resolved.show(ShowFormat::Toml, Some("bridge")).unwrap();
        assert!(out.contains("[bridge]"));
        assert!(out.contains("# [workspace]"));
        assert!(!out.contains("[logging]"));

        let json = resolved.show(ShowFormat::Json, Some("bridge")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["mode"], "poll");

        assert!(resolved.show(ShowFormat::Json, Some("nope")).is_err());
    }

    #[test]
    fn test_source_of() {
        let resolved = resolved();
        assert_eq!(resolved.source_of("bridge.mode"), Some(ConfigLayer::Workspace));
        assert_eq!(resolved.source_of("sdk.default_version"), None);
    }
}
