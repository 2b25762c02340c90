//! Conversion from the `[logging]` configuration section.

use hostcompat_config::LoggingSection;

use crate::error::TelemetryError;
use crate::logging::{LogConfig, LogFormat};

impl TryFrom<&LoggingSection> for LogConfig {
    type Error = TelemetryError;

    fn try_from(section: &LoggingSection) -> Result<Self, Self::Error> {
        let format: LogFormat = section.format.parse()?;
        let mut config = LogConfig::new(section.level.clone()).with_format(format);
        config.directives.clone_from(&section.directives);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_logging_section() {
        let section = LoggingSection {
            level: "debug".to_owned(),
            format: "json".to_owned(),
            directives: vec!["hostcompat_capabilities=trace".to_owned()],
        };

        let config = LogConfig::try_from(&section).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, section.directives);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let section = LoggingSection {
            format: "xml".to_owned(),
            ..LoggingSection::default()
        };
        assert!(LogConfig::try_from(&section).is_err());
    }
}
