//! Configuration tests

use super::*;
use thalo_core::Severity;

// ==================== SETTINGS PARSING TESTS ====================

mod parsing_tests {
    use super::*;

    /// Test 1: Load rule severities from TOML
    #[test]
    fn test_load_rules_from_toml() {
        let toml = r#"
[rules]
unknown-field = "error"
empty-section = "off"
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(
            settings.rules.severity("unknown-field", Severity::Warning),
            RuleSeverity::Error
        );
        assert_eq!(
            settings.rules.severity("empty-section", Severity::Info),
            RuleSeverity::Off
        );
    }

    /// Test 2: Unlisted rules keep their default
    #[test]
    fn test_unlisted_rule_uses_default() {
        let settings = Settings::default();
        assert_eq!(
            settings.rules.severity("unknown-entity", Severity::Error),
            RuleSeverity::Error
        );
        assert_eq!(
            settings.rules.severity("empty-section", Severity::Info),
            RuleSeverity::Info
        );
    }

    /// Test 3: Workspace table with defaults for missing fields
    #[test]
    fn test_workspace_settings() {
        let settings = Settings::from_toml_str("[workspace]\nexclude = [\"archive\"]\n").unwrap();
        assert_eq!(settings.workspace.exclude, vec!["archive".to_string()]);
        assert_eq!(settings.workspace.extensions, vec!["thalo", "md"]);
    }

    /// Test 4: Empty config uses all defaults
    #[test]
    fn test_empty_config() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.rules.codes().count(), 0);
    }

    /// Test 5: Invalid severity is rejected
    #[test]
    fn test_invalid_severity_rejected() {
        let result = Settings::from_toml_str("[rules]\nunknown-field = \"loud\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}

// ==================== OVERRIDE TESTS ====================

mod override_tests {
    use super::*;

    /// Test 1: Command-line override wins over the file
    #[test]
    fn test_override_replaces_file_setting() {
        let mut settings = Settings::from_toml_str("[rules]\nunknown-field = \"error\"\n").unwrap();
        settings.rules.apply_override("unknown-field=off").unwrap();
        assert_eq!(
            settings.rules.severity("unknown-field", Severity::Warning),
            RuleSeverity::Off
        );
    }

    /// Test 2: Malformed overrides
    #[test]
    fn test_malformed_override() {
        let mut config = CheckConfig::new();
        assert!(matches!(
            config.apply_override("unknown-field"),
            Err(ConfigError::InvalidOverride(_))
        ));
        assert!(matches!(
            config.apply_override("=error"),
            Err(ConfigError::InvalidOverride(_))
        ));
        assert!(matches!(
            config.apply_override("unknown-field=loud"),
            Err(ConfigError::InvalidSeverity(_))
        ));
    }

    /// Test 3: Builder form
    #[test]
    fn test_with_rule() {
        let config = CheckConfig::new()
            .with_rule("unknown-entity", RuleSeverity::Warning)
            .with_rule("empty-section", RuleSeverity::Off);
        assert_eq!(config.codes().collect::<Vec<_>>(), vec!["empty-section", "unknown-entity"]);
    }
}
