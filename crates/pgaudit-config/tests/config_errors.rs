use pgaudit_config::{ConfigError, Field, LoggerKind, parse_config_file, parse_config_str};

#[test]
fn setting_before_any_section_is_rejected() {
    let err = parse_config_str("class = 'READ'\n[rule]\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::OutsideSection(ref k) if k == "class"),
        "expected OutsideSection, got: {err}"
    );
}

#[test]
fn unknown_section_is_rejected() {
    let err = parse_config_str("[rules]\nclass = 'READ'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::UnknownSection(ref s) if s == "rules"),
        "expected UnknownSection, got: {err}"
    );
}

#[test]
fn unknown_setting_names_its_section() {
    let err = parse_config_str("[option]\nlog_everything = on\n").unwrap_err();
    match err {
        ConfigError::UnknownSetting { section, key } => {
            assert_eq!(section, "option");
            assert_eq!(key, "log_everything");
        }
        other => panic!("expected UnknownSetting, got: {other}"),
    }

    let err = parse_config_str("[rule]\ncommand_tag = 'SELECT'\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownSetting { ref section, .. } if section == "rule"));
}

#[test]
fn negation_outside_rule_is_rejected() {
    let err = parse_config_str("[option]\nlog_catalog != on\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::NegationNotAllowed(ref k) if k == "log_catalog"),
        "expected NegationNotAllowed, got: {err}"
    );

    let err = parse_config_str("[rule]\nformat != '%class%'\n").unwrap_err();
    assert!(matches!(err, ConfigError::NegationNotAllowed(_)));
}

#[test]
fn duplicate_field_in_one_rule_is_rejected() {
    let err = parse_config_str("[rule]\ndatabase = 'a'\ndatabase != 'b'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::DuplicateField(ref f) if f == "database"),
        "expected DuplicateField, got: {err}"
    );
}

#[test]
fn alias_counts_as_duplicate_of_its_field() {
    let err = parse_config_str("[rule]\nuser = 'alice'\naudit_role = 'bob'\n").unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateField(ref f) if f == "user"));
}

#[test]
fn second_format_in_one_rule_is_rejected() {
    let err =
        parse_config_str("[rule]\nformat = '%class%'\nformat = '%user%'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::DuplicateField(ref f) if f == "format"),
        "expected DuplicateField, got: {err}"
    );
}

#[test]
fn same_field_in_separate_rules_is_fine() {
    let config =
        parse_config_str("[rule]\ndatabase = 'a'\n[rule]\ndatabase = 'b'\n").unwrap();
    assert_eq!(config.rule_count(), 2);
    assert!(config.rules.iter().all(|r| r.rule(Field::Database).is_set()));
}

#[test]
fn unrecognized_boolean_keeps_default() {
    let config = parse_config_str(
        "[option]\nlog_parameter = 'sometimes'\nlog_catalog = 'maybe'\nlog_statement_once = 'yes'\n",
    )
    .unwrap();
    assert!(!config.options.log_parameter);
    assert!(config.options.log_catalog);
    assert!(!config.options.log_statement_once);
}

#[test]
fn reversed_time_range_is_rejected() {
    let err = parse_config_str("[rule]\ntimestamp = '18:00:00-09:00:00'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidTimeRange(_)),
        "expected InvalidTimeRange, got: {err}"
    );
}

#[test]
fn malformed_time_is_rejected() {
    let err = parse_config_str("[rule]\ntimestamp = '25:00:00-26:00:00'\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTime(_)), "got: {err}");
}

#[test]
fn unknown_class_is_rejected() {
    let err = parse_config_str("[rule]\nclass = 'READ, BOGUS'\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidClass(ref c) if c == "BOGUS"));
}

#[test]
fn invalid_log_level_is_rejected() {
    let err = parse_config_str("[option]\nlog_level = 'fatal'\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLogLevel(ref l) if l == "fatal"));
}

#[test]
fn invalid_logger_is_rejected() {
    let err = parse_config_str("[output]\nlogger = 'kafka'\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLogger(_)));
}

#[test]
fn file_logger_requires_pathlog() {
    let err = parse_config_str("[output]\nlogger = 'file'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidOutput(_)),
        "expected InvalidOutput, got: {err}"
    );

    let config =
        parse_config_str("[output]\nlogger = 'file'\npathlog = '/var/log/audit.log'\n").unwrap();
    assert_eq!(config.output.logger, LoggerKind::File);
    assert_eq!(
        config.output.pathlog.as_deref(),
        Some(std::path::Path::new("/var/log/audit.log"))
    );
}

#[test]
fn unknown_format_placeholder_is_rejected() {
    let err = parse_config_str("[rule]\nformat = '%class% %bogus%'\n").unwrap_err();
    assert!(
        matches!(err, ConfigError::UnknownPlaceholder(ref p) if p == "bogus"),
        "expected UnknownPlaceholder, got: {err}"
    );
}

#[test]
fn unterminated_quote_is_a_syntax_error() {
    let err = parse_config_str("[rule]\ndatabase = 'postgres\n").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax(_)), "got: {err}");
}

#[test]
fn missing_value_is_a_syntax_error() {
    let err = parse_config_str("[rule]\ndatabase =\n").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax(_)), "got: {err}");
}

#[test]
fn syntax_error_reports_position() {
    let err = parse_config_str("[rule]\nclass = 'READ'\n[rule\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("3:"), "expected line 3 in message, got: {msg}");
}

#[test]
fn empty_list_is_rejected() {
    let err = parse_config_str("[rule]\nuser = ' , '\n").unwrap_err();
    assert!(matches!(err, ConfigError::EmptyValue(ref f) if f == "user"));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = parse_config_file(std::path::Path::new("/nonexistent/pgaudit.conf")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
