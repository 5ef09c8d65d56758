//! Audit configuration file → [`AuditConfig`] parser.
//!
//! The file is INI-like: `[output]`, `[option]` and any number of `[rule]`
//! sections, each followed by `key = value` settings. Rule settings may use
//! `!=` to negate a predicate. Lexing is done by the pest grammar in
//! `audit.pest`; this module validates each setting and builds the typed
//! snapshot.

use std::path::{Path, PathBuf};

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::ast::{
    AuditConfig, AuditOptions, AuditRule, AuditRuleConfig, Field, FormatDirective, LoggerKind,
    RuleKind, RuleValues,
};
use crate::error::{ConfigError, Result};
use crate::value::{AuditClass, AuditLogLevel, ObjectType, TimeRange, parse_bool};

// ---------------------------------------------------------------------------
// Pest parser (generated from audit.pest grammar)
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "src/audit.pest"]
struct AuditConfigParser;

// =============================================================================
// Public API
// =============================================================================

/// Parse configuration text into a validated snapshot.
///
/// # Examples
///
/// ```
/// use pgaudit_config::{Field, parse_config_str};
///
/// let config = parse_config_str(
///     "[rule]\nclass = 'READ, WRITE'\ndatabase != 'postgres'\n",
/// )
/// .unwrap();
/// assert_eq!(config.rules.len(), 1);
/// assert!(config.rules[0].rule(Field::Database).negate);
/// ```
pub fn parse_config_str(input: &str) -> Result<AuditConfig> {
    let mut pairs = AuditConfigParser::parse(Rule::config, input)
        .map_err(|e| ConfigError::Syntax(e.to_string()))?;
    let config_pair = pairs
        .next()
        .ok_or_else(|| ConfigError::Syntax("empty input".to_string()))?;

    let mut builder = ConfigBuilder::default();
    for pair in config_pair.into_inner() {
        match pair.as_rule() {
            Rule::section => builder.enter_section(section_name(pair))?,
            Rule::setting => {
                let setting = Setting::from_pair(pair)?;
                builder.apply(setting)?;
            }
            _ => {}
        }
    }
    builder.finish()
}

/// Parse a configuration file from a path.
pub fn parse_config_file(path: &Path) -> Result<AuditConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config_str(&content)?;
    log::debug!(
        "loaded {} rule section(s) from {}",
        config.rules.len(),
        path.display()
    );
    Ok(config)
}

/// Parse the comma-separated value list of a rule setting into the operand
/// representation required by `field`.
pub fn parse_rule_values(field: Field, raw: &str) -> Result<RuleValues> {
    let items = split_list(raw);
    if items.is_empty() {
        return Err(ConfigError::EmptyValue(field.name().to_string()));
    }

    let values = match field.kind() {
        RuleKind::StringSet => {
            RuleValues::Strings(items.iter().map(|s| (*s).to_string()).collect())
        }
        RuleKind::Bitmask => RuleValues::Bitmask(parse_bitmask(field, &items)?),
        RuleKind::TimeRange => RuleValues::TimeRanges(
            items
                .iter()
                .map(|s| TimeRange::parse(s))
                .collect::<Result<Vec<_>>>()?,
        ),
        RuleKind::Integer => RuleValues::Integers(
            items
                .iter()
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| ConfigError::InvalidInteger((*s).to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
    };
    Ok(values)
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Output,
    Option,
    Rule,
}

impl Section {
    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "output" => Some(Section::Output),
            "option" | "options" => Some(Section::Option),
            "rule" => Some(Section::Rule),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Section::Output => "output",
            Section::Option => "option",
            Section::Rule => "rule",
        }
    }
}

/// A single `key = value` / `key != value` line.
struct Setting {
    key: String,
    negate: bool,
    value: String,
}

impl Setting {
    fn from_pair(pair: Pair<'_, Rule>) -> Result<Self> {
        let mut key = None;
        let mut negate = false;
        let mut value = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => key = Some(inner.as_str().to_string()),
                Rule::ne_op => negate = true,
                Rule::eq_op => negate = false,
                Rule::quoted => value = Some(unquote(inner)),
                Rule::bare => value = Some(inner.as_str().to_string()),
                _ => {}
            }
        }

        match (key, value) {
            (Some(key), Some(value)) => Ok(Setting { key, negate, value }),
            _ => Err(ConfigError::Syntax("malformed setting".to_string())),
        }
    }
}

fn section_name(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn unquote(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::quoted_inner)
        .map(|p| p.as_str().replace("''", "'"))
        .unwrap_or_default()
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bitmask(field: Field, items: &[&str]) -> Result<u32> {
    let mut bits = 0u32;
    for item in items {
        bits |= match field {
            Field::Class => AuditClass::from_name(item)
                .ok_or_else(|| ConfigError::InvalidClass((*item).to_string()))?
                .bits(),
            _ => ObjectType::from_name(item)
                .ok_or_else(|| ConfigError::InvalidObjectType((*item).to_string()))?
                .bit(),
        };
    }
    Ok(bits)
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Default)]
struct ConfigBuilder {
    config: AuditConfig,
    section: Option<Section>,
    current_rule: Option<AuditRuleConfig>,
}

impl ConfigBuilder {
    fn enter_section(&mut self, name: String) -> Result<()> {
        self.flush_rule();
        let section = Section::from_name(&name).ok_or(ConfigError::UnknownSection(name))?;
        if section == Section::Rule {
            self.current_rule = Some(AuditRuleConfig::new());
        }
        self.section = Some(section);
        Ok(())
    }

    fn apply(&mut self, setting: Setting) -> Result<()> {
        let Some(section) = self.section else {
            return Err(ConfigError::OutsideSection(setting.key));
        };
        if setting.negate && section != Section::Rule {
            return Err(ConfigError::NegationNotAllowed(setting.key));
        }

        match section {
            Section::Output => self.apply_output(setting),
            Section::Option => self.apply_option(setting),
            Section::Rule => self.apply_rule(setting),
        }
    }

    fn apply_output(&mut self, setting: Setting) -> Result<()> {
        let output = &mut self.config.output;
        let Setting { key, value, .. } = setting;
        match key.to_ascii_lowercase().as_str() {
            "logger" => {
                output.logger =
                    LoggerKind::from_name(&value).ok_or(ConfigError::InvalidLogger(value))?;
            }
            "level" => output.level = Some(value),
            "pathlog" => output.pathlog = Some(PathBuf::from(value)),
            "facility" => output.facility = Some(value),
            "priority" => output.priority = Some(value),
            "ident" => output.ident = Some(value),
            "option" => output.option = Some(value),
            _ => return Err(unknown_setting(Section::Output, key)),
        }
        Ok(())
    }

    fn apply_option(&mut self, setting: Setting) -> Result<()> {
        let defaults = AuditOptions::default();
        let options = &mut self.config.options;
        let Setting { key, value, .. } = setting;
        match key.to_ascii_lowercase().as_str() {
            "role" => options.role = value,
            "log_catalog" => options.log_catalog = parse_bool(&key, &value, defaults.log_catalog),
            "log_parameter" => {
                options.log_parameter = parse_bool(&key, &value, defaults.log_parameter)
            }
            "log_statement_once" => {
                options.log_statement_once = parse_bool(&key, &value, defaults.log_statement_once)
            }
            "log_for_test" => {
                options.log_for_test = parse_bool(&key, &value, defaults.log_for_test)
            }
            "log_level" => {
                options.log_level =
                    AuditLogLevel::from_name(&value).ok_or(ConfigError::InvalidLogLevel(value))?;
            }
            _ => return Err(unknown_setting(Section::Option, key)),
        }
        Ok(())
    }

    fn apply_rule(&mut self, setting: Setting) -> Result<()> {
        let rule_config = self.current_rule.get_or_insert_with(AuditRuleConfig::new);

        if setting.key.eq_ignore_ascii_case("format") {
            if setting.negate {
                return Err(ConfigError::NegationNotAllowed(setting.key));
            }
            if rule_config.format.is_some() {
                return Err(ConfigError::DuplicateField(setting.key));
            }
            rule_config.format = Some(FormatDirective::parse(&setting.value)?);
            return Ok(());
        }

        let field = Field::from_name(&setting.key)
            .ok_or_else(|| unknown_setting(Section::Rule, setting.key.clone()))?;
        let values = parse_rule_values(field, &setting.value)?;
        rule_config.set_rule(AuditRule::new(field, setting.negate, values)?)
    }

    fn flush_rule(&mut self) {
        if let Some(rule) = self.current_rule.take() {
            self.config.rules.push(rule);
        }
    }

    fn finish(mut self) -> Result<AuditConfig> {
        self.flush_rule();
        if self.config.output.logger == LoggerKind::File && self.config.output.pathlog.is_none() {
            return Err(ConfigError::InvalidOutput(
                "logger 'file' requires 'pathlog'".to_string(),
            ));
        }
        if self.config.options.log_for_test {
            log::info!("loaded audit configuration: {:?}", self.config);
        }
        Ok(self.config)
    }
}

fn unknown_setting(section: Section, key: String) -> ConfigError {
    ConfigError::UnknownSetting {
        section: section.as_str().to_string(),
        key,
    }
}
