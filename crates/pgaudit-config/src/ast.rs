//! Typed configuration model: rule fields, rule predicates, rule sections,
//! output settings and the immutable configuration snapshot.
//!
//! Every value in this module has already been validated. A rule's operand
//! representation is selected by the [`RuleValues`] variant, and
//! [`AuditRule::new`] refuses a variant that does not fit the rule's field.

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::error::{ConfigError, Result};
use crate::value::{AuditLogLevel, TimeRange};

// =============================================================================
// Fields
// =============================================================================

/// Event attributes a rule section can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Timestamp,
    Database,
    User,
    Class,
    ObjectType,
    ObjectName,
    ApplicationName,
    RemoteHost,
    RemotePort,
}

impl Field {
    pub const COUNT: usize = 9;

    /// All fields, in rule-section order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Timestamp,
        Field::Database,
        Field::User,
        Field::Class,
        Field::ObjectType,
        Field::ObjectName,
        Field::ApplicationName,
        Field::RemoteHost,
        Field::RemotePort,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Configuration key for this field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Database => "database",
            Field::User => "user",
            Field::Class => "class",
            Field::ObjectType => "object_type",
            Field::ObjectName => "object_name",
            Field::ApplicationName => "application_name",
            Field::RemoteHost => "remote_host",
            Field::RemotePort => "remote_port",
        }
    }

    /// Parse a configuration key (case-insensitive), including the legacy
    /// `audit_role` and `object_id` spellings.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Some(Field::Timestamp),
            "database" => Some(Field::Database),
            "user" | "audit_role" => Some(Field::User),
            "class" => Some(Field::Class),
            "object_type" => Some(Field::ObjectType),
            "object_name" | "object_id" => Some(Field::ObjectName),
            "application_name" => Some(Field::ApplicationName),
            "remote_host" => Some(Field::RemoteHost),
            "remote_port" => Some(Field::RemotePort),
            _ => None,
        }
    }

    /// The predicate kind every rule on this field uses.
    pub fn kind(self) -> RuleKind {
        match self {
            Field::Timestamp => RuleKind::TimeRange,
            Field::Class | Field::ObjectType => RuleKind::Bitmask,
            Field::RemotePort => RuleKind::Integer,
            Field::Database
            | Field::User
            | Field::ObjectName
            | Field::ApplicationName
            | Field::RemoteHost => RuleKind::StringSet,
        }
    }

    /// Object type and name only describe table operations.
    pub fn is_object_field(self) -> bool {
        matches!(self, Field::ObjectType | Field::ObjectName)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Comparison performed by a rule predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    StringSet,
    Bitmask,
    TimeRange,
    Integer,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::StringSet => "string",
            RuleKind::Bitmask => "bitmask",
            RuleKind::TimeRange => "time range",
            RuleKind::Integer => "integer",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operand of a rule predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleValues {
    /// Matched case-insensitively; any entry may match.
    Strings(Vec<String>),
    /// Matched by bit overlap.
    Bitmask(u32),
    /// Matched when the time of day falls in any closed range.
    TimeRanges(Vec<TimeRange>),
    /// Matched by exact equality with any entry.
    Integers(Vec<i64>),
}

impl RuleValues {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleValues::Strings(_) => RuleKind::StringSet,
            RuleValues::Bitmask(_) => RuleKind::Bitmask,
            RuleValues::TimeRanges(_) => RuleKind::TimeRange,
            RuleValues::Integers(_) => RuleKind::Integer,
        }
    }
}

/// A single-field predicate within a rule section.
///
/// `values == None` means the field is not constrained; such a rule passes
/// every event regardless of `negate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRule {
    pub field: Field,
    /// Inverts the predicate (`field != '...'` in the configuration file).
    pub negate: bool,
    pub values: Option<RuleValues>,
}

impl AuditRule {
    /// An unconstrained rule for `field`.
    pub fn unset(field: Field) -> Self {
        AuditRule {
            field,
            negate: false,
            values: None,
        }
    }

    /// Build a rule, checking that the operand fits the field's kind.
    pub fn new(field: Field, negate: bool, values: RuleValues) -> Result<Self> {
        if values.kind() != field.kind() {
            return Err(ConfigError::KindMismatch {
                field: field.name(),
                expected: field.kind().as_str(),
            });
        }
        Ok(AuditRule {
            field,
            negate,
            values: Some(values),
        })
    }

    pub fn is_set(&self) -> bool {
        self.values.is_some()
    }
}

/// One `[rule]` section: a predicate per field plus an optional format.
///
/// Predicates are stored in [`Field::ALL`] order, one per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRuleConfig {
    pub format: Option<FormatDirective>,
    rules: Vec<AuditRule>,
}

impl AuditRuleConfig {
    /// A section with every field unconstrained. It matches every event.
    pub fn new() -> Self {
        AuditRuleConfig {
            format: None,
            rules: Field::ALL.iter().map(|&f| AuditRule::unset(f)).collect(),
        }
    }

    /// Build a section from a set of predicates.
    pub fn from_rules(rules: impl IntoIterator<Item = AuditRule>) -> Result<Self> {
        let mut config = AuditRuleConfig::new();
        for rule in rules {
            config.set_rule(rule)?;
        }
        Ok(config)
    }

    /// Install a predicate. A field may only be constrained once.
    pub fn set_rule(&mut self, rule: AuditRule) -> Result<()> {
        let slot = &mut self.rules[rule.field.index()];
        if slot.is_set() {
            return Err(ConfigError::DuplicateField(rule.field.name().to_string()));
        }
        *slot = rule;
        Ok(())
    }

    pub fn with_format(mut self, format: FormatDirective) -> Self {
        self.format = Some(format);
        self
    }

    pub fn rule(&self, field: Field) -> &AuditRule {
        &self.rules[field.index()]
    }

    pub fn rules(&self) -> &[AuditRule] {
        &self.rules
    }

    /// Predicates that actually constrain a field.
    pub fn active_rules(&self) -> impl Iterator<Item = &AuditRule> {
        self.rules.iter().filter(|r| r.is_set())
    }
}

impl Default for AuditRuleConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Format directives
// =============================================================================

/// A `%name%` placeholder usable in a rule's `format` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Timestamp,
    Database,
    User,
    Class,
    Command,
    ObjectType,
    ObjectName,
    Statement,
    Parameter,
    ApplicationName,
    RemoteHost,
    RemotePort,
    Message,
    StatementId,
    SubstatementId,
}

impl Placeholder {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "timestamp" => Some(Placeholder::Timestamp),
            "database" => Some(Placeholder::Database),
            "user" => Some(Placeholder::User),
            "class" => Some(Placeholder::Class),
            "command" => Some(Placeholder::Command),
            "object_type" => Some(Placeholder::ObjectType),
            "object_name" => Some(Placeholder::ObjectName),
            "statement" => Some(Placeholder::Statement),
            "parameter" => Some(Placeholder::Parameter),
            "application_name" => Some(Placeholder::ApplicationName),
            "remote_host" => Some(Placeholder::RemoteHost),
            "remote_port" => Some(Placeholder::RemotePort),
            "message" => Some(Placeholder::Message),
            "statement_id" => Some(Placeholder::StatementId),
            "substatement_id" => Some(Placeholder::SubstatementId),
            _ => None,
        }
    }
}

/// A piece of a parsed format directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A validated `format` directive such as `'%class%,%statement%'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDirective {
    source: String,
    segments: Vec<FormatSegment>,
}

impl FormatDirective {
    /// Parse a directive. `%%` is a literal percent sign.
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = s;

        while let Some(start) = rest.find('%') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find('%')
                .ok_or_else(|| ConfigError::UnterminatedPlaceholder(s.to_string()))?;
            let name = &after[..end];
            if name.is_empty() {
                literal.push('%');
            } else {
                let placeholder = Placeholder::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownPlaceholder(name.to_string()))?;
                if !literal.is_empty() {
                    segments.push(FormatSegment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(FormatSegment::Placeholder(placeholder));
            }
            rest = &after[end + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(FormatSegment::Literal(literal));
        }

        Ok(FormatDirective {
            source: s.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[FormatSegment] {
        &self.segments
    }
}

impl Serialize for FormatDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

// =============================================================================
// Output and option sections
// =============================================================================

/// Destination kind for emitted audit lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerKind {
    #[default]
    ServerLog,
    Syslog,
    File,
}

impl LoggerKind {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serverlog" => Some(LoggerKind::ServerLog),
            "syslog" => Some(LoggerKind::Syslog),
            "file" => Some(LoggerKind::File),
            _ => None,
        }
    }
}

/// The `[output]` section. Consumed by the log sink, not by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputConfig {
    pub logger: LoggerKind,
    pub level: Option<String>,
    pub pathlog: Option<PathBuf>,
    pub facility: Option<String>,
    pub priority: Option<String>,
    pub ident: Option<String>,
    pub option: Option<String>,
}

/// The `[option]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditOptions {
    /// Role whose grants select objects for object-level auditing.
    pub role: String,
    /// Log statements that only touch system catalogs.
    pub log_catalog: bool,
    /// Include bound statement parameters in audit lines.
    pub log_parameter: bool,
    /// Log statement text and parameters only on the first line of a substatement.
    pub log_statement_once: bool,
    pub log_for_test: bool,
    pub log_level: AuditLogLevel,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            role: String::new(),
            log_catalog: true,
            log_parameter: false,
            log_statement_once: false,
            log_for_test: false,
            log_level: AuditLogLevel::default(),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// A complete, validated configuration generation.
///
/// Snapshots are immutable; a reload builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditConfig {
    pub output: OutputConfig,
    pub options: AuditOptions,
    /// Rule sections, in configuration order.
    pub rules: Vec<AuditRuleConfig>,
}

impl AuditConfig {
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
