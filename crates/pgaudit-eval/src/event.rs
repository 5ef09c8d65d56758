//! Audit event descriptors and the typed field bundle rules are matched against.
//!
//! An [`EventDescriptor`] is either a statement execution or a server
//! message, never both. The [`FieldBundle`] holds the attributes a rule
//! section can constrain; an absent attribute means "not applicable" and
//! lets that field's predicate pass.

use chrono::NaiveTime;
use pgaudit_config::{AuditClass, Field, ObjectType, RuleKind};
use serde::{Deserialize, Serialize};

// =============================================================================
// Event descriptors
// =============================================================================

/// Statement log level the host server assigned to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStmtLevel {
    /// Data-modifying statements.
    #[serde(alias = "mod")]
    Mod,
    #[serde(alias = "ddl")]
    Ddl,
    /// Anything else that was parsed and executed.
    #[serde(alias = "all")]
    All,
    #[serde(alias = "none")]
    None,
}

/// Command identifier carried by a statement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    CreateRole,
    AlterRole,
    Grant,
    GrantRole,
    DropRole,
    AlterRoleSet,
    AlterDefaultPrivileges,
    Rename,
    Drop,
    Select,
    Copy,
    Prepare,
    Planned,
    Do,
    Execute,
    #[serde(other)]
    Other,
}

impl CommandKind {
    /// Commands that manage roles or privileges.
    pub fn is_role_management(self) -> bool {
        matches!(
            self,
            CommandKind::CreateRole
                | CommandKind::AlterRole
                | CommandKind::Grant
                | CommandKind::GrantRole
                | CommandKind::DropRole
                | CommandKind::AlterRoleSet
                | CommandKind::AlterDefaultPrivileges
        )
    }

    /// Commands whose text may carry a clear-text password.
    pub fn may_carry_password(self) -> bool {
        matches!(self, CommandKind::CreateRole | CommandKind::AlterRole)
    }

    /// Commands that read data.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            CommandKind::Select | CommandKind::Copy | CommandKind::Prepare | CommandKind::Planned
        )
    }
}

/// A statement execution about to be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEvent {
    pub log_level: LogStmtLevel,
    pub command_kind: CommandKind,
    /// Raw statement text, if available.
    #[serde(default)]
    pub command_text: Option<String>,
    /// Textual command name, e.g. `ALTER ROLE`.
    #[serde(default)]
    pub command_label: String,
    #[serde(default)]
    pub object_type: Option<ObjectType>,
    #[serde(default)]
    pub object_name: Option<String>,
    /// Bound parameters in order. `None` is an SQL NULL.
    #[serde(default)]
    pub parameters: Vec<Option<String>>,
    #[serde(default)]
    pub statement_id: u64,
    #[serde(default)]
    pub substatement_id: u64,
    /// Statement text was already emitted for this substatement.
    #[serde(default)]
    pub statement_logged: bool,
    /// Every relation the statement touched lives in a system schema.
    #[serde(default)]
    pub catalog_only: bool,
    /// The configured audit role holds a privilege on the touched object.
    #[serde(default)]
    pub object_audited: bool,
}

impl StatementEvent {
    /// A statement event with no text, object or parameters.
    pub fn new(log_level: LogStmtLevel, command_kind: CommandKind) -> Self {
        StatementEvent {
            log_level,
            command_kind,
            command_text: None,
            command_label: String::new(),
            object_type: None,
            object_name: None,
            parameters: Vec::new(),
            statement_id: 0,
            substatement_id: 0,
            statement_logged: false,
            catalog_only: false,
            object_audited: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.command_text = Some(text.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.command_label = label.into();
        self
    }

    pub fn with_object(mut self, object_type: ObjectType, name: impl Into<String>) -> Self {
        self.object_type = Some(object_type);
        self.object_name = Some(name.into());
        self
    }
}

/// A server message (connection, shutdown, replication, error, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message: String,
    /// Five-character SQLSTATE code.
    #[serde(default = "default_sql_state")]
    pub sql_state: String,
}

fn default_sql_state() -> String {
    "00000".to_string()
}

impl MessageEvent {
    pub fn new(message: impl Into<String>, sql_state: impl Into<String>) -> Self {
        MessageEvent {
            message: message.into(),
            sql_state: sql_state.into(),
        }
    }

    /// The two-character SQLSTATE class.
    pub fn sql_state_class(&self) -> &str {
        self.sql_state.get(..2).unwrap_or(self.sql_state.as_str())
    }
}

/// An event handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDescriptor {
    Statement(StatementEvent),
    Message(MessageEvent),
}

impl EventDescriptor {
    pub fn as_statement(&self) -> Option<&StatementEvent> {
        match self {
            EventDescriptor::Statement(s) => Some(s),
            EventDescriptor::Message(_) => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            EventDescriptor::Message(m) => Some(m),
            EventDescriptor::Statement(_) => None,
        }
    }
}

impl From<StatementEvent> for EventDescriptor {
    fn from(s: StatementEvent) -> Self {
        EventDescriptor::Statement(s)
    }
}

impl From<MessageEvent> for EventDescriptor {
    fn from(m: MessageEvent) -> Self {
        EventDescriptor::Message(m)
    }
}

// =============================================================================
// Session context
// =============================================================================

/// Connection attributes of the session an event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContext {
    pub database: Option<String>,
    pub user: Option<String>,
    pub application_name: Option<String>,
    pub remote_host: Option<String>,
    pub remote_port: Option<i64>,
    /// Local time of day the event happened.
    pub time_of_day: Option<NaiveTime>,
}

// =============================================================================
// Field bundle
// =============================================================================

/// A typed event attribute handed to a rule predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Bits(u32),
    Time(NaiveTime),
    Int(i64),
}

impl FieldValue<'_> {
    /// The predicate kind this value can be compared by.
    pub fn kind(&self) -> RuleKind {
        match self {
            FieldValue::Text(_) => RuleKind::StringSet,
            FieldValue::Bits(_) => RuleKind::Bitmask,
            FieldValue::Time(_) => RuleKind::TimeRange,
            FieldValue::Int(_) => RuleKind::Integer,
        }
    }
}

/// Event attributes matched against rule predicates.
///
/// The class is not stored here; the evaluator receives it separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldBundle<'a> {
    /// Time of day the event happened.
    pub timestamp: Option<NaiveTime>,
    pub database: Option<&'a str>,
    pub user: Option<&'a str>,
    /// Object type bit (see [`ObjectType::bit`]); `Some(0)` for "no object".
    pub object_type: Option<u32>,
    pub object_name: Option<&'a str>,
    pub application_name: Option<&'a str>,
    pub remote_host: Option<&'a str>,
    pub remote_port: Option<i64>,
}

impl<'a> FieldBundle<'a> {
    /// Look up `field`, using `class` for the class key.
    pub fn value(&self, field: Field, class: AuditClass) -> Option<FieldValue<'a>> {
        match field {
            Field::Timestamp => self.timestamp.map(FieldValue::Time),
            Field::Database => self.database.map(FieldValue::Text),
            Field::User => self.user.map(FieldValue::Text),
            Field::Class => Some(FieldValue::Bits(class.bits())),
            Field::ObjectType => self.object_type.map(FieldValue::Bits),
            Field::ObjectName => self.object_name.map(FieldValue::Text),
            Field::ApplicationName => self.application_name.map(FieldValue::Text),
            Field::RemoteHost => self.remote_host.map(FieldValue::Text),
            Field::RemotePort => self.remote_port.map(FieldValue::Int),
        }
    }

    pub fn with_timestamp(mut self, t: NaiveTime) -> Self {
        self.timestamp = Some(t);
        self
    }

    pub fn with_database(mut self, v: &'a str) -> Self {
        self.database = Some(v);
        self
    }

    pub fn with_user(mut self, v: &'a str) -> Self {
        self.user = Some(v);
        self
    }

    pub fn with_object(mut self, object_type: Option<ObjectType>, name: Option<&'a str>) -> Self {
        self.object_type = Some(object_type.map_or(0, ObjectType::bit));
        self.object_name = or_empty(name);
        self
    }

    pub fn with_application_name(mut self, v: &'a str) -> Self {
        self.application_name = Some(v);
        self
    }

    pub fn with_remote_host(mut self, v: &'a str) -> Self {
        self.remote_host = Some(v);
        self
    }

    pub fn with_remote_port(mut self, port: i64) -> Self {
        self.remote_port = Some(port);
        self
    }
}

/// Present a missing string as `""` so its predicate is still applied.
pub fn or_empty(value: Option<&str>) -> Option<&str> {
    Some(value.unwrap_or(""))
}
