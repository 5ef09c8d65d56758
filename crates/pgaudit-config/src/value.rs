use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigError, Result};

// =============================================================================
// AuditClass: event class bitmask
// =============================================================================

/// Coarse category assigned to an audit event.
///
/// A class is a bitmask so that rules can select several classes at once
/// (`class = 'READ, WRITE'`). Events are always assigned a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AuditClass(u32);

impl AuditClass {
    pub const NONE: AuditClass = AuditClass(0);
    pub const DDL: AuditClass = AuditClass(1 << 0);
    pub const FUNCTION: AuditClass = AuditClass(1 << 1);
    pub const MISC: AuditClass = AuditClass(1 << 2);
    pub const READ: AuditClass = AuditClass(1 << 3);
    pub const ROLE: AuditClass = AuditClass(1 << 4);
    pub const WRITE: AuditClass = AuditClass(1 << 5);
    pub const CONNECT: AuditClass = AuditClass(1 << 6);
    pub const ERROR: AuditClass = AuditClass(1 << 7);
    pub const SYSTEM: AuditClass = AuditClass(1 << 8);
    pub const BACKUP: AuditClass = AuditClass(1 << 9);
    pub const ALL: AuditClass = AuditClass((1 << 10) - 1);

    /// Classes for which object identity (type and name) is meaningful.
    pub const TABLE_OPERATION: AuditClass =
        AuditClass(Self::READ.0 | Self::WRITE.0 | Self::MISC.0);

    const NAMED: [(AuditClass, &'static str); 10] = [
        (Self::DDL, "DDL"),
        (Self::FUNCTION, "FUNCTION"),
        (Self::MISC, "MISC"),
        (Self::READ, "READ"),
        (Self::ROLE, "ROLE"),
        (Self::WRITE, "WRITE"),
        (Self::CONNECT, "CONNECT"),
        (Self::ERROR, "ERROR"),
        (Self::SYSTEM, "SYSTEM"),
        (Self::BACKUP, "BACKUP"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build a class set from raw bits, dropping bits that name no class.
    pub const fn from_bits(bits: u32) -> Self {
        AuditClass(bits & Self::ALL.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersects(self, other: AuditClass) -> bool {
        self.0 & other.0 != 0
    }

    /// Parse a class name (case-insensitive). Accepts `NONE` and `ALL`.
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("NONE") {
            return Some(Self::NONE);
        }
        if s.eq_ignore_ascii_case("ALL") {
            return Some(Self::ALL);
        }
        Self::NAMED
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(class, _)| *class)
    }

    /// Name of a single-bit class, `None` for empty or combined sets.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(class, _)| *class == self)
            .map(|(_, name)| *name)
    }

    /// Names of every class in the set, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(class, _)| self.intersects(*class))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for AuditClass {
    type Output = AuditClass;

    fn bitor(self, rhs: AuditClass) -> AuditClass {
        AuditClass(self.0 | rhs.0)
    }
}

impl BitOrAssign for AuditClass {
    fn bitor_assign(&mut self, rhs: AuditClass) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AuditClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        write!(f, "{}", self.names().join(","))
    }
}

impl Serialize for AuditClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// ObjectType: relation kind bitmask
// =============================================================================

/// Kind of database object touched by a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Table,
    Index,
    Sequence,
    ToastValue,
    View,
    MaterializedView,
    CompositeType,
    ForeignTable,
    Function,
    Unknown,
}

impl ObjectType {
    pub const ALL: [ObjectType; 10] = [
        ObjectType::Table,
        ObjectType::Index,
        ObjectType::Sequence,
        ObjectType::ToastValue,
        ObjectType::View,
        ObjectType::MaterializedView,
        ObjectType::CompositeType,
        ObjectType::ForeignTable,
        ObjectType::Function,
        ObjectType::Unknown,
    ];

    /// Bit used for this object type in `object_type` rules.
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Catalog spelling, as it appears in audit lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Table => "TABLE",
            ObjectType::Index => "INDEX",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::ToastValue => "TOAST TABLE",
            ObjectType::View => "VIEW",
            ObjectType::MaterializedView => "MATERIALIZED VIEW",
            ObjectType::CompositeType => "COMPOSITE TYPE",
            ObjectType::ForeignTable => "FOREIGN TABLE",
            ObjectType::Function => "FUNCTION",
            ObjectType::Unknown => "UNKNOWN TYPE",
        }
    }

    /// Parse either the catalog spelling (`MATERIALIZED VIEW`) or the
    /// configuration spelling (`MATERIALIZED_VIEW`, `MATVIEW`).
    pub fn from_name(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', " ");
        match normalized.as_str() {
            "TABLE" => Some(ObjectType::Table),
            "INDEX" => Some(ObjectType::Index),
            "SEQUENCE" => Some(ObjectType::Sequence),
            "TOAST TABLE" | "TOAST VALUE" | "TOASTVALUE" => Some(ObjectType::ToastValue),
            "VIEW" => Some(ObjectType::View),
            "MATERIALIZED VIEW" | "MATVIEW" => Some(ObjectType::MaterializedView),
            "COMPOSITE TYPE" => Some(ObjectType::CompositeType),
            "FOREIGN TABLE" => Some(ObjectType::ForeignTable),
            "FUNCTION" => Some(ObjectType::Function),
            "UNKNOWN" | "UNKNOWN TYPE" => Some(ObjectType::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// AuditLogLevel: severity of emitted audit lines
// =============================================================================

/// Severity at which audit lines are emitted by the host server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLogLevel {
    Debug5,
    Debug4,
    Debug3,
    Debug2,
    Debug1,
    #[default]
    Log,
    Info,
    Notice,
    Warning,
}

impl AuditLogLevel {
    /// Parse a level name (case-insensitive). Plain `debug` means `debug2`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug5" => Some(AuditLogLevel::Debug5),
            "debug4" => Some(AuditLogLevel::Debug4),
            "debug3" => Some(AuditLogLevel::Debug3),
            "debug" | "debug2" => Some(AuditLogLevel::Debug2),
            "debug1" => Some(AuditLogLevel::Debug1),
            "log" => Some(AuditLogLevel::Log),
            "info" => Some(AuditLogLevel::Info),
            "notice" => Some(AuditLogLevel::Notice),
            "warning" => Some(AuditLogLevel::Warning),
            _ => None,
        }
    }

    /// The host server's native severity ordinal.
    pub fn ordinal(self) -> i32 {
        match self {
            AuditLogLevel::Debug5 => 10,
            AuditLogLevel::Debug4 => 11,
            AuditLogLevel::Debug3 => 12,
            AuditLogLevel::Debug2 => 13,
            AuditLogLevel::Debug1 => 14,
            AuditLogLevel::Log => 15,
            AuditLogLevel::Info => 17,
            AuditLogLevel::Notice => 18,
            AuditLogLevel::Warning => 19,
        }
    }

    /// Closest `log` crate level, for sinks that emit through the `log` facade.
    pub fn to_log_level(self) -> log::Level {
        match self {
            AuditLogLevel::Debug5 | AuditLogLevel::Debug4 | AuditLogLevel::Debug3 => {
                log::Level::Trace
            }
            AuditLogLevel::Debug2 | AuditLogLevel::Debug1 => log::Level::Debug,
            AuditLogLevel::Log | AuditLogLevel::Info | AuditLogLevel::Notice => log::Level::Info,
            AuditLogLevel::Warning => log::Level::Warn,
        }
    }
}

// =============================================================================
// Scalar parsing helpers
// =============================================================================

/// Parse a boolean setting: `on`/`true`/`1` or `off`/`false`/`0`, case-insensitive.
///
/// Any other value leaves the setting at `default`.
pub fn parse_bool(key: &str, value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        _ => {
            log::warn!("unrecognized boolean '{value}' for '{key}', using default '{default}'");
            default
        }
    }
}

/// Parse a time of day written as `HH:MM:SS` (or `HH:MM`).
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| ConfigError::InvalidTime(s.to_string()))
}

/// A closed time-of-day interval `[begin, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub begin: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Build a range, rejecting `begin > end`.
    pub fn new(begin: NaiveTime, end: NaiveTime) -> Result<Self> {
        if begin > end {
            return Err(ConfigError::InvalidTimeRange(format!("{begin}-{end}")));
        }
        Ok(TimeRange { begin, end })
    }

    /// Parse `HH:MM:SS-HH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self> {
        let (begin, end) = s
            .split_once('-')
            .ok_or_else(|| ConfigError::InvalidTimeRange(s.trim().to_string()))?;
        TimeRange::new(parse_time_of_day(begin)?, parse_time_of_day(end)?)
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.begin <= t && t <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}
