//! # pgaudit-config
//!
//! Data model and configuration loader for audit rule evaluation.
//!
//! This crate turns an audit configuration file into an immutable, validated
//! [`AuditConfig`] snapshot:
//!
//! - **Classes**: the [`AuditClass`] bitmask (`READ`, `WRITE`, `DDL`, `ROLE`, ...)
//! - **Object types**: [`ObjectType`] bits for `object_type` rules
//! - **Rules**: single-field predicates ([`AuditRule`]) grouped into rule
//!   sections ([`AuditRuleConfig`]) with an optional [`FormatDirective`]
//! - **Settings**: the `[output]` and `[option]` sections
//!
//! ## Architecture
//!
//! - **PEG grammar** ([`pest`]) for the INI-like file layout, quoting and the
//!   `=` / `!=` operators
//! - **Typed validation** of every value at load time, so evaluation never
//!   sees a malformed predicate
//!
//! ## Quick Start
//!
//! ```rust
//! use pgaudit_config::{AuditClass, Field, RuleValues, parse_config_str};
//!
//! let text = r#"
//! [option]
//! log_parameter = on
//!
//! [rule]
//! class = 'READ, WRITE'
//! user != 'replicator'
//! "#;
//!
//! let config = parse_config_str(text).unwrap();
//! assert!(config.options.log_parameter);
//! assert_eq!(
//!     config.rules[0].rule(Field::Class).values,
//!     Some(RuleValues::Bitmask((AuditClass::READ | AuditClass::WRITE).bits()))
//! );
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod value;

// Re-export the most commonly used types and functions at crate root
pub use ast::{
    AuditConfig, AuditOptions, AuditRule, AuditRuleConfig, Field, FormatDirective, FormatSegment,
    LoggerKind, OutputConfig, Placeholder, RuleKind, RuleValues,
};
pub use error::{ConfigError, Result};
pub use parser::{parse_config_file, parse_config_str, parse_rule_values};
pub use value::{AuditClass, AuditLogLevel, ObjectType, TimeRange, parse_bool, parse_time_of_day};
