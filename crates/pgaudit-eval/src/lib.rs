//! # pgaudit-eval
//!
//! Classifier and rule evaluator for audit events.
//!
//! This crate consumes the [`AuditConfig`](pgaudit_config::AuditConfig)
//! snapshot produced by [`pgaudit_config`] and decides, for each event,
//! which rule sections want it logged.
//!
//! ## Architecture
//!
//! - **Classifier** (pure): event descriptor → class bit, class name and
//!   display text, with role passwords redacted.
//! - **Rule evaluator** (pure): field bundle + class + rule sections →
//!   overall match and a per-section match vector.
//! - **Rendering**: the fixed `AUDIT: SESSION,...` CSV layout or a rule's
//!   `format` directive.
//! - **Snapshot handle**: an `Arc` configuration generation swapped
//!   atomically on reload.
//!
//! ## Quick Start
//!
//! ```rust
//! use pgaudit_config::{AuditClass, parse_config_str};
//! use pgaudit_eval::{EventDescriptor, FieldBundle, MessageEvent, classify, evaluate};
//!
//! let config = parse_config_str("[rule]\nclass = 'CONNECT'\nuser != 'replicator'\n").unwrap();
//!
//! let event: EventDescriptor =
//!     MessageEvent::new("connection authenticated: identity=alice method=md5", "00000").into();
//! let class = classify(&event).unwrap();
//! assert_eq!(class.class, AuditClass::CONNECT);
//!
//! let fields = FieldBundle::default().with_user("alice");
//! let result = evaluate(&fields, class.class, &config.rules).unwrap();
//! assert!(result.matched);
//! ```

pub mod classifier;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod matcher;
pub mod result;
pub mod snapshot;

// Re-export the most commonly used types and functions at crate root
pub use classifier::{classify, redact_password};
pub use engine::{Auditor, evaluate, field_bundle};
pub use error::{EvalError, Result};
pub use event::{
    CommandKind, EventDescriptor, FieldBundle, FieldValue, LogStmtLevel, MessageEvent,
    SessionContext, StatementEvent,
};
pub use format::{
    AuditLine, StatementLine, render_message_line, render_object_line, render_statement_line,
};
pub use matcher::apply_one_rule;
pub use result::{AuditRecord, Classification, EvalResult};
pub use snapshot::ConfigHandle;
