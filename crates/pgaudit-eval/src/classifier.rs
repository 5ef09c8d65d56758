//! Event classification.
//!
//! Statements are classified from their log level and command kind, server
//! messages by marker substrings and SQLSTATE. Classification never mutates
//! the event; a redacted statement text is returned as a new string.

use std::borrow::Cow;

use pgaudit_config::AuditClass;

use crate::event::{CommandKind, EventDescriptor, LogStmtLevel, MessageEvent, StatementEvent};
use crate::result::Classification;

const PASSWORD_TOKEN: &str = "password";
const REDACTED_TOKEN: &str = "<REDACTED>";

const CONNECT_MARKERS: &[&str] = &["receiv", "authenticat", "disconnect"];
const SYSTEM_MARKERS: &[&str] = &[
    "shutdown",
    "shutting down",
    "interrupt",
    "ready to accept",
    "new timeline",
];
const BACKUP_MARKER: &str = "replication command";

/// Classify an event.
///
/// Returns `None` for server messages that belong to no audit class.
pub fn classify(event: &EventDescriptor) -> Option<Classification<'_>> {
    let classification = match event {
        EventDescriptor::Statement(stmt) => classify_statement(stmt),
        EventDescriptor::Message(msg) => classify_message(msg)?,
    };
    log::debug!("classified event as {}", classification.class_name);
    Some(classification)
}

fn classify_statement(stmt: &StatementEvent) -> Classification<'_> {
    let class = statement_class(stmt);
    let text = stmt.command_text.as_deref();

    let display_text = if stmt.log_level == LogStmtLevel::Ddl && stmt.command_kind.may_carry_password()
    {
        text.map(redact_password)
    } else {
        text.map(Cow::Borrowed)
    };

    Classification {
        class,
        class_name: class_name(class),
        display_text,
    }
}

fn statement_class(stmt: &StatementEvent) -> AuditClass {
    match stmt.log_level {
        LogStmtLevel::Mod => match stmt.command_kind {
            CommandKind::Execute => AuditClass::MISC,
            _ => AuditClass::WRITE,
        },
        LogStmtLevel::Ddl => {
            if stmt.command_kind.is_role_management() {
                AuditClass::ROLE
            } else if matches!(stmt.command_kind, CommandKind::Rename | CommandKind::Drop)
                && is_role_label(&stmt.command_label)
            {
                AuditClass::ROLE
            } else {
                AuditClass::DDL
            }
        }
        LogStmtLevel::All => {
            if stmt.command_kind.is_read() {
                AuditClass::READ
            } else if stmt.command_kind == CommandKind::Do {
                AuditClass::FUNCTION
            } else {
                AuditClass::MISC
            }
        }
        LogStmtLevel::None => AuditClass::MISC,
    }
}

fn is_role_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("ALTER ROLE") || label.eq_ignore_ascii_case("DROP ROLE")
}

fn classify_message(msg: &MessageEvent) -> Option<Classification<'_>> {
    let text = msg.message.as_str();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));

    let class = if contains_any(CONNECT_MARKERS) {
        AuditClass::CONNECT
    } else if contains_any(SYSTEM_MARKERS) {
        AuditClass::SYSTEM
    } else if text.contains(BACKUP_MARKER) {
        AuditClass::BACKUP
    } else if msg.sql_state_class() != "00" {
        AuditClass::ERROR
    } else {
        return None;
    };

    Some(Classification {
        class,
        class_name: class_name(class),
        display_text: Some(Cow::Borrowed(text)),
    })
}

fn class_name(class: AuditClass) -> &'static str {
    class.name().unwrap_or("MISC")
}

/// Hide everything after the first case-insensitive `password` token.
///
/// The result keeps the original text up to and including the token,
/// followed by a single space and `<REDACTED>`. Text without the token is
/// returned unchanged.
pub fn redact_password(text: &str) -> Cow<'_, str> {
    let lowered = text.to_ascii_lowercase();
    match lowered.find(PASSWORD_TOKEN) {
        Some(pos) => {
            let end = pos + PASSWORD_TOKEN.len();
            Cow::Owned(format!("{} {REDACTED_TOKEN}", &text[..end]))
        }
        None => Cow::Borrowed(text),
    }
}
