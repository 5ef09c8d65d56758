//! Audit line rendering.
//!
//! Without a format directive, statements render as
//! `AUDIT: SESSION,<statement_id>,<substatement_id>,<class>,<command>,<object_type>,<object_name>,<statement>,<parameter>`
//! and server messages as `AUDIT: SESSION,,,<class>,<message>`. A rule's
//! `format` directive replaces that layout with its own `%name%` template.
//!
//! Object audit lines use the same statement columns under `AUDIT: OBJECT`
//! and never take a format directive.

use std::borrow::Cow;
use std::fmt::Write as _;

use pgaudit_config::{AuditOptions, FormatDirective, FormatSegment, Placeholder};

use crate::event::{SessionContext, StatementEvent};

pub const SESSION_LINE_PREFIX: &str = "AUDIT: SESSION";
pub const OBJECT_LINE_PREFIX: &str = "AUDIT: OBJECT";
pub const NOT_LOGGED: &str = "<not logged>";
pub const NO_PARAMETERS: &str = "<none>";
pub const PREVIOUSLY_LOGGED: &str = "<previously logged>";

// =============================================================================
// CSV helpers
// =============================================================================

/// Quote a CSV field when it contains `,`, `"`, `\n` or `\r`.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Append a CSV field. An absent field appends nothing.
pub fn append_csv(buf: &mut String, value: Option<&str>) {
    if let Some(v) = value {
        buf.push_str(&csv_field(v));
    }
}

/// Render the parameter column.
///
/// Each parameter is quoted on its own, NULLs render empty, and the joined
/// list is quoted again as a single column.
pub fn render_parameters(parameters: &[Option<String>], log_parameter: bool) -> String {
    if !log_parameter {
        return NOT_LOGGED.to_string();
    }
    if parameters.is_empty() {
        return NO_PARAMETERS.to_string();
    }

    let mut joined = String::new();
    for (i, p) in parameters.iter().enumerate() {
        if i != 0 {
            joined.push(',');
        }
        append_csv(&mut joined, p.as_deref());
    }
    csv_field(&joined).into_owned()
}

// =============================================================================
// Lines
// =============================================================================

/// One statement line to render.
#[derive(Debug, Clone, Copy)]
pub struct StatementLine<'a> {
    pub event: &'a StatementEvent,
    pub class_name: &'a str,
    /// Display text from classification, possibly redacted.
    pub text: Option<&'a str>,
    /// Statement and parameters were already emitted for this substatement
    /// and `log_statement_once` is on.
    pub previously_logged: bool,
}

impl StatementLine<'_> {
    fn statement_column(&self) -> Cow<'_, str> {
        if self.previously_logged {
            Cow::Borrowed(PREVIOUSLY_LOGGED)
        } else {
            self.text.map(csv_field).unwrap_or_default()
        }
    }

    fn parameter_column(&self, options: &AuditOptions) -> Cow<'_, str> {
        if self.previously_logged {
            Cow::Borrowed(PREVIOUSLY_LOGGED)
        } else {
            Cow::Owned(render_parameters(&self.event.parameters, options.log_parameter))
        }
    }
}

/// Render a statement line in the fixed CSV layout.
pub fn render_statement_line(line: &StatementLine<'_>, options: &AuditOptions) -> String {
    render_statement_columns(SESSION_LINE_PREFIX, line, options)
}

/// Render an object audit line.
pub fn render_object_line(line: &StatementLine<'_>, options: &AuditOptions) -> String {
    render_statement_columns(OBJECT_LINE_PREFIX, line, options)
}

fn render_statement_columns(
    prefix: &str,
    line: &StatementLine<'_>,
    options: &AuditOptions,
) -> String {
    let event = line.event;
    let mut out = format!(
        "{prefix},{},{},{},",
        event.statement_id, event.substatement_id, line.class_name
    );
    append_csv(&mut out, Some(&event.command_label));
    out.push(',');
    append_csv(&mut out, event.object_type.map(|t| t.as_str()));
    out.push(',');
    append_csv(&mut out, event.object_name.as_deref());
    out.push(',');
    out.push_str(&line.statement_column());
    out.push(',');
    out.push_str(&line.parameter_column(options));
    out
}

/// Render a server message line in the fixed layout.
pub fn render_message_line(class_name: &str, message: &str) -> String {
    format!("{SESSION_LINE_PREFIX},,,{class_name},{message}")
}

/// A line about to be rendered, statement or message.
#[derive(Debug, Clone, Copy)]
pub enum AuditLine<'a> {
    Statement(StatementLine<'a>),
    Message { class_name: &'a str, message: &'a str },
}

impl AuditLine<'_> {
    /// Render with `directive` when given, otherwise in the fixed layout.
    pub fn render(
        &self,
        directive: Option<&FormatDirective>,
        session: &SessionContext,
        options: &AuditOptions,
    ) -> String {
        match (directive, self) {
            (Some(d), _) => render_directive(d, self, session, options),
            (None, AuditLine::Statement(line)) => render_statement_line(line, options),
            (None, AuditLine::Message {
                class_name,
                message,
            }) => render_message_line(class_name, message),
        }
    }
}

// =============================================================================
// Format directives
// =============================================================================

/// Substitute every placeholder of `directive`. Values are inserted as-is;
/// a value that does not apply to the line renders empty.
pub fn render_directive(
    directive: &FormatDirective,
    line: &AuditLine<'_>,
    session: &SessionContext,
    options: &AuditOptions,
) -> String {
    let mut out = String::with_capacity(directive.as_str().len() + 64);
    for segment in directive.segments() {
        match segment {
            FormatSegment::Literal(s) => out.push_str(s),
            FormatSegment::Placeholder(p) => push_placeholder(&mut out, *p, line, session, options),
        }
    }
    out
}

fn push_placeholder(
    out: &mut String,
    placeholder: Placeholder,
    line: &AuditLine<'_>,
    session: &SessionContext,
    options: &AuditOptions,
) {
    let stmt = match line {
        AuditLine::Statement(s) => Some(s),
        AuditLine::Message { .. } => None,
    };

    match placeholder {
        Placeholder::Timestamp => {
            if let Some(t) = session.time_of_day {
                let _ = write!(out, "{}", t.format("%H:%M:%S"));
            }
        }
        Placeholder::Database => out.push_str(session.database.as_deref().unwrap_or_default()),
        Placeholder::User => out.push_str(session.user.as_deref().unwrap_or_default()),
        Placeholder::ApplicationName => {
            out.push_str(session.application_name.as_deref().unwrap_or_default())
        }
        Placeholder::RemoteHost => out.push_str(session.remote_host.as_deref().unwrap_or_default()),
        Placeholder::RemotePort => {
            if let Some(port) = session.remote_port {
                let _ = write!(out, "{port}");
            }
        }
        Placeholder::Class => match line {
            AuditLine::Statement(s) => out.push_str(s.class_name),
            AuditLine::Message { class_name, .. } => out.push_str(class_name),
        },
        Placeholder::Message => {
            if let AuditLine::Message { message, .. } = line {
                out.push_str(message);
            }
        }
        Placeholder::Command => {
            if let Some(s) = stmt {
                out.push_str(&s.event.command_label);
            }
        }
        Placeholder::ObjectType => {
            if let Some(t) = stmt.and_then(|s| s.event.object_type) {
                out.push_str(t.as_str());
            }
        }
        Placeholder::ObjectName => {
            if let Some(name) = stmt.and_then(|s| s.event.object_name.as_deref()) {
                out.push_str(name);
            }
        }
        Placeholder::Statement => {
            if let Some(s) = stmt {
                out.push_str(if s.previously_logged {
                    PREVIOUSLY_LOGGED
                } else {
                    s.text.unwrap_or_default()
                });
            }
        }
        Placeholder::Parameter => {
            if let Some(s) = stmt {
                out.push_str(&s.parameter_column(options));
            }
        }
        Placeholder::StatementId => {
            if let Some(s) = stmt {
                let _ = write!(out, "{}", s.event.statement_id);
            }
        }
        Placeholder::SubstatementId => {
            if let Some(s) = stmt {
                let _ = write!(out, "{}", s.event.substatement_id);
            }
        }
    }
}
