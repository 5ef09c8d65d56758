#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveTime;
use pgaudit_config::parse_config_str;
use pgaudit_eval::{
    AuditRecord, Auditor, CommandKind, EventDescriptor, LogStmtLevel, MessageEvent,
    SessionContext, StatementEvent,
};

pub fn auditor(config: &str) -> Auditor {
    Auditor::new(Arc::new(parse_config_str(config).unwrap()))
}

pub fn audit(config: &str, event: EventDescriptor, session: &SessionContext) -> Option<AuditRecord> {
    auditor(config).audit(&event, session).unwrap()
}

pub fn session(database: &str, user: &str) -> SessionContext {
    SessionContext {
        database: Some(database.to_string()),
        user: Some(user.to_string()),
        application_name: Some("psql".to_string()),
        remote_host: Some("10.0.0.5".to_string()),
        remote_port: Some(5432),
        time_of_day: NaiveTime::from_hms_opt(10, 30, 0),
    }
}

pub fn select(table: &str) -> EventDescriptor {
    StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
        .with_text(format!("SELECT * FROM {table}"))
        .with_label("SELECT")
        .with_object(pgaudit_config::ObjectType::Table, table)
        .into()
}

pub fn message(text: &str, sql_state: &str) -> EventDescriptor {
    MessageEvent::new(text, sql_state).into()
}
