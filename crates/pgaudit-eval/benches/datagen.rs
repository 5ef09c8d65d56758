//! Synthetic configurations and events for evaluator benchmarks.
//!
//! Output is deterministic for a given seed so benchmark runs are
//! reproducible.

use chrono::NaiveTime;
use pgaudit_config::ObjectType;
use pgaudit_eval::{
    CommandKind, EventDescriptor, LogStmtLevel, MessageEvent, SessionContext, StatementEvent,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 0x5E55_10A0;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

const CLASSES: &[&str] = &["READ", "WRITE", "DDL", "ROLE", "FUNCTION", "MISC", "CONNECT", "ERROR"];
const DATABASES: &[&str] = &["postgres", "billing", "inventory", "analytics"];
const USERS: &[&str] = &["alice", "bob", "carol", "replicator", "app_rw"];
const TABLES: &[&str] = &["public.accounts", "public.orders", "hr.salaries", "public.invoices"];
const MESSAGES: &[&str] = &[
    "connection received: host=10.0.0.5 port=51234",
    "connection authenticated: identity=alice method=scram-sha-256",
    "disconnection: session time: 0:00:03.120 user=bob database=billing",
    "database system is ready to accept connections",
    "checkpoint starting: time",
];

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// A configuration with `n` rule sections.
pub fn gen_config(n: usize) -> String {
    let mut rng = rng();
    let mut out = String::from("[option]\nlog_parameter = on\n\n");
    for _ in 0..n {
        out.push_str("[rule]\n");
        out.push_str(&format!(
            "class = '{}, {}'\n",
            pick(&mut rng, CLASSES),
            pick(&mut rng, CLASSES)
        ));
        if rng.random_bool(0.5) {
            out.push_str(&format!("database != '{}'\n", pick(&mut rng, DATABASES)));
        }
        if rng.random_bool(0.5) {
            out.push_str(&format!("user = '{}, {}'\n", pick(&mut rng, USERS), pick(&mut rng, USERS)));
        }
        if rng.random_bool(0.3) {
            out.push_str(&format!("object_name = '{}'\n", pick(&mut rng, TABLES)));
        }
        if rng.random_bool(0.3) {
            out.push_str("timestamp = '08:00:00-18:00:00'\n");
        }
        out.push('\n');
    }
    out
}

/// A mix of statements and server messages.
pub fn gen_events(n: usize) -> Vec<EventDescriptor> {
    let mut rng = rng();
    (0..n)
        .map(|i| -> EventDescriptor {
            if rng.random_bool(0.2) {
                return MessageEvent::new(pick(&mut rng, MESSAGES), "00000").into();
            }
            let table = pick(&mut rng, TABLES);
            let (level, kind, label) = match rng.random_range(0..4u8) {
                0 => (LogStmtLevel::All, CommandKind::Select, "SELECT"),
                1 => (LogStmtLevel::Mod, CommandKind::Other, "UPDATE"),
                2 => (LogStmtLevel::Ddl, CommandKind::AlterRole, "ALTER ROLE"),
                _ => (LogStmtLevel::Ddl, CommandKind::Other, "CREATE INDEX"),
            };
            let mut stmt = StatementEvent::new(level, kind)
                .with_text(format!("{label} /* {i} */ {table} PASSWORD 'x'"))
                .with_label(label)
                .with_object(ObjectType::Table, table);
            stmt.statement_id = i as u64;
            stmt.parameters = vec![Some(i.to_string()), None];
            stmt.into()
        })
        .collect()
}

pub fn gen_session() -> SessionContext {
    SessionContext {
        database: Some("billing".into()),
        user: Some("alice".into()),
        application_name: Some("bench".into()),
        remote_host: Some("10.0.0.5".into()),
        remote_port: Some(5432),
        time_of_day: NaiveTime::from_hms_opt(11, 0, 0),
    }
}
