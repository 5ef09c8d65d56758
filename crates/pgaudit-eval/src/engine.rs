//! Rule evaluation and the end-to-end audit driver.
//!
//! [`evaluate`] decides which rule sections an event satisfies. [`Auditor`]
//! wraps a configuration snapshot and runs the whole flow for one event:
//! classify, build the field bundle, evaluate and render.

use std::sync::Arc;

use pgaudit_config::{AuditClass, AuditConfig, AuditRuleConfig, Field};

use crate::classifier::classify;
use crate::error::Result;
use crate::event::{EventDescriptor, FieldBundle, SessionContext, or_empty};
use crate::format::{AuditLine, StatementLine, render_object_line};
use crate::matcher::apply_one_rule;
use crate::result::{AuditRecord, EvalResult};

/// Evaluate an event against every rule section.
///
/// Each section is a conjunction of its predicates. Object type and name are
/// only consulted when `class` is a table operation (READ, WRITE or MISC).
/// Every section is evaluated; `per_rule` has one entry per section.
pub fn evaluate(
    fields: &FieldBundle<'_>,
    class: AuditClass,
    rules: &[AuditRuleConfig],
) -> Result<EvalResult> {
    let table_operation = class.intersects(AuditClass::TABLE_OPERATION);
    let mut per_rule = Vec::with_capacity(rules.len());

    for (index, config) in rules.iter().enumerate() {
        let hit = section_matches(fields, class, config, table_operation)?;
        log::debug!("rule section {index}: {}", if hit { "matched" } else { "no match" });
        per_rule.push(hit);
    }

    Ok(EvalResult {
        matched: per_rule.iter().any(|&m| m),
        per_rule,
    })
}

fn section_matches(
    fields: &FieldBundle<'_>,
    class: AuditClass,
    config: &AuditRuleConfig,
    table_operation: bool,
) -> Result<bool> {
    let checked = Field::ALL
        .into_iter()
        .filter(|f| table_operation || !f.is_object_field());

    for field in checked {
        if !apply_one_rule(fields.value(field, class), config.rule(field))? {
            log::trace!("field '{field}' rejected the event");
            return Ok(false);
        }
    }
    Ok(true)
}

// =============================================================================
// Auditor
// =============================================================================

/// Runs classification, evaluation and rendering against one configuration
/// snapshot.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pgaudit_config::parse_config_str;
/// use pgaudit_eval::{Auditor, CommandKind, LogStmtLevel, SessionContext, StatementEvent};
///
/// let config = parse_config_str("[rule]\nclass = 'READ'\n").unwrap();
/// let auditor = Auditor::new(Arc::new(config));
///
/// let event = StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
///     .with_text("SELECT 1")
///     .with_label("SELECT")
///     .into();
/// let record = auditor.audit(&event, &SessionContext::default()).unwrap().unwrap();
/// assert_eq!(record.class_name, "READ");
/// assert_eq!(record.lines, vec!["AUDIT: SESSION,0,0,READ,SELECT,,,SELECT 1,<not logged>"]);
/// ```
#[derive(Debug, Clone)]
pub struct Auditor {
    config: Arc<AuditConfig>,
}

impl Auditor {
    pub fn new(config: Arc<AuditConfig>) -> Self {
        Auditor { config }
    }

    pub fn config(&self) -> &Arc<AuditConfig> {
        &self.config
    }

    /// Audit one event.
    ///
    /// Returns `None` when the event belongs to no class or is a
    /// catalog-only statement while `log_catalog` is off. A statement on an
    /// object covered by the audit `role` yields a single `AUDIT: OBJECT`
    /// line whatever the rules say. Otherwise the record holds one rendered
    /// line per matching rule section (possibly none).
    pub fn audit(
        &self,
        event: &EventDescriptor,
        session: &SessionContext,
    ) -> Result<Option<AuditRecord>> {
        let options = &self.config.options;

        if let EventDescriptor::Statement(stmt) = event
            && stmt.catalog_only
            && !options.log_catalog
        {
            log::debug!("skipping catalog-only statement");
            return Ok(None);
        }

        let Some(classification) = classify(event) else {
            return Ok(None);
        };

        let fields = field_bundle(event, session);
        let result = evaluate(&fields, classification.class, &self.config.rules)?;

        let text = classification.display_text.as_deref();

        if let EventDescriptor::Statement(stmt) = event
            && stmt.object_audited
            && !options.role.is_empty()
        {
            log::debug!("object audit via role '{}'", options.role);
            let line = StatementLine {
                event: stmt,
                class_name: classification.class_name,
                text,
                previously_logged: stmt.statement_logged && options.log_statement_once,
            };
            return Ok(Some(AuditRecord {
                class: classification.class,
                class_name: classification.class_name,
                level: options.log_level,
                matched: result.matched,
                per_rule: result.per_rule,
                object_audit: true,
                lines: vec![render_object_line(&line, options)],
            }));
        }

        let mut statement_logged = match event {
            EventDescriptor::Statement(stmt) => stmt.statement_logged,
            EventDescriptor::Message(_) => false,
        };

        let mut lines = Vec::new();
        for index in result.matched_indices() {
            let line = match event {
                EventDescriptor::Statement(stmt) => {
                    let line = AuditLine::Statement(StatementLine {
                        event: stmt,
                        class_name: classification.class_name,
                        text,
                        previously_logged: statement_logged && options.log_statement_once,
                    });
                    statement_logged = true;
                    line
                }
                EventDescriptor::Message(msg) => AuditLine::Message {
                    class_name: classification.class_name,
                    message: &msg.message,
                },
            };
            let directive = self.config.rules[index].format.as_ref();
            lines.push(line.render(directive, session, options));
        }

        Ok(Some(AuditRecord {
            class: classification.class,
            class_name: classification.class_name,
            level: options.log_level,
            matched: result.matched,
            per_rule: result.per_rule,
            object_audit: false,
            lines,
        }))
    }
}

/// Build the field bundle for an event.
///
/// Statements compare missing session strings as `""`; server messages
/// treat them as not applicable.
pub fn field_bundle<'a>(event: &'a EventDescriptor, session: &'a SessionContext) -> FieldBundle<'a> {
    let mut fields = FieldBundle {
        timestamp: session.time_of_day,
        application_name: or_empty(session.application_name.as_deref()),
        remote_port: session.remote_port,
        ..FieldBundle::default()
    };

    match event {
        EventDescriptor::Statement(stmt) => {
            fields.database = or_empty(session.database.as_deref());
            fields.user = or_empty(session.user.as_deref());
            fields.remote_host = or_empty(session.remote_host.as_deref());
            fields = fields.with_object(stmt.object_type, stmt.object_name.as_deref());
        }
        EventDescriptor::Message(_) => {
            fields.database = session.database.as_deref();
            fields.user = session.user.as_deref();
            fields.remote_host = session.remote_host.as_deref();
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::event::{CommandKind, LogStmtLevel, MessageEvent, StatementEvent};
    use pgaudit_config::{AuditRule, ObjectType, RuleValues, parse_config_str};

    fn strings(items: &[&str]) -> RuleValues {
        RuleValues::Strings(items.iter().map(|s| s.to_string()).collect())
    }

    fn section(rules: Vec<AuditRule>) -> AuditRuleConfig {
        AuditRuleConfig::from_rules(rules).unwrap()
    }

    #[test]
    fn test_empty_rule_list() {
        let r = evaluate(&FieldBundle::default(), AuditClass::READ, &[]).unwrap();
        assert!(!r.matched);
        assert!(r.per_rule.is_empty());
    }

    #[test]
    fn test_unconstrained_section_matches() {
        let r = evaluate(
            &FieldBundle::default(),
            AuditClass::DDL,
            &[AuditRuleConfig::new()],
        )
        .unwrap();
        assert!(r.matched);
        assert_eq!(r.per_rule, vec![true]);
    }

    #[test]
    fn test_all_sections_evaluated() {
        let rules = vec![
            section(vec![
                AuditRule::new(Field::Class, false, RuleValues::Bitmask(AuditClass::DDL.bits()))
                    .unwrap(),
            ]),
            section(vec![
                AuditRule::new(Field::Database, false, strings(&["shop"])).unwrap(),
            ]),
            AuditRuleConfig::new(),
        ];
        let fields = FieldBundle::default().with_database("shop");
        let r = evaluate(&fields, AuditClass::READ, &rules).unwrap();
        assert!(r.matched);
        assert_eq!(r.per_rule, vec![false, true, true]);
        assert_eq!(r.first_match(), Some(1));
    }

    #[test]
    fn test_object_rules_ignored_outside_table_operations() {
        let rules = vec![section(vec![
            AuditRule::new(Field::ObjectName, false, strings(&["public.accounts"])).unwrap(),
        ])];
        let fields = FieldBundle::default().with_object(Some(ObjectType::Table), Some("public.t"));

        let r = evaluate(&fields, AuditClass::DDL, &rules).unwrap();
        assert_eq!(r.per_rule, vec![true]);

        let r = evaluate(&fields, AuditClass::READ, &rules).unwrap();
        assert_eq!(r.per_rule, vec![false]);

        let r = evaluate(&fields, AuditClass::MISC, &rules).unwrap();
        assert_eq!(r.per_rule, vec![false]);
    }

    #[test]
    fn test_kind_mismatch_fails_evaluation() {
        let bad = AuditRule {
            field: Field::Database,
            negate: false,
            values: Some(RuleValues::Integers(vec![1])),
        };
        let mut config = AuditRuleConfig::new();
        // Bypass load-time validation to reach the evaluation-time check.
        config.set_rule(bad).unwrap();
        let fields = FieldBundle::default().with_database("shop");
        let err = evaluate(&fields, AuditClass::READ, &[config]).unwrap_err();
        assert!(matches!(err, EvalError::KindMismatch { field: "database", .. }));
    }

    #[test]
    fn test_field_bundle_statement_vs_message() {
        let session = SessionContext {
            database: Some("shop".into()),
            ..SessionContext::default()
        };
        let stmt: EventDescriptor = StatementEvent::new(LogStmtLevel::All, CommandKind::Select).into();
        let fields = field_bundle(&stmt, &session);
        assert_eq!(fields.database, Some("shop"));
        assert_eq!(fields.user, Some(""));
        assert_eq!(fields.object_type, Some(0));
        assert_eq!(fields.object_name, Some(""));

        let msg: EventDescriptor = MessageEvent::new("connection received", "00000").into();
        let fields = field_bundle(&msg, &session);
        assert_eq!(fields.user, None);
        assert_eq!(fields.object_type, None);
        assert_eq!(fields.application_name, Some(""));
    }

    #[test]
    fn test_auditor_statement_once() {
        let config = parse_config_str(
            "[option]\nlog_statement_once = on\n[rule]\nclass = 'READ'\n[rule]\nuser = 'alice'\n",
        )
        .unwrap();
        let auditor = Auditor::new(Arc::new(config));
        let event: EventDescriptor = StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
            .with_text("SELECT 1")
            .with_label("SELECT")
            .into();
        let session = SessionContext {
            user: Some("alice".into()),
            ..SessionContext::default()
        };

        let record = auditor.audit(&event, &session).unwrap().unwrap();
        assert_eq!(
            record.lines,
            vec![
                "AUDIT: SESSION,0,0,READ,SELECT,,,SELECT 1,<not logged>",
                "AUDIT: SESSION,0,0,READ,SELECT,,,<previously logged>,<previously logged>",
            ]
        );
    }

    #[test]
    fn test_auditor_catalog_only() {
        let config = parse_config_str("[option]\nlog_catalog = off\n[rule]\n").unwrap();
        let auditor = Auditor::new(Arc::new(config));
        let mut stmt = StatementEvent::new(LogStmtLevel::All, CommandKind::Select);
        stmt.catalog_only = true;
        let event: EventDescriptor = stmt.into();
        assert!(auditor.audit(&event, &SessionContext::default()).unwrap().is_none());
    }

    #[test]
    fn test_auditor_object_audit() {
        let config = parse_config_str(
            "[option]\nrole = 'auditor'\n[rule]\nclass = 'DDL'\n[rule]\nclass = 'READ'\n",
        )
        .unwrap();
        let auditor = Auditor::new(Arc::new(config));
        let mut stmt = StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
            .with_text("SELECT * FROM public.t")
            .with_label("SELECT")
            .with_object(ObjectType::Table, "public.t");
        stmt.object_audited = true;
        let event: EventDescriptor = stmt.into();

        let record = auditor.audit(&event, &SessionContext::default()).unwrap().unwrap();
        assert!(record.object_audit);
        assert_eq!(record.per_rule, vec![false, true]);
        assert_eq!(
            record.lines,
            vec!["AUDIT: OBJECT,0,0,READ,SELECT,TABLE,public.t,SELECT * FROM public.t,<not logged>"]
        );
    }

    #[test]
    fn test_object_audit_needs_role() {
        let auditor = Auditor::new(Arc::new(parse_config_str("[rule]\nclass = 'READ'\n").unwrap()));
        let mut stmt = StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
            .with_text("SELECT 1")
            .with_label("SELECT");
        stmt.object_audited = true;
        let event: EventDescriptor = stmt.into();

        let record = auditor.audit(&event, &SessionContext::default()).unwrap().unwrap();
        assert!(!record.object_audit);
        assert_eq!(record.lines, vec!["AUDIT: SESSION,0,0,READ,SELECT,,,SELECT 1,<not logged>"]);
    }

    #[test]
    fn test_object_audit_ignores_rules() {
        let config = parse_config_str("[option]\nrole = 'auditor'\n[rule]\nclass = 'WRITE'\n").unwrap();
        let auditor = Auditor::new(Arc::new(config));
        let mut stmt = StatementEvent::new(LogStmtLevel::All, CommandKind::Select)
            .with_text("SELECT 1")
            .with_label("SELECT");
        stmt.object_audited = true;
        let event: EventDescriptor = stmt.into();

        let record = auditor.audit(&event, &SessionContext::default()).unwrap().unwrap();
        assert!(!record.matched);
        assert_eq!(record.lines.len(), 1);
        assert!(record.lines[0].starts_with("AUDIT: OBJECT,0,0,READ,"));
    }

    #[test]
    fn test_auditor_unclassified_message() {
        let auditor = Auditor::new(Arc::new(parse_config_str("[rule]\n").unwrap()));
        let event: EventDescriptor = MessageEvent::new("checkpoint complete", "00000").into();
        assert!(auditor.audit(&event, &SessionContext::default()).unwrap().is_none());
    }
}
