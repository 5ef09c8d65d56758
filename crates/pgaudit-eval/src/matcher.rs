//! Single-field rule predicates.
//!
//! Each predicate compares one typed event attribute against a rule's
//! operand set and then applies the rule's `negate` flag. Predicates are
//! pure and allocation-free.

use chrono::NaiveTime;
use pgaudit_config::{AuditRule, RuleValues, TimeRange};

use crate::error::{EvalError, Result};
use crate::event::FieldValue;

/// Apply one rule to one event attribute.
///
/// An absent value or an unconstrained rule passes before any kind check.
/// A value whose kind differs from the rule's is an error.
pub fn apply_one_rule(value: Option<FieldValue<'_>>, rule: &AuditRule) -> Result<bool> {
    let Some(value) = value else {
        return Ok(true);
    };
    let Some(values) = &rule.values else {
        return Ok(true);
    };

    let hit = match (values, value) {
        (RuleValues::Strings(list), FieldValue::Text(s)) => string_in(s, list),
        (RuleValues::Bitmask(mask), FieldValue::Bits(bits)) => bits_overlap(bits, *mask),
        (RuleValues::TimeRanges(ranges), FieldValue::Time(t)) => time_in(t, ranges),
        (RuleValues::Integers(list), FieldValue::Int(n)) => list.contains(&n),
        (values, value) => {
            return Err(EvalError::KindMismatch {
                field: rule.field.name(),
                expected: values.kind().as_str(),
                actual: value.kind().as_str(),
            });
        }
    };

    Ok(hit != rule.negate)
}

/// Case-insensitive membership.
pub fn string_in(value: &str, list: &[String]) -> bool {
    list.iter().any(|s| s.eq_ignore_ascii_case(value))
}

pub fn bits_overlap(value: u32, mask: u32) -> bool {
    value & mask != 0
}

/// Whether `t` falls within any closed range.
pub fn time_in(t: NaiveTime, ranges: &[TimeRange]) -> bool {
    ranges.iter().any(|r| r.contains(t))
}
