//! Random request values.
//!
//! [`valid_value`] picks a value by field shape that passes every rule of
//! the field. [`corrupt_value`] breaks exactly one applicable rule.

use chrono::{Days, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use erpgen_ir::{ConstraintSet, DataType, FieldSpec, RuleKind};
use erpgen_validate::{check_field, DATETIME_FORMAT, DATE_FORMAT};

/// Upper length of free text when the field declares none.
pub const DEFAULT_TEXT_LENGTH: usize = 10;

/// Shortest well-formed address.
pub const SHORTEST_EMAIL: &str = "a@b.cd";

/// Upper length of an address when the field declares none.
const DEFAULT_EMAIL_LENGTH: usize = 24;

/// Widest digit count whose powers of ten are exact in `f64`.
const MAX_DIGITS: u32 = 15;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Random `[A-Za-z0-9]` string.
pub fn alphanumeric<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Random `[a-z]` string.
pub fn lowercase<R: Rng>(rng: &mut R, len: usize) -> String {
    pick_from(rng, LOWERCASE, len)
}

fn pick_from<R: Rng>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

/// Inclusive length bounds of a text value.
fn length_bounds(c: &ConstraintSet) -> (usize, usize) {
    let lo = c.min_length.map_or(1, |n| n as usize).max(1);
    let hi = c
        .max_length
        .map_or(DEFAULT_TEXT_LENGTH.max(lo), |n| n as usize);
    (lo.min(hi), hi)
}

/// Intersection of `min`/`max` and `range`.
fn numeric_window(c: &ConstraintSet) -> (Option<f64>, Option<f64>) {
    let lo = [c.min, c.range.map(|r| r.0)]
        .into_iter()
        .flatten()
        .reduce(f64::max);
    let hi = [c.max, c.range.map(|r| r.1)]
        .into_iter()
        .flatten()
        .reduce(f64::min);
    (lo, hi)
}

/// Inclusive length bounds of an e-mail address. Empty when `lo > hi`.
fn email_bounds(c: &ConstraintSet) -> (usize, usize) {
    let lo = c
        .min_length
        .map_or(0, |n| n as usize)
        .max(SHORTEST_EMAIL.len());
    let hi = c
        .max_length
        .map_or(DEFAULT_EMAIL_LENGTH.max(lo), |n| n as usize);
    (lo, hi)
}

/// Whether `c` bounds the text length of a number.
fn bounds_number_length(c: &ConstraintSet) -> bool {
    c.min_length.is_some_and(|n| n > 1) || c.max_length.is_some()
}

/// Inclusive value window of a number field. Length bounds keep the value a
/// non-negative integer whose digit count fits them. Empty when `lo > hi`.
fn number_bounds(c: &ConstraintSet) -> (f64, f64) {
    let (mut lo, mut hi) = numeric_window(c);
    let unsigned = c.digits || bounds_number_length(c);
    if unsigned {
        lo = Some(lo.map_or(0.0, |v| v.max(0.0)));
    }
    if let Some(n) = c.min_length.filter(|n| *n > 1) {
        let floor = 10f64.powi(n.min(MAX_DIGITS) as i32 - 1);
        lo = Some(lo.map_or(floor, |v| v.max(floor)));
    }
    if let Some(n) = c.max_length {
        let ceil = if n == 0 {
            -1.0
        } else {
            10f64.powi(n.min(MAX_DIGITS) as i32) - 1.0
        };
        hi = Some(hi.map_or(ceil, |v| v.min(ceil)));
    }
    match (lo, hi) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo + 1000.0),
        (None, Some(hi)) if unsigned => (0.0, hi),
        (None, Some(hi)) => (hi - 1000.0, hi),
        (None, None) => (0.0, 1000.0),
    }
}

/// Why no value can pass every rule of `c`, or `None` when one exists.
pub fn unsatisfiable(c: &ConstraintSet) -> Option<String> {
    if c.reference.is_some() {
        return None;
    }
    if let Some(expected) = &c.equal_to {
        let broken: Vec<String> = check_field(c, &Value::String(expected.clone()), None)
            .iter()
            .map(|v| v.rule.to_string())
            .collect();
        return (!broken.is_empty())
            .then(|| format!("required value `{expected}` breaks {}", broken.join(", ")));
    }
    if c.is_boolean || c.is_date {
        return None;
    }
    if c.is_email {
        let (lo, hi) = email_bounds(c);
        return (lo > hi).then(|| format!("no e-mail address is {lo} to {hi} characters long"));
    }
    if c.is_number {
        let (lo, hi) = number_bounds(c);
        return (lo > hi).then(|| format!("no number lies in [{lo}, {hi}] within its length bounds"));
    }
    match (c.min_length, c.max_length) {
        (Some(lo), Some(hi)) if lo > hi => {
            Some(format!("min_length {lo} exceeds max_length {hi}"))
        }
        _ => None,
    }
}

/// A value accepted by every rule of `field`. Only meaningful when
/// [`unsatisfiable`] finds nothing.
pub fn valid_value<R: Rng>(rng: &mut R, field: &FieldSpec, c: &ConstraintSet) -> Value {
    if let Some(target) = &c.reference {
        return Value::String(format!("{{valid_{}_id}}", target.model));
    }
    if let Some(expected) = &c.equal_to {
        return Value::String(expected.clone());
    }
    if c.is_boolean {
        return Value::Bool(rng.gen());
    }
    if c.is_date {
        return Value::String(date(rng, c.is_datetime));
    }
    if c.is_email {
        return Value::String(email(rng, c));
    }
    if c.is_number {
        return number(rng, field.data_type, c);
    }
    let (lo, hi) = length_bounds(c);
    let len = rng.gen_range(lo..=hi);
    if c.digits {
        return Value::String(pick_from(rng, DIGITS, len));
    }
    if field.data_type.is_upload() {
        return Value::String(file_name(rng, c));
    }
    Value::String(alphanumeric(rng, len))
}

fn date<R: Rng>(rng: &mut R, with_time: bool) -> String {
    let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
    let day = base
        .checked_add_days(Days::new(rng.gen_range(0..10_000)))
        .unwrap_or(base);
    if !with_time {
        return day.format(DATE_FORMAT).to_string();
    }
    match day.and_hms_opt(rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60)) {
        Some(at) => at.format(DATETIME_FORMAT).to_string(),
        None => day.format(DATE_FORMAT).to_string(),
    }
}

fn email<R: Rng>(rng: &mut R, c: &ConstraintSet) -> String {
    let (lo, hi) = email_bounds(c);
    if hi < lo {
        return SHORTEST_EMAIL.to_string();
    }
    let len = rng.gen_range(lo..=hi);
    let tld = rng.gen_range(2..=4).min(len - 4);
    let rest = len - 2 - tld;
    let local = rng.gen_range(1..rest);
    format!(
        "{}@{}.{}",
        lowercase(rng, local),
        lowercase(rng, rest - local),
        lowercase(rng, tld)
    )
}

fn number<R: Rng>(rng: &mut R, data_type: DataType, c: &ConstraintSet) -> Value {
    let (lo, hi) = number_bounds(c);
    if lo > hi {
        return Value::from(lo);
    }
    let integral = data_type.is_integer() || c.digits || bounds_number_length(c);

    if let Some(step) = c.step.filter(|s| *s > 0.0) {
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        if first > last {
            return Value::from(lo);
        }
        // A fractional step can overrun the length bounds; integral multiples fit.
        let mut value = rng.gen_range(first..=last) as f64 * step;
        for _ in 0..16 {
            if fits_length(value, c) {
                break;
            }
            value = rng.gen_range(first..=last) as f64 * step;
        }
        return if value.fract() == 0.0 {
            Value::from(value as i64)
        } else {
            Value::from(value)
        };
    }

    if integral {
        let (first, last) = (lo.ceil() as i64, hi.floor() as i64);
        if first <= last {
            return Value::from(rng.gen_range(first..=last));
        }
        return Value::from(lo);
    }
    let value = ((rng.gen_range(lo..=hi) * 100.0).round() / 100.0).clamp(lo, hi);
    Value::from(value)
}

fn fits_length(value: f64, c: &ConstraintSet) -> bool {
    let text = if value.fract() == 0.0 {
        Value::from(value as i64).to_string()
    } else {
        Value::from(value).to_string()
    };
    let len = text.chars().count() as u32;
    c.min_length.map_or(true, |n| len >= n) && c.max_length.map_or(true, |n| len <= n)
}

fn file_name<R: Rng>(rng: &mut R, c: &ConstraintSet) -> String {
    let ext = c
        .file_type
        .as_deref()
        .and_then(|types| {
            types
                .trim_matches(|ch| matches!(ch, '[' | ']'))
                .split(',')
                .map(|t| t.trim().trim_matches(|ch| matches!(ch, '\'' | '"' | '.')))
                .find(|t| !t.is_empty())
        })
        .unwrap_or("pdf");
    format!("{}.{}", lowercase(rng, 8), ext.to_ascii_lowercase())
}

/// Rules of `c` a synthesized value can break, in rule order.
pub fn breakable_rules(c: &ConstraintSet) -> Vec<RuleKind> {
    let is_reference = c.reference.is_some();
    let mut rules = Vec::new();
    if c.required {
        rules.push(RuleKind::Required);
    }
    if c.min_length.is_some_and(|n| n > 0) {
        rules.push(RuleKind::MinLength);
    }
    if c.max_length.is_some() {
        rules.push(RuleKind::MaxLength);
    }
    if c.min.is_some() {
        rules.push(RuleKind::Min);
    }
    if c.max.is_some() {
        rules.push(RuleKind::Max);
    }
    if c.range.is_some() {
        rules.push(RuleKind::Range);
    }
    if c.step.is_some_and(|s| s != 0.0) {
        rules.push(RuleKind::Step);
    }
    if c.is_email {
        rules.push(RuleKind::Email);
    }
    if c.is_date {
        rules.push(if c.is_datetime { RuleKind::DateTime } else { RuleKind::Date });
    }
    if c.is_number && !is_reference {
        rules.push(RuleKind::Number);
    }
    if c.digits && !is_reference {
        rules.push(RuleKind::Digits);
    }
    if c.equal_to.is_some() {
        rules.push(RuleKind::EqualTo);
    }
    if is_reference {
        rules.push(RuleKind::ForeignKey);
    }
    if c.is_boolean {
        rules.push(RuleKind::Boolean);
    }
    rules
}

/// A value breaking one randomly chosen rule, or `None` when nothing can be
/// broken.
pub fn corrupt_value<R: Rng>(rng: &mut R, c: &ConstraintSet) -> Option<Value> {
    let rule = *breakable_rules(c).choose(rng)?;
    breaking_value(rng, c, rule)
}

/// A value that violates `rule` of `c`.
pub fn breaking_value<R: Rng>(rng: &mut R, c: &ConstraintSet, rule: RuleKind) -> Option<Value> {
    let value = match rule {
        RuleKind::Required => Value::Null,
        RuleKind::MinLength => {
            let n = c.min_length? as usize;
            Value::String(alphanumeric(rng, n.saturating_sub(1)))
        }
        RuleKind::MaxLength => {
            let n = c.max_length? as usize;
            let len = rng.gen_range(n + 1..=n + 100);
            Value::String(alphanumeric(rng, len))
        }
        RuleKind::Min => Value::from(c.min? - 1.0),
        RuleKind::Max => Value::from(c.max? + 1.0),
        RuleKind::Range => Value::from(c.range?.1 + 1.0),
        RuleKind::Step => {
            let step = c.step.filter(|s| *s != 0.0)?;
            Value::from(step * rng.gen_range(1..10) as f64 + step / 2.0)
        }
        RuleKind::Email | RuleKind::Date | RuleKind::DateTime => {
            Value::String(alphanumeric(rng, 10))
        }
        RuleKind::Number => {
            let len = rng.gen_range(3..=8);
            Value::String(lowercase(rng, len))
        }
        RuleKind::Digits => Value::String("12a".to_string()),
        RuleKind::EqualTo => Value::String(format!("{}_x", c.equal_to.as_deref()?)),
        RuleKind::ForeignKey => {
            Value::String(format!("{{invalid_{}_id}}", c.reference.as_ref()?.model))
        }
        RuleKind::Boolean => Value::String("not_a_boolean".to_string()),
        _ => return None,
    };
    Some(value)
}
