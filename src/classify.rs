//! Per-field role heuristics for headerless 4-column rows.
//!
//! Classification runs one fixed precedence per field (email, handle, name,
//! phone — first match wins) and falls back to positional templates when the
//! four roles do not come out uniquely filled. The precedence is load-bearing:
//! heuristics overlap by construction (a bare Latin word is a valid handle
//! shape), and reordering them changes which role wins.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::detect::Role;
use crate::normalize::Record;

fn handle_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._]{4,32}$").expect("handle shape regex"))
}

fn consecutive_letters() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-zА-Яа-яЁё]{2}").expect("letter pair regex"))
}

/// Infers the role of a single cleaned field, or `None` when no heuristic
/// fires (e.g. an empty field or punctuation-only noise).
pub fn classify_field(field: &str) -> Option<Role> {
    if field.starts_with('@') {
        return Some(Role::Handle);
    }
    if field.contains('@') {
        return Some(Role::Email);
    }
    if field.contains("t.me/") || handle_shape().is_match(field) {
        return Some(Role::Handle);
    }
    let has_digit = field.chars().any(|c| c.is_ascii_digit());
    if consecutive_letters().is_match(field) && !field.contains('+') && !has_digit {
        return Some(Role::Name);
    }
    if has_digit {
        return Some(Role::Phone);
    }
    None
}

/// Positional templates applied when per-field classification is incomplete.
/// Index i of the template is the role assigned to field i of the row.
fn fallback_template(line: &str, first_field: &str) -> [Role; 4] {
    let lowered = line.to_lowercase();
    if lowered.contains("tel")
        || lowered.contains("phone")
        || first_field.chars().any(|c| c.is_ascii_digit())
    {
        [Role::Phone, Role::Email, Role::Handle, Role::Name]
    } else if lowered.contains("tg") || first_field.starts_with('@') {
        [Role::Handle, Role::Email, Role::Name, Role::Phone]
    } else {
        [Role::Phone, Role::Name, Role::Handle, Role::Email]
    }
}

/// Assigns the four canonical roles to a cleaned 4-field row.
///
/// `line` is the raw line the fields came from; it only feeds the weak
/// whole-line signals of the fallback templates.
pub fn classify_row(line: &str, fields: [String; 4]) -> Record {
    let mut slots: [Option<usize>; 4] = [None; 4];
    let mut unique = true;
    for (idx, field) in fields.iter().enumerate() {
        let slot = match classify_field(field) {
            Some(Role::Email) => 3,
            Some(Role::Handle) => 2,
            Some(Role::Name) => 1,
            Some(Role::Phone) => 0,
            _ => {
                unique = false;
                continue;
            }
        };
        if slots[slot].is_some() {
            unique = false;
        } else {
            slots[slot] = Some(idx);
        }
    }

    if unique && slots.iter().all(|s| s.is_some()) {
        let value = |slot: usize| fields[slots[slot].expect("filled slot")].clone();
        return Record {
            phone: value(0),
            name: value(1),
            handle: value(2),
            email: value(3),
        };
    }

    debug!("ambiguous row, using positional fallback: {line}");
    let template = fallback_template(line, &fields[0]);
    let mut record = Record::default();
    for (field, role) in fields.into_iter().zip(template.iter()) {
        match role {
            Role::Phone => record.phone = field,
            Role::Name => record.name = field,
            Role::Handle => record.handle = field,
            Role::Email => record.email = field,
            Role::Custom(_) => {}
        }
    }
    record
}
