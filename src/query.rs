//! Query-type detection: routes a raw search term to its most likely field.

/// Classification of a user query. `All` means unrestricted whole-row
/// matching, used both for empty/ambiguous queries and for files where the
/// targeted column is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Phone,
    Email,
    Handle,
    Name,
    All,
}

impl QueryKind {
    pub fn label(self) -> &'static str {
        match self {
            QueryKind::Phone => "phone",
            QueryKind::Email => "email",
            QueryKind::Handle => "handle",
            QueryKind::Name => "name",
            QueryKind::All => "all fields",
        }
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ('А'..='я').contains(&c) || c == 'ё' || c == 'Ё'
}

/// Pure, total and deterministic. A leading `@` is checked before the
/// contains-`@` email rule so handle queries like `@john` are not swallowed
/// by it.
pub fn classify(query: &str) -> QueryKind {
    let query = query.trim();
    if query.is_empty() {
        return QueryKind::All;
    }
    if query.chars().all(|c| c.is_ascii_digit()) {
        return QueryKind::Phone;
    }
    if query.starts_with('@') {
        return QueryKind::Handle;
    }
    if query.contains('@') {
        return QueryKind::Email;
    }
    let lowered = query.to_lowercase();
    if let Some(rest) = lowered.strip_prefix("id") {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return QueryKind::Handle;
        }
    }
    if query.chars().all(is_letter) {
        return QueryKind::Name;
    }
    QueryKind::All
}
