/// Semantic meaning of a column or field. Columns whose header matches none
/// of the known keywords keep their literal header text as a pass-through
/// role: they are preserved in output but never targeted by typed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Phone,
    Name,
    Handle,
    Email,
    Custom(String),
}

impl Role {
    pub fn tag(&self) -> &str {
        match self {
            Role::Phone => "phone",
            Role::Name => "name",
            Role::Handle => "handle",
            Role::Email => "email",
            Role::Custom(name) => name.as_str(),
        }
    }

    pub fn from_tag(tag: &str) -> Role {
        match tag {
            "phone" => Role::Phone,
            "name" => Role::Name,
            "handle" => Role::Handle,
            "email" => Role::Email,
            other => Role::Custom(other.to_string()),
        }
    }
}

/// The canonical column order used for headerless normalized storage.
pub fn canonical_roles() -> Vec<Role> {
    vec![Role::Phone, Role::Name, Role::Handle, Role::Email]
}

/// Picks the field delimiter for a line. The source format guarantees one
/// of two delimiters per file, so this is a binary choice with no sniffing.
pub fn detect_delimiter(line: &str) -> char {
    if line.contains(';') { ';' } else { '|' }
}

/// Maps a header cell to a role by case-insensitive substring match.
/// "telegram" is checked before "tel" so it lands on Handle, not Phone.
pub fn infer_role(header: &str) -> Role {
    let lowered = header.trim().to_lowercase();
    if lowered.contains("telegram") || lowered.contains("tg") {
        Role::Handle
    } else if lowered.contains("tel") || lowered.contains("phone") {
        Role::Phone
    } else if lowered.contains("name") || lowered.contains("фио") {
        Role::Name
    } else if lowered.contains("mail") {
        Role::Email
    } else {
        Role::Custom(header.trim().to_string())
    }
}

/// Decides whether the first line of a file is a textual header rather than
/// a data row. Data rows in this corpus virtually always carry a digit or an
/// `@`; a header additionally has to name at least one recognized role.
pub fn looks_like_header(fields: &[String]) -> bool {
    if fields.is_empty() {
        return false;
    }
    let purely_textual = fields
        .iter()
        .all(|f| !f.contains('@') && !f.chars().any(|c| c.is_ascii_digit()));
    if !purely_textual {
        return false;
    }
    fields
        .iter()
        .any(|f| !matches!(infer_role(f), Role::Custom(_)))
}

/// Per-file column layout built once per scan and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FileSchema {
    pub delimiter: char,
    pub roles: Vec<Role>,
    pub has_header: bool,
}

impl FileSchema {
    /// Layout for a header-bearing file: one role per header cell.
    pub fn from_header(delimiter: char, headers: &[String]) -> Self {
        let roles = headers.iter().map(|h| infer_role(h)).collect();
        FileSchema {
            delimiter,
            roles,
            has_header: true,
        }
    }

    /// Layout assumed for headerless normalized files.
    pub fn canonical(delimiter: char) -> Self {
        FileSchema {
            delimiter,
            roles: canonical_roles(),
            has_header: false,
        }
    }

    pub fn role_index(&self, role: &Role) -> Option<usize> {
        self.roles.iter().position(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_wins_when_present() {
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a|b;c"), ';');
    }

    #[test]
    fn pipe_is_the_fallback() {
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("plain text"), '|');
    }

    #[test]
    fn header_keywords_map_to_roles() {
        assert_eq!(infer_role("Telephone"), Role::Phone);
        assert_eq!(infer_role("phone_number"), Role::Phone);
        assert_eq!(infer_role("Full Name"), Role::Name);
        assert_eq!(infer_role("ФИО"), Role::Name);
        assert_eq!(infer_role("E-Mail"), Role::Email);
        assert_eq!(infer_role("tg_id"), Role::Handle);
        assert_eq!(infer_role("telegram"), Role::Handle);
    }

    #[test]
    fn unknown_headers_become_custom_pass_through() {
        assert_eq!(
            infer_role(" city "),
            Role::Custom("city".to_string())
        );
    }

    #[test]
    fn header_detection_rejects_data_rows() {
        let header: Vec<String> = ["tel", "name", "tg_id", "email"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(looks_like_header(&header));

        let data: Vec<String> = ["79210000000", "Ivan", "@ivan", "a@b.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(!looks_like_header(&data));

        // All-textual but nothing resembling a known role.
        let words: Vec<String> = ["alpha", "beta", "gamma", "delta"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(!looks_like_header(&words));
    }

    #[test]
    fn schema_exposes_role_positions() {
        let headers: Vec<String> = ["name", "tel", "note", "mail"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = FileSchema::from_header(';', &headers);
        assert_eq!(schema.role_index(&Role::Phone), Some(1));
        assert_eq!(schema.role_index(&Role::Email), Some(3));
        assert_eq!(schema.role_index(&Role::Handle), None);
        assert_eq!(schema.roles[2], Role::Custom("note".to_string()));
    }
}
