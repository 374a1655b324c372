//! Statement text utilities shared by both backends.

use std::fmt;

/// Rough classification of a statement, carried in query errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Other,
}

impl StatementKind {
    pub fn of(sql: &str) -> Self {
        let head = sql
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match head.as_str() {
            "SELECT" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            "CREATE" | "DROP" | "ALTER" => StatementKind::Ddl,
            _ => StatementKind::Other,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Ddl => "ddl",
            StatementKind::Other => "statement",
        })
    }
}

/// Rewrite universal `?` placeholders into Postgres `$1..$n` markers.
/// A `?` inside a single-quoted literal is left untouched; doubled quotes
/// inside literals toggle the state twice and come out right.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0usize;
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_left_to_right() {
        assert_eq!(
            rewrite_placeholders("INSERT INTO bugs (title, status) VALUES (?, ?)"),
            "INSERT INTO bugs (title, status) VALUES ($1, $2)"
        );
    }

    #[test]
    fn statement_without_placeholders_is_unchanged() {
        let sql = "SELECT COUNT(*) AS count FROM users";
        assert_eq!(rewrite_placeholders(sql), sql);
    }

    #[test]
    fn question_mark_inside_literal_is_preserved() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM bugs WHERE title = 'what?' AND id = ?"),
            "SELECT * FROM bugs WHERE title = 'what?' AND id = $1"
        );
    }

    #[test]
    fn statement_kinds_classify_by_leading_keyword() {
        assert_eq!(StatementKind::of("select 1"), StatementKind::Select);
        assert_eq!(
            StatementKind::of("  INSERT INTO bugs VALUES (?)"),
            StatementKind::Insert
        );
        assert_eq!(StatementKind::of("DELETE FROM bugs"), StatementKind::Delete);
        assert_eq!(
            StatementKind::of("CREATE TABLE IF NOT EXISTS t (id INT)"),
            StatementKind::Ddl
        );
        assert_eq!(StatementKind::of("PRAGMA foo"), StatementKind::Other);
    }
}
