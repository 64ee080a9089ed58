//! # storage-adapters
//!
//! Implementations of the `domains` repository ports.
//!
//! * `db-postgres`: [`postgres::PgStore`] over an `sqlx` connection pool.
//! * `db-memory`: [`memory::MemoryStore`], the same semantics held in process.

#[cfg(feature = "db-memory")]
pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

/// Escapes `%`, `_` and `\` so a search term matches literally inside a
/// `LIKE` pattern, then wraps it for a substring match.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(like_pattern("rust"), "%rust%");
    }
}
