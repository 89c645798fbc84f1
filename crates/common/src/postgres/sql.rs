/// Placeholder that deployment-specific table prefixes replace in SQL text.
///
/// Every statement that names an entity table writes `#__table` and renders
/// the real name through [`with_table_prefix`] at construction time, so one
/// database can host several deployments side by side.
pub const TABLE_PREFIX_PLACEHOLDER: &str = "#__";

/// Substitute the table-name prefix placeholder in a SQL statement
pub fn with_table_prefix(sql: &str, prefix: &str) -> String {
    sql.replace(TABLE_PREFIX_PLACEHOLDER, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_every_occurrence() {
        let sql = "UPDATE #__applications SET agency = 1 WHERE agency IS NULL AND id IN (SELECT id FROM #__applications)";
        let rendered = with_table_prefix(sql, "quoria_");
        assert_eq!(
            rendered,
            "UPDATE quoria_applications SET agency = 1 WHERE agency IS NULL AND id IN (SELECT id FROM quoria_applications)"
        );
    }

    #[test]
    fn test_empty_prefix_strips_placeholder() {
        assert_eq!(
            with_table_prefix("SELECT * FROM #__policies", ""),
            "SELECT * FROM policies"
        );
    }

    #[test]
    fn test_statement_without_placeholder_is_unchanged() {
        assert_eq!(with_table_prefix("SELECT 1", "quoria_"), "SELECT 1");
    }
}
