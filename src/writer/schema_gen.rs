use crate::schema::{IndexDef, TableSchema};

/// Generate CREATE TABLE SQL for a table schema.
///
/// Reference columns are plain integers: no FOREIGN KEY clause is emitted,
/// the references are recorded as comments in the stored schema.
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = if col.name == schema.primary_key() {
            " PRIMARY KEY"
        } else {
            ""
        };
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };

        columns.push(format!(
            "    {} {}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint
        ));
    }

    sql.push_str(&columns.join(",\n"));
    for r in schema.references {
        sql.push_str(&format!(
            "\n    -- {} -> {}({})",
            r.column, r.references_table, r.references_column
        ));
    }
    sql.push_str("\n)");

    sql
}

pub fn generate_drop_table(schema: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {}", schema.name)
}

/// Generate the parameterised INSERT used for bulk loading
pub fn generate_insert(schema: &TableSchema) -> String {
    let placeholders: Vec<&str> = schema.columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        schema.column_names().join(", "),
        placeholders.join(", ")
    )
}

pub fn generate_create_index(index: &IndexDef) -> String {
    format!(
        "CREATE INDEX {} ON {}({})",
        index.name,
        index.table,
        index.columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ALL_INDEXES, CAST_INFO, KEYWORD};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&CAST_INFO);
        assert!(sql.contains("CREATE TABLE cast_info"));
        assert!(sql.contains("id INTEGER PRIMARY KEY NOT NULL"));
        assert!(sql.contains("person_role_id INTEGER,"));
        assert!(sql.contains("role_id INTEGER NOT NULL"));
        assert!(!sql.contains("FOREIGN KEY"));
        assert!(sql.contains("-- person_role_id -> char_name(id)"));
    }

    #[test]
    fn test_varchar_columns() {
        let sql = generate_create_table(&KEYWORD);
        assert!(sql.contains("keyword TEXT NOT NULL"));
        assert!(sql.contains("phonetic_code VARCHAR(5)"));
    }

    #[test]
    fn test_generate_insert() {
        assert_eq!(
            generate_insert(&KEYWORD),
            "INSERT INTO keyword (id, keyword, phonetic_code) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_generate_create_index() {
        let idx = ALL_INDEXES
            .iter()
            .find(|i| i.name == "movie_id_cast_info")
            .unwrap();
        assert_eq!(
            generate_create_index(idx),
            "CREATE INDEX movie_id_cast_info ON cast_info(movie_id)"
        );
    }
}
