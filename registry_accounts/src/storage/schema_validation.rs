use sqlx::{Pool, Postgres, Row, Sqlite};

/// Validates that a PostgreSQL table schema matches what we expect
pub(crate) async fn validate_postgres_table_schema<E>(
    pool: &Pool<Postgres>,
    table_name: &str,
    expected_columns: &[(&str, &str)],
    error_mapper: impl Fn(String) -> E,
) -> Result<(), E> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await
    .map_err(|e| error_mapper(e.to_string()))?;

    if !table_exists {
        return Err(error_mapper(format!(
            "Schema validation failed: Table '{table_name}' does not exist"
        )));
    }

    let rows = sqlx::query(
        "SELECT column_name, data_type FROM information_schema.columns
         WHERE table_name = $1 ORDER BY column_name",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| error_mapper(e.to_string()))?;

    let actual_columns: Vec<(String, String)> = rows
        .iter()
        .map(|row| {
            let name: String = row.get("column_name");
            let type_: String = row.get("data_type");
            (name, type_)
        })
        .collect();

    compare_columns(table_name, expected_columns, &actual_columns).map_err(error_mapper)
}

/// Validates that a SQLite table schema matches what we expect
///
/// SQLite reports the declared column type, so the expected types are the
/// ones used in `CREATE TABLE`.
pub(crate) async fn validate_sqlite_table_schema<E>(
    pool: &Pool<Sqlite>,
    table_name: &str,
    expected_columns: &[(&str, &str)],
    error_mapper: impl Fn(String) -> E,
) -> Result<(), E> {
    let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?)")
        .bind(table_name)
        .fetch_all(pool)
        .await
        .map_err(|e| error_mapper(e.to_string()))?;

    if rows.is_empty() {
        return Err(error_mapper(format!(
            "Schema validation failed: Table '{table_name}' does not exist"
        )));
    }

    let actual_columns: Vec<(String, String)> = rows
        .iter()
        .map(|row| {
            let name: String = row.get("name");
            let type_: String = row.get("type");
            (name, type_.to_uppercase())
        })
        .collect();

    compare_columns(table_name, expected_columns, &actual_columns).map_err(error_mapper)
}

fn compare_columns(
    table_name: &str,
    expected_columns: &[(&str, &str)],
    actual_columns: &[(String, String)],
) -> Result<(), String> {
    for (expected_name, expected_type) in expected_columns {
        let found = actual_columns
            .iter()
            .find(|(name, _)| name == expected_name);

        match found {
            Some((_, actual_type)) if actual_type == expected_type => {}
            Some((_, actual_type)) => {
                return Err(format!(
                    "Schema validation failed: Column '{expected_name}' has type '{actual_type}' but expected '{expected_type}'"
                ));
            }
            None => {
                return Err(format!(
                    "Schema validation failed: Missing column '{expected_name}'"
                ));
            }
        }
    }

    for (actual_name, _) in actual_columns {
        if !expected_columns
            .iter()
            .any(|(name, _)| *name == actual_name)
        {
            tracing::warn!("Extra column '{}' found in table '{}'", actual_name, table_name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_compare_columns_matching() {
        let expected = [("id", "INTEGER"), ("name", "TEXT")];
        let actual = columns(&[("id", "INTEGER"), ("name", "TEXT")]);

        assert!(compare_columns("accounts", &expected, &actual).is_ok());
    }

    #[test]
    fn test_compare_columns_extra_column_is_allowed() {
        let expected = [("id", "INTEGER")];
        let actual = columns(&[("id", "INTEGER"), ("legacy", "TEXT")]);

        assert!(compare_columns("accounts", &expected, &actual).is_ok());
    }

    #[test]
    fn test_compare_columns_wrong_type() {
        let expected = [("id", "INTEGER")];
        let actual = columns(&[("id", "TEXT")]);

        let err = compare_columns("accounts", &expected, &actual).unwrap_err();
        assert!(err.contains("Column 'id' has type 'TEXT' but expected 'INTEGER'"));
    }

    #[test]
    fn test_compare_columns_missing_column() {
        let expected = [("id", "INTEGER"), ("revision", "TEXT")];
        let actual = columns(&[("id", "INTEGER")]);

        let err = compare_columns("accounts", &expected, &actual).unwrap_err();
        assert!(err.contains("Missing column 'revision'"));
    }
}
