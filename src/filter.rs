use crate::schema::{get_table, TableSchema, ALL_TABLES};
use anyhow::{bail, Result};
use log::info;

/// Resolves which tables to load based on include/exclude filters.
/// The result always keeps the registry's load order.
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            validate(&include_list)?;
            let tables: Vec<_> = ALL_TABLES
                .iter()
                .copied()
                .filter(|t| include_list.iter().any(|n| n == t.name))
                .collect();

            info!("Including {} tables: {:?}", tables.len(), names(&tables));
            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            validate(&exclude_list)?;
            let tables: Vec<_> = ALL_TABLES
                .iter()
                .copied()
                .filter(|t| !exclude_list.iter().any(|n| n == t.name))
                .collect();

            info!(
                "Excluding {:?}, {} tables remain",
                exclude_list,
                tables.len()
            );
            Ok(tables)
        }
        (None, None) => Ok(ALL_TABLES.to_vec()),
    }
}

fn validate(requested: &[String]) -> Result<()> {
    for name in requested {
        if get_table(name).is_none() {
            bail!("Unknown table: {}", name);
        }
    }
    Ok(())
}

fn names(tables: &[&TableSchema]) -> Vec<&'static str> {
    tables.iter().map(|t| t.name).collect()
}
