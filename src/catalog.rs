use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub data_source_ids: Vec<String>,
    #[serde(default)]
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub department: String,
    pub owner: String,
    #[serde(default)]
    pub record_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub schema_name: String,
    pub data_source_id: String,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub sensitive: bool,
}

impl Table {
    /// Effective sensitivity for filtering and warning purposes: a table
    /// is sensitive when explicitly marked or when any owned column is.
    pub fn is_sensitive_aggregate(&self) -> bool {
        self.sensitive || self.columns.iter().any(|c| c.sensitive)
    }

    /// Display path of a column in this table, e.g. `public.customers.card_number`.
    pub fn column_path(&self, column: &Column) -> String {
        format!("{}.{}.{}", self.schema_name, self.name, column.name)
    }
}

/// In-memory catalog of everything discoverable. Loaded once at startup
/// and read-only for the lifetime of a query session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub applications: Vec<Application>,
    pub data_sources: Vec<DataSource>,
    pub tables: Vec<Table>,

    // Indexes for fast lookup
    applications_by_id: HashMap<String, usize>,
    data_sources_by_id: HashMap<String, usize>,
    tables_by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(
        applications: Vec<Application>,
        data_sources: Vec<DataSource>,
        tables: Vec<Table>,
    ) -> Self {
        let applications_by_id = applications
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        let data_sources_by_id = data_sources
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        let tables_by_id = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        Self {
            applications,
            data_sources,
            tables,
            applications_by_id,
            data_sources_by_id,
            tables_by_id,
        }
    }

    pub fn application(&self, id: &str) -> Option<&Application> {
        self.applications_by_id.get(id).map(|&i| &self.applications[i])
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.data_sources_by_id.get(id).map(|&i| &self.data_sources[i])
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables_by_id.get(id).map(|&i| &self.tables[i])
    }

    pub fn table_is_sensitive(&self, id: &str) -> bool {
        self.table(id).map(Table::is_sensitive_aggregate).unwrap_or(false)
    }

    /// Distinct application categories, in first-encountered order.
    pub fn categories(&self) -> Vec<String> {
        self.applications
            .iter()
            .map(|a| a.category.clone())
            .unique()
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Total number of discoverable entities across all four kinds.
    pub fn total_entities(&self) -> usize {
        self.applications.len() + self.data_sources.len() + self.tables.len() + self.column_count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entities() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_columns(sensitive: bool, column_sensitive: bool) -> Table {
        Table {
            id: "t1".to_string(),
            name: "customers".to_string(),
            description: "Customer master".to_string(),
            tags: vec![],
            schema_name: "public".to_string(),
            data_source_id: "ds1".to_string(),
            sensitive,
            columns: vec![Column {
                id: "c1".to_string(),
                name: "card_number".to_string(),
                description: String::new(),
                tags: vec![],
                data_type: "varchar".to_string(),
                nullable: false,
                primary_key: false,
                sensitive: column_sensitive,
            }],
        }
    }

    #[test]
    fn test_sensitivity_aggregates_from_columns() {
        let table = table_with_columns(false, true);
        assert!(table.is_sensitive_aggregate());

        let table = table_with_columns(false, false);
        assert!(!table.is_sensitive_aggregate());

        let table = table_with_columns(true, false);
        assert!(table.is_sensitive_aggregate());
    }

    #[test]
    fn test_lookup_and_counts() {
        let catalog = Catalog::new(vec![], vec![], vec![table_with_columns(false, true)]);
        assert!(catalog.table("t1").is_some());
        assert!(catalog.table("missing").is_none());
        assert!(catalog.table_is_sensitive("t1"));
        assert_eq!(catalog.total_entities(), 2); // one table + one column
    }

    #[test]
    fn test_column_path() {
        let table = table_with_columns(false, false);
        assert_eq!(table.column_path(&table.columns[0]), "public.customers.card_number");
    }
}
