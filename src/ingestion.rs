//! Catalog ingestion: JSON directory and CSV loaders plus the built-in
//! sample catalog used by the CLI demo and the test suite. The core is
//! agnostic to the source format; everything funnels into [`Catalog`].

use crate::catalog::{Application, Catalog, Column, DataSource, Table};
use crate::error::{DiscoveryError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Load a catalog from a directory of JSON files: `applications.json`,
/// `data_sources.json` and `tables.json` (columns nested per table).
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Catalog> {
    let dir = dir.as_ref();

    let applications: Vec<Application> = load_json(&dir.join("applications.json"))?;
    let data_sources: Vec<DataSource> = load_json(&dir.join("data_sources.json"))?;
    let tables: Vec<Table> = load_json(&dir.join("tables.json"))?;

    let catalog = Catalog::new(applications, data_sources, tables);
    validate(&catalog)?;
    info!(
        applications = catalog.applications.len(),
        data_sources = catalog.data_sources.len(),
        tables = catalog.tables.len(),
        columns = catalog.column_count(),
        "loaded catalog"
    );
    Ok(catalog)
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DiscoveryError::Ingestion(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| DiscoveryError::Ingestion(format!("failed to parse {}: {}", path.display(), e)))
}

#[derive(Debug, Deserialize)]
struct ApplicationRow {
    id: String,
    name: String,
    category: String,
    description: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    technologies: String,
    #[serde(default)]
    data_source_ids: String,
    #[serde(default)]
    environment: String,
}

#[derive(Debug, Deserialize)]
struct DataSourceRow {
    id: String,
    name: String,
    description: String,
    #[serde(default)]
    tags: String,
    department: String,
    owner: String,
    #[serde(default)]
    record_count: u64,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    id: String,
    name: String,
    description: String,
    #[serde(default)]
    tags: String,
    schema_name: String,
    data_source_id: String,
    #[serde(default)]
    sensitive: bool,
}

#[derive(Debug, Deserialize)]
struct ColumnRow {
    table_id: String,
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    data_type: String,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    sensitive: bool,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load a catalog from a directory of CSV files: `applications.csv`,
/// `data_sources.csv`, `tables.csv` and `columns.csv`. List-valued cells
/// use `;` separators; column rows attach to tables via `table_id`.
pub fn load_from_csv_dir(dir: impl AsRef<Path>) -> Result<Catalog> {
    let dir = dir.as_ref();

    let applications: Vec<Application> = read_csv::<ApplicationRow>(&dir.join("applications.csv"))?
        .into_iter()
        .map(|row| Application {
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            tags: split_list(&row.tags),
            technologies: split_list(&row.technologies),
            data_source_ids: split_list(&row.data_source_ids),
            environment: row.environment,
        })
        .collect();

    let data_sources: Vec<DataSource> = read_csv::<DataSourceRow>(&dir.join("data_sources.csv"))?
        .into_iter()
        .map(|row| DataSource {
            id: row.id,
            name: row.name,
            description: row.description,
            tags: split_list(&row.tags),
            department: row.department,
            owner: row.owner,
            record_count: row.record_count,
        })
        .collect();

    let mut tables: Vec<Table> = read_csv::<TableRow>(&dir.join("tables.csv"))?
        .into_iter()
        .map(|row| Table {
            id: row.id,
            name: row.name,
            description: row.description,
            tags: split_list(&row.tags),
            schema_name: row.schema_name,
            data_source_id: row.data_source_id,
            sensitive: row.sensitive,
            columns: Vec::new(),
        })
        .collect();

    let index: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    for row in read_csv::<ColumnRow>(&dir.join("columns.csv"))? {
        let slot = index.get(&row.table_id).copied().ok_or_else(|| {
            DiscoveryError::Ingestion(format!(
                "column {} references unknown table {}",
                row.id, row.table_id
            ))
        })?;
        tables[slot].columns.push(Column {
            id: row.id,
            name: row.name,
            description: row.description,
            tags: Vec::new(),
            data_type: row.data_type,
            nullable: row.nullable,
            primary_key: row.primary_key,
            sensitive: row.sensitive,
        });
    }

    let catalog = Catalog::new(applications, data_sources, tables);
    validate(&catalog)?;
    Ok(catalog)
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        DiscoveryError::Ingestion(format!("failed to open {}: {}", path.display(), e))
    })?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(|e| {
            DiscoveryError::Ingestion(format!("bad row in {}: {}", path.display(), e))
        })?);
    }
    Ok(rows)
}

/// Cross-reference check: every table must point at a known data source
/// and every application at known data sources.
fn validate(catalog: &Catalog) -> Result<()> {
    for table in &catalog.tables {
        if catalog.data_source(&table.data_source_id).is_none() {
            return Err(DiscoveryError::Ingestion(format!(
                "table {} references unknown data source {}",
                table.id, table.data_source_id
            )));
        }
    }
    for app in &catalog.applications {
        for ds_id in &app.data_source_ids {
            if catalog.data_source(ds_id).is_none() {
                return Err(DiscoveryError::Ingestion(format!(
                    "application {} references unknown data source {}",
                    app.id, ds_id
                )));
            }
        }
    }
    Ok(())
}

fn column(
    id: &str,
    name: &str,
    description: &str,
    data_type: &str,
    nullable: bool,
    primary_key: bool,
    sensitive: bool,
) -> Column {
    Column {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        tags: Vec::new(),
        data_type: data_type.to_string(),
        nullable,
        primary_key,
        sensitive,
    }
}

/// Built-in demo catalog. Covers every entity kind and includes a
/// `public.customers.card_number` column so the payment-data flow can be
/// exercised without external fixtures.
pub fn sample_catalog() -> Catalog {
    let applications = vec![
        Application {
            id: "app-ledgerpro".to_string(),
            name: "LedgerPro".to_string(),
            category: "Finance".to_string(),
            description: "Invoice management and payment reconciliation for the finance team"
                .to_string(),
            tags: vec!["invoicing".to_string(), "payments".to_string()],
            technologies: vec!["postgres".to_string(), "react".to_string()],
            data_source_ids: vec!["ds-billing".to_string()],
            environment: "production".to_string(),
        },
        Application {
            id: "app-shieldvault".to_string(),
            name: "ShieldVault".to_string(),
            category: "Security".to_string(),
            description: "Secrets storage and access auditing".to_string(),
            tags: vec!["security".to_string(), "audit".to_string()],
            technologies: vec!["vault".to_string()],
            data_source_ids: vec![],
            environment: "production".to_string(),
        },
        Application {
            id: "app-taskflow".to_string(),
            name: "TaskFlow".to_string(),
            category: "Productivity".to_string(),
            description: "Team task boards and project tracking".to_string(),
            tags: vec!["tasks".to_string(), "collaboration".to_string()],
            technologies: vec!["node".to_string()],
            data_source_ids: vec![],
            environment: "production".to_string(),
        },
        Application {
            id: "app-tunestream".to_string(),
            name: "TuneStream".to_string(),
            category: "Entertainment".to_string(),
            description: "Internal radio and music streaming for office spaces".to_string(),
            tags: vec!["music".to_string()],
            technologies: vec!["go".to_string()],
            data_source_ids: vec!["ds-events".to_string()],
            environment: "staging".to_string(),
        },
        Application {
            id: "app-insightboard".to_string(),
            name: "InsightBoard".to_string(),
            category: "Analytics".to_string(),
            description: "Self-service dashboards over the events warehouse".to_string(),
            tags: vec!["dashboards".to_string(), "reporting".to_string()],
            technologies: vec!["clickhouse".to_string(), "react".to_string()],
            data_source_ids: vec!["ds-events".to_string()],
            environment: "production".to_string(),
        },
    ];

    let data_sources = vec![
        DataSource {
            id: "ds-crm".to_string(),
            name: "crm_db".to_string(),
            description: "Customer relationship management database".to_string(),
            tags: vec!["customers".to_string()],
            department: "Sales".to_string(),
            owner: "sales-eng".to_string(),
            record_count: 1_250_000,
        },
        DataSource {
            id: "ds-billing".to_string(),
            name: "billing_db".to_string(),
            description: "Orders, invoices and payment transactions".to_string(),
            tags: vec!["billing".to_string(), "payments".to_string()],
            department: "Finance".to_string(),
            owner: "payments-platform".to_string(),
            record_count: 4_800_000,
        },
        DataSource {
            id: "ds-hr".to_string(),
            name: "hr_db".to_string(),
            description: "Employee records and payroll".to_string(),
            tags: vec!["hr".to_string()],
            department: "People".to_string(),
            owner: "people-ops".to_string(),
            record_count: 12_000,
        },
        DataSource {
            id: "ds-events".to_string(),
            name: "events_warehouse".to_string(),
            description: "Clickstream and product usage events".to_string(),
            tags: vec!["analytics".to_string()],
            department: "Data".to_string(),
            owner: "data-platform".to_string(),
            record_count: 980_000_000,
        },
    ];

    let tables = vec![
        Table {
            id: "tbl-customers".to_string(),
            name: "customers".to_string(),
            description: "Customer master records".to_string(),
            tags: vec!["customers".to_string()],
            schema_name: "public".to_string(),
            data_source_id: "ds-crm".to_string(),
            sensitive: false,
            columns: vec![
                column("col-customer-id", "customer_id", "Surrogate key", "bigint", false, true, false),
                column("col-full-name", "full_name", "Customer legal name", "varchar", false, false, true),
                column("col-email", "email", "Primary contact email", "varchar", true, false, true),
                column("col-card-number", "card_number", "Tokenized payment card number", "varchar", true, false, true),
                column("col-created-at", "created_at", "Row creation timestamp", "timestamp", false, false, false),
            ],
        },
        Table {
            id: "tbl-orders".to_string(),
            name: "orders".to_string(),
            description: "Order headers with payment amounts".to_string(),
            tags: vec!["billing".to_string()],
            schema_name: "public".to_string(),
            data_source_id: "ds-billing".to_string(),
            sensitive: false,
            columns: vec![
                column("col-order-id", "order_id", "Surrogate key", "bigint", false, true, false),
                column("col-order-customer", "customer_id", "Ordering customer", "bigint", false, false, false),
                column("col-amount", "amount", "Order total", "numeric", false, false, false),
                column("col-card-last4", "card_last4", "Last four digits of the card used", "char(4)", true, false, true),
            ],
        },
        Table {
            id: "tbl-employees".to_string(),
            name: "employees".to_string(),
            description: "Employee roster and payroll attributes".to_string(),
            tags: vec!["hr".to_string()],
            schema_name: "hr".to_string(),
            data_source_id: "ds-hr".to_string(),
            sensitive: true,
            columns: vec![
                column("col-employee-id", "employee_id", "Surrogate key", "bigint", false, true, false),
                column("col-salary", "salary", "Annual gross salary", "numeric", false, false, true),
                column("col-birth-date", "birth_date", "Date of birth", "date", false, false, true),
            ],
        },
        Table {
            id: "tbl-page-views".to_string(),
            name: "page_views".to_string(),
            description: "Raw clickstream page view events".to_string(),
            tags: vec![],
            schema_name: "analytics".to_string(),
            data_source_id: "ds-events".to_string(),
            sensitive: false,
            columns: vec![
                column("col-view-id", "view_id", "Event id", "uuid", false, true, false),
                column("col-url", "url", "Visited URL", "varchar", false, false, false),
                column("col-viewed-at", "viewed_at", "Event timestamp", "timestamp", false, false, false),
            ],
        },
    ];

    Catalog::new(applications, data_sources, tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_is_consistent() {
        let catalog = sample_catalog();
        assert!(validate(&catalog).is_ok());
        assert!(catalog.total_entities() > 20);
        assert!(catalog.table_is_sensitive("tbl-customers"));
    }

    #[test]
    fn test_validate_rejects_dangling_table_reference() {
        let mut catalog = sample_catalog();
        catalog.tables[0].data_source_id = "ds-missing".to_string();
        let catalog = Catalog::new(
            catalog.applications.clone(),
            catalog.data_sources.clone(),
            catalog.tables.clone(),
        );
        assert!(validate(&catalog).is_err());
    }

    #[test]
    fn test_json_roundtrip_through_directory() {
        let dir = std::env::temp_dir().join("datascope_ingestion_test");
        std::fs::create_dir_all(&dir).unwrap();

        let sample = sample_catalog();
        std::fs::write(
            dir.join("applications.json"),
            serde_json::to_string(&sample.applications).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join("data_sources.json"),
            serde_json::to_string(&sample.data_sources).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join("tables.json"),
            serde_json::to_string(&sample.tables).unwrap(),
        )
        .unwrap();

        let loaded = load_from_dir(&dir).unwrap();
        assert_eq!(loaded.applications.len(), sample.applications.len());
        assert_eq!(loaded.column_count(), sample.column_count());
    }

    #[test]
    fn test_csv_loader_attaches_columns() {
        let dir = std::env::temp_dir().join("datascope_csv_test");
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(
            dir.join("applications.csv"),
            "id,name,category,description,tags,technologies,data_source_ids,environment\n\
             app-1,LedgerPro,Finance,Invoices,billing;payments,postgres,ds-1,production\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("data_sources.csv"),
            "id,name,description,tags,department,owner,record_count\n\
             ds-1,billing_db,Billing data,billing,Finance,payments-platform,100\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("tables.csv"),
            "id,name,description,tags,schema_name,data_source_id,sensitive\n\
             tbl-1,orders,Order headers,billing,public,ds-1,false\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("columns.csv"),
            "table_id,id,name,description,data_type,nullable,primary_key,sensitive\n\
             tbl-1,col-1,order_id,Key,bigint,false,true,false\n\
             tbl-1,col-2,card_last4,Card suffix,char(4),true,false,true\n",
        )
        .unwrap();

        let catalog = load_from_csv_dir(&dir).unwrap();
        assert_eq!(catalog.applications[0].tags, vec!["billing", "payments"]);
        assert_eq!(catalog.tables[0].columns.len(), 2);
        assert!(catalog.table_is_sensitive("tbl-1"));
    }
}
