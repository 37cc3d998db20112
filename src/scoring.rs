//! Weighted lexical scoring of catalog entities against an analyzed query.
//!
//! Rules are additive per entity kind. The weights establish the tie-break
//! order: exact full-phrase containment always outranks any combination of
//! individual-term matches, and column weights are kept small so match
//! volume across many columns cannot dominate application-level results.

use crate::catalog::{Application, Column, DataSource, Table};
use crate::sensitive::{self, SensitiveDataType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Application,
    DataSource,
    Table,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Direct sensitive-field-name hit.
    Exact,
    /// At least one individual search term found in entity text.
    Semantic,
    /// Generic weak signal only.
    Related,
}

impl MatchType {
    fn rank(self) -> u8 {
        match self {
            Self::Exact => 2,
            Self::Semantic => 1,
            Self::Related => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub entity: EntityRef,
    pub score: f64,
    pub reason: String,
    pub path: String,
    pub sensitive: bool,
    pub match_type: MatchType,
}

/// Analyzed query handed to every scoring call: the normalized lower-cased
/// phrase, the extracted term set, and the detected sensitive types.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub phrase: String,
    pub terms: Vec<String>,
    pub sensitive_types: Vec<SensitiveDataType>,
}

impl QueryContext {
    pub fn analyze(raw_query: &str) -> Self {
        Self {
            phrase: crate::query::normalize(raw_query),
            terms: crate::query::extract_terms(raw_query),
            sensitive_types: sensitive::detect(raw_query),
        }
    }
}

struct ScoreBuilder {
    score: f64,
    reason: String,
    match_type: MatchType,
}

impl ScoreBuilder {
    fn new() -> Self {
        Self {
            score: 0.0,
            reason: String::new(),
            match_type: MatchType::Related,
        }
    }

    fn add(&mut self, points: f64, reason: &str) {
        self.score += points;
        self.reason.push_str(reason);
        self.reason.push(' ');
    }

    fn escalate(&mut self, to: MatchType) {
        if to.rank() > self.match_type.rank() {
            self.match_type = to;
        }
    }

    fn finish(self, entity: EntityRef, path: String, sensitive: bool) -> Option<ScoredResult> {
        if self.score <= 0.0 {
            return None;
        }
        Some(ScoredResult {
            entity,
            score: self.score,
            reason: self.reason.trim_end().to_string(),
            path,
            sensitive,
            match_type: self.match_type,
        })
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(needle)
}

pub fn score_application(app: &Application, ctx: &QueryContext) -> Option<ScoredResult> {
    let mut b = ScoreBuilder::new();

    if contains(&app.name, &ctx.phrase) {
        b.add(30.0, &format!("Name matches \"{}\".", ctx.phrase));
    }
    if contains(&app.category, &ctx.phrase) {
        b.add(5.0, "Category matches the query.");
    }
    if contains(&app.description, &ctx.phrase) {
        b.add(5.0, "Description mentions the query.");
    }

    for term in &ctx.terms {
        if contains(&app.name, term) {
            b.add(10.0, &format!("Name contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if contains(&app.category, term) {
            b.add(3.0, &format!("Category contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if contains(&app.description, term) {
            b.add(3.0, &format!("Description contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if app.tags.iter().chain(app.technologies.iter()).any(|t| contains(t, term)) {
            b.add(2.0, &format!("Tagged with \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
    }

    b.finish(
        EntityRef {
            kind: EntityKind::Application,
            id: app.id.clone(),
            name: app.name.clone(),
        },
        app.name.clone(),
        false,
    )
}

pub fn score_data_source(ds: &DataSource, ctx: &QueryContext) -> Option<ScoredResult> {
    let mut b = ScoreBuilder::new();

    if contains(&ds.name, &ctx.phrase) {
        b.add(25.0, &format!("Name matches \"{}\".", ctx.phrase));
    }
    if contains(&ds.department, &ctx.phrase) {
        b.add(5.0, "Department matches the query.");
    }
    if contains(&ds.description, &ctx.phrase) {
        b.add(4.0, "Description mentions the query.");
    }

    for term in &ctx.terms {
        if contains(&ds.name, term) {
            b.add(8.0, &format!("Name contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if contains(&ds.description, term) {
            b.add(2.0, &format!("Description contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if ds.tags.iter().any(|t| contains(t, term)) {
            b.add(2.0, &format!("Tagged with \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
    }

    // Customer/order-style sources are far more likely to carry payment
    // fields than a generic description match would suggest.
    if ctx.sensitive_types.contains(&SensitiveDataType::CreditCard)
        && (sensitive::is_customer_context(&ds.name) || sensitive::is_customer_context(&ds.description))
    {
        b.add(40.0, "Likely holds payment-related records.");
        b.escalate(MatchType::Semantic);
    }

    b.finish(
        EntityRef {
            kind: EntityKind::DataSource,
            id: ds.id.clone(),
            name: ds.name.clone(),
        },
        ds.name.clone(),
        false,
    )
}

pub fn score_table(table: &Table, ctx: &QueryContext) -> Option<ScoredResult> {
    let mut b = ScoreBuilder::new();

    if contains(&table.name, &ctx.phrase) {
        b.add(30.0, &format!("Table name matches \"{}\".", ctx.phrase));
    }
    if contains(&table.schema_name, &ctx.phrase) {
        b.add(5.0, "Schema matches the query.");
    }
    if contains(&table.description, &ctx.phrase) {
        b.add(5.0, "Description mentions the query.");
    }

    for term in &ctx.terms {
        if contains(&table.name, term) {
            b.add(8.0, &format!("Table name contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if contains(&table.description, term) {
            b.add(2.0, &format!("Description contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if table.tags.iter().any(|t| contains(t, term)) {
            b.add(2.0, &format!("Tagged with \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
    }

    if ctx.sensitive_types.contains(&SensitiveDataType::CreditCard)
        && (sensitive::is_customer_context(&table.name) || sensitive::is_customer_context(&table.description))
    {
        b.add(50.0, "Customer/order tables commonly carry payment fields.");
        b.escalate(MatchType::Semantic);
    }

    b.finish(
        EntityRef {
            kind: EntityKind::Table,
            id: table.id.clone(),
            name: table.name.clone(),
        },
        format!("{}.{}", table.schema_name, table.name),
        table.is_sensitive_aggregate(),
    )
}

pub fn score_column(table: &Table, column: &Column, ctx: &QueryContext) -> Option<ScoredResult> {
    let mut b = ScoreBuilder::new();
    let column_name = column.name.to_lowercase();

    if contains(&column.name, &ctx.phrase) {
        b.add(15.0, &format!("Column name matches \"{}\".", ctx.phrase));
    }

    for term in &ctx.terms {
        if contains(&column.name, term) {
            b.add(4.0, &format!("Column name contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
        if contains(&column.description, term) {
            b.add(1.0, &format!("Description contains \"{}\".", term));
            b.escalate(MatchType::Semantic);
        }
    }

    for ty in &ctx.sensitive_types {
        if ty.field_name_markers().iter().any(|m| column_name.contains(m)) {
            b.add(100.0, &format!("Direct {} field.", ty.label()));
            b.escalate(MatchType::Exact);
        }
    }

    b.finish(
        EntityRef {
            kind: EntityKind::Column,
            id: column.id.clone(),
            name: column.name.clone(),
        },
        table.column_path(column),
        column.sensitive,
    )
}
