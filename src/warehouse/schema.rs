//! Destination table schemas
//!
//! Each dataset declares its columns once. The same declaration drives the
//! `CREATE TABLE` statement and the column map handed to `read_json`, so a
//! load can never see a different shape than the table it appends to.

use crate::types::Dataset;

/// Column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// 64-bit signed integer
    Int64,
    /// Boolean
    Bool,
    /// Calendar date
    Date,
    /// Nested record
    Record(Vec<Field>),
}

/// Whether a column holds one value or a list of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldMode {
    /// Single value, may be NULL
    #[default]
    Nullable,
    /// List of values
    Repeated,
}

/// One column (or nested record member)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl Field {
    fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Nullable,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn int64(name: &str) -> Self {
        Self::new(name, FieldType::Int64)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn record(name: &str, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Record(fields))
    }

    /// Mark the field as repeated
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.mode = FieldMode::Repeated;
        self
    }

    /// DuckDB type of this field, e.g. `BIGINT` or `STRUCT("a" VARCHAR)[]`
    pub fn duckdb_type(&self) -> String {
        let base = match &self.field_type {
            FieldType::String => "VARCHAR".to_string(),
            FieldType::Int64 => "BIGINT".to_string(),
            FieldType::Bool => "BOOLEAN".to_string(),
            FieldType::Date => "DATE".to_string(),
            FieldType::Record(fields) => {
                let members: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", quote_ident(&f.name), f.duckdb_type()))
                    .collect();
                format!("STRUCT({})", members.join(", "))
            }
        };
        match self.mode {
            FieldMode::Nullable => base,
            FieldMode::Repeated => format!("{base}[]"),
        }
    }
}

/// Declared schema of a destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    fields: Vec<Field>,
}

impl TableSchema {
    /// Create a schema from its top-level fields
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Schema for a dataset
    pub fn for_dataset(dataset: Dataset) -> Self {
        match dataset {
            Dataset::DailyVisits => Self::daily_visits(),
            Dataset::GaSessions => Self::ga_sessions(),
        }
    }

    /// Flat daily visit counts
    pub fn daily_visits() -> Self {
        Self::new(vec![
            Field::int64("total_visits"),
            Field::date("visit_date"),
            Field::string("source_file"),
        ])
    }

    /// Nested session records
    pub fn ga_sessions() -> Self {
        Self::new(vec![
            Field::string("fullVisitorId"),
            Field::int64("visitId"),
            Field::int64("visitStartTime"),
            Field::int64("visitNumber"),
            Field::date("date"),
            Field::string("channelGrouping"),
            Field::record(
                "device",
                vec![
                    Field::string("browser"),
                    Field::string("operatingSystem"),
                    Field::bool("isMobile"),
                ],
            ),
            Field::record(
                "geoNetwork",
                [
                    "city",
                    "country",
                    "continent",
                    "region",
                    "subContinent",
                    "cityId",
                    "latitude",
                    "longitude",
                    "metro",
                    "networkDomain",
                    "networkLocation",
                ]
                .into_iter()
                .map(Field::string)
                .collect(),
            ),
            Field::record(
                "totals",
                ["visits", "hits", "bounces", "pageviews", "newVisits"]
                    .into_iter()
                    .map(Field::int64)
                    .collect(),
            ),
            Field::record(
                "trafficSource",
                ["source", "medium", "keyword", "adContent", "referralPath"]
                    .into_iter()
                    .map(Field::string)
                    .collect(),
            ),
            Field::record(
                "customDimensions",
                vec![Field::int64("index"), Field::string("value")],
            )
            .repeated(),
            Field::record(
                "hits_sample",
                vec![
                    Field::int64("hitNumber"),
                    Field::string("hostname"),
                    Field::bool("isInteraction"),
                    Field::string("pagePath"),
                    Field::string("pageTitle"),
                    Field::int64("time"),
                    Field::string("type"),
                ],
            )
            .repeated(),
            Field::string("source_file"),
        ])
    }

    /// Top-level fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Top-level column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// True when the schema has nested or repeated columns
    pub fn is_nested(&self) -> bool {
        self.fields.iter().any(|f| {
            f.mode == FieldMode::Repeated || matches!(f.field_type, FieldType::Record(_))
        })
    }

    /// Column list for `CREATE TABLE`
    pub fn column_definitions(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{} {}", quote_ident(&f.name), f.duckdb_type()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `columns={...}` struct literal for `read_json`
    pub fn json_columns(&self) -> String {
        let entries: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}: {}", quote_literal(&f.name), quote_literal(&f.duckdb_type())))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

/// Double-quote an identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
