use tabled::{settings::Style, Table, Tabled};
use crate::storage::{MergeStats, StoreStats};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) -> &mut Self {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &StoreStats) -> String {
    TableBuilder::new()
        .add_row("Symbols", stats.symbols)
        .add_row("Locations", stats.locations)
        .add_row("Sources", stats.sources)
        .build()
}

pub fn merge_table(stats: &MergeStats) -> String {
    TableBuilder::new()
        .add_row("Staged symbols", stats.staged_symbols)
        .add_row("Staged locations", stats.staged_locations)
        .add_row("New symbols", stats.new_symbols)
        .add_row("Touched sources", stats.touched_sources)
        .add_row("Removed locations", stats.removed_locations)
        .add_row("Inserted locations", stats.inserted_locations)
        .build()
}
