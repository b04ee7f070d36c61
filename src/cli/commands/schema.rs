//! Implementation of the `testbench-db schema` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::display::{colorize_unique, list_table, output, render_list, CommandOutput};
use crate::domain::models::{Config, SchemaDefinition};

#[derive(Debug, Serialize)]
pub struct SchemaOutput {
    #[serde(flatten)]
    pub schema: SchemaDefinition,
}

impl CommandOutput for SchemaOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["collection", "index", "fields", "unique"]);
        for collection in &self.schema.collections {
            if collection.indexes.is_empty() {
                table.add_row(vec![
                    collection.name.clone(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
            }
            for index in &collection.indexes {
                table.add_row(vec![
                    collection.name.clone(),
                    index.name(),
                    index.paths().collect::<Vec<_>>().join(", "),
                    colorize_unique(index.unique).to_string(),
                ]);
            }
        }

        format!(
            "Database: {}\n\n{}",
            self.schema.database,
            render_list("collection", &table, self.schema.collections.len())
        )
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let schema = SchemaDefinition::testbench().with_database(&config.mongodb.database);
    schema.validate()?;
    output(&SchemaOutput { schema }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_output_lists_results_without_index() {
        let output = SchemaOutput {
            schema: SchemaDefinition::testbench(),
        };
        let human = output.to_human();
        assert!(human.contains("pocket-ml-testbench"));
        assert!(human.contains("requester_args.address"));
        assert!(human.lines().any(|l| l.trim_start().starts_with("results")));

        let json = output.to_json();
        assert_eq!(json["collections"].as_array().unwrap().len(), 7);
        assert_eq!(json["collections"][5]["indexes"][0]["unique"], true);
        assert_eq!(json["collections"][1]["indexes"][0]["fields"][2]["path"], "requester_args.address");
    }
}
