//! Implementation of the `testbench-db verify` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::connect;
use crate::cli::AlreadyReported;
use crate::cli::display::{
    action_failure, action_success, colorize_outcome, list_table, output, CommandOutput,
};
use crate::domain::models::{Config, SchemaDefinition};
use crate::domain::ports::SchemaStore;
use crate::services::{SchemaBootstrapper, VerificationReport};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Fail immediately instead of waiting for the database to come up
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub success: bool,
    #[serde(flatten)]
    pub report: VerificationReport,
}

impl CommandOutput for VerifyOutput {
    fn to_human(&self) -> String {
        if self.success {
            return action_success(&format!(
                "Database '{}' matches the schema.",
                self.report.database
            ));
        }

        let mut table = list_table(&["object", "problem"]);
        for name in &self.report.missing_collections {
            table.add_row(vec![name.clone(), colorize_outcome("missing").to_string()]);
        }
        for name in &self.report.missing_indexes {
            table.add_row(vec![name.clone(), colorize_outcome("missing").to_string()]);
        }
        for mismatch in &self.report.mismatched_indexes {
            table.add_row(vec![
                format!("{}.{}", mismatch.collection, mismatch.actual.name),
                format!(
                    "{}: expected {}, found keys {} (unique: {})",
                    colorize_outcome("mismatched"),
                    mismatch.expected,
                    mismatch.actual.keys,
                    mismatch.actual.unique
                ),
            ]);
        }

        format!(
            "{}\n\n{table}\n\nRun `testbench-db init` to create missing objects.",
            action_failure(&format!(
                "Database '{}' does not match the schema.",
                self.report.database
            ))
        )
    }
}

/// Compare the live schema with the definition.
pub async fn run<S: SchemaStore>(bootstrapper: &SchemaBootstrapper<S>) -> Result<VerifyOutput> {
    let report = bootstrapper
        .verify()
        .await
        .context("Failed to inspect database")?;
    Ok(VerifyOutput {
        success: report.is_satisfied(),
        report,
    })
}

/// Fail the command when the schema is not satisfied. The report itself has
/// already been printed.
pub fn exit_status(output: &VerifyOutput) -> Result<()> {
    if output.success {
        return Ok(());
    }
    Err(AlreadyReported(format!(
        "schema verification failed for database '{}'",
        output.report.database
    ))
    .into())
}

pub async fn execute(args: VerifyArgs, config: &Config, json_mode: bool) -> Result<()> {
    let (connection, store) = connect(config, !args.no_wait, json_mode).await?;
    let definition = SchemaDefinition::testbench().with_database(&config.mongodb.database);

    let verified = match SchemaBootstrapper::new(store, definition) {
        Ok(bootstrapper) => run(&bootstrapper).await,
        Err(err) => Err(err.into()),
    };
    connection.close().await;

    let output_data = verified?;
    output(&output_data, json_mode);
    exit_status(&output_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySchemaStore;
    use crate::domain::models::DEFAULT_DATABASE;

    fn bootstrapper() -> SchemaBootstrapper<InMemorySchemaStore> {
        SchemaBootstrapper::new(
            InMemorySchemaStore::new(DEFAULT_DATABASE),
            SchemaDefinition::testbench(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unsatisfied_output_lists_missing_objects() {
        let output = run(&bootstrapper()).await.unwrap();

        assert!(!output.success);
        let human = output.to_human();
        assert!(human.contains("results"));
        assert!(human.contains("nodes.address_1_service_1"));

        let json = output.to_json();
        assert_eq!(json["missing_collections"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_unsatisfied_schema_fails_without_second_json_document() {
        let output = run(&bootstrapper()).await.unwrap();

        let err = exit_status(&output).unwrap_err();
        assert!(err.is::<AlreadyReported>());
        assert!(crate::cli::json_error(&err).is_none());
        assert!(err.to_string().contains("pocket-ml-testbench"));
    }

    #[tokio::test]
    async fn test_satisfied_schema_exits_cleanly() {
        let bootstrapper = bootstrapper();
        bootstrapper.apply().await.unwrap();

        let output = run(&bootstrapper).await.unwrap();
        assert!(output.success);
        assert!(exit_status(&output).is_ok());
    }
}
