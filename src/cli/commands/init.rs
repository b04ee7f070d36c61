//! Implementation of the `testbench-db init` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::connect;
use crate::cli::display::{
    action_success, colorize_outcome, colorize_unique, list_table, output, render_list,
    CommandOutput,
};
use crate::domain::models::{Config, SchemaDefinition};
use crate::domain::ports::SchemaStore;
use crate::services::{BootstrapPlan, BootstrapReport, PlannedAction, SchemaBootstrapper};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Show what would be created without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Fail immediately instead of waiting for the database to come up
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: BootstrapReport,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![action_success(&self.message)];
        if !self.report.collections_created.is_empty() {
            lines.push("\nCreated collections:".to_string());
            for name in &self.report.collections_created {
                lines.push(format!("  - {name}"));
            }
        }
        if !self.report.indexes_created.is_empty() {
            lines.push("\nCreated indexes:".to_string());
            for name in &self.report.indexes_created {
                lines.push(format!("  - {name}"));
            }
        }
        let existing = self.report.collections_existing.len() + self.report.indexes_existing.len();
        if existing > 0 {
            lines.push(format!("\n{existing} collection(s)/index(es) already present"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub dry_run: bool,
    pub up_to_date: bool,
    #[serde(flatten)]
    pub plan: BootstrapPlan,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["step", "collection", "index", "unique", "state"]);
        for action in &self.plan.actions {
            let state = if action.is_pending() { "pending" } else { "exists" };
            match action {
                PlannedAction::CreateCollection { name, .. } => {
                    table.add_row(vec![
                        "create collection".to_string(),
                        name.clone(),
                        "-".to_string(),
                        "-".to_string(),
                        colorize_outcome(state).to_string(),
                    ]);
                }
                PlannedAction::CreateIndex {
                    collection, index, ..
                } => {
                    table.add_row(vec![
                        "create index".to_string(),
                        collection.clone(),
                        index.name(),
                        colorize_unique(index.unique).to_string(),
                        colorize_outcome(state).to_string(),
                    ]);
                }
            }
        }

        let header = if self.up_to_date {
            format!("Database '{}' is up to date.", self.plan.database)
        } else {
            format!(
                "{} pending step(s) for database '{}':",
                self.plan.pending().count(),
                self.plan.database
            )
        };
        format!(
            "{header}\n\n{}",
            render_list("step", &table, self.plan.actions.len())
        )
    }
}

/// What `init` produced: the plan on a dry run, otherwise the apply report.
#[derive(Debug)]
pub enum InitOutcome {
    Planned(PlanOutput),
    Applied(InitOutput),
}

/// Plan or apply the schema against `bootstrapper`'s store.
pub async fn run<S: SchemaStore>(
    bootstrapper: &SchemaBootstrapper<S>,
    dry_run: bool,
) -> Result<InitOutcome> {
    if dry_run {
        let plan = bootstrapper
            .plan()
            .await
            .context("Failed to inspect database")?;
        return Ok(InitOutcome::Planned(PlanOutput {
            dry_run: true,
            up_to_date: plan.is_up_to_date(),
            plan,
        }));
    }

    let report = bootstrapper
        .apply()
        .await
        .context("Failed to bootstrap schema")?;

    Ok(InitOutcome::Applied(InitOutput {
        success: true,
        message: if report.changed_anything() {
            format!("Database '{}' initialized.", report.database)
        } else {
            format!("Database '{}' already initialized.", report.database)
        },
        report,
    }))
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let (connection, store) = connect(config, !args.no_wait, json_mode).await?;
    let definition = SchemaDefinition::testbench().with_database(&config.mongodb.database);

    let outcome = match SchemaBootstrapper::new(store, definition) {
        Ok(bootstrapper) => run(&bootstrapper, args.dry_run).await,
        Err(err) => Err(err.into()),
    };
    connection.close().await;

    match outcome? {
        InitOutcome::Planned(plan) => output(&plan, json_mode),
        InitOutcome::Applied(applied) => output(&applied, json_mode),
    }
    Ok(())
}
