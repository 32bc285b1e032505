use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use flywheel_core::config::ConfigOverrides;
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::report::ReportRow;
use flywheel_db::repositories::{ReportRowRepository, SqlReportRowRepository};

use crate::commands::{
    build_runtime, load_config, open_pool, CommandResult, Failure, EXIT_BAD_REQUEST, EXIT_DB,
};

/// Loads a JSON array of already-typed report rows for one audit.
pub fn run(audit_id: &str, file: &Path, replace: bool) -> CommandResult {
    let audit_id = AuditId::new(audit_id);

    let rows = match read_rows(file) {
        Ok(rows) => rows,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "input",
                format!("{error:#}"),
                EXIT_BAD_REQUEST,
            );
        }
    };

    let result = load_config(ConfigOverrides::default()).and_then(|config| {
        let runtime = build_runtime()?;
        runtime.block_on(async {
            let pool = open_pool(&config).await?;
            let repo = SqlReportRowRepository::new(pool.clone());

            let removed = if replace {
                repo.delete_rows(&audit_id)
                    .await
                    .map_err(|error| ("db_write", error.to_string(), EXIT_DB))?
            } else {
                0
            };
            let inserted = repo
                .insert_rows(&audit_id, &rows)
                .await
                .map_err(|error| ("db_write", error.to_string(), EXIT_DB))?;
            pool.close().await;

            info!(
                event_name = "cli.import.completed",
                correlation_id = %audit_id,
                inserted,
                removed,
                "report rows imported"
            );
            Ok::<(u64, u64), Failure>((inserted, removed))
        })
    });

    match result {
        Ok((inserted, 0)) => CommandResult::success(
            "import",
            format!("imported {inserted} rows for audit `{audit_id}`"),
        ),
        Ok((inserted, removed)) => CommandResult::success(
            "import",
            format!("replaced {removed} rows with {inserted} rows for audit `{audit_id}`"),
        ),
        Err(failure) => CommandResult::from_failure("import", failure),
    }
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<ReportRow>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read rows file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("rows file {} is not a JSON array of report rows", path.display()))
}
