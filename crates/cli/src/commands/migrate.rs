use flywheel_core::config::ConfigOverrides;
use tracing::info;

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, Failure};

pub fn run() -> CommandResult {
    let result = load_config(ConfigOverrides::default()).and_then(|config| {
        let runtime = build_runtime()?;
        runtime.block_on(async {
            let pool = open_pool(&config).await?;
            pool.close().await;
            info!(
                event_name = "cli.migrate.completed",
                database_url = %config.database.url,
                "database schema is up to date"
            );
            Ok::<(), Failure>(())
        })
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
