use flywheel_core::config::ConfigOverrides;
use flywheel_core::domain::audit::AuditId;

use crate::commands::{build_runtime, load_config, open_pool, sql_analyzer, CommandResult, Failure};

pub fn run(audit_id: &str) -> CommandResult {
    let audit_id = AuditId::new(audit_id);

    let result = load_config(ConfigOverrides::default()).and_then(|config| {
        let runtime = build_runtime()?;
        runtime.block_on(async {
            let pool = open_pool(&config).await?;
            let rollup = sql_analyzer(&pool, &config).campaign_rollup(&audit_id).await;
            pool.close().await;
            Ok::<_, Failure>(rollup)
        })
    });

    match result {
        Ok(Ok(rollup)) => CommandResult::success_with_data(
            "campaigns",
            format!("{} campaigns for audit `{audit_id}`", rollup.len()),
            &rollup,
        ),
        Ok(Err(error)) => {
            CommandResult::from_interface("campaigns", &error.into_interface(audit_id.as_str()))
        }
        Err(failure) => CommandResult::from_failure("campaigns", failure),
    }
}
