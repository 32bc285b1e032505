use flywheel_core::config::ConfigOverrides;
use flywheel_core::domain::audit::AuditId;

use crate::commands::{
    build_runtime, load_config, open_pool, sql_analyzer, CommandResult, Failure,
    EXIT_BAD_REQUEST,
};

pub fn run(audit_id: &str) -> CommandResult {
    let audit_id = AuditId::new(audit_id);

    let result = load_config(ConfigOverrides::default()).and_then(|config| {
        let runtime = build_runtime()?;
        runtime.block_on(async {
            let pool = open_pool(&config).await?;
            let stored = sql_analyzer(&pool, &config).fetch_stored(&audit_id).await;
            pool.close().await;
            Ok::<_, Failure>(stored)
        })
    });

    match result {
        Ok(Ok(Some(stored))) => CommandResult::success_with_data(
            "show",
            format!(
                "stored analysis for audit `{audit_id}` from {}",
                stored.analyzed_at.to_rfc3339()
            ),
            &stored,
        ),
        Ok(Ok(None)) => CommandResult::failure(
            "show",
            "not_found",
            format!("no stored analysis for audit `{audit_id}`"),
            EXIT_BAD_REQUEST,
        ),
        Ok(Err(error)) => {
            CommandResult::from_interface("show", &error.into_interface(audit_id.as_str()))
        }
        Err(failure) => CommandResult::from_failure("show", failure),
    }
}
