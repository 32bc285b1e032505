use flywheel_core::analysis::{AnalysisOptions, AnalysisOutcome};
use flywheel_core::config::ConfigOverrides;
use flywheel_core::domain::audit::AuditId;
use flywheel_core::errors::AnalysisError;

use crate::commands::{build_runtime, load_config, open_pool, sql_analyzer, CommandResult, Failure};

#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub audit_id: String,
    pub min_data_points: Option<u32>,
    pub trend_window_days: Option<u32>,
    pub top_opportunities: Option<u32>,
}

enum Step {
    Done(AnalysisOutcome),
    Rejected(AnalysisError),
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let audit_id = AuditId::new(args.audit_id);
    let overrides = ConfigOverrides {
        min_data_points: args.min_data_points,
        trend_window_days: args.trend_window_days,
        top_opportunities: args.top_opportunities,
        ..ConfigOverrides::default()
    };

    let result = load_config(overrides).and_then(|config| {
        let runtime = build_runtime()?;
        runtime.block_on(async {
            let pool = open_pool(&config).await?;
            let analyzer = sql_analyzer(&pool, &config);
            let step = match analyzer.analyze(&audit_id, AnalysisOptions::from(&config)).await {
                Ok(outcome) => Step::Done(outcome),
                Err(error) => Step::Rejected(error),
            };
            pool.close().await;
            Ok::<_, Failure>(step)
        })
    });

    match result {
        Ok(Step::Done(outcome)) => {
            let result = &outcome.result;
            let mut message = format!(
                "analyzed {} products for audit `{}` ({} with insufficient history, {} opportunities)",
                result.total_asins_analyzed,
                audit_id,
                result.insufficient_history_count,
                result.opportunities.len()
            );
            if let Some(warning) = &outcome.persistence_warning {
                message.push_str(&format!("; result not stored: {}", warning.message));
            }
            CommandResult::success_with_data("analyze", message, result)
        }
        Ok(Step::Rejected(error)) => {
            CommandResult::from_interface("analyze", &error.into_interface(audit_id.as_str()))
        }
        Err(failure) => CommandResult::from_failure("analyze", failure),
    }
}
