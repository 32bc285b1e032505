use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use flywheel_cli::commands::analyze::AnalyzeArgs;
use flywheel_cli::commands::{analyze, campaigns, config, import, migrate, show};
use serde_json::{json, Value};

#[test]
fn migrate_returns_success_with_file_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());

    with_env(&[("FLYWHEEL_DATABASE_URL", &url)], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("FLYWHEEL_DATABASE_URL", "postgres://localhost/flywheel")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn import_analyze_show_and_campaigns_share_one_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());
    let rows_path = dir.path().join("rows.json");
    fs::write(&rows_path, audit_rows().to_string()).expect("write rows file");

    with_env(&[("FLYWHEEL_DATABASE_URL", &url)], || {
        let imported = import::run("audit-cli", &rows_path, false);
        assert_eq!(imported.exit_code, 0, "import failed: {}", imported.output);

        let analyzed = analyze::run(AnalyzeArgs {
            audit_id: "audit-cli".to_string(),
            min_data_points: Some(3),
            ..AnalyzeArgs::default()
        });
        assert_eq!(analyzed.exit_code, 0, "analyze failed: {}", analyzed.output);
        let payload = parse_payload(&analyzed.output);
        assert_eq!(payload["data"]["totalAsinsAnalyzed"], 1);
        assert_eq!(payload["data"]["asinMetrics"][0]["recommendedAction"], "reduce_spend");

        let shown = show::run("audit-cli");
        assert_eq!(shown.exit_code, 0, "show failed: {}", shown.output);
        assert_eq!(parse_payload(&shown.output)["data"], payload["data"]);

        let rollup = campaigns::run("audit-cli");
        assert_eq!(rollup.exit_code, 0, "campaigns failed: {}", rollup.output);
        let rollup = parse_payload(&rollup.output);
        assert_eq!(rollup["data"][0]["campaign"], "Lamps - Exact");
    });
}

#[test]
fn import_with_replace_drops_previous_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());
    let rows_path = dir.path().join("rows.json");
    fs::write(&rows_path, audit_rows().to_string()).expect("write rows file");

    with_env(&[("FLYWHEEL_DATABASE_URL", &url)], || {
        assert_eq!(import::run("audit-cli", &rows_path, false).exit_code, 0);

        let replaced = import::run("audit-cli", &rows_path, true);
        assert_eq!(replaced.exit_code, 0);
        let payload = parse_payload(&replaced.output);
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(
            message.starts_with("replaced 4 rows with 4 rows"),
            "unexpected message: {message}"
        );
    });
}

#[test]
fn import_rejects_malformed_rows_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows_path = dir.path().join("rows.json");
    fs::write(&rows_path, "{\"not\": \"an array\"}").expect("write rows file");

    with_env(&[], || {
        let result = import::run("audit-cli", &rows_path, false);
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
    });
}

#[test]
fn analyze_without_rows_is_a_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());

    with_env(&[("FLYWHEEL_DATABASE_URL", &url)], || {
        let result = analyze::run(AnalyzeArgs {
            audit_id: "audit-empty".to_string(),
            ..AnalyzeArgs::default()
        });
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "bad_request");
        assert!(payload.get("data").is_none());
    });
}

#[test]
fn show_reports_missing_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());

    with_env(&[("FLYWHEEL_DATABASE_URL", &url)], || {
        let result = show::run("audit-never-analyzed");
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "not_found");
    });
}

#[test]
fn config_lists_environment_sources() {
    with_env(&[("FLYWHEEL_LOG_LEVEL", "debug")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);
        assert!(result
            .output
            .contains("- logging.level = debug (source: env (FLYWHEEL_LOG_LEVEL))"));
        assert!(result.output.contains("- analysis.min_data_points = 7 (source: default)"));
    });
}

fn database_url(dir: &Path) -> String {
    format!("sqlite://{}", dir.join("flywheel.db").display())
}

fn audit_rows() -> Value {
    let ad = |date: &str, sales: f64, spend: f64, clicks: f64, orders: f64| {
        json!({
            "kind": "sponsored_products",
            "fields": {
                "asin": "B001",
                "campaign_name": "Lamps - Exact",
                "date": date,
                "impressions": 1000.0,
                "clicks": clicks,
                "spend": spend,
                "7_day_total_sales": sales,
                "7_day_total_orders": orders
            }
        })
    };
    let organic = |date: &str, revenue: f64, sessions: f64, units: f64| {
        json!({
            "kind": "business_report",
            "fields": {
                "child_asin": "B001",
                "title": "Desk Lamp",
                "date": date,
                "sessions": sessions,
                "units_ordered": units,
                "ordered_product_sales": revenue
            }
        })
    };

    json!([
        ad("01/01/2024", 50.0, 10.0, 20.0, 5.0),
        ad("01/02/2024", 30.0, 8.0, 15.0, 3.0),
        organic("01/02/2024", 900.0, 100.0, 30.0),
        organic("01/03/2024", 1000.0, 100.0, 35.0),
    ])
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FLYWHEEL_DATABASE_URL",
        "FLYWHEEL_DATABASE_MAX_CONNECTIONS",
        "FLYWHEEL_DATABASE_TIMEOUT_SECS",
        "FLYWHEEL_ANALYSIS_MIN_DATA_POINTS",
        "FLYWHEEL_ANALYSIS_TREND_WINDOW_DAYS",
        "FLYWHEEL_ANALYSIS_TOP_OPPORTUNITIES",
        "FLYWHEEL_ANALYSIS_MAX_CONCURRENCY",
        "FLYWHEEL_COLLABORATORS_INGESTION_TIMEOUT_SECS",
        "FLYWHEEL_COLLABORATORS_STORAGE_TIMEOUT_SECS",
        "FLYWHEEL_LOGGING_LEVEL",
        "FLYWHEEL_LOGGING_FORMAT",
        "FLYWHEEL_LOG_LEVEL",
        "FLYWHEEL_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
