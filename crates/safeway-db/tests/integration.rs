//! Offline tests for safeway-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use safeway_core::{AppConfig, Coordinate, Environment};
use safeway_db::{PoolConfig, ReportRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        scoring_policy_path: PathBuf::from("./config/scoring.yaml"),
        password_pepper: "pepper".to_string(),
        session_ttl_hours: 720,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        rate_limit_per_minute: 120,
        opendata_api_key: None,
        opendata_base_url: "http://localhost".to_string(),
        opendata_cctv_service: "safeOpenCCTV".to_string(),
        opendata_streetlight_service: "safeOpenStreetLight".to_string(),
        opendata_page_size: 1000,
        opendata_max_records: 200_000,
        opendata_request_timeout_secs: 15,
        opendata_max_retries: 2,
        opendata_retry_backoff_base_ms: 500,
        opendata_cache_ttl_secs: 3600,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn report_row(lat: Option<f64>, lng: Option<f64>) -> ReportRow {
    ReportRow {
        id: Uuid::new_v4(),
        uid: Uuid::new_v4(),
        title: "Dark alley".to_string(),
        report_type: "danger".to_string(),
        content: "No lights after 10pm".to_string(),
        location: "Euljiro 3-ga".to_string(),
        lat,
        lng,
        likes: 0,
        comment_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn report_row_coordinate_requires_both_axes() {
    assert_eq!(
        report_row(Some(37.56), Some(126.99)).coordinate(),
        Some(Coordinate::new(37.56, 126.99))
    );
    assert_eq!(report_row(Some(37.56), None).coordinate(), None);
    assert_eq!(report_row(None, None).coordinate(), None);
}
