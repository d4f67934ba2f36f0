use gms_config::AppConfig;

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("GMS_DATABASE_URL", "postgresql://gms@localhost:5432/gms");
        std::env::set_var("GMS_DEFAULT_QUERY_LIMIT", "50");
        std::env::set_var("GMS_UTC_OFFSET_MINUTES", "-300");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.database_url, "postgresql://gms@localhost:5432/gms");
    assert_eq!(config.default_query_limit, 50);
    assert_eq!(config.max_query_limit, 1_000);
    assert_eq!(config.utc_offset_minutes, -300);
}
