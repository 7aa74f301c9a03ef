use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("localnet".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    WATCH_ROUNDS.with_label_values(&["synced"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"localnet_watch_rounds"),
        "Missing localnet_watch_rounds"
    );
    assert!(metric_names.contains(&"localnet_watch_sessions_active"));
}

#[test]
fn test_ops_counter_labels() {
    let before_set = WATCH_OPS_SENT
        .with_label_values(&["set", "test_labels"])
        .get();
    let before_delete = WATCH_OPS_SENT
        .with_label_values(&["delete", "test_labels"])
        .get();

    WATCH_OPS_SENT
        .with_label_values(&["set", "test_labels"])
        .inc();
    WATCH_OPS_SENT
        .with_label_values(&["set", "test_labels"])
        .inc();

    assert_eq!(
        WATCH_OPS_SENT
            .with_label_values(&["set", "test_labels"])
            .get(),
        before_set + 2
    );
    assert_eq!(
        WATCH_OPS_SENT
            .with_label_values(&["delete", "test_labels"])
            .get(),
        before_delete
    );
}

#[test]
fn test_gather_text_registers_once() {
    WATCH_ROUNDS.with_label_values(&["skipped"]).inc();

    let first = gather_text();
    let second = gather_text();

    assert!(first.contains("watch_rounds"));
    assert!(second.contains("watch_sessions_active"));
}
