use super::*;
use crate::models::Dimension;
use serial_test::serial;
use std::env;

/// These tests modify global environment variables and use #[serial] to
/// ensure they run sequentially, preventing interference between
/// parallel tests.
fn cleanup_test_env() {
    env::remove_var("QUEUE_BROKER_URL");
    env::remove_var("MAX_CONCURRENT_TASKS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("TASK_TIMEOUT_SECS");
    env::remove_var("SWEEP_INTERVAL_SECS");
    for dimension in [
        Dimension::Instruction,
        Dimension::Hallucination,
        Dimension::Assumption,
        Dimension::Coherence,
        Dimension::Accuracy,
    ] {
        env::remove_var(format!("WEIGHT_{}", dimension.as_str().to_uppercase()));
    }
}

#[test]
#[serial]
fn defaults_apply_when_unset() {
    cleanup_test_env();

    let config = Config::load().unwrap();

    assert_eq!(config.broker.url, "redis://127.0.0.1:6379");
    assert_eq!(
        config.scheduling.max_concurrent_tasks,
        crate::constants::DEFAULT_MAX_CONCURRENT_TASKS
    );
    assert_eq!(
        config.scheduling.task_timeout.as_secs(),
        crate::constants::DEFAULT_TASK_TIMEOUT_SECS
    );
    assert!(config.weights.validate().is_ok());

    cleanup_test_env();
}

#[test]
#[serial]
fn env_vars_override_scheduling_defaults() {
    cleanup_test_env();

    env::set_var("MAX_CONCURRENT_TASKS", "2");
    env::set_var("TASK_TIMEOUT_SECS", "45");
    env::set_var("QUEUE_BROKER_URL", "redis://broker.internal:6380");

    let config = Config::load().unwrap();

    assert_eq!(config.scheduling.max_concurrent_tasks, 2);
    assert_eq!(config.scheduling.task_timeout.as_secs(), 45);
    assert_eq!(config.broker.url, "redis://broker.internal:6380");

    cleanup_test_env();
}

#[test]
#[serial]
fn invalid_numeric_env_var_is_rejected() {
    cleanup_test_env();

    env::set_var("MAX_CONCURRENT_TASKS", "not-a-number");

    let result = Config::load();
    assert!(result.is_err());

    cleanup_test_env();
}

#[test]
#[serial]
fn weights_must_sum_to_one() {
    cleanup_test_env();

    env::set_var("WEIGHT_INSTRUCTION", "0.9");

    let result = Config::load();
    assert!(result.is_err());

    cleanup_test_env();
}

#[test]
#[serial]
fn custom_weights_are_honoured_when_they_sum_to_one() {
    cleanup_test_env();

    env::set_var("WEIGHT_INSTRUCTION", "0.40");
    env::set_var("WEIGHT_HALLUCINATION", "0.15");
    env::set_var("WEIGHT_ASSUMPTION", "0.15");
    env::set_var("WEIGHT_COHERENCE", "0.15");
    env::set_var("WEIGHT_ACCURACY", "0.15");

    let config = Config::load().unwrap();
    assert_eq!(config.weights.get(Dimension::Instruction), 0.40);
    assert!((config.weights.sum() - 1.0).abs() < 1e-9);

    cleanup_test_env();
}
