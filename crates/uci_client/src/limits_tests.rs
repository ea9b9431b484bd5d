use super::*;

#[test]
fn test_default_budget_is_100ms() {
    let limits = SearchLimits::default();
    assert_eq!(limits.move_time, Duration::from_millis(100));
    assert!(limits.depth.is_none());
}

#[test]
fn test_depth_and_time() {
    let limits = SearchLimits::depth_and_time(12, Duration::from_millis(250));
    assert_eq!(limits.depth, Some(12));
    assert_eq!(limits.move_time_ms(), 250);
}

#[test]
fn test_sub_millisecond_budget_rounds_up() {
    let limits = SearchLimits::time(Duration::from_micros(10));
    assert_eq!(limits.move_time_ms(), 1);
}
