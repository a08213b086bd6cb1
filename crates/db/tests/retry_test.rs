use lessonsync_db::repositories::lesson::retry_delay;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_retry_pause_grows_with_each_attempt() {
    assert_eq!(retry_delay(1), Duration::from_millis(25));
    assert_eq!(retry_delay(2), Duration::from_millis(50));
    assert!(retry_delay(3) > retry_delay(2));
}

#[test]
fn test_first_retry_pause_is_nonzero() {
    assert!(retry_delay(1) > Duration::ZERO);
}
