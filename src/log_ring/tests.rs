use super::*;

#[test]
fn newest_first() {
    let ring = LogRing::new(8);
    ring.push("one");
    ring.push("two");
    ring.push("three");
    assert_eq!(ring.recent(2), vec!["three", "two"]);
    assert_eq!(ring.recent(10), vec!["three", "two", "one"]);
}

#[test]
fn evicts_oldest_beyond_capacity() {
    let ring = LogRing::new(3);
    for i in 0..5 {
        ring.push(format!("line {i}"));
    }
    assert_eq!(ring.len(), 3);
    assert_eq!(ring.recent(UI_LOG_LINES), vec!["line 4", "line 3", "line 2"]);
}

#[test]
fn clones_share_entries() {
    let ring = LogRing::new(4);
    let other = ring.clone();
    other.warn("from clone");
    assert_eq!(ring.recent(1), vec!["from clone"]);
}

#[test]
fn zero_capacity_keeps_latest() {
    let ring = LogRing::new(0);
    ring.push("a");
    ring.push("b");
    assert_eq!(ring.recent(5), vec!["b"]);
}
