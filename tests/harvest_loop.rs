#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{
    CancelToken, Checkpointer, FetchError, HarvestOutcome, HarvestState, Harvester, ItemRecord, RedditHarvest,
};
use std::time::{Duration, Instant};

/// A transport error on one query records zero items and the loop moves on.
#[test]
fn transport_error_yields_zero_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(vec![
        Step::Items(posts("first", 2, "q1")),
        Step::Fail(FetchError::Network("connection reset".into())),
        Step::Items(posts("third", 3, "q3")),
    ]);
    let specs = vec![spec("a", "q1"), spec("b", "q2"), spec("c", "q3")];

    let mut h = Harvester::new(&client, Checkpointer::new(dir.path().join("cp.csv")), Vec::new())
        .cooldown(Duration::ZERO);
    let outcome = h.run(&specs, &CancelToken::new()).unwrap();

    assert_eq!(outcome, HarvestOutcome::Completed);
    assert_eq!(h.state(), HarvestState::Done);
    assert_eq!(client.calls.borrow().len(), 3);
    assert_eq!(h.records().len(), 5);

    let collected: Vec<usize> = h.reports().iter().map(|r| r.collected).collect();
    assert_eq!(collected, vec![2, 0, 3]);
    assert!(h.reports()[1].error.as_deref().unwrap().contains("connection reset"));
}

/// The checkpoint is rewritten in full after every query (not appended).
#[test]
fn checkpoint_holds_full_accumulator_after_each_query() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("cp.csv");
    let client = ScriptedClient::new(vec![
        Step::Items(posts("one", 2, "q1")),
        Step::Items(posts("two", 1, "q2")),
        Step::Items(posts("three", 4, "q3")),
    ])
    .probing(&cp);
    let specs = vec![spec("a", "q1"), spec("a", "q2"), spec("a", "q3")];

    let mut h = Harvester::new(&client, Checkpointer::new(&cp), Vec::new()).cooldown(Duration::ZERO);
    h.run(&specs, &CancelToken::new()).unwrap();

    assert_eq!(*client.checkpoint_rows_seen.borrow(), vec![None, Some(2), Some(3)]);
    assert_eq!(read_rows::<ItemRecord>(&cp).len(), 7);
}

/// Cancelling during query i+1 keeps exactly the records of queries 1..=i; the
/// partial results of the cancelled query never reach the accumulator or disk.
#[test]
fn cancellation_mid_query_keeps_only_checkpointed_records() {
    let dir = tempfile::tempdir().unwrap();
    let first = posts("kept", 3, "q1");
    let client = ScriptedClient::new(vec![
        Step::Items(first.clone()),
        Step::CancelWith(posts("leaked", 4, "q2")),
        Step::Items(posts("never", 2, "q3")),
    ]);
    let specs = vec![spec("a", "q1"), spec("a", "q2"), spec("a", "q3")];

    let harvest = RedditHarvest::new()
        .output_dir(dir.path())
        .output_prefix("run")
        .checkpoint_name("cp.csv")
        .cooldown(Duration::ZERO)
        .progress(false);
    let report = harvest.run(&client, &specs, &CancelToken::new()).unwrap();

    assert_eq!(report.outcome, HarvestOutcome::Interrupted);
    assert_eq!(client.calls.borrow().len(), 2, "no query after cancellation");
    assert_eq!(report.accumulated, 3);

    let fin = report.finalized.expect("finalized on interrupt");
    let rows = read_final(&fin.path);
    let texts: Vec<&str> = rows.iter().map(|r| r.combined_text.as_str()).collect();
    let expected: Vec<&str> = first.iter().map(|r| r.combined_text.as_str()).collect();
    assert_eq!(texts, expected);
    assert!(!harvest.options().checkpoint_path().exists());
}

/// Cancellation during the cooldown wakes the wait immediately and stops the loop.
#[test]
fn cancellation_during_cooldown_is_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(vec![Step::Items(posts("one", 1, "q1")), Step::Items(posts("two", 1, "q2"))]);
    let specs = vec![spec("a", "q1"), spec("a", "q2")];
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    let t = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        trigger.cancel();
    });

    let started = Instant::now();
    let mut h = Harvester::new(&client, Checkpointer::new(dir.path().join("cp.csv")), Vec::new())
        .cooldown(Duration::from_secs(120));
    let outcome = h.run(&specs, &cancel).unwrap();
    t.join().unwrap();

    assert_eq!(outcome, HarvestOutcome::Interrupted);
    assert_eq!(h.state(), HarvestState::Interrupted);
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(client.calls.borrow().len(), 1);
    assert_eq!(h.records().len(), 1);
}

/// No cooldown after the last query.
#[test]
fn no_cooldown_after_last_query() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(vec![Step::Items(posts("only", 1, "q1"))]);
    let started = Instant::now();
    let mut h = Harvester::new(&client, Checkpointer::new(dir.path().join("cp.csv")), Vec::new())
        .cooldown(Duration::from_secs(120));
    let outcome = h.run(&[spec("a", "q1")], &CancelToken::new()).unwrap();
    assert_eq!(outcome, HarvestOutcome::Completed);
    assert!(started.elapsed() < Duration::from_secs(30));
}

/// A checkpoint that cannot be written aborts the loop with an error, yet the
/// pipeline still finalizes what it holds.
#[test]
fn checkpoint_failure_still_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the temp checkpoint path makes every write fail.
    std::fs::create_dir_all(dir.path().join("cp.csv.inprogress")).unwrap();
    let client = ScriptedClient::new(vec![Step::Items(posts("saved", 2, "q1"))]);

    let harvest = RedditHarvest::new()
        .output_dir(dir.path())
        .output_prefix("run")
        .checkpoint_name("cp.csv")
        .cooldown(Duration::ZERO)
        .progress(false);
    let err = harvest.run(&client, &[spec("a", "q1")], &CancelToken::new());
    assert!(err.is_err());
    assert_eq!(outputs_with_prefix(dir.path(), "run_").len(), 1);
}

/// A panic inside a query still leaves the earlier queries' records finalized on
/// disk, and the panic reaches the caller.
#[test]
fn panic_in_loop_still_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let saved = posts("saved", 2, "q1");
    let client = ScriptedClient::new(vec![Step::Items(saved.clone()), Step::Panic("source exploded")]);
    let specs = vec![spec("a", "q1"), spec("a", "q2")];

    let harvest = RedditHarvest::new()
        .output_dir(dir.path())
        .output_prefix("run")
        .checkpoint_name("cp.csv")
        .cooldown(Duration::ZERO)
        .progress(false);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        harvest.run(&client, &specs, &CancelToken::new())
    }));
    assert!(res.is_err());

    let outputs = outputs_with_prefix(dir.path(), "run_");
    assert_eq!(outputs.len(), 1);
    assert_eq!(read_final(&outputs[0]).len(), saved.len());
    assert!(!harvest.options().checkpoint_path().exists());
}
