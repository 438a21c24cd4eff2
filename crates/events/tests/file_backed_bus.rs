use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use herald_events::{
    BusConfig, CallbackFailure, CallbackResult, EventBus, EventData, HeraldError, Level,
};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    bus: EventBus,
}

impl Fixture {
    fn new(configure: impl FnOnce(BusConfig) -> BusConfig) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = BusConfig::new("test")
            .with_min_level(Level::Verbose)
            .with_console(false)
            .with_log_dir(dir.path().join("logs"));
        let bus = EventBus::new(configure(config)).expect("failed to build bus");
        Self { dir, bus }
    }

    fn log_path(&self, file: &str) -> std::path::PathBuf {
        self.dir.path().join("logs").join(file)
    }

    fn lines(&self, file: &str) -> Vec<String> {
        read_lines(&self.log_path(file))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn data(pairs: &[(&str, Value)]) -> EventData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn construction_creates_thread_and_master_logs() {
    let fx = Fixture::new(|c| c);

    assert!(fx.log_path("test.log").exists());
    assert!(fx.log_path("master.log").exists());
}

#[test]
fn log_appends_a_line_to_the_thread_log() {
    let fx = Fixture::new(|c| c);

    fx.bus.log("TEST_EVENT", EventData::new()).unwrap();

    let last = fx.lines("test.log").pop().unwrap();
    assert!(last.ends_with(" - DEBUG - test - TEST_EVENT"), "{last}");
    assert!(fx.lines("master.log").is_empty());
}

#[test]
fn master_log_mirrors_thread_log_when_enabled() {
    let fx = Fixture::new(|c| c.with_master(true));

    fx.bus.fire("A:INFO").unwrap();
    fx.bus
        .publish("B:WARNING", data(&[("k", json!("v"))]))
        .unwrap();

    assert_eq!(fx.lines("test.log"), fx.lines("master.log"));
    assert_eq!(fx.lines("master.log").len(), 2);
}

#[test]
fn every_level_reaches_subscribers() {
    let fx = Fixture::new(|c| c);
    fx.bus.subscribe("TEST_SUB", |_, _| Ok(json!(100)));

    for spec in [
        "TEST_SUB:VERBOSE",
        "TEST_SUB:INFO",
        "TEST_SUB:WARNING",
        "TEST_SUB:CRITICAL",
        "TEST_SUB",
    ] {
        assert_eq!(fx.bus.fire(spec).unwrap(), vec![json!(100)], "{spec}");
    }
    assert_eq!(fx.lines("test.log").len(), 5);
}

#[test]
fn throwing_subscriber_logs_an_exception_line() {
    let fx = Fixture::new(|c| c);
    fx.bus.subscribe("TEST_EXCEPTION", |_, _| {
        Err(CallbackFailure::msg("Exception test."))
    });

    let results = fx.bus.fire("TEST_EXCEPTION").unwrap();

    assert!(results.is_empty());
    let last = fx.lines("test.log").pop().unwrap();
    assert!(last.contains("ERROR - test - EXCEPTION - "), "{last}");
    let json = last.rsplit_once(" - ").map(|(_, j)| j).unwrap();
    let payload: Value = serde_json::from_str(json).unwrap();
    assert_eq!(payload["message"], json!("Exception test."));
    assert!(payload["file"].as_str().unwrap().ends_with("file_backed_bus.rs"));
    assert!(payload["line"].is_u64());
}

#[test]
fn data_round_trips_through_the_log_line() {
    let fx = Fixture::new(|c| c);
    let payload = data(&[
        ("user", json!("ada")),
        ("roles", json!(["admin", "ops"])),
        ("attempts", json!(3)),
    ]);

    fx.bus.publish("LOGIN:INFO", payload.clone()).unwrap();

    let last = fx.lines("test.log").pop().unwrap();
    let (_, json) = last.split_once(" - LOGIN - ").unwrap();
    let parsed: EventData = serde_json::from_str(json).unwrap();
    assert_eq!(parsed, payload);
}

#[test]
fn below_min_level_is_invisible() {
    let fx = Fixture::new(|c| c.with_min_level(Level::Info));
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    fx.bus.subscribe("CHATTY", move |_, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    });

    fx.bus.fire("CHATTY:DEBUG").unwrap();
    fx.bus.fire("CHATTY").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(fx.lines("test.log").is_empty());
    assert!(!fx.bus.did_occur(["CHATTY"], 100));
}

#[test]
fn unsubscribe_and_reset() {
    let fx = Fixture::new(|c| c);
    fx.bus.subscribe("TEST_SUB", |_, _| Ok(json!(1)));
    fx.bus.subscribe("OTHER", |_, _| Ok(json!(2)));

    fx.bus.unsubscribe("test_sub");
    assert_eq!(fx.bus.subscriber_count("TEST_SUB"), 0);
    assert!(fx.bus.fire("TEST_SUB").unwrap().is_empty());

    fx.bus.reset_subscriptions(false);
    assert_eq!(fx.bus.subscriber_count("OTHER"), 1);

    fx.bus.reset_subscriptions(true);
    assert_eq!(fx.bus.subscriber_count("OTHER"), 0);
    assert!(fx.bus.did_occur(["TEST_SUB"], 100));
}

#[test]
fn duplicate_subscription_fires_twice_in_order() {
    let fx = Fixture::new(|c| c);
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let first = order.clone();
    let callback = move |_: &str, _: &EventData| -> CallbackResult {
        first.lock().unwrap().push("dup");
        Ok(json!("dup"))
    };
    fx.bus.subscribe("TICK", callback.clone());
    let second = order.clone();
    fx.bus.subscribe("TICK", move |_, _| {
        second.lock().unwrap().push("middle");
        Ok(json!("middle"))
    });
    fx.bus.subscribe("TICK", callback);

    let results = fx.bus.fire("TICK").unwrap();

    assert_eq!(results, vec![json!("dup"), json!("middle"), json!("dup")]);
    assert_eq!(*order.lock().unwrap(), vec!["dup", "middle", "dup"]);
}

#[test]
fn did_occur_checks_recent_window() {
    let fx = Fixture::new(|c| c.with_history(3, 5));
    for name in ["A", "B", "C", "D", "E"] {
        fx.bus.fire(name).unwrap();
    }

    assert!(fx.bus.did_occur(["A", "E"], 100));
    assert!(!fx.bus.did_occur(["A"], 4));

    fx.bus.fire("F").unwrap();
    assert_eq!(fx.bus.history_len(), 3);
    assert!(!fx.bus.did_occur(["A"], 100));
    assert!(fx.bus.did_occur(["D", "E", "F"], 100));
}

#[test]
fn independent_buses_do_not_share_state() {
    let one = Fixture::new(|c| c);
    let two = Fixture::new(|c| c);
    one.bus.subscribe("SHARED", |_, _| Ok(json!("one")));

    one.bus.fire("ONLY_ONE").unwrap();

    assert!(two.bus.fire("SHARED").unwrap().is_empty());
    assert!(!two.bus.did_occur(["ONLY_ONE"], 100));
}

#[test]
fn unwritable_log_dir_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let err = EventBus::new(BusConfig::new("t").with_console(false).with_log_dir(&blocker))
        .unwrap_err();

    assert!(matches!(err, HeraldError::SinkOpenFailed { .. }), "{err:?}");
}

#[test]
fn sink_failure_surfaces_from_publish() {
    let fx = Fixture::new(|c| c);
    fs::remove_file(fx.log_path("test.log")).unwrap();
    fs::create_dir(fx.log_path("test.log")).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    fx.bus.subscribe("LOST", move |_, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    });

    let err = fx.bus.fire("LOST").unwrap_err();

    assert!(matches!(err, HeraldError::SinkWriteFailed { .. }), "{err:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!fx.bus.did_occur(["LOST"], 100));
}

#[test]
fn sink_failure_while_reporting_stops_dispatch() {
    let fx = Fixture::new(|c| c);
    let thread_log = fx.log_path("test.log");
    fx.bus.subscribe("JOB", move |_, _| {
        fs::remove_file(&thread_log).map_err(anyhow::Error::from)?;
        fs::create_dir(&thread_log).map_err(anyhow::Error::from)?;
        Ok(json!(1))
    });
    fx.bus
        .subscribe("JOB", |_, _| Err(CallbackFailure::msg("cannot be reported")));
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    fx.bus.subscribe("JOB", move |_, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    });

    let err = fx.bus.fire("JOB").unwrap_err();

    assert!(matches!(err, HeraldError::SinkWriteFailed { .. }), "{err:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(fx.bus.did_occur(["JOB"], 100));
    assert!(!fx.bus.did_occur(["EXCEPTION"], 100));
}
