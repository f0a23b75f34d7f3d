//! Orchestration tests for conformance runs against a scripted container engine.
//!
//! The engine and instance are in-memory fakes: they record every call so the tests can check what was started
//! and that the container was removed on each exit path.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use conformkit::runner::client::ClientError;
use conformkit::runner::tags::BASELINE_EXCLUSIONS;
use conformkit::runner::{
    CommandClient, ContainerEngine, ContainerHandle, ContainerSpec, Endpoint, HOST_GATEWAY_ENTRY, LiveInstance,
    Reply,
};
use conformkit::{ConformanceRequest, ConformanceVariant, RunnerConfig, RunnerError, run_conformance};

type Events = Rc<RefCell<Vec<String>>>;

#[derive(Clone)]
enum WaitScript {
    Exit(i64),
    TimedOut,
}

struct FakeEngine {
    events: Events,
    started: RefCell<Vec<ContainerSpec>>,
    build_fails: bool,
    wait: WaitScript,
    logs: Option<Vec<u8>>,
}

impl FakeEngine {
    fn new(events: &Events) -> Self {
        Self {
            events: events.clone(),
            started: RefCell::new(Vec::new()),
            build_fails: false,
            wait: WaitScript::Exit(0),
            logs: Some(b"[ok]: SET and GET an item\n".to_vec()),
        }
    }
}

struct FakeHandle {
    events: Events,
    wait: WaitScript,
    logs: Option<Vec<u8>>,
}

impl ContainerEngine for FakeEngine {
    type Handle = FakeHandle;

    fn build_image(&self, _context: &Path, tag: &str) -> Result<(), RunnerError> {
        self.events.borrow_mut().push(format!("build {tag}"));
        if self.build_fails {
            return Err(RunnerError::BuildFailed {
                image: tag.to_string(),
                status: Some(1),
                stderr: "no Dockerfile".to_string(),
            });
        }
        Ok(())
    }

    fn run_detached(&self, spec: &ContainerSpec) -> Result<FakeHandle, RunnerError> {
        self.events.borrow_mut().push("run".to_string());
        self.started.borrow_mut().push(spec.clone());
        Ok(FakeHandle {
            events: self.events.clone(),
            wait: self.wait.clone(),
            logs: self.logs.clone(),
        })
    }
}

impl ContainerHandle for FakeHandle {
    fn id(&self) -> &str {
        "f00d"
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<i64, RunnerError> {
        self.events.borrow_mut().push("wait".to_string());
        match self.wait {
            WaitScript::Exit(status) => Ok(status),
            WaitScript::TimedOut => Err(RunnerError::Timeout {
                id: "f00d".to_string(),
                timeout: timeout.unwrap_or_default(),
            }),
        }
    }

    fn logs(&mut self) -> Result<Vec<u8>, RunnerError> {
        self.events.borrow_mut().push("logs".to_string());
        self.logs
            .clone()
            .ok_or_else(|| RunnerError::Engine("logs unavailable".to_string()))
    }

    fn remove(&mut self) -> Result<(), RunnerError> {
        self.events.borrow_mut().push("remove".to_string());
        Ok(())
    }
}

struct FakeInstance {
    reply: Reply,
    endpoint: Endpoint,
}

impl FakeInstance {
    fn healthy() -> Self {
        Self {
            reply: Reply::Status("PONG".to_string()),
            endpoint: Endpoint::new("127.0.0.1", 6390),
        }
    }
}

impl CommandClient for FakeInstance {
    fn execute(&mut self, _args: &[&str]) -> Result<Reply, ClientError> {
        Ok(self.reply.clone())
    }
}

impl LiveInstance for FakeInstance {
    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }
}

fn config(log_dir: &Path) -> RunnerConfig {
    RunnerConfig::new().with_image("suite:test").with_log_dir(log_dir)
}

fn removals(events: &Events) -> usize {
    events.borrow().iter().filter(|e| *e == "remove").count()
}

#[test]
fn test_passing_run_persists_log_and_removes_container() {
    let events = Events::default();
    let engine = FakeEngine::new(&events);
    let dir = tempfile::tempdir().unwrap();

    let outcome = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::new("string"),
        &config(dir.path()),
    )
    .unwrap();

    assert!(outcome.passed());
    assert_eq!(outcome.container_id, "f00d");
    assert_eq!(outcome.log_path, dir.path().join("string.docker.log"));
    assert_eq!(fs::read(&outcome.log_path).unwrap(), b"[ok]: SET and GET an item\n");
    assert_eq!(outcome.log_bytes, 26);
    assert_eq!(
        *events.borrow(),
        vec!["build suite:test", "run", "wait", "logs", "remove"]
    );
}

#[test]
fn test_container_spec_targets_host_alias_with_baseline_tags() {
    let events = Events::default();
    let engine = FakeEngine::new(&events);
    let dir = tempfile::tempdir().unwrap();
    let request = ConformanceRequest::new("incr").with_extra_args(vec!["--clients".to_string(), "1".to_string()]);

    run_conformance(&engine, &mut FakeInstance::healthy(), &request, &config(dir.path())).unwrap();

    let started = engine.started.borrow();
    let spec = &started[0];
    assert_eq!(spec.image, "suite:test");
    assert_eq!(spec.extra_hosts, vec![HOST_GATEWAY_ENTRY.to_string()]);

    let host_at = spec.command.iter().position(|a| a == "--host").unwrap();
    assert_eq!(spec.command[host_at + 1], "host.docker.internal");
    let port_at = spec.command.iter().position(|a| a == "--port").unwrap();
    assert_eq!(spec.command[port_at + 1], "6390");

    let tags_at = spec.command.iter().position(|a| a == "--tags").unwrap();
    let tags = &spec.command[tags_at + 1];
    assert!(tags.starts_with("incr "));
    for exclusion in BASELINE_EXCLUSIONS {
        assert!(tags.contains(exclusion), "{exclusion} missing from {tags}");
    }
    assert_eq!(&spec.command[spec.command.len() - 2..], ["--clients", "1"]);
}

#[test]
fn test_empty_tags_still_exclude_baseline() {
    let events = Events::default();
    let engine = FakeEngine::new(&events);
    let dir = tempfile::tempdir().unwrap();

    let outcome = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::default(),
        &config(dir.path()),
    )
    .unwrap();

    assert_eq!(outcome.tags, BASELINE_EXCLUSIONS.join(" "));
    assert_eq!(outcome.log_path, dir.path().join("all.docker.log"));
}

#[test]
fn test_failing_run_is_an_outcome_not_an_error() {
    let events = Events::default();
    let mut engine = FakeEngine::new(&events);
    engine.wait = WaitScript::Exit(1);
    let dir = tempfile::tempdir().unwrap();

    let outcome = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::for_variant(ConformanceVariant::KnownGood),
        &config(dir.path()),
    )
    .unwrap();

    assert_eq!(outcome.exit_status, 1);
    assert!(outcome.log_path.ends_with("string_incr_hash_keyspace.docker.log"));
    assert!(outcome.log_path.exists());
    assert_eq!(removals(&events), 1);

    let err = outcome.ensure_passed().unwrap_err();
    assert!(!err.is_setup());
}

#[test]
fn test_timeout_removes_container_and_keeps_log() {
    let events = Events::default();
    let mut engine = FakeEngine::new(&events);
    engine.wait = WaitScript::TimedOut;
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path()).with_timeout(Some(Duration::from_secs(5)));

    let err = run_conformance(&engine, &mut FakeInstance::healthy(), &ConformanceRequest::new("list"), &config)
        .unwrap_err();

    assert!(matches!(err, RunnerError::Timeout { .. }));
    assert!(err.is_setup());
    assert!(dir.path().join("list.docker.log").exists());
    assert_eq!(removals(&events), 1);
}

#[test]
fn test_log_retrieval_failure_removes_container() {
    let events = Events::default();
    let mut engine = FakeEngine::new(&events);
    engine.logs = None;
    let dir = tempfile::tempdir().unwrap();

    let err = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::new("hash"),
        &config(dir.path()),
    )
    .unwrap_err();

    assert!(matches!(err, RunnerError::Engine(_)));
    assert!(!dir.path().join("hash.docker.log").exists());
    assert_eq!(removals(&events), 1);
}

#[test]
fn test_log_dir_is_created() {
    let events = Events::default();
    let engine = FakeEngine::new(&events);
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("logs").join("nightly");

    let outcome = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::new("set"),
        &config(&nested),
    )
    .unwrap();

    assert_eq!(outcome.log_path, nested.join("set.docker.log"));
    assert!(outcome.log_path.exists());
}

#[test]
fn test_preflight_failure_starts_nothing() {
    let events = Events::default();
    let engine = FakeEngine::new(&events);
    let dir = tempfile::tempdir().unwrap();
    let mut instance = FakeInstance {
        reply: Reply::Error("LOADING server is loading the dataset".to_string()),
        endpoint: Endpoint::new("db.internal", 6379),
    };

    let err = run_conformance(&engine, &mut instance, &ConformanceRequest::new("string"), &config(dir.path()))
        .unwrap_err();

    assert!(matches!(err, RunnerError::Preflight(_)));
    assert!(events.borrow().is_empty());
}

#[test]
fn test_build_failure_starts_nothing() {
    let events = Events::default();
    let mut engine = FakeEngine::new(&events);
    engine.build_fails = true;
    let dir = tempfile::tempdir().unwrap();

    let err = run_conformance(
        &engine,
        &mut FakeInstance::healthy(),
        &ConformanceRequest::new("string"),
        &config(dir.path()),
    )
    .unwrap_err();

    assert!(matches!(err, RunnerError::BuildFailed { .. }));
    assert_eq!(*events.borrow(), vec!["build suite:test"]);
}
