// ABOUTME: Shared helpers for integration tests.
// ABOUTME: Recording/failing deployers and container builders.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;

use parking_lot::Mutex;

use gantry::container::MemoryNodeBuilder;
use gantry::scheduler::{Deployer, DeployerMeta, FnDeployer, ProcessorError};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("gantry=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Shared event log: entries look like "deploy:parser:app.ear".
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}

/// Deployer that records every deploy/undeploy invocation.
pub fn recording(log: &EventLog, meta: DeployerMeta) -> Arc<dyn Deployer> {
    let name = meta.name.clone();
    let deploy_log = log.clone();
    let undeploy_log = log.clone();
    let undeploy_name = name.clone();
    Arc::new(
        FnDeployer::new(meta, move |unit| {
            deploy_log.lock().push(format!("deploy:{name}:{}", unit.name()));
            Ok(())
        })
        .with_undeploy(move |unit| {
            undeploy_log
                .lock()
                .push(format!("undeploy:{undeploy_name}:{}", unit.name()));
            Ok(())
        }),
    )
}

/// Deployer that records, then fails every deploy.
pub fn failing(log: &EventLog, meta: DeployerMeta, message: &str) -> Arc<dyn Deployer> {
    let name = meta.name.clone();
    let message = message.to_string();
    let deploy_log = log.clone();
    Arc::new(FnDeployer::new(meta, move |unit| {
        deploy_log.lock().push(format!("deploy:{name}:{}", unit.name()));
        Err(ProcessorError::failed(name.clone(), message.clone()))
    }))
}

/// A small ear-like container: root descriptor plus one nested war.
pub fn ear_with_nested_war() -> MemoryNodeBuilder {
    MemoryNodeBuilder::dir("app.ear")
        .with_file("meta-inf/application.xml", b"<application/>")
        .with_file("sub.war/meta-inf/web.xml", b"<web/>")
        .with_file("lib/util.jar", b"")
}
