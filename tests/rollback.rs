// ABOUTME: Integration tests for failure isolation and reverse-order rollback.
// ABOUTME: Midstream failures, cross-stage unwinds, and undeploy hook faults.

mod support;

use std::sync::Arc;

use gantry::scheduler::stage::{DESCRIBE, PARSE, REAL};
use gantry::scheduler::{Deployer, DeployerMeta, FnDeployer, ProcessorError, StageScheduler, Stages};
use gantry::types::UnitName;
use gantry::unit::{DeploymentUnit, UnitState};

use support::{EventLog, event_log, events, failing, recording};

fn unit(name: &str) -> DeploymentUnit {
    DeploymentUnit::new(UnitName::new(name).unwrap())
}

/// Records like the shared helper but fails on units whose simple name
/// matches `fail_on`.
fn failing_on(log: &EventLog, meta: DeployerMeta, fail_on: &str) -> Arc<dyn Deployer> {
    let name = meta.name.clone();
    let fail_on = fail_on.to_string();
    let deploy_log = log.clone();
    let undeploy_log = log.clone();
    let undeploy_name = name.clone();
    Arc::new(
        FnDeployer::new(meta, move |unit| {
            deploy_log.lock().push(format!("deploy:{name}:{}", unit.name()));
            if unit.simple_name() == fail_on {
                return Err(ProcessorError::failed(name.clone(), "refused"));
            }
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

#[test]
fn midstream_failure_unwinds_applied_deployers_in_reverse() {
    support::init_tracing();
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    // Chained outputs force the order d1, d2, d3, d4, d5 within the stage.
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("d1", PARSE).output("t1")))
        .unwrap();
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("d2", PARSE).input("t1").output("t2")))
        .unwrap();
    scheduler
        .add_deployer(failing(&log, DeployerMeta::new("d3", PARSE).input("t2").output("t3"), "boom"))
        .unwrap();
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("d4", PARSE).input("t3").output("t4")))
        .unwrap();
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("d5", PARSE).input("t4")))
        .unwrap();

    let mut roots = vec![unit("app.jar")];
    let failures = scheduler.process(&mut roots).unwrap();

    assert_eq!(
        events(&log),
        vec![
            "deploy:d1:app.jar",
            "deploy:d2:app.jar",
            "deploy:d3:app.jar",
            "undeploy:d2:app.jar",
            "undeploy:d1:app.jar",
        ]
    );
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.as_str(), "app.jar");
    assert_eq!(roots[0].state(), UnitState::Failed);
    let problem = roots[0].problem().unwrap();
    assert!(problem.message.contains("boom"));
    assert_eq!(problem.stage.as_deref(), Some(PARSE));
}

#[test]
fn failure_in_a_later_stage_unwinds_earlier_stages_too() {
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("parser", PARSE)))
        .unwrap();
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("describer", DESCRIBE)))
        .unwrap();
    scheduler
        .add_deployer(failing(&log, DeployerMeta::new("installer", REAL), "no runtime"))
        .unwrap();

    let mut roots = vec![unit("app.jar")];
    scheduler.process(&mut roots).unwrap();

    assert_eq!(
        events(&log),
        vec![
            "deploy:parser:app.jar",
            "deploy:describer:app.jar",
            "deploy:installer:app.jar",
            "undeploy:describer:app.jar",
            "undeploy:parser:app.jar",
        ]
    );
}

#[test]
fn failed_subtree_is_skipped_while_siblings_continue() {
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(failing_on(&log, DeployerMeta::new("parser", PARSE), "c1.war"))
        .unwrap();
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("describer", DESCRIBE)))
        .unwrap();

    let mut root = unit("app.ear");
    let mut c1 = unit("app.ear/c1.war");
    c1.add_child(unit("app.ear/c1.war/inner.jar"));
    root.add_child(c1);
    root.add_child(unit("app.ear/c2.war"));
    let mut roots = vec![root];

    let failures = scheduler.process(&mut roots).unwrap();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.as_str(), "app.ear/c1.war");

    let recorded = events(&log);
    // The failed subtree never reaches the later stage; everything else does.
    assert!(recorded.contains(&"deploy:describer:app.ear".to_string()));
    assert!(recorded.contains(&"deploy:describer:app.ear/c2.war".to_string()));
    assert!(!recorded.iter().any(|e| e.starts_with("deploy:describer:app.ear/c1.war")));

    let c1_name = UnitName::new("app.ear/c1.war").unwrap();
    assert_eq!(roots[0].find(&c1_name).unwrap().state(), UnitState::Failed);
    assert_eq!(roots[0].state(), UnitState::Processed);
}

#[test]
fn failing_parent_unwinds_descendants_processed_children_first() {
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(failing_on(
            &log,
            DeployerMeta::new("closer", PARSE).children_first(),
            "c1.war",
        ))
        .unwrap();

    let mut root = unit("app.ear");
    let mut c1 = unit("app.ear/c1.war");
    c1.add_child(unit("app.ear/c1.war/inner.jar"));
    root.add_child(c1);
    let mut roots = vec![root];

    scheduler.process(&mut roots).unwrap();

    assert_eq!(
        events(&log),
        vec![
            "deploy:closer:app.ear/c1.war/inner.jar",
            "deploy:closer:app.ear/c1.war",
            "undeploy:closer:app.ear/c1.war/inner.jar",
            "deploy:closer:app.ear",
        ]
    );
}

#[test]
fn undeploy_hook_failure_does_not_stop_the_unwind() {
    let log = event_log();
    let sabotage_log = log.clone();
    let sabotaged: Arc<dyn Deployer> = Arc::new(
        FnDeployer::new(DeployerMeta::new("flaky", DESCRIBE), {
            let log = log.clone();
            move |unit| {
                log.lock().push(format!("deploy:flaky:{}", unit.name()));
                Ok(())
            }
        })
        .with_undeploy(move |unit| {
            sabotage_log.lock().push(format!("undeploy:flaky:{}", unit.name()));
            Err(ProcessorError::failed("flaky", "hook broke"))
        }),
    );

    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("solid", PARSE)))
        .unwrap();
    scheduler.add_deployer(sabotaged).unwrap();

    let mut roots = vec![unit("app.jar")];
    scheduler.process(&mut roots).unwrap();
    scheduler.undeploy(&mut roots[0]);

    assert_eq!(
        events(&log),
        vec![
            "deploy:solid:app.jar",
            "deploy:flaky:app.jar",
            "undeploy:flaky:app.jar",
            "undeploy:solid:app.jar",
        ]
    );
    assert_eq!(roots[0].state(), UnitState::Undeployed);
}

#[test]
fn undeploy_reverts_component_applications_too() {
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("walker", PARSE).want_components()))
        .unwrap();

    let mut root = unit("app.ear");
    root.add_component(unit("app.ear/bean"));
    let mut roots = vec![root];
    scheduler.process(&mut roots).unwrap();
    assert_eq!(roots[0].components()[0].state(), UnitState::Processed);

    scheduler.undeploy(&mut roots[0]);

    assert_eq!(
        events(&log),
        vec![
            "deploy:walker:app.ear",
            "deploy:walker:app.ear/bean",
            "undeploy:walker:app.ear/bean",
            "undeploy:walker:app.ear",
        ]
    );
    assert_eq!(roots[0].components()[0].state(), UnitState::Undeployed);
}

#[test]
fn undeploy_of_an_untouched_unit_only_flips_state() {
    let log = event_log();
    let mut scheduler = StageScheduler::new(Stages::builtin());
    scheduler
        .add_deployer(recording(&log, DeployerMeta::new("d", PARSE)))
        .unwrap();

    let mut fresh = unit("never-processed.jar");
    scheduler.undeploy(&mut fresh);

    assert!(events(&log).is_empty());
    assert_eq!(fresh.state(), UnitState::Undeployed);
}
