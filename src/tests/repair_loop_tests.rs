use std::sync::Arc;
use std::time::Duration;

use tokio::test;
use tokio_util::sync::CancellationToken;

use crate::config::LoopConfig;
use crate::errors::CvError;
use crate::models::artifact::{ AbortReason, LoopStatus };
use crate::models::common::{ CheckTool, Language };
use crate::models::verification::{ VerificationStatus, TIMEOUT_ERROR };
use crate::repair_loop::RepairLoop;
use crate::tests::support::{
    python_runner,
    setup,
    HangingCheck,
    RecordingObserver,
    ScriptedCheck,
    ScriptedGenerator,
};
use crate::traits::verification_engine::Check;

fn loop_config(max_iterations: usize, enabled_checks: Vec<CheckTool>) -> LoopConfig {
    LoopConfig {
        max_iterations,
        language: Language::Python,
        enabled_checks,
        generation_timeout: Duration::from_secs(5),
    }
}

fn repair_loop(
    generator: Arc<ScriptedGenerator>,
    checks: Vec<Arc<dyn Check>>,
    config: LoopConfig
) -> RepairLoop {
    RepairLoop::new(generator, python_runner(checks, false), config)
}

#[test]
async fn passes_on_first_iteration() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("def f(): return 1", "def test_f(): assert f() == 1"));
    let checks: Vec<Arc<dyn Check>> = vec![
        Arc::new(ScriptedCheck::passing(CheckTool::Tests)),
        Arc::new(ScriptedCheck::passing(CheckTool::Linter))
    ];
    let repair = repair_loop(generator.clone(), checks, loop_config(3, vec![CheckTool::Tests, CheckTool::Linter]));

    let result = repair.run("return one", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Success);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.iteration_records.len(), 1);
    assert_eq!(generator.generate_count(), 1);
    assert_eq!(generator.repair_count(), 0);
    assert!(result.metrics.tests_passed);
    assert!(result.metrics.linter_passed);
    assert_eq!(result.metrics.passed_verifications, 2);
}

#[test]
async fn repairs_until_last_iteration_passes() {
    setup();
    let generator = Arc::new(
        ScriptedGenerator::artifact("v1", "tests-v1")
            .with_repair(Ok("v2".to_string()))
            .with_repair(Ok("v3".to_string()))
    );
    let tests_check = Arc::new(ScriptedCheck::failing(CheckTool::Tests, 2, "assert f() == 1"));
    let repair = repair_loop(generator.clone(), vec![tests_check.clone()], loop_config(3, vec![CheckTool::Tests]));

    let result = repair.run("return one", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Success);
    assert_eq!(result.iterations, 3);
    assert_eq!(generator.repair_count(), 2);
    assert_eq!(generator.generate_count(), 1);
    assert_eq!(result.code, "v3");

    // Repair replaces the code and keeps the original tests.
    let seen = tests_check.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![
        ("v1".to_string(), "tests-v1".to_string()),
        ("v2".to_string(), "tests-v1".to_string()),
        ("v3".to_string(), "tests-v1".to_string())
    ]);
    assert_eq!(result.tests, "tests-v1");

    let indices: Vec<usize> = result.iteration_records
        .iter()
        .map(|r| r.iteration)
        .collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
async fn fails_after_budget_without_final_repair() {
    setup();
    let generator = Arc::new(
        ScriptedGenerator::artifact("v1", "t")
            .with_repair(Ok("v2".to_string()))
            .with_repair(Ok("v3".to_string()))
            .with_repair(Ok("v4".to_string()))
    );
    let tests_check = Arc::new(ScriptedCheck::failing(CheckTool::Tests, 10, "assert 1 == 2"));
    let repair = repair_loop(generator.clone(), vec![tests_check.clone()], loop_config(3, vec![CheckTool::Tests]));

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Failed);
    assert_eq!(result.iterations, 3);
    assert_eq!(generator.repair_count(), 2);
    assert_eq!(tests_check.call_count(), 3);
    assert_eq!(result.code, "v3");

    let inputs = generator.repair_inputs.lock().unwrap().clone();
    assert_eq!(inputs[0], ("v1".to_string(), "[tests] assert 1 == 2".to_string()));
    assert_eq!(inputs[1].0, "v2");
}

#[test]
async fn generation_failure_aborts_with_no_records() {
    setup();
    let generator = Arc::new(ScriptedGenerator::new(Err(CvError::GenerationFailure("model offline".into()))));
    let tests_check = Arc::new(ScriptedCheck::passing(CheckTool::Tests));
    let repair = repair_loop(generator.clone(), vec![tests_check.clone()], loop_config(3, vec![CheckTool::Tests]));

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Aborted);
    assert_eq!(result.iterations, 0);
    assert!(result.iteration_records.is_empty());
    assert!(result.metrics.is_empty());
    assert_eq!(tests_check.call_count(), 0);
    assert_eq!(generator.generate_count(), 1);
    match result.abort_reason {
        Some(AbortReason::Generation(message)) => assert!(message.contains("model offline")),
        other => panic!("unexpected abort reason: {:?}", other),
    }
}

#[test]
async fn hanging_check_times_out_and_triggers_repair() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("v1", "t").with_repair(Ok("v2".to_string())));
    let checks: Vec<Arc<dyn Check>> = vec![
        Arc::new(HangingCheck(CheckTool::Tests)),
        Arc::new(ScriptedCheck::passing(CheckTool::Linter))
    ];
    let repair = repair_loop(generator.clone(), checks, loop_config(2, vec![CheckTool::Tests, CheckTool::Linter]));

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    let first = &result.iteration_records[0].outcomes[0];
    assert_eq!(first.tool, CheckTool::Tests);
    assert_eq!(first.status, VerificationStatus::Error);
    assert_eq!(first.errors, vec![TIMEOUT_ERROR.to_string()]);

    assert_eq!(generator.repair_count(), 1);
    assert_eq!(result.final_status, LoopStatus::Failed);
    assert_eq!(result.iterations, 2);
}

#[test]
async fn zero_budget_is_unknown_without_calls() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("v1", "t"));
    let tests_check = Arc::new(ScriptedCheck::passing(CheckTool::Tests));
    let repair = repair_loop(generator.clone(), vec![tests_check.clone()], loop_config(0, vec![CheckTool::Tests]));

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Unknown);
    assert_eq!(result.iterations, 0);
    assert!(result.iteration_records.is_empty());
    assert!(result.abort_reason.is_none());
    assert_eq!(generator.generate_count(), 0);
    assert_eq!(tests_check.call_count(), 0);
}

#[test]
async fn repair_failure_keeps_previous_code() {
    setup();
    let generator = Arc::new(
        ScriptedGenerator::artifact("v1", "t").with_repair(Err(CvError::GenerationFailure("quota".into())))
    );
    let tests_check = Arc::new(ScriptedCheck::failing(CheckTool::Tests, 3, "boom"));
    let repair = repair_loop(generator.clone(), vec![tests_check.clone()], loop_config(3, vec![CheckTool::Tests]));

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Aborted);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.code, "v1");
    assert_eq!(generator.repair_count(), 1);
    assert_eq!(tests_check.call_count(), 1);
    assert!(matches!(result.abort_reason, Some(AbortReason::Repair(_))));
}

#[test]
async fn slow_generation_hits_timeout() {
    setup();
    let generator = Arc::new(
        ScriptedGenerator::artifact("v1", "t").with_generate_delay(Duration::from_millis(500))
    );
    let mut config = loop_config(3, vec![CheckTool::Tests]);
    config.generation_timeout = Duration::from_millis(50);
    let repair = repair_loop(generator, vec![Arc::new(ScriptedCheck::passing(CheckTool::Tests))], config);

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.final_status, LoopStatus::Aborted);
    assert_eq!(result.iterations, 0);
    match result.abort_reason {
        Some(AbortReason::Generation(message)) => assert!(message.contains("timed out")),
        other => panic!("unexpected abort reason: {:?}", other),
    }
}

#[test]
async fn cancelled_before_start_makes_no_calls() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("v1", "t"));
    let repair = repair_loop(
        generator.clone(),
        vec![Arc::new(ScriptedCheck::passing(CheckTool::Tests))],
        loop_config(3, vec![CheckTool::Tests])
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = repair.run("anything", None, &cancel).await;

    assert_eq!(result.final_status, LoopStatus::Aborted);
    assert_eq!(result.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(generator.generate_count(), 0);
}

#[test]
async fn cancellation_mid_check_appends_no_record() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("v1", "t"));
    let repair = repair_loop(
        generator.clone(),
        vec![Arc::new(HangingCheck(CheckTool::Tests))],
        loop_config(3, vec![CheckTool::Tests])
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let result = repair.run("anything", None, &cancel).await;

    assert_eq!(result.final_status, LoopStatus::Aborted);
    assert_eq!(result.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(result.iterations, 0);
    assert!(result.iteration_records.is_empty());
    assert_eq!(result.code, "v1");
}

#[test]
async fn observer_sees_transitions_in_order() {
    setup();
    let generator = Arc::new(ScriptedGenerator::artifact("v1", "t").with_repair(Ok("v2".to_string())));
    let observer = Arc::new(RecordingObserver::default());
    let repair = repair_loop(
        generator,
        vec![Arc::new(ScriptedCheck::failing(CheckTool::Tests, 1, "boom"))],
        loop_config(2, vec![CheckTool::Tests])
    ).with_observer(observer.clone());

    let result = repair.run("anything", None, &CancellationToken::new()).await;
    assert!(result.is_success());

    assert_eq!(observer.events(), vec![
        "start:1:generate",
        "outcome:1:tests:fail",
        "repair:1",
        "start:2:verify",
        "outcome:2:tests:pass",
        "terminal:success:2:"
    ]);
}

#[test]
async fn records_grow_by_one_per_pass() {
    setup();
    let generator = Arc::new(
        ScriptedGenerator::artifact("v1", "t")
            .with_repair(Ok("v2".to_string()))
            .with_repair(Ok("v3".to_string()))
            .with_repair(Ok("v4".to_string()))
    );
    let observer = Arc::new(RecordingObserver::default());
    let repair = repair_loop(
        generator,
        vec![Arc::new(ScriptedCheck::failing(CheckTool::Tests, 10, "boom"))],
        loop_config(4, vec![CheckTool::Tests])
    ).with_observer(observer.clone());

    let result = repair.run("anything", None, &CancellationToken::new()).await;

    assert_eq!(result.iteration_records.len(), 4);
    assert_eq!(result.iterations, result.iteration_records.len());
    let outcome_events = observer
        .events()
        .iter()
        .filter(|e| e.starts_with("outcome:"))
        .count();
    assert_eq!(outcome_events, 4);
    // Metrics reflect the last pass only.
    assert_eq!(result.metrics.iterations, 4);
    assert!(!result.metrics.tests_passed);
    assert_eq!(result.metrics.total_verifications, 1);
}
