mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use agentflow_core::api::{
    AgentNode, AgentPhase, AgentStatus, FailurePolicy, JobContext, JobInput, JobResult, JobStatus,
    StatusEvent, CANCELLED_REASONING,
};
use common::{
    default_output, diamond, engine_with, validated, Behavior, RecordingPublisher, ScriptedExecutor,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn statuses(result: &JobResult) -> Vec<(String, AgentStatus)> {
    result
        .execution_log
        .iter()
        .map(|e| (e.agent_id.clone(), e.status))
        .collect()
}

#[tokio::test]
async fn independent_agents_share_one_level() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(vec![
        AgentNode::new("summary"),
        AgentNode::new("entity"),
        AgentNode::new("severity"),
    ]);
    assert_eq!(
        plan.levels().to_vec(),
        vec![vec![
            "entity".to_string(),
            "severity".to_string(),
            "summary".to_string()
        ]]
    );

    let result = engine_with(executor.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(json!({"text": "outage"})))
        .await
        .expect("run");

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.count(AgentStatus::Success), 3);
    assert_eq!(executor.total_invocations(), 3);
}

#[tokio::test]
async fn dependent_agent_runs_after_its_dependency() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(vec![
        AgentNode::new("severity").depends_on("entity"),
        AgentNode::new("entity"),
    ]);

    let result = engine_with(executor.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(
        statuses(&result),
        vec![
            ("entity".to_string(), AgentStatus::Success),
            ("severity".to_string(), AgentStatus::Success),
        ]
    );
    let severity = executor.request_for("severity").expect("severity invoked");
    assert_eq!(
        severity.dependency_outputs,
        BTreeMap::from([("entity".to_string(), default_output("entity"))])
    );
    assert_eq!(result.status, JobStatus::Completed);
}

#[tokio::test]
async fn diamond_root_runs_once_and_feeds_both_branches() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(diamond());

    let result = engine_with(executor.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(executor.invocations("A"), 1);
    for branch in ["B", "C"] {
        let request = executor.request_for(branch).expect("branch invoked");
        assert_eq!(request.dependency_outputs.get("A"), Some(&default_output("A")));
    }
    let d = executor.request_for("D").expect("D invoked");
    assert_eq!(
        d.dependency_outputs.keys().cloned().collect::<Vec<_>>(),
        vec!["B", "C"]
    );
    assert_eq!(result.execution_log.len(), 4);
}

#[tokio::test]
async fn failure_in_chain_skips_downstream_without_invoking_it() {
    let executor = Arc::new(ScriptedExecutor::new().on("B", Behavior::Fail("bad input".into())));
    let (graph, plan) = validated(vec![
        AgentNode::new("A"),
        AgentNode::new("B").depends_on("A"),
        AgentNode::new("C").depends_on("B"),
    ]);

    let result = engine_with(executor.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(
        statuses(&result),
        vec![
            ("A".to_string(), AgentStatus::Success),
            ("B".to_string(), AgentStatus::Error),
            ("C".to_string(), AgentStatus::Skipped),
        ]
    );
    assert_eq!(executor.invocations("C"), 0);
    assert_eq!(result.status, JobStatus::Failed);
    assert_eq!(
        result.entry("B").and_then(|e| e.error_message.as_deref()),
        Some("bad input")
    );
    assert_eq!(result.entry("C").and_then(|e| e.caused_by.as_deref()), Some("B"));
}

#[tokio::test]
async fn independent_peer_still_runs_when_sibling_fails() {
    let executor = Arc::new(ScriptedExecutor::new().on("A", Behavior::Fail("boom".into())));
    let (graph, plan) = validated(vec![
        AgentNode::new("A"),
        AgentNode::new("B"),
        AgentNode::new("D").depends_on("A").depends_on("B"),
    ]);

    let result = engine_with(executor.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(result.entry("A").map(|e| e.status), Some(AgentStatus::Error));
    assert_eq!(result.entry("B").map(|e| e.status), Some(AgentStatus::Success));
    assert_eq!(result.entry("D").map(|e| e.status), Some(AgentStatus::Skipped));
    assert_eq!(executor.invocations("D"), 0);
    assert_eq!(result.status, JobStatus::Failed);
}

#[tokio::test]
async fn every_node_gets_exactly_one_entry() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .on("b1", Behavior::Fail("no".into()))
            .on("b2", Behavior::Panic("kaboom".into())),
    );
    let mut nodes = vec![AgentNode::new("root")];
    for i in 1..=3 {
        nodes.push(AgentNode::new(format!("b{i}")).depends_on("root"));
        nodes.push(AgentNode::new(format!("c{i}")).depends_on(format!("b{i}")));
    }
    let (graph, plan) = validated(nodes);

    let result = engine_with(executor)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    let mut ids: Vec<_> = result.execution_log.iter().map(|e| e.agent_id.clone()).collect();
    ids.sort();
    let mut expected: Vec<_> = graph.agent_ids().into_iter().map(String::from).collect();
    expected.sort();
    assert_eq!(ids, expected);
    assert_eq!(result.count(AgentStatus::Error), 2);
}

#[tokio::test]
async fn panicking_executor_is_logged_as_error() {
    let executor = Arc::new(ScriptedExecutor::new().on("A", Behavior::Panic("kaboom".into())));
    let (graph, plan) = validated(vec![AgentNode::new("A"), AgentNode::new("B").depends_on("A")]);

    let result = engine_with(executor)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("panic does not abort the engine");

    let a = result.entry("A").expect("A logged");
    assert_eq!(a.status, AgentStatus::Error);
    assert!(a.error_message.as_deref().unwrap_or_default().contains("kaboom"));
    assert_eq!(result.entry("B").map(|e| e.status), Some(AgentStatus::Skipped));
}

#[tokio::test]
async fn slow_agent_times_out_as_error() {
    let executor = Arc::new(ScriptedExecutor::new().on("slow", Behavior::Sleep(Duration::from_secs(5))));
    let (graph, plan) = validated(vec![
        AgentNode::new("slow").with_timeout(Duration::from_millis(20)),
        AgentNode::new("fast"),
    ]);

    let result = engine_with(executor)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    let slow = result.entry("slow").expect("slow logged");
    assert_eq!(slow.status, AgentStatus::Error);
    assert_eq!(slow.error_message.as_deref(), Some("timed out after 20ms"));
    assert_eq!(result.entry("fast").map(|e| e.status), Some(AgentStatus::Success));
}

#[tokio::test]
async fn concurrency_cap_bounds_in_flight_agents() {
    let mut executor = ScriptedExecutor::new();
    let mut nodes = Vec::new();
    for i in 0..6 {
        let id = format!("agent_{i}");
        executor = executor.on(&id, Behavior::Sleep(Duration::from_millis(40)));
        nodes.push(AgentNode::new(id));
    }
    let executor = Arc::new(executor);
    let (graph, plan) = validated(nodes);

    let result = engine_with(executor.clone())
        .max_concurrency(2)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(result.count(AgentStatus::Success), 6);
    assert!(executor.peak_in_flight() <= 2, "peak was {}", executor.peak_in_flight());
    assert!(executor.peak_in_flight() >= 1);
}

#[tokio::test]
async fn cache_is_empty_after_job_and_fresh_runs_reinvoke() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(diamond());
    let engine = engine_with(executor.clone()).build();

    let ctx = JobContext::new(JobInput::new(Value::Null)).expect("context");
    let first = engine.run(&ctx, &graph, &plan).await.expect("first run");
    assert!(ctx.cache().is_empty());
    assert_eq!(first.count(AgentStatus::Cached), 0);

    let second = engine
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("second run");
    assert_eq!(second.count(AgentStatus::Cached), 0);
    assert_eq!(executor.invocations("A"), 2);
}

#[tokio::test]
async fn cache_is_cleared_after_failed_job() {
    let executor = Arc::new(ScriptedExecutor::new().on("B", Behavior::Fail("x".into())));
    let (graph, plan) = validated(diamond());
    let ctx = JobContext::new(JobInput::new(Value::Null)).expect("context");

    let result = engine_with(executor)
        .build()
        .run(&ctx, &graph, &plan)
        .await
        .expect("run");

    assert_eq!(result.status, JobStatus::Failed);
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn seeded_outputs_are_reported_as_cached() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(vec![AgentNode::new("A"), AgentNode::new("B").depends_on("A")]);
    let seeds = BTreeMap::from([("A".to_string(), json!({"from": "earlier run"}))]);

    let result = engine_with(executor.clone())
        .build()
        .execute(
            &graph,
            &plan,
            JobInput::new(Value::Null).with_seed_outputs(seeds),
        )
        .await
        .expect("run");

    let a = result.entry("A").expect("A logged");
    assert_eq!(a.status, AgentStatus::Cached);
    assert_eq!(a.execution_time_ms, 0);
    assert!(a.reasoning.is_empty(), "cached reasoning is executor text only: {}", a.reasoning);
    assert_eq!(executor.invocations("A"), 0);

    let b = executor.request_for("B").expect("B invoked");
    assert_eq!(b.dependency_outputs.get("A"), Some(&json!({"from": "earlier run"})));
}

#[tokio::test]
async fn cancellation_skips_undispatched_levels() {
    let executor = Arc::new(ScriptedExecutor::new().on("A", Behavior::Sleep(Duration::from_millis(150))));
    let (graph, plan) = validated(vec![
        AgentNode::new("A"),
        AgentNode::new("B").depends_on("A"),
        AgentNode::new("C").depends_on("B"),
    ]);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = engine_with(executor.clone())
        .build()
        .execute(
            &graph,
            &plan,
            JobInput::new(Value::Null).with_cancellation(token),
        )
        .await
        .expect("run");

    assert!(result.cancelled);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.entry("A").map(|e| e.status), Some(AgentStatus::Success));
    for id in ["B", "C"] {
        let entry = result.entry(id).expect("logged");
        assert_eq!(entry.status, AgentStatus::Skipped);
        assert_eq!(entry.reasoning, CANCELLED_REASONING);
        assert_eq!(executor.invocations(id), 0);
    }
}

#[tokio::test]
async fn job_timeout_cancels_remaining_dispatch() {
    let executor = Arc::new(ScriptedExecutor::new().on("A", Behavior::Sleep(Duration::from_millis(150))));
    let (graph, plan) = validated(vec![AgentNode::new("A"), AgentNode::new("B").depends_on("A")]);

    let result = engine_with(executor.clone())
        .job_timeout(Some(Duration::from_millis(30)))
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert!(result.cancelled);
    assert_eq!(result.entry("B").map(|e| e.reasoning.as_str()), Some(CANCELLED_REASONING));
    assert_eq!(executor.invocations("B"), 0);
}

#[tokio::test]
async fn cancel_level_policy_aborts_unfinished_peers() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .on("bad", Behavior::Fail("broken".into()))
            .on("slow", Behavior::Sleep(Duration::from_secs(5))),
    );
    let (graph, plan) = validated(vec![
        AgentNode::new("bad"),
        AgentNode::new("slow"),
        AgentNode::new("after").depends_on("slow"),
    ]);

    let result = engine_with(executor)
        .failure_policy(FailurePolicy::CancelLevel)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    let slow = result.entry("slow").expect("slow logged");
    assert_eq!(slow.status, AgentStatus::Skipped);
    assert_eq!(slow.caused_by.as_deref(), Some("bad"));
    assert_eq!(
        result.entry("after").and_then(|e| e.caused_by.as_deref()),
        Some("bad")
    );
    assert!(result.duration_ms < 5_000);
}

#[tokio::test]
async fn drain_level_policy_lets_peers_finish() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .on("bad", Behavior::Fail("broken".into()))
            .on("slow", Behavior::Sleep(Duration::from_millis(50))),
    );
    let (graph, plan) = validated(vec![AgentNode::new("bad"), AgentNode::new("slow")]);

    let result = engine_with(executor)
        .failure_policy(FailurePolicy::DrainLevel)
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(result.entry("slow").map(|e| e.status), Some(AgentStatus::Success));
    assert_eq!(result.status, JobStatus::Failed);
}

#[tokio::test]
async fn queued_peers_are_not_dispatched_after_a_failure() {
    for policy in [FailurePolicy::DrainLevel, FailurePolicy::CancelLevel] {
        let executor =
            Arc::new(ScriptedExecutor::new().on("a", Behavior::Fail("broken".into())));
        let (graph, plan) = validated(vec![AgentNode::new("a"), AgentNode::new("b")]);

        let result = engine_with(executor.clone())
            .max_concurrency(1)
            .failure_policy(policy)
            .build()
            .execute(&graph, &plan, JobInput::new(Value::Null))
            .await
            .expect("run");

        let b = result.entry("b").expect("b logged");
        assert_eq!(b.status, AgentStatus::Skipped, "{policy:?}");
        assert_eq!(b.caused_by.as_deref(), Some("a"), "{policy:?}");
        assert_eq!(executor.invocations("b"), 0, "{policy:?}");
    }
}

#[tokio::test]
async fn publisher_sees_full_status_sequence() {
    let executor = Arc::new(ScriptedExecutor::new().on("B", Behavior::Fail("no".into())));
    let publisher = Arc::new(RecordingPublisher::new());
    let (graph, plan) = validated(vec![
        AgentNode::new("A"),
        AgentNode::new("B").depends_on("A"),
        AgentNode::new("C").depends_on("B"),
    ]);

    engine_with(executor)
        .publisher(publisher.clone())
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(publisher.phases_of("A"), vec![AgentPhase::Invoking, AgentPhase::Success]);
    assert_eq!(publisher.phases_of("B"), vec![AgentPhase::Invoking, AgentPhase::Error]);
    assert_eq!(publisher.phases_of("C"), vec![AgentPhase::Skipped]);

    let events = publisher.events();
    assert!(matches!(events.first(), Some(StatusEvent::JobStarted { total_agents: 3, .. })));
    assert!(matches!(
        events.last(),
        Some(StatusEvent::JobFinished { status: JobStatus::Failed, .. })
    ));
}

#[tokio::test]
async fn broken_publishers_never_abort_the_job() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(diamond());

    let result = engine_with(executor)
        .publisher(Arc::new(RecordingPublisher::failing()))
        .publisher(Arc::new(RecordingPublisher::panicking()))
        .build()
        .execute(&graph, &plan, JobInput::new(Value::Null))
        .await
        .expect("run");

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.count(AgentStatus::Success), 4);
}

#[tokio::test]
async fn job_input_reaches_every_agent() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (graph, plan) = validated(vec![AgentNode::new("A"), AgentNode::new("B").depends_on("A")]);

    let result = engine_with(executor.clone())
        .build()
        .execute(
            &graph,
            &plan,
            JobInput::new(json!({"ticket": 42})).with_job_id("job-42"),
        )
        .await
        .expect("run");

    assert_eq!(result.job_id, "job-42");
    for id in ["A", "B"] {
        let request = executor.request_for(id).expect("invoked");
        assert_eq!(request.job_id, "job-42");
        assert_eq!(*request.job_input, json!({"ticket": 42}));
    }
    assert_eq!(result.levels, vec![vec!["A".to_string()], vec!["B".to_string()]]);
}
