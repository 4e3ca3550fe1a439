//! Tests for agent/task construction and pipeline ordering.

use super::*;
use crate::error::CrewError;
use crate::test_support::flow_docs;

fn build(agents: &str, tasks: &str) -> crate::error::Result<ResolvedPipeline> {
    let docs = flow_docs("demo", agents, tasks);
    build_pipeline(&docs, &CapabilityRegistry::builtin())
}

fn context_keys(pipeline: &ResolvedPipeline, key: &str) -> Vec<String> {
    let task = pipeline.find_task(key).unwrap();
    pipeline
        .context_of(task)
        .map(|t| t.key.clone())
        .collect()
}

fn order_keys(pipeline: &ResolvedPipeline) -> Vec<String> {
    pipeline
        .execution_order()
        .iter()
        .map(|id| pipeline.task(*id).key.clone())
        .collect()
}

#[test]
fn test_single_task_bound_to_reviewer() {
    let pipeline = build(
        "reviewer:\n  role: Reviewer\n",
        "t1:\n  description: Hello\n  agent: reviewer\n",
    )
    .unwrap();

    assert_eq!(pipeline.tasks().len(), 1);
    let task = &pipeline.tasks()[0];
    assert_eq!(task.description, "Hello");
    assert_eq!(pipeline.agent_for(task).key, "reviewer");
    assert!(task.context.is_empty());
}

#[test]
fn test_forward_context_reference_resolves() {
    let agents = "A:\n  role: Alpha\nB:\n  role: Beta\n";
    let tasks = r#"
t2:
  agent: B
  context: [t1]
t1:
  agent: A
"#;
    let pipeline = build(agents, tasks).unwrap();

    let declared: Vec<_> = pipeline.tasks().iter().map(|t| t.key.as_str()).collect();
    assert_eq!(declared, vec!["t2", "t1"]);
    assert_eq!(context_keys(&pipeline, "t2"), vec!["t1"]);
    assert_eq!(order_keys(&pipeline), vec!["t1", "t2"]);
}

#[test]
fn test_unknown_agent_aborts_construction() {
    let err = build(
        "reviewer:\n  role: Reviewer\n",
        "t1:\n  agent: reviewer\nt2:\n  agent: ghost\n",
    )
    .unwrap_err();

    match err {
        CrewError::AgentNotFound {
            task,
            reference,
            available,
        } => {
            assert_eq!(task, "t2");
            assert_eq!(reference, "ghost");
            assert!(available.contains("reviewer"));
        }
        other => panic!("expected AgentNotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_agent_field_is_fatal() {
    let err = build("a:\n  role: A\n", "t1:\n  description: orphan\n").unwrap_err();
    assert!(matches!(err, CrewError::AgentNotFound { .. }));
}

#[test]
fn test_unknown_context_reference_is_dropped() {
    let pipeline = build(
        "a:\n  role: A\n",
        "t1:\n  agent: a\nt2:\n  agent: a\n  context: [t1, nowhere]\n",
    )
    .unwrap();

    assert_eq!(context_keys(&pipeline, "t2"), vec!["t1"]);
}

#[test]
fn test_self_and_duplicate_context_references() {
    let pipeline = build(
        "a:\n  role: A\n",
        "t1:\n  agent: a\nt2:\n  agent: a\n  context: [t2, t1, t1]\n",
    )
    .unwrap();

    assert_eq!(context_keys(&pipeline, "t2"), vec!["t1"]);
}

#[test]
fn test_key_lookup_beats_role_fallback() {
    // "writer" is agent two's key and agent one's role.
    let agents = r#"
first:
  role: writer
writer:
  role: Editor
"#;
    let pipeline = build(agents, "t:\n  agent: writer\n").unwrap();
    assert_eq!(pipeline.agent_for(&pipeline.tasks()[0]).key, "writer");
}

#[test]
fn test_role_fallback_first_declared_wins() {
    let agents = r#"
one:
  role: Analyst
two:
  role: Analyst
"#;
    let pipeline = build(agents, "t:\n  agent: Analyst\n").unwrap();
    assert_eq!(pipeline.agent_for(&pipeline.tasks()[0]).key, "one");
}

#[test]
fn test_agent_alias_lookup() {
    let agents = "researcher:\n  role: Researcher\n  name: scout\n";
    let pipeline = build(agents, "t:\n  agent: scout\n").unwrap();
    assert_eq!(pipeline.agent_for(&pipeline.tasks()[0]).key, "researcher");
}

#[test]
fn test_agent_alias_never_shadows_key() {
    let agents = r#"
alpha:
  role: A
  name: beta
beta:
  role: B
"#;
    let pipeline = build(agents, "t:\n  agent: beta\n").unwrap();
    assert_eq!(pipeline.agent_for(&pipeline.tasks()[0]).key, "beta");
}

#[test]
fn test_duplicate_agent_key_in_list_document() {
    let agents = "- role: Writer\n- role: Writer\n";
    let err = build(agents, "t:\n  agent: Writer\n").unwrap_err();

    match err {
        CrewError::DuplicateKey { kind, key, .. } => {
            assert_eq!(kind, "agent");
            assert_eq!(key, "Writer");
        }
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
}

#[test]
fn test_task_name_alias_in_context() {
    let pipeline = build(
        "a:\n  role: A\n",
        "research:\n  name: findings\n  agent: a\nreport:\n  agent: a\n  context: [findings]\n",
    )
    .unwrap();

    assert_eq!(context_keys(&pipeline, "report"), vec!["research"]);
}

#[test]
fn test_list_and_mapping_documents_build_same_graph() {
    let mapping = build(
        "Writer:\n  role: Writer\n",
        "task_0:\n  agent: Writer\ntask_1:\n  agent: Writer\n  context: [task_0]\n",
    )
    .unwrap();
    let list = build(
        "- role: Writer\n",
        "- agent: Writer\n- agent: Writer\n  context: [task_0]\n",
    )
    .unwrap();

    assert_eq!(mapping.tasks(), list.tasks());
    assert_eq!(mapping.agents(), list.agents());
}

#[test]
fn test_unknown_tool_dropped_agent_kept() {
    let agents = "a:\n  role: A\n  tools: [web_search, telepathy, search]\n";
    let pipeline = build(agents, "t:\n  agent: a\n").unwrap();

    let tools: Vec<_> = pipeline.agents()[0]
        .tools
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(tools, vec!["web_search"]);
}

#[test]
fn test_context_cycle_rejected() {
    let err = build(
        "a:\n  role: A\n",
        "x:\n  agent: a\n  context: [y]\ny:\n  agent: a\n  context: [x]\n",
    )
    .unwrap_err();

    match err {
        CrewError::ContextCycle { tasks } => {
            assert_eq!(tasks.first(), tasks.last());
            assert!(tasks.contains(&"x".to_string()));
            assert!(tasks.contains(&"y".to_string()));
        }
        other => panic!("expected ContextCycle, got {:?}", other),
    }
}

#[test]
fn test_execution_order_is_stable_topological() {
    let tasks = r#"
report:
  agent: a
  context: [analysis, notes]
notes:
  agent: a
analysis:
  agent: a
  context: [research]
research:
  agent: a
"#;
    let pipeline = build("a:\n  role: A\n", tasks).unwrap();
    assert_eq!(
        order_keys(&pipeline),
        vec!["notes", "research", "analysis", "report"]
    );
}

#[test]
fn test_execution_order_matches_declaration_when_already_ordered() {
    let tasks = "one:\n  agent: a\ntwo:\n  agent: a\n  context: [one]\nthree:\n  agent: a\n";
    let pipeline = build("a:\n  role: A\n", tasks).unwrap();
    assert_eq!(order_keys(&pipeline), vec!["one", "two", "three"]);
}

#[test]
fn test_async_flag_passed_through() {
    let pipeline = build(
        "a:\n  role: A\n",
        "t1:\n  agent: a\n  async_execution: true\nt2:\n  agent: a\n",
    )
    .unwrap();

    assert!(pipeline.tasks()[0].async_execution);
    assert!(!pipeline.tasks()[1].async_execution);
}

#[test]
fn test_flow_without_tasks_is_config_error() {
    let err = build("a:\n  role: A\n", "").unwrap_err();
    assert!(matches!(err, CrewError::Config(_)));
}

#[test]
fn test_placeholders_collected_from_descriptions() {
    let pipeline = build(
        "a:\n  role: A\n",
        "t1:\n  agent: a\n  description: \"Study {business_description} in {{braces}}\"\nt2:\n  agent: a\n  description: \"Compare with { region }\"\n",
    )
    .unwrap();

    let names: Vec<_> = pipeline.placeholders().into_iter().collect();
    assert_eq!(names, vec!["business_description", "region"]);
}

#[test]
fn test_render_plan_lists_tasks_in_order() {
    let pipeline = build(
        "rev:\n  role: Reviewer\n  llm: gemini/gemini-1.5-pro\n",
        "b:\n  agent: rev\n  context: [a]\na:\n  agent: rev\n  async_execution: true\n",
    )
    .unwrap();

    let plan = pipeline.render_plan();
    assert!(plan.contains("# Plan: demo"));
    assert!(plan.contains("gemini/gemini-1.5-pro"));
    let a_pos = plan.find("**a** -> rev [async]").unwrap();
    let b_pos = plan.find("**b** -> rev").unwrap();
    assert!(a_pos < b_pos);
    assert!(plan.contains("context: a"));
}
