//! Up-to-date checks across successive executions

mod common;

use common::{config, engine, engine_with, implementation, Project};
use stamp_cache::CachingDisabledReasonCategory;
use stamp_config::EngineConfig;
use stamp_core::{NormalizedPath, TaskIdentity};
use stamp_history::{ExecutionHistoryStore, FileHistoryStore, InMemoryHistoryStore};
use stamp_task::{ExecutionEngine, Task};
use std::sync::Arc;

fn run(engine: &ExecutionEngine, task: &dyn Task, project: &Project) {
    let execution = engine.begin(task).unwrap();
    project.compile();
    execution.commit_success().unwrap();
}

#[test]
fn test_first_second_and_third_run() {
    let project = Project::new();
    let engine = engine(&project);
    let task = project.compile_java();

    let first = engine.is_up_to_date(&task).unwrap();
    assert!(!first.up_to_date);
    assert_eq!(first.out_of_date_messages, vec!["No history is available."]);
    run(&engine, &task, &project);

    let second = engine.is_up_to_date(&task).unwrap();
    assert!(second.up_to_date, "{:?}", second.out_of_date_messages);
    assert!(second.out_of_date_messages.is_empty());

    project.append("src/Foo.java", "\n");
    let third = engine.is_up_to_date(&task).unwrap();
    assert!(!third.up_to_date);
    assert_eq!(
        third.out_of_date_messages,
        vec!["Input property 'sources' file Foo.java has been modified."]
    );
    assert!(third.out_of_date_messages[0].contains("sources"));
}

#[test]
fn test_touching_inputs_keeps_task_up_to_date() {
    let project = Project::new();
    let engine = engine(&project);
    let task = project.compile_java();
    run(&engine, &task, &project);

    let later = filetime::FileTime::from_unix_time(2_000_000_000, 0);
    filetime::set_file_mtime(project.path("src/Foo.java"), later).unwrap();

    assert!(engine.is_up_to_date(&task).unwrap().up_to_date);
}

#[test]
fn test_new_source_file_is_reported() {
    let project = Project::new();
    let engine = engine(&project);
    let task = project.compile_java();
    run(&engine, &task, &project);

    project.write("src/Bar.java", "class Bar {}");
    let result = engine.is_up_to_date(&task).unwrap();
    assert_eq!(
        result.out_of_date_messages,
        vec!["Input property 'sources' file Bar.java has been added."]
    );
}

#[test]
fn test_deleted_output_is_reported() {
    let project = Project::new();
    let engine = engine(&project);
    let task = project.compile_java();
    run(&engine, &task, &project);

    let class_file = project.path("build/classes/Foo.class");
    std::fs::remove_file(&class_file).unwrap();

    let result = engine.is_up_to_date(&task).unwrap();
    assert_eq!(
        result.out_of_date_messages,
        vec![format!(
            "Output property 'classes' file {} has been removed.",
            NormalizedPath::absolute(&class_file)
        )]
    );
}

#[test]
fn test_messages_are_ordered_and_capped() {
    let project = Project::new();
    let engine = engine_with(
        EngineConfig::builder()
            .history_dir(project.path("history"))
            .max_out_of_date_messages(2)
            .build()
            .unwrap(),
        Arc::new(InMemoryHistoryStore::new()),
    );
    let mut task = project.compile_java();
    run(&engine, &task, &project);

    task.implementation = implementation("JavaCompile", "v2");
    task.input_values
        .insert("release".to_string(), serde_json::json!(17));
    project.append("src/Foo.java", "// edited");

    let result = engine.is_up_to_date(&task).unwrap();
    assert_eq!(
        result.out_of_date_messages,
        vec![
            "The implementation of task ':compileJava' has changed.".to_string(),
            "Input property 'release' has been added.".to_string(),
        ]
    );
}

#[test]
fn test_input_value_changes() {
    let project = Project::new();
    let engine = engine(&project);
    let mut task = project.compile_java();
    task.input_values
        .insert("release".to_string(), serde_json::json!(11));
    task.input_values
        .insert("debug".to_string(), serde_json::json!(true));
    run(&engine, &task, &project);

    task.input_values
        .insert("release".to_string(), serde_json::json!(17));
    task.input_values.remove("debug");

    let result = engine.is_up_to_date(&task).unwrap();
    assert_eq!(
        result.out_of_date_messages,
        vec![
            "Input property 'debug' has been removed.".to_string(),
            "Value of input property 'release' has changed.".to_string(),
        ]
    );
}

#[test]
fn test_changed_task_type_is_reported() {
    let project = Project::new();
    let engine = engine(&project);
    let mut task = project.compile_java();
    run(&engine, &task, &project);

    task.implementation = implementation("GroovyCompile", "v1");
    let result = engine.is_up_to_date(&task).unwrap();
    assert_eq!(
        result.out_of_date_messages,
        vec!["Task ':compileJava' has changed type from 'JavaCompile' to 'GroovyCompile'."]
    );
}

#[test]
fn test_unknown_implementation_is_never_up_to_date() {
    let project = Project::new();
    let engine = engine(&project);
    let mut task = project.compile_java();
    task.implementation = stamp_core::ImplementationIdentity::unknown("JavaCompile");
    run(&engine, &task, &project);

    let result = engine.is_up_to_date(&task).unwrap();
    assert!(!result.up_to_date);
    assert_eq!(
        result.out_of_date_messages,
        vec!["The implementation of task ':compileJava' is unknown."]
    );

    let state = engine.caching_state(&task).unwrap();
    assert!(!state.is_enabled());
    assert!(state
        .disabled_reasons()
        .iter()
        .any(|reason| reason.category == CachingDisabledReasonCategory::Unknown));
}

#[test]
fn test_task_without_outputs_is_never_up_to_date() {
    let project = Project::new();
    let engine = engine(&project);
    let mut task = project.compile_java();
    task.outputs.clear();
    run(&engine, &task, &project);

    let result = engine.is_up_to_date(&task).unwrap();
    assert!(!result.up_to_date);
    assert_eq!(
        result.out_of_date_messages,
        vec!["Task ':compileJava' has not declared any outputs."]
    );

    let state = engine.caching_state(&task).unwrap();
    assert_eq!(
        state.disabled_reasons()[0].category,
        CachingDisabledReasonCategory::NoOutputsDeclared
    );
}

#[test]
fn test_dropped_execution_leaves_history_untouched() {
    let project = Project::new();
    let history = Arc::new(InMemoryHistoryStore::new());
    let engine = engine_with(config(&project.path("history")), history.clone());
    let task = project.compile_java();

    let execution = engine.begin(&task).unwrap();
    project.compile();
    drop(execution);
    assert!(history.is_empty());

    engine.begin(&task).unwrap().discard();
    assert!(history.is_empty());
    assert!(!engine.is_up_to_date(&task).unwrap().up_to_date);
}

#[test]
fn test_forget_removes_history() {
    let project = Project::new();
    let engine = engine(&project);
    let task = project.compile_java();
    run(&engine, &task, &project);
    assert!(engine.is_up_to_date(&task).unwrap().up_to_date);

    engine.forget(&task.identity()).unwrap();
    assert_eq!(
        engine.is_up_to_date(&task).unwrap().out_of_date_messages,
        vec!["No history is available."]
    );
}

#[test]
fn test_history_from_other_algorithm_is_ignored() {
    let project = Project::new();
    let history: Arc<InMemoryHistoryStore> = Arc::new(InMemoryHistoryStore::new());
    let sha = engine_with(config(&project.path("history")), history.clone());
    let task = project.compile_java();
    run(&sha, &task, &project);
    assert!(sha.is_up_to_date(&task).unwrap().up_to_date);

    let xxh = engine_with(
        EngineConfig::builder()
            .history_dir(project.path("history"))
            .hash_algorithm("xxh3-128")
            .build()
            .unwrap(),
        history,
    );
    assert_eq!(
        xxh.is_up_to_date(&task).unwrap().out_of_date_messages,
        vec!["No history is available."]
    );
}

#[test]
fn test_file_history_survives_engine_restart() {
    let project = Project::new();
    let task = project.compile_java();
    {
        let engine = ExecutionEngine::with_file_history(config(&project.path("history"))).unwrap();
        run(&engine, &task, &project);
    }

    let store = FileHistoryStore::new(project.path("history"));
    assert!(store.record_path(&TaskIdentity::new(":compileJava")).is_file());
    assert!(store.load(&task.identity()).is_some());

    let engine = ExecutionEngine::with_file_history(config(&project.path("history"))).unwrap();
    assert!(engine.is_up_to_date(&task).unwrap().up_to_date);
}

#[test]
fn test_parallel_tasks_share_one_engine() {
    let projects: Vec<Project> = (0..4).map(|_| Project::new()).collect();
    let engine = engine(&projects[0]);
    let tasks: Vec<_> = projects
        .iter()
        .enumerate()
        .map(|(i, project)| {
            let mut task = project.compile_java();
            task.identity = TaskIdentity::new(format!(":module{i}:compileJava"));
            task
        })
        .collect();

    std::thread::scope(|scope| {
        for (task, project) in tasks.iter().zip(&projects) {
            let engine = &engine;
            scope.spawn(move || run(engine, task, project));
        }
    });

    for task in &tasks {
        assert!(engine.is_up_to_date(task).unwrap().up_to_date);
    }
}
