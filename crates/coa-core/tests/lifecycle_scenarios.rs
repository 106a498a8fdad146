//! End-to-end scenarios for the artifact lifecycle.
//!
//! Each test drives several crates together: the registry merge rule, the
//! detectors behind the pipeline, and injection through the query service.

use chrono::{Duration, Utc};
use coa_artifact::{render_references, ArtifactType};
use coa_core::{
    ArtifactConfig, ArtifactLifecycle, InjectionMode, RegisterArtifactRequest, TaskScope,
};
use coa_detection::{DetectionConfig, DetectionPipeline, Producer};
use coa_test_utils::{artifact, artifact_at, registry_with, TestExecution};
use pretty_assertions::assert_eq;

/// Path identity: a later registration of the same path keeps the id and
/// takes the newer fields.
#[tokio::test]
async fn same_path_merges_into_original_id() {
    let t0 = Utc::now();
    let first = artifact_at("/exec/data.csv", "t1", ArtifactType::DataFetch, t0);
    let mut second = artifact_at(
        "/exec/data.csv",
        "t1",
        ArtifactType::DataFetch,
        t0 + Duration::seconds(1),
    );
    second.name = "renamed".to_string();

    let registry = registry_with(vec![first.clone()]).await;
    let stored = registry.register(second).await;

    assert_eq!(stored.id, first.id);
    assert_eq!(stored.name, "renamed");
    assert_eq!(registry.len().await, 1);
}

/// A markdown declaration of an existing file registers exactly one artifact
/// with the declared type and description, with markup characters in the
/// file name taken literally.
#[tokio::test]
async fn markdown_declaration_registers_report() {
    let exec = TestExecution::default();
    exec.write("out_final.txt", "decoy");
    let out = exec.write("__out_final__.txt", "result");
    let pipeline = DetectionPipeline::default();

    let text = format!(
        "Done.\n\n## ARTIFACT: X\n- path: {}\n- type: report\n- description: D\n",
        out.display()
    );
    let report = pipeline
        .on_generated_text(Some(&exec.ctx), &Producer::new("t1", "writer"), &text)
        .await;

    assert_eq!(report.count(), 1);
    let stored = exec.registry().get_by_path(&out).await.unwrap();
    assert_eq!(stored.artifact_type, ArtifactType::Report);
    assert_eq!(stored.description(), "D");
    assert_eq!(stored.name, "X");
    assert_eq!(exec.registry().len().await, 1);
}

/// Hidden files, bytecode and backups are ignored by the filesystem scan.
#[tokio::test]
async fn filesystem_scan_ignores_noise() {
    let exec = TestExecution::default();
    exec.write("keep.txt", "k");
    exec.write(".hidden", "h");
    exec.write("cache.pyc", "c");
    exec.write("old.bak", "o");
    exec.write("__pycache__/mod.txt", "m");

    let report = DetectionPipeline::default()
        .on_execution_complete(Some(&exec.ctx), &Producer::new("t1", "m"))
        .await;

    let names: Vec<_> = report.registered.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["keep.txt"]);
}

/// Scanning an unchanged directory twice registers each file once.
#[tokio::test]
async fn filesystem_scan_is_idempotent() {
    let exec = TestExecution::default();
    exec.write("a.md", "# a");
    exec.write("sub/b.csv", "x\n1\n");
    let pipeline = DetectionPipeline::default();
    let producer = Producer::new("t1", "m");

    let first = pipeline.on_execution_complete(Some(&exec.ctx), &producer).await;
    let second = pipeline.on_execution_complete(Some(&exec.ctx), &producer).await;

    assert_eq!(first.count(), 2);
    assert_eq!(second.count(), 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(exec.registry().len().await, 2);
}

/// Files written before the execution started are only caught with a buffer.
#[tokio::test]
async fn filesystem_buffer_widens_window() {
    let exec = TestExecution::new(-30);
    exec.write("setup.json", "{}");
    let producer = Producer::new("t1", "m");

    let strict = DetectionPipeline::default()
        .on_execution_complete(Some(&exec.ctx), &producer)
        .await;
    assert!(strict.is_empty());

    let buffered = DetectionPipeline::new(
        DetectionConfig::default().with_filesystem_buffer(std::time::Duration::from_secs(120)),
    )
    .on_execution_complete(Some(&exec.ctx), &producer)
    .await;
    assert_eq!(buffered.count(), 1);
}

/// Stats count artifacts, distinct tasks and types.
#[tokio::test]
async fn stats_over_two_tasks() {
    let now = Utc::now();
    let registry = registry_with(vec![
        artifact_at("/exec/a.csv", "t1", ArtifactType::DataFetch, now),
        artifact_at("/exec/b.csv", "t2", ArtifactType::DataFetch, now),
    ])
    .await;

    let stats = registry.get_stats().await;
    assert_eq!(stats.total_artifacts, 2);
    assert_eq!(stats.unique_tasks, 2);
    assert_eq!(stats.count_of_type("data_fetch"), 2);
}

/// Mode `none` shows nothing and `dependencies` never duplicates.
#[tokio::test]
async fn injection_modes_over_shared_registry() {
    let registry = registry_with(vec![
        artifact("/exec/prices.csv", "fetch"),
        artifact("/exec/notes.md", "review"),
    ])
    .await;
    let deps = vec!["fetch".to_string(), "fetch".to_string(), "review".to_string()];
    let scope = TaskScope::new("analyze").with_dependencies(&deps);

    let none = ArtifactLifecycle::with_registry(
        ArtifactConfig::new().with_injection_mode(InjectionMode::None),
        registry.clone(),
    );
    assert!(none.references_for(scope).await.is_empty());
    assert!(none.context_block(scope).await.is_empty());

    let dependencies = ArtifactLifecycle::with_registry(ArtifactConfig::default(), registry);
    let refs = dependencies.references_for(scope).await;
    assert_eq!(refs.len(), 2);

    let block = render_references(&refs);
    assert!(block.starts_with("<artifacts>\n<artifact "));
    assert!(block.ends_with("</artifacts>"));
}

/// Explicit registration reports validation failures and merges on re-use.
#[tokio::test]
async fn explicit_registration_round() {
    let exec = TestExecution::default();
    let lifecycle = ArtifactLifecycle::with_registry(ArtifactConfig::default(), exec.registry().clone());
    let producer = Producer::new("t1", "register_artifact");
    exec.write("final.md", "# final");

    let bad = RegisterArtifactRequest::new("final.md", "Final", "memo", "d");
    assert!(lifecycle.register(&exec.ctx, &producer, &bad).await.is_err());

    let good = RegisterArtifactRequest::new("final.md", "Final", "report", "the final report");
    let stored = lifecycle.register(&exec.ctx, &producer, &good).await.unwrap();
    assert_eq!(stored.artifact_type, ArtifactType::Report);

    let report = lifecycle
        .pipeline()
        .on_execution_complete(Some(&exec.ctx), &producer)
        .await;
    assert_eq!(report.count(), 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        exec.registry().get_by_id(&stored.id).await.unwrap().description(),
        "the final report"
    );
}
