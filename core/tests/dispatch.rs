mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{harness, payload, workspace, HarnessOptions};
use sitegen_core::api::{ItemOutcome, TaskError, TaskStatus, TaskSummary};
use sitegen_core::config::site;

#[tokio::test]
async fn unsupported_method_touches_nothing() {
    let ws = workspace();
    std::fs::write(ws.dir.join("_config.yml"), "title: keep\n").unwrap();
    let before = ws.snapshot();

    let h = harness(
        &ws,
        Some(payload("HEXO_DEPLOY_EVERYTHING", Some(json!({ "title": "x" })))),
        HarnessOptions::default(),
    );
    let err = h.dispatcher.run().await.unwrap_err();

    assert!(matches!(err, TaskError::UnsupportedTask(_)));
    assert_eq!(ws.snapshot(), before);
    assert!(h.events.all().is_empty());
}

#[tokio::test]
async fn no_task_is_a_fetch_error() {
    let ws = workspace();
    let h = harness(&ws, None, HarnessOptions::default());
    let err = h.dispatcher.run().await.unwrap_err();
    assert!(matches!(err, TaskError::TaskFetch(_)));
    assert!(!err.should_report());
}

#[tokio::test]
async fn missing_workspace_fails_before_any_step() {
    let ws = workspace();
    std::fs::remove_dir_all(&ws.dir).unwrap();

    let h = harness(&ws, Some(payload("HEXO_UPDATE_CONFIG", None)), HarnessOptions::default());
    let err = h.dispatcher.run().await.unwrap_err();

    assert!(matches!(err, TaskError::WorkspaceMissing(ref p) if p == &ws.dir));
    assert!(h.events.all().is_empty());
}

#[tokio::test]
async fn config_task_merges_before_install_and_init() {
    let ws = workspace();
    let h = harness(&ws, Some(payload("HEXO_UPDATE_CONFIG", None)), HarnessOptions::default());

    let outcome = h.dispatcher.run().await.unwrap();

    assert_eq!(
        h.events.all(),
        vec![
            "report:STARTED",
            "exec:npm ci",
            "init:with-config",
            "ready:dir",
            "exit:-",
            "report:FINISHED",
        ]
    );
    assert!(matches!(outcome.summary, TaskSummary::Config { .. }));

    let conf = site::parse(&std::fs::read_to_string(ws.dir.join("_config.yml")).unwrap()).unwrap();
    assert_eq!(conf["title"], "My Blog");
    assert_eq!(conf["author"], "Alice");
    assert_eq!(conf["url"], "https://blog.example.com");
    assert_eq!(conf["theme"], "landscape");
    assert_eq!(conf["language"], "en");
    assert_eq!(conf["per_page"], 20);
    assert_eq!(conf["source_dir"], "source");
}

#[tokio::test]
async fn existing_config_keeps_its_own_values() {
    let ws = workspace();
    std::fs::write(
        ws.dir.join("_config.yml"),
        "per_page: 5\ntitle: Old\ncustom_key: stays\n",
    )
    .unwrap();
    let h = harness(&ws, Some(payload("HEXO_UPDATE_CONFIG", None)), HarnessOptions::default());

    h.dispatcher.run().await.unwrap();

    let conf = site::parse(&std::fs::read_to_string(ws.dir.join("_config.yml")).unwrap()).unwrap();
    assert_eq!(conf["per_page"], 5);
    assert_eq!(conf["title"], "My Blog");
    assert_eq!(conf["custom_key"], "stays");
    let keys: Vec<&str> = conf.keys().take(3).map(String::as_str).collect();
    assert_eq!(keys, vec!["per_page", "title", "custom_key"]);
}

#[tokio::test]
async fn yarn_lockfile_switches_install_command() {
    let ws = workspace();
    std::fs::write(ws.dir.join("yarn.lock"), "").unwrap();
    let h = harness(
        &ws,
        Some(payload("HEXO_CREATE_POST", Some(json!({ "title": "A", "source": "a" })))),
        HarnessOptions::default(),
    );

    h.dispatcher.run().await.unwrap();
    assert!(h
        .events
        .all()
        .contains(&"exec:yarn install --production=false --frozen-lockfile".to_string()));
}

#[tokio::test]
async fn failed_install_stops_before_engine_init() {
    let ws = workspace();
    let h = harness(
        &ws,
        Some(payload("HEXO_CREATE_POST", Some(json!({ "title": "A", "source": "a" })))),
        HarnessOptions {
            fail_command: Some("npm ci".into()),
            ..Default::default()
        },
    );

    let err = h.dispatcher.run().await.unwrap_err();
    assert!(matches!(err, TaskError::Process(ref p) if p.command == "npm ci" && p.code == Some(1)));
    assert_eq!(h.events.position("init:"), None);
    assert_eq!(h.events.position("report:FINISHED"), None);
}

#[tokio::test]
async fn generate_failure_exits_engine_and_skips_finished() {
    let ws = workspace();
    let h = harness(
        &ws,
        Some(payload("HEXO_GENERATE_DEPLOY", None)),
        HarnessOptions {
            fail_generate: true,
            ..Default::default()
        },
    );

    let err = h.dispatcher.run().await.unwrap_err();
    assert!(matches!(err, TaskError::GenerationEngine(ref m) if m.contains("render failed")));

    let events = h.events.all();
    let exits: Vec<_> = events.iter().filter(|e| e.starts_with("exit:")).collect();
    assert_eq!(exits.len(), 1);
    assert!(exits[0].contains("render failed"));
    assert_eq!(h.events.position("report:FINISHED"), None);
}

#[tokio::test]
async fn generate_reports_item_count() {
    let ws = workspace();
    let posts = ws.site().post_dir();
    std::fs::create_dir_all(&posts).unwrap();
    std::fs::write(posts.join("one.md"), "").unwrap();
    std::fs::write(posts.join("two.md"), "").unwrap();
    let h = harness(&ws, Some(payload("HEXO_GENERATE_DEPLOY", None)), HarnessOptions::default());

    let outcome = h.dispatcher.run().await.unwrap();

    assert!(matches!(outcome.summary, TaskSummary::Generate { items: 2, .. }));
    let events = h.events.all();
    let started = events.iter().position(|e| e == "generate-started:2").unwrap();
    let generated = events.iter().position(|e| e == "generate").unwrap();
    assert!(started < generated);
}

#[tokio::test]
async fn rename_leaves_only_the_new_file() {
    let ws = workspace();
    let site = ws.site();
    let h = harness(
        &ws,
        Some(payload(
            "HEXO_CREATE_POST",
            Some(json!({ "title": "A", "source": "original body" })),
        )),
        HarnessOptions::default(),
    );
    h.dispatcher.run().await.unwrap();
    assert!(site.post_dir().join("A.md").exists());

    let h = harness(
        &ws,
        Some(payload(
            "HEXO_UPDATE_POST",
            Some(json!({ "title": "A", "source": "original body", "rename": { "newTitle": "B" } })),
        )),
        HarnessOptions::default(),
    );
    h.dispatcher.run().await.unwrap();

    let files: Vec<_> = std::fs::read_dir(site.post_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files, vec!["B.md"]);
    let text = std::fs::read_to_string(site.post_dir().join("B.md")).unwrap();
    assert!(text.contains("title: B"));
    assert_eq!(text.matches("original body").count(), 1);
}

#[tokio::test]
async fn deleting_a_missing_post_succeeds() {
    let ws = workspace();
    let h = harness(
        &ws,
        Some(payload("HEXO_DELETE_POST", Some(json!({ "title": "Gone" })))),
        HarnessOptions::default(),
    );

    let outcome = h.dispatcher.run().await.unwrap();

    let TaskSummary::Content(report) = outcome.summary else {
        panic!("expected a content summary");
    };
    assert!(matches!(report.items[0].outcome, ItemOutcome::Skipped { .. }));
    assert!(h.events.position("report:FINISHED").is_some());
}

#[tokio::test]
async fn batch_with_one_failure_keeps_the_others() {
    let ws = workspace();
    let site = ws.site();
    std::fs::create_dir_all(site.draft_dir()).unwrap();
    std::fs::write(site.draft_dir().join("One.md"), "---\ntitle: One\n---\nfirst\n").unwrap();
    std::fs::write(site.draft_dir().join("Three.md"), "---\ntitle: Three\n---\nthird\n").unwrap();

    let h = harness(
        &ws,
        Some(payload(
            "HEXO_PUBLISH_DRAFT",
            Some(json!([{ "title": "One" }, { "title": "Two" }, { "title": "Three" }])),
        )),
        HarnessOptions::default(),
    );
    let outcome = h.dispatcher.run().await.unwrap();

    let TaskSummary::Content(report) = outcome.summary else {
        panic!("expected a content summary");
    };
    assert_eq!((report.total, report.succeeded, report.failed), (3, 2, 1));
    assert_eq!(report.failures().next().unwrap().title, "Two");
    assert!(site.post_dir().join("One.md").exists());
    assert!(site.post_dir().join("Three.md").exists());

    let finished = h.reporter.reports.lock().unwrap().last().cloned().unwrap();
    assert_eq!(finished.status, TaskStatus::Finished);
    assert_eq!(finished.data.unwrap()["failed"], 1);
}

#[tokio::test]
async fn escalated_batch_fails_the_task() {
    let ws = workspace();
    let mut config = sitegen_core::api::WorkerConfig::default();
    config.content.batch_failure = sitegen_core::api::BatchFailureMode::Escalate;
    let h = harness(
        &ws,
        Some(payload(
            "HEXO_PUBLISH_DRAFT",
            Some(json!([{ "title": "Missing" }, { "title": "AlsoMissing" }])),
        )),
        HarnessOptions {
            config: Some(config),
            ..Default::default()
        },
    );

    let err = h.dispatcher.run().await.unwrap_err();
    assert!(matches!(err, TaskError::BatchFailed { failed: 2, total: 2 }));
    assert_eq!(h.events.position("report:FINISHED"), None);
    assert_eq!(
        h.events.all().iter().filter(|e| e.starts_with("exit:")).count(),
        1
    );
}

#[tokio::test]
async fn content_task_without_post_is_invalid() {
    let ws = workspace();
    let h = harness(&ws, Some(payload("HEXO_CREATE_DRAFT", None)), HarnessOptions::default());
    let err = h.dispatcher.run().await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidPayload(_)));
    assert!(h.events.all().is_empty());
}
