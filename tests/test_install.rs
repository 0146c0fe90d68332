mod common;

use common::{write_command, write_skill, Answer, FakeFetcher, Sandbox, ScriptedPrompter};
use flins::commands::install::{self, InstallOptions};
use flins::commands::Outcome;
use flins::error::FlinsError;
use flins::state::{Scope, UnitKey};
use std::fs;
use tempfile::TempDir;

const SOURCE: &str = "acme/skills";
const URL: &str = "https://github.com/acme/skills.git";

fn repo() -> TempDir {
    let repo = TempDir::new().unwrap();
    write_skill(repo.path(), "skills/alpha", "alpha", "First skill");
    write_skill(repo.path(), "skills/beta", "beta", "Second skill");
    repo
}

fn options(agents: &[&str]) -> InstallOptions {
    InstallOptions {
        global: None,
        agents: agents.iter().map(|a| a.to_string()).collect(),
        units: Vec::new(),
        list: false,
        yes: true,
        symlink: true,
    }
}

fn completed<T>(outcome: Outcome<T>) -> T {
    outcome.completed().expect("command was cancelled")
}

#[tokio::test]
async fn test_install_tracks_every_unit_in_project_lockfile() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "c0ffee0000000000000000000000000000000001");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::default();

    let report = completed(
        install::execute(&ctx, &fetcher, &prompter, SOURCE, &options(&["claude-code", "cursor"]))
            .await
            .unwrap(),
    );

    assert!(report.is_success());
    assert_eq!(report.installed(), 4);
    assert_eq!(report.scope, Some(Scope::Project));
    assert!(sandbox.project(".claude/skills/alpha/SKILL.md").is_file());
    assert!(sandbox.project(".cursor/skills/beta/SKILL.md").is_file());
    // Symlink mode keeps one copy in the project store
    assert!(fs::symlink_metadata(sandbox.project(".claude/skills/alpha"))
        .unwrap()
        .file_type()
        .is_symlink());
    assert!(sandbox.project(".flins/skills/alpha/SKILL.md").is_file());

    let entry = ctx
        .store(Scope::Project)
        .get(&UnitKey::skill("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.url, URL);
    assert_eq!(entry.branch, "main");
    assert_eq!(entry.commit, "c0ffee0000000000000000000000000000000001");
    assert!(prompter.asked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reinstall_is_idempotent() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "1111111");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::default();
    let opts = options(&["claude-code"]);

    completed(install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts).await.unwrap());
    let first = fs::read_to_string(ctx.store(Scope::Project).path()).unwrap();
    let report =
        completed(install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts).await.unwrap());
    let second = fs::read_to_string(ctx.store(Scope::Project).path()).unwrap();

    assert!(report.is_success());
    assert!(report.branch_changes.is_empty());
    assert_eq!(first, second);
    assert_eq!(ctx.store(Scope::Project).entries().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_agent_does_not_stop_the_batch() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "2222222");
    // A file where cursor's directory should be
    fs::write(sandbox.project(".cursor"), "not a directory").unwrap();
    let ctx = sandbox.context();

    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code", "cursor"]),
        )
        .await
        .unwrap(),
    );

    assert!(!report.is_success());
    assert_eq!(report.installed(), 2);
    assert_eq!(report.failed(), 2);
    assert!(report
        .results
        .iter()
        .filter(|r| !r.outcome.success)
        .all(|r| r.agent == "cursor" && r.outcome.error.is_some()));
    // Installed for claude-code, so still tracked
    assert!(ctx
        .store(Scope::Project)
        .get(&UnitKey::skill("alpha"))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_unit_that_failed_everywhere_is_not_tracked() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "2222222");
    fs::write(sandbox.project(".claude"), "not a directory").unwrap();
    let ctx = sandbox.context();

    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code"]),
        )
        .await
        .unwrap(),
    );

    assert!(!report.is_success());
    assert_eq!(report.installed(), 0);
    assert_eq!(report.failed(), 2);
    assert!(report.untracked.is_empty());
    assert!(!ctx.store(Scope::Project).exists());
}

#[tokio::test]
async fn test_lockfile_write_failure_is_reported_per_unit() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "2222222");
    // A directory where the project lockfile should be written
    fs::create_dir_all(sandbox.project("skills.lock")).unwrap();
    let ctx = sandbox.context();

    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code"]),
        )
        .await
        .unwrap(),
    );

    assert!(!report.is_success());
    assert_eq!(report.installed(), 2);
    assert_eq!(report.failed(), 0);
    let untracked: Vec<&str> = report.untracked.iter().map(|f| f.unit.as_str()).collect();
    assert_eq!(untracked, vec!["alpha", "beta"]);
    assert!(sandbox.project(".claude/skills/alpha/SKILL.md").is_file());
    assert!(sandbox.project(".claude/skills/beta/SKILL.md").is_file());
}

#[tokio::test]
async fn test_manifest_name_cannot_reach_outside_agent_dir() {
    let sandbox = Sandbox::new();
    let repo = repo();
    write_skill(repo.path(), "skills/evil", "../../victim", "Escapes");
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "2222222");
    fs::create_dir_all(sandbox.project("victim")).unwrap();
    fs::write(sandbox.project("victim/important.txt"), "keep me").unwrap();
    let ctx = sandbox.context();

    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code"]),
        )
        .await
        .unwrap(),
    );

    assert!(report.is_success());
    let mut installed: Vec<&str> = report.results.iter().map(|r| r.unit.as_str()).collect();
    installed.sort();
    assert_eq!(installed, vec!["alpha", "beta"]);
    assert_eq!(
        fs::read_to_string(sandbox.project("victim/important.txt")).unwrap(),
        "keep me"
    );
}

#[tokio::test]
async fn test_copy_mode_writes_real_directories() {
    let sandbox = Sandbox::new();
    let repo = repo();
    fs::write(repo.path().join("skills/alpha/README.md"), "docs").unwrap();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "3333333");
    let ctx = sandbox.context();
    let mut opts = options(&["codex"]);
    opts.symlink = false;
    opts.global = Some(true);

    let report = completed(
        install::execute(&ctx, &fetcher, &ScriptedPrompter::default(), SOURCE, &opts)
            .await
            .unwrap(),
    );

    assert_eq!(report.scope, Some(Scope::Global));
    let target = sandbox.global(".codex/skills/alpha");
    assert!(!fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
    assert!(target.join("SKILL.md").is_file());
    assert!(!target.join("README.md").exists());
    assert!(!sandbox.global(".flins/skills/alpha").exists());
    assert!(ctx
        .store(Scope::Global)
        .get(&UnitKey::skill("alpha"))
        .unwrap()
        .is_some());
    assert!(!ctx.store(Scope::Project).exists());
}

#[tokio::test]
async fn test_branch_change_is_reported() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "4444444");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::default();
    let opts = options(&["claude-code"]);

    completed(install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts).await.unwrap());
    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &prompter,
            "https://github.com/acme/skills/tree/dev",
            &opts,
        )
        .await
        .unwrap(),
    );

    assert_eq!(report.branch_changes.len(), 2);
    assert_eq!(report.branch_changes[0].previous, "main");
    assert_eq!(report.branch_changes[0].current, "dev");
    let entry = ctx
        .store(Scope::Project)
        .get(&UnitKey::skill("beta"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.branch, "dev");
    assert_eq!(
        fetcher.clones.lock().unwrap().last().cloned(),
        Some((URL.to_string(), Some("dev".to_string())))
    );
}

#[tokio::test]
async fn test_checked_out_branch_is_recorded() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "5555555");
    fetcher.set_default_branch(repo.path(), "trunk");
    let ctx = sandbox.context();

    completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code"]),
        )
        .await
        .unwrap(),
    );

    let entry = ctx
        .store(Scope::Project)
        .get(&UnitKey::skill("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.branch, "trunk");
}

#[tokio::test]
async fn test_list_only_changes_nothing() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "6666666");
    let ctx = sandbox.context();
    let mut opts = options(&[]);
    opts.list = true;

    let report = completed(
        install::execute(&ctx, &fetcher, &ScriptedPrompter::default(), SOURCE, &opts)
            .await
            .unwrap(),
    );

    assert!(report.results.is_empty());
    assert!(!ctx.store(Scope::Project).exists());
    assert!(!sandbox.project(".flins").exists());
}

#[tokio::test]
async fn test_empty_repository_is_an_error() {
    let sandbox = Sandbox::new();
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("README.md"), "nothing here").unwrap();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "7777777");
    let ctx = sandbox.context();

    let err = install::execute(
        &ctx,
        &fetcher,
        &ScriptedPrompter::default(),
        SOURCE,
        &options(&["claude-code"]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlinsError::NoUnitsFound { .. }));
    assert!(!ctx.store(Scope::Project).exists());
}

#[tokio::test]
async fn test_unknown_agent_is_rejected_before_cloning() {
    let sandbox = Sandbox::new();
    let fetcher = FakeFetcher::new();
    let ctx = sandbox.context();

    let err = install::execute(
        &ctx,
        &fetcher,
        &ScriptedPrompter::default(),
        SOURCE,
        &options(&["claude-code", "emacs"]),
    )
    .await
    .unwrap_err();

    match err {
        FlinsError::UnknownAgents { invalid, valid } => {
            assert_eq!(invalid, "emacs");
            assert!(valid.contains("cursor"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fetcher.clones.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unmatched_skill_names_fail() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "8888888");
    let ctx = sandbox.context();
    let mut opts = options(&["claude-code"]);
    opts.units = vec!["gamma".to_string()];

    let err = install::execute(&ctx, &fetcher, &ScriptedPrompter::default(), SOURCE, &opts)
        .await
        .unwrap_err();

    match err {
        FlinsError::NoMatchingUnits { requested, available } => {
            assert_eq!(requested, "gamma");
            assert!(available.contains("alpha"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_skill_names_match_case_insensitively() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "9999999");
    let ctx = sandbox.context();
    let mut opts = options(&["claude-code"]);
    opts.units = vec!["BETA".to_string()];

    let report = completed(
        install::execute(&ctx, &fetcher, &ScriptedPrompter::default(), SOURCE, &opts)
            .await
            .unwrap(),
    );

    assert_eq!(report.installed(), 1);
    assert_eq!(report.results[0].unit, "beta");
    assert!(!sandbox.project(".claude/skills/alpha").exists());
}

#[tokio::test]
async fn test_commands_only_go_to_capable_agents() {
    let sandbox = Sandbox::new();
    let repo = TempDir::new().unwrap();
    write_command(repo.path(), "commands", "review.md", "Review the diff");
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef0");
    let ctx = sandbox.context();

    let report = completed(
        install::execute(
            &ctx,
            &fetcher,
            &ScriptedPrompter::default(),
            SOURCE,
            &options(&["claude-code", "cursor"]),
        )
        .await
        .unwrap(),
    );

    assert_eq!(report.installed(), 1);
    assert_eq!(report.results[0].agent, "claude-code");
    assert!(sandbox.project(".claude/commands/review.md").is_file());
    assert!(ctx
        .store(Scope::Project)
        .get(&UnitKey::command("review"))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_commands_without_capable_agents_fail() {
    let sandbox = Sandbox::new();
    let repo = TempDir::new().unwrap();
    write_command(repo.path(), "commands", "review.md", "Review the diff");
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef1");
    let ctx = sandbox.context();

    let err = install::execute(
        &ctx,
        &fetcher,
        &ScriptedPrompter::default(),
        SOURCE,
        &options(&["cursor"]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlinsError::NoCommandAgents(_)));
}

#[tokio::test]
async fn test_cancelled_selection_writes_nothing() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef2");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::new([Answer::Cancel]);
    let mut opts = options(&["claude-code"]);
    opts.yes = false;

    let outcome = install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts)
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert!(!ctx.store(Scope::Project).exists());
    assert!(!sandbox.project(".claude").exists());
}

#[tokio::test]
async fn test_interactive_flow_installs_the_picked_skill() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef3");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::new([
        Answer::Pick(vec![1]),
        Answer::Choose(1),
        Answer::Confirm(true),
    ]);
    let mut opts = options(&["claude-code"]);
    opts.yes = false;

    let report =
        completed(install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts).await.unwrap());

    assert_eq!(report.scope, Some(Scope::Global));
    assert_eq!(report.installed(), 1);
    assert!(sandbox.global(".claude/skills/beta/SKILL.md").is_file());
    assert_eq!(prompter.asked.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_declined_confirmation_is_cancelled() {
    let sandbox = Sandbox::new();
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef4");
    let ctx = sandbox.context();
    let prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
    let mut opts = options(&["claude-code"]);
    opts.yes = false;
    opts.global = Some(false);
    opts.units = vec!["alpha".to_string()];

    let outcome = install::execute(&ctx, &fetcher, &prompter, SOURCE, &opts)
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert!(!sandbox.project(".claude/skills/alpha").exists());
}

#[tokio::test]
async fn test_detected_agents_are_used_with_yes() {
    let sandbox = Sandbox::new();
    sandbox.detect(".codex");
    let repo = repo();
    let fetcher = FakeFetcher::new();
    fetcher.serve(URL, repo.path(), "abcdef5");
    let ctx = sandbox.context();

    let report = completed(
        install::execute(&ctx, &fetcher, &ScriptedPrompter::default(), SOURCE, &options(&[]))
            .await
            .unwrap(),
    );

    assert!(report.results.iter().all(|r| r.agent == "codex"));
    assert_eq!(report.installed(), 2);
}
