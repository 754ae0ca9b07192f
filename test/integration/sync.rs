// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{FakeHost, RepoFixture};

use anyhow::Result;
use dotboot::sync::{CheckoutState, RepoTarget, SyncError, SyncOutcome, Synchronizer};
use git2::Repository;
use pretty_assertions::assert_eq;
use std::{cell::Cell, fs, rc::Rc};

const URL: &str = "https://blah.org/dotfiles.git";

fn clone_command(target: &RepoTarget) -> String {
    format!(
        "git clone --branch {} {} {}",
        target.branch,
        target.url,
        target.local_path.display()
    )
}

#[test]
fn absent_path_is_cloned() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("nested").join("dotfiles"));
    let host = FakeHost::new().clones_with_playbook();

    let outcome = Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(outcome, SyncOutcome::Cloned);
    assert_eq!(host.commands(), vec![clone_command(&target)]);
    assert!(target.local_path.join("playbook.yml").is_file());
    Ok(())
}

#[test]
fn second_run_pulls_instead_of_cloning() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    let host = FakeHost::new().clones_with_playbook();
    let synchronizer = Synchronizer::new(&host, &target);

    assert_eq!(synchronizer.synchronize()?, SyncOutcome::Cloned);
    let first = fs::read_to_string(target.local_path.join("playbook.yml"))?;
    assert_eq!(synchronizer.synchronize()?, SyncOutcome::Pulled);
    let second = fs::read_to_string(target.local_path.join("playbook.yml"))?;

    assert_eq!(first, second);
    assert_eq!(host.count("git clone"), 1);
    assert_eq!(
        host.commands(),
        vec![
            clone_command(&target),
            "git config pull.rebase true".to_string(),
            "git pull origin main".to_string(),
        ]
    );
    for invocation in &host.invocations()[1..] {
        assert_eq!(invocation.cwd.as_deref(), Some(target.local_path.as_path()));
    }
    Ok(())
}

#[test]
fn directory_without_git_is_removed_once_then_cloned() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    fs::create_dir_all(target.local_path.join("leftover"))?;
    fs::write(target.local_path.join("leftover").join("stale.txt"), "stale")?;

    let removed_before_clone = Rc::new(Cell::new(false));
    let observed = removed_before_clone.clone();
    let path = target.local_path.clone();
    let host = FakeHost::new()
        .on("git clone", move |_, _| observed.set(!path.exists()))
        .clones_with_playbook();

    let outcome = Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(outcome, SyncOutcome::Cloned);
    assert!(removed_before_clone.get());
    assert_eq!(host.count("git clone"), 1);
    assert!(!target.local_path.join("leftover").exists());
    assert_eq!(
        CheckoutState::inspect(&target.local_path)?,
        CheckoutState::Checkout {
            origin: Some(URL.into())
        }
    );
    Ok(())
}

#[test]
fn plain_file_at_path_is_replaced() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    fs::write(&target.local_path, "not a directory")?;
    let host = FakeHost::new().clones_with_playbook();

    assert_eq!(Synchronizer::new(&host, &target).synchronize()?, SyncOutcome::Cloned);
    assert!(target.local_path.is_dir());
    Ok(())
}

#[test]
fn mismatched_remote_is_reset_once_before_pull() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    RepoFixture::new(&target.local_path, Some("https://old.org/dotfiles.git"))?;
    let host = FakeHost::new();

    let outcome = Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(outcome, SyncOutcome::Pulled);
    assert_eq!(host.count("git remote set-url"), 1);
    assert_eq!(
        host.commands(),
        vec![
            format!("git remote set-url origin {URL}"),
            "git config pull.rebase true".to_string(),
            "git pull origin main".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn equivalent_remote_is_left_alone() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "dev", dir.path().join("dotfiles"));
    RepoFixture::new(&target.local_path, Some("https://blah.org/dotfiles"))?;
    let host = FakeHost::new();

    Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(host.count("git remote"), 0);
    assert_eq!(host.count("git pull origin dev"), 1);
    Ok(())
}

#[test]
fn missing_origin_is_added() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    RepoFixture::new(&target.local_path, None)?;
    let host = FakeHost::new();

    Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(host.commands()[0], format!("git remote add origin {URL}"));
    Ok(())
}

#[test]
fn failed_remote_reset_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    RepoFixture::new(&target.local_path, Some("https://old.org/dotfiles.git"))?;
    let host = FakeHost::new().fail_on("git remote", 128);

    let result = Synchronizer::new(&host, &target).synchronize();

    assert!(matches!(result, Err(SyncError::Remote { .. })));
    assert_eq!(host.count("git pull"), 0);
    Ok(())
}

#[test]
fn failed_clone_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    let host = FakeHost::new().fail_on("git clone", 128);

    let result = Synchronizer::new(&host, &target).synchronize();

    match result {
        Err(SyncError::Clone { url, .. }) => assert_eq!(url, URL),
        other => panic!("expected clone failure, got {other:?}"),
    }
    Ok(())
}

#[test]
fn failed_pull_keeps_stale_checkout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    let fixture = RepoFixture::new(&target.local_path, Some(URL))?;
    fixture.stage_and_commit("playbook.yml", "- hosts: local\n")?;
    let host = FakeHost::new().fail_on("git pull", 1);

    let outcome = Synchronizer::new(&host, &target).synchronize()?;

    assert_eq!(outcome, SyncOutcome::Stale);
    assert!(target.local_path.join("playbook.yml").is_file());
    Ok(())
}

#[test]
fn unreadable_checkout_is_left_untouched() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = RepoTarget::new(URL, "main", dir.path().join("dotfiles"));
    RepoFixture::new(&target.local_path, Some(URL))?;
    fs::write(target.local_path.join("uncommitted.txt"), "work in progress")?;

    // Newer repository format that the git CLI reads but libgit2 rejects.
    let repository = Repository::open(&target.local_path)?;
    let mut config = repository.config()?;
    config.set_i32("core.repositoryformatversion", 1)?;
    config.set_str("extensions.objectformat", "sha256")?;
    drop(config);
    drop(repository);

    let host = FakeHost::new().clones_with_playbook();
    let result = Synchronizer::new(&host, &target).synchronize();

    assert!(matches!(result, Err(SyncError::Inspect { .. })));
    assert_eq!(host.commands(), Vec::<String>::new());
    assert_eq!(
        fs::read_to_string(target.local_path.join("uncommitted.txt"))?,
        "work in progress"
    );
    Ok(())
}
