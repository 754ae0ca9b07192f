// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::FakeHost;

use anyhow::Result;
use dotboot::{
    config::{AurHelper, Requirement},
    install::{InstallError, Installer},
    probe::{HostProfile, OsFamily, PackageManagerId},
};
use pretty_assertions::assert_eq;

fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::new("git", "git"),
        Requirement::new("ansible-playbook", "ansible"),
    ]
}

fn yay() -> AurHelper {
    AurHelper {
        name: "yay".into(),
        url: "https://aur.archlinux.org/yay-bin.git".into(),
    }
}

#[test]
fn installed_tools_issue_no_commands_on_any_platform() -> Result<()> {
    for os_family in [
        OsFamily::Linux,
        OsFamily::Darwin,
        OsFamily::Windows,
        OsFamily::Unknown,
    ] {
        let host = FakeHost::new().with_binaries(["git", "ansible-playbook", "dnf"]);
        let profile = HostProfile::new(os_family, [PackageManagerId::Dnf]);
        let installer = Installer::new(&host, &profile);

        installer.ensure_all_installed(&requirements())?;
        installer.ensure_installed(&Requirement::new("git", "git"))?;
        assert_eq!(host.commands(), Vec::<String>::new(), "{os_family}");
    }

    Ok(())
}

#[test]
fn missing_tools_install_through_single_update_and_install() -> Result<()> {
    let host = FakeHost::new()
        .with_binaries(["dnf"])
        .installs("sudo dnf install", &["git", "ansible-playbook"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Dnf]);

    Installer::new(&host, &profile).ensure_all_installed(&requirements())?;

    assert_eq!(
        host.commands(),
        vec!["sudo dnf update -y", "sudo dnf install -y git ansible"]
    );
    Ok(())
}

#[test]
fn only_missing_packages_are_requested() -> Result<()> {
    let host = FakeHost::new()
        .with_binaries(["git"])
        .installs("sudo apt-get install", &["ansible-playbook"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Apt]);

    Installer::new(&host, &profile).ensure_all_installed(&requirements())?;

    assert_eq!(
        host.commands(),
        vec!["sudo apt-get update", "sudo apt-get install -y ansible"]
    );
    Ok(())
}

#[test]
fn first_manager_in_priority_order_wins() -> Result<()> {
    let host = FakeHost::new().installs("sudo pacman -S", &["git"]);
    let profile = HostProfile::new(
        OsFamily::Linux,
        [PackageManagerId::Zypper, PackageManagerId::Pacman, PackageManagerId::Yum],
    );

    Installer::new(&host, &profile).ensure_installed(&Requirement::new("git", "git"))?;

    assert_eq!(
        host.commands(),
        vec!["sudo pacman -Syy --noconfirm", "sudo pacman -S --noconfirm git"]
    );
    Ok(())
}

#[test]
fn unrecognized_package_manager_attempts_nothing() {
    let host = FakeHost::new();
    let profile = HostProfile::new(OsFamily::Linux, []);

    let result = Installer::new(&host, &profile).ensure_all_installed(&requirements());

    assert!(matches!(result, Err(InstallError::NoPackageManager { .. })));
    assert_eq!(host.commands(), Vec::<String>::new());
}

#[test]
fn failed_install_aborts_without_fallback() {
    let host = FakeHost::new().fail_on("sudo dnf install", 1);
    let profile = HostProfile::new(
        OsFamily::Linux,
        [PackageManagerId::Dnf, PackageManagerId::Yum],
    );

    let result = Installer::new(&host, &profile).ensure_all_installed(&requirements());

    match result {
        Err(InstallError::Command { manager, .. }) => assert_eq!(manager, PackageManagerId::Dnf),
        other => panic!("expected install failure, got {other:?}"),
    }
    assert_eq!(host.count("sudo yum"), 0);
    assert_eq!(
        host.commands(),
        vec!["sudo dnf update -y", "sudo dnf install -y git ansible"]
    );
}

#[test]
fn failed_update_skips_install() {
    let host = FakeHost::new().fail_on("sudo apt-get update", 100);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Apt]);

    let result = Installer::new(&host, &profile).ensure_all_installed(&requirements());

    assert!(matches!(result, Err(InstallError::Command { .. })));
    assert_eq!(host.commands(), vec!["sudo apt-get update"]);
}

#[test]
fn tool_still_missing_after_install_is_reported() {
    let host = FakeHost::new().installs("sudo yum install", &["git"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Yum]);

    let result = Installer::new(&host, &profile).ensure_all_installed(&requirements());

    match result {
        Err(InstallError::Verification { manager, binary, .. }) => {
            assert_eq!(manager, PackageManagerId::Yum);
            assert_eq!(binary, "ansible-playbook");
        }
        other => panic!("expected verification failure, got {other:?}"),
    }
}

#[test]
fn non_linux_hosts_are_told_to_install_manually() {
    for os_family in [OsFamily::Darwin, OsFamily::Windows, OsFamily::Unknown] {
        let host = FakeHost::new().with_binaries(["apt-get"]);
        let profile = HostProfile::new(os_family, [PackageManagerId::Apt]);

        let result = Installer::new(&host, &profile).ensure_all_installed(&requirements());

        match result {
            Err(err @ InstallError::UnsupportedPlatform { .. }) => {
                assert!(err.hint().contains("git"), "{os_family}");
            }
            other => panic!("expected unsupported platform, got {other:?}"),
        }
        assert_eq!(host.commands(), Vec::<String>::new());
    }
}

#[test]
fn aur_helper_is_built_and_cache_removed() -> Result<()> {
    let cache = tempfile::tempdir()?;
    let host = FakeHost::new()
        .on("git clone", |_, invocation| {
            let path = invocation.args.last().unwrap();
            std::fs::create_dir_all(path).unwrap();
            let pkgbuild = std::path::Path::new(path).join("PKGBUILD");
            std::fs::write(pkgbuild, "pkgname=yay-bin\n").unwrap();
        })
        .installs("makepkg", &["yay"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Pacman]);
    let build_dir = cache.path().join("yay");

    assert!(Installer::new(&host, &profile).install_aur_helper(&yay(), cache.path()));

    assert_eq!(
        host.commands(),
        vec![
            format!(
                "git clone https://aur.archlinux.org/yay-bin.git {}",
                build_dir.display()
            ),
            "makepkg -si --noconfirm".to_string(),
        ]
    );
    let makepkg = &host.invocations()[1];
    assert_eq!(makepkg.cwd.as_deref(), Some(build_dir.as_path()));
    assert!(makepkg.interactive);
    assert!(!build_dir.exists());
    Ok(())
}

#[test]
fn aur_helper_reuses_existing_clone() -> Result<()> {
    let cache = tempfile::tempdir()?;
    let build_dir = cache.path().join("yay");
    std::fs::create_dir_all(&build_dir)?;
    let host = FakeHost::new().installs("makepkg", &["yay"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Pacman]);

    assert!(Installer::new(&host, &profile).install_aur_helper(&yay(), cache.path()));

    assert_eq!(host.count("git clone"), 0);
    assert_eq!(host.commands(), vec!["makepkg -si --noconfirm"]);
    Ok(())
}

#[test]
fn aur_helper_failure_is_not_fatal() -> Result<()> {
    let cache = tempfile::tempdir()?;
    let build_dir = cache.path().join("yay");
    std::fs::create_dir_all(&build_dir)?;
    let host = FakeHost::new().fail_on("makepkg", 4);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Pacman]);

    assert!(!Installer::new(&host, &profile).install_aur_helper(&yay(), cache.path()));

    // INVARIANT: Build directory survives so the next run can reuse it.
    assert!(build_dir.exists());
    Ok(())
}

#[test]
fn aur_helper_must_resolve_after_build() -> Result<()> {
    let cache = tempfile::tempdir()?;
    let build_dir = cache.path().join("yay");
    std::fs::create_dir_all(&build_dir)?;
    let host = FakeHost::new();
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Pacman]);

    assert!(!Installer::new(&host, &profile).install_aur_helper(&yay(), cache.path()));

    assert_eq!(host.commands(), vec!["makepkg -si --noconfirm"]);
    assert!(build_dir.exists());
    Ok(())
}

#[test]
fn aur_helper_is_skipped_when_present_or_not_arch() {
    let cache = std::path::Path::new("/nonexistent/dotboot-cache");

    let host = FakeHost::new().with_binaries(["yay"]);
    let profile = HostProfile::new(OsFamily::Linux, [PackageManagerId::Pacman]);
    assert!(Installer::new(&host, &profile).install_aur_helper(&yay(), cache));

    let profile = HostProfile::new(
        OsFamily::Linux,
        [PackageManagerId::Apt, PackageManagerId::Pacman],
    );
    assert!(!Installer::new(&host, &profile).install_aur_helper(&yay(), cache));

    assert_eq!(host.commands(), Vec::<String>::new());
}
