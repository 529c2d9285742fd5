// src/debpkg.rs

//! Debian packaging artifact generation
//!
//! Renders the `debian/` directory (`control`, `rules`, `changelog`,
//! `install`, maintainer scripts, and the service unit) for a
//! `dpkg-buildpackage` run. Pure text generation, no state: everything is
//! derived from the descriptor and the invocation paths.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::paths::Paths;
use crate::script;
use crate::systemd::SystemdUnit;
use chrono::Local;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_VERSION: &str = "0.1.0";
const DEFAULT_MAINTAINER: &str = "unknown <unknown@localhost>";

fn version(config: &Config) -> &str {
    config.version.as_deref().unwrap_or(DEFAULT_VERSION)
}

fn maintainer(config: &Config) -> &str {
    config.maintainer.as_deref().unwrap_or(DEFAULT_MAINTAINER)
}

fn service_user(config: &Config) -> &str {
    config.service_user.as_deref().unwrap_or("root")
}

/// Render the `debian/control` source and binary stanzas
pub fn render_control(config: &Config) -> String {
    format!(
        "Source: {name}\n\
         Maintainer: {maintainer}\n\
         Section: utils\n\
         Priority: optional\n\
         Standards-Version: 4.5.0\n\
         \n\
         Package: {name}\n\
         Architecture: all\n\
         Depends: {depends}\n\
         Description: {name} application packaged by quickpack\n",
        name = config.app_name,
        maintainer = maintainer(config),
        depends = config.dependencies.join(", "),
    )
}

/// Render the `debian/changelog` single-entry changelog
pub fn render_changelog(config: &Config) -> String {
    format!(
        "{name} ({version}) stable; urgency=low\n\
         \n  * quickpack update\n\
         \n -- {maintainer}  {date}\n\n",
        name = config.app_name,
        version = version(config),
        maintainer = maintainer(config),
        date = Local::now().format("%a, %d %b %Y %H:%M:%S %z"),
    )
}

/// Render the `debian/install` placement list
pub fn render_install(config: &Config, install_root: &Path) -> String {
    let mut lines: Vec<String> = config
        .build_files
        .iter()
        .map(|pattern| format!("{} {}/", pattern, install_root.display()))
        .collect();
    if config.systemd {
        let unit = SystemdUnit::from_config(config);
        lines.push(format!(
            "debian/{} etc/systemd/system/",
            unit.file_name()
        ));
    }
    lines.join("\n") + "\n"
}

fn render_rules() -> &'static str {
    "#!/usr/bin/make -f\n%:\n\tdh $@\n"
}

fn render_preinst() -> &'static str {
    "#!/bin/bash\nset -e\nexit 0\n"
}

/// Render `debian/postinst`: optional user hook, service account, install
/// root ownership, and the service restart when a unit is managed.
pub fn render_postinst(config: &Config, install_root: &Path, user_hook: Option<&str>) -> String {
    let mut body = String::from("#!/bin/bash\nset -e\n");

    if let Some(hook) = user_hook {
        body.push_str(&format!("\n./{} \"$@\"\n", hook));
    }

    let user = service_user(config);
    if user != "root" {
        body.push_str(&format!(
            "\nif ! id {user} >/dev/null 2>&1; then\n    \
             useradd --system --no-create-home --shell /usr/sbin/nologin {user}\nfi\n",
        ));
    }

    body.push_str(&format!(
        "\nmkdir -p {root}\nchown -R {user}:{user} {root}\n",
        root = install_root.display(),
        user = user,
    ));

    if config.systemd {
        let unit = SystemdUnit::from_config(config);
        body.push_str(&format!(
            "\nsystemctl daemon-reload\n\
             systemctl enable {unit}\n\
             systemctl restart {unit}\n",
            unit = unit.file_name(),
        ));
    }

    body.push_str("\nexit 0\n");
    body
}

/// Render `debian/prerm`: stop and disable this application's unit.
pub fn render_prerm(config: &Config) -> String {
    if !config.systemd {
        return "#!/bin/bash\nset -e\nexit 0\n".to_string();
    }
    let unit = SystemdUnit::from_config(config);
    format!(
        "#!/bin/bash\nset -e\n\
         systemctl stop {unit} || true\n\
         systemctl disable {unit} || true\n\
         systemctl daemon-reload\n\
         exit 0\n",
        unit = unit.file_name(),
    )
}

fn write_executable(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Write the full `debian/` directory into `workdir`.
pub fn write_artifacts(config: &Config, paths: &Paths, workdir: &Path) -> Result<()> {
    let debian_dir = workdir.join("debian");
    fs::create_dir_all(&debian_dir)?;
    let install_root = paths.install_root(config);

    fs::write(debian_dir.join("control"), render_control(config))?;
    fs::write(debian_dir.join("changelog"), render_changelog(config))?;
    fs::write(
        debian_dir.join("install"),
        render_install(config, &install_root),
    )?;
    write_executable(&debian_dir.join("rules"), render_rules())?;
    write_executable(&debian_dir.join("preinst"), render_preinst())?;
    write_executable(&debian_dir.join("prerm"), &render_prerm(config))?;

    // Ship the user's install script alongside postinst and invoke it there
    let user_hook = match &config.install_script {
        Some(name) => {
            let staged = script::stage(&paths.scripts_dir().join(name), &debian_dir)?;
            fs::set_permissions(&staged, fs::Permissions::from_mode(0o755))?;
            Some(name.clone())
        }
        None => None,
    };
    write_executable(
        &debian_dir.join("postinst"),
        &render_postinst(config, &install_root, user_hook.as_deref()),
    )?;

    if config.systemd {
        let unit = SystemdUnit::from_config(config);
        fs::write(debian_dir.join(unit.file_name()), unit.render(&install_root))?;
        debug!("Rendered unit file debian/{}", unit.file_name());
    }

    info!("Wrote debian artifacts to {}", debian_dir.display());
    Ok(())
}

/// Copy build-file matches into the package payload tree
/// (`workdir/<install_root stripped of the leading slash>`).
pub fn stage_payload(config: &Config, paths: &Paths, workdir: &Path) -> Result<()> {
    let install_root = paths.install_root(config);
    let rel_root: &Path = install_root
        .strip_prefix("/")
        .unwrap_or(install_root.as_path());
    let payload_dir = workdir.join(rel_root);
    fs::create_dir_all(&payload_dir)?;

    for pattern in &config.build_files {
        let pairs = crate::paths::resolve(pattern, &paths.project_dir, &payload_dir)?;
        if pairs.is_empty() {
            return Err(Error::CopyError(format!(
                "Pattern '{}' matched no files for the package payload",
                pattern
            )));
        }
        for (src, dst) in pairs {
            crate::paths::copy_entry(&src, &dst)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        serde_json::from_str(
            r#"{
                "app_name": "demo",
                "build_files": ["bin/*", "assets/*"],
                "install_files": [{"file": "bin/demo", "from": "cwd"}],
                "systemd": true,
                "exec": "/opt/demo/bin/demo",
                "version": "1.2.3",
                "maintainer": "Jane Doe <jane@example.org>",
                "dependencies": ["libc6", "ca-certificates"],
                "service_user": "demo"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_control_lists_metadata_and_dependencies() {
        let text = render_control(&config());
        assert!(text.starts_with("Source: demo\n"));
        assert!(text.contains("Maintainer: Jane Doe <jane@example.org>\n"));
        assert!(text.contains("Depends: libc6, ca-certificates\n"));
        assert!(text.contains("Package: demo\n"));
    }

    #[test]
    fn test_changelog_carries_version_and_maintainer() {
        let text = render_changelog(&config());
        assert!(text.starts_with("demo (1.2.3) stable; urgency=low\n"));
        assert!(text.contains(" -- Jane Doe <jane@example.org>  "));
    }

    #[test]
    fn test_install_lines_map_patterns_and_unit() {
        let text = render_install(&config(), Path::new("/opt/demo"));
        assert!(text.contains("bin/* /opt/demo/\n"));
        assert!(text.contains("assets/* /opt/demo/\n"));
        assert!(text.contains("debian/demo.service etc/systemd/system/\n"));
    }

    #[test]
    fn test_install_omits_unit_without_systemd() {
        let mut cfg = config();
        cfg.systemd = false;
        let text = render_install(&cfg, Path::new("/opt/demo"));
        assert!(!text.contains(".service"));
    }

    #[test]
    fn test_postinst_creates_service_user_and_restarts_unit() {
        let text = render_postinst(&config(), Path::new("/opt/demo"), None);
        assert!(text.contains("useradd --system --no-create-home"));
        assert!(text.contains("chown -R demo:demo /opt/demo\n"));
        assert!(text.contains("systemctl restart demo.service\n"));
    }

    #[test]
    fn test_postinst_skips_useradd_for_root() {
        let mut cfg = config();
        cfg.service_user = None;
        let text = render_postinst(&cfg, Path::new("/opt/demo"), None);
        assert!(!text.contains("useradd"));
        assert!(text.contains("chown -R root:root /opt/demo\n"));
    }

    #[test]
    fn test_postinst_invokes_user_hook_first() {
        let text = render_postinst(&config(), Path::new("/opt/demo"), Some("setup.sh"));
        let hook = text.find("./setup.sh \"$@\"").unwrap();
        let restart = text.find("systemctl restart").unwrap();
        assert!(hook < restart);
    }

    #[test]
    fn test_prerm_targets_this_apps_unit() {
        let text = render_prerm(&config());
        assert!(text.contains("systemctl stop demo.service || true\n"));
        assert!(text.contains("systemctl disable demo.service || true\n"));
    }
}
