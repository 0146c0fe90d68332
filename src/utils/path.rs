use std::path::{Path, PathBuf};

/// Resolve a registry path against the right root.
///
/// `~` and `~/...` expand against `home`; anything else is joined onto
/// `base`. Absolute paths are returned unchanged.
pub fn resolve(raw: &str, base: &Path, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home.join(rest);
    }
    base.join(raw)
}

/// Render a path for display, abbreviating the home directory to `~`.
pub fn display(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Symlink target for `link` pointing at `target`, relative when possible.
pub fn link_target(target: &Path, link: &Path) -> PathBuf {
    link.parent()
        .and_then(|parent| pathdiff::diff_paths(target, parent))
        .unwrap_or_else(|| target.to_path_buf())
}
