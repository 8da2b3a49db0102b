use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command as GitCommand;

use crate::cancel::{CancelToken, Interrupted};

/// Pending changes of a working tree, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSnapshot {
    pub staged: String,
    pub unstaged: String,
    pub untracked: String,
}

impl ChangeSnapshot {
    /// Non-empty parts joined by a newline, staged first, then unstaged, then untracked.
    pub fn combined(&self) -> String {
        [&self.staged, &self.unstaged, &self.untracked]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// Something that can produce a snapshot of pending changes.
pub trait DiffSource {
    fn diff(&self, staged_only: bool) -> Result<ChangeSnapshot>;
}

/// Collects diffs by shelling out to the `git` binary inside `dir`.
///
/// Collection stops between git invocations once `cancel` fires.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
    cancel: CancelToken,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>, cancel: CancelToken) -> Self {
        Self {
            dir: dir.into(),
            cancel,
        }
    }
}

impl DiffSource for GitCli {
    fn diff(&self, staged_only: bool) -> Result<ChangeSnapshot> {
        collect_diff(&self.dir, staged_only, &self.cancel)
    }
}

/// Extract the staged diff and, unless `staged_only`, the unstaged and untracked diffs.
fn collect_diff(dir: &Path, staged_only: bool, cancel: &CancelToken) -> Result<ChangeSnapshot> {
    let staged = git_output(dir, &["diff", "--cached"])
        .context("getting staged diff")?
        .trim()
        .to_string();

    if staged_only {
        return Ok(ChangeSnapshot {
            staged,
            ..Default::default()
        });
    }

    check_cancelled(cancel)?;
    let unstaged = git_output(dir, &["diff"])
        .context("getting unstaged diff")?
        .trim()
        .to_string();

    check_cancelled(cancel)?;
    let untracked = untracked_diff(dir, cancel)
        .context("getting untracked files")?
        .trim()
        .to_string();

    Ok(ChangeSnapshot {
        staged,
        unstaged,
        untracked,
    })
}

/// Render every untracked, non-ignored file as an addition-only diff.
///
/// Per-file failures are skipped: a file git cannot diff simply does not show up.
fn untracked_diff(dir: &Path, cancel: &CancelToken) -> Result<String> {
    let listing = git_output(dir, &["ls-files", "--others", "--exclude-standard", "-z"])?;

    let mut fragments = Vec::new();
    // names are NUL-terminated and may legitimately start or end with spaces
    for file in listing.split('\0').filter(|f| !f.is_empty()) {
        check_cancelled(cancel)?;

        // exits 1 whenever the files differ, which for /dev/null is always
        let output = match GitCommand::new("git")
            .args(["diff", "--no-index", "--", "/dev/null", file])
            .current_dir(dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                log::debug!("skipping untracked file {file}: {e}");
                continue;
            }
        };

        if output.stdout.is_empty() {
            log::debug!("no diff output for untracked file {file}");
            continue;
        }

        fragments.push(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    Ok(fragments.join("\n"))
}

fn check_cancelled(cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Interrupted::Cancelled.into());
    }
    Ok(())
}

/// Run a git command in `dir` and capture stdout as String.
fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("failed to run git {} in {}", args.join(" "), dir.display()))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {} exited with status {:?}: {}",
            args.join(" "),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// helper to run git in a test repository, panicking on failure
    fn git(dir: &Path, args: &[&str]) {
        let output = GitCommand::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// helper to collect a diff with a token nobody cancels
    fn get_diff(dir: &Path, staged_only: bool) -> Result<ChangeSnapshot> {
        collect_diff(dir, staged_only, &CancelToken::new())
    }

    /// helper to initialise a repository with one committed README
    fn init_test_repo() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "user.name", "Test User"]);
        git(dir, &["config", "commit.gpgsign", "false"]);

        fs::write(dir.join("README.md"), "# test\n").unwrap();
        git(dir, &["add", "README.md"]);
        git(dir, &["commit", "-q", "-m", "initial"]);

        temp_dir
    }

    #[test]
    fn clean_tree_is_empty() {
        let repo = init_test_repo();

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.is_empty(), "unexpected diff: {diff:?}");
    }

    #[test]
    fn unstaged_change_only() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# updated\n").unwrap();

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.staged.is_empty());
        assert!(diff.unstaged.contains("+# updated"));
        assert!(diff.untracked.is_empty());
        assert!(!diff.is_empty());
    }

    #[test]
    fn staged_change_only() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# staged\n").unwrap();
        git(repo.path(), &["add", "README.md"]);

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.staged.contains("+# staged"));
        assert!(diff.unstaged.is_empty());
        assert!(diff.untracked.is_empty());
    }

    #[test]
    fn staged_only_skips_unstaged_and_untracked() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# staged\n").unwrap();
        git(repo.path(), &["add", "README.md"]);
        fs::write(repo.path().join("README.md"), "# staged then modified\n").unwrap();
        fs::write(repo.path().join("new.txt"), "new file\n").unwrap();

        let diff = get_diff(repo.path(), true).unwrap();
        assert!(!diff.staged.is_empty());
        assert!(diff.unstaged.is_empty());
        assert!(diff.untracked.is_empty());
    }

    #[test]
    fn untracked_files_render_as_additions() {
        let repo = init_test_repo();
        fs::write(repo.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(repo.path().join("new.txt"), "new file\n").unwrap();
        fs::write(repo.path().join("noise.log"), "ignored\n").unwrap();

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.staged.is_empty());
        assert!(diff.untracked.contains("new.txt"));
        assert!(diff.untracked.contains("+new file"));
        assert!(diff.untracked.contains(".gitignore"));
        assert!(!diff.untracked.contains("noise.log"));
    }

    #[test]
    fn combined_orders_staged_before_untracked() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# staged\n").unwrap();
        git(repo.path(), &["add", "README.md"]);
        fs::write(repo.path().join("new.txt"), "new file\n").unwrap();

        let diff = get_diff(repo.path(), false).unwrap();
        let combined = diff.combined();
        let staged_at = combined.find("+# staged").unwrap();
        let untracked_at = combined.find("+new file").unwrap();
        assert!(staged_at < untracked_at);
    }

    #[test]
    fn nonexistent_dir_is_an_error() {
        let err = get_diff(Path::new("/nonexistent/path"), false).unwrap_err();
        assert!(format!("{err:#}").contains("getting staged diff"));
    }

    #[test]
    fn undiffable_untracked_entry_is_skipped() {
        let repo = init_test_repo();
        let nested = repo.path().join("sub");
        fs::create_dir(&nested).unwrap();
        git(&nested, &["init", "-q"]);
        fs::write(nested.join("inner.txt"), "inner\n").unwrap();
        fs::write(repo.path().join("ok.txt"), "fine\n").unwrap();

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.untracked.contains("ok.txt"));
        assert!(diff.untracked.contains("+fine"));
        assert!(!diff.untracked.contains("inner"));
    }

    #[test]
    fn untracked_names_keep_surrounding_spaces() {
        let repo = init_test_repo();
        fs::write(repo.path().join(" lead.txt"), "leading space\n").unwrap();
        fs::write(repo.path().join("trail.txt "), "trailing space\n").unwrap();

        let diff = get_diff(repo.path(), false).unwrap();
        assert!(diff.untracked.contains("+leading space"));
        assert!(diff.untracked.contains("+trailing space"));
    }

    #[test]
    fn cancelled_collection_stops_before_untracked_files() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# staged\n").unwrap();
        git(repo.path(), &["add", "README.md"]);
        for i in 0..20 {
            fs::write(repo.path().join(format!("file{i}.txt")), "content\n").unwrap();
        }

        let token = CancelToken::new();
        token.cancel();
        let source = GitCli::new(repo.path(), token);

        let err = source.diff(false).unwrap_err();
        assert!(err.downcast_ref::<Interrupted>().is_some(), "unexpected error: {err:#}");

        // staged-only collection finishes before the first checkpoint
        assert!(source.diff(true).unwrap().staged.contains("+# staged"));
    }

    #[test]
    fn untracked_loop_checks_the_token() {
        let repo = init_test_repo();
        fs::write(repo.path().join("a.txt"), "a\n").unwrap();

        let token = CancelToken::new();
        token.cancel();
        let err = untracked_diff(repo.path(), &token).unwrap_err();
        assert!(err.downcast_ref::<Interrupted>().is_some());

        let fragments = untracked_diff(repo.path(), &CancelToken::new()).unwrap();
        assert!(fragments.contains("+a"));
    }

    #[test]
    fn git_cli_source_delegates() {
        let repo = init_test_repo();
        fs::write(repo.path().join("README.md"), "# updated\n").unwrap();

        let source = GitCli::new(repo.path(), CancelToken::new());
        let diff = source.diff(false).unwrap();
        assert!(!diff.unstaged.is_empty());
    }

    #[test]
    fn combined_empty() {
        assert_eq!(ChangeSnapshot::default().combined(), "");
    }

    #[test]
    fn combined_staged_only() {
        let snapshot = ChangeSnapshot {
            staged: "staged content".into(),
            ..Default::default()
        };
        assert_eq!(snapshot.combined(), "staged content");
    }

    #[test]
    fn combined_joins_with_single_newline() {
        let snapshot = ChangeSnapshot {
            staged: "staged".into(),
            unstaged: "unstaged".into(),
            untracked: String::new(),
        };
        assert_eq!(snapshot.combined(), "staged\nunstaged");

        let snapshot = ChangeSnapshot {
            staged: String::new(),
            unstaged: "unstaged".into(),
            untracked: "untracked".into(),
        };
        assert_eq!(snapshot.combined(), "unstaged\nuntracked");
    }

    #[test]
    fn is_empty_requires_all_parts_empty() {
        assert!(ChangeSnapshot::default().is_empty());
        let snapshot = ChangeSnapshot {
            untracked: "x".into(),
            ..Default::default()
        };
        assert!(!snapshot.is_empty());
    }
}
