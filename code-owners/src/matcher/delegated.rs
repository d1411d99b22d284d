use std::{
    borrow::Cow,
    collections::HashSet,
    ffi::OsString,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    thread,
};

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

use super::{FileMatch, PatternMatcher};
use crate::{
    error::{Error, Result},
    ruleset::RuleTable,
};

/// Delegates matching to `git check-ignore`, using the CODEOWNERS patterns as
/// the only exclude file. Covers every file tracked in the working tree at
/// `repo_root`, which must be the top level of the working tree. The
/// repository's own ignore files play no part.
///
/// git resolves precedence itself, so each [`FileMatch`] carries at most one
/// line: the rule git picked.
#[derive(Debug, Clone)]
pub struct DelegatedMatcher {
    repo_root: PathBuf,
}

impl DelegatedMatcher {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self) -> Command {
        let mut command = Command::new("git");
        command
            .current_dir(&self.repo_root)
            .args(["-c", "core.quotepath=off"]);
        command
    }

    // NUL-separated list of every tracked path, exactly as git printed it.
    fn tracked_files(&self) -> Result<Vec<u8>> {
        let output = self
            .git()
            .args(["ls-files", "-z"])
            .stderr(Stdio::piped())
            .output()
            .map_err(Error::GitSpawn)?;
        check_status("git ls-files", &output, &[0])?;
        Ok(output.stdout)
    }

    // Runs outside the repository, against an empty scratch repository, so
    // its `.gitignore` files and `info/exclude` can't claim any path.
    fn check_ignore(&self, exclude_file: &Path, paths: Vec<u8>) -> Result<Vec<u8>> {
        let scratch = ScratchRepo::new()?;

        let mut excludes = OsString::from("core.excludesfile=");
        excludes.push(exclude_file);

        let mut child = scratch
            .git()
            .args(["-c", "core.quotepath=off", "-c"])
            .arg(excludes)
            .args(["check-ignore", "--no-index", "-v", "-n", "-z", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Error::GitSpawn)?;

        // Feed stdin from another thread so a full stdout pipe can't stall us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "no stdin for git"))?;
        let writer = thread::spawn(move || stdin.write_all(&paths));

        let output = child.wait_with_output().map_err(Error::GitSpawn)?;
        // Exit status 1 just means no path was matched.
        check_status("git check-ignore", &output, &[0, 1])?;
        writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked")))?;

        Ok(output.stdout)
    }
}

// An empty bare repository with an empty work tree, both removed on drop.
// Created without templates, so there's no `info/exclude` either.
struct ScratchRepo {
    git_dir: TempDir,
    work_tree: TempDir,
}

impl ScratchRepo {
    fn new() -> Result<Self> {
        let git_dir = TempDir::new()?;
        let work_tree = TempDir::new()?;

        let output = Command::new("git")
            .args(["init", "--bare", "-q", "--template="])
            .arg(git_dir.path())
            .stderr(Stdio::piped())
            .output()
            .map_err(Error::GitSpawn)?;
        check_status("git init", &output, &[0])?;

        Ok(Self { git_dir, work_tree })
    }

    fn git(&self) -> Command {
        let mut git_dir = OsString::from("--git-dir=");
        git_dir.push(self.git_dir.path());
        let mut work_tree = OsString::from("--work-tree=");
        work_tree.push(self.work_tree.path());

        let mut command = Command::new("git");
        command
            .current_dir(self.work_tree.path())
            .arg(git_dir)
            .arg(work_tree);
        command
    }
}

impl PatternMatcher for DelegatedMatcher {
    fn match_files(&self, rules: &RuleTable) -> Result<Vec<FileMatch>> {
        let tracked = self.tracked_files()?;
        if tracked.is_empty() {
            return Ok(Vec::new());
        }

        let mut exclude_file = NamedTempFile::new()?;
        write_patterns(exclude_file.as_file_mut(), rules)?;
        exclude_file.as_file_mut().flush()?;

        debug!(
            repo_root = %self.repo_root.display(),
            exclude_file = %exclude_file.path().display(),
            "running git check-ignore"
        );
        let raw = self.check_ignore(exclude_file.path(), tracked)?;
        let records = parse_check_ignore_output(&decode_lossy(&raw))?;

        let source = exclude_file.path().to_string_lossy();
        let mut seen = HashSet::new();
        let mut matches = Vec::with_capacity(records.len());
        for record in records {
            // Unmerged paths are listed once per stage.
            if !seen.insert(record.path.clone()) {
                continue;
            }

            let Some(line) = record.line else {
                matches.push(FileMatch::unmatched(record.path));
                continue;
            };
            if record.source != source {
                return Err(Error::MalformedOutput(format!(
                    "{} was matched by `{}`, not the CODEOWNERS patterns",
                    record.path, record.source
                )));
            }
            if rules.effective_rule(line).is_none() {
                return Err(Error::UnknownRuleLine { line });
            }
            matches.push(FileMatch::new(record.path, vec![line]));
        }

        debug!(files = matches.len(), "matched files with git");
        Ok(matches)
    }
}

// Write one exclude line per rule slot, leaving placeholders empty, so that
// exclude-file line N is CODEOWNERS line N.
fn write_patterns(out: &mut impl Write, rules: &RuleTable) -> io::Result<()> {
    for rule in rules {
        if rule.is_effective() {
            writeln!(out, "{}", rule.pattern)?;
        } else {
            writeln!(out)?;
        }
    }
    Ok(())
}

fn check_status(command: &str, output: &Output, allowed: &[i32]) -> Result<()> {
    match output.status.code() {
        Some(code) if allowed.contains(&code) => Ok(()),
        _ => Err(Error::GitFailed {
            command: command.to_owned(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }),
    }
}

/// Decode subprocess output as UTF-8, replacing every invalid byte sequence
/// with U+FFFD rather than failing the whole batch over one odd file name.
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        warn!("git output contained invalid UTF-8; affected paths were repaired");
    }
    text
}

/// One result from `git check-ignore -v -n -z`. `line` and `pattern` are
/// `None` for paths that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIgnoreRecord {
    pub source: String,
    pub line: Option<usize>,
    pub pattern: Option<String>,
    pub path: String,
}

/// Parse the NUL-separated output of `git check-ignore -v -n -z`: four fields
/// (`source`, `line`, `pattern`, `path`) per path, the machine-readable form
/// of `source:line:pattern<TAB>path`.
pub fn parse_check_ignore_output(output: &str) -> Result<Vec<CheckIgnoreRecord>> {
    let body = output.strip_suffix('\0').unwrap_or(output);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let fields = body.split('\0').collect::<Vec<_>>();
    if fields.len() % 4 != 0 {
        return Err(Error::MalformedOutput(format!(
            "expected 4 fields per path, got {} fields",
            fields.len()
        )));
    }

    fields
        .chunks_exact(4)
        .map(|chunk| {
            let &[source, line, pattern, path] = chunk else {
                return Err(Error::MalformedOutput("truncated record".to_owned()));
            };
            let line = match line {
                "" => None,
                line => Some(line.parse::<usize>().map_err(|_| {
                    Error::MalformedOutput(format!("invalid line number `{}` for {}", line, path))
                })?),
            };
            Ok(CheckIgnoreRecord {
                source: source.to_owned(),
                line,
                pattern: (!pattern.is_empty()).then(|| pattern.to_owned()),
                path: path.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_write_patterns_keeps_line_numbers() {
        let rules = parse("# comment\n*.rs @rust\n\n!nope @x\ndocs/ @docs").rules;
        let mut out = Vec::new();
        write_patterns(&mut out, &rules).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n*.rs\n\n\ndocs/\n");
    }

    #[test]
    fn test_parse_check_ignore_output() {
        let output = "/tmp/patterns\02\0whatever/pattern/thing\0this/is/a/file\0\0\0\0unowned/file\0";
        assert_eq!(
            parse_check_ignore_output(output).unwrap(),
            vec![
                CheckIgnoreRecord {
                    source: "/tmp/patterns".to_owned(),
                    line: Some(2),
                    pattern: Some("whatever/pattern/thing".to_owned()),
                    path: "this/is/a/file".to_owned(),
                },
                CheckIgnoreRecord {
                    source: String::new(),
                    line: None,
                    pattern: None,
                    path: "unowned/file".to_owned(),
                },
            ]
        );
        assert!(parse_check_ignore_output("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_check_ignore_output_rejects_garbage() {
        assert!(matches!(
            parse_check_ignore_output("a\0b\0c\0"),
            Err(Error::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_check_ignore_output("src\0two\0pat\0path\0"),
            Err(Error::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_decode_lossy_replaces_invalid_bytes() {
        let raw = b"::\tBad\xEF\xEF\xEF\xEF chars\xC3\xA5\xE2\x88\x86\xC6\x92.txt";
        assert_eq!(
            decode_lossy(raw),
            "::\tBad\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD} chars\u{e5}\u{2206}\u{192}.txt"
        );
        assert!(matches!(decode_lossy(b"plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_check_status() {
        use std::process::Command;

        let output = Command::new("sh").args(["-c", "echo oops >&2; exit 3"]).output().unwrap();
        let err = check_status("sh", &output, &[0, 1]).unwrap_err();
        assert!(err.to_string().contains("oops"), "{}", err);

        let output = Command::new("sh").args(["-c", "exit 1"]).output().unwrap();
        assert!(check_status("sh", &output, &[0, 1]).is_ok());
    }
}
