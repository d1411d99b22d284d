use std::{
    env,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use code_owners::{find_repo_root, parse_file, Backend, Config, OwnershipRecord, ParseError};

#[derive(Parser)]
#[command(version, about = "Show who owns each file according to CODEOWNERS")]
struct Cli {
    /// Only report files under these paths
    paths: Vec<PathBuf>,

    /// CODEOWNERS file to use instead of the one found in the repository
    #[clap(short = 'f', long = "file")]
    codeowners_file: Option<PathBuf>,

    /// Directory inside the repository; its git top level is used (defaults to
    /// the current directory)
    #[clap(short = 'C', long = "repo")]
    repo_root: Option<PathBuf>,

    /// Match patterns in-process over the files on disk instead of using git
    #[arg(long)]
    native: bool,

    /// Gitignore-style file of paths to skip (native matching only)
    #[arg(long = "ignore-file", value_name = "PATH")]
    ignore_files: Vec<PathBuf>,

    /// Print one JSON object per file
    #[arg(long)]
    json: bool,

    /// Only print files without an owner
    #[arg(long)]
    unowned: bool,

    /// Also print the line and pattern of the deciding rule
    #[arg(short, long)]
    verbose: bool,

    /// Only parse the CODEOWNERS file and report problems
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn backend(&self) -> Backend {
        if self.native {
            Backend::Native
        } else {
            Backend::Delegated
        }
    }

    // `--repo` may name any directory inside the working tree; git only sees
    // the whole index from the top level.
    fn repo_root(&self, cwd: &Path) -> Result<PathBuf> {
        let start = self.repo_root.as_deref().unwrap_or(cwd);
        match find_repo_root(start) {
            Ok(root) => Ok(root),
            Err(err) if self.native => {
                debug!(
                    error = %err,
                    dir = %start.display(),
                    "not in a git repository; matching from the directory itself"
                );
                Ok(start.to_path_buf())
            }
            Err(err) if self.repo_root.is_some() => Err(err)
                .with_context(|| format!("{} is not inside a git repository", start.display())),
            Err(err) => Err(err).context("could not find the repository root (try --repo)"),
        }
    }

    fn config(&self) -> Result<Config> {
        let cwd = env::current_dir().context("could not read the current directory")?;
        Ok(Config {
            repo_root: self.repo_root(&cwd)?,
            codeowners_file: self.codeowners_file.clone(),
            backend: self.backend(),
            scopes: self.paths.iter().map(|path| cwd.join(path)).collect(),
            ignore_files: self.ignore_files.clone(),
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CODE_OWNERS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(&Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config()?;

    if cli.check {
        let path = config.codeowners_path()?;
        let parsed = parse_file(&path)?;
        report_parse_errors(&parsed.errors);
        let rules = parsed.rules.effective_rules().count();
        println!("{}: {} rules, {} errors", path.display(), rules, parsed.errors.len());
        return Ok(if parsed.errors.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let result = code_owners::ownerships(&config)
        .with_context(|| format!("could not resolve ownership in {}", config.repo_root.display()))?;
    report_parse_errors(&result.parse_errors);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in result.records.iter().filter(|r| !cli.unowned || !r.is_owned()) {
        print_record(&mut out, cli, record)?;
    }
    out.flush()?;

    Ok(ExitCode::SUCCESS)
}

fn report_parse_errors(errors: &[ParseError]) {
    for err in errors {
        eprintln!("{}", err);
    }
}

fn print_record(out: &mut impl Write, cli: &Cli, record: &OwnershipRecord) -> Result<()> {
    if cli.json {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
        return Ok(());
    }

    match (cli.verbose, record.line, &record.pattern) {
        (true, Some(line), Some(pattern)) => writeln!(
            out,
            "{:<70}  {}  ({}:{})",
            record.file,
            record.owner(),
            line,
            pattern
        )?,
        _ => writeln!(out, "{:<70}  {}", record.file, record.owner())?,
    }
    Ok(())
}
