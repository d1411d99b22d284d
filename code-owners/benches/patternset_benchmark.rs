use code_owners::{parse, NativeMatcher, PatternMatcher, RuleSet};
use criterion::{criterion_group, criterion_main, Criterion};

const TEST_PATHS: &[&str] = &[
    "file-a",
    "dir-a/file-a",
    "dir-a/dir-c/file-a",
    "dir-a/dir-c/file-b",
    "dir-b/file-a",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
];

const TEST_PATTERNS: &[&str] = &[
    "*",
    "*-a",
    "file-*",
    "/dir-b",
    "dir-a/dir-b",
    "**/dir-*/file-*",
    "dir-*/*",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
    "dir-[ab]/",
];

fn codeowners_source(patterns: &[&str]) -> String {
    patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| format!("{} @owner-{}\n", pattern, i))
        .collect()
}

fn patternset_benchmark(c: &mut Criterion) {
    let source = codeowners_source(TEST_PATTERNS);
    let rules = parse(&source).rules;

    c.bench_function("parsing", |b| b.iter(|| parse(&source)));
    c.bench_function("building", |b| b.iter(|| RuleSet::new(rules.clone())));

    let ruleset = RuleSet::new(rules.clone());
    c.bench_function("matching", |b| {
        b.iter(|| {
            for p in TEST_PATHS {
                ruleset.matching_rules(p);
            }
        })
    });

    let matcher = NativeMatcher::new(TEST_PATHS.iter().copied());
    c.bench_function("native batch", |b| b.iter(|| matcher.match_files(&rules)));
}

criterion_group!(benches, patternset_benchmark);
criterion_main!(benches);
