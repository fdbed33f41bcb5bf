use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use decoder::{EvaluationContext, Record};

use crate::pets;

const FIXTURE_SUFFIX: &str = ".test.hcl";
const FENCE: &str = "---";

/// Front matter of a `.test.hcl` fixture.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Environment snapshot handed to the context builder, prefix included.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Whole performance output, compared after trimming.
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substring of the decode error's message.
    #[serde(default)]
    pub expect_error: Option<String>,

    #[serde(default)]
    pub expect_parse_error: bool,
}

/// What a fixture asserts about its configuration.
#[derive(Debug, PartialEq)]
enum Expectation {
    ParseError,
    DecodeError(String),
    Output(String),
    /// No expectation beyond decoding cleanly.
    Decodes,
}

impl FixtureConfig {
    fn expectation(&self) -> Result<Expectation, String> {
        match (
            self.expect_parse_error,
            &self.expect_error,
            &self.expect_output,
        ) {
            (true, None, None) => Ok(Expectation::ParseError),
            (false, Some(error), None) => Ok(Expectation::DecodeError(error.clone())),
            (false, None, Some(output)) => Ok(Expectation::Output(output.trim().to_string())),
            (false, None, None) => Ok(Expectation::Decodes),
            _ => Err("set at most one of expect_output, expect_error, expect_parse_error".into()),
        }
    }

    fn context(&self) -> EvaluationContext {
        let mut builder = EvaluationContext::builder().environment(self.env.clone());
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }
}

/// Split a fixture into its TOML front matter and the configuration below it.
fn split_fixture(content: &str) -> Result<(FixtureConfig, String), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    if lines.next().map(str::trim_end) != Some(FENCE) {
        return Err(format!("fixture must open with a `{}` line", FENCE));
    }

    let mut front_matter = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        front_matter.push_str(line);
        front_matter.push('\n');
    }
    if !closed {
        return Err(format!("front matter is never closed with `{}`", FENCE));
    }

    let config = toml::from_str(&front_matter).map_err(|e| format!("bad front matter: {}", e))?;
    let source: Vec<&str> = lines.collect();
    Ok((config, source.join("\n") + "\n"))
}

#[derive(Debug)]
pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

impl FixtureResult {
    fn name(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(FIXTURE_SUFFIX).to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn check_fixture(path: &Path) -> FixtureResult {
    let (description, outcome) = match evaluate_fixture(path) {
        Ok(description) => (description, Outcome::Pass),
        Err((description, reason)) => (description, Outcome::Fail(reason)),
    };
    FixtureResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

type Failure = (Option<String>, String);

/// Runs one fixture, returning its description on success.
fn evaluate_fixture(path: &Path) -> Result<Option<String>, Failure> {
    let content = std::fs::read_to_string(path).map_err(|e| (None, format!("cannot read: {}", e)))?;
    let (config, source) = split_fixture(&content).map_err(|e| (None, e))?;
    let description = config.description.clone();
    let fail = |reason: String| (description.clone(), reason);

    let expectation = config.expectation().map_err(fail)?;
    debug!(path = %path.display(), ?expectation, "running fixture");

    let parsed = hclite::parser::Parser::new(source, 0).parse();
    let document = match (parsed, &expectation) {
        (Err(_), Expectation::ParseError) => return Ok(description),
        (Ok(_), Expectation::ParseError) => {
            return Err(fail("parsed cleanly, but a parse error was expected".into()));
        }
        (Err(errors), _) => {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(fail(format!("parse failed: {}", messages.join("; "))));
        }
        (Ok(document), _) => document,
    };

    let decoded = decoder::decode(&document, &config.context());
    match (decoded, expectation) {
        (Ok(_), Expectation::Decodes) => Ok(description),
        (Ok(pets), Expectation::Output(expected)) => {
            let actual = render(&pets).map_err(fail)?;
            if actual.trim() == expected {
                Ok(description)
            } else {
                Err(fail(format!(
                    "output differs\n  expected: {}\n  actual:   {}",
                    expected,
                    actual.trim()
                )))
            }
        }
        (Ok(pets), Expectation::DecodeError(expected)) => Err(fail(format!(
            "decoded {} pet(s), but an error containing \"{}\" was expected",
            pets.len(),
            expected
        ))),
        (Err(error), Expectation::DecodeError(expected)) => {
            let message = error.to_string();
            if message.contains(&expected) {
                Ok(description)
            } else {
                Err(fail(format!(
                    "error should contain \"{}\"\n  actual: {}",
                    expected, message
                )))
            }
        }
        (Err(error), _) => Err(fail(format!("decode failed: {}", error))),
        (Ok(_), Expectation::ParseError) => Err(fail("parse error expected".into())),
    }
}

fn render(pets: &[Record]) -> Result<String, String> {
    let mut buffer = Vec::new();
    pets::perform(pets, &mut buffer).map_err(|e| format!("cannot render output: {}", e))?;
    String::from_utf8(buffer).map_err(|e| format!("output is not UTF-8: {}", e))
}

/// Every fixture below `dir`, sorted by path.
fn find_fixtures(dir: &Path) -> Vec<PathBuf> {
    let mut pending = vec![dir.to_path_buf()];
    let mut found = Vec::new();
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(FIXTURE_SUFFIX))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

struct Paint {
    no_color: bool,
}

impl Paint {
    fn green(&self, text: &str) -> String {
        self.wrap("32", text)
    }

    fn red(&self, text: &str) -> String {
        self.wrap("31", text)
    }

    fn wrap(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }
}

struct Summary<'a> {
    passed: usize,
    failures: Vec<&'a FixtureResult>,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "\n{}:", failure.path.display())?;
            if let Outcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        Ok(())
    }
}

/// Run one fixture file or every fixture below a directory, reporting to
/// stderr. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool) -> i32 {
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        find_fixtures(path)
    };
    if files.is_empty() {
        eprintln!("no {} fixtures under {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let paint = Paint { no_color };
    let results: Vec<FixtureResult> = files.iter().map(|f| check_fixture(f)).collect();
    let mut summary = Summary {
        passed: 0,
        failures: Vec::new(),
    };
    for result in &results {
        match result.outcome {
            Outcome::Pass => {
                summary.passed += 1;
                eprintln!("{} {}", paint.green("ok  "), result.name());
            }
            Outcome::Fail(_) => {
                summary.failures.push(result);
                eprintln!("{} {}", paint.red("FAIL"), result.name());
            }
        }
    }

    eprint!("{}", summary);
    let verdict = if summary.failures.is_empty() {
        paint.green("passed")
    } else {
        paint.red("failed")
    };
    eprintln!(
        "\n{} fixture(s) {}: {} ok, {} failing",
        results.len(),
        verdict,
        summary.passed,
        summary.failures.len()
    );
    i32::from(!summary.failures.is_empty())
}
