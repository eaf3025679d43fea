//! Path-expression engine over project files.
//!
//! Expressions have the shape `/dir/.../nametest:file[attr='value']...`. Directory
//! steps and the name test are glob segments. The `:file` step selects files at
//! any depth below the directory scope, so `/*:file[name='pom.xml']` finds every
//! `pom.xml` in the project. Supported predicate attributes are `name`, `path`,
//! and `extension`; all predicates must hold.

use globset::{GlobBuilder, GlobMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::QueryError;
use crate::domain::model::{File, Project};
use crate::domain::query::{MatchResult, QueryEngine, QueryExpression};

const FILE_STEP_SUFFIX: &str = ":file";

static PREDICATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*([a-z]+)\s*=\s*'([^']*)'\s*\]").expect("predicate regex is valid")
});

/// Default [`QueryEngine`] understanding path expressions.
#[derive(Debug, Default, Clone)]
pub struct PathExpressionEngine;

impl PathExpressionEngine {
    pub fn new() -> Self {
        Self
    }
}

impl QueryEngine for PathExpressionEngine {
    fn evaluate<'p>(
        &self,
        project: &'p Project,
        expression: &QueryExpression,
    ) -> Result<MatchResult<'p>, QueryError> {
        let compiled = CompiledExpression::parse(expression.as_str())?;
        let matches: Vec<File> = project
            .iter()
            .filter(|file| compiled.is_match(file))
            .cloned()
            .collect();
        tracing::debug!(
            expression = %expression,
            considered = project.file_count(),
            matched = matches.len(),
            "evaluated path expression"
        );
        Ok(MatchResult::new(project, matches))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Name(String),
    Path(String),
    Extension(String),
}

impl Predicate {
    fn holds(&self, file: &File) -> bool {
        match self {
            Predicate::Name(name) => file.name() == name,
            Predicate::Path(path) => file.path() == path,
            Predicate::Extension(ext) => file.extension() == Some(ext.as_str()),
        }
    }
}

#[derive(Debug)]
struct CompiledExpression {
    scope: GlobMatcher,
    predicates: Vec<Predicate>,
}

impl CompiledExpression {
    fn parse(expression: &str) -> Result<Self, QueryError> {
        let invalid = |reason: &str| QueryError::InvalidExpression {
            expression: expression.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = expression.trim();
        let body = trimmed
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let (path_part, predicate_part) = match body.find('[') {
            Some(idx) => body.split_at(idx),
            None => (body, ""),
        };

        let mut steps: Vec<&str> = path_part.split('/').collect();
        let file_step = steps.pop().unwrap_or_default();
        let name_test = file_step
            .strip_suffix(FILE_STEP_SUFFIX)
            .ok_or_else(|| invalid("last step must select ':file'"))?;
        if name_test.is_empty() {
            return Err(invalid("missing name test before ':file'"));
        }
        if steps.iter().any(|step| step.is_empty()) {
            return Err(invalid("empty path step"));
        }

        let glob = if steps.is_empty() {
            format!("**/{name_test}")
        } else {
            format!("{}/**/{name_test}", steps.join("/"))
        };
        let scope = GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .map_err(|err| invalid(&err.to_string()))?
            .compile_matcher();

        let predicates = parse_predicates(predicate_part).map_err(|reason| invalid(&reason))?;

        Ok(Self { scope, predicates })
    }

    fn is_match(&self, file: &File) -> bool {
        self.scope.is_match(file.path()) && self.predicates.iter().all(|p| p.holds(file))
    }
}

fn parse_predicates(input: &str) -> Result<Vec<Predicate>, String> {
    let mut predicates = Vec::new();
    let mut consumed = 0;

    for caps in PREDICATE.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if !input[consumed..whole.start()].trim().is_empty() {
            return Err(format!(
                "unexpected text '{}'",
                input[consumed..whole.start()].trim()
            ));
        }
        consumed = whole.end();

        let value = caps[2].to_owned();
        let predicate = match &caps[1] {
            "name" => Predicate::Name(value),
            "path" => Predicate::Path(value),
            "extension" => Predicate::Extension(value),
            other => return Err(format!("unknown attribute '{other}'")),
        };
        predicates.push(predicate);
    }

    let rest = input[consumed..].trim();
    if !rest.is_empty() {
        return Err(format!("unexpected text '{rest}'"));
    }
    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::from_files([
            ("pom.xml", "<project/>"),
            ("services/api/pom.xml", "<project/>"),
            ("services/api/src/Main.java", "class Main {}"),
            ("src/main/java/App.java", "class App {}"),
            ("README.md", "# readme"),
        ])
        .unwrap()
    }

    fn paths(expression: &str) -> Vec<String> {
        let project = project();
        let result = PathExpressionEngine::new()
            .evaluate(&project, &QueryExpression::new(expression))
            .unwrap();
        result.matches().map(|f| f.path().to_owned()).collect()
    }

    #[test]
    fn name_predicate_matches_at_any_depth() {
        assert_eq!(
            paths("/*:file[name='pom.xml']"),
            vec!["pom.xml", "services/api/pom.xml"]
        );
    }

    #[test]
    fn directory_steps_narrow_scope() {
        assert_eq!(
            paths("/services/*:file[extension='java']"),
            vec!["services/api/src/Main.java"]
        );
        assert_eq!(paths("/src/*.java:file"), vec!["src/main/java/App.java"]);
    }

    #[test]
    fn wildcard_selects_everything() {
        assert_eq!(paths("/*:file").len(), 5);
    }

    #[test]
    fn path_predicate_is_exact() {
        assert_eq!(paths("/*:file[path='README.md']"), vec!["README.md"]);
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let project = project();
        let result = PathExpressionEngine::new()
            .evaluate(&project, &"/*:file[name='build.gradle']".into())
            .unwrap();
        assert_eq!(result.match_count(), 0);
        assert_eq!(result.matches().count(), 0);
        assert_eq!(result.root().file_count(), 5);
    }

    #[test]
    fn evaluation_is_deterministic_and_read_only() {
        let project = project();
        let engine = PathExpressionEngine::new();
        let expr = QueryExpression::new("/*:file[extension='java']");
        let first: Vec<_> = engine.evaluate(&project, &expr).unwrap().matches().cloned().collect();
        let second: Vec<_> = engine.evaluate(&project, &expr).unwrap().matches().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(project, self::project());
    }

    #[test]
    fn rejects_malformed_expressions() {
        let project = project();
        let engine = PathExpressionEngine::new();
        for expr in [
            "*:file",
            "/src",
            "/:file",
            "/src//*:file",
            "/*:file[size='1']",
            "/*:file[name='a'] trailing",
            "/*:file[name=unquoted]",
        ] {
            let err = engine
                .evaluate(&project, &QueryExpression::new(expr))
                .unwrap_err();
            assert!(
                matches!(err, QueryError::InvalidExpression { .. }),
                "{expr} should be rejected"
            );
        }
    }
}
