use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::models::{Level, Problem};

const BUILTIN_CATALOG: &str = include_str!("../../content/problems.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    levels: Vec<Level>,
    problems: Vec<Problem>,
}

/// Read-only set of levels and problems, fixed at start-up.
#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    levels: Vec<Level>,
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    pub fn new(mut levels: Vec<Level>, problems: Vec<Problem>) -> Result<Self> {
        let mut seen = HashSet::new();
        for problem in &problems {
            if !seen.insert(problem.id) {
                bail!("duplicate problem id {}", problem.id);
            }
        }

        levels.sort_by_key(|level| level.level);
        for problem in &problems {
            if !levels.iter().any(|level| level.level == problem.level) {
                tracing::warn!(
                    "Problem {} references undeclared level {}",
                    problem.id,
                    problem.level
                );
            }
        }

        Ok(Self { levels, problems })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(raw).context("Failed to parse problem catalog")?;
        Self::new(file.levels, file.problems)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads `path` when given, the bundled catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let catalog = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read catalog {}", path.display()))?;
                Self::from_json(&raw)?
            }
            None => Self::builtin()?,
        };

        tracing::info!(
            "Problem catalog loaded: {} levels, {} problems",
            catalog.levels.len(),
            catalog.problems.len()
        );
        Ok(catalog)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, level: u8) -> Option<&Level> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn problem(&self, id: u32) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Problems of one level, in authoring order.
    pub fn by_level(&self, level: u8) -> Vec<&Problem> {
        self.problems.iter().filter(|p| p.level == level).collect()
    }
}
