use crate::commands::Context;
use crate::credentials::Environment;
use crate::diff::DiffOrchestrator;
use crate::error::Result;
use std::io::{self, Write};
use std::path::Path;

/// Diff filter implementation (called by git as textconv)
pub fn diff(path: &Path, environment: Option<&str>) -> Result<()> {
    let context = Context::load()?;
    let orchestrator = DiffOrchestrator::new(context.keys);

    let text = orchestrator.diff(path, environment.map(Environment::parse))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&text)?;
    stdout.flush()?;
    Ok(())
}
