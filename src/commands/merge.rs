use crate::commands::Context;
use crate::error::Result;
use crate::merge::{GitMergeFile, MergeOrchestrator, MergeOutcome, MergeRequest};
use std::path::Path;

/// Merge driver implementation (called by git with %A %O %B %P).
///
/// Returns the exit code git expects: 0 when clean, the number of conflicts
/// otherwise, or the merge tool's own status when it failed.
pub fn merge(ours: &Path, base: &Path, theirs: &Path, real_path: &Path) -> Result<i32> {
    let context = Context::load()?;
    let tool = GitMergeFile::new(context.settings.merge_program.as_str());
    let orchestrator = MergeOrchestrator::new(context.keys, tool);

    let request = MergeRequest::new(ours, base, theirs, real_path);
    let outcome = orchestrator.merge(&request)?;

    if let MergeOutcome::ToolError(code) = outcome {
        eprintln!(
            "Error: merging {} failed: merge tool exited with status {code}",
            real_path.display()
        );
    }

    Ok(outcome.exit_code())
}
