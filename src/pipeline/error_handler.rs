use anyhow::Result;

use crate::{Opts, PipelineOutcome};

/// Check a finished run: under `strict` any failed input is an error; otherwise the
/// failures are logged (and listed on stderr when verbose). Call after the run returns.
pub fn check_outcome(opts: &Opts, outcome: &PipelineOutcome) -> Result<()> {
    let failed = outcome.failed_count();
    if failed == 0 {
        return Ok(());
    }
    if opts.strict {
        let first = &outcome.failures[0];
        return Err(anyhow::anyhow!(
            "{} of {} inputs failed (first: {} at {}: {})",
            failed,
            outcome.accepted,
            first.item.path.display(),
            first.stage,
            first.message
        ));
    }
    log::warn!("{} of {} inputs failed", failed, outcome.accepted);
    if opts.verbose {
        for f in &outcome.failures {
            eprintln!("  failed: {} ({}: {})", f.item.path.display(), f.stage, f.message);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureKind, FailureRecord, ItemKey, Stage};

    fn outcome_with_failure() -> PipelineOutcome {
        PipelineOutcome {
            accepted: 2,
            succeeded: vec![ItemKey::new(0, "a.cs")],
            failures: vec![FailureRecord {
                item: ItemKey::new(1, "b.cs"),
                stage: Stage::Read,
                kind: FailureKind::ReadFailure,
                message: "not found".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn strict_turns_failures_into_error() {
        let opts = Opts {
            strict: true,
            ..Default::default()
        };
        let err = check_outcome(&opts, &outcome_with_failure()).unwrap_err();
        assert!(err.to_string().contains("b.cs"));
    }

    #[test]
    fn lenient_only_warns() {
        assert!(check_outcome(&Opts::default(), &outcome_with_failure()).is_ok());
        let strict = Opts {
            strict: true,
            ..Default::default()
        };
        assert!(check_outcome(&strict, &PipelineOutcome::default()).is_ok());
    }
}
