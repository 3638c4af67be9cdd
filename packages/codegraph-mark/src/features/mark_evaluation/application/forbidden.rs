/*
 * Forbidden Calls
 *
 * Every call matching an op statement flagged `forbidden` is a finding,
 * independent of any rule.
 */

use super::run_context::RunContext;
use crate::features::mark_evaluation::domain::{Finding, FindingDetail};
use tracing::debug;

/// Report forbidden calls; returns the number of matched calls
pub(crate) fn report_forbidden_calls(run: &RunContext<'_>) -> usize {
    let graph = run.graph;
    let mut reported = 0;
    for entity in run.model.entities() {
        for op in &entity.ops {
            let Some(bound) = run.bindings.get(&entity.name, &op.name) else {
                continue;
            };
            let forbidden = op
                .statements
                .iter()
                .zip(&bound.by_statement)
                .filter(|(statement, _)| statement.forbidden);
            for (statement, calls) in forbidden {
                for &call in calls {
                    let (file, ranges) = match graph.source_range(call) {
                        Some((file, span)) => (file, vec![span]),
                        None => (String::new(), Vec::new()),
                    };
                    run.aggregator.add(Finding::new(
                        format!("{}.{}", entity.name, op.name),
                        FindingDetail::ForbiddenCall {
                            pattern: statement.call.to_string(),
                            entity: entity.name.clone(),
                            code: graph.code(call),
                        },
                        "",
                        file,
                        ranges,
                    ));
                    reported += 1;
                }
            }
        }
    }
    debug!("{} forbidden calls", reported);
    reported
}
