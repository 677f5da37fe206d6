//! Result Aggregator - Fragments, Tallies and the Write Gate

use serde::{Deserialize, Serialize};

use crate::dispatch::Settlement;
use crate::request::ConstantSpec;
use crate::templates::RenderContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub rendered_text: String,
    pub fulfilled_count: usize,
    pub rejected_count: usize,
}

/// What the aggregator decided to do with the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Write,
    /// All-or-nothing is on and at least one request failed.
    Skip,
}

/// Single sequential pass over settlements paired with their constant names.
pub struct Aggregator<'a> {
    context: &'a RenderContext,
    fragments: Vec<String>,
    fulfilled: usize,
    rejected: usize,
}

impl<'a> Aggregator<'a> {
    pub fn new(context: &'a RenderContext) -> Self {
        Self {
            context,
            fragments: vec![],
            fulfilled: 0,
            rejected: 0,
        }
    }

    /// Rejected entries are counted and leave no trace in the output.
    pub fn accept(&mut self, key: &str, settlement: &Settlement) {
        match settlement {
            Settlement::Fulfilled { value, .. } => {
                self.fragments.push(self.context.body(key, value));
                self.fulfilled += 1;
            }
            Settlement::Rejected(_) => self.rejected += 1,
        }
    }

    pub fn finish(self) -> GenerationOutcome {
        GenerationOutcome {
            rendered_text: self.context.render(&self.fragments),
            fulfilled_count: self.fulfilled,
            rejected_count: self.rejected,
        }
    }
}

/// Aggregates `settlements`, which must be positionally aligned with `spec`.
pub fn aggregate(
    context: &RenderContext,
    spec: &ConstantSpec,
    settlements: &[Settlement],
) -> GenerationOutcome {
    debug_assert_eq!(spec.len(), settlements.len());
    let mut aggregator = Aggregator::new(context);
    for (name, settlement) in spec.names().zip(settlements) {
        aggregator.accept(name, settlement);
    }
    aggregator.finish()
}

pub fn decide(outcome: &GenerationOutcome, all_or_nothing: bool) -> WriteDecision {
    if outcome.rejected_count > 0 && all_or_nothing {
        WriteDecision::Skip
    } else {
        WriteDecision::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RequestFailure;
    use crate::request::RequestDescriptor;

    fn ok(value: &str) -> Settlement {
        Settlement::Fulfilled { value: value.into(), uri: "http://x".into() }
    }

    fn failed() -> Settlement {
        Settlement::Rejected(RequestFailure {
            message: "boom".into(),
            descriptor: RequestDescriptor::new("http://x"),
        })
    }

    fn spec(names: &[&str]) -> ConstantSpec {
        names
            .iter()
            .map(|n| (*n, RequestDescriptor::new(format!("http://{}", n))))
            .collect()
    }

    #[test]
    fn test_rejected_entries_are_omitted() {
        let ctx = RenderContext::new("c");
        let settlements = [ok("1"), failed(), ok("3")];
        let outcome = aggregate(&ctx, &spec(&["A", "B", "C"]), &settlements);
        assert_eq!(
            outcome.fulfilled_count,
            settlements.iter().filter(|s| s.is_fulfilled()).count()
        );
        assert_eq!(
            outcome.rendered_text,
            "angular.module('c').constant('A', 1).constant('C', 3);"
        );
        assert_eq!(outcome.fulfilled_count, 2);
        assert_eq!(outcome.rejected_count, 1);
    }

    #[test]
    fn test_all_rejected_still_renders_shell() {
        let ctx = RenderContext::new("c");
        let outcome = aggregate(&ctx, &spec(&["A"]), &[failed()]);
        assert_eq!(outcome.rendered_text, "angular.module('c');");
    }

    #[test]
    fn test_write_gate() {
        let ctx = RenderContext::new("c");
        let clean = aggregate(&ctx, &spec(&["A"]), &[ok("1")]);
        let partial = aggregate(&ctx, &spec(&["A", "B"]), &[ok("1"), failed()]);

        assert_eq!(decide(&clean, true), WriteDecision::Write);
        assert_eq!(decide(&partial, false), WriteDecision::Write);
        assert_eq!(decide(&partial, true), WriteDecision::Skip);
    }
}
