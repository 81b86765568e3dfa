//! Stateful accumulation of response fragments into one assistant turn.

use std::collections::BTreeMap;

use bprovider::{FinishReason, Message, ResponseFragment, TokenUsage, ToolCall};

/// Merges the fragment sequence of one exchange into a single logical
/// assistant turn.
///
/// Owned exclusively by one tool-loop invocation and passed by mutable
/// reference into each round; never shared across exchanges. Text content
/// accumulates across every round of the exchange, while the tool-call
/// shard map is cleared between tool sub-rounds so each round only reports
/// the calls it introduced.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    content: String,
    reasoning: String,
    shards: BTreeMap<u32, PendingCall>,
    usage: Option<TokenUsage>,
    finish_reason: Option<FinishReason>,
    notes: Vec<String>,
    finished: bool,
}

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one fragment. Text concatenates, shard argument deltas append
    /// under their index, usage and finish metadata are last-write-wins.
    /// After `mark_done` this is a no-op, so the terminal turn is stable no
    /// matter what still arrives.
    pub fn absorb(&mut self, fragment: ResponseFragment) {
        if self.finished {
            return;
        }

        self.content.push_str(&fragment.content);

        if let Some(reasoning) = fragment.reasoning {
            self.reasoning.push_str(&reasoning);
        }

        if let Some(shard) = fragment.tool_call_delta {
            let entry = self.shards.entry(shard.index).or_default();

            // First sighting wins for identity fields; deltas only ever
            // extend the arguments.
            if entry.id.is_none() {
                entry.id = shard.id;
            }
            if entry.name.is_none() {
                entry.name = shard.name;
            }
            entry.arguments.push_str(&shard.arguments_delta);
        }

        if let Some(usage) = fragment.usage {
            self.usage = Some(usage);
        }

        if let Some(finish_reason) = fragment.finish_reason {
            self.finish_reason = Some(finish_reason);
        }

        if let Some(note) = fragment.note {
            self.notes.push(note);
        }
    }

    /// Detached snapshot of the turn as built so far, safe to hand to a
    /// callback while accumulation continues.
    pub fn snapshot(&self) -> Message {
        let mut message = Message::assistant(self.content.clone());

        if !self.reasoning.is_empty() {
            message.reasoning = Some(self.reasoning.clone());
        }

        message.tool_calls = self.named_calls();
        message.usage = self.usage;
        message
    }

    /// Calls whose identity is complete (a name has been seen). Whether the
    /// arguments have stopped growing is not this type's call: the round
    /// driver decides completeness from the stream's own terminal signal.
    pub fn resolved_calls(&self) -> Vec<ToolCall> {
        self.named_calls()
    }

    /// Resets only the shard map, keeping accumulated text, so the next
    /// tool sub-round collects genuinely new calls into the same turn.
    pub fn clear_tool_calls(&mut self) {
        self.shards.clear();
    }

    pub fn mark_done(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    pub fn last_note(&self) -> Option<&str> {
        self.notes.last().map(String::as_str)
    }

    fn named_calls(&self) -> Vec<ToolCall> {
        self.shards
            .iter()
            .filter_map(|(index, pending)| {
                let name = pending.name.clone()?;
                Some(ToolCall {
                    id: pending
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("tool_call_{index}")),
                    name,
                    arguments: pending.arguments.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bprovider::ToolCallShard;

    use super::*;

    #[test]
    fn text_fragments_concatenate_in_arrival_order() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::text("The answer"));
        accumulator.absorb(ResponseFragment::text(" is 4"));

        assert_eq!(accumulator.snapshot().content, "The answer is 4");
    }

    #[test]
    fn shards_sharing_an_index_merge_into_one_call() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0)
                .with_id("call_1")
                .with_name("add")
                .with_arguments("{\"a\":"),
        ));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_arguments("2,\"b\":"),
        ));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_arguments("2}"),
        ));

        let calls = accumulator.resolved_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "add");
        assert_eq!(calls[0].arguments, "{\"a\":2,\"b\":2}");
    }

    #[test]
    fn distinct_indexes_stay_distinct_calls() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_id("call_a").with_name("first"),
        ));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(1).with_id("call_b").with_name("second"),
        ));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_arguments("{}"),
        ));

        let calls = accumulator.resolved_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "first");
        assert_eq!(calls[0].arguments, "{}");
        assert_eq!(calls[1].name, "second");
    }

    #[test]
    fn identity_fields_are_remembered_once_seen() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_id("call_1").with_name("add"),
        ));
        // A later shard must not overwrite identity.
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_id("call_other").with_name("subtract"),
        ));

        let calls = accumulator.resolved_calls();
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "add");
    }

    #[test]
    fn unnamed_shards_are_not_resolved_calls() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(3).with_arguments("{\"x\":1}"),
        ));

        assert!(accumulator.resolved_calls().is_empty());
        assert!(accumulator.snapshot().tool_calls.is_empty());
    }

    #[test]
    fn usage_and_finish_metadata_are_last_write_wins() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::usage(TokenUsage {
            input_tokens: 1,
            output_tokens: 1,
            total_tokens: 2,
        }));
        accumulator.absorb(ResponseFragment::finished(FinishReason::ToolCalls));
        accumulator.absorb(ResponseFragment::usage(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        }));
        accumulator.absorb(ResponseFragment::finished(FinishReason::Stop));

        assert_eq!(accumulator.usage().map(|usage| usage.total_tokens), Some(15));
        assert_eq!(accumulator.finish_reason(), Some(FinishReason::Stop));
    }

    #[test]
    fn clear_tool_calls_keeps_accumulated_text() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::text("partial"));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(0).with_id("call_1").with_name("add"),
        ));

        accumulator.clear_tool_calls();

        assert!(accumulator.resolved_calls().is_empty());
        assert_eq!(accumulator.snapshot().content, "partial");
    }

    #[test]
    fn absorb_after_mark_done_changes_nothing() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::text("final"));
        accumulator.mark_done();

        let before = accumulator.snapshot();
        accumulator.absorb(ResponseFragment::text(" extra"));
        accumulator.absorb(ResponseFragment::shard(
            ToolCallShard::new(9).with_name("late"),
        ));

        assert_eq!(accumulator.snapshot(), before);
        assert!(accumulator.is_finished());
    }

    #[test]
    fn notes_surface_latest_parse_failure() {
        let mut accumulator = TurnAccumulator::new();
        assert_eq!(accumulator.last_note(), None);

        accumulator.absorb(ResponseFragment::note("bad line 1"));
        accumulator.absorb(ResponseFragment::note("bad line 2"));
        assert_eq!(accumulator.last_note(), Some("bad line 2"));
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut accumulator = TurnAccumulator::new();
        accumulator.absorb(ResponseFragment::text("one"));
        let snapshot = accumulator.snapshot();
        accumulator.absorb(ResponseFragment::text(" two"));

        assert_eq!(snapshot.content, "one");
        assert_eq!(accumulator.snapshot().content, "one two");
    }
}
