//! One request/response round against the remote endpoint.

use bprovider::{
    ChatTransport, LineDecoder, Message, ProviderConfig, RequestContext, ResponseFragment,
    ToolDefinition, TransportBody, WireDialect,
};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{ChatError, TurnAccumulator, TurnObserver, TurnUpdate};

/// Drives one round: build the outbound body, issue the HTTP call with the
/// live cancellation token attached, and feed every produced fragment to
/// the accumulator, invoking the observer once per fragment.
///
/// Holds only borrows; the accumulator is owned by the tool loop and passed
/// in by mutable reference for each round.
pub(crate) struct RoundDriver<'a> {
    pub transport: &'a dyn ChatTransport,
    pub dialect: &'a dyn WireDialect,
    pub config: &'a ProviderConfig,
    pub tools: &'a [ToolDefinition],
}

impl RoundDriver<'_> {
    pub(crate) async fn drive(
        &self,
        messages: &[Message],
        accumulator: &mut TurnAccumulator,
        cancel: &CancellationToken,
        observer: &TurnObserver,
    ) -> Result<(), ChatError> {
        if cancel.is_cancelled() {
            return Err(ChatError::aborted("exchange terminated before the round"));
        }

        let body = self.dialect.build_request(&RequestContext {
            config: self.config,
            messages,
            tools: self.tools,
        })?;
        let url = self.config.endpoint(self.dialect.chat_path());
        let streaming = self.config.options.stream;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ChatError::aborted("exchange terminated during the request"));
            }
            outcome = self.transport.post_chat(&url, self.config.api_key.as_ref(), &body, streaming) => {
                outcome?
            }
        };

        match response {
            TransportBody::Full(text) => {
                for fragment in self.dialect.parse_chunk(&text, false) {
                    self.apply(fragment, accumulator, observer);
                }
            }
            TransportBody::Chunked(mut chunks) => {
                let mut decoder = LineDecoder::new();
                let mut reached_terminal = false;

                while !reached_terminal {
                    // Cancellation is observed at least once per yielded
                    // chunk, between network reads.
                    let item = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(ChatError::aborted("exchange terminated mid-stream"));
                        }
                        item = chunks.next() => item,
                    };

                    let Some(item) = item else { break };
                    let bytes = item?;

                    for line in decoder.push(&bytes) {
                        for fragment in self.dialect.parse_chunk(&line, true) {
                            reached_terminal |= fragment.terminal;
                            self.apply(fragment, accumulator, observer);
                        }
                    }
                }

                if !reached_terminal && let Some(rest) = decoder.finish() {
                    for fragment in self.dialect.parse_chunk(&rest, true) {
                        self.apply(fragment, accumulator, observer);
                    }
                }
            }
        }

        Ok(())
    }

    fn apply(
        &self,
        fragment: ResponseFragment,
        accumulator: &mut TurnAccumulator,
        observer: &TurnObserver,
    ) {
        accumulator.absorb(fragment);
        observer(TurnUpdate {
            message: accumulator.snapshot(),
            status: 200,
            detail: accumulator.last_note().map(ToString::to_string),
            finished: false,
        });
    }
}
