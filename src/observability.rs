use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatterbox.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatterbox.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatterbox.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("chatterbox.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("chatterbox.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("chatterbox.stream.bytes");
pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("chatterbox.stream.fragments");
pub(crate) static STREAM_DURATION: Moments = Moments::new("chatterbox.stream.duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("chatterbox.session.turns");
pub(crate) static SESSION_TURN_FAILURES: Counter =
    Counter::new("chatterbox.session.turn_failures");
pub(crate) static SESSION_RESETS: Counter = Counter::new("chatterbox.session.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_TURN_FAILURES);
    collector.register_counter(&SESSION_RESETS);
}
