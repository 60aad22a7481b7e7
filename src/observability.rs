use biometrics::{Collector, Counter, Moments};

pub(crate) static PROVIDER_REQUESTS: Counter = Counter::new("geminichat.provider.requests");
pub(crate) static PROVIDER_REQUEST_ERRORS: Counter =
    Counter::new("geminichat.provider.request_errors");
pub(crate) static PROVIDER_REQUEST_DURATION: Moments =
    Moments::new("geminichat.provider.request_duration_seconds");

pub(crate) static BRIDGE_CHAT_REQUESTS: Counter = Counter::new("geminichat.bridge.chat_requests");
pub(crate) static BRIDGE_ANALYZE_REQUESTS: Counter =
    Counter::new("geminichat.bridge.analyze_requests");
pub(crate) static BRIDGE_CLEARS: Counter = Counter::new("geminichat.bridge.clears");
pub(crate) static BRIDGE_EMPTY_INPUT: Counter = Counter::new("geminichat.bridge.empty_input");
pub(crate) static BRIDGE_EMPTY_REPLY: Counter = Counter::new("geminichat.bridge.empty_reply");
pub(crate) static BRIDGE_RATE_LIMITED: Counter = Counter::new("geminichat.bridge.rate_limited");
pub(crate) static BRIDGE_UNAVAILABLE: Counter = Counter::new("geminichat.bridge.unavailable");
pub(crate) static BRIDGE_UNKNOWN: Counter = Counter::new("geminichat.bridge.unknown");

pub(crate) static RESIZE_BATCHES: Counter = Counter::new("geminichat.resize.batches");
pub(crate) static RESIZE_IMAGES: Counter = Counter::new("geminichat.resize.images");
pub(crate) static RESIZE_DURATION: Moments = Moments::new("geminichat.resize.duration_seconds");

pub(crate) static CLIENT_SUBMITS: Counter = Counter::new("geminichat.client.submits");
pub(crate) static CLIENT_TRANSPORT_ERRORS: Counter =
    Counter::new("geminichat.client.transport_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&PROVIDER_REQUESTS);
    collector.register_counter(&PROVIDER_REQUEST_ERRORS);
    collector.register_moments(&PROVIDER_REQUEST_DURATION);

    collector.register_counter(&BRIDGE_CHAT_REQUESTS);
    collector.register_counter(&BRIDGE_ANALYZE_REQUESTS);
    collector.register_counter(&BRIDGE_CLEARS);
    collector.register_counter(&BRIDGE_EMPTY_INPUT);
    collector.register_counter(&BRIDGE_EMPTY_REPLY);
    collector.register_counter(&BRIDGE_RATE_LIMITED);
    collector.register_counter(&BRIDGE_UNAVAILABLE);
    collector.register_counter(&BRIDGE_UNKNOWN);

    collector.register_counter(&RESIZE_BATCHES);
    collector.register_counter(&RESIZE_IMAGES);
    collector.register_moments(&RESIZE_DURATION);

    collector.register_counter(&CLIENT_SUBMITS);
    collector.register_counter(&CLIENT_TRANSPORT_ERRORS);
}
