use biometrics::{Collector, Counter, Moments};

pub(crate) static HISTORY_LOADS: Counter = Counter::new("chatline.history.loads");
pub(crate) static HISTORY_FAILURES: Counter = Counter::new("chatline.history.failures");
pub(crate) static HISTORY_MESSAGES: Counter = Counter::new("chatline.history.messages");

pub(crate) static SENDS: Counter = Counter::new("chatline.send.requests");
pub(crate) static SEND_FAILURES: Counter = Counter::new("chatline.send.failures");
pub(crate) static SENDS_IGNORED: Counter = Counter::new("chatline.send.ignored");
pub(crate) static SENDS_BUSY: Counter = Counter::new("chatline.send.busy");
pub(crate) static SEND_IMAGES: Counter = Counter::new("chatline.send.images");

pub(crate) static STORAGE_FAILURES: Counter = Counter::new("chatline.storage.failures");

pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatline.client.request_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&HISTORY_LOADS);
    collector.register_counter(&HISTORY_FAILURES);
    collector.register_counter(&HISTORY_MESSAGES);

    collector.register_counter(&SENDS);
    collector.register_counter(&SEND_FAILURES);
    collector.register_counter(&SENDS_IGNORED);
    collector.register_counter(&SENDS_BUSY);
    collector.register_counter(&SEND_IMAGES);

    collector.register_counter(&STORAGE_FAILURES);

    collector.register_moments(&CLIENT_REQUEST_DURATION);
}
