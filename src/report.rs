use tracing::{error, info};

/// Where the runners send their progress and failures.
///
/// `fail` marks a case as failed without stopping the batch. Authoring errors
/// never reach the reporter; they come back as
/// [`HarnessError`](crate::HarnessError).
pub trait Reporter {
    fn log(&mut self, message: &str);

    fn fail(&mut self, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn log(&mut self, message: &str) {
        (**self).log(message);
    }

    fn fail(&mut self, message: &str) {
        (**self).fail(message);
    }
}

/// Forwards logs to `tracing` at `info` and failures at `error`.
#[derive(Debug, Default)]
pub struct TracingReporter {
    failures: usize,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl Reporter for TracingReporter {
    fn log(&mut self, message: &str) {
        info!("{message}");
    }

    fn fail(&mut self, message: &str) {
        self.failures += 1;
        error!("{message}");
    }
}

/// An event seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Log(String),
    Fail(String),
}

/// Keeps everything it is told, in order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn logs(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            Event::Log(message) => Some(message.as_str()),
            Event::Fail(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            Event::Fail(message) => Some(message.as_str()),
            Event::Log(_) => None,
        })
    }
}

impl Reporter for Recorder {
    fn log(&mut self, message: &str) {
        self.events.push(Event::Log(message.to_owned()));
    }

    fn fail(&mut self, message: &str) {
        self.events.push(Event::Fail(message.to_owned()));
    }
}
