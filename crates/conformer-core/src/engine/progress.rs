/// Events emitted while a generation run advances.
///
/// A run is a sequence of phases (embedding, optimization, ...). Phases with
/// per-conformer work open a task and report one increment per conformer.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback.
///
/// The callback may be invoked from worker threads, so it must be `Sync`.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `PhaseStart` and a `PhaseFinish` event.
    pub fn phase<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let out = f();
        self.report(Progress::PhaseFinish);
        out
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn events_reach_the_callback_in_order() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));

        let value = reporter.phase("Embedding", || {
            reporter.report(Progress::TaskStart { total_steps: 2 });
            reporter.report(Progress::TaskIncrement);
            7
        });
        drop(reporter);

        assert_eq!(value, 7);
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "Embedding" },
                Progress::TaskStart { total_steps: 2 },
                Progress::TaskIncrement,
                Progress::PhaseFinish,
            ]
        );
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
        assert_eq!(reporter.phase("noop", || 1), 1);
    }
}
