use std::future::Future;
use std::time::Duration;
use tokio::time;
use tracing::debug;

use crate::surface::DisplaySurface;

/// Simulated phase of the remote pipeline. Advanced by local timers only;
/// the backend reports nothing until the final response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStep {
    Transcribing,
    Generating,
    Synthesizing,
    Complete,
}

impl ProcessingStep {
    pub fn status_line(&self) -> &'static str {
        match self {
            ProcessingStep::Transcribing => "Transcribing your audio...",
            ProcessingStep::Generating => "Generating AI response...",
            ProcessingStep::Synthesizing => "Creating audio response...",
            ProcessingStep::Complete => "Complete!",
        }
    }

    pub fn position(&self) -> u8 {
        match self {
            ProcessingStep::Transcribing => 1,
            ProcessingStep::Generating => 2,
            ProcessingStep::Synthesizing | ProcessingStep::Complete => 3,
        }
    }
}

impl std::fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStep::Transcribing => write!(f, "transcribing"),
            ProcessingStep::Generating => write!(f, "generating"),
            ProcessingStep::Synthesizing => write!(f, "synthesizing"),
            ProcessingStep::Complete => write!(f, "complete"),
        }
    }
}

/// Rough durations of the first two remote phases, estimated from typical
/// pipeline latency.
pub const GENERATING_AFTER: Duration = Duration::from_secs(3);
pub const SYNTHESIZING_AFTER: Duration = Duration::from_secs(6);

/// Cosmetic pause between the Complete step and the success view.
pub const COMPLETE_PAUSE: Duration = Duration::from_millis(500);

/// Drive `request` to completion while advancing the step indicator on the
/// simulated schedule. The sleep futures live inside this racing loop, so
/// they are dropped the moment the request settles; a step can never be
/// rendered after the final result, on any exit path.
pub async fn drive<T>(
    surface: &mut dyn DisplaySurface,
    request: impl Future<Output = T>,
) -> T {
    tokio::pin!(request);

    let generating = time::sleep(GENERATING_AFTER);
    tokio::pin!(generating);
    let synthesizing = time::sleep(SYNTHESIZING_AFTER);
    tokio::pin!(synthesizing);

    let mut generating_fired = false;
    let mut synthesizing_fired = false;

    loop {
        tokio::select! {
            _ = &mut generating, if !generating_fired => {
                generating_fired = true;
                debug!("Simulated step: generating");
                surface.set_step(ProcessingStep::Generating);
            }
            _ = &mut synthesizing, if !synthesizing_fired => {
                synthesizing_fired = true;
                debug!("Simulated step: synthesizing");
                surface.set_step(ProcessingStep::Synthesizing);
            }
            result = &mut request => break result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::View;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct StepRecorder {
        steps: Arc<Mutex<Vec<ProcessingStep>>>,
    }

    impl StepRecorder {
        fn recorded(&self) -> Vec<ProcessingStep> {
            self.steps.lock().unwrap().clone()
        }
    }

    impl DisplaySurface for StepRecorder {
        fn show_view(&mut self, _view: &View) {}
        fn set_step(&mut self, step: ProcessingStep) {
            self.steps.lock().unwrap().push(step);
        }
        fn show_selection(&mut self, _name: &str, _size: u64) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_steps_fire_while_request_is_slow() {
        let recorder = StepRecorder::default();
        let mut surface = recorder.clone();

        let result = drive(&mut surface, async {
            time::sleep(Duration::from_secs(7)).await;
            42
        })
        .await;

        assert_eq!(result, 42);
        assert_eq!(
            recorder.recorded(),
            vec![ProcessingStep::Generating, ProcessingStep::Synthesizing]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_settlement_fires_no_steps() {
        let recorder = StepRecorder::default();
        let mut surface = recorder.clone();

        let result = drive(&mut surface, std::future::ready("ok")).await;
        assert_eq!(result, "ok");

        // Advancing virtual time past both deadlines must mutate nothing:
        // the timers died with the racing loop.
        time::advance(Duration::from_secs(10)).await;
        assert!(recorder.recorded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_step_fires_after_mid_schedule_settlement() {
        let recorder = StepRecorder::default();
        let mut surface = recorder.clone();

        drive(&mut surface, async {
            time::sleep(Duration::from_secs(4)).await;
        })
        .await;

        assert_eq!(recorder.recorded(), vec![ProcessingStep::Generating]);

        time::advance(Duration::from_secs(10)).await;
        assert_eq!(recorder.recorded(), vec![ProcessingStep::Generating]);
    }

    #[test]
    fn test_step_status_lines() {
        assert_eq!(
            ProcessingStep::Transcribing.status_line(),
            "Transcribing your audio..."
        );
        assert_eq!(
            ProcessingStep::Generating.status_line(),
            "Generating AI response..."
        );
        assert_eq!(
            ProcessingStep::Synthesizing.status_line(),
            "Creating audio response..."
        );
        assert_eq!(ProcessingStep::Complete.status_line(), "Complete!");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(format!("{}", ProcessingStep::Transcribing), "transcribing");
        assert_eq!(format!("{}", ProcessingStep::Complete), "complete");
    }

    #[test]
    fn test_step_positions() {
        assert_eq!(ProcessingStep::Transcribing.position(), 1);
        assert_eq!(ProcessingStep::Generating.position(), 2);
        assert_eq!(ProcessingStep::Synthesizing.position(), 3);
    }
}
