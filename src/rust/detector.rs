use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::HardwareError;
use crate::gpio::DigitalPin;

/// Last sampled level of the sensor. The line is assumed clear at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeState {
    last_level: bool,
}

impl EdgeState {
    pub fn last_level(&self) -> bool {
        self.last_level
    }

    /// Records a sample, returning the command for the edge it completes, if any.
    pub fn observe(&mut self, level: bool) -> Option<Command> {
        if level == self.last_level {
            return None;
        }
        self.last_level = level;
        Some(if level { Command::Start } else { Command::Stop })
    }
}

/// Polls the motion sensor and turns level changes into recording commands.
///
/// Termination requests are handled in the same loop so that `EdgeState`
/// has a single owner: on shutdown a final `Stop` is emitted if the sensor
/// was last seen high.
pub struct EdgeDetector {
    pin: Box<dyn DigitalPin>,
    state: EdgeState,
    interval: Duration,
    commands: mpsc::Sender<Command>,
    shutdown: mpsc::Receiver<()>,
}

impl EdgeDetector {
    pub fn new(
        pin: Box<dyn DigitalPin>,
        interval: Duration,
        commands: mpsc::Sender<Command>,
        shutdown: mpsc::Receiver<()>,
    ) -> Self {
        EdgeDetector {
            pin,
            state: EdgeState::default(),
            interval,
            commands,
            shutdown,
        }
    }

    /// Runs until a shutdown request arrives or the pin fails.
    ///
    /// `done` is signalled once the terminal `Stop` (if any) has been queued.
    /// The pin is handed back so the caller can close it.
    pub async fn run(
        mut self,
        done: oneshot::Sender<()>,
    ) -> (Box<dyn DigitalPin>, Result<(), HardwareError>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;

                Some(()) = self.shutdown.recv() => {
                    info!("Got termination request");
                    break Ok(());
                }

                _ = ticker.tick() => {
                    match self.pin.read() {
                        Ok(level) => {
                            if let Some(cmd) = self.state.observe(level) {
                                info!(pin = self.pin.id(), %cmd, "Motion state changed");
                                emit(&self.commands, cmd).await;
                            }
                        }
                        Err(e) => {
                            error!(pin = self.pin.id(), error = %e, "Motion sensor read failed");
                            break Err(e);
                        }
                    }
                }
            }
        };

        // Presumably still recording, so stop before handing control back.
        if self.state.last_level() {
            emit(&self.commands, Command::Stop).await;
        }
        if done.send(()).is_err() {
            debug!("Shutdown completion receiver dropped");
        }

        (self.pin, result)
    }
}

/// Queues a command, waiting while the previous one is still unconsumed.
async fn emit(commands: &mpsc::Sender<Command>, cmd: Command) {
    if let Err(e) = commands.send(cmd).await {
        warn!(cmd = %e.0, "Recording dispatcher is gone, command dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed level sequence, then holds the last level.
    struct ScriptedPin {
        levels: Mutex<VecDeque<Result<bool, ()>>>,
        last: Mutex<bool>,
        reads: Arc<AtomicUsize>,
    }

    impl ScriptedPin {
        fn new(levels: &[bool]) -> Self {
            Self::with_results(levels.iter().map(|&l| Ok(l)).collect())
        }

        fn with_results(levels: Vec<Result<bool, ()>>) -> Self {
            ScriptedPin {
                levels: Mutex::new(levels.into()),
                last: Mutex::new(false),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl DigitalPin for ScriptedPin {
        fn id(&self) -> u32 {
            4
        }

        fn read(&self) -> Result<bool, HardwareError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let mut last = self.last.lock().unwrap();
            match self.levels.lock().unwrap().pop_front() {
                Some(Ok(level)) => *last = level,
                Some(Err(())) => {
                    return Err(HardwareError::NoData { id: 4, attempts: 1 });
                }
                None => {}
            }
            Ok(*last)
        }

        fn close(&mut self) -> Result<(), HardwareError> {
            Ok(())
        }
    }

    fn edges(levels: &[bool]) -> Vec<Command> {
        let mut state = EdgeState::default();
        levels.iter().filter_map(|&l| state.observe(l)).collect()
    }

    #[test]
    fn one_command_per_edge() {
        assert_eq!(
            edges(&[false, false, true, true, false]),
            vec![Command::Start, Command::Stop]
        );
        assert_eq!(
            edges(&[true, false, true, true, true, false, false, true]),
            vec![
                Command::Start,
                Command::Stop,
                Command::Start,
                Command::Stop,
                Command::Start
            ]
        );
    }

    #[test]
    fn steady_levels_emit_nothing() {
        assert!(edges(&[false; 10]).is_empty());

        let mut state = EdgeState::default();
        assert_eq!(state.observe(true), Some(Command::Start));
        for _ in 0..10 {
            assert_eq!(state.observe(true), None);
        }
        assert!(state.last_level());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_shutdown() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();
        let pin = ScriptedPin::new(&[false, false, true, true, false]);
        let reads = pin.reads.clone();

        let detector = EdgeDetector::new(
            Box::new(pin),
            Duration::from_millis(250),
            cmd_tx,
            shutdown_rx,
        );
        let task = tokio::spawn(detector.run(done_tx));

        assert_eq!(cmd_rx.recv().await, Some(Command::Start));
        assert_eq!(cmd_rx.recv().await, Some(Command::Stop));
        time::sleep(Duration::from_secs(1)).await;
        assert!(reads.load(Ordering::SeqCst) > 5);

        shutdown_tx.send(()).await.unwrap();
        done_rx.await.unwrap();
        let (_, result) = task.await.unwrap();
        assert!(result.is_ok());
        // Sensor was clear, so nothing else is emitted.
        assert_eq!(cmd_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_while_high_emits_final_stop() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();

        let detector = EdgeDetector::new(
            Box::new(ScriptedPin::new(&[false, true])),
            Duration::from_millis(250),
            cmd_tx,
            shutdown_rx,
        );
        let task = tokio::spawn(detector.run(done_tx));

        assert_eq!(cmd_rx.recv().await, Some(Command::Start));
        shutdown_tx.send(()).await.unwrap();

        assert_eq!(cmd_rx.recv().await, Some(Command::Stop));
        done_rx.await.unwrap();
        task.await.unwrap().1.unwrap();
        assert_eq!(cmd_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn read_failure_stops_recording_and_reports() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();

        let detector = EdgeDetector::new(
            Box::new(ScriptedPin::with_results(vec![Ok(true), Err(())])),
            Duration::from_millis(250),
            cmd_tx,
            shutdown_rx,
        );
        let task = tokio::spawn(detector.run(done_tx));

        assert_eq!(cmd_rx.recv().await, Some(Command::Start));
        assert_eq!(cmd_rx.recv().await, Some(Command::Stop));
        done_rx.await.unwrap();
        let (_, result) = task.await.unwrap();
        assert!(matches!(result, Err(HardwareError::NoData { .. })));
    }
}
