use crate::client::BraviaClient;
use crate::config::{Config, SyncConfig, UnreachablePolicy};
use crate::error::{Result, SyncError};
use crate::receiver::DenonClient;
use crate::types::{ReceiverCommand, ReceiverPower, ReceiverVolume, TargetVolume, VolumeReading};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

/// Device query that an iteration stopped at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DisplayPower,
    DisplayVolume,
    ReceiverPower,
    ReceiverVolume,
    SetVolume,
}

impl Step {
    /// Whether the step talks to the TV rather than the receiver
    pub fn is_display(self) -> bool {
        matches!(self, Step::DisplayPower | Step::DisplayVolume)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::DisplayPower => "TV power query",
            Step::DisplayVolume => "TV volume query",
            Step::ReceiverPower => "receiver power query",
            Step::ReceiverVolume => "receiver volume query",
            Step::SetVolume => "receiver volume set",
        };
        f.write_str(name)
    }
}

/// What a single pass through the loop did
#[derive(Debug)]
pub enum IterationOutcome {
    /// TV is in standby, nothing to sync
    DisplayOff,
    /// Receiver is not on
    ReceiverOff(ReceiverPower),
    /// A device query failed
    Failed { step: Step, error: SyncError },
    /// Receiver already at the target volume
    InSync(TargetVolume),
    /// Receiver was sent a new volume
    Adjusted { from: ReceiverVolume, to: TargetVolume },
}

/// Reconciliation policy: the TV is authoritative, the receiver follows
///
/// Returns the command that brings the receiver to the clamped TV volume,
/// or `None` when it is already there.
pub fn plan_reconcile(display: VolumeReading, receiver: ReceiverVolume, max_volume: u8) -> Option<ReceiverCommand> {
    let target = display.target(max_volume);
    if receiver.matches(target) {
        None
    } else {
        Some(ReceiverCommand::SetVolume(target.value()))
    }
}

/// Volume synchronization loop between a Bravia TV and a Denon receiver
///
/// # Example
///
/// ```no_run
/// use bravia_denon_sync::{Config, Synchronizer};
/// use tokio::sync::broadcast;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::load("bravia-denon-sync.toml")?;
///     let sync = Synchronizer::from_config(&config)?;
///
///     let (stop_tx, stop_rx) = broadcast::channel(1);
///     tokio::spawn(async move {
///         let _ = tokio::signal::ctrl_c().await;
///         let _ = stop_tx.send(());
///     });
///
///     sync.run(stop_rx).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Synchronizer {
    display: BraviaClient,
    receiver: DenonClient,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(display: BraviaClient, receiver: DenonClient, config: SyncConfig) -> Self {
        Self {
            display,
            receiver,
            config,
        }
    }

    /// Build both device clients from a full configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let display = BraviaClient::new(
            config.display.base_url.clone(),
            config.display.psk.clone(),
            Duration::from_millis(config.display.request_timeout_ms),
        )?;
        let receiver = DenonClient::new(
            config.receiver.address.clone(),
            Duration::from_millis(config.receiver.connect_timeout_ms),
            Duration::from_millis(config.receiver.read_timeout_ms),
        );
        Ok(Self::new(display, receiver, config.sync.clone()))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one pass: TV power, TV volume, receiver power, receiver volume, reconcile
    ///
    /// Sleeps are left to the caller. The only error returned is
    /// [`SyncError::ReceiverUnreachable`], when the receiver's power query
    /// fails at the transport level and the policy is to exit.
    pub async fn run_once(&self) -> Result<IterationOutcome> {
        tracing::info!("Checking TV power status...");
        match self.display.get_power_status().await {
            Ok(status) if status.is_on() => {}
            Ok(_) => {
                tracing::info!("TV is not on");
                return Ok(IterationOutcome::DisplayOff);
            }
            Err(error) => return Ok(failed(Step::DisplayPower, error)),
        }

        tracing::info!("TV is on, checking volume...");
        let display_volume = match self.display.get_volume().await {
            Ok(volume) => volume,
            Err(error) => return Ok(failed(Step::DisplayVolume, error)),
        };
        tracing::info!("TV volume is {}", display_volume);

        tracing::info!("Checking receiver status...");
        match self.receiver.power().await {
            Ok(ReceiverPower::On) => {}
            Ok(power) => {
                tracing::info!("Receiver is not on ({:?})", power);
                return Ok(IterationOutcome::ReceiverOff(power));
            }
            Err(error) => match self.config.on_receiver_unreachable {
                UnreachablePolicy::Exit => {
                    tracing::error!("Receiver at {} unreachable: {}", self.receiver.address(), error);
                    return Err(SyncError::ReceiverUnreachable(error.to_string()));
                }
                UnreachablePolicy::Retry => return Ok(failed(Step::ReceiverPower, error)),
            },
        }

        tracing::info!("Receiver is on, checking volume...");
        let receiver_volume = match self.receiver.volume().await {
            Ok(volume) => volume,
            Err(error) => return Ok(failed(Step::ReceiverVolume, error)),
        };
        tracing::info!("Receiver volume is {}", receiver_volume);

        let target = display_volume.target(self.config.max_volume);
        match plan_reconcile(display_volume, receiver_volume, self.config.max_volume) {
            None => Ok(IterationOutcome::InSync(target)),
            Some(command) => {
                tracing::info!("--> Setting receiver volume to {}", target);
                match self.receiver.send(command).await {
                    Ok(_) => Ok(IterationOutcome::Adjusted {
                        from: receiver_volume,
                        to: target,
                    }),
                    Err(error) => Ok(failed(Step::SetVolume, error)),
                }
            }
        }
    }

    /// Extra delay an outcome calls for on top of the poll interval
    pub fn backoff(&self, outcome: &IterationOutcome) -> Duration {
        match outcome {
            IterationOutcome::DisplayOff => self.config.display_retry(),
            IterationOutcome::ReceiverOff(_) => self.config.receiver_retry(),
            IterationOutcome::Failed { step, .. } if step.is_display() => self.config.display_retry(),
            IterationOutcome::Failed { .. } => self.config.receiver_retry(),
            IterationOutcome::InSync(_) | IterationOutcome::Adjusted { .. } => Duration::ZERO,
        }
    }

    /// Run until `stop` fires or all its senders are dropped
    ///
    /// Returns `Ok(())` when stopped and `Err` only for the fatal
    /// receiver-unreachable condition.
    pub async fn run(&self, mut stop: broadcast::Receiver<()>) -> Result<()> {
        loop {
            if !pause(self.config.poll_interval(), &mut stop).await {
                break;
            }

            let outcome = tokio::select! {
                _ = stop.recv() => break,
                outcome = self.run_once() => outcome?,
            };

            let backoff = self.backoff(&outcome);
            if !backoff.is_zero() && !pause(backoff, &mut stop).await {
                break;
            }
        }

        tracing::info!("Sync loop stopped");
        Ok(())
    }

    /// Run the loop on a background task
    pub fn start(&self) -> SyncHandle {
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let sync = self.clone();
        let task = tokio::spawn(async move { sync.run(stop_rx).await });
        SyncHandle { stop_tx, task }
    }
}

/// Handle to a loop started with [`Synchronizer::start`]
pub struct SyncHandle {
    stop_tx: broadcast::Sender<()>,
    task: tokio::task::JoinHandle<Result<()>>,
}

impl SyncHandle {
    /// Signal the loop to stop and wait for it to finish
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(());
        self.wait().await
    }

    /// Wait for the loop to finish on its own
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Io(std::io::Error::other(e.to_string()))),
        }
    }

    /// Whether the loop task has already ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn failed(step: Step, error: SyncError) -> IterationOutcome {
    tracing::warn!("{} failed: {}", step, error);
    IterationOutcome::Failed { step, error }
}

/// Sleep for `duration`; `false` if stop was requested meanwhile
async fn pause(duration: Duration, stop: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = stop.recv() => false,
        _ = sleep(duration) => true,
    }
}
