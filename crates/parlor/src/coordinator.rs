//! The coordinator actor: the only task that touches session state.
//!
//! Connection handlers send [`Command`]s through a [`CoordinatorHandle`].
//! The actor interleaves those with fired effect timers and sweep ticks
//! in a single `select!` loop, so no two state changes ever overlap and
//! the registry needs no lock.

use parlor_protocol::{ClientMessage, PlayerId};
use parlor_tick::SweepTicker;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::dispatcher::Dispatcher;
use crate::gateway::{FrameSender, Hub};

/// Messages sent to the coordinator.
#[derive(Debug)]
pub(crate) enum Command {
    /// A connection opened. Frames for it go into `sender`.
    Connected { id: PlayerId, sender: FrameSender },

    /// A decoded client request.
    Inbound { from: PlayerId, msg: ClientMessage },

    /// A connection closed.
    Disconnected { id: PlayerId },
}

/// Cheap-to-clone sender side of the coordinator.
///
/// Sending never blocks, so it is safe from `Drop`. Sends after the
/// coordinator has stopped are dropped.
#[derive(Debug, Clone)]
pub(crate) struct CoordinatorHandle {
    sender: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    pub(crate) fn connected(&self, id: PlayerId, sender: FrameSender) {
        self.send(Command::Connected { id, sender });
    }

    pub(crate) fn inbound(&self, from: PlayerId, msg: ClientMessage) {
        self.send(Command::Inbound { from, msg });
    }

    pub(crate) fn disconnected(&self, id: PlayerId) {
        self.send(Command::Disconnected { id });
    }

    fn send(&self, cmd: Command) {
        if self.sender.send(cmd).is_err() {
            tracing::warn!("coordinator stopped, command dropped");
        }
    }
}

/// Spawns the coordinator. It runs until every handle is dropped.
pub(crate) fn spawn_coordinator(
    dispatcher: Dispatcher<Hub>,
    sweeper: SweepTicker,
) -> (CoordinatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(dispatcher, rx, sweeper));
    (CoordinatorHandle { sender: tx }, task)
}

async fn run(
    mut dispatcher: Dispatcher<Hub>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut sweeper: SweepTicker,
) {
    tracing::info!(sweep_period_s = sweeper.period().as_secs(), "coordinator started");

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(cmd) => handle(&mut dispatcher, cmd),
                None => break,
            },
            fired = dispatcher.next_effect() => dispatcher.fire(fired),
            _ = sweeper.wait_for_tick() => {
                dispatcher.sweep(Instant::now());
            }
        }
    }

    tracing::info!(
        sessions = dispatcher.registry().len(),
        "coordinator stopped"
    );
}

fn handle(dispatcher: &mut Dispatcher<Hub>, cmd: Command) {
    match cmd {
        Command::Connected { id, sender } => {
            dispatcher.gateway_mut().register(id, sender);
            tracing::debug!(player_id = %id, connections = dispatcher.gateway().len(), "connection registered");
        }
        Command::Inbound { from, msg } => dispatcher.handle(from, msg),
        Command::Disconnected { id } => {
            dispatcher.disconnect(id);
            dispatcher.gateway_mut().unregister(id);
            tracing::debug!(player_id = %id, connections = dispatcher.gateway().len(), "connection unregistered");
        }
    }
}
