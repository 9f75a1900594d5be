use std::sync::{Arc, PoisonError, RwLock};

use tokio::{runtime::Runtime, sync::broadcast};
use tracing::{trace, warn};

use crate::{
    Result, ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{RunEvent, RunEventKind},
    run::{RunId, RunStatus},
};

const EVENT_QUEUE_SIZE: usize = 2048;

pub type RunEventHandle = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Filters handlers registered through [`ChannelEvent`]; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct ChannelOptions {
    pub workflow_id: Option<String>,
    pub run_id: Option<RunId>,
    pub node_id: Option<String>,
}

impl ChannelOptions {
    /// Matches every run of a workflow, including runs started after registration.
    pub fn with_workflow(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: Some(workflow_id.into()),
            ..Default::default()
        }
    }

    pub fn with_run(run_id: impl Into<RunId>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            ..Default::default()
        }
    }

    pub fn with_node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            ..Default::default()
        }
    }

    fn is_match(
        &self,
        e: &RunEvent,
    ) -> bool {
        self.workflow_id.as_ref().is_none_or(|id| *id == e.workflow_id)
            && self.run_id.as_ref().is_none_or(|id| *id == e.run_id)
            && self.node_id.as_ref().is_none_or(|id| e.node_id.as_ref() == Some(id))
    }
}

/// Broadcast channel for run events.
///
/// Events can be consumed through [`Channel::subscribe`] or through handlers
/// registered with [`ChannelEvent`], which are invoked once [`Channel::listen`]
/// has started the dispatch loop.
pub struct Channel {
    event_queue: Arc<BroadcastQueue<RunEvent>>,
    handles: ShareLock<Vec<RunEventHandle>>,
    shutdown: Arc<Shutdown>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    pub fn new() -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            handles: Arc::new(RwLock::new(Vec::new())),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn publish(
        &self,
        event: RunEvent,
    ) -> Result<()> {
        self.event_queue.send(event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.event_queue.subscribe()
    }

    pub(crate) fn listen(
        &self,
        runtime: &Runtime,
    ) {
        let mut event_queue = self.event_queue.subscribe();
        let handles = self.handles.clone();
        let shutdown = self.shutdown.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    received = event_queue.recv() => match received {
                        Ok(e) => {
                            trace!("channel::dispatch({}, {})", e.run_id, e.kind.str());
                            let handlers = handles.read().unwrap_or_else(PoisonError::into_inner).clone();
                            for handle in handlers.iter() {
                                (handle)(&e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => warn!("event listener lagged, {} events dropped", n),
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    fn register(
        &self,
        handle: RunEventHandle,
    ) {
        self.handles.write().unwrap_or_else(PoisonError::into_inner).push(handle);
    }
}

#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,
    options: ChannelOptions,
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Self {
        Self {
            channel,
            options,
        }
    }

    /// Called with the run id and terminal status when a matching run completes.
    pub fn on_complete(
        &self,
        f: impl Fn(RunId, RunStatus) + Send + Sync + 'static,
    ) {
        let options = self.options.clone();
        self.channel.register(Arc::new(move |e| {
            if let RunEventKind::Completed { status, .. } = &e.kind
                && options.is_match(e)
            {
                f(e.run_id.clone(), *status);
            }
        }));
    }

    pub fn on_error(
        &self,
        f: impl Fn(&RunEvent) + Send + Sync + 'static,
    ) {
        let options = self.options.clone();
        self.channel.register(Arc::new(move |e| {
            if e.is_error() && options.is_match(e) {
                f(e);
            }
        }));
    }

    pub fn on_event(
        &self,
        f: impl Fn(&RunEvent) + Send + Sync + 'static,
    ) {
        let options = self.options.clone();
        self.channel.register(Arc::new(move |e| {
            if options.is_match(e) {
                f(e);
            }
        }));
    }
}
