use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Outcome reports from the collaborators that run after a calculation.
#[derive(Debug)]
pub enum ServiceEvent {
    Persist(PersistEvent),
    Insight(InsightEvent),
    Done(Result<(), String>),
}

#[derive(Debug)]
pub enum PersistEvent {
    NotAuthorized,
    Saved { id: i64, sample: String },
    Failed(String),
}

#[derive(Debug)]
pub enum InsightEvent {
    Requested,
    Ready(usize),
    Unavailable(String),
    Failed(String),
    TimedOut,
}

pub type EventSender = UnboundedSender<ServiceEvent>;

pub trait ServiceEventSink {
    fn on_persist_event(&mut self, ev: &PersistEvent);
    fn on_insight_event(&mut self, ev: &InsightEvent);
    fn on_done(&mut self, res: &Result<(), String>);
}

/// Sends are best effort. A dropped receiver only means nobody is listening.
pub fn emit(sender: &EventSender, ev: ServiceEvent) {
    let _ = sender.send(ev);
}

pub fn drain_service_events<T: ServiceEventSink>(
    sink: &mut T,
    receiver: &mut UnboundedReceiver<ServiceEvent>,
) -> usize {
    let mut seen = 0;
    loop {
        match receiver.try_recv() {
            Ok(msg) => {
                seen += 1;
                match msg {
                    ServiceEvent::Persist(ev) => sink.on_persist_event(&ev),
                    ServiceEvent::Insight(ev) => sink.on_insight_event(&ev),
                    ServiceEvent::Done(res) => sink.on_done(&res),
                }
            },

            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    seen
}
