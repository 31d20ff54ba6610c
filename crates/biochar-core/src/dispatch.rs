//! Background work started once results are on screen.
//!
//! Every result gets an independent persistence task and, when a text generator
//! is configured, an independent insight task. The results themselves are
//! borrowed or cloned into the tasks and never written back.

use crate::calculator::CalculationResult;
use crate::narrative::{generate_insight, TextGenerator};
use crate::persistence::save_research_data;
use crate::processevent::{emit, EventSender, InsightEvent, ServiceEvent};

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

pub struct CollaboratorTasks {
    persist: Vec<JoinHandle<Option<i64>>>,
    insights: Vec<Option<JoinHandle<String>>>,
    events: EventSender,
}

pub fn spawn_collaborators(
    runtime: &Runtime,
    results: &[CalculationResult],
    db_path: PathBuf,
    generator: Option<Arc<dyn TextGenerator>>,
    events: EventSender,
) -> CollaboratorTasks {
    let mut persist = Vec::with_capacity(results.len());
    let mut insights = Vec::with_capacity(results.len());

    for res in results {
        persist.push(runtime.spawn(save_research_data(
            db_path.clone(),
            res.inputs.clone(),
            res.total_biochar_mass,
            events.clone(),
        )));

        insights.push(generator.as_ref().map(|generator| {
            let generator = Arc::clone(generator);
            let res = res.clone();
            let tx = events.clone();
            runtime.spawn(async move { generate_insight(generator.as_ref(), &res, &tx).await })
        }));
    }

    CollaboratorTasks { persist, insights, events }
}

impl CollaboratorTasks {
    pub fn is_finished(&self) -> bool {
        self.persist.iter().all(|h| h.is_finished())
            && self.insights.iter().flatten().all(|h| h.is_finished())
    }

    /// Polls until every task is done or `timeout` passes, calling `tick`
    /// between polls. Returns false on timeout.
    pub fn wait_with<F: FnMut()>(&self, timeout: Duration, mut tick: F) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            tick();
            if self.is_finished() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            // avoid busy-spinning a core at 100%
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// Cancels whatever is still running. Unfinished insights become empty text.
    pub fn abort_unfinished(&self) {
        for h in &self.persist {
            if !h.is_finished() {
                h.abort();
            }
        }
        for h in self.insights.iter().flatten() {
            if !h.is_finished() {
                h.abort();
                emit(&self.events, ServiceEvent::Insight(InsightEvent::TimedOut));
            }
        }
    }

    /// One entry per result, in result order. Missing or cancelled insights are `""`.
    pub fn collect_insights(self, runtime: &Runtime) -> Vec<String> {
        let _ = runtime.block_on(join_all(self.persist));
        self.insights
            .into_iter()
            .map(|h| match h {
                Some(handle) => runtime.block_on(handle).unwrap_or_default(),
                None => String::new(),
            })
            .collect()
    }
}
