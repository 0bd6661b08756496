use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::{ActorStopReason, BoxError};
use kameo::mailbox::unbounded::UnboundedMailbox;
use kameo::message::{Context, Message};
use kameo::request::MessageSend;
use kameo::Actor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::market::provider::SeriesProvider;
use crate::seasonality::classify::ClassifiedView;

use super::{build_view, ViewRequest};

/// Complete output of one view-render cycle, swapped in atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub request: ViewRequest,
    pub view: ClassifiedView,
}

/// Current state of the calendar view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ViewState {
    Idle,
    Loading,
    Ready(ViewSnapshot),
    /// Fetch or validation failure, surfaced as a non-fatal inline message.
    Failed(String),
}

/// View actor messages for telling (fire-and-forget)
#[derive(Debug, Clone)]
pub enum ViewTell {
    /// Start a fresh render cycle for new inputs; supersedes any in-flight one
    Refresh(ViewRequest),
    /// Internal completion message from a spawned pipeline run
    Completed {
        generation: u64,
        outcome: Result<ViewSnapshot, String>,
    },
}

/// View actor messages for asking (request-response)
#[derive(Debug, Clone)]
pub enum ViewAsk {
    GetState,
}

/// View actor replies
#[derive(Debug, Clone)]
pub enum ViewReply {
    State(ViewState),
}

/// Owns the view-state of one calendar: current request, generation counter
/// and the latest classified snapshot.
///
/// Every `Refresh` bumps the generation before spawning the pipeline; a
/// `Completed` carrying an older generation is discarded without touching
/// the snapshot, so switching inputs mid-fetch can never merge stale data
/// into the visible state.
pub struct CalendarViewActor {
    provider: Arc<dyn SeriesProvider>,
    generation: u64,
    state: ViewState,
    refreshes_started: u64,
    stale_results_discarded: u64,
}

impl CalendarViewActor {
    pub fn new(provider: Arc<dyn SeriesProvider>) -> Self {
        Self {
            provider,
            generation: 0,
            state: ViewState::Idle,
            refreshes_started: 0,
            stale_results_discarded: 0,
        }
    }
}

impl Actor for CalendarViewActor {
    type Mailbox = UnboundedMailbox<Self>;

    fn name() -> &'static str {
        "CalendarViewActor"
    }

    async fn on_start(&mut self, _actor_ref: ActorRef<Self>) -> Result<(), BoxError> {
        info!("Starting calendar view actor");
        Ok(())
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        _reason: ActorStopReason,
    ) -> Result<(), BoxError> {
        info!(
            "Stopping calendar view actor: {} refreshes, {} stale results discarded",
            self.refreshes_started, self.stale_results_discarded
        );
        if let Some(stats) = self.provider.session_stats() {
            info!(
                "Final API stats: {} requests, {:.1}% success rate, {} candles fetched",
                stats.requests_made,
                stats.success_rate() * 100.0,
                stats.total_candles_fetched
            );
        }
        Ok(())
    }
}

impl Message<ViewTell> for CalendarViewActor {
    type Reply = ();

    async fn handle(&mut self, msg: ViewTell, ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            ViewTell::Refresh(request) => {
                // Any in-flight result for the previous inputs is now stale.
                self.generation += 1;
                self.refreshes_started += 1;
                let generation = self.generation;

                if let Err(e) = request.validate() {
                    warn!("Rejecting view refresh: {}", e);
                    self.state = ViewState::Failed(e.to_string());
                    return;
                }

                info!("Refreshing view (generation {}): {:?}", generation, request);
                self.state = ViewState::Loading;

                let provider = Arc::clone(&self.provider);
                let actor_ref = ctx.actor_ref().clone();
                tokio::spawn(async move {
                    let outcome = build_view(provider.as_ref(), &request)
                        .await
                        .map(|view| ViewSnapshot { request, view })
                        .map_err(|e| e.to_string());
                    let _ = actor_ref
                        .tell(ViewTell::Completed { generation, outcome })
                        .send()
                        .await;
                });
            }
            ViewTell::Completed { generation, outcome } => {
                if generation != self.generation {
                    debug!(
                        "Discarding stale view result (generation {} superseded by {})",
                        generation, self.generation
                    );
                    self.stale_results_discarded += 1;
                    return;
                }
                match outcome {
                    Ok(snapshot) => {
                        info!(
                            "View ready (generation {}): {} buckets",
                            generation,
                            snapshot.view.buckets.len()
                        );
                        self.state = ViewState::Ready(snapshot);
                    }
                    Err(message) => {
                        warn!("View render failed (generation {}): {}", generation, message);
                        self.state = ViewState::Failed(message);
                    }
                }
            }
        }
    }
}

impl Message<ViewAsk> for CalendarViewActor {
    type Reply = Result<ViewReply, String>;

    async fn handle(&mut self, msg: ViewAsk, _ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            ViewAsk::GetState => Ok(ViewReply::State(self.state.clone())),
        }
    }
}
