//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use openapi_client::models::RealtimeFrame;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::command::Command;
use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::app::watch::{Stdout, WatchSession, WatchTarget};
use crate::authn::permissions::Capability;
use crate::authn::session::SessionManagerExt;
use crate::errors::ConsoleError;
use crate::export::export_leads;
use crate::models::bot::Bot;
use crate::models::call::Call;
use crate::models::campaign::Campaign;
use crate::models::consumer::Consumer;
use crate::models::entity::{Entity, EntityKind};
use crate::models::lead::Lead;
use crate::notify::Notice;
use crate::realtime::hub::RealtimeHub;
use crate::render::render_list;
use crate::render::render_notice;
use crate::render::table::TableRow;
use crate::sync::query::ListQuery;
use crate::workers::realtime;

/// Run one console command
pub async fn run(
    options: AppOptions,
    command: Command,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    let (state, outbound) = AppState::init(&options)?;
    let state = Arc::new(state);

    match command {
        Command::Watch { kind, query } => {
            watch(&options, state, outbound, kind, query, shutdown_signal).await
        }
        command => {
            let mut notices = state.notifier.subscribe();
            let result = tokio::select! {
                _ = shutdown_signal => {
                    info!("Shutdown signal received, aborting...");
                    Err(ConsoleError::ShutdownError("Interrupted".to_string()))
                }
                result = execute(&options, &state, command) => result,
            };
            while let Ok(notice) = notices.try_recv() {
                print_notice(&notice);
            }
            result
        }
    }
}

fn print_notice(notice: &Notice) {
    println!("{}", render_notice(notice));
}

async fn execute(options: &AppOptions, state: &AppState, command: Command) -> Result<(), ConsoleError> {
    match command {
        Command::List { kind, query } => {
            let permissions = state.permissions().await?;
            permissions.require(Capability::view(kind))?;
            let text = match kind {
                EntityKind::Campaign => list_once::<Campaign>(state, query).await?,
                EntityKind::Lead => list_once::<Lead>(state, query).await?,
                EntityKind::Call => list_once::<Call>(state, query).await?,
                EntityKind::Bot => list_once::<Bot>(state, query).await?,
                EntityKind::Consumer => list_once::<Consumer>(state, query).await?,
            };
            println!("{}", text);
            Ok(())
        }
        Command::CampaignAction {
            campaign_id,
            action,
        } => {
            let dispatcher = state.dispatcher().await?;
            dispatcher.campaign_action(None, &campaign_id, action).await?;
            Ok(())
        }
        Command::SetCallLead { call_id, is_lead } => {
            let dispatcher = state.dispatcher().await?;
            dispatcher.set_call_lead(&call_id, is_lead).await?;
            Ok(())
        }
        Command::DeleteLead { lead_id } => {
            let dispatcher = state.dispatcher().await?;
            dispatcher.delete_lead(None, &lead_id).await?;
            Ok(())
        }
        Command::ExportLeads { path, query } => {
            let dispatcher = state.dispatcher().await?;
            export_leads(&dispatcher, &options.export, &query, path.as_deref()).await?;
            Ok(())
        }
        Command::AssignVoiceAccount {
            owner_user_id,
            account,
        } => {
            let dispatcher = state.dispatcher().await?;
            dispatcher
                .assign_voice_account(&owner_user_id, &account)
                .await?;
            Ok(())
        }
        Command::Impersonate { user_id } => {
            let token = state.session.impersonate(&user_id).await?;
            println!("Now acting as user {}", token.user_id());
            Ok(())
        }
        Command::StopImpersonating => {
            let token = state.session.stop_impersonating().await?;
            println!("Back to user {}", token.user_id());
            Ok(())
        }
        Command::WhoAmI => {
            let token = state.session.get_token().await?;
            let permissions = state.permissions().await?;
            println!("user:          {}", token.user_id());
            println!("role:          {}", token.role().unwrap_or("-"));
            println!("impersonating: {}", state.session.is_impersonating().await?);
            if let Some(expires_at) = token.expires_at() {
                println!("expires:       {}", expires_at.to_rfc3339());
            }
            let granted: Vec<&str> = permissions.iter().map(|c| c.as_str()).collect();
            println!("permissions:   {}", granted.join(", "));
            Ok(())
        }
        Command::Watch { .. } => Err(ConsoleError::Internal(
            "watch runs as a session, not a single command".to_string(),
        )),
    }
}

async fn list_once<T: Entity + TableRow>(state: &AppState, query: ListQuery) -> Result<String, ConsoleError> {
    let controller = state.controller::<T>(query);
    controller.refresh().await?;
    Ok(render_list(&controller.snapshot().await))
}

async fn watch(
    options: &AppOptions,
    state: Arc<AppState>,
    outbound: mpsc::UnboundedReceiver<RealtimeFrame>,
    kind: EntityKind,
    query: ListQuery,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Initializing watch session...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let dispatcher = Arc::new(state.dispatcher().await?);
    dispatcher.permissions().require(Capability::view(kind))?;

    if options.enable_realtime {
        init_realtime_worker(
            options.realtime_worker.clone(),
            state.clone(),
            state.hub.clone(),
            outbound,
            options.backend_base_url.clone(),
            &mut shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    } else {
        info!("Real-time updates disabled");
        drop(outbound);
    }

    let target = match kind {
        EntityKind::Campaign => WatchTarget::Campaigns(Arc::new(state.controller(query))),
        EntityKind::Lead => WatchTarget::Leads(Arc::new(state.controller(query))),
        EntityKind::Call => WatchTarget::Calls(Arc::new(state.controller(query))),
        other => {
            shutdown_manager.shutdown().await?;
            return Err(ConsoleError::ValidationError(format!(
                "Cannot watch {}s",
                other
            )));
        }
    };

    let session = WatchSession::new(
        target,
        dispatcher,
        state.notifier.clone(),
        state.hub.clone(),
        options.search_debounce,
        Stdout,
    );
    let result = session.run(tokio::io::stdin(), Box::pin(shutdown_signal)).await;
    if let Err(e) = &result {
        error!("Watch session failed: {}", e);
    }

    drop(shutdown_tx);
    shutdown_manager.shutdown().await?;
    result
}

// =============================== INITIALIZATION ================================== //

fn init_realtime_worker(
    options: realtime::Options,
    state: Arc<AppState>,
    hub: RealtimeHub,
    outbound: mpsc::UnboundedReceiver<RealtimeFrame>,
    backend_url: String,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing realtime worker...");

    let session = state.session.clone();

    let realtime_handle = tokio::spawn(async move {
        realtime::run(
            &options,
            hub,
            outbound,
            session,
            backend_url,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_realtime_worker_handle(realtime_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    realtime_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            realtime_worker_handle: None,
        }
    }

    pub fn with_realtime_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.realtime_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError("realtime_handle already set".to_string()));
        }
        self.realtime_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, abandoning workers",
                    self.lifecycle_options.max_shutdown_delay
                );
                if let Some(handle) = self.realtime_worker_handle.take() {
                    handle.abort();
                }
                Err(ConsoleError::ShutdownError("Shutdown timed out".to_string()))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConsoleError> {
        info!("Shutting down Genie console...");

        if let Some(handle) = self.realtime_worker_handle.as_mut() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
            self.realtime_worker_handle = None;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
