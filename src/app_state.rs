use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::{agent::ContextualAgent, config::AppConfig, history::ConversationHistory};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub agent: Arc<ContextualAgent>,
    pub history: Arc<Mutex<ConversationHistory>>,
    pub status: Arc<Mutex<Status>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub fn new(config: AppConfig, agent: ContextualAgent, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self {
            config,
            agent: Arc::new(agent),
            history: Arc::new(Mutex::new(ConversationHistory::default())),
            status: Arc::new(Mutex::new(Status {
                is_busy: false,
                message: "Servidor listo.".to_string(),
                progress: 0.0,
            })),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
        }
    }
}

/// Estado de la ingesta en segundo plano.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
    pub progress: f32, // Valor entre 0.0 y 1.0
}

/// Bloquea el mutex aunque otro hilo haya entrado en pánico con él tomado:
/// el historial y el estado siguen siendo válidos.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
