//! Submission pipeline.
//!
//! One `ChatApp` owns the session and drives a full submission: route a
//! model, resolve the persona, assemble the request, stream the reply,
//! and fold fragments into the accumulator. Exactly one request is in
//! flight at a time, since `submit` holds `&mut self` for its whole
//! life. A token from `cancel_handle` stops the stream from another
//! task; the cancelled submission surfaces as a stream failure. Turns
//! are committed to the log only after the stream ends cleanly; a failed
//! or cancelled stream leaves the log untouched.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::AuthManager;
use crate::core::accumulator::ResponseAccumulator;
use crate::core::attachment::Attachment;
use crate::core::capability::CapabilityTable;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::Config;
use crate::core::error::ChatError;
use crate::core::persona::PersonaRegistry;
use crate::core::prompt::assemble;
use crate::core::router::route;
use crate::core::session::{Session, Turn};
use crate::utils::url::DEFAULT_BASE_URL;

pub struct ChatApp {
    client: reqwest::Client,
    base_url: String,
    auth: AuthManager,
    registry: PersonaRegistry,
    table: CapabilityTable,
    pub session: Session,
    stream_service: ChatStreamService,
    stream_rx: tokio::sync::mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    current_stream_id: u64,
    cancel_token: CancellationToken,
    // Tests feed replies through the channel directly and must never
    // spawn the network task.
    #[cfg(test)]
    offline: bool,
}

impl ChatApp {
    pub fn new(config: &Config, auth: AuthManager, session: Session) -> Self {
        let (stream_service, stream_rx) = ChatStreamService::new();
        Self {
            client: reqwest::Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth,
            registry: PersonaRegistry::builtin(),
            table: config.capability_table(),
            session,
            stream_service,
            stream_rx,
            current_stream_id: 0,
            cancel_token: CancellationToken::new(),
            #[cfg(test)]
            offline: false,
        }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Install a fresh cancellation token for the next submission and
    /// return a trigger the caller can fire from another task while
    /// [`ChatApp::submit`] holds the app (e.g. a Ctrl-C handler).
    pub fn cancel_handle(&mut self) -> CancellationToken {
        self.cancel_token = CancellationToken::new();
        self.cancel_token.clone()
    }

    /// Run one submission to completion. `on_progress` receives the
    /// partial display text (with cursor marker) after every fragment.
    pub async fn submit<F>(
        &mut self,
        user_text: &str,
        attachment: Option<Attachment>,
        mut on_progress: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&str),
    {
        let api_key = self
            .auth
            .resolve_api_key()
            .ok_or(ChatError::MissingCredential)?;

        let decision = route(self.session.tier(), attachment.is_some(), &self.table)?;
        let persona = self.registry.resolve(self.session.mode);
        let request = assemble(
            persona,
            &self.session.turn_log,
            user_text,
            attachment.as_ref(),
            &decision,
        );

        debug!(
            model = %decision.model_id,
            strategy = ?decision.strategy,
            use_history = decision.use_history,
            "submitting request"
        );

        self.current_stream_id += 1;
        let stream_id = self.current_stream_id;
        // Keep a token handed out via `cancel_handle` before this call;
        // only a token spent on a previous submission gets replaced.
        if self.cancel_token.is_cancelled() {
            self.cancel_token = CancellationToken::new();
        }

        #[cfg(test)]
        let spawn = !self.offline;
        #[cfg(not(test))]
        let spawn = true;
        if spawn {
            self.stream_service.spawn_stream(StreamParams {
                client: self.client.clone(),
                base_url: self.base_url.clone(),
                api_key,
                model: decision.model_id.clone(),
                request,
                cancel_token: self.cancel_token.clone(),
                stream_id,
            });
        }

        let mut accumulator = ResponseAccumulator::new();
        while let Some((message, received_id)) = self.stream_rx.recv().await {
            if received_id != stream_id {
                // Left over from a superseded stream; drop it.
                continue;
            }
            match message {
                StreamMessage::Chunk(fragment) => {
                    accumulator.push(&fragment);
                    on_progress(&accumulator.display_text());
                }
                StreamMessage::Error(error) => {
                    // Drain the trailing End before surfacing the error;
                    // the partial text dies with the accumulator.
                    while let Ok((message, id)) = self.stream_rx.try_recv() {
                        if id == stream_id && matches!(message, StreamMessage::End) {
                            break;
                        }
                    }
                    return Err(error);
                }
                StreamMessage::End => {
                    let final_text = accumulator.finalize();
                    self.session
                        .turn_log
                        .append(Turn::user(user_text, attachment));
                    self.session
                        .turn_log
                        .append(Turn::assistant(final_text.clone()));
                    return Ok(final_text);
                }
            }
        }

        Err(ChatError::StreamFailure {
            detail: "stream channel closed unexpectedly".to_string(),
        })
    }

    #[cfg(test)]
    pub fn new_offline(config: &Config, auth: AuthManager, session: Session) -> Self {
        let mut app = Self::new(config, auth, session);
        app.offline = true;
        app
    }

    #[cfg(test)]
    pub fn stream_service_for_test(&self) -> ChatStreamService {
        self.stream_service.clone()
    }
}
