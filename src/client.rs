//! Runtime around a [`Session`].
//!
//! [`AvatarClient::run`] opens the chat socket, merges every source of events
//! (socket frames, playback completions, I/O completions and user input) into
//! one loop, and feeds them to the session one at a time. Commands the session
//! returns are executed here: sends go straight to the socket, everything else
//! runs as a spawned task whose result comes back as a [`SessionEvent`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{ClientConfig, SelectorTransport};
use crate::core::audio::{BoxedAudioOutput, ClockOutput, CommandOutput, PlaybackNotifier};
use crate::core::avatar::{AvatarError, AvatarLoader, HeadlessLoader};
use crate::core::catalog::{CatalogClient, CatalogError};
use crate::core::connection::{BackendConnection, ConnectionError, ConnectionEvent};
use crate::core::protocol::ClientMessage;
use crate::core::session::{ChatView, Command, Session, SessionEvent};
use crate::utils::UrlValidationError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] UrlValidationError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Input from the user, in addition to plain session events.
#[derive(Debug)]
pub enum UserInput {
    Event(SessionEvent),
    /// Show a status summary on the view
    Status,
    /// End the session
    Quit,
}

impl From<SessionEvent> for UserInput {
    fn from(event: SessionEvent) -> Self {
        UserInput::Event(event)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Connects a [`Session`] to the backend.
#[derive(Clone)]
pub struct AvatarClient {
    config: ClientConfig,
    catalog: CatalogClient,
    loader: Arc<dyn AvatarLoader>,
}

impl AvatarClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("virtu-avatar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let catalog = CatalogClient::new(http.clone(), config.api_base()?);
        let loader = Arc::new(HeadlessLoader::new(http));

        Ok(Self {
            config,
            catalog,
            loader,
        })
    }

    /// Replace the model loader.
    pub fn with_loader(mut self, loader: Arc<dyn AvatarLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Run one chat session until the user quits or the input channel closes.
    ///
    /// A closed socket does not end the session; it is reported to the view
    /// and queued audio keeps playing. Returns the session in its final state.
    pub async fn run(
        &self,
        view: Box<dyn ChatView>,
        mut input: mpsc::UnboundedReceiver<UserInput>,
    ) -> ClientResult<Session> {
        let (connection, mut frames) = BackendConnection::connect(&self.config.ws_url).await?;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SessionEvent>();
        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();

        let mut session = Session::new(
            self.config.session_options(),
            self.audio_output(playback_tx),
            view,
        );
        tracing::info!(
            "Session {} started against {}",
            session.id(),
            self.config.ws_url
        );

        let commands = session.start();
        self.execute(commands, &connection, &events_tx).await;

        let mut socket_open = true;

        loop {
            let event = tokio::select! {
                frame = frames.recv(), if socket_open => match frame {
                    Some(ConnectionEvent::Frame(frame)) => SessionEvent::Frame(frame),
                    Some(ConnectionEvent::Closed(reason)) => {
                        socket_open = false;
                        SessionEvent::Disconnected(reason)
                    }
                    None => {
                        socket_open = false;
                        SessionEvent::Disconnected(None)
                    }
                },

                Some(event) = playback_rx.recv() => SessionEvent::Playback(event),

                Some(event) = events_rx.recv() => event,

                user = input.recv() => match user {
                    Some(UserInput::Event(event)) => event,
                    Some(UserInput::Status) => {
                        session.report_status();
                        continue;
                    }
                    Some(UserInput::Quit) | None => break,
                },
            };

            let commands = session.handle(event);
            self.execute(commands, &connection, &events_tx).await;
        }

        tracing::info!("Session {} ending", session.id());
        connection.close().await;
        Ok(session)
    }

    fn audio_output(&self, notifier: PlaybackNotifier) -> BoxedAudioOutput {
        match &self.config.player_command {
            Some(program) => Box::new(CommandOutput::new(
                program.clone(),
                self.config.player_args.clone(),
                notifier,
            )),
            None => Box::new(ClockOutput::new(notifier)),
        }
    }

    async fn execute(
        &self,
        commands: Vec<Command>,
        connection: &BackendConnection,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) {
        for command in commands {
            tracing::debug!("Executing {command:?}");
            match command {
                Command::Send(message) => send_message(connection, message).await,

                Command::FetchModels => {
                    let catalog = self.catalog.clone();
                    spawn_completion(events, async move {
                        SessionEvent::ModelsFetched(catalog.fetch_models().await)
                    });
                }
                Command::FetchVoices => {
                    let catalog = self.catalog.clone();
                    spawn_completion(events, async move {
                        SessionEvent::VoicesFetched(catalog.fetch_voices().await)
                    });
                }
                Command::FetchLlms => {
                    let catalog = self.catalog.clone();
                    spawn_completion(events, async move {
                        SessionEvent::LlmsFetched(catalog.fetch_llms().await)
                    });
                }
                Command::FetchSpeakers { language } => {
                    let catalog = self.catalog.clone();
                    spawn_completion(events, async move {
                        let result = catalog.fetch_voices().await;
                        SessionEvent::SpeakersFetched { language, result }
                    });
                }

                Command::LoadModel {
                    generation,
                    key,
                    url,
                } => {
                    let loader = self.loader.clone();
                    let resolved = self.config.model_url(&url);
                    spawn_completion(events, async move {
                        let result = match resolved {
                            Ok(url) => loader.load(&url).await,
                            Err(e) => Err(AvatarError::Fetch(format!("{url}: {e}"))),
                        };
                        SessionEvent::ModelLoaded {
                            generation,
                            key,
                            result,
                        }
                    });
                }

                Command::PushVoice { language, speaker } => match self.config.selector_transport {
                    SelectorTransport::Http => {
                        let catalog = self.catalog.clone();
                        spawn_completion(events, async move {
                            SessionEvent::VoicePushed(catalog.set_voice(&language, &speaker).await)
                        });
                    }
                    SelectorTransport::Socket => {
                        let result = connection
                            .send(ClientMessage::SelectVoice { language, speaker })
                            .await
                            .map_err(socket_error);
                        complete(events, SessionEvent::VoicePushed(result));
                    }
                },

                Command::PushLlm { model } => match self.config.selector_transport {
                    SelectorTransport::Http => {
                        let catalog = self.catalog.clone();
                        spawn_completion(events, async move {
                            SessionEvent::LlmPushed(catalog.set_llm(&model).await)
                        });
                    }
                    SelectorTransport::Socket => {
                        let result = connection
                            .send(ClientMessage::SelectLlm(model))
                            .await
                            .map_err(socket_error);
                        complete(events, SessionEvent::LlmPushed(result));
                    }
                },
            }
        }
    }
}

async fn send_message(connection: &BackendConnection, message: ClientMessage) {
    if let Err(e) = connection.send(message).await {
        tracing::warn!("Dropping outbound message: {e}");
    }
}

fn socket_error(e: ConnectionError) -> CatalogError {
    CatalogError::Request {
        endpoint: "websocket".to_string(),
        reason: e.to_string(),
    }
}

fn complete(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Session gone before completion");
    }
}

fn spawn_completion<F>(events: &mpsc::UnboundedSender<SessionEvent>, work: F)
where
    F: std::future::Future<Output = SessionEvent> + Send + 'static,
{
    let events = events.clone();
    tokio::spawn(async move {
        let event = work.await;
        complete(&events, event);
    });
}
