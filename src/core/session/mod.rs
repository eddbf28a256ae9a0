//! The session reconciler.
//!
//! A [`Session`] owns all client-side state of one chat session and folds
//! [`SessionEvent`]s into it strictly one at a time. It never blocks: anything
//! that needs I/O is returned as a [`Command`] for the runtime, whose
//! completion is fed back later as another event.
//!
//! # Channels
//!
//! - Expression, motion and model parameters are applied immediately.
//! - Audio clips are queued and played one at a time in arrival order.
//! - Streamed text accumulates into one open transcript entry until `done`.
//!
//! # Model switches
//!
//! Every switch bumps a generation counter and tags the load request with it.
//! A load that completes for an older generation is destroyed and ignored, so
//! only the most recently requested model is ever installed.

mod events;
mod view;

use bytes::Bytes;
use uuid::Uuid;

use crate::core::audio::{
    AudioItem, AudioQueue, BoxedAudioOutput, ClipId, PlaybackEvent, PlaybackOutcome,
};
use crate::core::avatar::{AvatarResult, BoxedAvatar, Viewport, layout};
use crate::core::catalog::{CatalogResult, LlmCatalog, ModelCatalog, VoiceCatalog};
use crate::core::expression::{ExpressionMapping, ExpressionPanel};
use crate::core::protocol::{ClientMessage, ExpressionId, InboundEvent, InboundFrame};
use crate::core::selectors::{SelectorKind, Settings};
use crate::core::transcript::{FragmentOutcome, Role, Transcript};

pub use events::{Command, SessionEvent};
pub use view::{ChatView, NullView};

/// Fixed session parameters.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Model selected once the model catalog arrives
    pub default_model: String,
    /// Initial canvas size
    pub viewport: Viewport,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_model: "haru".to_string(),
            viewport: Viewport::default(),
        }
    }
}

/// Client-side state of one chat session.
pub struct Session {
    id: Uuid,
    options: SessionOptions,
    viewport: Viewport,

    // Avatar
    catalog: ModelCatalog,
    model_key: Option<String>,
    generation: u64,
    engine: Option<BoxedAvatar>,
    mapping: ExpressionMapping,
    panel: ExpressionPanel,

    // Chat
    transcript: Transcript,

    // Audio
    audio: AudioQueue<AudioItem>,
    output: BoxedAudioOutput,
    next_clip: u64,

    settings: Settings,
    connected: bool,
    view: Box<dyn ChatView>,
}

impl Session {
    pub fn new(options: SessionOptions, output: BoxedAudioOutput, view: Box<dyn ChatView>) -> Self {
        let id = Uuid::new_v4();
        tracing::info!("Session {id} created");
        Self {
            id,
            viewport: options.viewport,
            options,
            catalog: ModelCatalog::default(),
            model_key: None,
            generation: 0,
            engine: None,
            mapping: ExpressionMapping::new(),
            panel: ExpressionPanel::empty(),
            transcript: Transcript::new(),
            audio: AudioQueue::new(),
            output,
            next_clip: 0,
            settings: Settings::default(),
            connected: true,
            view,
        }
    }

    /// Initial work: fetch the three catalogs.
    pub fn start(&mut self) -> Vec<Command> {
        vec![Command::FetchModels, Command::FetchVoices, Command::FetchLlms]
    }

    /// Apply one event and return the work it requires.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        tracing::trace!("Session {} handling {event:?}", self.id);
        let mut commands = Vec::new();

        match event {
            SessionEvent::Frame(frame) => self.handle_frame(frame),
            SessionEvent::Disconnected(reason) => self.on_disconnected(reason),
            SessionEvent::UserSubmit(text) => self.submit(&text, &mut commands),
            SessionEvent::SelectModel(key) => self.switch_model(&key, &mut commands),
            SessionEvent::SelectLanguage(language) => self.select_language(language, &mut commands),
            SessionEvent::SelectSpeaker(speaker) => self.select_speaker(speaker, &mut commands),
            SessionEvent::SelectLlm(model) => self.select_llm(model, &mut commands),
            SessionEvent::ClickExpression(name) => self.click_expression(&name),
            SessionEvent::Resize(viewport) => self.resize(viewport),
            SessionEvent::Playback(event) => self.on_playback(event),
            SessionEvent::ModelsFetched(result) => self.on_models(result, &mut commands),
            SessionEvent::VoicesFetched(result) => self.on_voices(result),
            SessionEvent::LlmsFetched(result) => self.on_llms(result),
            SessionEvent::SpeakersFetched { language, result } => {
                self.on_speakers(language, result, &mut commands)
            }
            SessionEvent::ModelLoaded {
                generation,
                key,
                result,
            } => self.on_model_loaded(generation, &key, result),
            SessionEvent::VoicePushed(result) => self.on_voice_pushed(result),
            SessionEvent::LlmPushed(result) => self.on_llm_pushed(result),
        }

        commands
    }

    // =========================================================================
    // Inbound dispatch
    // =========================================================================

    /// Classify one inbound unit and apply it.
    pub fn handle_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::Audio(data) => self.enqueue_audio(data),
            InboundFrame::Structured(payload) => match InboundEvent::parse(&payload) {
                Ok(event) => self.dispatch(event),
                Err(e) => tracing::warn!("Discarding inbound frame: {e}"),
            },
        }
    }

    /// Apply every present field of a structured event.
    pub fn dispatch(&mut self, event: InboundEvent) {
        if event.is_empty() {
            tracing::debug!("Inbound event without recognized fields");
            return;
        }

        if let Some(params) = &event.model {
            match self.engine.as_mut() {
                Some(engine) => engine.set_model(params),
                None => tracing::debug!("No avatar loaded, dropping model parameters"),
            }
        }

        if let Some(motion) = &event.motion {
            match self.engine.as_mut() {
                Some(engine) => engine.set_motion(motion),
                None => tracing::debug!("No avatar loaded, dropping motion {}", motion.group),
            }
        }

        if let Some(message) = event.message {
            self.hide_typing();
            let index = self.transcript.push(Role::Bot, message);
            self.view.entry_added(index, &self.transcript.entries()[index]);
        }

        if let Some(fragment) = event.text {
            self.hide_typing();
            match self.transcript.push_fragment(&fragment) {
                FragmentOutcome::Opened(index) => {
                    self.view.entry_added(index, &self.transcript.entries()[index]);
                }
                FragmentOutcome::Appended(index) => self.view.entry_extended(index, &fragment),
            }
        }

        if event.done
            && let Some(index) = self.transcript.finish_stream()
        {
            self.view.stream_closed(index);
        }

        if let Some(expression) = &event.expression {
            self.apply_expression(expression);
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Resolve an expression through the current mapping, set it on the
    /// engine and move the panel's active marker. Unknown values pass through.
    pub fn apply_expression(&mut self, value: &ExpressionId) {
        let resolved = self.mapping.resolve(value);

        match self.engine.as_mut() {
            Some(engine) => engine.set_expression(&resolved),
            None => tracing::debug!("No avatar loaded, expression {resolved} not applied"),
        }

        let control = self.panel.mark_active(&resolved.to_string());
        self.view.active_expression_changed(control);
    }

    fn click_expression(&mut self, name: &str) {
        let Some(id) = self.panel.find(name).map(|control| control.id.clone()) else {
            tracing::debug!("No expression control named '{name}'");
            return;
        };

        if let Some(engine) = self.engine.as_mut() {
            engine.set_expression(&id);
        }
        let control = self.panel.mark_active(name);
        self.view.active_expression_changed(control);
    }

    // =========================================================================
    // Audio
    // =========================================================================

    fn enqueue_audio(&mut self, data: Bytes) {
        self.hide_typing();

        let id = ClipId(self.next_clip);
        self.next_clip += 1;

        let item = match self.output.create(id, data) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Dropping {id}: {e}");
                return;
            }
        };

        if self.audio.enqueue(item) {
            self.start_current();
        } else {
            tracing::debug!("Queued {id} ({} waiting)", self.audio.pending_len());
        }
    }

    /// Start the current clip. A clip that fails to start counts as finished
    /// and the next one is tried.
    fn start_current(&mut self) {
        while let Some(item) = self.audio.current() {
            // muted only when the avatar is voicing the clip itself
            let muted = match self.engine.as_mut() {
                Some(engine) => match engine.speak(item) {
                    Ok(()) => engine.voices_speech(),
                    Err(e) => {
                        tracing::warn!("Avatar could not speak {}: {e}", item.id());
                        false
                    }
                },
                None => false,
            };

            match self.output.play(item, muted) {
                Ok(()) => {
                    tracing::debug!("Started {}", item.id());
                    return;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", item.id());
                    self.finish_current();
                }
            }
        }
    }

    fn finish_current(&mut self) {
        if let Some(finished) = self.audio.advance() {
            self.output.release(finished);
        }
    }

    fn on_playback(&mut self, event: PlaybackEvent) {
        let current = self.audio.current().map(AudioItem::id);
        if current != Some(event.clip) {
            tracing::debug!("Ignoring terminal event for {}, not current", event.clip);
            return;
        }

        if let PlaybackOutcome::Errored(reason) = &event.outcome {
            tracing::warn!("Playback of {} failed: {reason}", event.clip);
        }

        self.finish_current();
        self.start_current();
    }

    // =========================================================================
    // User input
    // =========================================================================

    fn submit(&mut self, text: &str, commands: &mut Vec<Command>) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        commands.push(Command::Send(ClientMessage::UserText(text.to_string())));
        let index = self.transcript.push(Role::User, text);
        self.view.entry_added(index, &self.transcript.entries()[index]);

        if self.transcript.set_typing(true) {
            self.view.typing_changed(true);
        }
    }

    fn hide_typing(&mut self) {
        if self.transcript.set_typing(false) {
            self.view.typing_changed(false);
        }
    }

    fn on_disconnected(&mut self, reason: Option<String>) {
        match &reason {
            Some(reason) => tracing::warn!("Session {} lost its connection: {reason}", self.id),
            None => tracing::info!("Session {} connection closed", self.id),
        }
        self.connected = false;
        self.view.disconnected(reason.as_deref());
    }

    // =========================================================================
    // Models
    // =========================================================================

    fn on_models(&mut self, result: CatalogResult<ModelCatalog>, commands: &mut Vec<Command>) {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to fetch models: {e}");
                return;
            }
        };

        tracing::info!("Model catalog: {} models", catalog.len());
        self.catalog = catalog;
        self.settings.apply_models(&self.catalog);
        self.notify_selector(SelectorKind::Model);

        let default_model = self.options.default_model.clone();
        if self.catalog.contains(&default_model) {
            self.switch_model(&default_model, commands);
        } else {
            tracing::warn!("Default model '{default_model}' is not in the catalog");
        }
    }

    /// Tear down the current avatar and request `key`.
    fn switch_model(&mut self, key: &str, commands: &mut Vec<Command>) {
        let Some(entry) = self.catalog.get(key) else {
            tracing::warn!("Ignoring switch to unknown model '{key}'");
            return;
        };
        let url = entry.url.clone();
        let mapping = entry.mapping();

        self.settings.model.select(key);
        self.settings.model.set_disabled(true);
        self.notify_selector(SelectorKind::Model);

        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }

        self.mapping = mapping;
        self.panel = ExpressionPanel::empty();
        self.view.panel_changed(&self.panel);

        self.generation += 1;
        self.model_key = Some(key.to_string());
        tracing::info!("Switching to model '{key}' (generation {})", self.generation);

        commands.push(Command::Send(ClientMessage::SelectModel(key.to_string())));
        commands.push(Command::LoadModel {
            generation: self.generation,
            key: key.to_string(),
            url,
        });
    }

    fn on_model_loaded(&mut self, generation: u64, key: &str, result: AvatarResult<BoxedAvatar>) {
        if generation != self.generation {
            tracing::debug!(
                "Discarding load of '{key}' (generation {generation}, current {})",
                self.generation
            );
            if let Ok(mut engine) = result {
                engine.destroy();
            }
            return;
        }

        match result {
            Ok(mut engine) => {
                layout::place(self.viewport, engine.natural_size()).apply(&mut *engine);
                self.panel = ExpressionPanel::derive(&self.mapping, &engine.expression_definitions());
                self.engine = Some(engine);
                tracing::info!(
                    "Model '{key}' ready with {} expression controls",
                    self.panel.controls().len()
                );
                self.view.panel_changed(&self.panel);
                if let Some(entry) = self.catalog.get(key) {
                    self.view.model_ready(key, entry);
                }
            }
            Err(e) => tracing::error!("Failed to load model '{key}': {e}"),
        }

        self.settings.model.set_disabled(false);
        self.notify_selector(SelectorKind::Model);
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(engine) = self.engine.as_mut() {
            layout::place(viewport, engine.natural_size()).apply(&mut **engine);
        }
    }

    // =========================================================================
    // Voice and LLM selectors
    // =========================================================================

    fn on_voices(&mut self, result: CatalogResult<VoiceCatalog>) {
        match result {
            Ok(catalog) => {
                self.settings.apply_voices(&catalog);
                self.notify_selector(SelectorKind::Language);
                self.notify_selector(SelectorKind::Speaker);
            }
            Err(e) => tracing::error!("Failed to fetch voices: {e}"),
        }
    }

    fn select_language(&mut self, language: String, commands: &mut Vec<Command>) {
        self.settings.language.select(&language);
        self.notify_selector(SelectorKind::Language);
        commands.push(Command::FetchSpeakers { language });
    }

    fn on_speakers(
        &mut self,
        language: String,
        result: CatalogResult<VoiceCatalog>,
        commands: &mut Vec<Command>,
    ) {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to update speakers: {e}");
                return;
            }
        };

        if self.settings.language.value() != Some(language.as_str()) {
            tracing::debug!("Language changed again, dropping speakers for '{language}'");
            return;
        }

        let speakers = catalog.speakers(&language).to_vec();
        self.settings.set_speakers(&speakers);
        if let Some(first) = speakers.first() {
            self.settings.speaker.select(first);
        }
        self.notify_selector(SelectorKind::Speaker);

        if let Some(first) = speakers.into_iter().next() {
            self.push_voice(language, first, commands);
        }
    }

    fn select_speaker(&mut self, speaker: String, commands: &mut Vec<Command>) {
        let Some(language) = self.settings.language.value().map(str::to_string) else {
            tracing::warn!("No language selected, ignoring speaker '{speaker}'");
            return;
        };
        self.settings.speaker.select(&speaker);
        self.push_voice(language, speaker, commands);
    }

    fn push_voice(&mut self, language: String, speaker: String, commands: &mut Vec<Command>) {
        self.settings.set_voice_disabled(true);
        self.notify_selector(SelectorKind::Language);
        self.notify_selector(SelectorKind::Speaker);
        commands.push(Command::PushVoice { language, speaker });
    }

    fn on_voice_pushed(&mut self, result: CatalogResult<()>) {
        if let Err(e) = result {
            tracing::error!("Failed to set voice: {e}");
        }
        self.settings.set_voice_disabled(false);
        self.notify_selector(SelectorKind::Language);
        self.notify_selector(SelectorKind::Speaker);
    }

    fn on_llms(&mut self, result: CatalogResult<LlmCatalog>) {
        match result {
            Ok(catalog) => {
                self.settings.apply_llms(&catalog);
                self.notify_selector(SelectorKind::Llm);
            }
            Err(e) => tracing::error!("Failed to fetch LLMs: {e}"),
        }
    }

    fn select_llm(&mut self, model: String, commands: &mut Vec<Command>) {
        self.settings.llm.select(&model);
        self.settings.llm.set_disabled(true);
        self.notify_selector(SelectorKind::Llm);
        commands.push(Command::PushLlm { model });
    }

    fn on_llm_pushed(&mut self, result: CatalogResult<()>) {
        if let Err(e) = result {
            tracing::error!("Failed to set LLM: {e}");
        }
        self.settings.llm.set_disabled(false);
        self.notify_selector(SelectorKind::Llm);
    }

    fn notify_selector(&mut self, kind: SelectorKind) {
        self.view.selector_changed(kind, self.settings.get(kind));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model_key(&self) -> Option<&str> {
        self.model_key.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_avatar(&self) -> bool {
        self.engine.is_some()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn mapping(&self) -> &ExpressionMapping {
        &self.mapping
    }

    pub fn panel(&self) -> &ExpressionPanel {
        &self.panel
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Clip currently playing.
    pub fn playing(&self) -> Option<ClipId> {
        self.audio.current().map(AudioItem::id)
    }

    /// Clips waiting behind the current one.
    pub fn queued_clips(&self) -> usize {
        self.audio.pending_len()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            model: self.model_key.clone(),
            generation: self.generation,
            avatar_loaded: self.engine.is_some(),
            connected: self.connected,
            active_expression: self.panel.active().map(|control| control.label.clone()),
            playing: self.playing(),
            queued_clips: self.audio.pending_len(),
            entries: self.transcript.len(),
            language: self.settings.language.value().map(str::to_string),
            speaker: self.settings.speaker.value().map(str::to_string),
            llm: self.settings.llm.value().map(str::to_string),
        }
    }

    /// Show the current status on the view.
    pub fn report_status(&mut self) {
        let status = self.status();
        self.view.status(&status);
    }
}

/// Point-in-time summary of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub model: Option<String>,
    pub generation: u64,
    pub avatar_loaded: bool,
    pub connected: bool,
    pub active_expression: Option<String>,
    pub playing: Option<ClipId>,
    pub queued_clips: usize,
    pub entries: usize,
    pub language: Option<String>,
    pub speaker: Option<String>,
    pub llm: Option<String>,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let or_none = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        write!(
            f,
            "model={} (gen {}, {}) connected={} expression={} voice={}/{} llm={} audio={}+{} entries={}",
            or_none(&self.model),
            self.generation,
            if self.avatar_loaded { "loaded" } else { "loading" },
            self.connected,
            or_none(&self.active_expression),
            or_none(&self.language),
            or_none(&self.speaker),
            or_none(&self.llm),
            self.playing.map_or_else(|| "idle".to_string(), |clip| clip.to_string()),
            self.queued_clips,
            self.entries,
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        tracing::debug!("Session {} torn down", self.id);
    }
}
