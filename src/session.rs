//! Edit session controller.
//!
//! The [`Editor`] owns at most one editing session at a time and drives the
//! render pipeline whenever the session's state changes.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──select_image──▶ Decoding ──finish_decode(ok)──▶ Ready ──save/cancel──▶ Idle
//!                            │                              │
//!                            └──finish_decode(err)──▶ Idle  └──update/reset/...──▶ render
//! ```
//!
//! Decoding is the only step that may happen off the controller's thread:
//! [`Editor::select_image`] hands back a [`DecodeRequest`] that can run on any
//! thread, and [`Editor::finish_decode`] accepts its [`DecodeOutcome`]. A
//! newer selection supersedes an older one, and outcomes for superseded
//! tickets are dropped.
//!
//! ## Render policy
//!
//! With [`RenderPolicy::Immediate`] every change redraws before returning.
//! With [`RenderPolicy::Coalesced`] changes only mark the session dirty;
//! [`Editor::flush`] draws the latest state once. Save and download flush
//! first, so exports always reflect the latest state.

use crate::config::AppConfig;
use crate::filter::{EditMode, FilterExpression, FilterPatch, compose, find_preset};
use crate::gallery::{Gallery, Snapshot, download_name, now_millis};
use crate::imaging::{
    CodecError, Dimensions, EncodeParams, ImageCodec, OutputFormat, Quality, RustCodec, Surface,
    render,
};
use crate::upload::ValidatedUpload;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No image is loaded")]
    NoImage,
    #[error("{operation} is not available in {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: &'static str,
    },
    #[error("Could not load the image: {0}")]
    Decode(#[source] CodecError),
    #[error("Unknown effect: {0}")]
    UnknownPreset(String),
    #[error("{0} needs an effect to be selected first")]
    NoEffectSelected(&'static str),
    #[error("The {0} feature is disabled")]
    FeatureDisabled(&'static str),
    #[error("Export failed: {0}")]
    Codec(#[from] CodecError),
}

/// When renders happen relative to state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPolicy {
    /// Redraw on every change.
    #[default]
    Immediate,
    /// Mark dirty on change; redraw once on flush.
    Coalesced,
}

/// The two editing views. Switching between them ends the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Adjust,
    Effects,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Adjust => "adjust",
            View::Effects => "effects",
        }
    }

    fn initial_mode(self) -> EditMode {
        match self {
            View::Adjust => EditMode::adjust(),
            View::Effects => EditMode::effect(),
        }
    }
}

/// Controller settings, usually derived from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub render_policy: RenderPolicy,
    pub save: EncodeParams,
    pub download: EncodeParams,
    pub enable_effects: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            render_policy: RenderPolicy::Immediate,
            save: EncodeParams::jpeg(Quality::new(92)),
            download: EncodeParams::jpeg(Quality::new(90)),
            enable_effects: true,
        }
    }
}

impl From<&AppConfig> for EditorSettings {
    fn from(config: &AppConfig) -> Self {
        let save_format = if config.image.enable_compression {
            OutputFormat::Jpeg
        } else {
            OutputFormat::Png
        };
        Self {
            render_policy: config.editor.render_policy,
            save: EncodeParams {
                format: save_format,
                quality: Quality::new(config.editor.save_quality),
            },
            download: EncodeParams::jpeg(Quality::new(config.editor.download_quality)),
            enable_effects: config.features.enable_effects,
        }
    }
}

/// Identifies one decode; only the latest ticket's outcome is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeTicket(u64);

/// A pending decode that may run on any thread.
#[derive(Debug)]
pub struct DecodeRequest {
    ticket: DecodeTicket,
    upload: ValidatedUpload,
}

impl DecodeRequest {
    pub fn ticket(&self) -> DecodeTicket {
        self.ticket
    }

    pub fn run<C: ImageCodec + ?Sized>(self, codec: &C) -> DecodeOutcome {
        DecodeOutcome {
            ticket: self.ticket,
            result: codec.decode(self.upload.bytes()),
        }
    }
}

/// The result of a [`DecodeRequest`], delivered back to the controller.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub ticket: DecodeTicket,
    pub result: Result<RgbaImage, CodecError>,
}

/// What observers see after every render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEvent {
    /// 1-based count of renders performed by this editor.
    pub generation: u64,
    pub expression: String,
    pub dimensions: Dimensions,
}

/// An encoded download, named the way a browser download would be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

struct Session {
    source: RgbaImage,
    mode: EditMode,
    surface: Surface,
    dirty: bool,
}

enum SessionState {
    Idle,
    Decoding(DecodeTicket),
    Ready(Session),
}

type RenderObserver = Box<dyn FnMut(&RenderEvent)>;

/// The edit session controller.
pub struct Editor<C: ImageCodec = RustCodec> {
    codec: C,
    settings: EditorSettings,
    view: View,
    state: SessionState,
    next_ticket: u64,
    renders: u64,
    gallery: Gallery,
    observers: Vec<RenderObserver>,
}

impl Editor<RustCodec> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(RustCodec::new(), EditorSettings::from(config))
    }
}

impl Default for Editor<RustCodec> {
    fn default() -> Self {
        Self::new(RustCodec::new(), EditorSettings::default())
    }
}

impl<C: ImageCodec> Editor<C> {
    pub fn new(codec: C, settings: EditorSettings) -> Self {
        Self {
            codec,
            settings,
            view: View::default(),
            state: SessionState::Idle,
            next_ticket: 0,
            renders: 0,
            gallery: Gallery::new(),
            observers: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Total renders performed since construction.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn is_decoding(&self) -> bool {
        matches!(self.state, SessionState::Decoding(_))
    }

    pub fn has_session(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// True when a coalesced change is waiting for [`flush`](Self::flush).
    pub fn is_dirty(&self) -> bool {
        matches!(&self.state, SessionState::Ready(s) if s.dirty)
    }

    pub fn mode(&self) -> Option<&EditMode> {
        match &self.state {
            SessionState::Ready(s) => Some(&s.mode),
            _ => None,
        }
    }

    /// The expression the current mode composes to.
    pub fn expression(&self) -> Option<FilterExpression> {
        self.mode().map(compose)
    }

    pub fn surface(&self) -> Option<&Surface> {
        match &self.state {
            SessionState::Ready(s) => Some(&s.surface),
            _ => None,
        }
    }

    /// Register a callback invoked after every render.
    pub fn on_render(&mut self, observer: impl FnMut(&RenderEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // =========================================================================
    // Image selection
    // =========================================================================

    /// Begin decoding `upload`, replacing any current session or pending decode.
    pub fn select_image(&mut self, upload: ValidatedUpload) -> DecodeRequest {
        self.next_ticket += 1;
        let ticket = DecodeTicket(self.next_ticket);
        if let SessionState::Decoding(old) = self.state {
            log::debug!("Session: decode {} superseded by {}", old.0, ticket.0);
        }
        log::info!(
            "Session: decoding {} upload ({} bytes)",
            upload.mime_type(),
            upload.len()
        );
        self.state = SessionState::Decoding(ticket);
        DecodeRequest { ticket, upload }
    }

    /// Accept a decode outcome.
    ///
    /// On success the session starts and the first render happens before
    /// returning. On failure the editor returns to idle. Outcomes whose
    /// ticket is no longer current are ignored.
    pub fn finish_decode(&mut self, outcome: DecodeOutcome) -> Result<(), SessionError> {
        match self.state {
            SessionState::Decoding(current) if current == outcome.ticket => {}
            _ => {
                log::debug!("Session: dropping stale decode {}", outcome.ticket.0);
                return Ok(());
            }
        }
        match outcome.result {
            Ok(source) => {
                log::info!(
                    "Session: loaded {}x{} image",
                    source.width(),
                    source.height()
                );
                self.state = SessionState::Ready(Session {
                    source,
                    mode: self.view.initial_mode(),
                    surface: Surface::new(),
                    dirty: false,
                });
                self.render_now();
                Ok(())
            }
            Err(e) => {
                log::warn!("Session: decode failed: {e}");
                self.state = SessionState::Idle;
                Err(SessionError::Decode(e))
            }
        }
    }

    /// Select and decode on the calling thread.
    pub fn load_image(&mut self, upload: ValidatedUpload) -> Result<(), SessionError> {
        let request = self.select_image(upload);
        let outcome = request.run(&self.codec);
        self.finish_decode(outcome)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Merge an adjustment patch (values are clamped) and redraw.
    pub fn update_filter(&mut self, patch: &FilterPatch) -> Result<(), SessionError> {
        let session = self.session_mut()?;
        match &mut session.mode {
            EditMode::Adjust(state) => state.merge(patch),
            EditMode::Effect { .. } => return Err(wrong_mode("update_filter", "effect")),
        }
        self.changed();
        Ok(())
    }

    /// Rotate a further 90° clockwise.
    pub fn rotate_clockwise(&mut self) -> Result<(), SessionError> {
        let session = self.session_mut()?;
        match &mut session.mode {
            EditMode::Adjust(state) => state.rotate_clockwise(),
            EditMode::Effect { .. } => return Err(wrong_mode("rotate_clockwise", "effect")),
        }
        self.changed();
        Ok(())
    }

    /// Select a preset by name (case-insensitive), keeping the current intensity.
    pub fn select_effect(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.settings.enable_effects {
            return Err(SessionError::FeatureDisabled("effects"));
        }
        let found = find_preset(name).ok_or_else(|| SessionError::UnknownPreset(name.to_string()));
        let session = self.session_mut()?;
        match &mut session.mode {
            EditMode::Effect { preset, .. } => *preset = Some(found?),
            EditMode::Adjust(_) => return Err(wrong_mode("select_effect", "adjust")),
        }
        self.changed();
        Ok(())
    }

    /// Deselect the preset; the image renders unfiltered.
    pub fn clear_effect(&mut self) -> Result<(), SessionError> {
        let session = self.session_mut()?;
        match &mut session.mode {
            EditMode::Effect { preset, .. } => *preset = None,
            EditMode::Adjust(_) => return Err(wrong_mode("clear_effect", "adjust")),
        }
        self.changed();
        Ok(())
    }

    /// Set preset intensity, clamped to 0–100. Needs a selected preset.
    pub fn set_intensity(&mut self, value: f32) -> Result<(), SessionError> {
        let session = self.session_mut()?;
        if let EditMode::Adjust(_) = session.mode {
            return Err(wrong_mode("set_intensity", "adjust"));
        }
        if !session.mode.has_selection() {
            return Err(SessionError::NoEffectSelected("set_intensity"));
        }
        session.mode.set_intensity(value);
        self.changed();
        Ok(())
    }

    /// Restore the active mode's defaults with exactly one render.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let session = self.session_mut()?;
        session.mode = session.mode.defaults();
        self.changed();
        Ok(())
    }

    /// Draw pending coalesced changes. Returns whether a render happened.
    pub fn flush(&mut self) -> bool {
        if self.is_dirty() {
            self.render_now();
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Ending and exporting
    // =========================================================================

    /// Encode the surface, add it to the gallery (newest first) and end the session.
    ///
    /// In Effect mode a preset must be selected.
    pub fn save(&mut self) -> Result<&Snapshot, SessionError> {
        if !self.session_mut()?.mode.has_selection() {
            return Err(SessionError::NoEffectSelected("save"));
        }
        self.flush();
        let params = self.settings.save;
        let (bytes, dimensions) = self.encode_surface(&params)?;
        self.state = SessionState::Idle;
        let snapshot = Snapshot::new(bytes, params.format, dimensions, now_millis());
        log::info!("Session: saved {}", snapshot.id());
        Ok(self.gallery.push(snapshot))
    }

    /// End the session (or pending decode) without emitting anything.
    ///
    /// Returns whether there was anything to cancel.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        if was_active {
            log::info!("Session: cancelled");
        }
        self.state = SessionState::Idle;
        was_active
    }

    /// Encode the surface as a timestamped download; the session continues.
    pub fn download(&mut self) -> Result<Download, SessionError> {
        self.flush();
        let params = self.settings.download;
        let (bytes, _) = self.encode_surface(&params)?;
        let file_name = download_name(now_millis(), params.format);
        log::info!("Session: download {file_name} ({} bytes)", bytes.len());
        Ok(Download { file_name, bytes })
    }

    /// Switch views. Changing view ends any active session.
    pub fn switch_view(&mut self, view: View) -> Result<(), SessionError> {
        if view == View::Effects && !self.settings.enable_effects {
            return Err(SessionError::FeatureDisabled("effects"));
        }
        if view != self.view {
            log::debug!("View: {} -> {}", self.view.name(), view.name());
            self.view = view;
            self.cancel();
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn session_mut(&mut self) -> Result<&mut Session, SessionError> {
        match &mut self.state {
            SessionState::Ready(s) => Ok(s),
            _ => Err(SessionError::NoImage),
        }
    }

    fn changed(&mut self) {
        match self.settings.render_policy {
            RenderPolicy::Immediate => self.render_now(),
            RenderPolicy::Coalesced => {
                if let SessionState::Ready(s) = &mut self.state {
                    s.dirty = true;
                }
            }
        }
    }

    fn render_now(&mut self) {
        let SessionState::Ready(session) = &mut self.state else {
            return;
        };
        let expression = compose(&session.mode);
        let rotation = session.mode.rotation();
        render(&mut session.surface, &session.source, &expression, rotation);
        session.dirty = false;
        self.renders += 1;

        let event = RenderEvent {
            generation: self.renders,
            expression: expression.to_string(),
            dimensions: session.surface.dimensions(),
        };
        log::debug!("Render #{}: {}", event.generation, event.expression);
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn encode_surface(&self, params: &EncodeParams) -> Result<(Vec<u8>, Dimensions), SessionError> {
        let SessionState::Ready(session) = &self.state else {
            return Err(SessionError::NoImage);
        };
        let bytes = self.codec.encode(session.surface.pixels(), params)?;
        Ok((bytes, session.surface.dimensions()))
    }
}

fn wrong_mode(operation: &'static str, mode: &'static str) -> SessionError {
    SessionError::WrongMode { operation, mode }
}
