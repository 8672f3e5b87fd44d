//! Embeddable widget instance API
//!
//! A [`WidgetHost`] owns at most one [`Widget`]. Each widget runs its own
//! session task and starts collapsed; `show` and `hide` open and close the
//! chat, which also tears down listening and playback.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::WidgetConfig;
use crate::knowledge::{self, Topic};
use crate::session::{SessionController, SessionDeps, SessionHandle};
use crate::{Error, Result};

/// Greeting shown when the chat first opens
pub const WELCOME_MESSAGE: &str = "🎥 Selamat datang di layanan informasi CCTV dan layanan publik!\n\nSilakan pilih informasi yang Anda butuhkan:";

/// Reply to a quick action whose feature is switched off
const UNAVAILABLE: &str = "Informasi tidak tersedia.";

/// One-tap shortcuts offered under the greeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    CameraLocations,
    RtspStreaming,
    Emergency,
    OperationalHours,
    MultiplePoints,
    RecordingAccess,
}

impl QuickAction {
    pub const ALL: [Self; 6] = [
        Self::CameraLocations,
        Self::RtspStreaming,
        Self::Emergency,
        Self::OperationalHours,
        Self::MultiplePoints,
        Self::RecordingAccess,
    ];

    /// Button label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CameraLocations => "📍 Lokasi Kamera",
            Self::RtspStreaming => "📡 RTSP Stream",
            Self::Emergency => "🚨 Emergency",
            Self::OperationalHours => "🕐 Jam Operasional",
            Self::MultiplePoints => "📊 Multiple Points",
            Self::RecordingAccess => "💾 Access Recording",
        }
    }

    const fn topic(self) -> Topic {
        match self {
            Self::CameraLocations => Topic::CameraLocations,
            Self::RtspStreaming => Topic::RtspStreaming,
            Self::Emergency => Topic::Emergency,
            Self::OperationalHours => Topic::OperationalHours,
            Self::MultiplePoints => Topic::MultiplePoints,
            Self::RecordingAccess => Topic::RecordingAccess,
        }
    }
}

/// Builds session dependencies for a new widget
pub type SessionFactory = Arc<dyn Fn(&WidgetConfig) -> SessionDeps + Send + Sync>;

/// A live widget instance
pub struct Widget {
    config: WidgetConfig,
    session: SessionHandle,
    task: JoinHandle<()>,
    visible: bool,
    greeted: bool,
}

impl Widget {
    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Session behind the widget
    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Whether the chat is open
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Owner of the single widget instance
pub struct WidgetHost {
    factory: SessionFactory,
    widget: Option<Widget>,
}

impl WidgetHost {
    /// Create an empty host that builds sessions with `factory`
    #[must_use]
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            factory,
            widget: None,
        }
    }

    /// Create the widget from a complete configuration
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` if a widget exists (nothing is created),
    /// or `Config` if the configuration disables the widget
    pub async fn init(&mut self, config: WidgetConfig) -> Result<&Widget> {
        if self.widget.is_some() {
            tracing::warn!("widget already initialized");
            return Err(Error::AlreadyInitialized);
        }
        if !config.enabled {
            return Err(Error::Config("widget is disabled".to_string()));
        }

        let (session, task) = SessionController::spawn((self.factory)(&config));
        // Widgets start collapsed
        session.close().await?;

        tracing::info!(position = ?config.position, theme = ?config.theme, "widget initialized");
        Ok(&*self.widget.insert(Widget {
            config,
            session,
            task,
            visible: false,
            greeted: false,
        }))
    }

    /// Create the widget from a partial JSON configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid overlay, otherwise as [`Self::init`]
    pub async fn init_with_overlay(&mut self, overlay: &serde_json::Value) -> Result<&Widget> {
        let config = WidgetConfig::from_overlay(overlay)?;
        self.init(config).await
    }

    /// Declarative auto-init from a `data-config` style JSON string
    ///
    /// # Errors
    ///
    /// Returns `Config` for malformed JSON, otherwise as [`Self::init`]
    pub async fn init_from_attribute(&mut self, raw: &str) -> Result<&Widget> {
        let config = WidgetConfig::from_attribute(raw)?;
        self.init(config).await
    }

    /// Open the chat; the first opening posts the greeting
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a widget
    pub async fn show(&mut self) -> Result<()> {
        let widget = self.widget.as_mut().ok_or(Error::NotInitialized)?;
        widget.session.open().await?;
        if !widget.greeted {
            widget.session.announce(WELCOME_MESSAGE).await?;
            widget.greeted = true;
        }
        widget.visible = true;
        Ok(())
    }

    /// Close the chat, stopping capture, timers and playback
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a widget
    pub async fn hide(&mut self) -> Result<()> {
        let widget = self.widget.as_mut().ok_or(Error::NotInitialized)?;
        widget.session.close().await?;
        widget.visible = false;
        Ok(())
    }

    /// Remove the widget and stop its session; a no-op without one
    pub async fn destroy(&mut self) {
        let Some(widget) = self.widget.take() else {
            return;
        };
        if widget.session.shutdown().await.is_err() {
            tracing::debug!("widget session already stopped");
        }
        if let Err(e) = widget.task.await {
            tracing::warn!(error = %e, "widget session task failed");
        }
        tracing::info!("widget destroyed");
    }

    /// Post a bot message into the chat; ignored without a widget
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn send_custom_message(&self, text: &str) -> Result<()> {
        match &self.widget {
            Some(widget) => widget.session.announce(text).await,
            None => Ok(()),
        }
    }

    /// Answer a quick action straight from the knowledge store
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a widget
    pub async fn quick_action(&self, action: QuickAction) -> Result<()> {
        let widget = self.widget.as_ref().ok_or(Error::NotInitialized)?;
        let topic = action.topic();
        let text = if topic.enabled(&widget.config.features) {
            knowledge::render(topic)
        } else {
            UNAVAILABLE.to_string()
        };
        widget.session.announce(text).await
    }

    /// The widget, if initialized
    #[must_use]
    pub const fn widget(&self) -> Option<&Widget> {
        self.widget.as_ref()
    }

    /// Whether a widget exists
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.widget.is_some()
    }
}
