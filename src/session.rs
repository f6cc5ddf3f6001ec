//! One user's exploration session.
//!
//! Each session owns its volume outright; nothing is shared between
//! sessions. Commands run to completion one at a time and move the session
//! through
//! `Idle -> Loading -> {Loaded | LoadFailed} -> Exploring <-> Exporting -> Idle`.

use thiserror::Error;

use crate::{
    config::{ConfigError, SessionConfig},
    enums::{Orientation, SessionState},
    exporter::{ExportArtifact, ExportError, Exporter},
    normalizer::ThresholdWindow,
    renderer::{VolumeFigure, VolumeRenderer},
    volume::{SliceImage, SliceView, Volume, VolumeError},
    volume_loader::{LoadError, LoadReport, LoadSource, VolumeLoader},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot {action} while the session is {state:?}; load a DICOM series first")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

#[derive(Debug, Clone)]
pub enum Command {
    Load(LoadSource),
    SetThreshold { min: f32, max: f32 },
    SelectSlice { orientation: Orientation, index: usize },
    Render,
    Export,
    Reset,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Loaded {
        shape: (usize, usize, usize),
        report: LoadReport,
    },
    Rendered(VolumeFigure),
    Slice(SliceImage),
    Exported(ExportArtifact),
    Reset,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    volume: Option<Volume>,
    threshold: Option<ThresholdWindow>,
    slice_view: Option<SliceView>,
    report: Option<LoadReport>,
    artifact: Option<ExportArtifact>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.volume.as_ref()
    }

    pub fn threshold(&self) -> Option<ThresholdWindow> {
        self.threshold
    }

    pub fn slice_view(&self) -> Option<SliceView> {
        self.slice_view
    }

    /// Diagnostics of the most recent load attempt, successful or not.
    pub fn report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    pub fn last_export(&self) -> Option<&ExportArtifact> {
        self.artifact.as_ref()
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, SessionError> {
        match command {
            Command::Load(source) => self.load(&source),
            Command::SetThreshold { min, max } => {
                self.set_threshold(min, max).map(Outcome::Rendered)
            }
            Command::SelectSlice { orientation, index } => {
                self.select_slice(orientation, index).map(Outcome::Slice)
            }
            Command::Render => self.render().map(Outcome::Rendered),
            Command::Export => self.export().map(Outcome::Exported),
            Command::Reset => {
                self.reset();
                Ok(Outcome::Reset)
            }
        }
    }

    /// Replace whatever the session holds with a freshly assembled volume.
    pub fn load(&mut self, source: &LoadSource) -> Result<Outcome, SessionError> {
        self.clear();
        self.transition(SessionState::Loading);

        match VolumeLoader::load(source, &self.config.slice_extension) {
            Ok((volume, report)) => {
                let shape = volume.dim();
                if let Err(err) = volume.validate() {
                    log::warn!("{err}");
                }
                self.threshold = volume.default_threshold().ok();
                self.slice_view = volume
                    .default_slice_view(self.config.default_orientation)
                    .ok();
                self.volume = Some(volume);
                self.report = Some(report.clone());
                self.transition(SessionState::Loaded);
                Ok(Outcome::Loaded { shape, report })
            }
            Err(err) => {
                if let LoadError::EmptyVolume { report } = &err {
                    self.report = Some(report.clone());
                }
                log::error!("Loading failed: {err}");
                self.transition(SessionState::LoadFailed);
                Err(err.into())
            }
        }
    }

    /// Change the visible intensity range and re-render the whole volume.
    pub fn set_threshold(&mut self, min: f32, max: f32) -> Result<VolumeFigure, SessionError> {
        let volume = self.require_volume("set the threshold")?;
        let window = volume.threshold(min, max)?;
        self.threshold = Some(window);
        self.transition(SessionState::Exploring);
        self.render()
    }

    pub fn render(&mut self) -> Result<VolumeFigure, SessionError> {
        let volume = self.require_volume("render")?;
        let window = match self.threshold {
            Some(window) => window,
            None => volume.default_threshold()?,
        };
        let figure = VolumeRenderer::render(volume, window, &self.config.render)?;
        self.transition(SessionState::Exploring);
        Ok(figure)
    }

    pub fn select_slice(
        &mut self,
        orientation: Orientation,
        index: usize,
    ) -> Result<SliceImage, SessionError> {
        let volume = self.require_volume("select a slice")?;
        let view = volume.slice_view(orientation, index)?;
        let image = volume.get_image_from_axis(&view)?;
        self.slice_view = Some(view);
        self.transition(SessionState::Exploring);
        Ok(image)
    }

    /// Write the volume to the configured export path, overwriting the
    /// previous export.
    pub fn export(&mut self) -> Result<ExportArtifact, SessionError> {
        self.require_volume("export")?.validate()?;
        let previous = self.state;
        self.transition(SessionState::Exporting);

        match self.write_export() {
            Ok(artifact) => {
                self.artifact = Some(artifact.clone());
                Ok(artifact)
            }
            Err(err) => {
                log::error!("Export failed: {err}");
                self.transition(previous);
                Err(err)
            }
        }
    }

    fn write_export(&self) -> Result<ExportArtifact, SessionError> {
        let volume = self.require_volume("export")?;
        self.config.ensure_output_dir()?;
        Ok(Exporter::export(volume, self.config.export_path())?)
    }

    /// Drop the volume and go back to `Idle`.
    pub fn reset(&mut self) {
        self.clear();
        self.transition(SessionState::Idle);
    }

    fn clear(&mut self) {
        self.volume = None;
        self.threshold = None;
        self.slice_view = None;
        self.report = None;
        self.artifact = None;
    }

    fn require_volume(&self, action: &'static str) -> Result<&Volume, SessionError> {
        match (&self.volume, self.state.has_volume()) {
            (Some(volume), true) => Ok(volume),
            _ => Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            }),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::debug!("Session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
