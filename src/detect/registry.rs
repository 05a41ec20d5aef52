//! Lazily-initialized, shared model handles.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::provider::{JointReader, ModelKind, ModelProvider, TextDetector, TextRecognizer};
use crate::error::OcrLabelError;

static GLOBAL: OnceLock<Arc<ModelRegistry>> = OnceLock::new();

type Slot<T> = Mutex<Option<Arc<T>>>;

/// Owns one lazily-loaded instance of each model kind.
///
/// Every slot is constructed at most once, on first use, under its own
/// lock. Engines holding the same registry share the loaded models, so a
/// process that routes all requests through [`ModelRegistry::global`] pays
/// each load cost exactly once. A failed load leaves the slot empty and is
/// attempted again by the next caller.
pub struct ModelRegistry {
    provider: Box<dyn ModelProvider>,
    joint: Slot<dyn JointReader>,
    detector: Slot<dyn TextDetector>,
    recognizer: Slot<dyn TextRecognizer>,
}

impl ModelRegistry {
    /// Creates a registry with nothing loaded yet.
    pub fn new(provider: impl ModelProvider + 'static) -> Arc<Self> {
        Arc::new(Self {
            provider: Box::new(provider),
            joint: Mutex::new(None),
            detector: Mutex::new(None),
            recognizer: Mutex::new(None),
        })
    }

    /// Installs the process-wide registry, or returns the one already
    /// installed (in which case `provider` is discarded).
    pub fn install_global(provider: impl ModelProvider + 'static) -> Arc<Self> {
        GLOBAL.get_or_init(|| Self::new(provider)).clone()
    }

    /// The process-wide registry, if one has been installed.
    pub fn global() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }

    /// Returns the joint model, loading it on first use.
    pub fn joint_reader(&self) -> Result<Arc<dyn JointReader>, OcrLabelError> {
        get_or_load(&self.joint, ModelKind::Joint, || self.provider.load_joint())
    }

    /// Returns the region detector, loading it on first use.
    pub fn detector(&self) -> Result<Arc<dyn TextDetector>, OcrLabelError> {
        get_or_load(&self.detector, ModelKind::Detector, || {
            self.provider.load_detector()
        })
    }

    /// Returns the region recognizer, loading it on first use.
    pub fn recognizer(&self) -> Result<Arc<dyn TextRecognizer>, OcrLabelError> {
        get_or_load(&self.recognizer, ModelKind::Recognizer, || {
            self.provider.load_recognizer()
        })
    }

    /// Returns true if the given model has been loaded.
    pub fn is_loaded(&self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Joint => is_filled(&self.joint),
            ModelKind::Detector => is_filled(&self.detector),
            ModelKind::Recognizer => is_filled(&self.recognizer),
        }
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("joint", &self.is_loaded(ModelKind::Joint))
            .field("detector", &self.is_loaded(ModelKind::Detector))
            .field("recognizer", &self.is_loaded(ModelKind::Recognizer))
            .finish()
    }
}

fn get_or_load<T: ?Sized>(
    slot: &Slot<T>,
    kind: ModelKind,
    load: impl FnOnce() -> Result<Box<T>, OcrLabelError>,
) -> Result<Arc<T>, OcrLabelError> {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(model) = guard.as_ref() {
        return Ok(Arc::clone(model));
    }

    tracing::info!(model = %kind, "loading model");
    let model: Arc<T> = Arc::from(load()?);
    *guard = Some(Arc::clone(&model));
    Ok(model)
}

fn is_filled<T: ?Sized>(slot: &Slot<T>) -> bool {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}
