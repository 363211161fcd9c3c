//! The model currently in service
//!
//! [`ActiveModel`] holds at most one [`DigitModel`] behind an `Arc`.
//! Installing a model swaps the `Arc` under a write lock; callers that
//! already hold the previous `Arc` keep using it undisturbed.

use std::path::Path;
use std::sync::{Arc, RwLock};

use digitread_core::Pix;
use tracing::info;

use crate::classifier::{DigitModel, Recognition, Recognizer};
use crate::error::{ClassificationError, RecogResult};

/// Lifecycle of an [`ActiveModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No model installed; only segmentation and extraction are usable
    Untrained,
    /// A model is installed
    Trained,
}

/// Shared, replaceable model slot
#[derive(Debug, Default)]
pub struct ActiveModel {
    slot: RwLock<Option<Arc<DigitModel>>>,
}

impl ActiveModel {
    /// An empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that starts out trained
    pub fn with_model(model: DigitModel) -> Self {
        Self {
            slot: RwLock::new(Some(Arc::new(model))),
        }
    }

    pub fn state(&self) -> ModelState {
        match *self.read_slot() {
            Some(_) => ModelState::Trained,
            None => ModelState::Untrained,
        }
    }

    /// The installed model.
    ///
    /// # Errors
    ///
    /// Returns [`ClassificationError::Untrained`] before the first install.
    pub fn current(&self) -> RecogResult<Arc<DigitModel>> {
        self.read_slot()
            .clone()
            .ok_or_else(|| ClassificationError::Untrained.into())
    }

    /// Install a model, returning the one it replaces.
    pub fn install(&self, model: DigitModel) -> Option<Arc<DigitModel>> {
        let samples = model.len();
        let previous = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(Arc::new(model));
        info!(samples, replaced = previous.is_some(), "installed digit model");
        previous
    }

    /// Read a model file and install it.
    ///
    /// The slot is left untouched if the file cannot be read.
    pub fn load(&self, path: impl AsRef<Path>) -> RecogResult<Option<Arc<DigitModel>>> {
        let model = DigitModel::read_from_file(path)?;
        Ok(self.install(model))
    }

    /// Recognize with whichever model is installed at call time.
    pub fn recognize(&self, recognizer: &Recognizer, pix: &Pix) -> RecogResult<Recognition> {
        let model = self.current()?;
        recognizer.recognize(pix, &model)
    }

    /// A poisoned lock still guards a complete `Arc`, so it is safe to read
    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Arc<DigitModel>>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecogError;
    use crate::hog::HogConfig;

    fn model(label: u8) -> DigitModel {
        let config = HogConfig {
            width: 8,
            height: 8,
            cell: 4,
            block: 2,
            orientations: 2,
        };
        DigitModel::new(1, config, vec![label], vec![0.0; 8]).unwrap()
    }

    #[test]
    fn test_untrained_then_trained() {
        let active = ActiveModel::new();
        assert_eq!(active.state(), ModelState::Untrained);
        assert!(matches!(
            active.current(),
            Err(RecogError::Classification(ClassificationError::Untrained))
        ));

        assert!(active.install(model(1)).is_none());
        assert_eq!(active.state(), ModelState::Trained);
        assert_eq!(active.current().unwrap().labels(), &[1]);
    }

    #[test]
    fn test_swap_keeps_old_readers_consistent() {
        let active = ActiveModel::with_model(model(1));
        let held = active.current().unwrap();
        let previous = active.install(model(2)).unwrap();

        assert!(Arc::ptr_eq(&held, &previous));
        assert_eq!(held.labels(), &[1]);
        assert_eq!(active.current().unwrap().labels(), &[2]);
        assert_eq!(active.state(), ModelState::Trained);
    }

    #[test]
    fn test_recognize_untrained() {
        let active = ActiveModel::new();
        let pix = Pix::from_gray_bytes(4, 4, &[0; 16]).unwrap();
        assert!(matches!(
            active.recognize(&Recognizer::default(), &pix),
            Err(RecogError::Classification(ClassificationError::Untrained))
        ));
    }

    #[test]
    fn test_failed_load_leaves_state() {
        let active = ActiveModel::new();
        assert!(active.load("/nonexistent/model.dmodel").is_err());
        assert_eq!(active.state(), ModelState::Untrained);
    }
}
