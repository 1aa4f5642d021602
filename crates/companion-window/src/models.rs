// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Known models and their maximum context windows.

use companion_core::CompanionError;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Models shipped with the crate: `(name, context_window)`.
const BUILTIN_MODELS: &[(&str, usize)] = &[(DEFAULT_MODEL, 128_000), ("inflection_3_pi", 8_000)];

/// A model name and the largest number of tokens it accepts in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub context_window: usize,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, context_window: usize) -> Self {
        Self {
            name: name.into(),
            context_window,
        }
    }
}

/// Lookup table of models, seeded with the built-ins.
///
/// Later registrations with an existing name replace the earlier entry, so
/// configuration can override a built-in window.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        Self {
            models: BUILTIN_MODELS
                .iter()
                .map(|(name, window)| ModelInfo::new(*name, *window))
                .collect(),
        }
    }

    /// Adds or replaces a model.
    pub fn register(&mut self, model: ModelInfo) {
        match self.models.iter_mut().find(|m| m.name == model.name) {
            Some(existing) => existing.context_window = model.context_window,
            None => self.models.push(model),
        }
    }

    /// Builder form of [`ModelCatalog::register`].
    pub fn with_model(mut self, name: impl Into<String>, context_window: usize) -> Self {
        self.register(ModelInfo::new(name, context_window));
        self
    }

    /// Looks up a model by exact name.
    pub fn get(&self, name: &str) -> Result<&ModelInfo, CompanionError> {
        self.models.iter().find(|m| m.name == name).ok_or_else(|| {
            CompanionError::Configuration(format!("unknown model: {name}"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.iter()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
