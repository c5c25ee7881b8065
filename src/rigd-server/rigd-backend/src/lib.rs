// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use rigd_app::normalize_name;
use rigd_core::rig::{OpenParams, RigInfo, RigTransport};
use rigd_core::{TransportError, TransportResult};

mod dummy;
pub mod mock;
#[cfg(feature = "sim")]
mod sim;

pub use dummy::{DummyRig, DUMMY_MODEL_ID};
pub use mock::{MockCall, MockHandle, MockTransport};
#[cfg(feature = "sim")]
pub use sim::{SimRig, SIM_MODEL_ID};

pub type TransportFactory = fn(&OpenParams) -> TransportResult<Box<dyn RigTransport>>;

/// A registered backend: its static description plus how to open it.
#[derive(Clone)]
pub struct BackendEntry {
    pub name: String,
    pub info: RigInfo,
    factory: TransportFactory,
}

impl std::fmt::Debug for BackendEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEntry")
            .field("name", &self.name)
            .field("info", &self.info)
            .finish()
    }
}

/// Registry of transports, addressable by model id or name.
#[derive(Clone, Debug, Default)]
pub struct TransportRegistry {
    entries: BTreeMap<u32, BackendEntry>,
    names: HashMap<String, u32>,
    aliases: HashMap<u32, u32>,
}

impl TransportRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in backend enabled by features.
    pub fn with_builtin_backends() -> Self {
        let mut registry = Self::new();
        register_builtin_backends_on(&mut registry);
        registry
    }

    /// Register a backend under its model id and a stable name (e.g. "dummy").
    pub fn register_backend(&mut self, name: &str, info: RigInfo, factory: TransportFactory) {
        let id = info.model_id;
        self.names.insert(normalize_name(name), id);
        self.entries.insert(
            id,
            BackendEntry {
                name: name.to_string(),
                info,
                factory,
            },
        );
    }

    /// Let `alias` open the backend registered as `target`.
    pub fn register_alias(&mut self, alias: u32, target: u32) {
        self.aliases.insert(alias, target);
    }

    /// Turn a numeric model id or a backend name into a registered id.
    pub fn resolve(&self, model: &str) -> Option<u32> {
        let id = match model.trim().parse::<u32>() {
            Ok(id) => self.aliases.get(&id).copied().unwrap_or(id),
            Err(_) => *self.names.get(&normalize_name(model))?,
        };
        self.entries.contains_key(&id).then_some(id)
    }

    pub fn entry(&self, model_id: u32) -> Option<&BackendEntry> {
        let id = self.aliases.get(&model_id).copied().unwrap_or(model_id);
        self.entries.get(&id)
    }

    /// Registered backends sorted by model id.
    pub fn entries(&self) -> impl Iterator<Item = &BackendEntry> {
        self.entries.values()
    }

    /// Bind a transport for the model in `params`.
    pub fn open(&self, params: &OpenParams) -> TransportResult<Box<dyn RigTransport>> {
        let entry = self
            .entry(params.model_id)
            .ok_or_else(|| TransportError::UnknownModel(params.model_id.to_string()))?;
        debug!("Opening backend {} ({})", entry.name, params);
        (entry.factory)(params)
    }
}

/// Register all built-in backends enabled by features on a registry.
pub fn register_builtin_backends_on(registry: &mut TransportRegistry) {
    registry.register_backend("dummy", dummy::info(), dummy_factory);
    // Model 0 has always meant "no rig selected"
    registry.register_alias(0, DUMMY_MODEL_ID);
    #[cfg(feature = "sim")]
    registry.register_backend("sim", sim::info(), sim_factory);
}

fn dummy_factory(_params: &OpenParams) -> TransportResult<Box<dyn RigTransport>> {
    Ok(Box::new(DummyRig::new()))
}

#[cfg(feature = "sim")]
fn sim_factory(params: &OpenParams) -> TransportResult<Box<dyn RigTransport>> {
    Ok(Box::new(SimRig::open(params)?))
}
