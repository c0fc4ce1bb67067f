//! How the remote visualizer should show a schedule on its lights.

use crate::codec::VisualizationCodec;
use crate::manager::Manager;
use crate::persistence::{PersistenceResult, TextStore};
use crate::registry::{ListenerId, Listeners};
use crate::sync::RwSafe;
use crate::task::Color;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TIME_SCALE: i64 = 50;
pub const DEFAULT_CYCLE_RATE: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualizationError {
    #[error("{setting} must be strictly greater than 0 (got {value})")]
    NonPositive { setting: &'static str, value: i64 },
    #[error("unknown light '{0}'")]
    UnknownLight(String),
    #[error("unknown visualization '{0}'")]
    UnknownVisualization(String),
}

/// Visualization settings: which visualization each light shows, and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visualization {
    lights: BTreeMap<String, Option<String>>,
    time_scale: i64,
    cycle_rate: i64,
    scheduler: Option<String>,
}

impl Default for Visualization {
    fn default() -> Self {
        Self {
            lights: BTreeMap::new(),
            time_scale: DEFAULT_TIME_SCALE,
            cycle_rate: DEFAULT_CYCLE_RATE,
            scheduler: None,
        }
    }
}

impl Visualization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `light` to `visualization`. `None` switches the light off, same as no mapping.
    pub fn set(&mut self, light: impl Into<String>, visualization: Option<String>) {
        self.lights.insert(light.into(), visualization);
    }

    pub fn clear_mapping(&mut self) {
        self.lights.clear();
    }

    pub fn mapping(&self) -> &BTreeMap<String, Option<String>> {
        &self.lights
    }

    pub fn mapping_for(&self, light: &str) -> Option<&str> {
        self.lights.get(light).and_then(|v| v.as_deref())
    }

    /// Milliseconds that represent one time unit of a schedule.
    pub fn time_scale(&self) -> i64 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: i64) -> Result<(), VisualizationError> {
        self.time_scale = ensure_positive("Time scale", time_scale)?;
        Ok(())
    }

    /// Milliseconds a task stays visible when several tasks share one light.
    pub fn cycle_rate(&self) -> i64 {
        self.cycle_rate
    }

    pub fn set_cycle_rate(&mut self, cycle_rate: i64) -> Result<(), VisualizationError> {
        self.cycle_rate = ensure_positive("Cycle rate", cycle_rate)?;
        Ok(())
    }

    pub fn scheduler(&self) -> Option<&str> {
        self.scheduler.as_deref()
    }

    pub fn set_scheduler(&mut self, scheduler: Option<String>) {
        self.scheduler = scheduler;
    }
}

fn ensure_positive(setting: &'static str, value: i64) -> Result<i64, VisualizationError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(VisualizationError::NonPositive { setting, value })
    }
}

/// Colors flashed on each light so a user can tell them apart, until `until`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub colors: BTreeMap<String, Color>,
    /// `None` when the requested duration runs past what the clock can represent; such an
    /// identification lasts until the next one replaces it.
    pub until: Option<Instant>,
}

pub trait VisualizationListener: Send + Sync {
    fn on_available_lights_changed(&self) {}
    fn on_available_visualizations_changed(&self) {}
    fn on_identification_started(&self) {}
}

#[derive(Debug, Default)]
struct Available {
    lights: BTreeSet<String>,
    visualizations: BTreeSet<String>,
    identification: Option<Identification>,
}

/// Persists the [`Visualization`] and tracks the lights and visualizations the remote service
/// offers. The offered sets are not persisted.
pub struct VisualizationManager {
    manager: Manager<Visualization, VisualizationCodec>,
    available: RwSafe<Available>,
    listeners: Listeners<dyn VisualizationListener>,
}

impl VisualizationManager {
    pub fn open(store: impl TextStore + 'static) -> Self {
        Self::with_manager(Manager::open(store, VisualizationCodec, Visualization::default()))
    }

    pub fn detached() -> Self {
        Self::with_manager(Manager::detached(VisualizationCodec, Visualization::default()))
    }

    fn with_manager(manager: Manager<Visualization, VisualizationCodec>) -> Self {
        Self {
            manager,
            available: RwSafe::default(),
            listeners: Listeners::new(),
        }
    }

    pub fn manager(&self) -> &Manager<Visualization, VisualizationCodec> {
        &self.manager
    }

    pub fn add_listener(&self, listener: Arc<dyn VisualizationListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Replaces the known lights. Returns whether the set changed; listeners only hear about
    /// actual changes.
    pub fn set_available_lights<I, S>(&self, lights: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lights: BTreeSet<String> = lights.into_iter().map(Into::into).collect();
        let changed = self.available.write_op(|available| {
            if available.lights == lights {
                return false;
            }
            available.lights = lights;
            true
        });
        if changed {
            debug!("available lights changed");
            for listener in self.listeners.current() {
                listener.on_available_lights_changed();
            }
        }
        changed
    }

    pub fn set_available_visualizations<I, S>(&self, visualizations: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let visualizations: BTreeSet<String> = visualizations.into_iter().map(Into::into).collect();
        let changed = self.available.write_op(|available| {
            if available.visualizations == visualizations {
                return false;
            }
            available.visualizations = visualizations;
            true
        });
        if changed {
            debug!("available visualizations changed");
            for listener in self.listeners.current() {
                listener.on_available_visualizations_changed();
            }
        }
        changed
    }

    pub fn lights(&self) -> BTreeSet<String> {
        self.available.read_op(|available| available.lights.clone())
    }

    pub fn visualizations(&self) -> BTreeSet<String> {
        self.available.read_op(|available| available.visualizations.clone())
    }

    pub fn has_light(&self, light: &str) -> bool {
        self.available.read_op(|available| available.lights.contains(light))
    }

    pub fn has_visualization(&self, visualization: &str) -> bool {
        self.available
            .read_op(|available| available.visualizations.contains(visualization))
    }

    /// Maps a known light to a known visualization, or switches it off with `None`.
    ///
    /// The offered names stay read-locked until the mapping is stored, so they cannot be
    /// withdrawn in between. Lock order is always offered names, then settings.
    pub fn assign(&self, light: &str, visualization: Option<&str>) -> Result<(), VisualizationError> {
        self.available.read_op(|available| {
            if !available.lights.contains(light) {
                return Err(VisualizationError::UnknownLight(light.to_string()));
            }
            if let Some(name) = visualization {
                if !available.visualizations.contains(name) {
                    return Err(VisualizationError::UnknownVisualization(name.to_string()));
                }
            }
            self.manager
                .write_op(|settings| settings.set(light, visualization.map(str::to_string)));
            Ok(())
        })
    }

    /// A copy of the current settings.
    pub fn visualization(&self) -> Visualization {
        self.manager.snapshot()
    }

    /// Edits the settings under the write lock. Nothing is persisted until [`write`](Self::write).
    pub fn update<R>(&self, op: impl FnOnce(&mut Visualization) -> R) -> R {
        self.manager.write_op(op)
    }

    /// Records that the lights now flash `colors` for `duration`.
    pub fn start_identification(&self, colors: BTreeMap<String, Color>, duration: Duration) {
        let until = Instant::now().checked_add(duration);
        self.available.write_op(|available| {
            available.identification = Some(Identification { colors, until });
        });
        for listener in self.listeners.current() {
            listener.on_identification_started();
        }
    }

    /// The most recent identification, if it has not ended yet.
    pub fn current_identification(&self) -> Option<Identification> {
        let now = Instant::now();
        self.available.read_op(|available| {
            available
                .identification
                .as_ref()
                .filter(|identification| identification.until.is_none_or(|until| until > now))
                .cloned()
        })
    }

    pub fn reload(&self) -> PersistenceResult<()> {
        self.manager.reload()
    }

    pub fn write(&self) -> PersistenceResult<()> {
        self.manager.write()
    }
}
