//! Type-to-converter resolution shared by both directions
//!
//! Resolution order for a type: per-type cache, exact registrations, then
//! families in registration order. Any registration clears the cache and
//! bumps the generation counter; a family decision reached against an older
//! generation is returned but never cached.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::Direction;

use super::reflect::TypeInfo;

/// Resolver that may supply a converter for any type matching a shape
pub trait ConverterFamily<C: ?Sized>: Send + Sync {
    fn find(&self, info: &TypeInfo) -> Option<Arc<C>>;
}

/// Family built from a closure
pub struct FnFamily<F>(pub F);

impl<C, F> ConverterFamily<C> for FnFamily<F>
where
    C: ?Sized,
    F: Fn(&TypeInfo) -> Option<Arc<C>> + Send + Sync,
{
    fn find(&self, info: &TypeInfo) -> Option<Arc<C>> {
        (self.0)(info)
    }
}

struct RegistryState<C: ?Sized> {
    exact: HashMap<TypeId, Arc<C>>,
    families: Vec<Arc<dyn ConverterFamily<C>>>,
    cache: HashMap<TypeId, Arc<C>>,
    generation: u64,
}

pub struct ConverterRegistry<C: ?Sized> {
    direction: Direction,
    state: RwLock<RegistryState<C>>,
}

impl<C: ?Sized> ConverterRegistry<C> {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: RwLock::new(RegistryState {
                exact: HashMap::new(),
                families: Vec::new(),
                cache: HashMap::new(),
                generation: 0,
            }),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Register a converter for exactly one type; the latest registration wins
    pub fn register(&self, info: &TypeInfo, converter: Arc<C>) {
        let mut state = self.state.write();
        state.exact.insert(info.id(), converter);
        state.cache.clear();
        state.generation += 1;
        debug!(
            direction = %self.direction,
            type_name = info.name(),
            "Registered converter"
        );
    }

    /// Append a family; earlier families take precedence
    pub fn register_family(&self, family: Arc<dyn ConverterFamily<C>>) {
        let mut state = self.state.write();
        state.families.push(family);
        state.cache.clear();
        state.generation += 1;
        debug!(
            direction = %self.direction,
            families = state.families.len(),
            "Registered converter family"
        );
    }

    /// Incremented by every registration
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn family_count(&self) -> usize {
        self.state.read().families.len()
    }

    pub fn cached_count(&self) -> usize {
        self.state.read().cache.len()
    }

    pub fn find(&self, info: &TypeInfo) -> Option<Arc<C>> {
        let (families, generation) = {
            let state = self.state.read();
            if let Some(converter) = state.cache.get(&info.id()) {
                return Some(Arc::clone(converter));
            }
            if let Some(converter) = state.exact.get(&info.id()) {
                let converter = Arc::clone(converter);
                let generation = state.generation;
                drop(state);
                self.publish(info, &converter, generation);
                return Some(converter);
            }
            (state.families.clone(), state.generation)
        };

        // Families run outside the lock so they may consult the registry themselves
        for family in families {
            if let Some(converter) = family.find(info) {
                trace!(
                    direction = %self.direction,
                    type_name = info.name(),
                    kind = info.kind().label(),
                    "Family accepted type"
                );
                self.publish(info, &converter, generation);
                return Some(converter);
            }
        }
        debug!(
            direction = %self.direction,
            type_name = info.name(),
            "No converter found"
        );
        None
    }

    fn publish(&self, info: &TypeInfo, converter: &Arc<C>, generation: u64) {
        let mut state = self.state.write();
        if state.generation == generation {
            state.cache.insert(info.id(), Arc::clone(converter));
        }
    }
}

impl<C: ?Sized> fmt::Debug for ConverterRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ConverterRegistry")
            .field("direction", &self.direction)
            .field("exact", &state.exact.len())
            .field("families", &state.families.len())
            .field("cached", &state.cache.len())
            .field("generation", &state.generation)
            .finish()
    }
}
