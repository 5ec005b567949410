use parking_lot::Mutex;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

pub type StreamRng = Xoshiro256PlusPlus;

/// Handle to the single random stream owned by an agent.
///
/// Cloning the handle shares the stream: every learner of an agent holds a clone
/// and draws from the same sequence as the agent's policy. Serialization writes
/// the generator state, so a restored stream picks up where it stopped.
#[derive(Clone)]
pub struct SharedRng(Arc<Mutex<StreamRng>>);

impl SharedRng {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            StreamRng::seed_from_u64(seed)
        } else {
            StreamRng::from_os_rng()
        };

        Self::from_rng(rng)
    }

    fn from_rng(rng: StreamRng) -> Self {
        Self(Arc::new(Mutex::new(rng)))
    }

    /// Runs `f` with exclusive access to the stream.
    ///
    /// The lock is not reentrant: `f` must not call back into anything that
    /// draws from the same stream (arm sampling included).
    pub fn with<T>(&self, f: impl FnOnce(&mut StreamRng) -> T) -> T {
        f(&mut self.0.lock())
    }

    /// Independent copy of the stream at its current position.
    pub fn detach(&self) -> Self {
        Self::from_rng(self.0.lock().clone())
    }

    pub fn ptr_eq(&self, other: &SharedRng) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedRng")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

impl Serialize for SharedRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.lock().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rng = StreamRng::deserialize(deserializer)?;
        Ok(Self::from_rng(rng))
    }
}
