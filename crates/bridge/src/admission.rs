use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::AskError;

/// Optional cap on concurrently running tool processes.
#[derive(Debug, Clone)]
pub(crate) struct Admission {
    slots: Option<(Arc<Semaphore>, usize)>,
}

/// Held for the lifetime of one tool process.
#[derive(Debug)]
pub(crate) struct Permit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl Admission {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            slots: limit.map(|limit| (Arc::new(Semaphore::new(limit)), limit)),
        }
    }

    pub(crate) fn try_admit(&self) -> Result<Permit, AskError> {
        let Some((semaphore, limit)) = &self.slots else {
            return Ok(Permit { _permit: None });
        };
        match Arc::clone(semaphore).try_acquire_owned() {
            Ok(permit) => Ok(Permit {
                _permit: Some(permit),
            }),
            Err(_) => Err(AskError::Busy { limit: *limit }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_always_admits() {
        let admission = Admission::new(None);
        let permits: Vec<_> = (0..64).map(|_| admission.try_admit().unwrap()).collect();
        assert_eq!(permits.len(), 64);
    }

    #[test]
    fn bounded_rejects_when_full_and_recovers() {
        let admission = Admission::new(Some(1));
        let first = admission.try_admit().unwrap();
        assert!(matches!(
            admission.try_admit(),
            Err(AskError::Busy { limit: 1 })
        ));
        drop(first);
        assert!(admission.try_admit().is_ok());
    }
}
