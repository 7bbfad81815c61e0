// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Admission control for outbound requests.

use std::sync::Arc;
use std::time::Duration;

use log::trace;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{Error, ErrorKind};

/// A slot in the concurrency budget.
///
/// The slot is returned to the limiter when the ticket is dropped, on every
/// path.
#[derive(Debug)]
pub struct AdmissionTicket {
    _permit: OwnedSemaphorePermit,
}

/// A gate bounding the number of concurrent outbound requests.
///
/// The capacity is fixed at construction. Waiting for a slot is bounded by
/// the configured timeout; running into it yields [`ErrorKind::Throttled`],
/// a kind distinct from all HTTP-layer errors, so that callers can tell
/// local self-throttling from an unreachable array. Dropping the `acquire`
/// future before it resolves does not leak a slot.
///
/// Cloned limiters share the same budget.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl RequestLimiter {
    /// Create a limiter admitting up to `capacity` concurrent requests.
    pub fn new(capacity: usize, timeout: Duration) -> Result<RequestLimiter, Error> {
        if capacity == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "request limiter capacity must be positive",
            ));
        }
        Ok(RequestLimiter {
            permits: Arc::new(Semaphore::new(capacity)),
            timeout,
        })
    }

    /// Wait for a request slot.
    ///
    /// Resolves to a ticket once a slot is free, or to an
    /// [`ErrorKind::Throttled`] error when the timeout elapses first.
    pub async fn acquire(&self) -> Result<AdmissionTicket, Error> {
        match tokio::time::timeout(self.timeout, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(AdmissionTicket { _permit: permit }),
            // The semaphore is never closed; treat it as exhaustion anyway.
            Ok(Err(..)) => Err(Error::new(
                ErrorKind::Throttled,
                "request limiter is no longer accepting requests",
            )),
            Err(..) => {
                trace!("No request slot became free within {:?}", self.timeout);
                Err(Error::new(
                    ErrorKind::Throttled,
                    format!("no request slot became free within {:?}", self.timeout),
                ))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::RequestLimiter;
    use crate::ErrorKind;

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = RequestLimiter::new(0, Duration::from_secs(1)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_acquire_within_capacity() {
        let limiter = RequestLimiter::new(2, Duration::from_millis(10)).unwrap();
        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        drop(first);
        drop(second);
    }

    #[tokio::test]
    async fn test_acquire_times_out_while_slot_is_held() {
        let limiter = RequestLimiter::new(1, Duration::from_millis(50)).unwrap();
        let held = limiter.acquire().await.unwrap();

        let err = limiter.acquire().await.err().unwrap();
        assert!(err.is_throttled());
        assert_eq!(err.kind(), ErrorKind::Throttled);

        drop(held);
        let _ = limiter.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_succeeds_when_slot_frees_in_time() {
        let limiter = RequestLimiter::new(1, Duration::from_millis(300)).unwrap();
        let held = limiter.acquire().await.unwrap();

        let contender = limiter.clone();
        let waiter = tokio::spawn(async move { contender.acquire().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(held);

        let ticket = waiter.await.unwrap();
        assert!(ticket.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_acquire_does_not_leak_a_slot() {
        let limiter = RequestLimiter::new(1, Duration::from_millis(200)).unwrap();
        let held = limiter.acquire().await.unwrap();

        {
            let pending = limiter.acquire();
            tokio::pin!(pending);
            let raced = tokio::time::timeout(Duration::from_millis(20), &mut pending).await;
            assert!(raced.is_err());
            // Dropping the future here abandons the wait.
        }

        drop(held);
        let _ = limiter.acquire().await.unwrap();
    }
}
