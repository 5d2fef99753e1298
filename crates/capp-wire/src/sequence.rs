//! Sequence numbering and request/response correlation.
//!
//! The protocol allows one outstanding request per connection, so matching a
//! response to its request is a single equality check on sequence numbers.

use thiserror::Error;

use crate::message::{Request, Response};
use crate::types::SequenceNumber;

/// Errors raised when a response does not belong to the request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// Response sequence number differs from the request's.
    #[error("response sequence number {received} does not match request {expected}")]
    SequenceMismatch {
        expected: SequenceNumber,
        received: SequenceNumber,
    },
}

/// Per-connection source of monotonically increasing sequence numbers.
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    next: u64,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceCounter {
    /// Creates a counter whose first number is 1.
    pub fn new() -> Self {
        Self::starting_at(SequenceNumber::new(1))
    }

    /// Creates a counter whose first number is `first`.
    pub fn starting_at(first: SequenceNumber) -> Self {
        Self {
            next: first.as_u64(),
        }
    }

    /// Returns a fresh sequence number and advances the counter by one.
    pub fn next_sequence_number(&mut self) -> SequenceNumber {
        let seq = SequenceNumber::new(self.next);
        self.next = self.next.wrapping_add(1);
        seq
    }

    /// Returns the number the next call to `next_sequence_number` will hand out.
    pub fn peek(&self) -> SequenceNumber {
        SequenceNumber::new(self.next)
    }
}

/// Checks that `response` answers `request`.
pub fn correlate(request: &Request, response: &Response) -> Result<(), CorrelationError> {
    if request.sequence_number == response.sequence_number {
        Ok(())
    } else {
        Err(CorrelationError::SequenceMismatch {
            expected: request.sequence_number,
            received: response.sequence_number,
        })
    }
}

#[cfg(test)]
mod sequence_tests {
    use super::*;
    use crate::message::{ConnectRequest, ErrorCode, RequestPayload};

    #[test]
    fn test_counter_starts_at_one_and_increments() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.peek(), SequenceNumber::new(1));
        assert_eq!(counter.next_sequence_number(), SequenceNumber::new(1));
        assert_eq!(counter.next_sequence_number(), SequenceNumber::new(2));
        assert_eq!(counter.peek(), SequenceNumber::new(3));
    }

    #[test]
    fn test_counter_custom_start() {
        let mut counter = SequenceCounter::starting_at(SequenceNumber::new(0));
        assert_eq!(counter.next_sequence_number(), SequenceNumber::new(0));
        assert_eq!(counter.next_sequence_number(), SequenceNumber::new(1));
    }

    #[test]
    fn test_correlate_ignores_status() {
        let request = Request::new(
            SequenceNumber::new(5),
            RequestPayload::Connect(ConnectRequest {}),
        );
        let rejected = Response::error(SequenceNumber::new(5), ErrorCode::RetryTooSoon, "slow down");
        assert_eq!(correlate(&request, &rejected), Ok(()));

        let stale = Response::error(SequenceNumber::new(4), ErrorCode::Unknown, "");
        assert_eq!(
            correlate(&request, &stale),
            Err(CorrelationError::SequenceMismatch {
                expected: SequenceNumber::new(5),
                received: SequenceNumber::new(4),
            })
        );
    }
}
