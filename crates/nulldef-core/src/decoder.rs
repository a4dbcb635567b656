//! # Defensive Decoder
//!
//! Wraps a [`Codec`] so that every decoded value passes through the
//! validation pass before it is returned.
//!
//! ## Decode Contract
//!
//! 1. No source → `Ok(None)`; the codec is not called.
//! 2. The codec materializes the value. Its errors propagate unchanged.
//! 3. A null document → `Ok(None)`.
//! 4. The value is inspected under the policy; a rejected value → `Ok(None)`.
//!
//! Nested values are covered by their own descriptors, so one decoder per
//! session validates the whole graph bottom-up.
//!
//! ## Encode Contract
//!
//! Present values pass through to the codec. An absent value writes nothing.
//!
//! ## Thread Safety
//!
//! The policy is shared read-only behind an `Arc`. A decoder is `Send + Sync`
//! whenever its codec is, and concurrent decode calls share nothing mutable.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Codec;
use crate::descriptor::Defend;
use crate::filter::Verdict;
use crate::policy::FilterPolicy;

/// A codec wrapped with the mandatory-field filter.
#[derive(Debug, Clone)]
pub struct DefensiveDecoder<C> {
    codec: C,
    policy: Arc<FilterPolicy>,
}

impl<C: Codec> DefensiveDecoder<C> {
    /// Wrap `codec` with `policy`.
    pub fn new(codec: C, policy: impl Into<Arc<FilterPolicy>>) -> Self {
        Self {
            codec,
            policy: policy.into(),
        }
    }

    /// The policy applied to every decoded value.
    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// The wrapped codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decode and filter.
    ///
    /// # Errors
    ///
    /// Returns the codec's error if the source cannot be decoded as `T`.
    /// A value that fails its mandatory checks is `Ok(None)`, not an error.
    pub fn decode<T>(&self, source: Option<&[u8]>) -> Result<Option<T>, C::Error>
    where
        T: DeserializeOwned + Defend,
    {
        let Some(source) = source else {
            return Ok(None);
        };
        let Some(mut value) = self.codec.decode::<T>(source)? else {
            return Ok(None);
        };

        match self.policy.inspect(&mut value) {
            Verdict::Accepted => Ok(Some(value)),
            Verdict::Rejected(rejection) => {
                tracing::debug!(
                    type_name = %rejection.type_name,
                    field = %rejection.field,
                    reason = %rejection.reason,
                    "discarding decoded value"
                );
                Ok(None)
            }
        }
    }

    /// Decode and filter a byte slice.
    pub fn decode_slice<T>(&self, source: &[u8]) -> Result<Option<T>, C::Error>
    where
        T: DeserializeOwned + Defend,
    {
        self.decode(Some(source))
    }

    /// Decode and filter a string.
    pub fn decode_str<T>(&self, source: &str) -> Result<Option<T>, C::Error>
    where
        T: DeserializeOwned + Defend,
    {
        self.decode(Some(source.as_bytes()))
    }

    /// Encode a value. An absent value produces no output (`Ok(None)`).
    pub fn encode<T>(&self, value: Option<&T>) -> Result<Option<Vec<u8>>, C::Error>
    where
        T: Serialize + ?Sized,
    {
        value.map(|value| self.codec.encode(value)).transpose()
    }
}
