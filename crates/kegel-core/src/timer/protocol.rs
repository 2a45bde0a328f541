use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed shape of one exercise run: `repetitions` cycles of
/// `contraction_secs` contract followed by `relaxation_secs` relax.
///
/// Only obtainable through [`ExerciseProtocol::new`], `Default` or
/// deserialization, all of which validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProtocolFields")]
pub struct ExerciseProtocol {
    contraction_secs: u32,
    relaxation_secs: u32,
    repetitions: u32,
}

#[derive(Deserialize)]
struct ProtocolFields {
    contraction_secs: u32,
    relaxation_secs: u32,
    repetitions: u32,
}

impl TryFrom<ProtocolFields> for ExerciseProtocol {
    type Error = ValidationError;

    fn try_from(f: ProtocolFields) -> Result<Self, Self::Error> {
        Self::new(f.contraction_secs, f.relaxation_secs, f.repetitions)
    }
}

impl ExerciseProtocol {
    pub const DEFAULT_CONTRACTION_SECS: u32 = 5;
    pub const DEFAULT_RELAXATION_SECS: u32 = 5;
    pub const DEFAULT_REPETITIONS: u32 = 10;

    /// Build a validated protocol.
    ///
    /// # Errors
    /// Returns a validation error if either duration is zero or no
    /// repetitions are requested.
    pub fn new(
        contraction_secs: u32,
        relaxation_secs: u32,
        repetitions: u32,
    ) -> Result<Self, ValidationError> {
        let protocol = Self {
            contraction_secs,
            relaxation_secs,
            repetitions,
        };
        protocol.validate()?;
        Ok(protocol)
    }

    pub fn contraction_secs(&self) -> u32 {
        self.contraction_secs
    }

    pub fn relaxation_secs(&self) -> u32 {
        self.relaxation_secs
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Check the invariants of a protocol that may have come from config
    /// or deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.contraction_secs == 0 {
            return Err(invalid("contraction_secs", "must be greater than zero"));
        }
        if self.relaxation_secs == 0 {
            return Err(invalid("relaxation_secs", "must be greater than zero"));
        }
        if self.repetitions == 0 {
            return Err(invalid("repetitions", "must be at least 1"));
        }
        Ok(())
    }

    /// Seconds in one contract+relax cycle.
    pub fn cycle_secs(&self) -> u64 {
        u64::from(self.contraction_secs) + u64::from(self.relaxation_secs)
    }

    /// Total seconds of a full run.
    pub fn total_secs(&self) -> u64 {
        self.cycle_secs().saturating_mul(u64::from(self.repetitions))
    }
}

impl Default for ExerciseProtocol {
    fn default() -> Self {
        Self {
            contraction_secs: Self::DEFAULT_CONTRACTION_SECS,
            relaxation_secs: Self::DEFAULT_RELAXATION_SECS,
            repetitions: Self::DEFAULT_REPETITIONS,
        }
    }
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
