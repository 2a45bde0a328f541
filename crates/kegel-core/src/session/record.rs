use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::timer::ExerciseProtocol;

/// Opaque unique session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finished exercise run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSession {
    pub id: SessionId,
    /// `None` for a run recorded without a signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub date: DateTime<Utc>,
    pub repetitions: u32,
    pub contraction_duration: u32,
    pub relaxation_duration: u32,
    /// Seconds; older records may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
}

impl ExerciseSession {
    pub fn new(
        user_id: Option<UserId>,
        repetitions: u32,
        contraction_duration: u32,
        relaxation_duration: u32,
        date: DateTime<Utc>,
    ) -> Self {
        let total = (u64::from(contraction_duration) + u64::from(relaxation_duration))
            .saturating_mul(u64::from(repetitions));
        Self {
            id: SessionId::generate(),
            user_id,
            date,
            repetitions,
            contraction_duration,
            relaxation_duration,
            total_duration: Some(total),
        }
    }

    pub fn from_protocol(
        user_id: Option<UserId>,
        protocol: &ExerciseProtocol,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            protocol.repetitions(),
            protocol.contraction_secs(),
            protocol.relaxation_secs(),
            date,
        )
    }

    /// Stored total, or the one implied by the protocol fields.
    pub fn duration_secs(&self) -> u64 {
        self.total_duration.unwrap_or_else(|| {
            (u64::from(self.contraction_duration) + u64::from(self.relaxation_duration))
                .saturating_mul(u64::from(self.repetitions))
        })
    }

    /// `"<m>m <s>s"`, as shown in the history list.
    pub fn duration_label(&self) -> String {
        let secs = self.duration_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
