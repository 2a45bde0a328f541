//! Built-in exercise catalog.

use serde::Serialize;

use crate::error::ValidationError;
use crate::progress::SkillLevel;
use crate::timer::ExerciseProtocol;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Contraction seconds.
    pub duration: u32,
    pub repetitions: u32,
    /// Relaxation seconds between contractions.
    pub rest_time: u32,
    pub level: SkillLevel,
    pub category: &'static str,
}

impl Exercise {
    pub fn protocol(&self) -> Result<ExerciseProtocol, ValidationError> {
        ExerciseProtocol::new(self.duration, self.rest_time, self.repetitions)
    }
}

pub const CATALOG: &[Exercise] = &[
    Exercise {
        id: "1",
        name: "Basic Contraction",
        description: "Squeeze the pelvic floor muscles, then relax for the same length of time.",
        duration: 10,
        repetitions: 10,
        rest_time: 10,
        level: SkillLevel::Beginner,
        category: "Basic",
    },
    Exercise {
        id: "2",
        name: "Long Hold",
        description: "Hold the contraction while breathing normally throughout.",
        duration: 15,
        repetitions: 8,
        rest_time: 15,
        level: SkillLevel::Intermediate,
        category: "Intermediate",
    },
    Exercise {
        id: "3",
        name: "Quick Flicks",
        description: "Rapid contractions followed by an equally quick release.",
        duration: 20,
        repetitions: 15,
        rest_time: 10,
        level: SkillLevel::Advanced,
        category: "Advanced",
    },
    Exercise {
        id: "4",
        name: "Elevator",
        description: "Tighten gradually, as if riding an elevator up floor by floor.",
        duration: 25,
        repetitions: 6,
        rest_time: 20,
        level: SkillLevel::Advanced,
        category: "Advanced",
    },
    Exercise {
        id: "5",
        name: "Slow Squeeze",
        description: "Contract slowly and hold before letting go.",
        duration: 12,
        repetitions: 10,
        rest_time: 12,
        level: SkillLevel::Intermediate,
        category: "Intermediate",
    },
];

pub fn by_id(id: &str) -> Option<&'static Exercise> {
    CATALOG.iter().find(|e| e.id == id)
}

pub fn by_level(level: SkillLevel) -> impl Iterator<Item = &'static Exercise> {
    CATALOG.iter().filter(move |e| e.level == level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_protocols_are_valid() {
        for e in CATALOG {
            assert!(e.protocol().is_ok(), "{} invalid", e.id);
        }
    }

    #[test]
    fn lookup_by_id_and_level() {
        assert_eq!(by_id("4").map(|e| e.name), Some("Elevator"));
        assert!(by_id("99").is_none());
        assert_eq!(by_level(SkillLevel::Beginner).count(), 1);
        assert_eq!(by_level(SkillLevel::Advanced).count(), 2);
    }
}
