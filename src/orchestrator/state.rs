//! Batch-level phases

use std::fmt;

/// `Idle → LockAcquired → Scanning → MigratingProjects → Aggregating → Validating →
/// Finalizing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SolutionPhase {
    Idle,
    LockAcquired,
    Scanning,
    MigratingProjects,
    Aggregating,
    Validating,
    Finalizing,
}

impl SolutionPhase {
    /// The phase after this one; `Finalizing` is last.
    pub fn next(self) -> Option<SolutionPhase> {
        match self {
            SolutionPhase::Idle => Some(SolutionPhase::LockAcquired),
            SolutionPhase::LockAcquired => Some(SolutionPhase::Scanning),
            SolutionPhase::Scanning => Some(SolutionPhase::MigratingProjects),
            SolutionPhase::MigratingProjects => Some(SolutionPhase::Aggregating),
            SolutionPhase::Aggregating => Some(SolutionPhase::Validating),
            SolutionPhase::Validating => Some(SolutionPhase::Finalizing),
            SolutionPhase::Finalizing => None,
        }
    }
}

impl fmt::Display for SolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolutionPhase::Idle => "idle",
            SolutionPhase::LockAcquired => "lock acquired",
            SolutionPhase::Scanning => "scanning",
            SolutionPhase::MigratingProjects => "migrating projects",
            SolutionPhase::Aggregating => "aggregating",
            SolutionPhase::Validating => "validating",
            SolutionPhase::Finalizing => "finalizing",
        };
        write!(f, "{}", name)
    }
}
