//! Simulation engine error types

use thiserror::Error;
use uav_domain::DomainError;

/// Simulation engine errors
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Population full: store already holds the maximum of {max} UAVs")]
    PopulationFull { max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot of {snapshot} UAVs does not fit subscriber buffer of {capacity}")]
    SnapshotOverflow { snapshot: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;
