pub mod chemical;

pub use chemical::{ChemicalRecord, HazardTier};
