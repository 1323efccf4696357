//! Survey analyzers for flow logic and scoring setup.

pub mod bands;
pub mod categories;
pub mod conflicts;
pub mod cycles;
pub mod reachability;
pub mod shape;
pub mod weights;

// Re-export analyzer types for convenience
pub use bands::Analyzer as BandAnalyzer;
pub use categories::Analyzer as CategoryAnalyzer;
pub use conflicts::Analyzer as ConflictAnalyzer;
pub use cycles::Analyzer as CycleAnalyzer;
pub use reachability::Analyzer as ReachabilityAnalyzer;
pub use shape::Analyzer as ShapeAnalyzer;
pub use weights::Analyzer as WeightAnalyzer;
