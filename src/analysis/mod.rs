pub mod analyzer;
pub mod angle;
pub mod faults;
pub mod features;
pub mod gate;
pub mod phase;
pub mod scoring;
pub mod summary;
pub mod view;
pub mod visibility;

pub use analyzer::{FrameAnalysis, SquatAnalyzer};
pub use angle::calculate_angle;
pub use faults::FaultFlags;
pub use gate::HysteresisGate;
pub use phase::{AnalyzerState, Phase, PhaseEvent, RepAccumulator};
pub use scoring::{Deduction, Fault, RepResult};
pub use summary::SessionSummary;
pub use view::{ActiveSide, View, ViewState};
