// Gameplay tuning, kept separate from runtime/server configuration.

pub mod arc;
pub mod battery;
pub mod cone;
pub mod puzzle;
pub mod shooter;

pub use arc::ArcTuning;
pub use battery::BatteryTuning;
pub use cone::ConeTuning;
pub use puzzle::{DeflectorTuning, OwnershipTuning, PuzzleTuning};
pub use shooter::ShooterTuning;

/// Every tuning table the world needs, bundled for construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldTuning {
    pub arc: ArcTuning,
    pub cone: ConeTuning,
    pub shooter: ShooterTuning,
    pub battery: BatteryTuning,
    pub puzzle: PuzzleTuning,
    pub deflector: DeflectorTuning,
    pub ownership: OwnershipTuning,
}
