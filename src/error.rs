use glam::Vec2;

/// A parameter that would make the step meaningless (or divide by zero).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoParticles,
    SmoothingRadius(f32),
    TargetDensity(f32),
    DeltaTime(f32),
    CollisionDamping(f32),
    Bounds(Vec2),
    InteractionRadius(f32),
    BoxCollider { index: usize },
    CircleCollider { index: usize },
    LayoutMismatch { positions: usize, velocities: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoParticles => write!(f, "particle count must be positive"),
            ConfigError::SmoothingRadius(h) => {
                write!(f, "smoothing radius must be positive and finite, got {h}")
            }
            ConfigError::TargetDensity(rho) => {
                write!(f, "target density must be positive and finite, got {rho}")
            }
            ConfigError::DeltaTime(dt) => {
                write!(f, "time step must be non-negative and finite, got {dt}")
            }
            ConfigError::CollisionDamping(d) => {
                write!(f, "collision damping must lie in [0, 1], got {d}")
            }
            ConfigError::Bounds(b) => write!(f, "bounds half extent must be non-negative, got {b}"),
            ConfigError::InteractionRadius(r) => {
                write!(f, "interaction radius must be non-negative, got {r}")
            }
            ConfigError::BoxCollider { index } => {
                write!(f, "box collider {index} has a zero forward axis or negative size")
            }
            ConfigError::CircleCollider { index } => {
                write!(f, "circle collider {index} has a negative radius")
            }
            ConfigError::LayoutMismatch { positions, velocities } => write!(
                f,
                "initial layout has {positions} positions but {velocities} velocities"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Why a step (or a layout change) was refused. State is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    Configuration(ConfigError),
    Capacity { requested: usize, capacity: usize },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::Configuration(e) => write!(f, "invalid configuration: {e}"),
            SimError::Capacity { requested, capacity } => write!(
                f,
                "{requested} particles requested but buffers hold {capacity}"
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Configuration(e) => Some(e),
            SimError::Capacity { .. } => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Configuration(e)
    }
}
