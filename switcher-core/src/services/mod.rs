//! 业务逻辑服务层

pub mod probe;
pub mod projector;
pub mod switcher;

pub use probe::{ModelStatus, ProbeService};
pub use projector::{EnvironmentSnapshot, ProjectionReport, ProjectorService};
pub use switcher::{SwitchOutcome, SwitchPrompt, SwitchService};
