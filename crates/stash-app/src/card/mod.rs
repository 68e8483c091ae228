//! Card activation: status signals, issuer strategies and the step builder.

pub mod issuer;
pub mod status;
pub mod steps;

pub use issuer::{strategy_for, BridgeIssuer, CardIssuerStrategy, RainIssuer};
pub use status::{ActivationSignals, CardIssuer, CardStatus, RainApplicationStatus};
pub use steps::{
    activation_progress, build_activation_steps, find_first_incomplete_step,
    is_activation_complete, CardActivationStep, StepAction, StepId, StepStatus,
};
