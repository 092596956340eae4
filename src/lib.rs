pub mod sequential;

pub use sequential::tensor::Tensor;
pub use sequential::layer::{
    Layer,
    Dense,
    ReLU,
};
pub use sequential::loss::{
    Loss,
    MeanSquaredError
};
pub use sequential::optimizer::{
    Optimizer,
    Adam,
};
pub use sequential::Sequential;

pub mod agent;

pub use agent::{Agent, SharedAgent, STATE_SIZE, ACTION_SIZE};
pub use agent::qnetwork::QNetwork;
pub use agent::replaybuffer::{ReplayBuffer, Transition};

pub mod config;
pub mod error;
pub mod observation;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
pub use server::Server;
