//! Stack Deployer Library
//!
//! Deploys stacks through change sets and streams the progress of every
//! resource, nested stacks included, to a progress sink.

pub mod cfn;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod render;
pub mod settings;
pub mod stream;

pub use cfn::client::{ClientError, StackClient};
pub use cfn::models::StackConfiguration;
pub use deploy::orchestrator::{DeployOptions, Deployer};
pub use errors::DeployError;
pub use render::sink::{LineSink, ProgressSink};
