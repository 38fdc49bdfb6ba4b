//! Change set deployment with live progress

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cfn::client::{ClientError, StackClient};
use crate::cfn::models::{ChangeSetRequest, StackConfiguration};
use crate::deploy::builder::TreeBuilder;
use crate::deploy::group::TaskGroup;
use crate::deploy::reasons::ErrorReasonAggregator;
use crate::errors::DeployError;
use crate::render::driver;
use crate::render::sink::ProgressSink;
use crate::settings::Settings;

/// Deployment options
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// How long a stack may stay in progress before the deployment is abandoned
    pub stack_timeout: Duration,

    /// Delay between two event fetches of one stack
    pub poll_interval: Duration,

    /// Delay between two renderings
    pub refresh_interval: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            stack_timeout: Duration::from_secs(90 * 60),
            poll_interval: Duration::from_secs(3),
            refresh_interval: Duration::from_millis(125),
        }
    }
}

impl From<&Settings> for DeployOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            stack_timeout: settings.stack_timeout(),
            poll_interval: settings.poll_interval(),
            refresh_interval: settings.refresh_interval(),
        }
    }
}

/// Deploys stacks through change sets
pub struct Deployer {
    client: Arc<dyn StackClient>,
    options: DeployOptions,
    reasons: ErrorReasonAggregator,
}

impl Deployer {
    pub fn new(client: Arc<dyn StackClient>, options: DeployOptions) -> Self {
        Self {
            reasons: ErrorReasonAggregator::new(client.clone()),
            client,
            options,
        }
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Deploy `config` and render its progress to `sink`.
    pub async fn deploy<S: ProgressSink>(
        &self,
        config: &StackConfiguration,
        sink: S,
    ) -> Result<(), DeployError> {
        self.deploy_with_cancel(config, sink, CancellationToken::new())
            .await
    }

    /// Like [`Deployer::deploy`], stopping early when `cancel` fires.
    pub async fn deploy_with_cancel<S: ProgressSink>(
        &self,
        config: &StackConfiguration,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<(), DeployError> {
        info!("Deploying stack: {}", config.name);

        let Some(change_set_id) = self.create_change_set(config).await? else {
            return Ok(());
        };

        let cancel = cancel.child_token();
        let group = TaskGroup::new(cancel.clone(), self.options.stack_timeout);

        let builder = TreeBuilder::new(
            self.client.clone(),
            group.handle(),
            self.options.poll_interval,
        );
        let root = bounded(
            &cancel,
            group.deadline(),
            group.timeout(),
            builder.stack_node(&change_set_id, &config.name, config.description()),
        )
        .await?;

        group.handle().spawn(driver::render(
            root,
            sink,
            builder,
            self.options.refresh_interval,
            cancel,
        ));
        if let Err(e) = group.wait().await {
            error!("Deployment of stack {} stopped: {}", config.name, e);
            return Err(e);
        }

        self.err_on_failed_stack(&config.name).await
    }

    /// Delete a stack. A stack that does not exist is already deleted.
    pub async fn delete(&self, stack_name: &str) -> Result<(), DeployError> {
        match self.client.delete_stack(stack_name).await {
            Ok(()) => {
                info!("Deleted stack: {}", stack_name);
                Ok(())
            }
            Err(ClientError::StackNotFound(_)) => {
                info!("Stack {} does not exist, nothing to delete", stack_name);
                Ok(())
            }
            Err(e) => Err(DeployError::lookup(format!("delete stack {}", stack_name), e)),
        }
    }

    /// Create and execute a change set. `None` when the stack already exists as requested.
    async fn create_change_set(
        &self,
        config: &StackConfiguration,
    ) -> Result<Option<String>, DeployError> {
        let request = ChangeSetRequest::new(config.clone());
        let change_set_id = match self.client.create_change_set(&request).await {
            Ok(id) => id,
            Err(ClientError::StackAlreadyExists(name)) => {
                info!("Stack {} already exists, nothing to deploy", name);
                return Ok(None);
            }
            Err(e) => {
                return Err(DeployError::ChangeSetCreation {
                    stack_name: config.name.clone(),
                    source: e,
                })
            }
        };
        info!(
            "Created change set {} for stack {}",
            request.change_set_name, config.name
        );

        self.client
            .execute_change_set(&change_set_id, &config.name)
            .await
            .map_err(|e| DeployError::ChangeSetCreation {
                stack_name: config.name.clone(),
                source: e,
            })?;
        Ok(Some(change_set_id))
    }

    async fn err_on_failed_stack(&self, stack_name: &str) -> Result<(), DeployError> {
        let stack = self
            .client
            .describe_stack(stack_name)
            .await
            .map_err(|e| DeployError::lookup(format!("describe stack {}", stack_name), e))?;
        if !stack.status.failure() {
            info!("Stack {} deployed with status {}", stack_name, stack.status);
            return Ok(());
        }

        let reasons = match self.reasons.collect_failure_reasons(stack_name).await {
            Ok(reasons) => reasons,
            Err(e) => {
                warn!("Unable to collect failure reasons of stack {}: {}", stack_name, e);
                Vec::new()
            }
        };
        Err(DeployError::StackFailed {
            stack_name: stack_name.to_string(),
            status: stack.status,
            reasons,
        })
    }
}

/// Runs tree construction under the same cancellation token and deadline as the group.
async fn bounded<T>(
    cancel: &CancellationToken,
    deadline: Instant,
    timeout: Duration,
    fut: impl Future<Output = Result<T, DeployError>>,
) -> Result<T, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(DeployError::DeploymentTimeout(timeout)),
        result = fut => result,
    }
}
