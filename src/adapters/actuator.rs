use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::model::ServoCommand;
use crate::domain::ports::ActuatorLink;
use crate::utils::error::Result;

/// HTTP bridge to the arm controller.
///
/// One POST per command with a fixed short timeout; no retry, no
/// queueing. The relay treats every failure here as non-fatal.
#[derive(Debug, Clone)]
pub struct HttpActuator {
    client: Client,
    endpoint: String,
}

impl HttpActuator {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ActuatorLink for HttpActuator {
    async fn push_angles(&self, command: &ServoCommand) -> Result<()> {
        let response = self.client.post(&self.endpoint).json(command).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}
