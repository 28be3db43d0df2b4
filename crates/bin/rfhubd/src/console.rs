//! Line-oriented command console.
//!
//! ```text
//! > list
//! switch.lamp  off  Desk lamp
//! > switch.lamp turn_on
//! switch.lamp is on
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use rfhub_app::ports::{EventPublisher, Integration, IntegrationContext};
use rfhub_app::registry::InMemoryRegistry;
use rfhub_domain::error::HubError;

const HELP: &str = "commands: list | <entity_id> <turn_on|turn_off|toggle> | help";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Help,
    Call { entity_id: String, service: String },
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Usage`] when the line is not a known command.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let mut words = line.split_whitespace();
        let command = match (words.next(), words.next(), words.next()) {
            (None, _, _) => return Ok(None),
            (Some("list"), None, _) => Self::List,
            (Some("help"), None, _) => Self::Help,
            (Some(entity_id), Some(service), None) if entity_id.contains('.') => Self::Call {
                entity_id: entity_id.to_string(),
                service: service.to_string(),
            },
            _ => return Err(ConsoleError::Usage(line.trim().to_string())),
        };
        Ok(Some(command))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("unrecognised command {0:?}")]
    Usage(String),
    #[error("unknown entity {0}")]
    UnknownEntity(String),
    #[error("no integration is running")]
    NoIntegration,
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// Dispatches console commands to the integration and keeps the registry in
/// sync with the entity states it returns.
pub struct Console<'a, I, P> {
    integration: Option<&'a I>,
    registry: &'a InMemoryRegistry<P>,
}

impl<'a, I, P> Console<'a, I, P>
where
    I: Integration + Sync,
    P: EventPublisher + Send + Sync,
{
    #[must_use]
    pub fn new(integration: Option<&'a I>, registry: &'a InMemoryRegistry<P>) -> Self {
        Self {
            integration,
            registry,
        }
    }

    /// Run one command and return the reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsoleError`] when the command cannot be parsed or the
    /// service call fails.
    pub async fn execute(&self, command: Command) -> Result<String, ConsoleError> {
        match command {
            Command::Help => Ok(HELP.to_string()),
            Command::List => Ok(self
                .registry
                .entities()
                .iter()
                .map(|e| format!("{}  {}  {}", e.entity_id, e.state, e.friendly_name))
                .collect::<Vec<_>>()
                .join("\n")),
            Command::Call { entity_id, service } => {
                let integration = self.integration.ok_or(ConsoleError::NoIntegration)?;
                let entity = self
                    .registry
                    .find_entity(&entity_id)
                    .ok_or(ConsoleError::UnknownEntity(entity_id))?;
                let updated = integration
                    .handle_service_call(entity.id, &service, serde_json::json!({}))
                    .await?;
                let updated = self.registry.upsert_entity(updated).await?;
                Ok(format!("{} is {}", updated.entity_id, updated.state))
            }
        }
    }

    /// Read commands from `input` until EOF, writing one reply per command.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when reading or writing fails; command failures
    /// are reported on `output` and do not stop the loop.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let reply = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => self.execute(command).await,
                Err(err) => Err(err),
            };
            let reply = reply.unwrap_or_else(|err| {
                tracing::warn!(line = %line.trim(), error = %err, "command failed");
                format!("error: {}", describe(&err))
            });
            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(())
    }
}

/// `err` followed by its chain of causes.
fn describe(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
