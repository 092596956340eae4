//! WebSocket front end: one task per game connection, all sharing one agent.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::agent::SharedAgent;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::TrainingScheduler;
use crate::session::{Outcome, Session};
use crate::telemetry::Command;

pub struct Server {
    listener: TcpListener,
    agent: SharedAgent,
    scheduler: Arc<TrainingScheduler>,
    restart_delay: Duration,
}

impl Server {
    pub async fn bind(config: &Config, agent: SharedAgent) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        let scheduler = TrainingScheduler::new(agent.clone(), config.training_interval, config.batch_size)?;

        Ok(Self {
            listener,
            agent,
            scheduler: Arc::new(scheduler),
            restart_delay: config.restart_delay(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process is stopped. Needs the
    /// multi-threaded runtime: sessions block on the agent lock in place.
    pub async fn run(self) -> Result<()> {
        info!("listening on ws://{}", self.local_addr()?);

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("accept failed: {}", err);
                    continue;
                }
            };

            let session = Session::new(self.agent.clone(), self.scheduler.clone());
            let restart_delay = self.restart_delay;
            tokio::spawn(async move {
                info!("game connected from {}", peer);
                match serve_connection(stream, session, restart_delay).await {
                    Ok(()) => info!("game at {} disconnected", peer),
                    Err(err) => error!("session with {} ended: {}", peer, err),
                }
            });
        }
    }
}

async fn serve_connection(stream: TcpStream, mut session: Session, restart_delay: Duration) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (mut writer, mut reader) = ws.split();

    while let Some(message) = reader.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("ignoring non-utf8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                let err = Error::from(err);
                if err.is_connection_closed() {
                    break;
                }
                return Err(err);
            }
        };

        // the agent lock can wait behind a whole replay
        let outcome = tokio::task::block_in_place(|| session.on_message(&text))?;
        let reply = match outcome {
            Outcome::Ignored => continue,
            Outcome::Act(action) => Command::from(action),
            Outcome::GameOver => {
                tokio::time::sleep(restart_delay).await;
                let sent = send(&mut writer, Command::RESTART).await;
                tokio::task::block_in_place(|| session.restart_episode());
                sent?;
                continue;
            }
        };

        send(&mut writer, reply).await?;
    }

    Ok(())
}

async fn send<S>(writer: &mut S, command: Command) -> Result<()>
where
    S: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    match writer.send(Message::Text(command.to_json()?)).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let err = Error::from(err);
            // a closed socket ends the session quietly on the next read
            if err.is_connection_closed() { Ok(()) } else { Err(err) }
        }
    }
}
