//! UseCase: ルームワーカー
//!
//! 1 ルームにつき 1 タスクが RoomCoordinator を所有し、
//! コマンドキューと tick タイマーを `tokio::select!` で待ち受けます。
//! ルームの状態を変更できるのはこのタスクだけなので、ロックは不要です。
//!
//! タイマーは接続がある間（Active）だけ動き、最後の接続が切れると破棄されます。
//! 送信口（RoomHandle）がすべて破棄されると、キューを処理し終えてタスクも終了します。

use std::{future, time::Duration};

use huddle_shared::time::now_utc;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, Interval, MissedTickBehavior},
};

use crate::{
    config::MAX_TICK_SECONDS,
    domain::{ConnectionId, RoomKey, RoomState},
    infrastructure::session::Outbox,
};

use super::{
    authorize_event::AuthorizedEvent, error::PipelineError, room_coordinator::RoomCoordinator,
};

/// ルームワーカーへの指示
pub enum RoomCommand {
    Attach {
        connection: ConnectionId,
        outbox: Outbox,
    },
    Event {
        connection: ConnectionId,
        event: AuthorizedEvent,
    },
    Detach {
        connection: ConnectionId,
    },
    Snapshot {
        reply: oneshot::Sender<RoomState>,
    },
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attach { connection, .. } => f
                .debug_struct("Attach")
                .field("connection", connection)
                .finish_non_exhaustive(),
            Self::Event { connection, event } => f
                .debug_struct("Event")
                .field("connection", connection)
                .field("event", event)
                .finish(),
            Self::Detach { connection } => f
                .debug_struct("Detach")
                .field("connection", connection)
                .finish(),
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

/// ワーカーが既に停止している
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("room worker has stopped")]
pub struct RoomClosed;

/// ルームワーカーへの送信口
#[derive(Debug, Clone)]
pub struct RoomHandle {
    key: RoomKey,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub async fn attach(&self, connection: ConnectionId, outbox: Outbox) -> Result<(), RoomClosed> {
        self.send(RoomCommand::Attach { connection, outbox }).await
    }

    /// 認可済みイベントをキューに積む（キューが満杯なら空くまで待つ）
    pub async fn submit(
        &self,
        connection: ConnectionId,
        event: AuthorizedEvent,
    ) -> Result<(), RoomClosed> {
        self.send(RoomCommand::Event { connection, event }).await
    }

    pub async fn detach(&self, connection: ConnectionId) -> Result<(), RoomClosed> {
        self.send(RoomCommand::Detach { connection }).await
    }

    /// 現在のルーム状態を取得
    pub async fn snapshot(&self) -> Result<RoomState, RoomClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomClosed)
    }

    /// ワーカーを生かし続けない参照
    pub fn downgrade(&self) -> WeakRoomHandle {
        WeakRoomHandle {
            key: self.key.clone(),
            commands: self.commands.downgrade(),
        }
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomClosed> {
        self.commands.send(command).await.map_err(|_| RoomClosed)
    }
}

/// ワーカーの寿命に影響しない送信口
#[derive(Debug, Clone)]
pub struct WeakRoomHandle {
    key: RoomKey,
    commands: mpsc::WeakSender<RoomCommand>,
}

impl WeakRoomHandle {
    /// ワーカーがまだ受け付けていれば送信口を返す
    pub fn upgrade(&self) -> Option<RoomHandle> {
        self.commands.upgrade().map(|commands| RoomHandle {
            key: self.key.clone(),
            commands,
        })
    }
}

enum Step {
    Command(RoomCommand),
    Tick,
    Shutdown,
}

/// ルームワーカー
pub struct RoomWorker {
    coordinator: RoomCoordinator,
    commands: mpsc::Receiver<RoomCommand>,
    tick_period: Duration,
    ticker: Option<Interval>,
}

impl RoomWorker {
    /// ワーカータスクを起動し、送信口とタスクのハンドルを返す
    ///
    /// tick 間隔とキュー容量はルーム設定から読む。
    pub fn spawn(coordinator: RoomCoordinator) -> (RoomHandle, JoinHandle<()>) {
        let settings = coordinator.settings();
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let tick_period = settings
            .tick_period
            .clamp(Duration::from_millis(1), Duration::from_secs(MAX_TICK_SECONDS));
        let key = coordinator.key().clone();
        let worker = Self {
            coordinator,
            commands: rx,
            tick_period,
            ticker: None,
        };
        let task = tokio::spawn(worker.run());
        (RoomHandle { key, commands: tx }, task)
    }

    async fn run(mut self) {
        tracing::info!("Room worker for '{}' started", self.coordinator.key());
        loop {
            let step = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Shutdown,
                },
                _ = Self::next_tick(&mut self.ticker) => Step::Tick,
            };

            match step {
                Step::Command(command) => self.handle(command).await,
                Step::Tick => {
                    if let Err(e) = self.coordinator.tick(now_utc()).await {
                        tracing::error!(
                            "Tick of room '{}' failed: {}",
                            self.coordinator.key(),
                            e
                        );
                    }
                }
                Step::Shutdown => break,
            }
            self.sync_timer();
        }
        tracing::info!("Room worker for '{}' stopped", self.coordinator.key());
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Attach { connection, outbox } => {
                self.coordinator.attach(connection, outbox);
            }
            RoomCommand::Event { connection, event } => {
                match self.coordinator.handle_event(connection, event, now_utc()).await {
                    Ok(()) => {}
                    Err(PipelineError::Store(e)) => {
                        tracing::error!(
                            "Event from connection {} dropped, room '{}' could not be persisted: {}",
                            connection,
                            self.coordinator.key(),
                            e
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Event from connection {} rejected: {}", connection, e);
                    }
                }
            }
            RoomCommand::Detach { connection } => {
                self.coordinator.detach(connection, now_utc());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.coordinator.snapshot());
            }
        }
    }

    /// Idle ⇔ Active の遷移に合わせてタイマーを作成・破棄
    fn sync_timer(&mut self) {
        match (self.coordinator.is_active(), self.ticker.is_some()) {
            (true, false) => {
                let mut ticker =
                    time::interval_at(Instant::now() + self.tick_period, self.tick_period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                tracing::info!("Room '{}' is active, tick timer armed", self.coordinator.key());
            }
            (false, true) => {
                self.ticker = None;
                tracing::info!("Room '{}' is idle, tick timer dropped", self.coordinator.key());
            }
            _ => {}
        }
    }

    async fn next_tick(ticker: &mut Option<Interval>) {
        match ticker {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}
