//! UseCase: ルーム状態の調停
//!
//! 1 ルームの PersonRegistry / MessageLog / SessionRegistry を所有し、
//! 認可済みイベントと定期 tick を「変更 → 永続化 → ブロードキャスト」の順で処理します。
//! インスタンスは RoomWorker だけが保持し、外部と参照を共有しません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - handle_event() / tick() / detach() の状態遷移とブロードキャスト内容
//!
//! ### なぜこのテストが必要か
//! - 永続化してからブロードキャストする順序を保証する
//! - 他人の identity の書き換えがルームに影響しないことを保証する
//! - 再接続で入室通知が重複しないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ハンドシェイク、メッセージ、タイトル変更、退室、tick による削除
//! - 異常系：認可エラー、永続化エラー
//! - モード：events / snapshot

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::{BroadcastMode, RoomSettings},
    domain::{
        ConnectionId, Message, MessageLog, Person, PersonRegistry, RoomKey, RoomState,
        StateStore, StoreError, SystemMessage, Timestamp,
    },
    infrastructure::{
        dto::websocket::OutboundEvent,
        session::{JoinOutcome, LeaveOutcome, Outbox, SessionRegistry},
    },
};

use super::{
    authorize_event::{AuthorizedEvent, EventPayload},
    error::PipelineError,
};

/// 1 イベントで変化した永続化対象
#[derive(Debug, Default, Clone, Copy)]
struct Changes {
    persons: bool,
    messages: bool,
}

impl Changes {
    fn any(&self) -> bool {
        self.persons || self.messages
    }
}

/// 状態への反映結果（セッションの束縛と通知は永続化の後）
#[derive(Debug)]
enum Applied {
    Handshake { person: Person, created: bool },
    Message(Message),
    Person { person: Person, changed: bool },
}

/// 永続化の後に送る通知
#[derive(Debug)]
enum Fanout {
    Persons,
    Message(Message),
    System(SystemMessage),
    Snapshot,
    /// 新しく識別された接続だけに現在の状態を送る
    Welcome {
        connection: ConnectionId,
        include_persons: bool,
    },
}

/// ルーム状態の調停役
pub struct RoomCoordinator {
    key: RoomKey,
    settings: RoomSettings,
    persons: PersonRegistry,
    messages: MessageLog,
    sessions: SessionRegistry,
    store: Arc<dyn StateStore>,
}

impl RoomCoordinator {
    /// 永続化済みスナップショットからルームを復元（無ければ空のルーム）
    pub async fn load(
        key: RoomKey,
        store: Arc<dyn StateStore>,
        settings: RoomSettings,
    ) -> Result<Self, StoreError> {
        let state = store.load(&key).await?.unwrap_or_default();
        tracing::info!(
            "Loaded room '{}' ({} persons, {} messages)",
            key,
            state.persons.len(),
            state.messages.len()
        );
        Ok(Self {
            key,
            settings,
            persons: PersonRegistry::from_persons(state.persons),
            messages: MessageLog::from_messages(state.messages),
            sessions: SessionRegistry::new(),
            store,
        })
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// 接続が 1 つでもあれば Active（tick が動く）
    pub fn is_active(&self) -> bool {
        !self.sessions.is_empty()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn persons(&self) -> &PersonRegistry {
        &self.persons
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// 永続化・スナップショット配信の単位
    pub fn snapshot(&self) -> RoomState {
        RoomState {
            persons: self.persons.list().to_vec(),
            messages: self.messages.list().to_vec(),
        }
    }

    /// アップグレード直後の接続を登録（まだ何も配信されない）
    pub fn attach(&mut self, connection: ConnectionId, outbox: Outbox) {
        self.sessions.attach(connection, outbox);
        tracing::debug!("Connection {} attached to room '{}'", connection, self.key);
    }

    /// 接続の終了を処理し、識別済みだった場合は退室を通知
    pub fn detach(&mut self, connection: ConnectionId, now: DateTime<Utc>) -> LeaveOutcome {
        let outcome = self.sessions.leave(connection);
        if let LeaveOutcome::Left(person) = &outcome {
            tracing::info!("'{}' left room '{}'", person.title, self.key);
            self.sessions
                .broadcast_system_message(&SystemMessage::quit(&person.title, Timestamp::new(now)));
        }
        outcome
    }

    /// 認可済みイベントを処理
    ///
    /// # Errors
    ///
    /// * `PipelineError::Authorization` - 他人の person レコードへの書き込み（状態は不変）
    /// * `PipelineError::Store` - 永続化失敗（状態は巻き戻され、セッションも束縛されない）
    pub async fn handle_event(
        &mut self,
        connection: ConnectionId,
        event: AuthorizedEvent,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let rollback = (self.persons.clone(), self.messages.clone());

        // 1. 期限切れメッセージを先に削除
        let mut changes = Changes {
            messages: self.evict(now) > 0,
            ..Changes::default()
        };

        // 2. 状態を変更（認可エラーならこのイベントによる変更は無い）
        let applied = self.apply(event, now, &mut changes);

        // 3. 変更があれば永続化してから
        if changes.any() {
            if let Err(e) = self.persist().await {
                (self.persons, self.messages) = rollback;
                return Err(e.into());
            }
        }

        // 4. セッションを束縛してブロードキャスト
        let fanouts = self.settle(connection, applied?, now);
        self.fan_out(fanouts);
        Ok(())
    }

    /// 定期 tick：期限切れメッセージの削除と、snapshot モードでの全体再配信
    ///
    /// # Returns
    ///
    /// 削除したメッセージ数
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let rollback = self.messages.clone();
        let removed = self.evict(now);
        if removed > 0 {
            if let Err(e) = self.persist().await {
                self.messages = rollback;
                return Err(e);
            }
        }
        if self.settings.mode == BroadcastMode::Snapshot {
            self.sessions.broadcast_snapshot(&self.snapshot());
        }
        Ok(removed)
    }

    fn apply(
        &mut self,
        event: AuthorizedEvent,
        now: DateTime<Utc>,
        changes: &mut Changes,
    ) -> Result<Applied, PipelineError> {
        let AuthorizedEvent { signer, payload } = event;
        match payload {
            EventPayload::Handshake => {
                let (person, created) = self.persons.handshake(&signer);
                changes.persons |= created;
                Ok(Applied::Handshake { person, created })
            }
            EventPayload::Message(body) => {
                let message = Message::new(signer, body, Timestamp::new(now));
                tracing::debug!(
                    "Message from '{}' appended to room '{}'",
                    message.identity,
                    self.key
                );
                self.messages.append(message.clone());
                changes.messages = true;
                Ok(Applied::Message(message))
            }
            EventPayload::Person(payload) => {
                let title = self.persons.resolve_title(&payload.identity, payload.title);
                let person = Person::new(payload.identity, title);
                let changed = self.persons.upsert(person.clone(), &signer)?;
                changes.persons |= changed;
                Ok(Applied::Person { person, changed })
            }
        }
    }

    /// 永続化済みの変更に対してセッションを束縛し、送るべき通知を決める
    fn settle(
        &mut self,
        connection: ConnectionId,
        applied: Applied,
        now: DateTime<Utc>,
    ) -> Vec<Fanout> {
        let snapshot_mode = self.settings.mode == BroadcastMode::Snapshot;
        let mut fanouts = Vec::new();

        match applied {
            Applied::Handshake { person, created } => {
                let outcome = self.join(person, connection, now, &mut fanouts);
                if snapshot_mode {
                    fanouts.push(Fanout::Snapshot);
                } else {
                    if created {
                        fanouts.push(Fanout::Persons);
                    }
                    if outcome != JoinOutcome::Detached {
                        fanouts.push(Fanout::Welcome {
                            connection,
                            include_persons: !created,
                        });
                    }
                }
            }
            Applied::Message(message) => {
                fanouts.push(if snapshot_mode {
                    Fanout::Snapshot
                } else {
                    Fanout::Message(message)
                });
            }
            Applied::Person { person, changed } => {
                let outcome = self.join(person, connection, now, &mut fanouts);
                if changed || outcome == JoinOutcome::Joined {
                    fanouts.push(if snapshot_mode {
                        Fanout::Snapshot
                    } else {
                        Fanout::Persons
                    });
                }
            }
        }
        fanouts
    }

    fn join(
        &mut self,
        person: Person,
        connection: ConnectionId,
        now: DateTime<Utc>,
        fanouts: &mut Vec<Fanout>,
    ) -> JoinOutcome {
        let title = person.title.clone();
        let outcome = self.sessions.join(person, connection);
        match outcome {
            JoinOutcome::Joined => {
                tracing::info!("'{}' joined room '{}'", title, self.key);
                fanouts.push(Fanout::System(SystemMessage::joined(
                    &title,
                    Timestamp::new(now),
                )));
            }
            JoinOutcome::Detached => {
                tracing::debug!(
                    "Connection {} closed before its event was applied",
                    connection
                );
            }
            JoinOutcome::Reconnected | JoinOutcome::Refreshed => {}
        }
        outcome
    }

    fn fan_out(&self, fanouts: Vec<Fanout>) {
        for fanout in fanouts {
            match fanout {
                Fanout::Persons => {
                    self.sessions.broadcast_persons(self.persons.list());
                }
                Fanout::Message(message) => {
                    self.sessions.broadcast_message(&message);
                }
                Fanout::System(notice) => {
                    self.sessions.broadcast_system_message(&notice);
                }
                Fanout::Snapshot => {
                    self.sessions.broadcast_snapshot(&self.snapshot());
                }
                Fanout::Welcome {
                    connection,
                    include_persons,
                } => {
                    if include_persons {
                        self.sessions
                            .send_to(connection, &OutboundEvent::persons(self.persons.list()));
                    }
                    for message in self.messages.list() {
                        self.sessions
                            .send_to(connection, &OutboundEvent::message(message));
                    }
                }
            }
        }
    }

    fn evict(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.messages.evict_expired(now, self.settings.dissolve);
        if removed > 0 {
            tracing::debug!("Evicted {} expired messages from room '{}'", removed, self.key);
        }
        removed
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.store
            .save(&self.key, &self.snapshot())
            .await
            .inspect_err(|e| tracing::error!("Failed to persist room '{}': {}", self.key, e))
    }
}
