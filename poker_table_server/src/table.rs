//! 牌桌任务：唯一持有并修改牌桌状态的地方。
//!
//! 所有连接把请求投递到同一个收件箱，牌桌任务按到达顺序逐个处理，
//! 每个请求都同步执行完毕后才处理下一个，因此牌桌状态本身不需要锁。
//! 处理结果通过各连接的发送通道推送出去，推送使用 `try_send`，
//! 慢速客户端不会阻塞牌桌。
//!
//! 连接表也只由牌桌任务修改：连接在 `Connected` 时注册、`Disconnected` 时注销，
//! 所以新连接一定先收到 `Welcome`，之后才会收到广播。

use std::collections::HashMap;

use poker_table_core::{ClientMessage, PlayerHandle, ServerMessage, TableConfig, TableCoordinator, TableView};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::is_admin_name;

const INBOX_CAPACITY: usize = 100;

/// 每个连接的发送通道
pub type Outbox = mpsc::Sender<ServerMessage>;

#[derive(Debug)]
pub enum TableCommand {
    /// 新连接：登记发送通道，并发送它的标识和当前状态
    Connected { handle: PlayerHandle, outbox: Outbox },
    Request { handle: PlayerHandle, msg: ClientMessage },
    /// 连接已断开：注销发送通道，若仍在座则按离座处理
    Disconnected { handle: PlayerHandle },
}

#[derive(Debug, Error)]
#[error("牌桌任务已停止")]
pub struct TableClosed;

/// 向牌桌任务投递请求的句柄
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableCommand>,
}

impl TableHandle {
    pub async fn send(&self, command: TableCommand) -> Result<(), TableClosed> {
        self.sender.send(command).await.map_err(|_| TableClosed)
    }
}

pub struct TableActor {
    coordinator: TableCoordinator,
    admin_name: String,
    connections: HashMap<PlayerHandle, Outbox>,
    inbox: mpsc::Receiver<TableCommand>,
}

impl TableActor {
    pub fn new(config: TableConfig, admin_name: String) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self {
            coordinator: TableCoordinator::new(config),
            admin_name,
            connections: HashMap::new(),
            inbox,
        };
        (actor, TableHandle { sender })
    }

    /// 运行直到所有 `TableHandle` 都被丢弃
    pub async fn run(mut self) {
        info!("牌桌已就绪，配置: {:?}", self.coordinator.table().config);
        while let Some(command) = self.inbox.recv().await {
            self.handle_command(command);
        }
        info!("牌桌任务退出");
    }

    fn handle_command(&mut self, command: TableCommand) {
        match command {
            TableCommand::Connected { handle, outbox } => {
                self.connections.insert(handle, outbox);
                let welcome = ServerMessage::Welcome {
                    your_handle: handle,
                    snapshot: self.coordinator.snapshot(),
                };
                self.send_to(&handle, welcome);
            }
            TableCommand::Request { handle, msg } => {
                debug!("收到 {} 的请求: {:?}", handle, msg);
                let is_admin = self.is_admin(&handle);
                match self.coordinator.handle(handle, is_admin, msg) {
                    Ok(view) => self.broadcast(view),
                    Err(e) => self.send_to(&handle, ServerMessage::Error { message: e.to_string() }),
                }
            }
            TableCommand::Disconnected { handle } => {
                self.connections.remove(&handle);
                if let Some(view) = self.coordinator.disconnect(&handle) {
                    self.broadcast(view);
                }
            }
        }
    }

    /// 管理员鉴权策略：入座名字与配置的管理员名字相同
    fn is_admin(&self, handle: &PlayerHandle) -> bool {
        self.coordinator
            .player(handle)
            .is_some_and(|p| is_admin_name(&self.admin_name, &p.name))
    }

    fn send_to(&self, handle: &PlayerHandle, msg: ServerMessage) {
        let Some(outbox) = self.connections.get(handle) else {
            debug!("连接 {} 已不存在，丢弃消息", handle);
            return;
        };
        if outbox.try_send(msg).is_err() {
            warn!("向 {} 发送消息失败（通道已满或已断开）", handle);
        }
    }

    /// 向所有连接广播最新状态
    fn broadcast(&self, view: TableView) {
        let msg = ServerMessage::TableSnapshot(view);
        for (handle, outbox) in &self.connections {
            if outbox.try_send(msg.clone()).is_err() {
                warn!("向 {} 广播失败（通道已满或已断开）", handle);
            }
        }
    }
}
