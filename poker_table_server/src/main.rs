mod config;
mod logging;
mod table;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{stream::StreamExt, SinkExt};
use pico_args::Arguments;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use poker_table_core::{ClientMessage, PlayerHandle, ServerMessage};

use crate::config::ServerConfig;
use crate::table::{TableActor, TableCommand, TableHandle};

const HELP: &str = "\
运行一张共享扑克牌桌的服务器

用法:
  poker_table_server [OPTIONS]

OPTIONS:
  --bind   IP:PORT   监听地址       [默认: 环境变量 TABLE_BIND 或 0.0.0.0:25917]
  --admin  NAME      管理员名字     [默认: 环境变量 TABLE_ADMIN 或 jolupa]
  -h, --help         显示帮助

环境变量:
  TABLE_BET_LIMIT      单次加注增量上限 [默认 50]
  TABLE_INITIAL_STACK  初始筹码         [默认 500]
  TABLE_SMALL_BLIND    小盲注           [默认 5]
  RUST_LOG             日志级别         [默认 info]
";

/// 每个连接的发送通道容量
const OUTBOX_CAPACITY: usize = 32;

// 服务器共享状态。牌桌状态和连接表都只在牌桌任务里，这里只有投递请求的句柄。
struct AppState {
    table: TableHandle,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    logging::init();
    let config = ServerConfig::from_env(pargs)?;

    let (actor, table) = TableActor::new(config.table, config.admin_name.clone());
    tokio::spawn(actor.run());

    let state = SharedState::new(AppState { table });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health))
        .with_state(state);

    info!("服务器正在监听 {}，管理员: {}", config.bind, config.admin_name);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    let handle: PlayerHandle = Uuid::new_v4();

    // 创建一个 MPSC 通道，牌桌任务通过它向这个连接推送消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 由牌桌任务登记发送通道，保证 Welcome 先于任何广播到达
    let connected = TableCommand::Connected { handle, outbox: tx.clone() };
    if state.table.send(connected).await.is_err() {
        warn!("牌桌任务已停止，关闭连接 {}", handle);
        return;
    }
    info!("连接 {} 已建立", handle);

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    let command = TableCommand::Request { handle, msg: client_msg };
                    if state.table.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("解析 {} 的消息失败: {}", handle, e);
                    let message = format!("无法解析消息: {}", e);
                    let _ = tx.send(ServerMessage::Error { message }).await;
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // 客户端断开连接，通知牌桌注销连接并按离座处理
    let _ = state.table.send(TableCommand::Disconnected { handle }).await;
    info!("连接 {} 已关闭", handle);
}
