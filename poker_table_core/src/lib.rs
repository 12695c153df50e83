//! # 共享牌桌核心逻辑库
//!
//! 这个 `core` crate 包含一张多人扑克牌桌的下注状态机：
//! 轮流行动、大小盲注、弃牌/跟注/加注的合法性校验，以及下注轮结束的判定。
//! 还定义了客户端-服务器通信消息。
//! 它不做任何 I/O，连接、广播和管理员鉴权都由上层（服务器）负责。
//! 牌力评估和摊牌不在范围内：赢家由管理员宣布，这里只负责分配奖池。

mod config;
mod coordinator;
mod error;
mod logic;
mod message;
mod roster;
mod state;

pub use config::*;

pub use coordinator::TableCoordinator;

pub use error::{ErrorKind, TableError};

pub use message::*;

pub use roster::{sanitize_name, PlayerRoster, MAX_NAME_LEN};

pub use state::*;
