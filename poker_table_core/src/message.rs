use crate::state::{PlayerAction, PlayerHandle, TableView};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 金额字段保留客户端发送的原始数值，由协调器负责校验和取整。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    // --- 座位管理 ---
    /// 以给定名字入座
    Join { name: String },
    /// 离开牌桌
    Leave,

    // --- 管理员指令 ---
    SetConfig { bet_limit: f64, initial_stack: f64, small_blind: f64 },
    ResetTable,
    StartHand,
    /// 宣布赢家并把奖池判给他
    EndHandAward { winner: PlayerHandle },
    /// 本轮下注结束后开启下一轮
    NextRound,

    // --- 玩家动作 ---
    Fold,
    CheckOrCall,
    /// 下注或加注，金额为本轮下注后的总额
    BetOrRaise { target_total: f64 },
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 连接建立后私密地发给该连接
    Welcome {
        your_handle: PlayerHandle,
        snapshot: TableView,
    },
    /// 每个被接受的请求之后广播给所有人
    TableSnapshot(TableView),
    /// 只发给出错的请求者
    Error { message: String },
}

impl ClientMessage {
    /// 需要管理员权限的指令
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ClientMessage::SetConfig { .. }
                | ClientMessage::ResetTable
                | ClientMessage::StartHand
                | ClientMessage::EndHandAward { .. }
                | ClientMessage::NextRound
        )
    }
}

impl From<PlayerAction> for ClientMessage {
    fn from(action: PlayerAction) -> Self {
        match action {
            PlayerAction::Fold => ClientMessage::Fold,
            PlayerAction::CheckOrCall => ClientMessage::CheckOrCall,
            PlayerAction::BetOrRaise(target) => ClientMessage::BetOrRaise { target_total: target as f64 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_json_shape() {
        let msg: ClientMessage = serde_json::from_str(r#"{"Join":{"name":"ana"}}"#).unwrap();
        assert_eq!(msg, ClientMessage::Join { name: "ana".into() });

        let msg: ClientMessage = serde_json::from_str(r#""CheckOrCall""#).unwrap();
        assert_eq!(msg, ClientMessage::CheckOrCall);

        let msg: ClientMessage = serde_json::from_str(r#"{"BetOrRaise":{"target_total":25}}"#).unwrap();
        assert_eq!(msg, ClientMessage::BetOrRaise { target_total: 25.0 });
    }

    #[test]
    fn test_requires_admin() {
        assert!(ClientMessage::StartHand.requires_admin());
        assert!(ClientMessage::NextRound.requires_admin());
        assert!(!ClientMessage::Fold.requires_admin());
        assert!(!ClientMessage::Join { name: "x".into() }.requires_admin());
    }
}
