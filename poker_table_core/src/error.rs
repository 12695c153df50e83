use thiserror::Error;

/// 错误的大类，便于上层决定如何记录日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 输入本身不合法（名字、数值）
    Validation,
    /// 非管理员尝试执行管理操作
    Authorization,
    /// 当前牌桌状态下不允许此操作
    State,
    /// 违反下注规则
    Rule,
}

/// 牌桌上所有可恢复的错误。
///
/// 任何返回 `Err` 的操作都不会修改牌桌状态，错误只会回送给发起者。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    // --- Validation ---
    #[error("名字无效")]
    InvalidName,
    #[error("名字 {0} 已经在牌桌上了")]
    DuplicateName(String),
    #[error("配置无效（所有数值必须 > 0）")]
    InvalidConfig,
    #[error("金额无效")]
    InvalidAmount,

    // --- Authorization ---
    #[error("只有管理员可以执行此操作")]
    NotAuthorized,

    // --- State ---
    #[error("你不在牌桌上")]
    NotSeated,
    #[error("你已经在牌桌上了")]
    AlreadySeated,
    #[error("没有正在进行的牌局")]
    NoActiveHand,
    #[error("还没轮到你")]
    NotYourTurn,
    #[error("你已经弃牌了")]
    AlreadyFolded,
    #[error("已经有一局正在进行")]
    HandInProgress,
    #[error("至少需要 2 名玩家")]
    InsufficientPlayers,
    #[error("赢家无效")]
    InvalidWinner,
    #[error("本轮下注尚未结束")]
    RoundStillOpen,
    #[error("本局胜负已分，请直接结算")]
    HandDecided,

    // --- Rule ---
    #[error("下注/加注总额至少为 {minimum}")]
    BetTooSmall { minimum: u32 },
    #[error("超过单次加注上限 ({limit})")]
    BetLimitExceeded { limit: u32 },
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        use TableError::*;
        match self {
            InvalidName | DuplicateName(_) | InvalidConfig | InvalidAmount => ErrorKind::Validation,
            NotAuthorized => ErrorKind::Authorization,
            NotSeated | AlreadySeated | NoActiveHand | NotYourTurn | AlreadyFolded
            | HandInProgress | InsufficientPlayers | InvalidWinner | RoundStillOpen
            | HandDecided => ErrorKind::State,
            BetTooSmall { .. } | BetLimitExceeded { .. } => ErrorKind::Rule,
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
