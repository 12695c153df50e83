use crate::config::TableConfig;
use crate::roster::PlayerRoster;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 由传输层分配的、稳定且不透明的玩家标识
pub type PlayerHandle = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub handle: PlayerHandle,
    pub name: String,
    pub stack: u64,          // 剩余筹码
    pub in_hand: bool,       // 是否仍在争夺本局底池
    pub bet_this_round: u32, // 本轮已投入的筹码
    pub has_acted: bool,     // 自上次加注以来是否已经行动
}

impl Player {
    pub fn new(handle: PlayerHandle, name: String, stack: u32) -> Self {
        Self {
            handle,
            name,
            stack: u64::from(stack),
            in_hand: false,
            bet_this_round: 0,
            has_acted: false,
        }
    }

    /// 从筹码中扣除最多 `amount`，返回实际支付的数额（筹码不足时全下）
    pub(crate) fn commit(&mut self, amount: u32) -> u32 {
        // 不超过 amount，必然放得进 u32
        let pay = self.stack.min(u64::from(amount)) as u32;
        self.stack -= u64::from(pay);
        self.bet_this_round += pay;
        pay
    }

    #[cfg(test)]
    pub(crate) fn is_all_in(&self) -> bool {
        self.in_hand && self.stack == 0
    }
}

/// 当前一局的状态。所有索引都指向 roster 中的座位，`None` 表示“无”。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandState {
    pub in_progress: bool,
    pub dealer_index: Option<usize>,
    pub small_blind_index: Option<usize>,
    pub big_blind_index: Option<usize>,
    pub turn_index: Option<usize>,

    pub pot: u64,         // 总奖池，跨下注轮累积；多个满额筹码相加会超出 u32
    pub current_bet: u32, // 本轮所有人需要跟到的金额
    pub last_aggressor_index: Option<usize>,
    pub round_closed: bool,
}

impl HandState {
    /// 回到空闲状态。庄家位置保留，下一局继续轮换。
    pub(crate) fn clear(&mut self) {
        *self = HandState {
            dealer_index: self.dealer_index,
            ..HandState::default()
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Fold,            // 弃牌
    CheckOrCall,     // 过牌或跟注
    BetOrRaise(u32), // 下注或加注，金额为本轮下注后的总额
}

/// 整张牌桌的状态：配置、座位和当前一局。
///
/// 这是一个显式持有的上下文对象，由唯一的串行处理者拥有并修改。
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub config: TableConfig,
    pub roster: PlayerRoster,
    pub hand: HandState,
}

/// 广播给所有连接的公开状态，这个游戏里没有需要隐藏的信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub config: TableConfig,
    pub hand: HandState,
    pub players: Vec<Player>,
}

impl Table {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            roster: PlayerRoster::default(),
            hand: HandState::default(),
        }
    }

    pub fn view(&self) -> TableView {
        TableView {
            config: self.config,
            hand: self.hand.clone(),
            players: self.roster.iter().cloned().collect(),
        }
    }

    /// 所有筹码加上奖池。只有结算会把奖池转回筹码，所以每个动作前后此值不变。
    #[cfg(test)]
    pub(crate) fn chips_in_play(&self) -> u64 {
        self.roster.iter().map(|p| p.stack).sum::<u64>() + self.hand.pot
    }
}

impl TableView {
    pub fn player(&self, handle: &PlayerHandle) -> Option<&Player> {
        self.players.iter().find(|p| &p.handle == handle)
    }

    /// 获取当前行动的玩家 (如果存在)
    pub fn current_player(&self) -> Option<&Player> {
        self.hand.turn_index.and_then(|idx| self.players.get(idx))
    }
}
