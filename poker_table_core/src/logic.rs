use crate::error::{Result, TableError};
use crate::state::*;
use tracing::{debug, info, warn};

// --- 入座 / 离座 ---

impl Table {
    /// 新玩家入座，筹码为当前配置的初始筹码。进行中的牌局不受影响（新座位在末尾）。
    pub fn join(&mut self, handle: PlayerHandle, raw_name: &str) -> Result<&Player> {
        let stack = self.config.initial_stack;
        let player = self.roster.join(handle, raw_name, stack)?;
        info!("玩家 {} ({}) 入座", player.name, handle);
        Ok(player)
    }

    /// 玩家离座
    ///
    /// 若牌局进行中且该玩家仍在局中，先按弃牌处理再移除。
    /// 牌局中途少了一个座位后，基于索引的庄家/盲注/行动位都不再可靠，
    /// 所以只要牌局在进行就调用 `abandon_hand` 放弃本局。
    pub fn remove_player(&mut self, handle: &PlayerHandle) -> Result<Player> {
        let idx = self.roster.find_by_handle(handle).ok_or(TableError::NotSeated)?;

        if self.hand.in_progress && self.roster.get(idx).is_some_and(|p| p.in_hand) {
            self.fold(idx);
        }
        let player = self.roster.remove(idx);
        info!("玩家 {} ({}) 离座", player.name, player.handle);

        if self.hand.in_progress {
            self.abandon_hand();
        }
        if self.roster.is_empty() {
            self.hand.dealer_index = None;
        }
        Ok(player)
    }

    /// 牌局进行中座位发生变化时的处理策略：直接放弃本局。
    ///
    /// 奖池不会退还（没有记录每人整局的投入），返回被丢弃的奖池金额。
    pub fn abandon_hand(&mut self) -> u64 {
        let discarded = self.hand.pot;
        if self.hand.in_progress {
            warn!("座位变化，放弃当前牌局，奖池 {} 被丢弃", discarded);
        }
        self.reset_hand();
        discarded
    }

    /// 管理员重置：清空牌局、恢复所有人的初始筹码、重置庄家轮换
    pub fn reset_table(&mut self) {
        self.reset_hand();
        let stack = self.config.initial_stack;
        for p in self.roster.iter_mut() {
            p.stack = u64::from(stack);
        }
        self.hand.dealer_index = None;
        info!("牌桌已重置，每人筹码恢复为 {}", stack);
    }

    fn reset_hand(&mut self) {
        self.hand.clear();
        self.roster.reset_round_flags();
        for p in self.roster.iter_mut() {
            p.in_hand = false;
        }
    }
}

// --- 核心牌局流程 ---

impl Table {
    pub fn next_in_hand(&self, from: usize) -> Option<usize> {
        self.roster.next_in_hand(from)
    }

    /// 开始新的一局
    ///
    /// - 所有入座玩家参与本局（不支持离席）。
    /// - 庄家位置顺延一位。
    /// - 确定大小盲并下盲注，筹码不足时按全下处理。
    /// - 大盲之后的第一位玩家先行动。
    ///
    /// 只有两名玩家时庄家就是小盲，对手是大盲，庄家先行动。
    pub fn start_hand(&mut self) -> Result<()> {
        if self.hand.in_progress {
            return Err(TableError::HandInProgress);
        }
        let n = self.roster.len();
        if n < 2 {
            return Err(TableError::InsufficientPlayers);
        }

        // 1. 所有人入局
        for p in self.roster.iter_mut() {
            p.in_hand = true;
        }

        // 2. 轮换庄家
        let dealer = self.hand.dealer_index.map_or(0, |d| (d + 1) % n);

        // 3. 确定盲注位置
        let sb = if n == 2 { Some(dealer) } else { self.next_in_hand(dealer) };
        let bb = sb.and_then(|s| self.next_in_hand(s));

        // 4. 重置下注轮
        self.hand = HandState {
            in_progress: true,
            dealer_index: Some(dealer),
            small_blind_index: sb,
            big_blind_index: bb,
            ..HandState::default()
        };
        self.roster.reset_round_flags();

        // 5. 下盲注
        let small = self.config.small_blind;
        let big = self.config.big_blind();
        let sb_posted = sb.map_or(0, |i| self.post_blind(i, small));
        let bb_posted = bb.map_or(0, |i| self.post_blind(i, big));
        self.hand.current_bet = sb_posted.max(bb_posted);

        // 6. 第一个行动者
        self.hand.turn_index = bb.and_then(|b| self.next_in_hand(b));

        info!(
            "新的一局开始: 庄家={:?} 小盲={:?} 大盲={:?} 奖池={}",
            self.hand.dealer_index, sb, bb, self.hand.pot
        );
        Ok(())
    }

    fn post_blind(&mut self, idx: usize, amount: u32) -> u32 {
        let Some(player) = self.roster.get_mut(idx) else { return 0 };
        let paid = player.commit(amount);
        self.hand.pot += u64::from(paid);
        paid
    }

    /// 把整个奖池判给赢家并回到空闲状态，返回赢得的筹码。
    ///
    /// 这是清空奖池的唯一途径；赢家由外部（管理员）宣布。
    pub fn end_hand(&mut self, winner: usize) -> Result<u64> {
        let pot = self.hand.pot;
        let player = self.roster.get_mut(winner).ok_or(TableError::InvalidWinner)?;
        player.stack += pot;
        info!("本局结束，{} 赢得 {}", player.name, pot);
        self.reset_hand();
        Ok(pot)
    }

    /// 本轮下注结束后开启下一轮：奖池保留，本轮投入和行动标记清零，
    /// 从庄家之后第一个仍在局中的玩家开始行动。
    pub fn start_next_round(&mut self) -> Result<()> {
        if !self.hand.in_progress {
            return Err(TableError::NoActiveHand);
        }
        if self.roster.count_in_hand() <= 1 {
            return Err(TableError::HandDecided);
        }
        if !self.hand.round_closed {
            return Err(TableError::RoundStillOpen);
        }

        self.roster.reset_round_flags();
        self.hand.current_bet = 0;
        self.hand.last_aggressor_index = None;
        self.hand.round_closed = false;
        self.hand.turn_index = self.hand.dealer_index.and_then(|d| self.next_in_hand(d));
        info!("新一轮下注开始，奖池 {}", self.hand.pot);
        Ok(())
    }
}

// --- 玩家动作 ---

impl Table {
    /// 校验调用者此刻可以行动，返回其座位索引
    pub fn assert_turn(&self, handle: &PlayerHandle) -> Result<usize> {
        let idx = self.roster.find_by_handle(handle).ok_or(TableError::NotSeated)?;
        if !self.hand.in_progress {
            return Err(TableError::NoActiveHand);
        }
        if self.hand.turn_index != Some(idx) {
            return Err(TableError::NotYourTurn);
        }
        if !self.roster.get(idx).is_some_and(|p| p.in_hand) {
            return Err(TableError::AlreadyFolded);
        }
        Ok(idx)
    }

    /// 处理单个玩家的动作：校验轮次、执行动作、推进行动权。
    /// 返回错误时状态没有任何改变。
    pub fn apply_action(&mut self, handle: &PlayerHandle, action: PlayerAction) -> Result<()> {
        let idx = self.assert_turn(handle)?;
        match action {
            PlayerAction::Fold => self.fold(idx),
            PlayerAction::CheckOrCall => {
                self.check_or_call(idx);
            }
            PlayerAction::BetOrRaise(target) => self.bet_or_raise(idx, target)?,
        }
        debug!("座位 {} 执行 {:?}，奖池 {}", idx, action, self.hand.pot);
        self.advance_turn();
        Ok(())
    }

    pub fn fold(&mut self, idx: usize) {
        if let Some(p) = self.roster.get_mut(idx) {
            p.in_hand = false;
            p.has_acted = true;
        }
        if self.roster.count_in_hand() <= 1 {
            self.hand.turn_index = None;
        }
    }

    /// 跟到当前下注额（已经跟平时就是过牌），返回实际支付的筹码
    pub fn check_or_call(&mut self, idx: usize) -> u32 {
        let current = self.hand.current_bet;
        let Some(p) = self.roster.get_mut(idx) else { return 0 };
        let paid = p.commit(current.saturating_sub(p.bet_this_round));
        p.has_acted = true;
        self.hand.pot += u64::from(paid);
        paid
    }

    /// 下注或加注到本轮总额 `target`
    ///
    /// 总额至少比当前下注多 1（开局下注至少为 1），比当前下注多出的部分不能超过 `bet_limit`。
    /// 上限按请求的总额检查；筹码不够时按全下支付，全下不足当前下注时不会重新开放他人的行动。
    pub fn bet_or_raise(&mut self, idx: usize, target: u32) -> Result<()> {
        let current = self.hand.current_bet;
        let minimum = current.saturating_add(1);
        if target < minimum {
            return Err(TableError::BetTooSmall { minimum });
        }
        let limit = self.config.bet_limit;
        if target - current > limit {
            return Err(TableError::BetLimitExceeded { limit });
        }

        let player = self.roster.get_mut(idx).ok_or(TableError::NotSeated)?;
        let paid = player.commit(target.saturating_sub(player.bet_this_round));
        player.has_acted = true;
        let bet_this_round = player.bet_this_round;
        self.hand.pot += u64::from(paid);
        self.hand.current_bet = current.max(bet_this_round);

        if bet_this_round == self.hand.current_bet {
            // 加注生效，其他人需要重新表态
            self.hand.last_aggressor_index = Some(idx);
            for (i, p) in self.roster.iter_mut().enumerate() {
                if i != idx && p.in_hand {
                    p.has_acted = false;
                }
            }
            self.hand.round_closed = false;
        }
        Ok(())
    }
}

// --- 行动权推进 ---

impl Table {
    /// 检查当前下注轮是否结束
    ///
    /// 每个仍在局中的玩家都要跟平当前下注（或已全下），并且自上次加注后已经行动过
    /// （最后一个加注者本身算作已行动）。
    pub fn is_round_closed(&self) -> bool {
        let current = self.hand.current_bet;
        let aggressor = self.hand.last_aggressor_index;
        self.roster
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand)
            .all(|(i, p)| {
                let matched = p.bet_this_round == current || p.stack == 0;
                matched && (p.has_acted || aggressor == Some(i))
            })
    }

    /// 每个成功的动作之后调用，决定下一个行动者
    pub fn advance_turn(&mut self) {
        if !self.hand.in_progress {
            return;
        }
        if self.roster.count_in_hand() <= 1 {
            self.hand.turn_index = None;
            return;
        }
        if self.is_round_closed() {
            self.hand.round_closed = true;
            self.hand.turn_index = None;
            debug!("本轮下注结束，奖池 {}", self.hand.pot);
            return;
        }
        self.hand.turn_index = self.hand.turn_index.and_then(|t| self.next_in_hand(t));
    }
}

// --- 单元测试 ---
