//! 牌桌协调器：把外部传入的请求转换为对 `Table` 的操作。
//!
//! 协调器本身是同步的，每个请求从头到尾执行完毕，不会在修改中途让出执行权。
//! 调用方（服务器的牌桌任务）保证同一时刻只有一个请求在处理。
//! 管理员身份由外部判定，这里只接收一个布尔值。

use crate::config::TableConfig;
use crate::error::{ErrorKind, Result, TableError};
use crate::message::ClientMessage;
use crate::state::{Player, PlayerAction, PlayerHandle, Table, TableView};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct TableCoordinator {
    table: Table,
}

/// 把客户端发送的原始金额转换为筹码数：必须是有限且 > 0 的数，小数部分向下取整
fn parse_amount(raw: f64) -> Result<u32> {
    if !raw.is_finite() || raw < 1.0 || raw >= u32::MAX as f64 {
        return Err(TableError::InvalidAmount);
    }
    Ok(raw.floor() as u32)
}

impl TableCoordinator {
    pub fn new(config: TableConfig) -> Self {
        Self { table: Table::new(config) }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn snapshot(&self) -> TableView {
        self.table.view()
    }

    pub fn player(&self, handle: &PlayerHandle) -> Option<&Player> {
        self.table.roster.find_by_handle(handle).and_then(|i| self.table.roster.get(i))
    }

    /// 处理一个请求。成功时返回需要广播的新状态；失败时状态不变，错误只回给请求者。
    pub fn handle(&mut self, caller: PlayerHandle, is_admin: bool, msg: ClientMessage) -> Result<TableView> {
        let result = self.apply(caller, is_admin, msg);
        if let Err(e) = &result {
            match e.kind() {
                ErrorKind::Authorization => warn!("{} 尝试执行管理操作被拒绝", caller),
                _ => warn!("{} 的请求被拒绝: {}", caller, e),
            }
        }
        result.map(|_| self.table.view())
    }

    fn apply(&mut self, caller: PlayerHandle, is_admin: bool, msg: ClientMessage) -> Result<()> {
        if msg.requires_admin() && !is_admin {
            return Err(TableError::NotAuthorized);
        }

        match msg {
            ClientMessage::Join { name } => {
                self.table.join(caller, &name)?;
            }
            ClientMessage::Leave => {
                self.table.remove_player(&caller)?;
            }
            ClientMessage::SetConfig { bet_limit, initial_stack, small_blind } => {
                self.table.config = TableConfig::from_raw(bet_limit, initial_stack, small_blind)?;
                info!("牌桌配置已更新: {:?}", self.table.config);
            }
            ClientMessage::ResetTable => self.table.reset_table(),
            ClientMessage::StartHand => self.table.start_hand()?,
            ClientMessage::EndHandAward { winner } => {
                if !self.table.hand.in_progress {
                    return Err(TableError::NoActiveHand);
                }
                let idx = self.table.roster.find_by_handle(&winner).ok_or(TableError::InvalidWinner)?;
                self.table.end_hand(idx)?;
            }
            ClientMessage::NextRound => self.table.start_next_round()?,
            ClientMessage::Fold => self.table.apply_action(&caller, PlayerAction::Fold)?,
            ClientMessage::CheckOrCall => self.table.apply_action(&caller, PlayerAction::CheckOrCall)?,
            ClientMessage::BetOrRaise { target_total } => {
                // 先确认轮到该玩家，再校验金额，错误信息更贴近实际原因
                self.table.assert_turn(&caller)?;
                let target = parse_amount(target_total)?;
                self.table.apply_action(&caller, PlayerAction::BetOrRaise(target))?;
            }
        }
        Ok(())
    }

    /// 连接断开。玩家在座时按离座处理并返回新状态，否则什么也不做。
    pub fn disconnect(&mut self, handle: &PlayerHandle) -> Option<TableView> {
        self.table.remove_player(handle).ok()?;
        Some(self.table.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seated(names: &[&str]) -> (TableCoordinator, Vec<PlayerHandle>) {
        let mut coord = TableCoordinator::new(TableConfig::default());
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let h = Uuid::new_v4();
                coord.handle(h, false, ClientMessage::Join { name: name.to_string() }).unwrap();
                h
            })
            .collect();
        (coord, handles)
    }

    #[test]
    fn test_admin_commands_require_authorization() {
        let (mut coord, h) = seated(&["a", "b"]);
        for msg in [
            ClientMessage::StartHand,
            ClientMessage::ResetTable,
            ClientMessage::NextRound,
            ClientMessage::EndHandAward { winner: h[0] },
            ClientMessage::SetConfig { bet_limit: 1.0, initial_stack: 1.0, small_blind: 1.0 },
        ] {
            assert_eq!(coord.handle(h[0], false, msg), Err(TableError::NotAuthorized));
        }
        assert!(!coord.table().hand.in_progress);
        assert_eq!(coord.table().config, TableConfig::default());
    }

    #[test]
    fn test_full_heads_up_hand() {
        let (mut coord, h) = seated(&["A", "B"]);
        let view = coord.handle(h[0], true, ClientMessage::StartHand).unwrap();
        assert_eq!(view.current_player().map(|p| p.handle), Some(h[0]));

        let view = coord.handle(h[0], false, ClientMessage::CheckOrCall).unwrap();
        assert_eq!(view.hand.pot, 20);
        assert_eq!(view.player(&h[0]).unwrap().stack, 490);

        let view = coord.handle(h[1], false, ClientMessage::CheckOrCall).unwrap();
        assert!(view.hand.round_closed);
        assert_eq!(view.hand.turn_index, None);

        let view = coord.handle(h[0], true, ClientMessage::EndHandAward { winner: h[1] }).unwrap();
        assert!(!view.hand.in_progress);
        assert_eq!(view.player(&h[1]).unwrap().stack, 510);
        assert_eq!(view.player(&h[0]).unwrap().stack, 490);
    }

    #[test]
    fn test_end_hand_award_checks() {
        let (mut coord, h) = seated(&["a", "b"]);
        assert_eq!(
            coord.handle(h[0], true, ClientMessage::EndHandAward { winner: h[1] }),
            Err(TableError::NoActiveHand)
        );
        coord.handle(h[0], true, ClientMessage::StartHand).unwrap();
        assert_eq!(
            coord.handle(h[0], true, ClientMessage::EndHandAward { winner: Uuid::new_v4() }),
            Err(TableError::InvalidWinner)
        );
        assert_eq!(coord.handle(h[0], true, ClientMessage::StartHand), Err(TableError::HandInProgress));
    }

    #[test]
    fn test_bet_amount_validation() {
        let (mut coord, h) = seated(&["a", "b", "c"]);
        coord.handle(h[0], true, ClientMessage::StartHand).unwrap();

        for raw in [0.0, -5.0, f64::NAN, f64::INFINITY, 0.5] {
            assert_eq!(
                coord.handle(h[0], false, ClientMessage::BetOrRaise { target_total: raw }),
                Err(TableError::InvalidAmount)
            );
        }
        // 不是自己的回合时优先报告回合错误
        assert_eq!(
            coord.handle(h[1], false, ClientMessage::BetOrRaise { target_total: -1.0 }),
            Err(TableError::NotYourTurn)
        );

        let view = coord.handle(h[0], false, ClientMessage::BetOrRaise { target_total: 25.9 }).unwrap();
        assert_eq!(view.hand.current_bet, 25);
    }

    #[test]
    fn test_set_config() {
        let (mut coord, h) = seated(&["a"]);
        assert_eq!(
            coord.handle(h[0], true, ClientMessage::SetConfig { bet_limit: 10.0, initial_stack: 0.0, small_blind: 1.0 }),
            Err(TableError::InvalidConfig)
        );
        let view = coord
            .handle(h[0], true, ClientMessage::SetConfig { bet_limit: 100.0, initial_stack: 1000.0, small_blind: 25.0 })
            .unwrap();
        assert_eq!(view.config, TableConfig { bet_limit: 100, initial_stack: 1000, small_blind: 25 });

        // 已入座的玩家筹码不变，新玩家使用新的初始筹码，重置后所有人恢复
        assert_eq!(view.player(&h[0]).unwrap().stack, 500);
        let late = Uuid::new_v4();
        let view = coord.handle(late, false, ClientMessage::Join { name: "late".into() }).unwrap();
        assert_eq!(view.player(&late).unwrap().stack, 1000);
        let view = coord.handle(h[0], true, ClientMessage::ResetTable).unwrap();
        assert!(view.players.iter().all(|p| p.stack == 1000));
    }

    #[test]
    fn test_leave_and_disconnect() {
        let (mut coord, h) = seated(&["a", "b", "c"]);
        assert_eq!(coord.handle(Uuid::new_v4(), false, ClientMessage::Leave), Err(TableError::NotSeated));

        coord.handle(h[0], true, ClientMessage::StartHand).unwrap();
        let view = coord.handle(h[2], false, ClientMessage::Leave).unwrap();
        assert_eq!(view.players.len(), 2);
        assert!(!view.hand.in_progress);

        assert!(coord.disconnect(&Uuid::new_v4()).is_none());
        let view = coord.disconnect(&h[1]).unwrap();
        assert_eq!(view.players.len(), 1);
    }

    #[test]
    fn test_duplicate_join() {
        let (mut coord, h) = seated(&["Ana"]);
        assert_eq!(
            coord.handle(Uuid::new_v4(), false, ClientMessage::Join { name: " ana ".into() }),
            Err(TableError::DuplicateName("ana".into()))
        );
        assert_eq!(
            coord.handle(h[0], false, ClientMessage::Join { name: "other".into() }),
            Err(TableError::AlreadySeated)
        );
        assert_eq!(coord.player(&h[0]).map(|p| p.name.as_str()), Some("Ana"));
    }

    // 把日志输出收集到内存里，用来检查被拒绝的请求记录在哪个级别
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_rule_rejections_are_logged_as_warnings() {
        let (mut coord, h) = seated(&["a"]);
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(
                coord.handle(h[0], true, ClientMessage::StartHand),
                Err(TableError::InsufficientPlayers)
            );
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "日志: {}", output);
        assert!(output.contains(&TableError::InsufficientPlayers.to_string()));
    }
}
