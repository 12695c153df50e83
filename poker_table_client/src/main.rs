use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;
use uuid::Uuid;

use poker_table_core::{ClientMessage, PlayerAction, ServerMessage, TableView};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

const COMMANDS: &str = "\
可用命令:
  join <名字>                     - 入座
  leave                           - 离座
  fold                            - 弃牌
  check | call                    - 过牌 / 跟注
  raise <总额>                    - 下注或加注到本轮总额
  start                           - 开始新的一局 (管理员)
  next                            - 开始下一轮下注 (管理员)
  award <玩家标识>                - 宣布赢家并结算 (管理员)
  config <上限> <初始筹码> <小盲> - 修改牌桌配置 (管理员)
  reset                           - 重置牌桌 (管理员)
  exit                            - 退出";

/// 把一行输入解析为要发送的消息，返回 Err 时是给用户的提示
fn parse_command(line: &str) -> Result<Option<ClientMessage>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = parts.first() else {
        return Ok(None);
    };

    let amount = |i: usize, usage: &str| -> Result<f64, String> {
        parts
            .get(i)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| format!("用法: {}", usage))
    };

    let msg: ClientMessage = match command {
        "join" => {
            if parts.len() < 2 {
                return Err("用法: join <名字>".to_string());
            }
            ClientMessage::Join { name: parts[1..].join(" ") }
        }
        "leave" => ClientMessage::Leave,
        "fold" => PlayerAction::Fold.into(),
        "check" | "call" => PlayerAction::CheckOrCall.into(),
        "raise" | "bet" => ClientMessage::BetOrRaise { target_total: amount(1, "raise <总额>")? },
        "start" => ClientMessage::StartHand,
        "next" => ClientMessage::NextRound,
        "award" => {
            let winner = parts
                .get(1)
                .and_then(|s| s.parse::<Uuid>().ok())
                .ok_or_else(|| "用法: award <玩家标识>".to_string())?;
            ClientMessage::EndHandAward { winner }
        }
        "config" => {
            let usage = "config <上限> <初始筹码> <小盲>";
            ClientMessage::SetConfig {
                bet_limit: amount(1, usage)?,
                initial_stack: amount(2, usage)?,
                small_blind: amount(3, usage)?,
            }
        }
        "reset" => ClientMessage::ResetTable,
        _ => return Err(format!("未知命令: {}", line.trim())),
    };
    Ok(Some(msg))
}

/// 打印一份便于阅读的牌桌状态
fn print_table(view: &TableView) {
    let hand = &view.hand;
    println!(
        "配置: 上限 {} / 初始 {} / 盲注 {}-{}",
        view.config.bet_limit,
        view.config.initial_stack,
        view.config.small_blind,
        view.config.big_blind()
    );
    if hand.in_progress {
        println!(
            "奖池 {}  当前下注 {}{}",
            hand.pot,
            hand.current_bet,
            if hand.round_closed { "  (本轮结束)" } else { "" }
        );
    } else {
        println!("等待开局");
    }
    for (i, p) in view.players.iter().enumerate() {
        let mut tags = Vec::new();
        if hand.dealer_index == Some(i) { tags.push("D"); }
        if hand.small_blind_index == Some(i) { tags.push("SB"); }
        if hand.big_blind_index == Some(i) { tags.push("BB"); }
        if hand.turn_index == Some(i) { tags.push("行动中"); }
        if hand.in_progress && !p.in_hand { tags.push("弃牌"); }
        println!(
            "  {:<16} 筹码 {:>6}  本轮 {:>5}  [{}]  {}",
            p.name,
            p.stack,
            p.bet_this_round,
            tags.join(" "),
            p.handle
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw_url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = Url::parse(&raw_url)?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(ServerMessage::Welcome { your_handle, snapshot }) => {
                            println!("\n<-- 你的标识: {}", your_handle);
                            print_table(&snapshot);
                        }
                        Ok(ServerMessage::TableSnapshot(view)) => {
                            println!();
                            print_table(&view);
                        }
                        Ok(ServerMessage::Error { message }) => println!("\n<-- [错误]: {}", message),
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                    print!("> "); // 重新显示输入提示符
                    let _ = std::io::stdout().flush();
                }
                Ok(Message::Close(_)) => {
                    println!("\n服务器关闭了连接");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 共享牌桌客户端 ---");
    println!("{}", COMMANDS);

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break };
        if line.trim() == "exit" {
            println!("正在断开连接...");
            break;
        }

        match parse_command(&line) {
            Ok(Some(msg)) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Ok(None) => {}
            Err(hint) => println!("{}", hint),
        }
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}
