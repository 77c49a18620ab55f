use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use headsup_core::{
    Action, Card, ClientMessage, HandEvent, LegalAction, MatchConfig, MatchState, ServerMessage,
};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

const HELP: &str = "\
Commands:
  new [stack] [big_blind]        - open a new match against the AI
  start                          - deal the next hand
  check | call | fold            - act in the current hand
  bet <amount>                   - open the betting
  raise <amount>                 - raise facing a bet
  equity                         - your equity on the current board
  calc <card> <card> [board..]   - equity calculator, e.g. calc As Kd Qh Jh 2c
  reset                          - restore both starting stacks
  exit                           - disconnect";

/// What a line typed by the user asks for.
#[derive(Debug, PartialEq)]
enum Command {
    Send(ClientMessage),
    Help,
    Exit,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(&std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string()))?;

    println!("connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("connected");

    let (mut write, mut read) = ws_stream.split();

    // print whatever the server pushes
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        println!("{}", render(&server_msg));
                        print!("> ");
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => eprintln!("unreadable server message: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("connection error: {}", e);
                    break;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    println!("--- heads-up hold'em ---");
    println!("{}", HELP);

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Send(msg)) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Exit) => {
                println!("disconnecting");
                break;
            }
            Err(usage) => println!("{}", usage),
        }
    }

    Ok(())
}

fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Ok(Command::Help);
    };

    let msg = match command {
        "new" => {
            let mut config = MatchConfig::default();
            if let Some(stack) = args.first() {
                config.initial_stack = parse_amount(stack).map_err(|_| "usage: new [stack] [big_blind]")?;
            }
            if let Some(bb) = args.get(1) {
                config.big_blind = parse_amount(bb).map_err(|_| "usage: new [stack] [big_blind]")?;
            }
            ClientMessage::NewMatch { config: Some(config) }
        }
        "start" => ClientMessage::StartHand,
        "check" => Action::Check.into(),
        "call" => Action::Call.into(),
        "fold" => Action::Fold.into(),
        "bet" => {
            let amount = args.first().ok_or("usage: bet <amount>")?;
            Action::Bet(parse_amount(amount)?).into()
        }
        "raise" => {
            let amount = args.first().ok_or("usage: raise <amount>")?;
            Action::Raise(parse_amount(amount)?).into()
        }
        "equity" => ClientMessage::ShowEquity,
        "calc" => {
            if args.len() < 2 {
                return Err("usage: calc <card> <card> [board..]".to_string());
            }
            let cards = args
                .iter()
                .map(|s| s.parse::<Card>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            ClientMessage::Estimate {
                hand: [cards[0], cards[1]],
                board: cards[2..].to_vec(),
                simulations: None,
            }
        }
        "reset" => ClientMessage::ResetMatch,
        "help" => return Ok(Command::Help),
        "exit" | "quit" => return Ok(Command::Exit),
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Command::Send(msg))
}

fn parse_amount(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!("not a chip amount: {}", s)),
    }
}

fn cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| format!("{}{}", c.rank.to_char(), c.suit.symbol()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_state(state: &MatchState) -> String {
    let mut out = format!(
        "[{} | pot {} | to call {}] you {} | AI {}",
        state.street, state.pot, state.to_call, state.player_stack, state.ai_stack
    );
    if let Some(hand) = &state.player_hand {
        out.push_str(&format!("\n  your hand: {}", cards(hand)));
    }
    if !state.board.is_empty() {
        out.push_str(&format!("\n  board: {}", cards(&state.board)));
    }
    if let Some(hand) = &state.ai_hand {
        out.push_str(&format!("\n  AI hand: {}", cards(hand)));
    }
    out
}

fn render_legal(action: &LegalAction) -> String {
    match action {
        LegalAction::Fold => "fold".to_string(),
        LegalAction::Check => "check".to_string(),
        LegalAction::Call(amount) => format!("call {}", amount),
        LegalAction::Bet { min, max } => format!("bet {}..{}", min, max),
        LegalAction::Raise { min, max } => format!("raise {}..{}", min, max),
    }
}

fn render(msg: &ServerMessage) -> String {
    match msg {
        ServerMessage::MatchCreated { session_id, state } => {
            format!("match {} created\n{}", session_id, render_state(state))
        }
        ServerMessage::Snapshot(state) => render_state(state),
        ServerMessage::Event(event) => match event {
            HandEvent::HandStarted { hand_number, player_hand } => {
                format!("== hand #{} == you hold {}", hand_number, cards(player_hand))
            }
            HandEvent::BlindsPosted { small_blind, big_blind, pot } => {
                format!("blinds {}/{} posted, pot {}", small_blind, big_blind, pot)
            }
            HandEvent::SeatActed { seat, action, stack, pot, .. } => {
                format!("{} {} (stack {}, pot {})", seat, action, stack, pot)
            }
            HandEvent::BetReturned { seat, amount, .. } => format!("{} gets {} uncalled chips back", seat, amount),
            HandEvent::CommunityCardsDealt { street, cards: dealt } => format!("{}: {}", street, cards(dealt)),
            HandEvent::HandEnded(outcome) => format!("** {} **", outcome),
        },
        ServerMessage::NextToAct { valid_actions } => {
            let options: Vec<String> = valid_actions.iter().map(render_legal).collect();
            format!("your move: {}", options.join(", "))
        }
        ServerMessage::Equity(estimate) => format!("equity: {}", estimate),
        ServerMessage::Info { message } => message.clone(),
        ServerMessage::Error { message } => format!("error: {}", message),
    }
}
