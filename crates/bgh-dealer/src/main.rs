//! Dealer test client.
//!
//! Positional commands mirror the RPC surface one-to-one. Exit code 0 on
//! success, 1 on RPC or argument error.

use bgh_wire::pb;
use bgh_wire::pb::dealer_service_client::DealerServiceClient;
use clap::Parser;
use clap::Subcommand;
use tokio_stream::StreamExt;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "dealer", about = "bingohall dealer console")]
struct Cli {
    /// Dealer service endpoint
    #[arg(long, env = "DEALER_ADDR", default_value = "http://127.0.0.1:50051")]
    addr: String,

    /// Room this console operates on
    #[arg(long, env = "ROOM_ID", default_value = "SG01")]
    room: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a fresh round in the room
    Start,
    /// Advance to the next stage
    Advance {
        /// Confirm leaving a dealer-gated stage
        #[arg(long)]
        force: bool,
    },
    /// Print the full round snapshot
    Status,
    /// Draw a regular ball
    Draw {
        number: u32,
        #[arg(long)]
        last: bool,
    },
    /// Draw an extra ball
    DrawExtra {
        number: u32,
        #[arg(long)]
        last: bool,
    },
    /// Draw a jackpot ball
    DrawJackpot {
        number: u32,
        #[arg(long)]
        last: bool,
    },
    /// Draw a lucky ball
    DrawLucky {
        number: u32,
        #[arg(long)]
        last: bool,
    },
    /// Toggle the jackpot arc for the current round
    SetJackpot {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Record the jackpot winner
    NotifyWinner { winner_id: String },
    /// Cancel the current round
    Cancel { reason: String },
    /// Open a fresh round with the jackpot arc enabled
    StartJackpot,
    /// Tail the room's event stream
    Subscribe,
}

fn draw_request(room: &str, number: u32, last: bool) -> pb::DrawBallRequest {
    pb::DrawBallRequest {
        room_id: room.to_string(),
        number,
        is_last: last,
    }
}

fn ack(reply: pb::CommandReply) {
    let stage = pb::GameStage::try_from(reply.stage)
        .unwrap_or(pb::GameStage::Unspecified)
        .as_str_name();
    println!("round {} in {}", reply.round_id, stage);
}

async fn run(cli: Cli) -> Result<(), BoxErr> {
    let mut client = DealerServiceClient::connect(cli.addr).await?;
    let room = cli.room;
    let room_request = pb::RoomRequest {
        room_id: room.clone(),
    };
    match cli.command {
        Command::Start => {
            ack(client.start_new_round(room_request).await?.into_inner());
        }
        Command::Advance { force } => {
            let reply = client
                .advance_stage(pb::AdvanceStageRequest {
                    room_id: room,
                    force,
                })
                .await?;
            ack(reply.into_inner());
        }
        Command::Status => {
            let reply = client.get_game_status(room_request).await?.into_inner();
            let game = reply.game.ok_or("empty status reply")?;
            print_snapshot(&game);
        }
        Command::Draw { number, last } => {
            let reply = client.draw_ball(draw_request(&room, number, last)).await?;
            ack(reply.into_inner());
        }
        Command::DrawExtra { number, last } => {
            let reply = client
                .draw_extra_ball(draw_request(&room, number, last))
                .await?;
            ack(reply.into_inner());
        }
        Command::DrawJackpot { number, last } => {
            let reply = client
                .draw_jackpot_ball(draw_request(&room, number, last))
                .await?;
            ack(reply.into_inner());
        }
        Command::DrawLucky { number, last } => {
            let reply = client
                .draw_lucky_ball(draw_request(&room, number, last))
                .await?;
            ack(reply.into_inner());
        }
        Command::SetJackpot { enabled } => {
            let reply = client
                .set_has_jackpot(pb::SetHasJackpotRequest {
                    room_id: room,
                    has_jackpot: enabled,
                })
                .await?;
            ack(reply.into_inner());
        }
        Command::NotifyWinner { winner_id } => {
            let reply = client
                .notify_jackpot_winner(pb::NotifyJackpotWinnerRequest {
                    room_id: room,
                    winner_id,
                })
                .await?;
            ack(reply.into_inner());
        }
        Command::Cancel { reason } => {
            let reply = client
                .cancel_game(pb::CancelGameRequest {
                    room_id: room,
                    reason,
                })
                .await?;
            ack(reply.into_inner());
        }
        Command::StartJackpot => {
            ack(client.start_jackpot_round(room_request).await?.into_inner());
        }
        Command::Subscribe => {
            let mut stream = client
                .subscribe_game_events(pb::SubscribeRequest {
                    room_id: room.clone(),
                })
                .await?
                .into_inner();
            println!("subscribed to {}", room);
            while let Some(event) = stream.next().await {
                print_event(event?);
            }
        }
    }
    Ok(())
}

fn print_snapshot(game: &pb::GameSnapshot) {
    let stage = pb::GameStage::try_from(game.stage)
        .unwrap_or(pb::GameStage::Unspecified)
        .as_str_name();
    println!("round   {}", game.round_id);
    println!("room    {}", game.room_id);
    println!("stage   {}", stage);
    println!(
        "balls   regular {} / extra {} / jackpot {} / lucky {}",
        game.regular_balls.len(),
        game.extra_balls.len(),
        game.jackpot_balls.len(),
        game.lucky_balls.len()
    );
    if game.has_jackpot {
        println!("jackpot enabled, winner '{}'", game.jackpot_winner);
    }
    if game.is_cancelled {
        println!("cancelled: {}", game.cancel_reason);
    }
}

fn print_event(event: pb::GameEvent) {
    use pb::game_event::Kind;
    let stage_name = |stage: i32| {
        pb::GameStage::try_from(stage)
            .unwrap_or(pb::GameStage::Unspecified)
            .as_str_name()
            .to_string()
    };
    match event.kind {
        Some(Kind::StageChanged(e)) => println!(
            "[{}] stage {} -> {}",
            event.room_id,
            stage_name(e.old_stage),
            stage_name(e.new_stage)
        ),
        Some(Kind::BallDrawn(e)) => match e.ball {
            Some(ball) => println!(
                "[{}] ball #{}{}",
                event.room_id,
                ball.number,
                if ball.is_last { " (last)" } else { "" }
            ),
            None => println!("[{}] ball drawn", event.room_id),
        },
        Some(Kind::GameCreated(_)) => println!("[{}] new round {}", event.room_id, event.round_id),
        Some(Kind::GameCancelled(e)) => {
            println!("[{}] cancelled: {}", event.room_id, e.reason)
        }
        Some(Kind::GameCompleted(_)) => println!("[{}] round complete", event.room_id),
        Some(Kind::SideSelected(e)) => println!(
            "[{}] side {}",
            event.room_id,
            pb::ExtraBallSide::try_from(e.side)
                .unwrap_or(pb::ExtraBallSide::Unspecified)
                .as_str_name()
        ),
        Some(Kind::Heartbeat(_)) => {}
        Some(Kind::Notification(_)) => println!("[{}] snapshot received", event.room_id),
        None => {}
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
