use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, Direction, Position, ServerMessage, SPAWN_X, SPAWN_Y};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

// Headless stand-in for the browser client: joins, walks a square and
// prints everything the server relays.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = "ws://127.0.0.1:8080";
    println!("Connecting to {}", url);

    let (ws_stream, _) = connect_async(url).await?;
    println!("Connected");

    let (mut sink, mut stream) = ws_stream.split();

    // Print every server event as it arrives
    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let frame = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            };

            match ServerMessage::decode(&frame) {
                Ok(ServerMessage::PlayerList { players }) => {
                    println!("Roster: {} other player(s)", players.len());
                    for player in players {
                        println!(
                            "  {} at ({}, {}) facing {:?}",
                            player.id, player.position.x, player.position.y, player.direction
                        );
                    }
                }
                Ok(ServerMessage::NewPlayer { player }) => {
                    println!("Player {} joined", player.id);
                }
                Ok(ServerMessage::PlayerMove {
                    player_id,
                    position,
                    direction,
                }) => {
                    println!(
                        "Player {} moved to ({}, {}) facing {:?}",
                        player_id, position.x, position.y, direction
                    );
                }
                Ok(ServerMessage::PlayerLeft { player_id }) => {
                    println!("Player {} left", player_id);
                }
                Err(e) => println!("Failed to decode server message: {}", e),
            }
        }
    });

    // Walk a square: three steps per side, one step per second
    let mut position = Position {
        x: SPAWN_X,
        y: SPAWN_Y,
    };
    let sides = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    for direction in sides {
        for _ in 0..3 {
            match direction {
                Direction::Right => position.x += 10.0,
                Direction::Down => position.y += 10.0,
                Direction::Left => position.x -= 10.0,
                Direction::Up => position.y -= 10.0,
            }

            let report = ClientMessage::PlayerMove {
                position,
                direction,
            };
            println!(
                "Sending move to ({}, {}) facing {:?}",
                position.x, position.y, direction
            );
            sink.send(Message::Text(report.encode()?)).await?;

            sleep(Duration::from_secs(1)).await;
        }
    }

    println!("Disconnecting");
    sink.close().await?;
    reader.abort();

    println!("Test client finished");
    Ok(())
}
