use parlor::prelude::*;

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

const DEFAULT_PORT: u16 = 3000;

/// `PARLOR_BIND` wins if set; otherwise listen on all interfaces at
/// `PORT`, or 3000.
fn bind_addr(bind: Option<String>, port: Option<String>) -> String {
    if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
        return bind;
    }
    let port = port
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    format!("0.0.0.0:{port}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parlor::init_tracing();

    let addr = bind_addr(std::env::var("PARLOR_BIND").ok(), std::env::var("PORT").ok());
    tracing::info!(%addr, games = ?GameType::ALL.map(|g| g.as_str()), "starting party server");

    let server = ParlorServerBuilder::new().bind(&addr).build().await?;
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    #[test]
    fn test_bind_addr_prefers_explicit_bind() {
        let addr = bind_addr(Some("127.0.0.1:9000".into()), Some("4000".into()));
        assert_eq!(addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_bind_addr_falls_back_to_port_then_default() {
        assert_eq!(bind_addr(None, Some("4000".into())), "0.0.0.0:4000");
        assert_eq!(bind_addr(Some(" ".into()), Some("nope".into())), "0.0.0.0:3000");
        assert_eq!(bind_addr(None, None), "0.0.0.0:3000");
    }

    #[tokio::test]
    async fn test_every_game_type_can_be_created() {
        let server = ParlorServerBuilder::new()
            .bind("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        for game in GameType::ALL {
            let msg = json!({"type": "create_session", "gameType": game.as_str(), "playerName": "demo"});
            ws.send(Message::text(msg.to_string())).await.unwrap();
            let reply = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            let reply: Value = serde_json::from_slice(&reply.into_data()).unwrap();
            assert_eq!(reply["type"], "session_created", "{game}");
            assert_eq!(reply["session"]["gameType"], game.as_str());
        }
    }
}
