use futures_util::{SinkExt, StreamExt};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// 手動測試用:送出幾個樣本位置,列印伺服器回播的關節角度
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8765".to_string());

    println!("🔌 Connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let positions: [[f64; 3]; 4] = [
        [10.0, 20.0, 30.0],
        [40.0, 50.0, 60.0],
        [70.0, 80.0, 90.0],
        [100.0, 110.0, 120.0],
    ];

    for position in positions {
        let frame = serde_json::json!({ "Target_position": position });
        write.send(Message::Text(frame.to_string())).await?;
        println!("📤 Sent: {}", frame);

        match timeout(Duration::from_secs(5), read.next()).await {
            Ok(Some(Ok(Message::Text(reply)))) => println!("📥 Received: {}", reply),
            Ok(Some(Ok(other))) => println!("📥 Received non-text frame: {:?}", other),
            Ok(Some(Err(e))) => {
                println!("❌ Receive error: {}", e);
                break;
            }
            Ok(None) => {
                println!("❌ Server closed the connection");
                break;
            }
            Err(_) => println!("⏱️ No reply from server"),
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    println!("🎉 Probe finished");
    Ok(())
}
