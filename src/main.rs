use breakroom_chat::{ChatMessage, ChatNotice, Config, IdType, Session, create_chat_service};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = Config::from_env()?;
    config.print_info();

    let token = config
        .token
        .clone()
        .ok_or("BREAKROOM_TOKEN must be set in .env file")?;
    let session = Arc::new(Session::new());
    let user = session.login(&token)?;
    info!("Logged in as {} (id {})", user.handle, user.id);

    let room_id = match std::env::args().nth(1) {
        Some(arg) => Some(arg.parse::<i64>().map_err(|_| format!("Invalid room id: {arg}"))?),
        None => None,
    };

    let chat = create_chat_service(&config, session)?;
    chat.connect().await?;

    let rooms = chat.load_rooms().await?;
    info!("{} rooms available", rooms.len());
    for room in rooms.iter() {
        info!("  [{}] {}", room.id, room.name);
    }

    if let Some(room_id) = room_id {
        chat.join_room(room_id)?;
        let loaded = chat.load_latest(room_id).await?;
        info!("Room {} joined, {} messages loaded", room_id, loaded);
    } else {
        warn!("No room id given, only notices will be shown");
    }

    let mut notices = chat.notices();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            notice = notices.recv() => match notice {
                Ok(ChatNotice::MessageReceived { room_id, message }) => info!("{}", message_line(room_id, &message)),
                Ok(ChatNotice::UserJoined { room_id, user }) => info!("[{}] {} joined", room_id, user.handle),
                Ok(ChatNotice::UserLeft { room_id, user }) => info!("[{}] {} left", room_id, user.handle),
                Ok(ChatNotice::Error { message }) => error!("Server error: {}", message),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} notices", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    }

    chat.disconnect().await;
    Ok(())
}

/// One log line per received message; media-only messages show their path
fn message_line(room_id: IdType, message: &ChatMessage) -> String {
    let body = message
        .message
        .as_deref()
        .or(message.image_path.as_deref())
        .or(message.video_path.as_deref())
        .unwrap_or_default();
    format!("[{}] {}: {}", room_id, message.handle, body)
}
