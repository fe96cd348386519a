//! WebSocket room membership and event delivery, without sockets.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use docket_api::notifications::RoomRouter;
use docket_api::ws::WsManager;
use docket_core::roles::Role;
use docket_core::rooms::{Room, EVENT_EDIT_REQUEST_UPDATE, EVENT_NEW_EDIT_REQUEST};
use docket_events::{EventBus, Notifier, RealtimeEvent};
use serde_json::json;

fn text_of(message: Message) -> serde_json::Value {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn admins_are_joined_to_admin_room_on_connect() {
    let manager = WsManager::new();
    let _admin_rx = manager.add("a".into(), 1, Role::Admin).await;
    let _user_rx = manager.add("u".into(), 10, Role::User).await;

    assert_eq!(manager.connection_count().await, 2);
    assert_eq!(manager.room_size(&Room::Admins).await, 1);
}

#[tokio::test]
async fn room_messages_reach_members_only() {
    let manager = WsManager::new();
    let mut requester = manager.add("u".into(), 10, Role::User).await;
    let mut bystander = manager.add("v".into(), 11, Role::User).await;

    assert!(manager.join("u", Room::EditRequest(7)).await);
    let sent = manager
        .send_to_room(&Room::EditRequest(7), Message::Text("hello".into()))
        .await;

    assert_eq!(sent, 1);
    assert!(requester.try_recv().is_ok());
    assert!(bystander.try_recv().is_err());
}

#[tokio::test]
async fn leave_and_remove_drop_membership() {
    let manager = WsManager::new();
    let _rx = manager.add("u".into(), 10, Role::User).await;
    let room = Room::EditRequest(3);

    manager.join("u", room).await;
    assert!(manager.leave("u", &room).await);
    assert!(!manager.leave("u", &room).await);
    assert_eq!(manager.room_size(&room).await, 0);

    manager.join("u", room).await;
    manager.remove("u").await;
    assert_eq!(manager.room_size(&room).await, 0);
    assert!(!manager.join("u", room).await);
}

#[tokio::test]
async fn shutdown_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".into(), 1, Role::Admin).await;

    manager.shutdown_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn router_delivers_event_frame_to_room() {
    let manager = Arc::new(WsManager::new());
    let mut admin_rx = manager.add("a".into(), 1, Role::Admin).await;
    let router = RoomRouter::new(manager.clone());

    let event = RealtimeEvent::new(Room::Admins, EVENT_NEW_EDIT_REQUEST)
        .with_payload(json!({ "summary": "Invoice Acme Ltd" }));
    assert_eq!(router.deliver(&event).await, 1);

    let frame = text_of(admin_rx.recv().await.unwrap());
    assert_eq!(frame["room"], "admins");
    assert_eq!(frame["event"], "new-edit-request");
    assert_eq!(frame["payload"]["summary"], "Invoice Acme Ltd");
}

#[tokio::test]
async fn published_events_flow_from_bus_to_sockets() {
    let bus = Arc::new(EventBus::default());
    let manager = Arc::new(WsManager::new());
    let mut requester = manager.add("u".into(), 10, Role::User).await;
    manager.join("u", Room::EditRequest(42)).await;

    let handle = tokio::spawn(RoomRouter::new(manager.clone()).run(bus.subscribe()));

    Notifier::publish(
        &*bus,
        Room::EditRequest(42),
        EVENT_EDIT_REQUEST_UPDATE,
        json!({ "status": "APPROVED" }),
    )
    .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), requester.recv())
        .await
        .expect("frame should arrive")
        .expect("channel open");
    let frame = text_of(frame);
    assert_eq!(frame["room"], "edit-request-update-42");
    assert_eq!(frame["event"], "edit-request-update");
    assert_eq!(frame["payload"]["status"], "APPROVED");

    handle.abort();
}
