//! Conversation window and registry behavior

use std::sync::Arc;

use uuid::Uuid;

use arca_gateway::conversation::{ConversationWindow, Role};
use arca_gateway::{Error, SessionRegistry};

#[test]
fn window_trims_to_bound_keeping_system_and_recent() {
    let mut window = ConversationWindow::new(None, Some(5), Some("Eres un asistente."));

    for i in 0..8 {
        window.append_user(&format!("pregunta {i}")).unwrap();
        window.append_assistant(&format!("respuesta {i}")).unwrap();
    }

    let view = window.for_model();
    assert_eq!(view.len(), 5);
    assert_eq!(view[0].role, Role::System);
    assert_eq!(view[0].content, "Eres un asistente.");
    assert_eq!(view.last().unwrap().content, "respuesta 7");
    // the four most recent non-system messages survive
    assert_eq!(view[1].content, "respuesta 6");
}

#[test]
fn bound_below_system_count_keeps_only_system() {
    let mut window = ConversationWindow::new(None, Some(1), Some("pinned"));
    window.append_user("hola").unwrap();
    window.append_assistant("buenas").unwrap();

    let view = window.for_model();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].role, Role::System);
}

#[test]
fn unbounded_window_never_trims() {
    let mut window = ConversationWindow::new(None, None, Some("pinned"));
    for i in 0..100 {
        window.append_user(&format!("m{i}")).unwrap();
    }
    assert_eq!(window.message_count(), 101);
}

#[test]
fn unbounded_window_retains_full_context() {
    let mut window = ConversationWindow::new(None, None, None);
    window.append_user("Hola, me llamo Adrian").unwrap();
    window.append_assistant("Hola Adrian!").unwrap();
    window.append_user("Recuerdas mi nombre?").unwrap();

    let view = window.for_model();
    // default system prompt plus the three turns
    assert_eq!(view.len(), 4);
    assert!(view.iter().any(|m| m.content.contains("Adrian")));
}

#[test]
fn inactive_window_rejects_appends_without_mutation() {
    let mut window = ConversationWindow::new(None, None, Some("pinned"));
    window.append_user("hola").unwrap();
    let before = window.message_count();

    window.deactivate();
    let err = window.append_user("ignorado").unwrap_err();
    assert!(matches!(err, Error::InactiveConversation(_)));
    assert_eq!(window.message_count(), before);

    window.reactivate();
    window.append_user("de vuelta").unwrap();
    assert_eq!(window.message_count(), before + 1);
}

#[test]
fn inactivity_is_checked_before_content() {
    let mut window = ConversationWindow::new(None, None, Some("pinned"));
    window.deactivate();

    // blank content on an inactive window reports inactivity, not validation
    let err = window.append_user("   ").unwrap_err();
    assert!(matches!(err, Error::InactiveConversation(_)));
}

#[tokio::test]
async fn get_or_create_returns_same_window_with_visible_appends() {
    let registry = SessionRegistry::new(None);
    let id = Uuid::new_v4();

    let first = registry.get_or_create(id, None).await;
    first.lock().await.append_user("primer turno").unwrap();

    let second = registry.get_or_create(id, None).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        second.lock().await.last_user_message().unwrap().content(),
        "primer turno"
    );
}

#[tokio::test]
async fn sessions_are_isolated() {
    let registry = SessionRegistry::new(None);
    let a = registry.create(None, Some("prompt a")).await;
    let b = registry.create(None, Some("prompt b")).await;

    a.lock().await.append_user("solo en a").unwrap();

    assert!(b.lock().await.last_user_message().is_none());
    assert_eq!(registry.count().await, 2);
}

#[tokio::test]
async fn create_with_same_id_replaces_history() {
    let registry = SessionRegistry::new(None);
    let id = Uuid::new_v4();

    let first = registry.create(Some(id), None).await;
    first.lock().await.append_user("historia vieja").unwrap();

    let second = registry.create(Some(id), None).await;
    assert!(second.lock().await.last_user_message().is_none());
    assert_eq!(registry.count().await, 1);
}

#[tokio::test]
async fn append_helpers_require_existing_session() {
    let registry = SessionRegistry::new(None);
    let id = Uuid::new_v4();

    let err = registry.append_user_message(id, "hola").await.unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(got) if got == id));

    let err = registry
        .append_assistant_message(id, "hola")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(got) if got == id));
}

#[tokio::test]
async fn sweep_removes_only_deactivated_windows() {
    let registry = SessionRegistry::new(None);
    let keep = registry.create(None, None).await;
    let stale = registry.create(None, None).await;
    let stale_id = stale.lock().await.session_id();

    stale.lock().await.deactivate();

    let removed = registry.sweep_inactive().await;
    assert_eq!(removed, 1);
    assert_eq!(registry.count().await, 1);
    assert!(registry.get(stale_id).await.is_none());
    assert!(keep.lock().await.is_active());
}

#[test]
fn display_projection_round_trips_through_json() {
    let mut window = ConversationWindow::new(None, None, Some("Eres un asistente."));
    window.append_user("hola").unwrap();
    window.append_assistant("buenas").unwrap();

    let json = serde_json::to_string(&window.for_display()).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0]["role"], "system");
    assert_eq!(parsed[1]["role"], "user");
    assert_eq!(parsed[2]["content"], "buenas");
    // timestamps serialize as RFC 3339
    assert!(parsed[1]["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn clear_keep_system_preserves_pinned_messages() {
    let mut window = ConversationWindow::new(None, None, Some("pinned"));
    window.append_user("hola").unwrap();
    window.append_assistant("buenas").unwrap();

    window.clear(true);
    assert_eq!(window.message_count(), 1);
    assert_eq!(window.for_model()[0].role, Role::System);

    window.append_user("otra vez").unwrap();
    window.clear(false);
    assert_eq!(window.message_count(), 0);
}
