//! End-to-end behavior of the conversation controller against mock
//! collaborators.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{LocalId, Message, MessageStatus};
use chrono::Utc;
use conversation::{
    Conversation, ConversationConfig, ConversationError, RemoteInsert, SendReceipt, SlotOutcome,
    DEFAULT_CONNECTIVITY_ERROR, DEFAULT_FALLBACK, DEFAULT_PLACEHOLDER,
};
use mock_services::{
    DelayedReply, EchoReply, FailingReply, FixedReply, GatedReply, MemoryStore, MessageStore,
    NewMessage, OwnerId, PersistingReply, ReplyService, Sender, StoredMessage,
};

fn alice() -> OwnerId {
    OwnerId::parse("alice").unwrap()
}

fn bob() -> OwnerId {
    OwnerId::parse("bob").unwrap()
}

async fn loaded<R: ReplyService + 'static>(
    store: Arc<MemoryStore>,
    replies: R,
    config: ConversationConfig,
) -> Conversation<MemoryStore, R> {
    let chat = Conversation::new(store, Arc::new(replies), config);
    chat.load_history(&alice()).await;
    chat
}

fn summary(messages: &[Message]) -> Vec<(Sender, String, MessageStatus)> {
    messages
        .iter()
        .map(|m| (m.sender, m.content.clone(), m.status))
        .collect()
}

fn bot_row(content: &str, client_ref: Option<String>) -> StoredMessage {
    StoredMessage {
        id: format!("pushed-{content}"),
        owner: alice(),
        sender: Sender::Bot,
        content: content.to_string(),
        created_at: Utc::now(),
        client_ref,
    }
}

/// Local id of the bot slot opened by the send of `user_text`.
fn slot_after(messages: &[Message], user_text: &str) -> LocalId {
    messages
        .windows(2)
        .find(|w| w[0].sender == Sender::User && w[0].content == user_text)
        .map(|w| w[1].local_id)
        .unwrap()
}

fn content_of(messages: &[Message], id: LocalId) -> &str {
    messages
        .iter()
        .find(|m| m.local_id == id)
        .map(|m| m.content.as_str())
        .unwrap()
}

/// Start `texts` as concurrent sends against a gated reply service and wait
/// until every one of them has its placeholder open.
async fn gated_sends(
    chat: &Conversation<MemoryStore, GatedReply<EchoReply>>,
    texts: &[&'static str],
) -> Vec<tokio::task::JoinHandle<Result<SendReceipt, ConversationError>>> {
    let sends = texts
        .iter()
        .map(|text| {
            let chat = chat.clone();
            let text = *text;
            tokio::spawn(async move { chat.send(&alice(), text).await })
        })
        .collect();
    let expected = texts.len();
    eventually(chat, move |m| m.iter().filter(|m| m.is_pending()).count() == expected).await;
    sends
}

/// Poll until `check` holds or a second passes.
async fn eventually<F>(chat: &Conversation<MemoryStore, impl ReplyService + 'static>, check: F)
where
    F: Fn(&[Message]) -> bool,
{
    for _ in 0..100 {
        if check(&chat.messages().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached: {:?}", chat.messages().await);
}

// ============================================================================
// send
// ============================================================================

#[tokio::test]
async fn test_send_hello_gets_reply() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store.clone(), FixedReply::new("hi there"), ConversationConfig::default()).await;

    let receipt = chat.send(&alice(), "hello").await.unwrap();
    assert_eq!(receipt.outcome, SlotOutcome::Applied);

    let messages = chat.messages().await;
    assert_eq!(
        summary(&messages),
        vec![
            (Sender::User, "hello".to_string(), MessageStatus::Confirmed),
            (Sender::Bot, "hi there".to_string(), MessageStatus::Confirmed),
        ]
    );

    // The user message was persisted and its durable id swapped in place.
    let rows = store.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(messages[0].durable_id.as_deref(), Some(rows[0].id.as_str()));
    assert_eq!(messages[0].local_id, receipt.user);
    assert_eq!(rows[0].client_ref, Some(receipt.user.to_string()));
}

#[tokio::test]
async fn test_send_timeout_fails_slot() {
    let store = Arc::new(MemoryStore::new());
    let config = ConversationConfig::default().with_reply_timeout(Duration::from_millis(50));
    let chat = loaded(store, DelayedReply::with_millis(FixedReply::new("late"), 1000), config).await;

    chat.send(&alice(), "hello").await.unwrap();

    assert_eq!(
        summary(&chat.messages().await),
        vec![
            (Sender::User, "hello".to_string(), MessageStatus::Confirmed),
            (
                Sender::Bot,
                DEFAULT_CONNECTIVITY_ERROR.to_string(),
                MessageStatus::Failed
            ),
        ]
    );
}

#[tokio::test]
async fn test_error_status_fails_slot() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, FailingReply::status(502), ConversationConfig::default()).await;

    let receipt = chat.send(&alice(), "hello").await.unwrap();
    assert_eq!(receipt.resolution.status, MessageStatus::Failed);
    assert_eq!(receipt.resolution.content, DEFAULT_CONNECTIVITY_ERROR);
}

#[tokio::test]
async fn test_malformed_reply_uses_fallback() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, FailingReply::malformed(), ConversationConfig::default()).await;

    chat.send(&alice(), "hello").await.unwrap();

    let messages = chat.messages().await;
    assert_eq!(messages[1].content, DEFAULT_FALLBACK);
    assert_eq!(messages[1].status, MessageStatus::Confirmed);
}

#[tokio::test]
async fn test_blank_reply_uses_fallback() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, FixedReply::new("  "), ConversationConfig::default()).await;

    chat.send(&alice(), "hello").await.unwrap();
    assert_eq!(chat.messages().await[1].content, DEFAULT_FALLBACK);
}

#[tokio::test]
async fn test_persist_failure_keeps_user_message() {
    let store = Arc::new(MemoryStore::new());
    store.fail_insert(true);
    let chat = loaded(store.clone(), EchoReply::new(), ConversationConfig::default()).await;

    chat.send(&alice(), "hello").await.unwrap();

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hello");
    assert!(messages[0].durable_id.is_none());
    assert!(store.rows().await.is_empty());
}

#[tokio::test]
async fn test_send_rejects_empty_and_unknown_owner() {
    let store = Arc::new(MemoryStore::new());
    let chat = Conversation::with_defaults(store, Arc::new(EchoReply::new()));

    assert!(matches!(
        chat.send(&alice(), "hello").await,
        Err(ConversationError::NoActiveOwner)
    ));

    chat.load_history(&alice()).await;
    assert!(matches!(
        chat.send(&alice(), "   ").await,
        Err(ConversationError::EmptyContent)
    ));
    assert!(matches!(
        chat.send(&bob(), "hello").await,
        Err(ConversationError::OwnerMismatch { .. })
    ));
    assert!(chat.messages().await.is_empty());
}

#[tokio::test]
async fn test_placeholder_visible_while_pending() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(FixedReply::new("hi there")));
    let chat = Conversation::with_defaults(store, replies.clone());
    chat.load_history(&alice()).await;

    let task = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send(&alice(), "hello").await })
    };
    replies.wait_for_request().await;

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, DEFAULT_PLACEHOLDER);
    assert_eq!(messages[1].status, MessageStatus::Pending);
    assert_eq!(chat.pending_replies().await, 1);

    replies.release();
    task.await.unwrap().unwrap();
    assert_eq!(chat.pending_replies().await, 0);
    assert_eq!(chat.messages().await[1].content, "hi there");
}

#[tokio::test]
async fn test_every_send_keeps_its_user_message() {
    let store = Arc::new(MemoryStore::new());
    let config = ConversationConfig::default().with_reply_timeout(Duration::from_millis(30));
    let chat = loaded(
        store,
        DelayedReply::with_millis(EchoReply::new(), 60),
        config,
    )
    .await;

    let sends: Vec<_> = (0..5)
        .map(|i| {
            let chat = chat.clone();
            tokio::spawn(async move { chat.send(&alice(), &format!("msg {i}")).await })
        })
        .collect();
    for send in sends {
        send.await.unwrap().unwrap();
    }

    let messages = chat.messages().await;
    let users = messages.iter().filter(|m| m.sender == Sender::User).count();
    let bots = messages.iter().filter(|m| m.sender == Sender::Bot).count();
    assert_eq!(users, 5);
    assert_eq!(bots, 5);
    assert!(messages.iter().all(|m| m.status == MessageStatus::Failed || m.sender == Sender::User));
}

#[tokio::test]
async fn test_serialized_sends_reject_while_pending() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(FixedReply::new("ok")));
    let chat = Conversation::new(store, replies.clone(), ConversationConfig::default().serialized());
    chat.load_history(&alice()).await;

    let first = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send(&alice(), "one").await })
    };
    replies.wait_for_request().await;

    assert!(matches!(
        chat.send(&alice(), "two").await,
        Err(ConversationError::SendInFlight)
    ));

    replies.release();
    first.await.unwrap().unwrap();

    replies.release();
    chat.send(&alice(), "two").await.unwrap();
    assert_eq!(chat.messages().await.len(), 4);
}

// ============================================================================
// reconciliation with pushes
// ============================================================================

#[tokio::test]
async fn test_push_before_reply_wins() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(FixedReply::new("hi there")));
    let chat = Conversation::with_defaults(store, replies.clone());
    chat.load_history(&alice()).await;

    let task = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send(&alice(), "hello").await })
    };
    replies.wait_for_request().await;

    let slot = chat.messages().await[1].local_id;
    let result = chat
        .on_remote_insert(bot_row("from the workflow", Some(slot.to_string())))
        .await;
    assert_eq!(result, RemoteInsert::FilledSlot(slot));

    replies.release();
    let receipt = task.await.unwrap().unwrap();
    assert_eq!(receipt.outcome, SlotOutcome::SupersededByPush);

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "from the workflow");
    assert_eq!(messages[1].durable_id.as_deref(), Some("pushed-from the workflow"));
}

#[tokio::test]
async fn test_push_after_reply_overwrites_slot() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, FixedReply::new("hi there"), ConversationConfig::default()).await;

    let receipt = chat.send(&alice(), "hello").await.unwrap();
    assert_eq!(chat.messages().await[1].content, "hi there");

    let pushed = bot_row("stored reply", Some(receipt.slot.to_string()));
    let result = chat.on_remote_insert(pushed).await;
    assert_eq!(result, RemoteInsert::FilledSlot(receipt.slot));

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "stored reply");
    assert_eq!(messages[1].durable_id.as_deref(), Some("pushed-stored reply"));
}

#[tokio::test]
async fn test_unrelated_push_after_reply_is_appended() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, FixedReply::new("hi there"), ConversationConfig::default()).await;
    chat.send(&alice(), "hello").await.unwrap();

    let result = chat.on_remote_insert(bot_row("reply typed on phone", None)).await;
    assert!(matches!(result, RemoteInsert::Appended(_)));

    let contents: Vec<_> = chat.messages().await.into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["hello", "hi there", "reply typed on phone"]);
}

#[tokio::test]
async fn test_push_after_timeout_replaces_failure() {
    let store = Arc::new(MemoryStore::new());
    let config = ConversationConfig::default().with_reply_timeout(Duration::from_millis(20));
    let chat = loaded(store, DelayedReply::with_millis(FixedReply::new("late"), 500), config).await;

    let receipt = chat.send(&alice(), "hello").await.unwrap();
    assert_eq!(receipt.resolution.status, MessageStatus::Failed);

    let pushed = bot_row("answered anyway", Some(receipt.slot.to_string()));
    assert_eq!(chat.on_remote_insert(pushed).await, RemoteInsert::FilledSlot(receipt.slot));

    assert_eq!(
        summary(&chat.messages().await),
        vec![
            (Sender::User, "hello".to_string(), MessageStatus::Confirmed),
            (Sender::Bot, "answered anyway".to_string(), MessageStatus::Confirmed),
        ]
    );
}

#[tokio::test]
async fn test_remote_insert_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, EchoReply::new(), ConversationConfig::default()).await;

    let row = bot_row("reminder", None);
    assert!(matches!(chat.on_remote_insert(row.clone()).await, RemoteInsert::Appended(_)));
    let before = chat.messages().await;

    assert_eq!(chat.on_remote_insert(row).await, RemoteInsert::Duplicate);
    assert_eq!(chat.messages().await, before);
}

#[tokio::test]
async fn test_listener_reconciles_persisting_webhook() {
    let store = Arc::new(MemoryStore::new());
    let replies = PersistingReply::new(EchoReply::with_prefix("You said: "), store.clone());
    let chat = loaded(store.clone(), replies, ConversationConfig::default()).await;
    let listener = chat.spawn_push_listener().await.unwrap();

    chat.send(&alice(), "hello").await.unwrap();

    eventually(&chat, |messages| {
        messages.len() == 2 && messages.iter().all(|m| m.durable_id.is_some())
    })
    .await;

    let messages = chat.messages().await;
    assert_eq!(messages[1].content, "You said: hello");
    assert_eq!(store.rows().await.len(), 2);

    // Reloading shows the same transcript.
    chat.load_history(&alice()).await;
    assert_eq!(
        summary(&chat.messages().await),
        summary(&messages),
    );
    listener.abort();
}

#[tokio::test]
async fn test_concurrent_sends_with_crossed_pushes() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(EchoReply::new()));
    let chat = Conversation::with_defaults(store.clone(), replies.clone());
    chat.load_history(&alice()).await;
    let listener = chat.spawn_push_listener().await.unwrap();

    let sends = gated_sends(&chat, &["one", "two"]).await;
    let messages = chat.messages().await;
    let slot_one = slot_after(&messages, "one");
    let slot_two = slot_after(&messages, "two");

    // Pushes arrive in the opposite order of the sends, before either reply.
    store.push(bot_row("answer two", Some(slot_two.to_string())));
    store.push(bot_row("answer one", Some(slot_one.to_string())));
    eventually(&chat, |m| m.iter().all(|m| !m.is_pending())).await;

    replies.release();
    replies.release();
    for send in sends {
        let receipt = send.await.unwrap().unwrap();
        assert_eq!(receipt.outcome, SlotOutcome::SupersededByPush);
    }

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(content_of(&messages, slot_one), "answer one");
    assert_eq!(content_of(&messages, slot_two), "answer two");
    listener.abort();
}

#[tokio::test]
async fn test_crossed_pushes_after_replies_overwrite_own_slots() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(EchoReply::new()));
    let chat = Conversation::with_defaults(store.clone(), replies.clone());
    chat.load_history(&alice()).await;
    let listener = chat.spawn_push_listener().await.unwrap();

    let sends = gated_sends(&chat, &["one", "two"]).await;
    replies.release();
    replies.release();
    for send in sends {
        assert_eq!(send.await.unwrap().unwrap().outcome, SlotOutcome::Applied);
    }

    let messages = chat.messages().await;
    let slot_one = slot_after(&messages, "one");
    let slot_two = slot_after(&messages, "two");
    assert_eq!(content_of(&messages, slot_one), "one");

    store.push(bot_row("stored two", Some(slot_two.to_string())));
    store.push(bot_row("stored one", Some(slot_one.to_string())));
    eventually(&chat, |m| m.iter().all(|m| m.durable_id.is_some())).await;

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(content_of(&messages, slot_one), "stored one");
    assert_eq!(content_of(&messages, slot_two), "stored two");
    listener.abort();
}

#[tokio::test]
async fn test_followup_row_does_not_steal_other_slot() {
    let store = Arc::new(MemoryStore::new());
    let replies = Arc::new(GatedReply::new(EchoReply::new()));
    let chat = Conversation::with_defaults(store.clone(), replies.clone());
    chat.load_history(&alice()).await;
    let listener = chat.spawn_push_listener().await.unwrap();

    let sends = gated_sends(&chat, &["one", "two"]).await;
    let messages = chat.messages().await;
    let slot_one = slot_after(&messages, "one");
    let slot_two = slot_after(&messages, "two");

    store.push(bot_row("answer one", Some(slot_one.to_string())));
    store.push(bot_row("one followup", Some(slot_one.to_string())));
    eventually(&chat, |m| m.len() == 5).await;
    assert!(chat
        .messages()
        .await
        .iter()
        .any(|m| m.local_id == slot_two && m.is_pending()));

    store.push(bot_row("answer two", Some(slot_two.to_string())));
    eventually(&chat, |m| m.iter().all(|m| !m.is_pending())).await;

    replies.release();
    replies.release();
    for send in sends {
        send.await.unwrap().unwrap();
    }

    let messages = chat.messages().await;
    assert_eq!(messages.len(), 5);
    assert_eq!(content_of(&messages, slot_one), "answer one");
    assert_eq!(content_of(&messages, slot_two), "answer two");
    assert_eq!(messages.last().unwrap().content, "one followup");
    listener.abort();
}

#[tokio::test]
async fn test_slow_store_does_not_hold_reply() {
    let store = Arc::new(MemoryStore::new());
    store.set_insert_delay(Duration::from_secs(3));
    let chat = loaded(store, FixedReply::new("hi there"), ConversationConfig::default()).await;

    let task = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send(&alice(), "hello").await })
    };

    eventually(&chat, |m| m.len() == 2 && m[1].content == "hi there").await;
    let messages = chat.messages().await;
    assert_eq!(messages[1].status, MessageStatus::Confirmed);
    assert!(messages[0].durable_id.is_none());
    assert_eq!(chat.pending_replies().await, 0);
    task.abort();
}

#[tokio::test]
async fn test_listener_appends_rows_from_other_sessions() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store.clone(), EchoReply::new(), ConversationConfig::default()).await;
    let listener = chat.spawn_push_listener().await.unwrap();

    store.insert(NewMessage::user(alice(), "typed on phone")).await.unwrap();
    store.insert(NewMessage::user(bob(), "someone else")).await.unwrap();

    eventually(&chat, |messages| messages.len() == 1).await;
    assert_eq!(chat.messages().await[0].content, "typed on phone");
    listener.abort();
}

#[tokio::test]
async fn test_listener_requires_owner() {
    let store = Arc::new(MemoryStore::new());
    let chat = Conversation::with_defaults(store, Arc::new(EchoReply::new()));
    assert!(matches!(
        chat.spawn_push_listener().await,
        Err(ConversationError::NoActiveOwner)
    ));
}

// ============================================================================
// history and clear
// ============================================================================

#[tokio::test]
async fn test_load_history_sorted() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store
        .seed(NewMessage::bot(alice(), "second").at(now))
        .await;
    store
        .seed(NewMessage::user(alice(), "first").at(now - chrono::Duration::seconds(10)))
        .await;
    store.seed(NewMessage::user(bob(), "other owner")).await;

    let chat = Conversation::with_defaults(store, Arc::new(EchoReply::new()));
    assert_eq!(chat.load_history(&alice()).await, 2);

    let messages = chat.messages().await;
    assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    assert_eq!(messages[0].content, "first");
}

#[tokio::test]
async fn test_load_failure_is_silent_and_empty() {
    let store = Arc::new(MemoryStore::new());
    store.seed(NewMessage::user(alice(), "hidden")).await;
    store.fail_select(true);

    let chat = Conversation::with_defaults(store, Arc::new(EchoReply::new()));
    assert_eq!(chat.load_history(&alice()).await, 0);
    assert!(chat.messages().await.is_empty());
    assert_eq!(chat.owner().await, Some(alice()));
}

#[tokio::test]
async fn test_switching_owner_discards_transcript() {
    let store = Arc::new(MemoryStore::new());
    store.seed(NewMessage::user(bob(), "bob's note")).await;
    let chat = loaded(store, EchoReply::new(), ConversationConfig::default()).await;
    chat.send(&alice(), "alice's note").await.unwrap();

    chat.load_history(&bob()).await;
    let messages = chat.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "bob's note");
    assert!(messages.iter().all(|m| m.owner == bob()));
}

#[tokio::test]
async fn test_clear_then_load_is_empty() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store.clone(), EchoReply::new(), ConversationConfig::default()).await;
    chat.send(&alice(), "hello").await.unwrap();

    assert_eq!(chat.clear(&alice()).await.unwrap(), 1);
    assert!(chat.messages().await.is_empty());

    chat.load_history(&alice()).await;
    assert!(chat.messages().await.is_empty());
}

#[tokio::test]
async fn test_clear_failure_keeps_transcript() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store.clone(), EchoReply::new(), ConversationConfig::default()).await;
    chat.send(&alice(), "hello").await.unwrap();
    store.fail_delete(true);

    let err = chat.clear(&alice()).await.unwrap_err();
    assert!(matches!(err, ConversationError::Store(_)));
    assert_eq!(chat.messages().await.len(), 2);
    assert_eq!(store.rows().await.len(), 1);
}

#[tokio::test]
async fn test_close_drops_owner() {
    let store = Arc::new(MemoryStore::new());
    let chat = loaded(store, EchoReply::new(), ConversationConfig::default()).await;
    chat.send(&alice(), "hello").await.unwrap();

    chat.close().await;
    assert!(chat.owner().await.is_none());
    assert!(chat.messages().await.is_empty());
}
