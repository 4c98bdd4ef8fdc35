//! Currency Engine Integration Tests
//!
//! Wires the real in-memory adapters to the engine and drives it the way
//! the binary does: bootstrap, chat invocations resolved through the
//! registry, lifecycle signals, and scheduler ticks. The chat side uses
//! the recording mock so the transcript can be asserted.
//!
//! All tests are deterministic (no real timers, no stdin).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use coinkeep::adapters::{parse_chat_line, InMemoryCommandRegistry, InMemoryLedger};
use coinkeep::application::{CurrencyEngine, EngineSignal, PayoutScheduler};
use coinkeep::domain::{Currency, TransactionOutcome, TransferPolicy};
use coinkeep::ports::mocks::MockChat;
use coinkeep::ports::{ChatPort, CommandRegistryPort, LedgerPort};

// ============================================================================
// Test Fixtures
// ============================================================================

fn coins() -> Currency {
    Currency {
        id: "coins".to_string(),
        name: "Coins".to_string(),
        interval: 5,
        payout: 10,
        active: true,
        bonus: HashMap::from([("Subscribers".to_string(), 5)]),
        transfer: TransferPolicy::Allow,
    }
}

fn embers() -> Currency {
    Currency {
        id: "embers".to_string(),
        name: "Embers".to_string(),
        interval: 15,
        payout: 2,
        active: true,
        bonus: HashMap::new(),
        transfer: TransferPolicy::Disallow,
    }
}

/// Seeded ledger: Moddy (online moderator), Alice (online subscriber),
/// Bob (online), Cara (offline subscriber).
async fn seeded_ledger() -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.upsert_currency(coins()).await;
    ledger.upsert_currency(embers()).await;
    ledger
        .add_user("Moddy", true, &["Moderators".to_string()])
        .await;
    ledger
        .add_user("Alice", true, &["Subscribers".to_string()])
        .await;
    ledger.add_user("Bob", true, &[]).await;
    ledger
        .add_user("Cara", false, &["Subscribers".to_string()])
        .await;
    ledger
}

struct Harness {
    ledger: Arc<InMemoryLedger>,
    chat: Arc<MockChat>,
    registry: Arc<InMemoryCommandRegistry>,
    engine: CurrencyEngine,
}

async fn harness() -> Harness {
    let ledger = seeded_ledger().await;
    let chat = Arc::new(MockChat::new());
    let registry = Arc::new(InMemoryCommandRegistry::new());
    let engine = CurrencyEngine::new(
        Arc::clone(&ledger) as Arc<dyn LedgerPort>,
        Arc::clone(&chat) as Arc<dyn ChatPort>,
        Arc::clone(&registry) as Arc<dyn CommandRegistryPort>,
    )
    // An hour-long tick keeps the bootstrapped schedule from firing
    // mid-test; payout assertions drive run_tick directly instead.
    .with_tick_period(Duration::from_secs(3600));
    Harness {
        ledger,
        chat,
        registry,
        engine,
    }
}

/// Runs one chat line through the same resolution path the binary uses.
async fn send_chat(h: &Harness, line: &str) -> Option<TransactionOutcome> {
    let invocation = parse_chat_line(line)?;
    let spec = h.registry.spec_for_trigger(&invocation.trigger).await?;
    let receipt = h
        .engine
        .handle_invocation(&spec.id, &invocation.sender, &invocation.args)
        .await;
    Some(receipt.outcome)
}

// ============================================================================
// Bootstrap and command binding
// ============================================================================

#[tokio::test]
async fn test_bootstrap_binds_all_currency_commands() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    assert!(h.registry.spec_for_trigger("!coins").await.is_some());
    assert!(h.registry.spec_for_trigger("!embers").await.is_some());
    assert_eq!(h.registry.all_specs().await.len(), 2);

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_update_signal_rebinds_renamed_trigger() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    let mut renamed = coins();
    renamed.name = "Gold Bars".to_string();
    h.ledger.upsert_currency(renamed.clone()).await;
    h.engine
        .handle_signal(EngineSignal::Currency {
            action: "update".to_string(),
            currency: renamed,
        })
        .await;

    // Old trigger gone, new one bound, still one command for the id.
    assert!(h.registry.spec_for_trigger("!coins").await.is_none());
    assert!(h.registry.spec_for_trigger("!gold-bars").await.is_some());
    assert_eq!(h.registry.all_specs().await.len(), 2);

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_delete_signal_unbinds_command() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    h.engine
        .handle_signal(EngineSignal::Currency {
            action: "delete".to_string(),
            currency: embers(),
        })
        .await;

    assert!(h.registry.spec_for_trigger("!embers").await.is_none());
    assert_eq!(h.registry.all_specs().await.len(), 1);

    // With the definition gone from the store too, the trigger resolves
    // to nothing at all.
    h.ledger.remove_currency("embers").await;
    assert_eq!(send_chat(&h, "Alice: !embers").await, None);

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_invalid_signal_action_is_ignored() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    h.engine
        .handle_signal(EngineSignal::Currency {
            action: "explode".to_string(),
            currency: coins(),
        })
        .await;

    assert_eq!(h.registry.all_specs().await.len(), 2);
    h.engine.shutdown().await;
}

// ============================================================================
// Chat command flow
// ============================================================================

#[tokio::test]
async fn test_add_then_give_through_chat_lines() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    let outcome = send_chat(&h, "Moddy: !coins add @Alice 100").await;
    assert_eq!(outcome, Some(TransactionOutcome::Success));

    let outcome = send_chat(&h, "Alice: !coins give @Bob 30").await;
    assert_eq!(outcome, Some(TransactionOutcome::Success));

    assert_eq!(h.ledger.balance("Alice", "coins").await, Ok(70));
    assert_eq!(h.ledger.balance("Bob", "coins").await, Ok(30));

    assert_eq!(
        h.chat.get_sent(),
        vec![
            (
                "Added 100 Coins to Alice.".to_string(),
                Some("Moddy".to_string())
            ),
            (
                "Gave 30 Coins to Bob.".to_string(),
                Some("Alice".to_string())
            ),
        ]
    );

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_balance_inquiry_on_bare_trigger() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    send_chat(&h, "Moddy: !coins add Bob 12").await;
    let outcome = send_chat(&h, "Bob: !coins").await;

    assert_eq!(outcome, Some(TransactionOutcome::Success));
    assert_eq!(
        h.chat.get_sent().last().unwrap(),
        &(
            "Bob's Coins total is 12.".to_string(),
            Some("Bob".to_string())
        )
    );

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_give_denied_for_no_transfer_currency() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    send_chat(&h, "Moddy: !embers add Alice 50").await;
    let outcome = send_chat(&h, "Alice: !embers give Bob 10").await;

    assert_eq!(outcome, Some(TransactionOutcome::TransferDisallowed));
    assert_eq!(h.ledger.balance("Alice", "embers").await, Ok(50));
    assert_eq!(h.ledger.balance("Bob", "embers").await, Ok(0));

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_give_to_unknown_user_leaves_sender_untouched() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    send_chat(&h, "Moddy: !coins add Alice 100").await;
    let outcome = send_chat(&h, "Alice: !coins give @Nobody 30").await;

    assert_eq!(outcome, Some(TransactionOutcome::TargetUnresolvable));
    assert_eq!(h.ledger.balance("Alice", "coins").await, Ok(100));
    assert_eq!(
        h.chat.get_sent().last().unwrap().0,
        "Error: Could not add currency to user. Was there a typo in the username?"
    );

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_giveall_broadcasts_and_credits_online_users() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    let outcome = send_chat(&h, "Moddy: !coins giveall 25").await;
    assert_eq!(outcome, Some(TransactionOutcome::Success));

    for online in ["Moddy", "Alice", "Bob"] {
        assert_eq!(h.ledger.balance(online, "coins").await, Ok(25));
    }
    // Cara is offline and gets nothing.
    assert_eq!(h.ledger.balance("Cara", "coins").await, Ok(0));

    assert_eq!(
        h.chat.get_sent().last().unwrap(),
        &("Added 25 Coins to everyone!".to_string(), None)
    );

    h.engine.shutdown().await;
}

#[tokio::test]
async fn test_unknown_subcommand_gets_usage_line() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    let outcome = send_chat(&h, "Alice: !coins lend Bob 5").await;
    assert_eq!(outcome, Some(TransactionOutcome::StoreError));
    assert_eq!(
        h.chat.get_sent().last().unwrap().0,
        "Invalid command. Usage: !coins [add | remove | give | giveall | removeall]"
    );

    h.engine.shutdown().await;
}

// ============================================================================
// Payout ticks against the real ledger
// ============================================================================

#[tokio::test]
async fn test_payout_tick_credits_base_plus_bonus() {
    let ledger = seeded_ledger().await;
    let scheduler = PayoutScheduler::new(Arc::clone(&ledger) as Arc<dyn LedgerPort>);

    // Minute 30: coins (interval 5) and embers (interval 15) are both due.
    scheduler.run_tick(30).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Alice is an online subscriber: base 10 + bonus 5.
    assert_eq!(ledger.balance("Alice", "coins").await, Ok(15));
    // Bob is online with no bonus group: base only.
    assert_eq!(ledger.balance("Bob", "coins").await, Ok(10));
    // Cara is an offline subscriber: nothing.
    assert_eq!(ledger.balance("Cara", "coins").await, Ok(0));
    // Embers pays its own base to everyone online.
    assert_eq!(ledger.balance("Bob", "embers").await, Ok(2));
}

#[tokio::test]
async fn test_payout_tick_skips_off_interval_minute() {
    let ledger = seeded_ledger().await;
    let scheduler = PayoutScheduler::new(Arc::clone(&ledger) as Arc<dyn LedgerPort>);

    // Minute 10: coins due, embers (interval 15) not.
    scheduler.run_tick(10).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ledger.balance("Bob", "coins").await, Ok(10));
    assert_eq!(ledger.balance("Bob", "embers").await, Ok(0));
}

#[tokio::test]
async fn test_inactive_currency_never_pays() {
    let ledger = seeded_ledger().await;
    let mut dormant = coins();
    dormant.active = false;
    ledger.upsert_currency(dormant).await;
    let scheduler = PayoutScheduler::new(Arc::clone(&ledger) as Arc<dyn LedgerPort>);

    scheduler.run_tick(0).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ledger.balance("Bob", "coins").await, Ok(0));
    // The other currency still pays on its own schedule.
    assert_eq!(ledger.balance("Bob", "embers").await, Ok(2));
}

#[tokio::test]
async fn test_payout_and_command_adjust_same_user() {
    let h = harness().await;
    h.engine.bootstrap().await.unwrap();

    let scheduler = PayoutScheduler::new(Arc::clone(&h.ledger) as Arc<dyn LedgerPort>);
    scheduler.run_tick(30).await;
    send_chat(&h, "Moddy: !coins add Bob 7").await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Both adjustments land; the store's adjust is atomic.
    assert_eq!(h.ledger.balance("Bob", "coins").await, Ok(17));

    h.engine.shutdown().await;
}
