//! Integration tests for event dispatch.
//!
//! Drives [`App::dispatch`] end to end with [`MemoryStorage`] and
//! [`RecordingTransport`]:
//! - context-scoped command resolution
//! - authority and usage gating
//! - argument count checks
//! - atomic usage consumption under concurrency

use herald_command::{CommandConfigPatch, Flow, Invocation, Transport};
use herald_event::Meta;
use herald_hook::testing::MockHook;
use herald_hook::HookPoint;
use herald_runtime::{App, Dispatch, MemoryStorage, Outcome, RecordingTransport, Rejection, Storage};
use herald_types::{Context, Identity, IdentityKind, UserRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

// =============================================================================
// Test Fixtures
// =============================================================================

struct Bot {
    app: App,
    storage: Arc<MemoryStorage>,
    transport: Arc<RecordingTransport>,
    runs: Arc<AtomicUsize>,
}

impl Bot {
    fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new(1));
        let transport = Arc::new(RecordingTransport::new());
        let app = App::builder(Arc::clone(&transport) as Arc<dyn Transport>)
            .with_storage(Arc::clone(&storage) as Arc<dyn Storage>)
            .build()
            .expect("should build app");
        Self {
            app,
            storage,
            transport,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers `def` with an action that counts runs and replies "ok".
    fn command(&self, ctx: &Context, def: &str, patch: CommandConfigPatch) {
        let runs = Arc::clone(&self.runs);
        self.app
            .commands()
            .command_with(ctx, def, patch)
            .expect("should register command")
            .action(move |inv: Invocation| {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    inv.reply("ok").await?;
                    anyhow::Ok(Flow::Handled)
                }
            });
    }

    fn user(&self, id: u64, authority: u32) {
        self.storage.insert_user(UserRecord::new(id, authority));
    }

    async fn send(&self, meta: Meta) -> Dispatch {
        self.app.dispatch(meta).await.expect("should dispatch")
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

fn outcome(dispatch: &Dispatch) -> Option<&Outcome> {
    match dispatch {
        Dispatch::Command { outcome, .. } => Some(outcome),
        _ => None,
    }
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn subcommand_scoped_to_parent_group() {
    let bot = Bot::new();
    let group_100 = Context::only(IdentityKind::Group, [100]);
    bot.command(&group_100, "foo", CommandConfigPatch::new());
    bot.command(&Context::all(), "foo.bar", CommandConfigPatch::new());

    let result = bot.send(Meta::group_message(200, 1, "!foo/bar")).await;
    assert!(matches!(result, Dispatch::Unhandled));
    assert_eq!(bot.runs(), 0);

    let result = bot.send(Meta::group_message(100, 1, "!foo/bar")).await;
    assert!(matches!(
        result,
        Dispatch::Command { ref name, outcome: Outcome::Executed(Flow::Handled) } if name == "foo.bar"
    ));
    assert_eq!(bot.runs(), 1);
    assert_eq!(bot.transport.sent_to(Identity::group(100)), vec!["ok"]);
}

#[tokio::test]
async fn disabled_command_is_not_resolved() {
    let bot = Bot::new();
    bot.command(
        &Context::all(),
        "ping",
        CommandConfigPatch::new().disable(|meta| meta.user_id == Some(13)),
    );

    let result = bot.send(Meta::private_message(13, "ping")).await;
    assert!(matches!(result, Dispatch::Unhandled));
    let result = bot.send(Meta::private_message(14, "ping")).await;
    assert!(outcome(&result).is_some());
}

#[tokio::test]
async fn aliases_resolve_case_insensitively() {
    let bot = Bot::new();
    bot.command(&Context::all(), "status", CommandConfigPatch::new());
    bot.app
        .commands()
        .command(&Context::all(), "status")
        .expect("should reopen command")
        .alias("St")
        .expect("should add alias");

    bot.send(Meta::private_message(1, "ST")).await;
    assert_eq!(bot.runs(), 1);
}

// =============================================================================
// Gating
// =============================================================================

#[tokio::test]
async fn max_usage_two_rejects_third_call() {
    let bot = Bot::new();
    bot.command(&Context::all(), "draw", CommandConfigPatch::new().max_usage(2));

    for _ in 0..2 {
        let result = bot.send(Meta::private_message(5, "draw")).await;
        assert_eq!(outcome(&result), Some(&Outcome::Executed(Flow::Handled)));
    }
    let result = bot.send(Meta::private_message(5, "draw")).await;
    assert_eq!(outcome(&result), Some(&Outcome::Rejected(Rejection::UsageExhausted)));
    assert_eq!(bot.runs(), 2);

    let hints = bot.transport.sent_to(Identity::user(5));
    assert_eq!(hints.last().map(String::as_str), Some("usage limit reached for today"));
}

#[tokio::test]
async fn authority_three_threshold() {
    let bot = Bot::new();
    bot.command(&Context::all(), "kick", CommandConfigPatch::new().authority(3));
    bot.user(2, 2);
    bot.user(3, 3);

    let low = bot.send(Meta::private_message(2, "kick")).await;
    assert_eq!(outcome(&low), Some(&Outcome::Rejected(Rejection::LowAuthority)));

    let enough = bot.send(Meta::private_message(3, "kick")).await;
    assert_eq!(outcome(&enough), Some(&Outcome::Executed(Flow::Handled)));
}

#[tokio::test]
async fn check_arg_count_with_one_required_argument() {
    let bot = Bot::new();
    bot.command(
        &Context::all(),
        "greet <name>",
        CommandConfigPatch::new().check_arg_count(true),
    );

    let none = bot.send(Meta::private_message(1, "greet")).await;
    assert_eq!(
        outcome(&none),
        Some(&Outcome::Rejected(Rejection::InsufficientArguments))
    );

    let one = bot.send(Meta::private_message(1, "greet alice")).await;
    assert_eq!(outcome(&one), Some(&Outcome::Executed(Flow::Handled)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_consume_usage_once() {
    let bot = Bot::new();
    bot.command(&Context::all(), "claim", CommandConfigPatch::new().max_usage(1));

    let mut set = JoinSet::new();
    for _ in 0..16 {
        let app = bot.app.clone();
        set.spawn(async move { app.dispatch(Meta::private_message(9, "claim")).await });
    }

    let mut executed = 0;
    let mut exhausted = 0;
    while let Some(joined) = set.join_next().await {
        let dispatch = joined.expect("task should finish").expect("should dispatch");
        match outcome(&dispatch) {
            Some(Outcome::Executed(Flow::Handled)) => executed += 1,
            Some(Outcome::Rejected(Rejection::UsageExhausted)) => exhausted += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(executed, 1);
    assert_eq!(exhausted, 15);
    assert_eq!(bot.runs(), 1);
}

// =============================================================================
// Hooks
// =============================================================================

#[tokio::test]
async fn scoped_hook_only_sees_its_groups() {
    let bot = Bot::new();
    bot.command(&Context::all(), "ping", CommandConfigPatch::new());
    let hook = MockHook::pass_through("audit", HookPoint::AfterCommand)
        .with_context(Context::only(IdentityKind::Group, [100]));
    let seen = Arc::clone(&hook.seen);
    bot.app.hooks().register(Arc::new(hook));

    bot.send(Meta::group_message(100, 1, "!ping")).await;
    bot.send(Meta::group_message(200, 1, "!ping")).await;

    let seen = seen.lock().expect("should lock recorded contexts");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].command, "ping");
    assert_eq!(seen[0].meta.conversation, Identity::group(100));
}

#[tokio::test]
async fn action_error_reaches_error_hook_and_caller() {
    let bot = Bot::new();
    bot.app
        .commands()
        .command(&Context::all(), "fail")
        .expect("should register command")
        .action(|_inv: Invocation| async move { Err::<Flow, _>(anyhow::anyhow!("disk full")) });
    let hook = MockHook::pass_through("errors", HookPoint::CommandError);
    let seen = Arc::clone(&hook.seen);
    bot.app.hooks().register(Arc::new(hook));

    let err = bot
        .app
        .dispatch(Meta::private_message(1, "fail"))
        .await
        .expect_err("should surface action error");
    assert!(err.to_string().contains("disk full"));

    let seen = seen.lock().expect("should lock recorded contexts");
    assert_eq!(seen[0].payload["error"], "disk full");
}

// =============================================================================
// Help
// =============================================================================

#[tokio::test]
async fn help_lists_reachable_commands() {
    let bot = Bot::new();
    bot.command(&Context::all(), "roll <dice>", CommandConfigPatch::new());
    bot.command(
        &Context::only(IdentityKind::Group, [100]),
        "secret",
        CommandConfigPatch::new(),
    );

    bot.send(Meta::group_message(200, 1, "!help")).await;
    let reply = bot.transport.sent_to(Identity::group(200)).join("\n");
    assert!(reply.contains("roll"));
    assert!(!reply.contains("secret"));
}
