use plain_composer::commit::{CommitAttempt, CommitOutcome, CommitStrategy};
use plain_composer::host::{Consume, EnterPress, HostDom, MockHost};
use plain_composer::notify::MemorySink;
use plain_composer::store::MemoryStore;
use plain_composer::{Mode, PlainComposer, Settings, SubmitOutcome};

const T0: u64 = 1_000;

fn installed(host: &mut MockHost) -> (PlainComposer<MemoryStore>, MemorySink) {
    let sink = MemorySink::default();
    let mut composer = PlainComposer::new(Settings::default(), MemoryStore::new(), Box::new(sink.clone()));
    composer.install(host, T0);
    (composer, sink)
}

fn run_commit(composer: &mut PlainComposer<MemoryStore>, host: &mut MockHost, mut now: u64) -> (CommitAttempt, u64) {
    for _ in 0..100 {
        now += 10;
        if let Some(attempt) = composer.tick(host, now) {
            return (attempt, now);
        }
    }
    panic!("commit did not finish");
}

#[test]
fn ctrl_enter_host_is_reached_on_first_strategy() {
    let mut host = MockHost::typingmind();
    host.consume_on(vec![Consume::Enter(EnterPress {
        ctrl: true,
        meta: false,
    })]);
    let (mut composer, sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);

    assert_eq!(composer.submit(&mut host, T0 + 20), SubmitOutcome::Started);
    let (attempt, _) = run_commit(&mut composer, &mut host, T0 + 20);

    assert!(attempt.success());
    assert_eq!(
        attempt.strategies,
        vec![CommitStrategy::WriteAndNotify, CommitStrategy::CtrlEnter]
    );
    assert_eq!(composer.text(), "");
    assert_eq!(host.input_value().as_deref(), Some(""));
    assert!(host.is_suppressed(host.input_id()));
    assert!(composer.drafts().store().is_empty());
    assert!(sink.messages().is_empty());
}

#[test]
fn host_that_never_clears_keeps_the_text() {
    let mut host = MockHost::typingmind();
    let (mut composer, sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);

    composer.submit(&mut host, T0 + 20);
    let (attempt, _) = run_commit(&mut composer, &mut host, T0 + 20);

    assert!(!attempt.success());
    assert_eq!(attempt.outcome, CommitOutcome::Exhausted);
    assert_eq!(
        attempt.strategies,
        vec![
            CommitStrategy::WriteAndNotify,
            CommitStrategy::CtrlEnter,
            CommitStrategy::MetaEnter,
            CommitStrategy::PlainEnter,
            CommitStrategy::SubmitClick,
        ]
    );
    assert_eq!(composer.text(), "hello");
    assert!(composer.view().focused);
    assert!(host.is_suppressed(host.input_id()));
    let warnings = sink.messages();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("your text was kept"));
}

#[test]
fn switching_to_host_control_mid_commit_leaves_it_visible() {
    let mut host = MockHost::typingmind();
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);
    composer.submit(&mut host, T0 + 20);
    composer.toggle(&mut host, T0 + 30);
    assert_eq!(composer.mode(), Mode::Native);

    let (attempt, _) = run_commit(&mut composer, &mut host, T0 + 30);
    assert_eq!(attempt.outcome, CommitOutcome::Exhausted);
    assert_eq!(composer.mode(), Mode::Native);
    assert!(!composer.view().displayed);
    assert!(!host.is_suppressed(host.input_id()));
    assert_eq!(composer.text(), "hello");
}

#[test]
fn send_button_is_the_last_resort() {
    let mut host = MockHost::typingmind();
    host.consume_on(vec![Consume::Click]);
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "via button", T0 + 10);
    composer.submit(&mut host, T0 + 20);
    let (attempt, _) = run_commit(&mut composer, &mut host, T0 + 20);
    assert!(attempt.success());
    assert_eq!(attempt.strategies.last(), Some(&CommitStrategy::SubmitClick));
    assert_eq!(attempt.strategies.len(), 5);
}

#[test]
fn text_typed_during_commit_survives() {
    let mut host = MockHost::typingmind();
    host.consume_on(vec![Consume::Enter(EnterPress {
        ctrl: true,
        meta: false,
    })]);
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);
    composer.submit(&mut host, T0 + 20);
    composer.on_input(&mut host, "hello world", T0 + 25);

    let (attempt, now) = run_commit(&mut composer, &mut host, T0 + 25);
    assert!(attempt.success());
    assert_eq!(composer.text(), " world");

    // The remainder is persisted again after the draft was cleared.
    composer.tick(&mut host, now + 1_000);
    assert_eq!(composer.drafts().store().len(), 1);
}

#[test]
fn host_ignoring_hidden_control_still_succeeds() {
    let mut host = MockHost::typingmind();
    host.set_ignore_input_while_suppressed(true);
    host.consume_on(vec![Consume::Enter(EnterPress {
        ctrl: true,
        meta: false,
    })]);
    let (mut composer, _sink) = installed(&mut host);
    assert!(host.is_suppressed(host.input_id()));
    composer.on_input(&mut host, "hello", T0 + 10);
    composer.submit(&mut host, T0 + 20);
    let (attempt, _) = run_commit(&mut composer, &mut host, T0 + 20);
    assert!(attempt.success());
    assert!(host.is_suppressed(host.input_id()));
}

#[test]
fn missing_control_fails_fast_and_keeps_text() {
    let mut host = MockHost::typingmind();
    let (mut composer, sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);
    let input = host.input_id();
    host.remove(input);

    assert_eq!(composer.submit(&mut host, T0 + 20), SubmitOutcome::Started);
    assert!(!composer.commit_in_flight());
    let attempt = composer.last_commit().expect("attempt recorded");
    assert_eq!(attempt.outcome, CommitOutcome::ControlMissing);
    assert!(attempt.strategies.is_empty());
    assert_eq!(composer.text(), "hello");
    assert_eq!(sink.messages().len(), 1);
}

#[test]
fn second_submit_while_in_flight_is_rejected() {
    let mut host = MockHost::typingmind();
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);
    assert_eq!(composer.submit(&mut host, T0 + 20), SubmitOutcome::Started);
    assert_eq!(composer.submit(&mut host, T0 + 21), SubmitOutcome::Busy);

    let writes = host
        .events()
        .iter()
        .filter(|e| matches!(e, plain_composer::host::HostEvent::Wrote(..)))
        .count();
    assert_eq!(writes, 1);
}

#[test]
fn blank_text_is_not_sent() {
    let mut host = MockHost::typingmind();
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "  \n ", T0 + 10);
    assert_eq!(composer.submit(&mut host, T0 + 20), SubmitOutcome::Empty);
    assert!(!composer.commit_in_flight());
}

#[test]
fn teardown_mid_commit_restores_host_and_keeps_text() {
    let mut host = MockHost::typingmind();
    let (mut composer, _sink) = installed(&mut host);
    composer.on_input(&mut host, "hello", T0 + 10);
    composer.submit(&mut host, T0 + 20);
    composer.tick(&mut host, T0 + 50);
    assert!(composer.commit_in_flight());

    composer.teardown(&mut host, T0 + 60);
    assert!(!composer.commit_in_flight());
    assert_eq!(
        composer.last_commit().map(|a| a.outcome),
        Some(CommitOutcome::Cancelled)
    );
    assert_eq!(composer.text(), "hello");
    assert!(!host.is_suppressed(host.input_id()));

    host.clear_events();
    assert!(composer.tick(&mut host, T0 + 1_000).is_none());
    assert!(host.events().is_empty());
}
