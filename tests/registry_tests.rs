//! Integration tests for the collection registry.

use std::path::PathBuf;

use proptest::prelude::*;

use diag_collector::capabilities::{ActivationSet, Capability};
use diag_collector::filters::Filter;
use diag_collector::registry::{
    CollectionSession, CommandLookup, CommandSpec, RegistrationOutcome, SkipReason, TaskSource,
};

/// Every program exists
struct FindAll;

impl CommandLookup for FindAll {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        Some(PathBuf::from(program))
    }
}

fn session_with(active: &[&str]) -> CollectionSession {
    CollectionSession::with_lookup(
        ActivationSet::from_keys(active.iter().copied()),
        Box::new(FindAll),
    )
}

#[test]
fn test_dedup_keeps_second_registration() {
    let mut session = session_with(&["pam"]);
    let f = Filter::line("f", |text| text.to_uppercase());

    session.register_command("pam", ["/usr/bin/pwd", "--version"], None, None);
    session.register_command("pam", ["/usr/bin/pwd", "--version"], None, Some(f.clone()));

    assert_eq!(session.len(), 1);
    let task = session.get("/usr/bin/pwd --version").unwrap();
    assert_eq!(task.filter.as_ref(), Some(&f));
    assert_eq!(
        task.command(),
        Some(&CommandSpec::argv(["/usr/bin/pwd", "--version"]))
    );
}

#[test]
fn test_resolved_activation_gates_registration() {
    let catalogue = vec![
        Capability::new("pam"),
        Capability::new("xenserver-logs").with_checked(false),
    ];
    let mut session = CollectionSession::with_lookup(
        ActivationSet::resolve(None, &catalogue),
        Box::new(FindAll),
    );

    assert!(session
        .register_command("pam", "cat /etc/pam.d/system-auth", None, None)
        .is_registered());
    assert_eq!(
        session.register_command("xenserver-logs", ["ls", "/var/log"], None, None),
        RegistrationOutcome::Skipped(SkipReason::Inactive {
            capability: "xenserver-logs".to_string()
        })
    );
    assert_eq!(session.len(), 1);
}

#[test]
fn test_explicit_entries_ignore_unknown() {
    let catalogue = vec![Capability::new("pam"), Capability::new("snmp")];
    let explicit = vec!["snmp".to_string(), "bogus".to_string()];
    let active = ActivationSet::resolve(Some(explicit.as_slice()), &catalogue);

    assert!(active.contains("snmp"));
    assert!(!active.contains("pam"));
    assert!(!active.contains("bogus"));
}

#[derive(Debug, Clone)]
enum Call {
    Command(String, Vec<String>, Option<String>),
    Callback(String, String),
    Copy(String, String),
}

fn capability() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["pam", "snmp", "kernel-info", "disk-info"]).prop_map(String::from)
}

fn call() -> impl Strategy<Value = Call> {
    prop_oneof![
        (
            capability(),
            prop::collection::vec("[a-z]{1,4}", 1..3),
            prop::option::of("[a-c]")
        )
            .prop_map(|(c, argv, label)| Call::Command(c, argv, label)),
        (capability(), "[a-c]").prop_map(|(c, label)| Call::Callback(c, label)),
        (capability(), "/[a-z]{1,4}").prop_map(|(c, path)| Call::Copy(c, path)),
    ]
}

fn apply(session: &mut CollectionSession, call: &Call) {
    match call {
        Call::Command(cap, argv, label) => {
            session.register_command(cap, argv.clone(), label.as_deref(), None);
        }
        Call::Callback(cap, label) => {
            session.register_callback(cap, label, |_| Ok(String::new()));
        }
        Call::Copy(cap, path) => {
            session.register_file_copy(cap, &[path]);
        }
    }
}

fn capability_of(call: &Call) -> &str {
    match call {
        Call::Command(cap, _, _) | Call::Callback(cap, _) | Call::Copy(cap, _) => cap,
    }
}

proptest! {
    #[test]
    fn prop_inactive_registration_is_noop(
        calls in prop::collection::vec(call(), 0..20),
        active in prop::collection::btree_set(capability(), 0..4),
    ) {
        let mut session = CollectionSession::with_lookup(
            ActivationSet::from_keys(active.iter().cloned()),
            Box::new(FindAll),
        );
        for call in &calls {
            let before = session.tasks().to_vec();
            apply(&mut session, call);
            if !active.contains(capability_of(call)) {
                prop_assert_eq!(session.tasks(), before.as_slice());
            }
        }
    }

    #[test]
    fn prop_labels_are_unique_and_latest_wins(
        calls in prop::collection::vec(call(), 0..20),
    ) {
        let mut session = session_with(&["pam", "snmp", "kernel-info", "disk-info"]);
        for call in &calls {
            apply(&mut session, call);
            if let Call::Command(cap, argv, label) = call {
                let label = label.clone().unwrap_or_else(|| argv.join(" "));
                let task = session.get(&label).unwrap();
                prop_assert_eq!(&task.capability, cap);
                prop_assert_eq!(&task.source, &TaskSource::Command(CommandSpec::Argv(argv.clone())));
            }
        }

        let mut labels: Vec<&str> = session.tasks().iter().map(|t| t.label.as_str()).collect();
        let count = labels.len();
        labels.sort_unstable();
        labels.dedup();
        prop_assert_eq!(labels.len(), count);
    }
}
