use action_locator::{Condition, ElementHandle, LocatorError, Scope, SearchConfig, Session};
use action_primitives::{MemoryTree, NodeSpec};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uiquery_core_types::ControlType;

fn quick() -> SearchConfig {
    SearchConfig::default()
        .with_wait(false)
        .with_report_errors(false)
}

fn attach(spec: &NodeSpec, config: SearchConfig) -> (Arc<MemoryTree>, ElementHandle<MemoryTree>) {
    let tree = Arc::new(MemoryTree::from_spec(spec).unwrap());
    let root = Session::new(tree.clone(), config).attach(tree.root());
    (tree, root)
}

fn automation_ids(handles: &[ElementHandle<MemoryTree>]) -> Vec<String> {
    handles
        .iter()
        .map(|h| h.automation_id().unwrap().unwrap_or_default())
        .collect()
}

/// Desktop with a notepad-like window whose dialog lives in a separate OS window.
fn desktop() -> NodeSpec {
    NodeSpec::new(ControlType::Pane)
        .named("Desktop")
        .child(
            NodeSpec::new(ControlType::Window)
                .named("Editor")
                .with_automation_id("editor")
                .with_window(0x10)
                .child(
                    NodeSpec::new(ControlType::MenuBar)
                        .with_automation_id("menu")
                        .child(NodeSpec::new(ControlType::MenuItem).named("File"))
                        .child(NodeSpec::new(ControlType::MenuItem).named("Edit")),
                )
                .child(
                    NodeSpec::new(ControlType::Document)
                        .with_automation_id("doc")
                        .with_property("Value", "hello"),
                )
                .hidden_child(
                    NodeSpec::new(ControlType::Window)
                        .named("Save As")
                        .with_automation_id("save-dialog")
                        .with_window(0x11)
                        .child(
                            NodeSpec::new(ControlType::Button)
                                .named("Save")
                                .with_automation_id("save"),
                        ),
                ),
        )
        .child(
            NodeSpec::new(ControlType::Window)
                .named("Calculator")
                .with_automation_id("calc")
                .with_window(0x20)
                .child(
                    NodeSpec::new(ControlType::Button)
                        .named("Save")
                        .with_automation_id("memory-save"),
                ),
        )
}

#[test]
fn descendants_prefer_shallow_matches() {
    let spec = NodeSpec::new(ControlType::Window)
        .child(
            NodeSpec::new(ControlType::Pane)
                .child(NodeSpec::new(ControlType::Text).named("hit").with_automation_id("deep")),
        )
        .child(NodeSpec::new(ControlType::Text).named("hit").with_automation_id("shallow"));
    let (_tree, root) = attach(&spec, quick());

    let first = root
        .find_first(Scope::Descendants, &Condition::name("hit"))
        .unwrap()
        .unwrap();
    assert_eq!(first.automation_id().unwrap().as_deref(), Some("shallow"));

    let all = root
        .find_all(Scope::Descendants, &Condition::name("hit"))
        .unwrap();
    assert_eq!(automation_ids(&all), vec!["shallow", "deep"]);
}

#[test]
fn hidden_dialog_found_once_through_window_enumeration() {
    let (_tree, root) = attach(&desktop(), quick());
    let editor = root
        .find_first(Scope::Children, &Condition::automation_id("editor"))
        .unwrap()
        .unwrap();

    // The primary walk alone does not reach the dialog.
    assert!(editor
        .find_first(Scope::Descendants, &Condition::name("Save"))
        .unwrap()
        .is_none());

    let saves = editor
        .find_all(Scope::Descendants, &Condition::name("Save"))
        .unwrap();
    assert_eq!(automation_ids(&saves), vec!["save"]);
    assert!(saves[0].parent().unwrap().same_element(&editor).unwrap());
}

#[test]
fn window_enumeration_from_desktop_needs_opt_in() {
    let (_tree, root) = attach(&desktop(), quick());
    let condition = Condition::name("Save");

    let visible = root.find_all(Scope::Descendants, &condition).unwrap();
    assert_eq!(automation_ids(&visible), vec!["memory-save"]);

    let everywhere = root.with_config(quick().with_all_os_windows(true));
    let all = everywhere.find_all(Scope::Descendants, &condition).unwrap();
    assert_eq!(automation_ids(&all), vec!["memory-save", "save"]);
}

#[test]
fn path_backtracks_across_siblings() {
    let spec = NodeSpec::new(ControlType::Window)
        .child(NodeSpec::new(ControlType::Custom).named("A").with_automation_id("a1"))
        .child(
            NodeSpec::new(ControlType::Custom)
                .named("A")
                .with_automation_id("a2")
                .child(NodeSpec::new(ControlType::Custom).named("B").with_automation_id("b")),
        );
    let (_tree, root) = attach(&spec, quick());

    let found = root
        .find_by_path("./Custom[@Name='A']/Custom[@Name='B']")
        .unwrap()
        .unwrap();
    assert_eq!(found.automation_id().unwrap().as_deref(), Some("b"));
    assert_eq!(
        found.locator_path().unwrap(),
        "/Custom[@AutomationId='a2']/Custom[@AutomationId='b']"
    );
}

#[test]
fn path_through_hidden_window() {
    let (_tree, root) = attach(&desktop(), quick());
    let found = root
        .find_by_path("/Window[@AutomationId='editor']//Button[@Name='Save']")
        .unwrap()
        .unwrap();
    assert_eq!(found.automation_id().unwrap().as_deref(), Some("save"));
    assert_eq!(
        found.locator_path().unwrap(),
        "/Window[@AutomationId='editor']//Button[@AutomationId='save']"
    );
}

#[test]
fn relative_and_absolute_paths_anchor_differently() {
    let (_tree, root) = attach(&desktop(), quick());
    let calc = root
        .find_first(Scope::Children, &Condition::automation_id("calc"))
        .unwrap()
        .unwrap();

    let relative = calc.find_all_by_path(".//Button").unwrap();
    assert_eq!(automation_ids(&relative), vec!["memory-save"]);

    assert!(calc.find_all_by_path(".//Document").unwrap().is_empty());
    let absolute = calc.find_all_by_path("//Document").unwrap();
    assert_eq!(automation_ids(&absolute), vec!["doc"]);
}

#[test]
fn top_level_strategy_tries_each_window() {
    let (_tree, root) = attach(&desktop(), quick());
    let path = "/MenuBar/MenuItem[@Name='Edit']";

    assert!(root.find_by_path(path).unwrap().is_none());

    let from_windows = root.with_config(quick().with_all_top_level_windows(true));
    let found = from_windows.find_by_path(path).unwrap().unwrap();
    assert_eq!(found.name().unwrap().as_deref(), Some("Edit"));
    assert_eq!(
        found.locator_path().unwrap(),
        "/Window[@AutomationId='editor']/MenuBar[@AutomationId='menu']/MenuItem[@Name='Edit']"
    );

    // Relative paths ignore the top-level strategy.
    assert!(from_windows.find_by_path("./MenuBar").unwrap().is_none());
}

#[test]
fn malformed_path_fails_before_searching() {
    let (tree, root) = attach(&desktop(), SearchConfig::default().with_timeout_ms(2000));
    let before = tree.call_count();
    let started = Instant::now();

    let err = root.find_by_path("/Window[@Name='x'").unwrap_err();
    assert!(matches!(err, LocatorError::InvalidPath { .. }));
    let err = root.find_by_path("/Window[@Colour='x']").unwrap_err();
    assert_eq!(err, LocatorError::UnknownProperty("Colour".into()));

    assert_eq!(tree.call_count(), before);
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn miss_waits_for_the_configured_timeout() {
    let (_tree, root) = attach(&desktop(), quick().with_wait(true).with_timeout_ms(1000));
    let started = Instant::now();
    let found = root
        .find_first(Scope::Descendants, &Condition::name("Nowhere"))
        .unwrap();
    let elapsed = started.elapsed();

    assert!(found.is_none());
    assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "{elapsed:?}");
}

#[test]
fn element_appearing_later_is_found_by_polling() {
    let (tree, root) = attach(&desktop(), quick().with_wait(true).with_timeout_ms(5000));
    let calc = tree.find_by_automation_id("calc").unwrap();

    let writer = {
        let tree = tree.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(700));
            tree.insert_child(
                calc,
                &NodeSpec::new(ControlType::Button)
                    .named("Equals")
                    .with_automation_id("eq"),
            )
            .unwrap();
        })
    };

    let started = Instant::now();
    let found = root
        .find_by_path("/Window[@AutomationId='calc']/Button[@Name='Equals']")
        .unwrap();
    writer.join().unwrap();

    assert_eq!(found.unwrap().automation_id().unwrap().as_deref(), Some("eq"));
    assert!(started.elapsed() < Duration::from_millis(4000));
}

#[test]
fn provider_faults_are_retried() {
    let (tree, root) = attach(&desktop(), quick().with_wait(true).with_timeout_ms(3000));
    tree.fail_next_calls(3);
    let found = root
        .find_first(Scope::Descendants, &Condition::automation_id("doc"))
        .unwrap();
    assert!(found.is_some());

    let no_wait = root.with_config(quick());
    tree.fail_next_calls(1);
    assert!(no_wait
        .find_first(Scope::Descendants, &Condition::automation_id("doc"))
        .unwrap()
        .is_none());
}

#[test]
fn wait_until_gone_sees_removal() {
    let (tree, root) = attach(&desktop(), quick().with_wait(true).with_timeout_ms(4000));
    let doc = tree.find_by_automation_id("doc").unwrap();

    let remover = {
        let tree = tree.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(600));
            tree.remove(doc).unwrap();
        })
    };

    let gone = root
        .wait_until_gone(Scope::Descendants, &Condition::automation_id("doc"))
        .unwrap();
    remover.join().unwrap();
    assert!(gone);
}

#[test]
fn regex_values_follow_configuration() {
    let (_tree, root) = attach(&desktop(), quick());
    let path = "//MenuItem[@Name='/^e/i']";

    assert!(root.find_by_path(path).unwrap().is_none());

    let regex = root.with_config(quick().with_regex_values(true));
    let found = regex.find_by_path(path).unwrap().unwrap();
    assert_eq!(found.name().unwrap().as_deref(), Some("Edit"));
    assert!(found.config().use_regex_values);

    // Unrecognised flag: compared literally.
    let literal = regex.find_by_path("//MenuItem[@Name='/abc/z']").unwrap();
    assert!(literal.is_none());
}
