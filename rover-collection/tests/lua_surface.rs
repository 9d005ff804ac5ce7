/// Lua-driven tests: scripts build lists through `rover.collection` and the host answers
use rover_bridge::{Command, NativeEvent, ProxyId, RecordingHost};
use rover_collection::ScriptSession;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

fn session() -> (ScriptSession, Rc<RefCell<Vec<Command>>>) {
    let host = RecordingHost::new();
    let log = host.log();
    (ScriptSession::new(host).unwrap(), log)
}

fn calls(log: &Rc<RefCell<Vec<Command>>>) -> Vec<(String, Value)> {
    log.borrow()
        .iter()
        .filter_map(|c| match c {
            Command::Call { method, params, .. } => Some((method.to_string(), params.clone())),
            _ => None,
        })
        .collect()
}

/// Id of the first list the script created
fn list_id(log: &Rc<RefCell<Vec<Command>>>) -> ProxyId {
    log.borrow()
        .iter()
        .find_map(|c| match c {
            Command::Create { target, type_name, .. } if type_name.as_str() == "rover.CollectionView" => {
                Some(*target)
            }
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_collection_from_config() {
    let (session, log) = session();
    session
        .run_script(
            r#"
            list = rover.collection {
                items = { "a", "b", "c" },
                itemHeight = 40,
                columnCount = 2,
                refreshEnabled = true,
            }
        "#,
        )
        .unwrap();

    let log_ref = log.borrow();
    let sets: Vec<String> = log_ref
        .iter()
        .filter_map(|c| match c {
            Command::Set { properties, .. } => properties.keys().next().cloned(),
            _ => None,
        })
        .collect();
    assert_eq!(sets, vec!["itemHeight", "columnCount", "refreshEnabled"]);
    drop(log_ref);
    assert_eq!(calls(&log), vec![("reload".to_string(), json!({"items": 3}))]);

    let count: i64 = session.lua().load("return #list.items").eval().unwrap();
    assert_eq!(count, 3);
    let columns: i64 = session.lua().load("return list.columnCount").eval().unwrap();
    assert_eq!(columns, 2);
}

#[test]
fn test_host_conversation_drives_lua_callbacks() {
    let (session, log) = session();
    session
        .run_script(
            r#"
            populated = {}
            list = rover.collection {
                items = { "title", "one", "two" },
                cellType = function(item)
                    if item == "title" then return "header" end
                    return "row"
                end,
                itemHeight = function(item, kind)
                    if kind == "header" then return 60 end
                    return 30
                end,
                initializeCell = function(cell, kind)
                    cell:on("change:item", function(cell, item, index)
                        table.insert(populated, kind .. ":" .. item .. "@" .. index)
                    end)
                end,
            }
        "#,
        )
        .unwrap();
    let list = list_id(&log);
    log.borrow_mut().clear();

    session.post(NativeEvent::new(list, "requestinfo", json!({"index": 1})));
    session.post(NativeEvent::new(list, "requestinfo", json!({"index": 0})));
    session.post(NativeEvent::new(list, "createitem", json!({"type": 0})));
    let report = session.tick();
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let cell = log
        .borrow()
        .iter()
        .find_map(|c| match c {
            Command::Create { target, .. } => Some(*target),
            _ => None,
        })
        .unwrap();
    session.post(NativeEvent::new(list, "populateitem", json!({"widget": cell, "index": 2})));
    session.tick();

    let calls = calls(&log);
    assert_eq!(
        calls[0],
        ("describeItem".to_string(), json!({"index": 1, "type": 0, "height": 30.0}))
    );
    assert_eq!(
        calls[1],
        ("describeItem".to_string(), json!({"index": 0, "type": 1, "height": 60.0}))
    );
    assert_eq!(calls[2], ("addItem".to_string(), json!({"widget": cell})));

    let populated: Vec<String> = session.lua().load("return populated").eval().unwrap();
    assert_eq!(populated, vec!["row:two@2"]);
}

#[test]
fn test_select_listener_can_mutate_the_list() {
    let (session, log) = session();
    session
        .run_script(
            r#"
            list = rover.collection { items = { "a", "b" } }
            list:on("select", function(view, index, item)
                view:insert({ item .. "!" }, index + 1)
            end)
        "#,
        )
        .unwrap();
    let list = list_id(&log);
    log.borrow_mut().clear();

    session.post(NativeEvent::new(list, "select", json!({"index": 0})));
    session.tick();

    let items: Vec<String> = session.lua().load("return list.items").eval().unwrap();
    assert_eq!(items, vec!["a", "a!", "b"]);
    assert_eq!(calls(&log), vec![("update".to_string(), json!({"insert": [1, 1]}))]);
}

#[test]
fn test_insert_requires_a_table() {
    let (session, _log) = session();
    session.run_script("list = rover.collection {}").unwrap();

    let err = session.run_script("list:insert(42)").unwrap_err();
    assert!(err.to_string().contains("items must be a table"));
    let err = session.run_script("list:remove('first')").unwrap_err();
    assert!(err.to_string().contains("must be a number"));

    let len: i64 = session.lua().load("return #list.items").eval().unwrap();
    assert_eq!(len, 0);
}

#[test]
fn test_listen_bookkeeping_from_lua() {
    let (session, log) = session();
    session
        .run_script(
            r#"
            list = rover.collection {}
            first = list:on("change:firstVisibleIndex", function() end)
            scroll = list:on("scroll", function() end)
        "#,
        )
        .unwrap();
    session
        .run_script("list:off(first) removed = list:off(scroll)")
        .unwrap();

    let listens: Vec<(String, bool)> = log
        .borrow()
        .iter()
        .filter_map(|c| match c {
            Command::Listen { event, listen, .. } if event.as_str() == "scroll" => {
                Some((event.to_string(), *listen))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        listens,
        vec![("scroll".to_string(), true), ("scroll".to_string(), false)]
    );
    let removed: bool = session.lua().load("return removed").eval().unwrap();
    assert!(removed);
}

#[test]
fn test_properties_round_trip() {
    let (session, _log) = session();
    session
        .run_script(
            r#"
            kind = function(item) return "row" end
            list = rover.collection { cellType = kind }
            list.refreshMessage = "pull"
            list:set("refreshEnabled", true)
            list.firstVisibleIndex = 3
        "#,
        )
        .unwrap();

    let same: bool = session.lua().load("return list.cellType == kind").eval().unwrap();
    assert!(same);
    let message: String = session.lua().load("return list:get('refreshMessage')").eval().unwrap();
    assert_eq!(message, "pull");
    let enabled: bool = session.lua().load("return list.refreshEnabled").eval().unwrap();
    assert!(enabled);
    let first: Option<i64> = session.lua().load("return list.firstVisibleIndex").eval().unwrap();
    assert_eq!(first, None);

    let err = session.run_script("list.id = 5").unwrap_err();
    assert!(err.to_string().contains("Cannot set property 'id'"));
    let err = session.run_script("list.columnCount = 0").unwrap_err();
    assert!(err.to_string().contains("columnCount"));
}

#[test]
fn test_dispose_destroys_the_list() {
    let (session, log) = session();
    session
        .run_script("list = rover.collection { items = { 1, 2 } } list:dispose() list:dispose()")
        .unwrap();

    let destroys = log
        .borrow()
        .iter()
        .filter(|c| matches!(c, Command::Destroy { .. }))
        .count();
    assert_eq!(destroys, 1);
    assert_eq!(session.channel().live_proxies(), 0);
}

#[test]
fn test_unreferenced_list_stays_live() {
    let (session, log) = session();
    session
        .run_script(
            r#"
            do
                local list = rover.collection { items = { "a", "b" } }
            end
            collectgarbage()
            collectgarbage()
        "#,
        )
        .unwrap();
    let list = list_id(&log);
    assert_eq!(calls(&log), vec![("reload".to_string(), json!({"items": 2}))]);
    log.borrow_mut().clear();

    session.post(NativeEvent::new(list, "requestinfo", json!({"index": 1})));
    let report = session.tick();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(calls(&log).len(), 1);
    assert_eq!(calls(&log)[0].0, "describeItem");
    assert!(!log.borrow().iter().any(|c| matches!(c, Command::Destroy { .. })));
    assert_eq!(session.channel().live_proxies(), 1);
}

#[test]
fn test_assigning_nil_items_clears_the_list() {
    let (session, log) = session();
    session.run_script("list = rover.collection { items = { 1, 2 } }").unwrap();
    log.borrow_mut().clear();

    session.run_script("list.items = nil").unwrap();
    let len: i64 = session.lua().load("return #list.items").eval().unwrap();
    assert_eq!(len, 0);
    assert_eq!(calls(&log), vec![("reload".to_string(), json!({"items": 0}))]);

    session.run_script("list:set('items', { 3 }) list:set('items', nil)").unwrap();
    let len: i64 = session.lua().load("return #list.items").eval().unwrap();
    assert_eq!(len, 0);
}

#[test]
fn test_column_count_rejects_fractions() {
    let (session, _log) = session();
    session.run_script("list = rover.collection { columnCount = 2 }").unwrap();

    let err = session.run_script("list.columnCount = 1.5").unwrap_err();
    assert!(err.to_string().contains("columnCount must be a positive integer"));
    let columns: i64 = session.lua().load("return list.columnCount").eval().unwrap();
    assert_eq!(columns, 2);

    session.run_script("list.columnCount = 3.0").unwrap();
    let columns: i64 = session.lua().load("return list.columnCount").eval().unwrap();
    assert_eq!(columns, 3);
}

#[test]
fn test_remove_with_invalid_count_keeps_items() {
    let (session, log) = session();
    session.run_script("list = rover.collection { items = { 1, 2, 3 } }").unwrap();
    log.borrow_mut().clear();

    for script in ["list:remove(0, -1)", "list:remove(0, 0/0)", "list:remove(0, 'two')"] {
        let err = session.run_script(script).unwrap_err();
        assert!(err.to_string().contains("Invalid argument"), "{}: {}", script, err);
    }

    let items: Vec<i64> = session.lua().load("return list.items").eval().unwrap();
    assert_eq!(items, vec![1, 2, 3]);
    assert!(calls(&log).is_empty());
}
