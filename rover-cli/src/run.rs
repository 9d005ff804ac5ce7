use anyhow::{Context, Result, bail};
use colored::Colorize;
use rover_bridge::{JsonLinesHost, NativeEvent};
use rover_collection::ScriptSession;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

pub fn run_file(file: &Path, events: Option<&Path>, log_level: &str) -> Result<()> {
    init_logging(log_level)?;

    let script = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read script {}", file.display()))?;
    let events = match events {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read events {}", path.display()))?;
            parse_events(&content)?
        }
        None => Vec::new(),
    };

    run_session(&script, events, io::stdout())
}

fn init_logging(level: &str) -> Result<()> {
    match level {
        "nope" => return Ok(()),
        "debug" | "info" | "warn" | "error" | "trace" => {}
        other => bail!("log level must be one of: debug, info, warn, error, nope (got '{}')", other),
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .init();
    Ok(())
}

/// One host event per line; blank lines and `#` comments are skipped
pub fn parse_events(content: &str) -> Result<Vec<NativeEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str::<NativeEvent>(line)
                .with_context(|| format!("Invalid event on line {}", n + 1))
        })
        .collect()
}

/// Run the script, then replay host events. Commands are written to `out` as JSON lines.
pub fn run_session<W: Write + 'static>(
    script: &str,
    events: Vec<NativeEvent>,
    out: W,
) -> Result<()> {
    let session = ScriptSession::new(JsonLinesHost::new(out))
        .map_err(|e| anyhow::anyhow!("Failed to create session: {}", e))?;

    session
        .run_script(script)
        .map_err(|e| anyhow::anyhow!("Script error: {}", e))?;
    info!("script done, replaying {} event(s)", events.len());

    for event in events {
        debug!("host -> {} '{}'", event.target, event.name);
        session.post(event);
    }
    let report = session.tick();
    for err in &report.errors {
        eprintln!("{} {}", "warning:".yellow().bold(), err);
    }
    info!("dispatched {} event(s)", report.dispatched);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines(buffer: &SharedBuffer) -> Vec<Value> {
        let bytes = buffer.0.borrow();
        std::str::from_utf8(&bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_events_skips_blank_and_comments() {
        let events = parse_events(
            "# host replay\n\n{\"target\": 1, \"name\": \"requestinfo\", \"payload\": {\"index\": 0}}\n",
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_str(), "requestinfo");
    }

    #[test]
    fn test_parse_events_reports_line() {
        let err = parse_events("{\"target\": 1, \"name\": \"select\"}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_run_session_writes_commands() {
        let buffer = SharedBuffer::default();
        let events = parse_events(
            r#"{"target": 1, "name": "requestinfo", "payload": {"index": 1}}
{"target": 1, "name": "createitem", "payload": {"type": 0}}"#,
        )
        .unwrap();

        run_session(
            r#"
            list = rover.collection {
                items = { "a", "b" },
                itemHeight = 24,
                initializeCell = function(cell, kind) end,
            }
            "#,
            events,
            buffer.clone(),
        )
        .unwrap();

        let lines = lines(&buffer);
        assert_eq!(lines[0]["op"], "create");
        assert_eq!(lines[0]["type"], "rover.CollectionView");
        let ops: Vec<&str> = lines.iter().map(|l| l["op"].as_str().unwrap()).collect();
        assert!(ops.contains(&"listen"));

        let methods: Vec<&str> = lines.iter().filter_map(|l| l["method"].as_str()).collect();
        assert_eq!(methods, vec!["reload", "describeItem", "addItem"]);
        let describe = lines.iter().find(|l| l["method"] == "describeItem").unwrap();
        assert_eq!(describe["params"]["height"], 24.0);
    }

    #[test]
    fn test_script_errors_surface() {
        let err = run_session("rover.collection { items = 3 }", Vec::new(), SharedBuffer::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("Script error"));
    }
}
