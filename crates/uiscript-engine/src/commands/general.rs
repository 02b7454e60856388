//! Harness commands that act on the session rather than the browser.

use super::{int_arg, text_arg, CommandError, CommandResult, CommandTable, GeneralContext};
use crate::session::Recorder;
use futures::future::BoxFuture;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;
use uiscript_common::error::RegistryError;
use uiscript_common::{CommandCategory, CommandDescriptor, ParamKind};

/// Topics accepted by `help` as bare words. `browser` is an alias of
/// `portal`.
pub const HELP_TOPICS: [&str; 8] = [
    "all",
    "assertion",
    "browser",
    "general",
    "macro",
    "page",
    "portal",
    "window",
];

pub(crate) fn register(table: &mut CommandTable) -> Result<(), RegistryError> {
    let cmd = |name: &str| CommandDescriptor::new(name, CommandCategory::General);

    table.general(
        cmd("help")
            .keyword("topic", &HELP_TOPICS, "all")
            .summary("List available commands and elements"),
        help,
    )?;
    table.general(cmd("pause").summary("Wait for ENTER before continuing"), pause)?;
    table.general(
        cmd("prompt")
            .required("text", ParamKind::Text)
            .summary("Change the interactive prompt"),
        prompt,
    )?;
    table.general(
        cmd("sleep")
            .required("seconds", ParamKind::Integer)
            .summary("Wait for a number of seconds"),
        sleep,
    )?;
    table.general(
        cmd("save")
            .required("name", ParamKind::Text)
            .summary("Record the following commands into a saved session file"),
        save,
    )?;
    table.general(cmd("end_save").summary("Stop recording commands"), end_save)?;
    table.general(
        cmd("try_start").summary("Log and ignore failing commands"),
        try_start,
    )?;
    table.general(cmd("try_stop").summary("Stop ignoring failing commands"), try_stop)?;
    table.general(cmd("quit").summary("End the session"), quit)?;
    table.general(cmd("xyzzy"), xyzzy)?;
    Ok(())
}

fn section<'a>(out: &mut String, title: &str, items: impl IntoIterator<Item = &'a str>) {
    let _ = writeln!(out, "\n{}:", title);
    for item in items {
        let _ = writeln!(out, "    {}", item);
    }
}

fn help(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let mut topic = text_arg(ctx.invocation, 0)?.to_lowercase();
        let mut out = String::new();
        if !HELP_TOPICS.contains(&topic.as_str()) {
            let _ = writeln!(
                out,
                "Did not recognize argument {}. Printing all available commands...",
                topic
            );
            topic = "all".into();
        }
        let wants = |t: &str| topic == "all" || topic == t;

        if wants("page") {
            section(&mut out, "Page Commands", ctx.page.elements.keys().map(String::as_str));
            if !ctx.page.windows.is_empty() {
                let _ = writeln!(out, "\nContained Elements:");
                for (window, elements) in &ctx.page.windows {
                    let _ = writeln!(out, "*  {}:", window);
                    for name in elements.keys() {
                        let _ = writeln!(out, "    {}", name);
                    }
                }
            }
        }
        if wants("page") || wants("window") {
            let windowed = ctx.elements.windowed_elements();
            if !windowed.is_empty() {
                section(&mut out, "Window Commands", windowed);
            } else if topic == "window" {
                let _ = writeln!(
                    out,
                    "\nNo windowed commands found. Check 'page' for other options."
                );
            }
        }

        for (category, title) in [
            (CommandCategory::General, "General Commands"),
            (CommandCategory::Portal, "Browser Commands"),
            (CommandCategory::Assertion, "Assertion Commands"),
            (CommandCategory::Macro, "Macro Commands"),
        ] {
            let selected = wants(category.as_str())
                || (category == CommandCategory::Portal && topic == "browser");
            let commands = ctx.commands.list(category);
            if selected && !commands.is_empty() {
                section(&mut out, title, commands.iter().map(|d| d.name.as_str()));
            }
        }

        Ok(Some(out.trim_end().to_string()))
    })
}

fn pause(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        ctx.state
            .input
            .wait_for_enter("Press ENTER to continue...")
            .await?;
        Ok(None)
    })
}

fn prompt(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let text = text_arg(ctx.invocation, 0)?;
        ctx.state.prompt = format!("{} ", text.trim_matches('"'));
        Ok(None)
    })
}

fn sleep(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        let seconds = int_arg(ctx.invocation, 0)?;
        tokio::time::sleep(Duration::from_secs(seconds.max(0) as u64)).await;
        Ok(None)
    })
}

/// Saved session files are plain names inside the saved sessions
/// directory, always with a `.txt` extension.
pub fn saved_session_file(name: &str) -> Result<String, String> {
    if name.is_empty() {
        return Err("Invalid file name! The name is empty.".into());
    }
    if name.contains('/') || name.contains('\\') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err("Invalid file name! Do not use separators in the file name.".into());
    }
    if name.ends_with(".txt") {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.txt", name))
    }
}

fn save(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        if ctx.state.recorder.is_some() {
            return Ok(Some("A save session is already enabled.".into()));
        }
        let name = text_arg(ctx.invocation, 0)?;
        let file = saved_session_file(&name).map_err(|reason| CommandError::InvalidArgument {
            command: ctx.invocation.name().to_string(),
            reason,
        })?;

        let dir = ctx.state.saved_sessions_dir.clone();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file);
        let recorder = match Recorder::create(&path).await {
            Ok(recorder) => recorder,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(CommandError::InvalidArgument {
                    command: ctx.invocation.name().to_string(),
                    reason: format!("File already exists: {}", path.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };
        info!("Recording session to {}", path.display());
        ctx.state.recorder = Some(recorder);
        Ok(Some(format!("Created file {}", path.display())))
    })
}

fn end_save(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        match ctx.state.recorder.take() {
            Some(recorder) => {
                recorder.finish().await?;
                Ok(Some("Save session ended.".into()))
            }
            None => Ok(Some("A save session is not currently enabled.".into())),
        }
    })
}

fn try_start(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        if ctx.state.best_effort {
            return Ok(Some(
                "Try mode is already active. To disable, use: try_stop.".into(),
            ));
        }
        ctx.state.best_effort = true;
        Ok(None)
    })
}

fn try_stop(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        if !ctx.state.best_effort {
            return Ok(Some(
                "Try mode is already inactive. To enable, use: try_start.".into(),
            ));
        }
        ctx.state.best_effort = false;
        Ok(None)
    })
}

fn quit(ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        ctx.state.quit_requested = true;
        Ok(None)
    })
}

fn xyzzy(_ctx: GeneralContext<'_>) -> BoxFuture<'_, CommandResult> {
    Box::pin(async move {
        Ok(Some(
            "A hollow voice says, \"Quit playing around, this isn't a game!\"".into(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_session_file_names() {
        assert_eq!(saved_session_file("login").unwrap(), "login.txt");
        assert_eq!(saved_session_file("login.txt").unwrap(), "login.txt");
        assert!(saved_session_file("../login").is_err());
        assert!(saved_session_file("a\\b").is_err());
        assert!(saved_session_file("").is_err());
    }

    #[test]
    fn test_help_topics_are_keywords() {
        let mut table = CommandTable::new();
        register(&mut table).unwrap();
        let registry = table.registry();
        for topic in HELP_TOPICS {
            assert!(registry.is_keyword(topic));
        }
        assert_eq!(registry.lookup("help").unwrap().usage(), "help [topic=\"all\"]");
    }
}
