//! Purpose: Line-oriented interactive session over `PopsView`.
//! Exports: `run_shell`.
//! Role: Drives the listing layer from stdin: list, refresh, search, add, delete.
//! Invariants: The view is activated once before the first prompt.
//! Invariants: New message-log lines are flushed to stderr after every input line.

use std::io::{BufRead, Write};

use popcol::api::{Error, ErrorKind, Pop, PopService, PopsView};

use super::emit_messages;

const HELP: &str = "commands: list | refresh | search <term> | add <name> | delete <position> | messages | help | quit";

enum Step {
    Continue,
    Quit,
}

/// Returns how many message-log lines were written to stderr.
pub(super) fn run_shell(
    service: PopService,
    input: impl BufRead,
    output: &mut impl Write,
    quiet: bool,
) -> Result<usize, Error> {
    let messages = service.messages().clone();
    let mut view = PopsView::new(service);
    let mut emitted = 0;

    view.activate();
    write_line(output, &format!("loaded {} pops", view.len()))?;
    if !quiet {
        emitted = emit_messages("shell", &messages, emitted);
    }

    for line in input.lines() {
        let line = line.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input")
                .with_source(err)
        })?;
        let step = run_line(&mut view, line.trim(), output)?;
        if !quiet {
            emitted = emit_messages("shell", &messages, emitted);
        }
        if matches!(step, Step::Quit) {
            break;
        }
    }
    Ok(emitted)
}

fn run_line(view: &mut PopsView, line: &str, output: &mut impl Write) -> Result<Step, Error> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match command {
        "" => {}
        "list" => write_pops(output, view.pops())?,
        "refresh" => {
            view.refresh();
            write_line(output, &format!("loaded {} pops", view.len()))?;
        }
        "search" => {
            let found = view.service().search_pops(rest);
            write_pops(output, &found)?;
        }
        "add" => match view.add(Pop::named(rest)) {
            Some(pop) => {
                let line = format!("added {}", describe(pop));
                write_line(output, &line)?;
            }
            None => write_line(output, "nothing added")?,
        },
        "delete" => match rest.parse::<usize>() {
            Ok(position) => match view.delete(position) {
                Some(pop) => write_line(output, &format!("deleted {}", describe(&pop)))?,
                None => write_line(output, &format!("no pop at position {position}"))?,
            },
            Err(_) => write_line(output, "usage: delete <position>")?,
        },
        "messages" => {
            for message in view.service().messages().messages() {
                write_line(output, &message)?;
            }
        }
        "help" => write_line(output, HELP)?,
        "quit" | "exit" => return Ok(Step::Quit),
        other => write_line(output, &format!("unknown command `{other}`; {HELP}"))?,
    }
    Ok(Step::Continue)
}

fn describe(pop: &Pop) -> String {
    match pop.id {
        Some(id) => format!("#{id} {}", pop.name),
        None => format!("#? {}", pop.name),
    }
}

fn write_pops(output: &mut impl Write, pops: &[Pop]) -> Result<(), Error> {
    if pops.is_empty() {
        return write_line(output, "(no pops)");
    }
    for (position, pop) in pops.iter().enumerate() {
        write_line(output, &format!("{position}: {}", describe(pop)))?;
    }
    Ok(())
}

fn write_line(output: &mut impl Write, line: &str) -> Result<(), Error> {
    writeln!(output, "{line}").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{describe, run_line, Step};
    use popcol::api::{MessageLog, Pop, PopService, PopsView};

    fn offline_view() -> PopsView {
        let service = PopService::new("http://127.0.0.1:1/pops", MessageLog::new()).expect("service");
        PopsView::new(service)
    }

    #[test]
    fn describe_shows_key_or_placeholder() {
        assert_eq!(describe(&Pop::named("Rey").with_id(3)), "#3 Rey");
        assert_eq!(describe(&Pop::named("Rey")), "#? Rey");
    }

    #[test]
    fn blank_add_and_bad_delete_are_reported_locally() {
        let mut view = offline_view();
        let mut out = Vec::new();
        run_line(&mut view, "add    ", &mut out).expect("add");
        run_line(&mut view, "delete x", &mut out).expect("delete");
        run_line(&mut view, "list", &mut out).expect("list");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "nothing added\nusage: delete <position>\n(no pops)\n");
        assert!(view.service().messages().is_empty());
    }

    #[test]
    fn quit_stops_the_session() {
        let mut view = offline_view();
        let mut out = Vec::new();
        assert!(matches!(run_line(&mut view, "quit", &mut out), Ok(Step::Quit)));
        assert!(matches!(run_line(&mut view, "help", &mut out), Ok(Step::Continue)));
    }
}
